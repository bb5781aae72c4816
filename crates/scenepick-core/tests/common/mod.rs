//! CPU rasterizing backend used by the integration tests.
//!
//! Every mesh and HUD instance is drawn as a small square marker centered on
//! the projection of its world origin. That is enough to exercise the full
//! picking and selection flows without a GPU.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use scenepick_core::{
    BlurParams, CameraUniforms, ColorKey, HudInstance, IdMaterial, LoadMode, Mat4, MeshId,
    ObjectConstants, OutlineParams, PassTarget, PickError, PickResult, PixelRegion,
    RenderBackend, TargetDescriptor, Vec2, Vec4, MAX_HUD_INSTANCED_BLOCK,
};

/// Half size of a marker square, in pixels.
pub const MARKER: i64 = 2;

#[derive(Debug)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub color: Vec<[u8; 4]>,
    pub depth: Option<Vec<f32>>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, depth: bool) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![[0; 4]; len],
            depth: depth.then(|| vec![1.0; len]),
        }
    }

    pub fn shared(width: u32, height: u32) -> SoftTarget {
        Rc::new(RefCell::new(Self::new(width, height, false)))
    }

    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        self.color[(y * self.width + x) as usize]
    }

    fn clear(&mut self, color: Vec4) {
        let texel = ColorKey::quantize(color).to_rgba8();
        self.color.fill(texel);
        if let Some(depth) = &mut self.depth {
            depth.fill(1.0);
        }
    }

    fn sample(&self, u: f32, v: f32) -> Vec4 {
        let x = ((u * self.width as f32) as i64).clamp(0, i64::from(self.width) - 1);
        let y = ((v * self.height as f32) as i64).clamp(0, i64::from(self.height) - 1);
        ColorKey::from_rgba8(self.texel(x as u32, y as u32)).to_vec4()
    }

    fn marker(&mut self, view_proj: &Mat4, world: &Mat4, texel: [u8; 4], depth_test: bool) {
        let clip = *view_proj * world.w_axis.truncate().extend(1.0);
        if clip.w <= f32::EPSILON {
            return;
        }
        let ndc = clip.truncate() / clip.w;
        let cx = ((ndc.x * 0.5 + 0.5) * self.width as f32) as i64;
        let cy = ((0.5 - ndc.y * 0.5) * self.height as f32) as i64;
        for y in cy - MARKER..=cy + MARKER {
            for x in cx - MARKER..=cx + MARKER {
                if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
                    continue;
                }
                let i = (y as u32 * self.width + x as u32) as usize;
                if depth_test {
                    if let Some(depth) = &mut self.depth {
                        if ndc.z >= depth[i] {
                            continue;
                        }
                        depth[i] = ndc.z;
                    }
                }
                self.color[i] = texel;
            }
        }
    }
}

pub type SoftTarget = Rc<RefCell<Canvas>>;

/// A call made on the backend, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateTarget { label: &'static str, width: u32, height: u32 },
    BeginOffscreen,
    BeginViewport,
    SetMaterial(IdMaterial),
    DrawMesh(MeshId),
    DrawHud(usize),
    EndPass,
    Blur([f32; 2]),
    Composite,
    Read(PixelRegion),
}

struct ActivePass {
    target: SoftTarget,
    view_proj: Mat4,
    material: Option<IdMaterial>,
}

#[derive(Default)]
pub struct SoftBackend {
    pub calls: Vec<Call>,
    /// Meshes that fail to draw.
    pub missing_meshes: HashSet<MeshId>,
    /// Added to every RGB channel written by a draw, simulating lossy output.
    pub drift: [i16; 3],
    pub fail_create: bool,
    pass: Option<ActivePass>,
}

impl SoftBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn hud_blocks(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawHud(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    fn drifted(&self, color: [f32; 4]) -> [u8; 4] {
        let mut texel = ColorKey::quantize(Vec4::from_array(color)).to_rgba8();
        for (channel, offset) in texel.iter_mut().zip(self.drift) {
            *channel = (i16::from(*channel) + offset).clamp(0, 255) as u8;
        }
        texel
    }

    fn active(&mut self) -> PickResult<&mut ActivePass> {
        self.pass.as_mut().ok_or(PickError::NoActivePass)
    }
}

impl RenderBackend for SoftBackend {
    type Target = SoftTarget;
    type Viewport = SoftTarget;

    fn create_target(&mut self, desc: &TargetDescriptor) -> PickResult<SoftTarget> {
        self.calls.push(Call::CreateTarget {
            label: desc.label,
            width: desc.width,
            height: desc.height,
        });
        if self.fail_create {
            return Err(PickError::TargetCreationFailed {
                width: desc.width,
                height: desc.height,
                reason: "out of memory".into(),
            });
        }
        Ok(Rc::new(RefCell::new(Canvas::new(desc.width, desc.height, desc.depth))))
    }

    fn begin_pass(
        &mut self,
        target: PassTarget<'_, SoftTarget, SoftTarget>,
        camera: &CameraUniforms,
        load: LoadMode,
    ) -> PickResult<()> {
        if self.pass.is_some() {
            return Err(PickError::Backend("pass already active".into()));
        }
        let target = match target {
            PassTarget::Offscreen(t) => {
                self.calls.push(Call::BeginOffscreen);
                Rc::clone(t)
            }
            PassTarget::Viewport(v) => {
                self.calls.push(Call::BeginViewport);
                Rc::clone(v)
            }
        };
        if let LoadMode::Clear(color) = load {
            target.borrow_mut().clear(color);
        }
        self.pass = Some(ActivePass {
            target,
            view_proj: Mat4::from_cols_array_2d(&camera.view_proj),
            material: None,
        });
        Ok(())
    }

    fn set_material(&mut self, material: IdMaterial) -> PickResult<()> {
        self.calls.push(Call::SetMaterial(material));
        self.active()?.material = Some(material);
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshId, constants: &ObjectConstants) -> PickResult<()> {
        self.calls.push(Call::DrawMesh(mesh));
        if self.missing_meshes.contains(&mesh) {
            return Err(PickError::Backend(format!("mesh {} not uploaded", mesh.0)));
        }
        let texel = self.drifted(constants.color);
        let pass = self.active()?;
        let material = pass.material.ok_or(PickError::MissingMaterial("none bound"))?;
        let world = Mat4::from_cols_array_2d(&constants.world);
        pass.target.borrow_mut().marker(
            &pass.view_proj,
            &world,
            texel,
            material == IdMaterial::PickingId,
        );
        Ok(())
    }

    fn draw_hud_instances(&mut self, instances: &[HudInstance]) -> PickResult<()> {
        self.calls.push(Call::DrawHud(instances.len()));
        if instances.len() > MAX_HUD_INSTANCED_BLOCK {
            return Err(PickError::Backend("instance block too large".into()));
        }
        let texels: Vec<_> = instances.iter().map(|i| self.drifted(i.color)).collect();
        let pass = self.active()?;
        if pass.material != Some(IdMaterial::HudBillboard) {
            return Err(PickError::MissingMaterial("hud_billboard"));
        }
        let mut target = pass.target.borrow_mut();
        for (instance, texel) in instances.iter().zip(texels) {
            let world = Mat4::from_translation(instance.position());
            target.marker(&pass.view_proj, &world, texel, true);
        }
        Ok(())
    }

    fn end_pass(&mut self) -> PickResult<()> {
        self.calls.push(Call::EndPass);
        self.pass.take().map(|_| ()).ok_or(PickError::NoActivePass)
    }

    fn blur(&mut self, src: &SoftTarget, dst: &SoftTarget, params: &BlurParams) -> PickResult<()> {
        self.calls.push(Call::Blur(params.direction));
        let src = src.borrow();
        let mut dst = dst.borrow_mut();
        let step = Vec2::from_array(params.direction)
            * Vec2::from_array(params.texel_size)
            * params.radius;
        for y in 0..dst.height {
            for x in 0..dst.width {
                let u = (x as f32 + 0.5) / dst.width as f32;
                let v = (y as f32 + 0.5) / dst.height as f32;
                let sum = src.sample(u - step.x, v - step.y)
                    + src.sample(u, v) * 2.0
                    + src.sample(u + step.x, v + step.y);
                let i = (y * dst.width + x) as usize;
                dst.color[i] = ColorKey::quantize(sum * 0.25).to_rgba8();
            }
        }
        Ok(())
    }

    fn composite_outline(
        &mut self,
        mask: &SoftTarget,
        blurred: &SoftTarget,
        viewport: &SoftTarget,
        params: &OutlineParams,
    ) -> PickResult<()> {
        self.calls.push(Call::Composite);
        let mask = mask.borrow();
        let blurred = blurred.borrow();
        let mut out = viewport.borrow_mut();
        for y in 0..out.height {
            for x in 0..out.width {
                let u = (x as f32 + 0.5) / out.width as f32;
                let v = (y as f32 + 0.5) / out.height as f32;
                let edge = (blurred.sample(u, v) - mask.sample(u, v)).max(Vec4::ZERO)
                    * params.intensity;
                let i = (y * out.width + x) as usize;
                let base = ColorKey::from_rgba8(out.color[i]).to_vec4();
                out.color[i] = ColorKey::quantize(base + edge).to_rgba8();
            }
        }
        Ok(())
    }

    fn read_pixels(&mut self, target: &SoftTarget, region: PixelRegion) -> PickResult<Vec<[u8; 4]>> {
        self.calls.push(Call::Read(region));
        let canvas = target.borrow();
        if !region.fits(canvas.width, canvas.height) {
            return Err(PickError::OutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
                target_width: canvas.width,
                target_height: canvas.height,
            });
        }
        let mut texels = Vec::with_capacity(region.len());
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                texels.push(canvas.texel(x, y));
            }
        }
        Ok(texels)
    }
}
