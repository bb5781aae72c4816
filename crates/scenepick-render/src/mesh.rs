//! GPU mesh storage.

use glam::Vec3;
use scenepick_core::Aabb;

use crate::buffer::{create_index_buffer, create_vertex_buffer};
use crate::error::{RenderError, RenderResult};

/// Vertex layout of ID-encoded meshes: position only.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    /// Vertex buffer layout for the ID pipelines.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A triangle mesh resident on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    /// Local-space bounds, for building the scene node.
    pub bounds: Aabb,
}

impl GpuMesh {
    /// Uploads a triangle list.
    ///
    /// Fails on empty input, a partial triangle, or an index past the
    /// vertex list.
    pub fn upload(
        device: &wgpu::Device,
        label: &str,
        positions: &[Vec3],
        indices: &[u32],
    ) -> RenderResult<Self> {
        validate(positions, indices)?;

        let vertices: Vec<MeshVertex> = positions
            .iter()
            .map(|p| MeshVertex {
                position: p.to_array(),
            })
            .collect();
        let vertex_buffer = create_vertex_buffer(device, &vertices, Some(label));
        let index_buffer = create_index_buffer(device, indices, Some(label));

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            bounds: bounds_of(positions),
        })
    }
}

fn validate(positions: &[Vec3], indices: &[u32]) -> RenderResult<()> {
    if positions.is_empty() || indices.is_empty() {
        return Err(RenderError::InvalidMesh("no geometry".into()));
    }
    if indices.len() % 3 != 0 {
        return Err(RenderError::InvalidMesh(format!(
            "{} indices is not a whole number of triangles",
            indices.len()
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(RenderError::InvalidMesh(format!(
            "index {bad} out of range for {} vertices",
            positions.len()
        )));
    }
    Ok(())
}

fn bounds_of(positions: &[Vec3]) -> Aabb {
    let (min, max) = positions.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    Aabb::new(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride() {
        assert_eq!(MeshVertex::layout().array_stride, 12);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let tri = [Vec3::ZERO, Vec3::X, Vec3::Y];
        assert!(validate(&tri, &[0, 1, 2]).is_ok());
        assert!(validate(&[], &[0, 1, 2]).is_err());
        assert!(validate(&tri, &[0, 1]).is_err());
        assert!(validate(&tri, &[0, 1, 3]).is_err());
    }

    #[test]
    fn test_bounds() {
        let bounds = bounds_of(&[Vec3::new(-1.0, 2.0, 0.0), Vec3::new(3.0, -4.0, 5.0)]);
        assert_eq!(bounds.min, Vec3::new(-1.0, -4.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 2.0, 5.0));
    }
}
