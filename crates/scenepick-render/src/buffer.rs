//! GPU buffer helpers.

use wgpu::util::DeviceExt;

/// Creates a vertex buffer from data.
pub fn create_vertex_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    data: &[T],
    label: Option<&str>,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

/// Creates an index buffer from data.
pub fn create_index_buffer(
    device: &wgpu::Device,
    data: &[u32],
    label: Option<&str>,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
    })
}

/// Creates a uniform buffer from data.
pub fn create_uniform_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    data: &T,
    label: Option<&str>,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: bytemuck::bytes_of(data),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Rounds `size` up to a multiple of `alignment` (a power of two).
#[must_use]
pub fn align_to(size: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

/// A uniform buffer addressed with dynamic offsets, one slot per draw.
///
/// The buffer grows (and its bind group is rebuilt) when a frame needs more
/// slots than it holds; it never shrinks.
pub struct DynamicUniforms {
    label: &'static str,
    slot_size: u64,
    stride: u64,
    capacity: u64,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl DynamicUniforms {
    /// Creates a buffer of `initial_slots` slots of `slot_size` bytes each.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
        slot_size: u64,
        initial_slots: u64,
    ) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = align_to(slot_size, alignment);
        let capacity = initial_slots.max(1);
        let (buffer, bind_group) =
            Self::allocate(device, layout, label, slot_size, stride * capacity);
        Self {
            label,
            slot_size,
            stride,
            capacity,
            buffer,
            bind_group,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &'static str,
        slot_size: u64,
        size: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(slot_size),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Byte distance between consecutive slots.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Dynamic offset of slot `index`.
    pub fn offset(&self, index: usize) -> u32 {
        (index as u64 * self.stride) as u32
    }

    /// The bind group covering one slot.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Uploads `slots`, each at most `slot_size` bytes, growing the buffer
    /// if needed.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        slots: &[&[u8]],
    ) {
        if slots.is_empty() {
            return;
        }
        let needed = slots.len() as u64;
        if needed > self.capacity {
            let capacity = needed.next_power_of_two();
            log::debug!("growing {} to {} slots", self.label, capacity);
            let (buffer, bind_group) = Self::allocate(
                device,
                layout,
                self.label,
                self.slot_size,
                self.stride * capacity,
            );
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }

        let mut bytes = vec![0u8; (self.stride * needed) as usize];
        for (i, slot) in slots.iter().enumerate() {
            let start = i * self.stride as usize;
            let len = slot.len().min(self.slot_size as usize);
            bytes[start..start + len].copy_from_slice(&slot[..len]);
        }
        queue.write_buffer(&self.buffer, 0, &bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(80, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(3072, 256), 3072);
        assert_eq!(align_to(257, 256), 512);
    }
}
