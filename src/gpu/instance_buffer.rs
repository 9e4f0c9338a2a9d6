//! GPU copies of an [`InstanceGeometry`].

use wgpu::util::DeviceExt;

use crate::geometry::InstanceGeometry;

/// Vertex and index buffers for one instance set, plus what a draw needs.
///
/// Slot 0 binds the whole vertex buffer, slot 1 binds it from
/// [`Self::instance_base`] onward.
pub struct GpuInstanceBuffers {
    /// Mesh positions followed by instance records.
    pub vertex: wgpu::Buffer,
    /// Mesh triangle indices (`u16`).
    pub index: wgpu::Buffer,
    /// Byte offset of the first instance record.
    pub instance_base: u64,
    /// Indices per instance.
    pub draw_count: u32,
    /// Instances to draw.
    pub instance_count: u32,
}

impl GpuInstanceBuffers {
    /// Allocate and fill both buffers.
    ///
    /// This never frees anything: the owner destroys buffers it replaces.
    #[must_use]
    pub fn upload(device: &wgpu::Device, geometry: &InstanceGeometry) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Vertex Buffer"),
            contents: &geometry.vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        log::debug!(
            "uploaded {} sphere instances ({} vertex bytes)",
            geometry.instance_count,
            geometry.vertex_bytes.len()
        );
        Self {
            vertex,
            index,
            instance_base: geometry.layout.instance_base(),
            draw_count: geometry.draw_count,
            instance_count: geometry.instance_count,
        }
    }

    /// Whether a draw would produce anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.instance_count == 0
    }

    /// Bind both vertex slots and the index buffer, then draw every
    /// instance. Does nothing for an empty instance set.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.is_empty() {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex.slice(..));
        pass.set_vertex_buffer(1, self.vertex.slice(self.instance_base..));
        pass.set_index_buffer(self.index.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.draw_count, 0, 0..self.instance_count);
    }

    /// Release both buffers.
    pub fn destroy(&self) {
        self.vertex.destroy();
        self.index.destroy();
    }
}
