use hotswap::GeometryKind;
use wgpu::util::DeviceExt;

use super::primitives::MeshData;

/// Vertex and index buffers for one primitive, with a second index buffer for edges.
pub struct GpuMesh {
    pub id: u64,
    pub kind: GeometryKind,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub wire_buffer: wgpu::Buffer,
    pub wire_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, id: u64, kind: GeometryKind, data: &MeshData) -> Self {
        let wire = data.wire_indices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh vertices"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh indices"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let wire_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh edges"),
            contents: bytemuck::cast_slice(&wire),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            id,
            kind,
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            wire_buffer,
            wire_count: wire.len() as u32,
        }
    }

    pub fn draw<'pass>(&'pass self, pass: &mut wgpu::RenderPass<'pass>, wireframe: bool) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        if wireframe {
            pass.set_index_buffer(self.wire_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.wire_count, 0, 0..1);
        } else {
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }

    pub fn destroy(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.wire_buffer.destroy();
    }
}
