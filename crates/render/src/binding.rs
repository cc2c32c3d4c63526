//! The bind-to-pipeline capability and the pass operations it targets.

/// Subset of render-pass operations that bindings use.
///
/// Implemented for `wgpu::RenderPass`; tests supply a recording
/// implementation so draw orchestration can run without a GPU device.
pub trait PassOps {
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline);
    fn set_bind_group(&mut self, index: u32, group: &wgpu::BindGroup);
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer);
    fn set_index_buffer(&mut self, buffer: &wgpu::Buffer, format: wgpu::IndexFormat);
    fn draw_indexed(&mut self, count: u32);
}

impl PassOps for wgpu::RenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        wgpu::RenderPass::set_pipeline(self, pipeline);
    }

    fn set_bind_group(&mut self, index: u32, group: &wgpu::BindGroup) {
        wgpu::RenderPass::set_bind_group(self, index, group, &[]);
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer) {
        wgpu::RenderPass::set_vertex_buffer(self, slot, buffer.slice(..));
    }

    fn set_index_buffer(&mut self, buffer: &wgpu::Buffer, format: wgpu::IndexFormat) {
        wgpu::RenderPass::set_index_buffer(self, buffer.slice(..), format);
    }

    fn draw_indexed(&mut self, count: u32) {
        wgpu::RenderPass::draw_indexed(self, 0..count, 0, 0..1);
    }
}

/// One unit of GPU pipeline state that can bind itself for the next draw.
///
/// Each implementor owns the device resources it created. There is no
/// cross-binding coordination; the owning [`Renderable`](crate::Renderable)
/// is solely responsible for ordering and lifetime.
pub trait Bind {
    fn bind(&self, pass: &mut dyn PassOps);

    /// Replace the binding's constant contents. Only meaningful for
    /// constant-buffer bindings; the default is a no-op.
    fn write(&self, _queue: &wgpu::Queue, _data: &[u8]) {}
}
