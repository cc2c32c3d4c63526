//! Ordered aggregate of bindings for one drawable object.

use crate::binding::{Bind, PassOps};

/// One drawable: a sequence of bindings plus distinguished slots for the
/// index buffer and the vertex/pixel constant buffers.
///
/// Distinguished slots are indices into the owned sequence, recorded at
/// registration time. Duplicate registration of a distinguished slot is a
/// configuration error and panics; so does rendering without an index
/// buffer. Insertion order is the only binding-order guarantee, so callers
/// must add bindings in a pipeline-valid order.
#[derive(Default)]
pub struct Renderable {
    binds: Vec<Box<dyn Bind>>,
    index: Option<(usize, u32)>,
    vertex_constants: Option<usize>,
    pixel_constants: Option<usize>,
}

impl Renderable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain binding with no distinguished role.
    pub fn add(&mut self, binding: Box<dyn Bind>) {
        self.binds.push(binding);
    }

    /// Append the index buffer binding and record its element count.
    pub fn add_index_buffer(&mut self, binding: Box<dyn Bind>, count: u32) {
        assert!(
            self.index.is_none(),
            "renderable already has an index buffer"
        );
        self.index = Some((self.binds.len(), count));
        self.binds.push(binding);
    }

    /// Append the vertex-stage constant buffer binding.
    pub fn add_vertex_constants(&mut self, binding: Box<dyn Bind>) {
        assert!(
            self.vertex_constants.is_none(),
            "renderable already has a vertex constant buffer"
        );
        self.vertex_constants = Some(self.binds.len());
        self.binds.push(binding);
    }

    /// Append the pixel-stage constant buffer binding.
    pub fn add_pixel_constants(&mut self, binding: Box<dyn Bind>) {
        assert!(
            self.pixel_constants.is_none(),
            "renderable already has a pixel constant buffer"
        );
        self.pixel_constants = Some(self.binds.len());
        self.binds.push(binding);
    }

    /// Number of indices in the registered index buffer, if any.
    pub fn index_count(&self) -> Option<u32> {
        self.index.map(|(_, count)| count)
    }

    /// Write new vertex-stage constant contents.
    ///
    /// Panics if no vertex constant buffer was registered.
    pub fn update_vertex(&self, queue: &wgpu::Queue, data: &[u8]) {
        self.binds[self.vertex_slot()].write(queue, data);
    }

    /// Write new pixel-stage constant contents.
    ///
    /// Panics if no pixel constant buffer was registered.
    pub fn update_pixel(&self, queue: &wgpu::Queue, data: &[u8]) {
        self.binds[self.pixel_slot()].write(queue, data);
    }

    fn vertex_slot(&self) -> usize {
        self.vertex_constants
            .expect("renderable has no vertex constant buffer")
    }

    fn pixel_slot(&self) -> usize {
        self.pixel_constants
            .expect("renderable has no pixel constant buffer")
    }

    /// Bind every binding in insertion order, then issue one indexed draw
    /// sized to the index buffer's element count.
    ///
    /// Panics if no index buffer was registered.
    pub fn render(&self, pass: &mut dyn PassOps) {
        let (_, count) = self.index.expect("renderable has no index buffer");
        for bind in &self.binds {
            bind.bind(pass);
        }
        pass.draw_indexed(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared call log; bindings record a label, the pass records draws.
    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        label: &'static str,
        log: Log,
    }

    impl Bind for Probe {
        fn bind(&self, _pass: &mut dyn PassOps) {
            self.log.borrow_mut().push(self.label.to_string());
        }
    }

    struct RecordingPass {
        log: Log,
    }

    impl PassOps for RecordingPass {
        fn set_pipeline(&mut self, _pipeline: &wgpu::RenderPipeline) {}
        fn set_bind_group(&mut self, _index: u32, _group: &wgpu::BindGroup) {}
        fn set_vertex_buffer(&mut self, _slot: u32, _buffer: &wgpu::Buffer) {}
        fn set_index_buffer(&mut self, _buffer: &wgpu::Buffer, _format: wgpu::IndexFormat) {}
        fn draw_indexed(&mut self, count: u32) {
            self.log.borrow_mut().push(format!("draw:{count}"));
        }
    }

    fn probe(label: &'static str, log: &Log) -> Box<dyn Bind> {
        Box::new(Probe {
            label,
            log: log.clone(),
        })
    }

    #[test]
    fn binds_in_insertion_order_then_draws() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        r.add(probe("vertex_buffer", &log));
        r.add_index_buffer(probe("index_buffer", &log), 3);
        r.add(probe("pipeline", &log));
        r.add_vertex_constants(probe("vertex_constants", &log));
        r.add_pixel_constants(probe("pixel_constants", &log));

        let mut pass = RecordingPass { log: log.clone() };
        r.render(&mut pass);

        assert_eq!(
            log.borrow().as_slice(),
            [
                "vertex_buffer",
                "index_buffer",
                "pipeline",
                "vertex_constants",
                "pixel_constants",
                "draw:3",
            ]
        );
    }

    #[test]
    fn each_binding_bound_exactly_once() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        for _ in 0..4 {
            r.add(probe("bind", &log));
        }
        r.add_index_buffer(probe("index", &log), 6);

        let mut pass = RecordingPass { log: log.clone() };
        r.render(&mut pass);

        let entries = log.borrow();
        assert_eq!(entries.iter().filter(|e| *e == "bind").count(), 4);
        assert_eq!(entries.iter().filter(|e| *e == "index").count(), 1);
        assert_eq!(entries.last().map(String::as_str), Some("draw:6"));
    }

    #[test]
    #[should_panic(expected = "already has an index buffer")]
    fn second_index_buffer_panics() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        r.add_index_buffer(probe("a", &log), 3);
        r.add_index_buffer(probe("b", &log), 3);
    }

    #[test]
    #[should_panic(expected = "already has a vertex constant buffer")]
    fn second_vertex_constants_panics() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        r.add_vertex_constants(probe("a", &log));
        r.add_vertex_constants(probe("b", &log));
    }

    #[test]
    #[should_panic(expected = "already has a pixel constant buffer")]
    fn second_pixel_constants_panics() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        r.add_pixel_constants(probe("a", &log));
        r.add_pixel_constants(probe("b", &log));
    }

    #[test]
    #[should_panic(expected = "no index buffer")]
    fn render_without_index_buffer_panics() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        r.add(probe("vertex_buffer", &log));
        let mut pass = RecordingPass { log };
        r.render(&mut pass);
    }

    #[test]
    #[should_panic(expected = "no vertex constant buffer")]
    fn update_vertex_without_slot_panics() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        r.add(probe("pipeline", &log));
        r.vertex_slot();
    }

    #[test]
    #[should_panic(expected = "no pixel constant buffer")]
    fn update_pixel_without_slot_panics() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        r.add_vertex_constants(probe("vertex_constants", &log));
        r.pixel_slot();
    }

    #[test]
    fn index_count_reports_registered_count() {
        let log: Log = Rc::default();
        let mut r = Renderable::new();
        assert_eq!(r.index_count(), None);
        r.add_index_buffer(probe("index", &log), 36);
        assert_eq!(r.index_count(), Some(36));
    }
}
