//! wgpu render orchestration for the cubekart demo.
//!
//! A [`Renderable`] is an ordered aggregate of [`Bind`] objects (buffers,
//! constants, pipeline state) for one drawable; an [`Entity`] owns one
//! Renderable and projects its pose into per-frame constant blocks.
//!
//! # Invariants
//! - A Renderable holds exactly one index buffer and at most one vertex
//!   and one pixel constant slot; violations panic at setup time.
//! - Bindings are bound in insertion order, before the draw.
//! - The renderer never mutates scene or physics state.

mod binding;
mod camera;
mod entity;
mod gpu;
mod light;
mod mesh;
mod pipeline;
mod renderable;
mod shaders;

pub use binding::{Bind, PassOps};
pub use camera::Camera;
pub use entity::{Entity, LightConstants, ObjectConstants, projection};
pub use gpu::{Frame, Gfx, GfxError};
pub use light::Light;
pub use mesh::{Mesh, Vertex, cube_mesh, sky_cube_mesh, sphere_mesh};
pub use pipeline::{
    IndexBufferBinding, PipelineBinding, SkyConstants, SkyPalette, UniformBinding,
    VertexBufferBinding, build_scene_renderable, build_sky_renderable, scene_pipeline,
    sky_pipeline,
};
pub use renderable::Renderable;
