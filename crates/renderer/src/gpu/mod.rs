//! wgpu backend for the hot-reload session.
//!
//! - `context` owns the instance, device and surface, picks MSAA and present modes
//!   and reconfigures the swapchain when the window resizes.
//! - `program` compiles wrapped GLSL into fill and wireframe pipelines sharing one
//!   uniform layout.
//! - `primitives` and `mesh` generate and upload the selectable geometries.
//! - `camera` is the damped Z-up orbit camera; `uniforms` packs it with the frame
//!   values into the scene block.
//! - `engine` glues everything into a `hotswap::RenderEngine`, including the error
//!   scope based diagnostic capture and the error placeholder.

mod camera;
mod context;
mod engine;
mod mesh;
mod primitives;
mod program;
mod uniforms;

pub use engine::{ScratchTarget, WgpuEngine};
pub use mesh::GpuMesh;
pub use program::GpuProgram;
