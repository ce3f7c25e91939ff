//! Renderer crate for Spectra.
//!
//! Glues the winit preview window, the `wgpu` backend and the three.js-style GLSL
//! wrapping to the `hotswap` session. The overall flow is:
//!
//! ```text
//!   CLI / file watcher
//!          │ SourceSender (EventLoopProxy)
//!          ▼
//!   WindowRuntime ──▶ window thread ──▶ winit event loop
//!                                          │
//!            AboutToWait ──▶ Session::pump ─┤ (debounced validation, swap)
//!        RedrawRequested ──▶ Session::tick ─┘──▶ WgpuEngine::draw_frame
//! ```
//!
//! `WgpuEngine` implements `hotswap::RenderEngine`: user sources are wrapped as
//! Vulkan GLSL, compiled through naga (or shaderc), and validated by a forced draw
//! into a 1x1 scratch target inside a wgpu error scope.

mod compile;
mod gpu;
mod types;
mod window;

pub use gpu::{GpuMesh, GpuProgram, ScratchTarget, WgpuEngine};
pub use types::{Antialiasing, Preset, RendererConfig, ShaderCompiler};
pub use window::{SourceSender, WindowRuntime};
