//! GPU resource management.
//!
//! Device and surface setup, adapter capability checks, instance buffer
//! upload, render targets and shader composition.

/// Adapter limits and format support checks.
pub mod capabilities;
/// Vertex and index buffers for an instance set.
pub mod instance_buffer;
/// Shared wgpu boilerplate for pipeline construction.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Offscreen render-target textures.
pub mod texture;
