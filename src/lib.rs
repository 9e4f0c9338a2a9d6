// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Multi-pass deferred renderer for large sphere collections, drawn in a
//! flat illustrative style.
//!
//! Every sphere is rendered once per G-buffer channel (color, depth, index,
//! group) with its attributes bit-packed into 8-bit RGBA targets. A single
//! full-screen composite then decodes the buffers and applies screen-space
//! ambient occlusion, three kinds of outline, and depth fog.
//!
//! # Key entry points
//!
//! - [`engine::SphereRenderEngine`] - owns the GPU resources and runs frames
//! - [`options::Options`] - runtime configuration (pipeline, effects, world,
//!   camera), loadable from TOML
//! - [`compositor`] - the CPU form of the composite, over any
//!   [`compositor::GBufferSource`]
//! - [`reference`] - a CPU rasterizer producing the G-buffer the GPU would
//!
//! # Architecture
//!
//! Instances are expanded into one shared icosphere mesh plus a per-sphere
//! attribute stream ([`geometry`]). The [`renderer::schedule::FrameSchedule`]
//! decides pass order, clears and depth tests; the [`codec`] fixes how floats
//! and integers survive a trip through an RGBA8 texel.

pub mod camera;
pub mod codec;
pub mod compositor;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod input;
pub mod math;
pub mod options;
pub mod reference;
pub mod renderer;
