//! View state for the orthographic sphere view.
//!
//! Holds the accumulated rotation and log-scale zoom and turns them into the
//! per-frame view matrix.

/// Rotation/zoom accumulation and view-matrix construction.
pub mod view;

pub use view::{ViewDelta, ViewState, DEFAULT_ZOOM_LEVEL};
