//! Pointer input translation for the interactive viewer.

/// Drag and wheel tracking that produces view deltas.
pub mod drag;

pub use drag::DragTracker;
