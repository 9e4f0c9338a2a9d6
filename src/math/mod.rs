//! Small linear-algebra helpers for the view transform.

/// Row-major 4×4 matrix with the construction and composition operations
/// the camera needs.
pub mod matrix;

pub use matrix::Matrix4;
