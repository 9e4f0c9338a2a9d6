//! CPU-side sphere geometry: the shared icosphere mesh and the interleaved
//! mesh-plus-instances vertex buffer.

/// Seeded random sphere clouds.
pub mod demo;
/// Per-instance records and the interleaved buffer layout.
pub mod instance;
/// Unit icosphere generation.
pub mod mesh;

pub use instance::{
    Attribute, AttributeLayout, AttributeSpec, InstanceGeometry,
    InstanceRecord, StepRate, INSTANCE_STRIDE,
};
pub use mesh::SphereMesh;
