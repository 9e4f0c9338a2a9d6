//! Deferred sphere rendering on the GPU.
//!
//! [`schedule`] decides pass order and depth state, [`gbuffer`] owns the
//! offscreen targets, [`sphere_pass`] draws the instanced spheres into them
//! and [`composite`] turns them into the final image.

pub mod composite;
pub mod gbuffer;
pub mod schedule;
pub mod sphere_pass;
