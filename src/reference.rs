//! CPU rasterizer that runs a [`FrameSchedule`] over an
//! [`InstanceGeometry`] without a GPU.
//!
//! It mirrors the sphere vertex and fragment stages: vertices are fetched
//! through the buffer's [`AttributeLayout`](crate::geometry::AttributeLayout),
//! transformed by the view matrix, rasterized with a per-pass depth test and
//! written through the same codec and `Rgba8Unorm` quantization the GPU
//! targets apply. The result is a G-buffer the compositor can read.

use crate::codec::{encode_float, encode_int, from_unorm, to_unorm};
use crate::compositor::{LayeredGBuffer, PackedGBuffer};
use crate::geometry::{Attribute, InstanceGeometry};
use crate::math::Matrix4;
use crate::renderer::schedule::{ClearMode, FrameSchedule, GBufferLayout, PassKind};

/// Largest depth value written, keeping the near plane inside `[0, 1)`.
pub const MAX_ENCODED_DEPTH: f32 = 0.999_999_94;

/// G-buffer produced by [`rasterize`], in the schedule's layout.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceGBuffer {
    /// Color plus raw float layers.
    Layered(LayeredGBuffer),
    /// Color plus codec-packed channels.
    Packed(PackedGBuffer),
}

/// Fragment attributes shared by every pass.
#[derive(Debug, Clone, Copy)]
struct Fragment {
    depth: f32,
    color: [f32; 3],
    index: u32,
    group: u32,
}

/// One transformed triangle ready for scan conversion.
struct ClipTriangle {
    xy: [[f32; 2]; 3],
    z: [f32; 3],
    color: [f32; 3],
    index: u32,
    group: u32,
}

/// Map NDC z (`-1` near, `1` far) to the encoded depth channel, where
/// larger means nearer and `0` is reserved for background.
#[must_use]
pub fn encoded_depth(ndc_z: f32) -> f32 {
    ((1.0 - ndc_z) * 0.5).clamp(0.0, MAX_ENCODED_DEPTH)
}

/// Shade a fragment for `pass` as the fragment shader would, returning the
/// normalized channel values before target quantization.
fn shade(pass: PassKind, f: &Fragment) -> [f32; 4] {
    match pass {
        PassKind::Color => [f.color[0], f.color[1], f.color[2], 1.0],
        PassKind::Layers => [f.depth, f.index as f32, f.group as f32, 1.0],
        PassKind::Depth => to_unorm(encode_float(f.depth)),
        PassKind::Index => to_unorm(encode_int(f.index)),
        PassKind::Group => to_unorm(encode_int(f.group)),
    }
}

fn triangles(
    geometry: &InstanceGeometry,
    view: &Matrix4,
) -> Option<Vec<ClipTriangle>> {
    let layout = &geometry.layout;
    let bytes = &geometry.vertex_bytes;
    let position = layout.get(Attribute::Position)?;
    let location = layout.get(Attribute::Location)?;
    let radius = layout.get(Attribute::Radius)?;
    let color = layout.get(Attribute::Color)?;
    let index = layout.get(Attribute::Index)?;
    let group = layout.get(Attribute::Group)?;

    let mut out = Vec::new();
    for instance in 0..u64::from(geometry.instance_count) {
        let loc: [f32; 3] = location.fetch(bytes, instance)?;
        let r: f32 = radius.fetch(bytes, instance)?;
        let rgb: [f32; 3] = color.fetch(bytes, instance)?;
        let id: u32 = index.fetch(bytes, instance)?;
        let grp: u32 = group.fetch(bytes, instance)?;

        for tri in geometry.indices.chunks_exact(3) {
            let mut xy = [[0.0; 2]; 3];
            let mut z = [0.0; 3];
            for (k, &v) in tri.iter().enumerate() {
                let p: [f32; 3] = position.fetch(bytes, u64::from(v))?;
                let world = [
                    p[0] * r + loc[0],
                    p[1] * r + loc[1],
                    p[2] * r - loc[2],
                ];
                let clip = view.transform_point(world);
                xy[k] = [clip[0], clip[1]];
                z[k] = clip[2];
            }
            out.push(ClipTriangle {
                xy,
                z,
                color: rgb,
                index: id,
                group: grp,
            });
        }
    }
    Some(out)
}

fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

/// Scan-convert every triangle, calling `visit` with pixel coordinates and
/// the interpolated fragment.
fn for_each_fragment(
    tris: &[ClipTriangle],
    width: u32,
    height: u32,
    mut visit: impl FnMut(u32, u32, Fragment),
) {
    let (w, h) = (width as f32, height as f32);
    for tri in tris {
        // NDC to pixel space, y down.
        let s = tri
            .xy
            .map(|[x, y]| [(x + 1.0) * 0.5 * w, (1.0 - y) * 0.5 * h]);
        let area = edge(s[0], s[1], s[2]);
        if area.abs() <= f32::EPSILON {
            continue;
        }
        let min_x = s.iter().map(|p| p[0]).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
        let max_x = s.iter().map(|p| p[0]).fold(f32::MIN, f32::max).ceil().min(w) as u32;
        let min_y = s.iter().map(|p| p[1]).fold(f32::MAX, f32::min).floor().max(0.0) as u32;
        let max_y = s.iter().map(|p| p[1]).fold(f32::MIN, f32::max).ceil().min(h) as u32;

        for py in min_y..max_y {
            for px in min_x..max_x {
                let p = [px as f32 + 0.5, py as f32 + 0.5];
                let b0 = edge(s[1], s[2], p) / area;
                let b1 = edge(s[2], s[0], p) / area;
                let b2 = edge(s[0], s[1], p) / area;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }
                let ndc_z = b0 * tri.z[0] + b1 * tri.z[1] + b2 * tri.z[2];
                if !(-1.0..=1.0).contains(&ndc_z) {
                    continue;
                }
                visit(
                    px,
                    py,
                    Fragment {
                        depth: encoded_depth(ndc_z),
                        color: tri.color,
                        index: tri.index,
                        group: tri.group,
                    },
                );
            }
        }
    }
}

/// Render `geometry` under `view` into a `width × height` G-buffer by
/// running each scheduled pass in order.
///
/// Returns `None` if the geometry's attribute table cannot be read.
#[must_use]
pub fn rasterize(
    schedule: &FrameSchedule,
    geometry: &InstanceGeometry,
    view: &Matrix4,
    width: u32,
    height: u32,
) -> Option<ReferenceGBuffer> {
    let tris = triangles(geometry, view)?;
    let n = width as usize * height as usize;
    // Depth-test buffer in clip depth, cleared to the far plane.
    let mut depth_test = vec![f32::INFINITY; n];
    let mut targets: Vec<(PassKind, Vec<[f32; 4]>)> = Vec::new();

    for step in schedule.steps() {
        if step.clear == ClearMode::ColorAndDepth {
            depth_test.fill(f32::INFINITY);
        }
        let mut target = vec![[0.0f32; 4]; n];
        for_each_fragment(&tris, width, height, |x, y, frag| {
            let i = y as usize * width as usize + x as usize;
            // Compare on the stored channel value, which is monotonic in
            // clip depth and identical across passes.
            let incoming = 1.0 - frag.depth;
            if step.depth_compare.passes(incoming, depth_test[i]) {
                if step.depth_write {
                    depth_test[i] = incoming;
                }
                target[i] = shade(step.pass, &frag);
            }
        });
        targets.push((step.pass, target));
    }

    let channel = |pass: PassKind| {
        targets
            .iter()
            .find(|(p, _)| *p == pass)
            .map(|(_, t)| t.as_slice())
    };
    let quantize = |t: &[[f32; 4]]| t.iter().copied().map(from_unorm).collect::<Vec<_>>();

    let color = quantize(channel(PassKind::Color)?);
    Some(match schedule.layout() {
        GBufferLayout::Layered => ReferenceGBuffer::Layered(LayeredGBuffer {
            width,
            height,
            color,
            layers: channel(PassKind::Layers)?.to_vec(),
        }),
        GBufferLayout::Packed => ReferenceGBuffer::Packed(PackedGBuffer {
            width,
            height,
            color,
            depth: quantize(channel(PassKind::Depth)?),
            index: quantize(channel(PassKind::Index)?),
            group: quantize(channel(PassKind::Group)?),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::GBufferSource;
    use crate::geometry::{InstanceRecord, SphereMesh};

    const SIZE: u32 = 64;

    fn three_spheres() -> InstanceGeometry {
        let records = [
            InstanceRecord::new([0.0, 0.0, 0.0], 0.5, [1.0, 0.0, 0.0], 0, 0),
            InstanceRecord::new([1.0, 0.0, 0.0], 0.5, [0.0, 1.0, 0.0], 1, 0),
            InstanceRecord::new([0.0, 1.0, 0.0], 0.5, [0.0, 0.0, 1.0], 2, 1),
        ];
        InstanceGeometry::build(&SphereMesh::icosphere(3), &records)
    }

    /// Fit the scene (x, y in [-0.5, 1.5]) into NDC.
    fn view() -> Matrix4 {
        let mut m = Matrix4::identity().scale_uniform(0.8);
        m.rows[3] = [-0.4, -0.4, 0.0, 1.0];
        m
    }

    fn pixel_of(world: [f32; 3]) -> (u32, u32) {
        let ndc = view().transform_point(world);
        let x = (ndc[0] + 1.0) * 0.5 * SIZE as f32;
        let y = (1.0 - ndc[1]) * 0.5 * SIZE as f32;
        (x as u32, y as u32)
    }

    #[test]
    fn group_survives_encode_render_decode() {
        let schedule = FrameSchedule::from_layout(GBufferLayout::Packed).unwrap();
        let Some(ReferenceGBuffer::Packed(gbuffer)) =
            rasterize(&schedule, &three_spheres(), &view(), SIZE, SIZE)
        else {
            panic!("expected a packed G-buffer");
        };

        let (x, y) = pixel_of([0.0, 1.0, 0.0]);
        assert_eq!(gbuffer.group_at(x, y), 1);
        assert_eq!(gbuffer.index_at(x, y), 2);
        assert!(gbuffer.depth_at(x, y) > 0.5);

        let (x, y) = pixel_of([1.0, 0.0, 0.0]);
        assert_eq!(gbuffer.group_at(x, y), 0);
        assert_eq!(gbuffer.index_at(x, y), 1);

        // Corner far from every sphere stays background.
        assert_eq!(gbuffer.depth_at(SIZE - 1, 0), 0.0);
        assert_eq!(gbuffer.color_at(SIZE - 1, 0)[3], 0.0);
    }

    #[test]
    fn layered_layout_matches_packed_identifiers() {
        let geometry = three_spheres();
        let layered = rasterize(
            &FrameSchedule::from_layout(GBufferLayout::Layered).unwrap(),
            &geometry,
            &view(),
            SIZE,
            SIZE,
        );
        let packed = rasterize(
            &FrameSchedule::from_layout(GBufferLayout::Packed).unwrap(),
            &geometry,
            &view(),
            SIZE,
            SIZE,
        );
        let (Some(ReferenceGBuffer::Layered(l)), Some(ReferenceGBuffer::Packed(p))) =
            (layered, packed)
        else {
            panic!("unexpected layouts");
        };
        for y in 0..SIZE {
            for x in 0..SIZE {
                assert_eq!(l.group_at(x, y), p.group_at(x, y));
                assert_eq!(l.index_at(x, y), p.index_at(x, y));
                let dz = (f64::from(l.depth_at(x, y)) - f64::from(p.depth_at(x, y))).abs();
                assert!(dz <= crate::codec::FLOAT_ROUND_TRIP_BOUND, "({x}, {y})");
            }
        }
    }

    #[test]
    fn nearer_sphere_wins_the_depth_test() {
        // Same xy, the second sphere is closer (more negative NDC z after
        // the location z flip).
        let records = [
            InstanceRecord::new([0.5, 0.5, -0.2], 0.5, [1.0, 0.0, 0.0], 7, 3),
            InstanceRecord::new([0.5, 0.5, 0.4], 0.5, [0.0, 1.0, 0.0], 8, 4),
        ];
        let geometry = InstanceGeometry::build(&SphereMesh::icosphere(2), &records);
        let schedule = FrameSchedule::from_layout(GBufferLayout::Packed).unwrap();
        let Some(ReferenceGBuffer::Packed(gbuffer)) =
            rasterize(&schedule, &geometry, &view(), SIZE, SIZE)
        else {
            panic!("expected a packed G-buffer");
        };
        let (x, y) = pixel_of([0.5, 0.5, 0.0]);
        assert_eq!(gbuffer.group_at(x, y), 4);
        assert_eq!(gbuffer.index_at(x, y), 8);
    }

    #[test]
    fn empty_geometry_renders_background() {
        let geometry = InstanceGeometry::build(&SphereMesh::default(), &[]);
        let schedule = FrameSchedule::from_layout(GBufferLayout::Packed).unwrap();
        let Some(ReferenceGBuffer::Packed(gbuffer)) =
            rasterize(&schedule, &geometry, &view(), 8, 8)
        else {
            panic!("expected a packed G-buffer");
        };
        assert!(gbuffer.depth.iter().all(|d| *d == [0; 4]));
    }

    #[test]
    fn encoded_depth_stays_below_one() {
        assert_eq!(encoded_depth(-1.0), MAX_ENCODED_DEPTH);
        assert_eq!(encoded_depth(1.0), 0.0);
        assert_eq!(encoded_depth(0.0), 0.5);
    }
}
