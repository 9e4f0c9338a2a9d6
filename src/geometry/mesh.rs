//! Unit icosphere shared by every sphere instance.

use glam::Vec3;
use rustc_hash::FxHashMap;

/// Byte stride of one mesh vertex (position only).
pub const MESH_VERTEX_STRIDE: u64 = 12;

/// Subdivision level used when options do not say otherwise.
pub const DEFAULT_SUBDIVISIONS: u32 = 2;

/// A unit-radius icosphere: positions and a `u16` triangle list.
///
/// Level 0 is the icosahedron (12 vertices, 20 triangles); each level
/// splits every triangle into four. Triangles wind counter-clockwise when
/// seen from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    /// Vertex positions on the unit sphere.
    pub positions: Vec<[f32; 3]>,
    /// Triangle list indices.
    pub indices: Vec<u16>,
}

impl Default for SphereMesh {
    fn default() -> Self {
        Self::icosphere(DEFAULT_SUBDIVISIONS)
    }
}

impl SphereMesh {
    /// Highest subdivision level whose vertices still fit `u16` indices.
    pub const MAX_SUBDIVISIONS: u32 = 5;

    /// Build an icosphere. Levels above [`Self::MAX_SUBDIVISIONS`] are
    /// clamped.
    #[must_use]
    pub fn icosphere(subdivisions: u32) -> Self {
        let subdivisions = subdivisions.min(Self::MAX_SUBDIVISIONS);
        let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;

        let mut positions: Vec<Vec3> = [
            (-1.0, phi, 0.0),
            (1.0, phi, 0.0),
            (-1.0, -phi, 0.0),
            (1.0, -phi, 0.0),
            (0.0, -1.0, phi),
            (0.0, 1.0, phi),
            (0.0, -1.0, -phi),
            (0.0, 1.0, -phi),
            (phi, 0.0, -1.0),
            (phi, 0.0, 1.0),
            (-phi, 0.0, -1.0),
            (-phi, 0.0, 1.0),
        ]
        .into_iter()
        .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
        .collect();

        #[rustfmt::skip]
        let mut indices: Vec<u16> = vec![
            0, 11, 5,   0, 5, 1,    0, 1, 7,    0, 7, 10,   0, 10, 11,
            1, 5, 9,    5, 11, 4,   11, 10, 2,  10, 7, 6,   7, 1, 8,
            3, 9, 4,    3, 4, 2,    3, 2, 6,    3, 6, 8,    3, 8, 9,
            4, 9, 5,    2, 4, 11,   6, 2, 10,   8, 6, 7,    9, 8, 1,
        ];

        let mut midpoints: FxHashMap<(u16, u16), u16> = FxHashMap::default();
        for _ in 0..subdivisions {
            let mut next = Vec::with_capacity(indices.len() * 4);
            for tri in indices.chunks_exact(3) {
                let (v0, v1, v2) = (tri[0], tri[1], tri[2]);
                let a = midpoint(&mut positions, &mut midpoints, v0, v1);
                let b = midpoint(&mut positions, &mut midpoints, v1, v2);
                let c = midpoint(&mut positions, &mut midpoints, v2, v0);
                next.extend_from_slice(&[v0, a, c, v1, b, a, v2, c, b, a, b, c]);
            }
            indices = next;
        }

        Self {
            positions: positions.iter().map(|p| p.to_array()).collect(),
            indices,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices submitted per instance.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Size of the position data in bytes.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        self.positions.len() as u64 * MESH_VERTEX_STRIDE
    }

    /// Position data as raw bytes.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }
}

fn midpoint(
    positions: &mut Vec<Vec3>,
    cache: &mut FxHashMap<(u16, u16), u16>,
    v0: u16,
    v1: u16,
) -> u16 {
    let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
    *cache.entry(key).or_insert_with(|| {
        let mid = ((positions[usize::from(v0)] + positions[usize::from(v1)])
            * 0.5)
            .normalize();
        positions.push(mid);
        (positions.len() - 1) as u16
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_two_counts() {
        let mesh = SphereMesh::icosphere(2);
        assert_eq!(mesh.vertex_count(), 162);
        assert_eq!(mesh.indices.len(), 320 * 3);
        assert_eq!(mesh.byte_len(), 162 * 12);
        assert_eq!(mesh.vertex_bytes().len() as u64, mesh.byte_len());
    }

    #[test]
    fn vertices_lie_on_unit_sphere() {
        let mesh = SphereMesh::icosphere(3);
        for p in &mesh.positions {
            let len = Vec3::from(*p).length();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn triangles_face_outward() {
        for level in 0..3 {
            let mesh = SphereMesh::icosphere(level);
            for tri in mesh.indices.chunks_exact(3) {
                let [a, b, c] = [tri[0], tri[1], tri[2]]
                    .map(|i| Vec3::from(mesh.positions[usize::from(i)]));
                let normal = (b - a).cross(c - a);
                let centroid = (a + b + c) / 3.0;
                assert!(normal.dot(centroid) > 0.0, "level {level} tri {tri:?}");
            }
        }
    }

    #[test]
    fn subdivision_is_clamped() {
        let capped = SphereMesh::icosphere(SphereMesh::MAX_SUBDIVISIONS);
        let over = SphereMesh::icosphere(SphereMesh::MAX_SUBDIVISIONS + 3);
        assert_eq!(capped.vertex_count(), over.vertex_count());
        assert!(capped.vertex_count() <= usize::from(u16::MAX));
    }
}
