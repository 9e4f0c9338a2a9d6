//! Row-major 4×4 matrices for the view transform.
//!
//! Matrices act on row vectors: a point `p` maps to `p · M`. Rows are
//! uploaded to the GPU as WGSL columns, so the shader's `m * v` computes the
//! same transform without any transpose on the CPU side.

use std::ops::Mul;

use glam::Mat4;

/// A 4×4 matrix stored as four rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    /// Row-major elements, `rows[r][c]`.
    pub rows: [[f32; 4]; 4],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4 {
    /// The identity matrix.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// The all-zero matrix.
    #[must_use]
    pub const fn zero() -> Self {
        Self { rows: [[0.0; 4]; 4] }
    }

    /// Rotation about the X axis by `angle` radians.
    #[must_use]
    pub fn rotate_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, c, -s, 0.0],
                [0.0, s, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation about the Y axis by `angle` radians.
    #[must_use]
    pub fn rotate_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rows: [
                [c, 0.0, s, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [-s, 0.0, c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation about the Z axis by `angle` radians.
    #[must_use]
    pub fn rotate_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rows: [
                [c, -s, 0.0, 0.0],
                [s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Standard matrix product `self · other`.
    ///
    /// Under the row-vector convention `p · (A · B)` applies `A` first, then
    /// `B`.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut out = Self::zero();
        for (r, out_row) in out.rows.iter_mut().enumerate() {
            for (c, cell) in out_row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[r][k] * other.rows[k][c]).sum();
            }
        }
        out
    }

    /// Scale the upper three rows by `s`.
    ///
    /// The homogeneous bottom row is left alone, so this is not a full
    /// uniform 4×4 scale.
    #[must_use]
    pub fn scale_uniform(mut self, s: f32) -> Self {
        for row in &mut self.rows[..3] {
            for cell in row.iter_mut() {
                *cell *= s;
            }
        }
        self
    }

    /// Divide the first row by `ratio` (viewport width / height).
    ///
    /// `ratio` must be positive; this is not checked.
    #[must_use]
    pub fn correct_aspect(mut self, ratio: f32) -> Self {
        for cell in &mut self.rows[0] {
            *cell /= ratio;
        }
        self
    }

    /// Transform a point (implicit `w = 1`) and return the `xyz` part.
    #[must_use]
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let v = [p[0], p[1], p[2], 1.0];
        let mut out = [0.0; 3];
        for (c, o) in out.iter_mut().enumerate() {
            *o = (0..4).map(|k| v[k] * self.rows[k][c]).sum();
        }
        out
    }

    /// Layout for a WGSL `mat4x4<f32>` uniform.
    #[must_use]
    pub const fn to_gpu(&self) -> [[f32; 4]; 4] {
        self.rows
    }

    /// The equivalent column-vector `glam` matrix (the transpose).
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.rows)
    }

    /// Largest absolute element-wise difference from `other`.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f32 {
        self.rows
            .iter()
            .flatten()
            .zip(other.rows.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use glam::Vec3;

    use super::*;

    const EPS: f32 = 1e-6;

    fn from_rows3(r: [[f32; 3]; 3]) -> Matrix4 {
        let mut m = Matrix4::identity();
        for (dst, src) in m.rows.iter_mut().zip(r) {
            dst[..3].copy_from_slice(&src);
        }
        m
    }

    #[test]
    fn rotations_at_ninety_degrees_do_not_commute() {
        let a = Matrix4::rotate_x(FRAC_PI_2);
        let b = Matrix4::rotate_y(FRAC_PI_2);

        let ab = a.multiply(&b);
        let ba = b.multiply(&a);

        let expected_ab =
            from_rows3([[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let expected_ba =
            from_rows3([[0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [-1.0, 0.0, 0.0]]);

        assert!(ab.max_abs_diff(&expected_ab) < EPS, "{ab:?}");
        assert!(ba.max_abs_diff(&expected_ba) < EPS, "{ba:?}");
        assert!(ab.max_abs_diff(&ba) > 0.5);
    }

    #[test]
    fn multiplication_is_associative() {
        let a = Matrix4::rotate_x(0.3);
        let b = Matrix4::rotate_y(-1.1).scale_uniform(2.0);
        let c = Matrix4::rotate_z(0.7).correct_aspect(1.5);

        let left = (a * b) * c;
        let right = a * (b * c);
        assert!(left.max_abs_diff(&right) < EPS);
    }

    #[test]
    fn identity_is_neutral() {
        let m = Matrix4::rotate_z(0.4).scale_uniform(3.0);
        assert_eq!(m * Matrix4::identity(), m);
        assert_eq!(Matrix4::identity() * m, m);
    }

    #[test]
    fn scale_uniform_leaves_bottom_row() {
        let m = Matrix4::identity().scale_uniform(2.0);
        assert_eq!(m.rows[0], [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(m.rows[2], [0.0, 0.0, 2.0, 0.0]);
        assert_eq!(m.rows[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn correct_aspect_divides_first_row_only() {
        let m = Matrix4::identity().correct_aspect(2.0);
        assert_eq!(m.rows[0], [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(m.rows[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(m.transform_point([4.0, 4.0, 0.0]), [2.0, 4.0, 0.0]);
    }

    #[test]
    fn row_vector_product_applies_left_factor_first() {
        let p = [0.0, 0.0, 1.0];
        let ry = Matrix4::rotate_y(FRAC_PI_2);
        let rx = Matrix4::rotate_x(FRAC_PI_2);

        let step = rx.transform_point(ry.transform_point(p));
        let combined = (ry * rx).transform_point(p);
        for (s, c) in step.iter().zip(combined) {
            assert!((s - c).abs() < EPS);
        }
    }

    #[test]
    fn glam_conversion_matches_row_vector_transform() {
        let m = Matrix4::rotate_x(0.5) * Matrix4::rotate_z(1.2).scale_uniform(0.5);
        let p = [0.3, -0.7, 1.9];
        let ours = m.transform_point(p);
        let theirs = m.to_mat4().transform_point3(Vec3::from(p));
        assert!((Vec3::from(ours) - theirs).length() < EPS);
    }
}
