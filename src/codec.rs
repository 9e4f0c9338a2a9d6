//! Packing of depth floats and integer identifiers into RGBA8 texels.
//!
//! G-buffer channels that hold depth, instance index, or group id are plain
//! 8-bit-per-channel render targets. This module defines the CPU side of the
//! encoding; `assets/shaders/modules/codec.wgsl` is the GPU side and produces
//! the same bytes once the shader output is quantized by an `Rgba8Unorm`
//! target.
//!
//! Floats are stored as four base-256 digits of their fraction, least
//! significant digit in channel 0. Integers are stored most significant
//! byte first.

use std::fmt;

/// Positional weights `[256³, 256², 256, 1]` shared by both encodings.
pub const FLOAT_WEIGHTS: [f64; 4] = [16_777_216.0, 65_536.0, 256.0, 1.0];

/// Integer weights matching [`FLOAT_WEIGHTS`].
const INT_WEIGHTS: [u32; 4] = [16_777_216, 65_536, 256, 1];

/// Worst-case absolute error of a float round trip.
pub const FLOAT_ROUND_TRIP_BOUND: f64 = 1.0 / 4_294_967_296.0;

/// Largest identifier that survives the pipeline exactly. Float render
/// targets and interpolated varyings keep 24 significant bits.
pub const MAX_EXACT_IDENTIFIER: u32 = (1 << 24) - 1;

/// An encoded channel group as stored in an RGBA8 texel.
pub type EncodedPixel = [u8; 4];

/// Rejection reasons for [`encode_float_checked`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CodecError {
    /// The value is NaN or infinite.
    NotFinite(f32),
    /// The value lies outside `[0, 1)`.
    OutOfDomain(f32),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFinite(v) => write!(f, "cannot encode non-finite {v}"),
            Self::OutOfDomain(v) => {
                write!(f, "{v} is outside the encodable range [0, 1)")
            }
        }
    }
}

impl std::error::Error for CodecError {}

fn fract(v: f64) -> f64 {
    v - v.floor()
}

/// Encode `x` as four base-256 digits of its fractional part.
///
/// Callers are expected to normalize into `[0, 1)` first. Values outside
/// that range wrap: only the fractional part is kept, so `1.25` encodes like
/// `0.25`. Use [`encode_float_checked`] to reject them instead.
#[must_use]
pub fn encode_float(x: f32) -> EncodedPixel {
    let x = f64::from(x);
    // An f32 scaled by a power of two is exact in f64, so every step below
    // is exact and the result matches the GPU bit for bit.
    let mut comp = FLOAT_WEIGHTS.map(|w| fract(x * w));
    for i in (1..4).rev() {
        comp[i] -= comp[i - 1] / 256.0;
    }
    comp.map(|c| ((c * 256.0).floor() as i64).rem_euclid(256) as u8)
}

/// Encode `x`, rejecting NaN, infinities and anything outside `[0, 1)`.
///
/// # Errors
///
/// Returns [`CodecError`] when `x` is not in the encodable domain.
pub fn encode_float_checked(x: f32) -> Result<EncodedPixel, CodecError> {
    if !x.is_finite() {
        return Err(CodecError::NotFinite(x));
    }
    if !(0.0..1.0).contains(&x) {
        return Err(CodecError::OutOfDomain(x));
    }
    Ok(encode_float(x))
}

/// Inverse of [`encode_float`].
#[must_use]
pub fn decode_float(bytes: EncodedPixel) -> f32 {
    decode_float_wide(bytes) as f32
}

/// [`decode_float`] without the final rounding to `f32`.
#[must_use]
pub fn decode_float_wide(bytes: EncodedPixel) -> f64 {
    bytes
        .iter()
        .zip(FLOAT_WEIGHTS)
        .map(|(&b, w)| f64::from(b) / 256.0 / w)
        .sum()
}

/// Encode `n` as base-256 digits, most significant in channel 0.
#[must_use]
pub fn encode_int(n: u32) -> EncodedPixel {
    INT_WEIGHTS.map(|w| ((n / w) % 256) as u8)
}

/// Inverse of [`encode_int`].
#[must_use]
pub fn decode_int(bytes: EncodedPixel) -> u32 {
    bytes
        .iter()
        .zip(INT_WEIGHTS)
        .fold(0u32, |acc, (&b, w)| acc.wrapping_add(u32::from(b).wrapping_mul(w)))
}

/// Normalized channel values as written by a fragment shader into an
/// `Rgba8Unorm` target.
#[must_use]
pub fn to_unorm(bytes: EncodedPixel) -> [f32; 4] {
    bytes.map(|b| f32::from(b) / 255.0)
}

/// Quantize normalized channel values the way an `Rgba8Unorm` store does.
#[must_use]
pub fn from_unorm(channels: [f32; 4]) -> EncodedPixel {
    channels.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_round_trip_within_bound() {
        // 2^-20 quantization step across the whole domain.
        let step = 1.0 / f64::from(1u32 << 20);
        let mut x = 0.0f64;
        while x < 1.0 {
            let v = x as f32;
            let back = decode_float_wide(encode_float(v));
            let err = (back - f64::from(v)).abs();
            assert!(err <= FLOAT_ROUND_TRIP_BOUND, "x={v} err={err}");
            x += step;
        }
    }

    #[test]
    fn float_round_trip_for_awkward_values() {
        for v in [1e-30f32, 1.0 / 3.0, 0.999_999_94, 0.5, 0.1, 0.777_777] {
            let back = decode_float_wide(encode_float(v));
            assert!((back - f64::from(v)).abs() <= FLOAT_ROUND_TRIP_BOUND);
        }
    }

    #[test]
    fn float_digit_layout() {
        // 0.5 = 0x80 in the most significant digit, stored in channel 3.
        assert_eq!(encode_float(0.5), [0, 0, 0, 128]);
        assert_eq!(encode_float(1.0 / 256.0), [0, 0, 0, 1]);
        assert_eq!(encode_float(1.0 / 65_536.0), [0, 0, 1, 0]);
        assert_eq!(encode_float(1.0 / 4_294_967_296.0), [1, 0, 0, 0]);
        assert_eq!(encode_float(0.0), [0, 0, 0, 0]);
    }

    #[test]
    fn out_of_range_floats_wrap() {
        assert_eq!(encode_float(1.25), encode_float(0.25));
        assert_eq!(encode_float(-0.75), encode_float(0.25));
        assert_eq!(encode_float(1.0), encode_float(0.0));
    }

    #[test]
    fn checked_encode_rejects_out_of_domain() {
        assert_eq!(
            encode_float_checked(1.0),
            Err(CodecError::OutOfDomain(1.0))
        );
        assert_eq!(
            encode_float_checked(-0.1),
            Err(CodecError::OutOfDomain(-0.1))
        );
        assert!(matches!(
            encode_float_checked(f32::NAN),
            Err(CodecError::NotFinite(_))
        ));
        assert_eq!(encode_float_checked(0.25), Ok(encode_float(0.25)));
    }

    #[test]
    fn int_round_trip_over_identifier_budget() {
        for n in (0..=MAX_EXACT_IDENTIFIER).step_by(997) {
            assert_eq!(decode_int(encode_int(n)), n);
        }
        for n in [0, 1, 255, 256, 65_535, 65_536, MAX_EXACT_IDENTIFIER] {
            assert_eq!(decode_int(encode_int(n)), n);
        }
    }

    #[test]
    fn int_round_trip_is_exact_for_full_u32() {
        for n in [1 << 24, u32::MAX - 1, u32::MAX] {
            assert_eq!(decode_int(encode_int(n)), n);
        }
    }

    #[test]
    fn int_byte_order_is_most_significant_first() {
        assert_eq!(encode_int(0x0102_0304), [1, 2, 3, 4]);
    }

    #[test]
    fn encoding_is_pure() {
        for v in [0.0f32, 0.123_456, 0.987_654_3] {
            assert_eq!(encode_float(v), encode_float(v));
        }
        for n in [0u32, 42, 1_234_567] {
            assert_eq!(encode_int(n), encode_int(n));
        }
    }

    #[test]
    fn unorm_store_preserves_bytes() {
        for b in 0..=255u8 {
            let px = [b, 255 - b, b / 2, 7];
            assert_eq!(from_unorm(to_unorm(px)), px);
        }
    }
}
