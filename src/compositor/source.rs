//! Read access to a finished G-buffer.

use crate::codec::{decode_float, decode_int, to_unorm, EncodedPixel};

/// Decoded per-pixel G-buffer channels.
///
/// Coordinates outside the image are clamped to the nearest edge pixel,
/// matching clamp-to-edge texture addressing.
pub trait GBufferSource {
    /// Image width in pixels.
    fn width(&self) -> u32;
    /// Image height in pixels.
    fn height(&self) -> u32;
    /// Shaded color with alpha, each in `[0, 1]`.
    fn color_at(&self, x: u32, y: u32) -> [f32; 4];
    /// Depth in `[0, 1)`, larger is nearer; `0` is background.
    fn depth_at(&self, x: u32, y: u32) -> f32;
    /// Instance index.
    fn index_at(&self, x: u32, y: u32) -> u32;
    /// Group id.
    fn group_at(&self, x: u32, y: u32) -> u32;

    /// Clamp signed coordinates into the image.
    fn clamp(&self, x: i64, y: i64) -> (u32, u32) {
        let cx = x.clamp(0, i64::from(self.width().max(1)) - 1);
        let cy = y.clamp(0, i64::from(self.height().max(1)) - 1);
        (cx as u32, cy as u32)
    }

    /// Depth with edge clamping.
    fn depth(&self, x: i64, y: i64) -> f32 {
        let (x, y) = self.clamp(x, y);
        self.depth_at(x, y)
    }

    /// Index with edge clamping.
    fn index(&self, x: i64, y: i64) -> u32 {
        let (x, y) = self.clamp(x, y);
        self.index_at(x, y)
    }

    /// Group with edge clamping.
    fn group(&self, x: i64, y: i64) -> u32 {
        let (x, y) = self.clamp(x, y);
        self.group_at(x, y)
    }
}

/// Channels as stored by the packed layout: one RGBA8 texel per pixel per
/// channel, depth/index/group codec-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedGBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 color.
    pub color: Vec<[u8; 4]>,
    /// Encoded depth.
    pub depth: Vec<EncodedPixel>,
    /// Encoded index.
    pub index: Vec<EncodedPixel>,
    /// Encoded group.
    pub group: Vec<EncodedPixel>,
}

impl PackedGBuffer {
    /// All-zero buffer (background everywhere).
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let n = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![[0; 4]; n],
            depth: vec![[0; 4]; n],
            index: vec![[0; 4]; n],
            group: vec![[0; 4]; n],
        }
    }

    fn at(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl GBufferSource for PackedGBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color_at(&self, x: u32, y: u32) -> [f32; 4] {
        to_unorm(self.color[self.at(x, y)])
    }

    fn depth_at(&self, x: u32, y: u32) -> f32 {
        decode_float(self.depth[self.at(x, y)])
    }

    fn index_at(&self, x: u32, y: u32) -> u32 {
        decode_int(self.index[self.at(x, y)])
    }

    fn group_at(&self, x: u32, y: u32) -> u32 {
        decode_int(self.group[self.at(x, y)])
    }
}

/// Channels as stored by the layered layout: RGBA8 color plus one float
/// texel `(depth, index, group, 1)` per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredGBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 color.
    pub color: Vec<[u8; 4]>,
    /// Raw `(depth, index, group, coverage)` floats.
    pub layers: Vec<[f32; 4]>,
}

impl LayeredGBuffer {
    /// All-zero buffer (background everywhere).
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let n = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![[0; 4]; n],
            layers: vec![[0.0; 4]; n],
        }
    }

    /// Build from per-pixel closures; handy for synthetic scenes.
    #[must_use]
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> ([u8; 4], [f32; 4]),
    ) -> Self {
        let mut buffer = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let i = buffer.at(x, y);
                let (color, layers) = f(x, y);
                buffer.color[i] = color;
                buffer.layers[i] = layers;
            }
        }
        buffer
    }

    fn at(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl GBufferSource for LayeredGBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color_at(&self, x: u32, y: u32) -> [f32; 4] {
        to_unorm(self.color[self.at(x, y)])
    }

    fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.layers[self.at(x, y)][0]
    }

    fn index_at(&self, x: u32, y: u32) -> u32 {
        self.layers[self.at(x, y)][1] as u32
    }

    fn group_at(&self, x: u32, y: u32) -> u32 {
        self.layers[self.at(x, y)][2] as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_float, encode_int};

    #[test]
    fn out_of_range_reads_clamp_to_edge() {
        let buffer = LayeredGBuffer::from_fn(4, 3, |x, y| {
            ([0; 4], [0.1 * x as f32, 0.0, y as f32, 1.0])
        });
        assert_eq!(buffer.depth(-5, 1), buffer.depth_at(0, 1));
        assert_eq!(buffer.depth(9, 1), buffer.depth_at(3, 1));
        assert_eq!(buffer.group(1, -2), 0);
        assert_eq!(buffer.group(1, 40), 2);
    }

    #[test]
    fn packed_buffer_decodes_channels() {
        let mut buffer = PackedGBuffer::new(2, 2);
        buffer.depth[3] = encode_float(0.625);
        buffer.index[3] = encode_int(70_000);
        buffer.group[3] = encode_int(9);
        buffer.color[3] = [255, 0, 51, 255];
        assert_eq!(buffer.depth_at(1, 1), 0.625);
        assert_eq!(buffer.index_at(1, 1), 70_000);
        assert_eq!(buffer.group_at(1, 1), 9);
        assert_eq!(buffer.color_at(1, 1), [1.0, 0.0, 0.2, 1.0]);
    }
}
