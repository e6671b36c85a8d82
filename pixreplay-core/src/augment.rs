//! Random shift augmentation of image observations.
//!
//! An image of shape `(C, H, W)` is padded by `pad` pixels on every spatial
//! border, replicating the border pixels, and a window of the original size
//! is cropped at an offset drawn uniformly from `[0, 2 * pad] x [0, 2 * pad]`.
//!
//! Padding and cropping are fused: output pixel `(c, y, x)` is read from
//! source pixel `(c, clamp(y + dy - pad), clamp(x + dx - pad))`, so no padded
//! image is materialized on the sampling path.
use crate::ImageShape;
use rand::Rng;

/// Top-left corner of a crop window in padded coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CropOffset {
    /// Vertical offset, in `[0, 2 * pad]`.
    pub dy: usize,

    /// Horizontal offset, in `[0, 2 * pad]`.
    pub dx: usize,
}

/// Pad-then-crop augmentation with replicated borders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomShift {
    pad: usize,
}

#[inline]
fn source_index(i: usize, offset: usize, pad: usize, n: usize) -> usize {
    (i + offset).saturating_sub(pad).min(n - 1)
}

impl RandomShift {
    /// Creates the augmentation. `pad == 0` gives the identity transform.
    pub fn new(pad: usize) -> Self {
        Self { pad }
    }

    /// Padding in pixels.
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// Draws a crop offset.
    ///
    /// With `pad == 0` the offset is `(0, 0)` and the random source is left
    /// untouched.
    pub fn offset<R: Rng + ?Sized>(&self, rng: &mut R) -> CropOffset {
        if self.pad == 0 {
            return CropOffset::default();
        }
        CropOffset {
            dy: rng.gen_range(0..=2 * self.pad),
            dx: rng.gen_range(0..=2 * self.pad),
        }
    }

    /// Writes the crop of `image` at `offset` into `out`, converting every
    /// pixel with `f`.
    ///
    /// `image` and `out` must both hold `shape.len()` elements.
    pub fn crop_map<T, F>(
        &self,
        image: &[u8],
        shape: &ImageShape,
        offset: CropOffset,
        out: &mut [T],
        f: F,
    ) where
        F: Fn(u8) -> T,
    {
        debug_assert_eq!(image.len(), shape.len());
        debug_assert_eq!(out.len(), shape.len());
        debug_assert!(offset.dy <= 2 * self.pad && offset.dx <= 2 * self.pad);

        let (h, w) = (shape.height, shape.width);
        let xs: Vec<usize> = (0..w)
            .map(|x| source_index(x, offset.dx, self.pad, w))
            .collect();

        for (src, dst) in image
            .chunks_exact(shape.plane())
            .zip(out.chunks_exact_mut(shape.plane()))
        {
            for (y, dst_row) in dst.chunks_exact_mut(w).enumerate() {
                let sy = source_index(y, offset.dy, self.pad, h);
                let src_row = &src[sy * w..(sy + 1) * w];
                for (d, &sx) in dst_row.iter_mut().zip(xs.iter()) {
                    *d = f(src_row[sx]);
                }
            }
        }
    }

    /// Crops `image` at `offset`, keeping raw pixels.
    pub fn crop(&self, image: &[u8], shape: &ImageShape, offset: CropOffset) -> Vec<u8> {
        let mut out = vec![0u8; shape.len()];
        self.crop_map(image, shape, offset, &mut out, |p| p);
        out
    }

    /// Applies the augmentation with a freshly drawn offset.
    ///
    /// Returns the augmented image and the offset used.
    pub fn augment<R: Rng + ?Sized>(
        &self,
        image: &[u8],
        shape: &ImageShape,
        rng: &mut R,
    ) -> (Vec<u8>, CropOffset) {
        let offset = self.offset(rng);
        (self.crop(image, shape, offset), offset)
    }

    /// Returns `image` padded by replication, of shape
    /// `(C, H + 2 * pad, W + 2 * pad)`.
    pub fn pad_replicate(&self, image: &[u8], shape: &ImageShape) -> Vec<u8> {
        let (h, w) = (shape.height, shape.width);
        let (ph, pw) = (h + 2 * self.pad, w + 2 * self.pad);
        let mut out = Vec::with_capacity(shape.channels * ph * pw);
        for src in image.chunks_exact(shape.plane()) {
            for y in 0..ph {
                let sy = source_index(y, 0, self.pad, h);
                for x in 0..pw {
                    let sx = source_index(x, 0, self.pad, w);
                    out.push(src[sy * w + sx]);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn ramp(shape: &ImageShape) -> Vec<u8> {
        (0..shape.len()).map(|i| (i % 251) as u8).collect()
    }

    /// Reference crop computed on an explicitly padded image.
    fn crop_padded(
        padded: &[u8],
        shape: &ImageShape,
        pad: usize,
        offset: CropOffset,
    ) -> Vec<u8> {
        let (pw, ph) = (shape.width + 2 * pad, shape.height + 2 * pad);
        let mut out = vec![];
        for c in 0..shape.channels {
            for y in 0..shape.height {
                for x in 0..shape.width {
                    let ix = c * ph * pw + (y + offset.dy) * pw + (x + offset.dx);
                    out.push(padded[ix]);
                }
            }
        }
        out
    }

    #[test]
    fn test_identity_without_pad() {
        let shape = ImageShape::new(3, 5, 7);
        let image = ramp(&shape);
        let aug = RandomShift::new(0);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10 {
            let (out, offset) = aug.augment(&image, &shape, &mut rng);
            assert_eq!(offset, CropOffset::default());
            assert_eq!(out, image);
        }
    }

    #[test]
    fn test_pad_replicate() {
        let shape = ImageShape::new(1, 2, 2);
        let image = vec![1u8, 2, 3, 4];
        let padded = RandomShift::new(1).pad_replicate(&image, &shape);
        #[rustfmt::skip]
        let expected = vec![
            1, 1, 2, 2,
            1, 1, 2, 2,
            3, 3, 4, 4,
            3, 3, 4, 4,
        ];
        assert_eq!(padded, expected);
    }

    #[test]
    fn test_fused_crop_matches_pad_then_crop() {
        let shape = ImageShape::new(2, 6, 5);
        let image = ramp(&shape);
        let pad = 3;
        let aug = RandomShift::new(pad);
        let padded = aug.pad_replicate(&image, &shape);
        for dy in 0..=2 * pad {
            for dx in 0..=2 * pad {
                let offset = CropOffset { dy, dx };
                assert_eq!(
                    aug.crop(&image, &shape, offset),
                    crop_padded(&padded, &shape, pad, offset)
                );
            }
        }
    }

    #[test]
    fn test_centered_crop_is_identity() {
        let shape = ImageShape::new(3, 8, 8);
        let image = ramp(&shape);
        let aug = RandomShift::new(4);
        let out = aug.crop(&image, &shape, CropOffset { dy: 4, dx: 4 });
        assert_eq!(out, image);
    }

    #[test]
    fn test_offset_bounds_and_output_shape() {
        let shape = ImageShape::new(3, 10, 12);
        let image = ramp(&shape);
        let pad = 4;
        let aug = RandomShift::new(pad);
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2000 {
            let (out, offset) = aug.augment(&image, &shape, &mut rng);
            assert_eq!(out.len(), shape.len());
            assert!(offset.dy <= 2 * pad && offset.dx <= 2 * pad);
            seen_min |= offset.dy == 0 || offset.dx == 0;
            seen_max |= offset.dy == 2 * pad || offset.dx == 2 * pad;
        }
        assert!(seen_min && seen_max);
    }
}
