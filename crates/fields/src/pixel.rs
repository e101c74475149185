//! Pure-computation pixel buffer conversion from a [`Raster`].
//!
//! Always available (no feature gate) so callers without the `png` feature
//! can still hand the buffer to their own image sink.

use crate::raster::Raster;

/// Maps raster density to an RGBA8 grayscale buffer.
///
/// Each normalized density `t` in [0, 1] becomes the gray level
/// `round(t * 255)` with full alpha. The buffer length is `width * height * 4`.
pub fn raster_to_rgba(raster: &Raster) -> Vec<u8> {
    raster
        .normalized()
        .iter()
        .flat_map(|&t| {
            let level = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
            [level, level, level, 255u8]
        })
        .collect()
}
