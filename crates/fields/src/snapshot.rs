//! PNG rendering of a density [`Raster`].
//!
//! Feature-gated behind `png` (default on) so the registry can be used
//! without pulling in the `image` crate. The pixel conversion itself lives
//! in [`crate::pixel`].

use flow_engine_core::EngineError;
use std::path::Path;

use crate::pixel::raster_to_rgba;
use crate::raster::Raster;

/// Writes the raster as a grayscale PNG.
///
/// Returns `EngineError::InvalidDimensions` if the raster dimensions
/// overflow `u32`, or `EngineError::Io` on write failure.
pub fn write_png(raster: &Raster, path: &Path) -> Result<(), EngineError> {
    let rgba = raster_to_rgba(raster);
    let w = u32::try_from(raster.width()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(raster.height()).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))
}
