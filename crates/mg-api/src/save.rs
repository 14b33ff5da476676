use std::path::Path;

use image::{Rgb, RgbImage};
use mg_core::{MapGenError, Palette, Raster, SKY_INDEX};

/// Writes `raster` as an RGB image, colouring each index through `palette`.
/// The format follows the file extension.
pub fn save_raster(raster: &Raster, path: &Path, palette: &Palette) -> Result<(), MapGenError> {
    if raster.width() == 0 || raster.height() == 0 {
        return Err(MapGenError::new(
            "RASTER_SAVE",
            format!("Cannot save empty raster to '{}'", path.display()),
        ));
    }
    let image = RgbImage::from_fn(raster.width(), raster.height(), |x, y| {
        let index = raster
            .get(i64::from(x), i64::from(y))
            .unwrap_or(SKY_INDEX);
        Rgb(palette.color(index))
    });
    image.save(path).map_err(|error| {
        MapGenError::new(
            "RASTER_SAVE",
            format!("Failed to save '{}': {}", path.display(), error),
        )
    })
}
