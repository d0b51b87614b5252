use super::GeoBounds;

/// North-up affine transform from pixel (col, row) to (lon, lat).
///
/// `pixel_size.1` is negative so that row 0 sits on the northern edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform {
    pub origin: (f64, f64),
    pub pixel_size: (f64, f64),
}

impl GeoTransform {
    pub fn from_bounds(bounds: &GeoBounds, width: u32, height: u32) -> Self {
        Self {
            origin: (bounds.ll_lon, bounds.ur_lat),
            pixel_size: (
                bounds.width() / width as f64,
                -bounds.height() / height as f64,
            ),
        }
    }

    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin.0 + col * self.pixel_size.0,
            self.origin.1 + row * self.pixel_size.1,
        )
    }

    /// Coefficients in GDAL order `[x0, dx, 0, y0, 0, dy]`
    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.origin.0,
            self.pixel_size.0,
            0.0,
            self.origin.1,
            0.0,
            self.pixel_size.1,
        ]
    }

    /// Transform of a reduced resolution copy of the same footprint
    pub fn scaled_to(&self, full: (u32, u32), reduced: (u32, u32)) -> Self {
        Self {
            origin: self.origin,
            pixel_size: (
                self.pixel_size.0 * full.0 as f64 / reduced.0 as f64,
                self.pixel_size.1 * full.1 as f64 / reduced.1 as f64,
            ),
        }
    }
}
