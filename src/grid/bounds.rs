use std::fmt;

/// Lower-left and upper-right corners of a grid in lon/lat degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    pub ll_lon: f64,
    pub ll_lat: f64,
    pub ur_lon: f64,
    pub ur_lat: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoundsError {
    NotNumeric(String),
    NotFinite(GeoBounds),
    InvertedLongitude { ll_lon: f64, ur_lon: f64 },
    InvertedLatitude { ll_lat: f64, ur_lat: f64 },
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundsError::NotNumeric(name) => write!(f, "bound {name} is not a number"),
            BoundsError::NotFinite(bounds) => write!(f, "bounds are not finite: {bounds}"),
            BoundsError::InvertedLongitude { ll_lon, ur_lon } => {
                write!(f, "LL_lon {ll_lon} is not west of UR_lon {ur_lon}")
            }
            BoundsError::InvertedLatitude { ll_lat, ur_lat } => {
                write!(f, "LL_lat {ll_lat} is not south of UR_lat {ur_lat}")
            }
        }
    }
}

impl std::error::Error for BoundsError {}

impl GeoBounds {
    pub fn new(ll_lon: f64, ll_lat: f64, ur_lon: f64, ur_lat: f64) -> Self {
        Self {
            ll_lon,
            ll_lat,
            ur_lon,
            ur_lat,
        }
    }

    /// Check the corners describe a non-empty, north-up footprint.
    /// Flipped corners would otherwise produce a mirrored raster.
    pub fn validate(&self) -> Result<(), BoundsError> {
        let corners = [self.ll_lon, self.ll_lat, self.ur_lon, self.ur_lat];
        if !corners.iter().all(|v| v.is_finite()) {
            return Err(BoundsError::NotFinite(*self));
        }
        if self.ll_lon >= self.ur_lon {
            return Err(BoundsError::InvertedLongitude {
                ll_lon: self.ll_lon,
                ur_lon: self.ur_lon,
            });
        }
        if self.ll_lat >= self.ur_lat {
            return Err(BoundsError::InvertedLatitude {
                ll_lat: self.ll_lat,
                ur_lat: self.ur_lat,
            });
        }
        Ok(())
    }

    pub fn validated(self) -> Result<Self, BoundsError> {
        self.validate().map(|_| self)
    }

    pub fn width(&self) -> f64 {
        self.ur_lon - self.ll_lon
    }

    pub fn height(&self) -> f64 {
        self.ur_lat - self.ll_lat
    }
}

impl fmt::Display for GeoBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] - [{}, {}]",
            self.ll_lon, self.ll_lat, self.ur_lon, self.ur_lat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_bounds_are_valid() {
        assert!(GeoBounds::new(-2.0, 50.0, 0.0, 52.0).validate().is_ok());
    }

    #[test]
    fn flipped_corners_are_rejected() {
        assert!(matches!(
            GeoBounds::new(0.0, 50.0, -2.0, 52.0).validate(),
            Err(BoundsError::InvertedLongitude { .. })
        ));
        assert!(matches!(
            GeoBounds::new(-2.0, 52.0, 0.0, 50.0).validate(),
            Err(BoundsError::InvertedLatitude { .. })
        ));
        assert!(matches!(
            GeoBounds::new(-2.0, 50.0, -2.0, 52.0).validate(),
            Err(BoundsError::InvertedLongitude { .. })
        ));
    }

    #[test]
    fn nan_corner_is_rejected() {
        assert!(matches!(
            GeoBounds::new(f64::NAN, 50.0, 0.0, 52.0).validate(),
            Err(BoundsError::NotFinite(_))
        ));
    }
}
