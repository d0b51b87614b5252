//! Rainfall intensity colour classification.
//!
//! A palette is an ordered table of half-open intensity bands, each with an
//! opaque colour. Tables are data and can be loaded from JSON as a list of
//! `[low, high, r, g, b]` entries, with `high` null for the last band.

use crate::grid::ObservationGrid;
use crate::raster::{ExtraSamples, PhotometricInterpretation, Raster, RasterError, SampleFormat};
use crate::tiff::Endian;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;

pub use error::{PaletteError, PaletteResult};

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// One intensity band, `low <= value < high`, `high` of None is unbounded
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BandTuple", into = "BandTuple")]
pub struct PaletteBand {
    pub low: f64,
    pub high: Option<f64>,
    pub rgb: [u8; 3],
}

type BandTuple = (f64, Option<f64>, u8, u8, u8);

impl From<BandTuple> for PaletteBand {
    fn from((low, high, r, g, b): BandTuple) -> Self {
        Self {
            low,
            high,
            rgb: [r, g, b],
        }
    }
}

impl From<PaletteBand> for BandTuple {
    fn from(band: PaletteBand) -> Self {
        let [r, g, b] = band.rgb;
        (band.low, band.high, r, g, b)
    }
}

impl PaletteBand {
    pub const fn new(low: f64, high: Option<f64>, rgb: [u8; 3]) -> Self {
        Self { low, high, rgb }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && self.high.map_or(true, |high| value < high)
    }

    pub fn colour(&self) -> Rgba {
        let [r, g, b] = self.rgb;
        [r, g, b, 255]
    }
}

const DARK_BLUE: [u8; 3] = [0, 0, 254];
const LIGHT_BLUE: [u8; 3] = [50, 101, 254];
const GREEN: [u8; 3] = [127, 127, 0];
const YELLOW: [u8; 3] = [254, 203, 0];
const ORANGE: [u8; 3] = [254, 152, 0];
const RED: [u8; 3] = [254, 0, 0];
const PINK: [u8; 3] = [254, 0, 254];
const WHITEISH: [u8; 3] = [229, 254, 254];

/// Validated, contiguous band table
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    bands: Vec<PaletteBand>,
}

impl Palette {
    pub fn new(bands: Vec<PaletteBand>) -> PaletteResult<Self> {
        let Some(last) = bands.last() else {
            return Err(PaletteError::Empty);
        };
        if last.high.is_some() {
            return Err(PaletteError::ClosedFinalBand);
        }

        for (index, band) in bands.iter().enumerate() {
            if !band.low.is_finite() {
                return Err(PaletteError::BadBand {
                    index,
                    reason: format!("low bound {} is not finite", band.low),
                });
            }
            match band.high {
                Some(high) if !(high.is_finite() && high > band.low) => {
                    return Err(PaletteError::BadBand {
                        index,
                        reason: format!("high bound {high} must be finite and above {}", band.low),
                    });
                }
                None if index + 1 != bands.len() => {
                    return Err(PaletteError::OpenEndedBand(index));
                }
                _ => {}
            }
        }

        for (index, pair) in bands.windows(2).enumerate() {
            let expected = pair[0].high.unwrap_or(f64::INFINITY);
            if pair[1].low != expected {
                return Err(PaletteError::Gap {
                    index: index + 1,
                    expected,
                    found: pair[1].low,
                });
            }
        }

        Ok(Self { bands })
    }

    /// Eight bands from 0.01 mm up to 32+ mm
    pub fn fine() -> Self {
        Self {
            bands: vec![
                PaletteBand::new(0.01, Some(0.5), DARK_BLUE),
                PaletteBand::new(0.5, Some(1.0), LIGHT_BLUE),
                PaletteBand::new(1.0, Some(2.0), GREEN),
                PaletteBand::new(2.0, Some(4.0), YELLOW),
                PaletteBand::new(4.0, Some(8.0), ORANGE),
                PaletteBand::new(8.0, Some(16.0), RED),
                PaletteBand::new(16.0, Some(32.0), PINK),
                PaletteBand::new(32.0, None, WHITEISH),
            ],
        }
    }

    /// Six bands, the light rain bands of `fine` merged pairwise
    pub fn coarse() -> Self {
        Self {
            bands: vec![
                PaletteBand::new(0.01, Some(1.0), DARK_BLUE),
                PaletteBand::new(1.0, Some(4.0), GREEN),
                PaletteBand::new(4.0, Some(8.0), ORANGE),
                PaletteBand::new(8.0, Some(16.0), RED),
                PaletteBand::new(16.0, Some(32.0), PINK),
                PaletteBand::new(32.0, None, WHITEISH),
            ],
        }
    }

    pub fn from_json(json: &str) -> PaletteResult<Self> {
        let bands: Vec<PaletteBand> = serde_json::from_str(json)?;
        Self::new(bands)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> PaletteResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PaletteError::Read(path.to_path_buf(), e))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> PaletteResult<String> {
        Ok(serde_json::to_string(&self.bands)?)
    }

    pub fn bands(&self) -> &[PaletteBand] {
        &self.bands
    }

    /// Colour of a single sample.
    ///
    /// Positive values below the first band fall into the open-ended last
    /// band. Anything `<= 0`, and NaN, is transparent.
    pub fn colour_for(&self, value: f64) -> Rgba {
        let band = self
            .bands
            .iter()
            .find(|band| band.contains(value))
            .or_else(|| self.bands.last().filter(|_| value > 0.0));
        let colour = band.map_or(TRANSPARENT, PaletteBand::colour);

        // No-signal override goes last, whatever band matched
        if value <= 0.0 || value.is_nan() {
            TRANSPARENT
        } else {
            colour
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::fine()
    }
}

/// RGBA cells, same shape as the grid they were classified from
#[derive(Clone, Debug, PartialEq)]
pub struct ColourGrid(pub Array2<Rgba>);

impl ColourGrid {
    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        let (rows, cols) = self.0.dim();
        (cols as u32, rows as u32)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Rgba> {
        self.0.get((row, col)).copied()
    }

    /// Four band 8 bit raster, alpha declared as unassociated
    pub fn to_raster(&self) -> Result<Raster, RasterError> {
        let buffer = self.0.iter().flat_map(|rgba| rgba.iter().copied()).collect();
        Raster::new(
            self.dimensions(),
            buffer,
            vec![8; 4],
            PhotometricInterpretation::RGB,
            vec![SampleFormat::Unsigned; 4],
            vec![ExtraSamples::UnassociatedAlpha],
            Endian::Little,
        )
    }
}

/// Classify every cell of `grid` independently
pub fn classify(grid: &ObservationGrid, palette: &Palette) -> ColourGrid {
    ColourGrid(grid.map_values(|value| palette.colour_for(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fine_palette_scenario() {
        let grid = ObservationGrid::from(array![[0.0_f64, 0.3], [1.5, 35.0]]);
        let colours = classify(&grid, &Palette::fine());
        assert_eq!(colours.dimensions(), (2, 2));
        assert_eq!(colours.get(0, 0), Some(TRANSPARENT));
        assert_eq!(colours.get(0, 1), Some([0, 0, 254, 255]));
        assert_eq!(colours.get(1, 0), Some([127, 127, 0, 255]));
        assert_eq!(colours.get(1, 1), Some([229, 254, 254, 255]));
    }

    #[test]
    fn alpha_is_zero_only_for_no_signal() {
        let values = [-5.0, -0.0, 0.0, 0.001, 0.01, 0.49, 0.5, 3.0, 31.9, 32.0, 1e9];
        for palette in [Palette::fine(), Palette::coarse()] {
            for value in values {
                let alpha = palette.colour_for(value)[3];
                assert_eq!(alpha == 0, value <= 0.0, "{value}");
            }
        }
        assert_eq!(Palette::fine().colour_for(f64::NAN), TRANSPARENT);
    }

    #[test]
    fn band_edges_are_half_open() {
        let fine = Palette::fine();
        assert_eq!(fine.colour_for(0.5), [50, 101, 254, 255]);
        assert_eq!(fine.colour_for(0.4999), [0, 0, 254, 255]);
        assert_eq!(fine.colour_for(32.0), [229, 254, 254, 255]);
    }

    #[test]
    fn below_first_band_uses_open_band() {
        assert_eq!(Palette::fine().colour_for(0.005), [229, 254, 254, 255]);
        assert_eq!(Palette::coarse().colour_for(0.005), [229, 254, 254, 255]);
    }

    #[test]
    fn built_in_palettes_validate() {
        for palette in [Palette::fine(), Palette::coarse()] {
            assert_eq!(Palette::new(palette.bands().to_vec()).unwrap(), palette);
        }
        assert_eq!(Palette::fine().bands().len(), 8);
        assert_eq!(Palette::coarse().bands().len(), 6);
    }

    #[test]
    fn json_tables() {
        let palette = Palette::from_json("[[0.1, 5, 1, 2, 3], [5, null, 4, 5, 6]]").unwrap();
        assert_eq!(palette.colour_for(1.0), [1, 2, 3, 255]);
        assert_eq!(palette.colour_for(7.0), [4, 5, 6, 255]);
        assert_eq!(Palette::from_json(&palette.to_json().unwrap()).unwrap(), palette);
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(matches!(Palette::new(vec![]), Err(PaletteError::Empty)));
        assert!(matches!(
            Palette::from_json("[[0, 1, 0, 0, 0], [2, null, 0, 0, 0]]"),
            Err(PaletteError::Gap { index: 1, .. })
        ));
        assert!(matches!(
            Palette::from_json("[[0, null, 0, 0, 0], [1, null, 0, 0, 0]]"),
            Err(PaletteError::OpenEndedBand(0))
        ));
        assert!(matches!(
            Palette::from_json("[[0, 1, 0, 0, 0]]"),
            Err(PaletteError::ClosedFinalBand)
        ));
        assert!(matches!(
            Palette::from_json("[[2, 1, 0, 0, 0], [1, null, 0, 0, 0]]"),
            Err(PaletteError::BadBand { index: 0, .. })
        ));
        assert!(matches!(Palette::from_json("{"), Err(PaletteError::Parse(_))));
    }

    #[test]
    fn colour_raster_is_rgba() {
        let grid = ObservationGrid::from(array![[0.0_f32, 2.0, 9.0]]);
        let raster = classify(&grid, &Palette::fine()).to_raster().unwrap();
        assert_eq!(raster.dimensions, (3, 1));
        assert_eq!(raster.get_pixel(1, 0), Some(&[254, 203, 0, 255][..]));
        assert_eq!(raster.extra_samples, vec![ExtraSamples::UnassociatedAlpha]);
    }
}
