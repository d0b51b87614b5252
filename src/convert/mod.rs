//! One observation file in, one COG out

use crate::container::ObservationSource;
use crate::palette::{classify, Palette};
use crate::writer::{Bands, RasterWriter, EPSG_WGS84};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

mod error;

pub use error::{ConvertError, ConvertResult};

/// Visual (palette classified RGBA) or lossless (raw single band) output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourMode {
    Coloured,
    Greyscale,
}

impl ColourMode {
    pub const ALL: [ColourMode; 2] = [ColourMode::Coloured, ColourMode::Greyscale];

    pub fn from_colour_flag(colour: bool) -> Self {
        if colour {
            ColourMode::Coloured
        } else {
            ColourMode::Greyscale
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            ColourMode::Coloured => "coloured",
            ColourMode::Greyscale => "greyscale",
        }
    }

    /// `<base>_<mode>.tif`
    pub fn output_file_name(&self, base: &str) -> String {
        format!("{base}_{}.tif", self.suffix())
    }

    pub fn default_file_name(&self) -> String {
        self.output_file_name("radar_output")
    }
}

impl fmt::Display for ColourMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Extract, optionally classify, and write
pub struct Converter<S> {
    source: S,
    palette: Palette,
    writer: RasterWriter,
}

impl<S: ObservationSource> Converter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            palette: Palette::default(),
            writer: RasterWriter::default(),
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_writer(mut self, writer: RasterWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn convert(
        &self,
        input: &Path,
        output_folder: &Path,
        mode: ColourMode,
        output_filename: Option<&str>,
    ) -> ConvertResult<PathBuf> {
        std::fs::create_dir_all(output_folder).map_err(|source| ConvertError::OutputDir {
            path: output_folder.to_path_buf(),
            source,
        })?;

        let observation = self.source.read_observation(input)?;
        let transform = observation.transform();
        let output_path = match output_filename {
            Some(name) => output_folder.join(name),
            None => output_folder.join(mode.default_file_name()),
        };

        match mode {
            ColourMode::Coloured => {
                let colours = classify(&observation.grid, &self.palette);
                self.writer
                    .write(Bands::Visual(&colours), &transform, EPSG_WGS84, &output_path)?;
            }
            ColourMode::Greyscale => {
                self.writer.write(
                    Bands::Lossless(&observation.grid),
                    &transform,
                    EPSG_WGS84,
                    &output_path,
                )?;
            }
        }

        let (width, height) = observation.grid.dimensions();
        info!(
            "Saved {mode} COG {} ({width}x{height})",
            output_path.display()
        );
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_mode() {
        assert_eq!(ColourMode::Coloured.default_file_name(), "radar_output_coloured.tif");
        assert_eq!(ColourMode::Greyscale.default_file_name(), "radar_output_greyscale.tif");
        assert_eq!(
            ColourMode::Greyscale.output_file_name("radar_20240101"),
            "radar_20240101_greyscale.tif"
        );
        assert_eq!(ColourMode::from_colour_flag(true), ColourMode::Coloured);
    }
}
