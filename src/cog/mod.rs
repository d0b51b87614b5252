use crate::geotags::GeoTags;
use crate::grid::GeoTransform;
use crate::raster::Raster;
use crate::tiff::{Tiff, TiffVariant};
use std::fmt::Display;
use std::io::{BufReader, Read, Seek, SeekFrom};

mod compression;
mod error;
mod level;

pub use compression::{Compression, CompressionError, Predictor};
pub use error::{CloudTiffError, CloudTiffResult};
pub use level::Level;

/// Index of a tiled, possibly multi-resolution, GeoTIFF
#[derive(Clone, Debug)]
pub struct CloudTiff {
    pub variant: TiffVariant,
    levels: Vec<Level>,
    geo_tags: Option<GeoTags>,
    head_bytesize: usize,
}

impl CloudTiff {
    pub fn open<R: Read + Seek>(source: &mut R) -> CloudTiffResult<Self> {
        source.seek(SeekFrom::Start(0))?;
        let stream = &mut BufReader::new(source);

        // TIFF indexing
        let tiff = Tiff::open(stream)?;

        // GeoTIFF tags are optional, a plain tiled TIFF is still readable
        let ifd0 = tiff.ifd0()?;
        let geo_tags = GeoTags::parse(ifd0).ok();

        // Map IFDs into COG Levels
        //   Note this skips over any ifds which aren't valid COG levels
        let mut levels: Vec<Level> = tiff
            .ifds
            .iter()
            .filter_map(|ifd| Level::from_ifd(ifd, tiff.endian).ok())
            .collect();

        // COGs should already have levels sorted big to small
        levels.sort_by(|a, b| (b.megapixels()).total_cmp(&a.megapixels()));
        if levels.is_empty() {
            return Err(CloudTiffError::NoLevels);
        }

        Ok(Self {
            variant: tiff.variant,
            levels,
            geo_tags,
            head_bytesize: tiff.head_bytesize(),
        })
    }

    pub fn full_dimensions(&self) -> (u32, u32) {
        self.levels[0].dimensions
    }

    pub fn full_megapixels(&self) -> f64 {
        self.levels[0].megapixels()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn get_level(&self, level: usize) -> CloudTiffResult<&Level> {
        self.levels
            .get(level)
            .ok_or(CloudTiffError::TileLevelOutOfRange((level, self.max_level())))
    }

    pub fn geo_tags(&self) -> Option<&GeoTags> {
        self.geo_tags.as_ref()
    }

    /// Pixel to lon/lat transform of one level, None without a north-up model
    pub fn level_transform(&self, level: usize) -> Option<GeoTransform> {
        let full = self.geo_tags.as_ref()?.transform()?;
        let reduced = self.levels.get(level)?.dimensions;
        Some(full.scaled_to(self.full_dimensions(), reduced))
    }

    /// Decode a whole level, 0 being full resolution
    pub fn read_level<R: Read + Seek>(
        &self,
        source: &mut R,
        level: usize,
    ) -> CloudTiffResult<Raster> {
        self.get_level(level)?.read_raster(source)
    }

    /// True when every IFD sits ahead of the image data and the overview data
    /// is stored smallest first, ahead of the full resolution tiles.
    pub fn is_cloud_optimized(&self) -> bool {
        let head = self.head_bytesize as u64;
        let data_after_head = self
            .levels
            .iter()
            .flat_map(|level| level.offsets.iter())
            .all(|offset| *offset >= head);

        let ordered = self.levels.windows(2).all(|pair| {
            let larger = pair[0].offsets.iter().min();
            let smaller = pair[1].offsets.iter().max();
            matches!((larger, smaller), (Some(l), Some(s)) if s < l)
        });

        data_after_head && ordered
    }
}

impl Display for CloudTiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CloudTiff({} Levels)", self.levels.len())?;
        for level in self.levels.iter() {
            write!(f, "\n  {level}")?;
        }
        Ok(())
    }
}

/// Human readable dump of the TIFF structure and GeoTIFF keys
pub fn disect<R: Read + Seek>(stream: &mut R) -> CloudTiffResult<String> {
    stream.seek(SeekFrom::Start(0))?;
    let tiff = Tiff::open(stream)?;
    let mut report = format!("{tiff}");

    match GeoTags::parse(tiff.ifd0()?) {
        Ok(geo) => report.push_str(&format!("\n{geo}")),
        Err(e) => report.push_str(&format!("\nNo GeoTIFF tags: {e}")),
    }

    if let Ok(cog) = CloudTiff::open(stream) {
        report.push_str(&format!(
            "\n{cog}\nCloud optimized layout: {}",
            cog.is_cloud_optimized()
        ));
        for level in 0..cog.levels().len() {
            if let Some(transform) = cog.level_transform(level) {
                report.push_str(&format!("\nLevel {level} transform {:?}", transform.coefficients()));
            }
        }
    }
    Ok(report)
}
