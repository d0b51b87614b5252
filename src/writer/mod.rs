//! Georeferenced COG writing for observation and colour grids

use crate::cog::{CloudTiff, Compression, Predictor};
use crate::encode::{BigTiff, Encoder};
use crate::geotags::GeoTags;
use crate::grid::{GeoTransform, ObservationGrid};
use crate::palette::ColourGrid;
use crate::raster::Raster;
use crate::tiff::Endian;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::debug;

mod error;

pub use error::{WriteError, WriteResult};

pub const EPSG_WGS84: u16 = 4326;

const SOFTWARE: &str = concat!("radarcog ", env!("CARGO_PKG_VERSION"));

/// How the final COG gets produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteStrategy {
    /// Encode the cloud optimized layout in one pass
    #[default]
    Direct,
    /// Write a plain single level GeoTIFF, read it back and encode that
    Reencode,
}

/// Every writer setting, passed explicitly
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub strategy: WriteStrategy,
    pub compression: Compression,
    pub tile_size: u16,
    pub big_tiff: BigTiff,
    pub endian: Endian,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            strategy: WriteStrategy::Direct,
            compression: Compression::Lzw,
            tile_size: 512,
            big_tiff: BigTiff::IfNeeded,
            endian: Endian::Little,
        }
    }
}

impl WriterConfig {
    pub fn with_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u16) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_big_tiff(mut self, big_tiff: BigTiff) -> Self {
        self.big_tiff = big_tiff;
        self
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }
}

/// The two write profiles
#[derive(Debug, Clone, Copy)]
pub enum Bands<'a> {
    /// One band, samples kept bit-for-bit
    Lossless(&'a ObservationGrid),
    /// Four 8 bit bands, RGB plus unassociated alpha
    Visual(&'a ColourGrid),
}

impl Bands<'_> {
    fn to_raster(self, endian: Endian) -> WriteResult<Raster> {
        Ok(match self {
            Bands::Lossless(grid) => grid.to_raster(endian)?,
            Bands::Visual(colours) => colours.to_raster()?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RasterWriter {
    config: WriterConfig,
}

impl RasterWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Write `bands` as a COG at `path`, replacing any existing file.
    ///
    /// Output is staged in a temporary file next to `path` and only renamed
    /// into place once complete, so a failure never leaves a partial target.
    pub fn write(
        &self,
        bands: Bands,
        transform: &GeoTransform,
        epsg: u16,
        path: &Path,
    ) -> WriteResult<()> {
        let start = Instant::now();
        let raster = bands.to_raster(self.config.endian)?;
        let geo_tags = GeoTags::geographic(epsg, transform);

        match self.config.strategy {
            WriteStrategy::Direct => self.write_cog(raster, geo_tags, path)?,
            WriteStrategy::Reencode => self.reencode(raster, geo_tags, path)?,
        }

        debug!(
            "Wrote {} with {:?} strategy in {:.3}s",
            path.display(),
            self.config.strategy,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn write_cog(&self, raster: Raster, geo_tags: GeoTags, path: &Path) -> WriteResult<()> {
        // Horizontal differencing is only defined here for 8 bit samples
        let predictor = if raster.bits_per_sample.iter().all(|bits| *bits == 8)
            && self.config.compression != Compression::Uncompressed
        {
            Predictor::Horizontal
        } else {
            Predictor::No
        };
        let encoder = Encoder::from_raster(raster)
            .with_geo_tags(geo_tags)
            .with_compression(self.config.compression)
            .with_predictor(predictor)
            .with_tile_size(self.config.tile_size)
            .with_big_tiff(self.config.big_tiff)
            .with_big_endian(self.config.endian == Endian::Big)
            .with_software(SOFTWARE);

        let mut temp = staging_file(path)?;
        encode_into(&encoder, &mut temp)?;
        temp.persist(path).map_err(|e| WriteError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }

    fn reencode(&self, raster: Raster, geo_tags: GeoTags, path: &Path) -> WriteResult<()> {
        // Removed when `intermediate` drops, on success or failure
        let mut intermediate = staging_file(path)?;
        let plain = Encoder::from_raster(raster)
            .with_geo_tags(geo_tags)
            .with_compression(Compression::Uncompressed)
            .with_overviews(false)
            .with_tile_size(self.config.tile_size)
            .with_big_tiff(self.config.big_tiff)
            .with_big_endian(self.config.endian == Endian::Big);
        encode_into(&plain, &mut intermediate)?;

        let mut file = intermediate.reopen()?;
        let plain_tiff = CloudTiff::open(&mut file)?;
        let raster = plain_tiff.read_level(&mut file, 0)?;
        let geo_tags = plain_tiff
            .geo_tags()
            .cloned()
            .ok_or(WriteError::Reencode(crate::cog::CloudTiffError::NotSupported(
                "intermediate lost its geo tags".to_string(),
            )))?;

        self.write_cog(raster, geo_tags, path)
    }
}

fn staging_file(target: &Path) -> WriteResult<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(tempfile::Builder::new()
        .prefix(".radarcog-")
        .suffix(".tif.partial")
        .tempfile_in(dir)?)
}

fn encode_into(encoder: &Encoder, temp: &mut NamedTempFile) -> WriteResult<()> {
    let mut writer = BufWriter::new(temp.as_file_mut());
    encoder.encode(&mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GeoBounds;
    use crate::palette::{classify, Palette};
    use crate::raster::ExtraSamples;
    use ndarray::Array2;
    use std::fs::File;
    use tempfile::TempDir;

    fn grid(width: usize, height: usize) -> ObservationGrid {
        Array2::from_shape_fn((height, width), |(r, c)| (r as f32 - c as f32) * 0.75).into()
    }

    fn transform(grid: &ObservationGrid) -> GeoTransform {
        let bounds = GeoBounds::new(-2.0, 50.0, 0.0, 52.0);
        GeoTransform::from_bounds(&bounds, grid.width(), grid.height())
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn lossless_direct_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tif");
        let grid = grid(70, 40);
        let writer = RasterWriter::new(WriterConfig::default().with_tile_size(32));
        writer
            .write(Bands::Lossless(&grid), &transform(&grid), EPSG_WGS84, &path)
            .unwrap();

        let mut file = File::open(&path).unwrap();
        let cog = CloudTiff::open(&mut file).unwrap();
        assert!(cog.is_cloud_optimized());
        assert_eq!(cog.levels().len(), 3);
        let raster = cog.read_level(&mut file, 0).unwrap();
        assert_eq!(raster, grid.to_raster(Endian::Little).unwrap());
        let geo = cog.geo_tags().unwrap();
        assert_eq!(geo.epsg(), Some(EPSG_WGS84));
        assert_eq!(geo.transform(), Some(transform(&grid)));
        assert_eq!(files_in(dir.path()), vec!["out.tif"]);
    }

    #[test]
    fn lossless_keeps_integer_sample_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tif");
        let big = (1_i64 << 53) + 1;
        let grids: Vec<ObservationGrid> = vec![
            Array2::from_shape_fn((20, 30), |(r, c)| (r as i8) - (c as i8)).into(),
            Array2::from_shape_fn((20, 30), |(r, c)| (r * c) as u32 * 70_000).into(),
            Array2::from_shape_fn((20, 30), |(r, c)| (r * c) as u64 + u64::MAX / 2).into(),
            Array2::from_shape_fn((20, 30), |(r, c)| big * (r as i64 - c as i64)).into(),
        ];
        for grid in &grids {
            for strategy in [WriteStrategy::Direct, WriteStrategy::Reencode] {
                let config = WriterConfig::default()
                    .with_tile_size(16)
                    .with_strategy(strategy);
                RasterWriter::new(config)
                    .write(Bands::Lossless(grid), &transform(grid), EPSG_WGS84, &path)
                    .unwrap();

                let mut file = File::open(&path).unwrap();
                let cog = CloudTiff::open(&mut file).unwrap();
                let level = cog.get_level(0).unwrap();
                assert_eq!(level.bits_per_sample, vec![grid.bits_per_sample()]);
                assert_eq!(level.sample_format, vec![grid.sample_format()]);
                let raster = cog.read_level(&mut file, 0).unwrap();
                assert_eq!(raster, grid.to_raster(Endian::Little).unwrap(), "{grid:?}");
            }
        }
    }

    #[test]
    fn reencode_matches_direct_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let grid = grid(50, 30);
        let colours = classify(&grid, &Palette::fine());
        let direct = dir.path().join("direct.tif");
        let reencoded = dir.path().join("reencoded.tif");

        let config = WriterConfig::default().with_tile_size(16);
        RasterWriter::new(config.clone())
            .write(Bands::Visual(&colours), &transform(&grid), EPSG_WGS84, &direct)
            .unwrap();
        RasterWriter::new(config.with_strategy(WriteStrategy::Reencode))
            .write(Bands::Visual(&colours), &transform(&grid), EPSG_WGS84, &reencoded)
            .unwrap();

        assert_eq!(std::fs::read(&direct).unwrap(), std::fs::read(&reencoded).unwrap());
        assert_eq!(files_in(dir.path()), vec!["direct.tif", "reencoded.tif"]);

        let mut file = File::open(&reencoded).unwrap();
        let cog = CloudTiff::open(&mut file).unwrap();
        let level = cog.get_level(0).unwrap();
        assert_eq!(level.extra_samples, vec![ExtraSamples::UnassociatedAlpha]);
        assert_eq!(cog.read_level(&mut file, 0).unwrap(), colours.to_raster().unwrap());
    }

    #[test]
    fn overwrites_existing_target() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tif");
        std::fs::write(&path, b"stale").unwrap();
        let grid = grid(20, 20);
        RasterWriter::default()
            .write(Bands::Lossless(&grid), &transform(&grid), EPSG_WGS84, &path)
            .unwrap();
        assert_eq!(&std::fs::read(&path).unwrap()[..2], b"II");
    }

    #[test]
    fn failed_encode_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tif");
        let grid = grid(20, 20);
        for strategy in [WriteStrategy::Direct, WriteStrategy::Reencode] {
            let writer = RasterWriter::new(
                WriterConfig::default()
                    .with_tile_size(10)
                    .with_strategy(strategy),
            );
            let result = writer.write(Bands::Lossless(&grid), &transform(&grid), EPSG_WGS84, &path);
            assert!(matches!(result, Err(WriteError::Encode(_))));
        }
        assert!(files_in(dir.path()).is_empty());
    }
}
