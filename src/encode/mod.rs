// https://docs.ogc.org/is/21-026/21-026.html
// https://gdal.org/en/latest/drivers/raster/cog.html

use crate::cog::{Compression, Predictor};
use crate::geotags::GeoTags;
use crate::grid::GeoTransform;
use crate::raster::{PlanarConfiguration, Raster};
use crate::tiff::{Endian, TagData, TagId, Tiff, TiffError, TiffVariant};
use std::io::Write;
use tracing::debug;

pub mod error;

pub use error::{EncodeError, EncodeResult};

/// When to switch from classic 32 bit offsets to BigTIFF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BigTiff {
    Never,
    Always,
    #[default]
    IfNeeded,
}

const NEW_SUBFILE_REDUCED_RESOLUTION: u32 = 1;

/// Writes a raster as a Cloud Optimized GeoTIFF.
///
/// Layout: header, then every IFD (full resolution first, overviews after),
/// then tile data from the smallest overview up to the full resolution image.
#[derive(Debug)]
pub struct Encoder {
    raster: Raster,
    geo_tags: Option<GeoTags>,
    endian: Endian,
    big_tiff: BigTiff,
    compression: Compression,
    predictor: Predictor,
    tile_dimensions: (u16, u16),
    overviews: bool,
    software: Option<String>,
}

/// Compressed tiles of one pyramid level, row major
struct EncodedLevel {
    dimensions: (u32, u32),
    tiles: Vec<Vec<u8>>,
}

impl EncodedLevel {
    fn data_bytesize(&self) -> u64 {
        self.tiles.iter().map(|tile| tile.len() as u64).sum()
    }
}

impl Encoder {
    pub fn from_raster(raster: Raster) -> Self {
        Self {
            raster,
            geo_tags: None,
            endian: Endian::Little,
            big_tiff: BigTiff::IfNeeded,
            compression: Compression::Lzw,
            predictor: Predictor::No,
            tile_dimensions: (512, 512),
            overviews: true,
            software: None,
        }
    }

    pub fn with_geo_tags(mut self, geo_tags: GeoTags) -> Self {
        self.geo_tags = Some(geo_tags);
        self
    }

    pub fn with_projection(self, epsg: u16, transform: &GeoTransform) -> Self {
        self.with_geo_tags(GeoTags::geographic(epsg, transform))
    }

    pub fn with_tile_size(mut self, pixels: u16) -> Self {
        self.tile_dimensions = (pixels, pixels);
        self
    }

    pub fn with_big_endian(mut self, big: bool) -> Self {
        self.endian = if big { Endian::Big } else { Endian::Little };
        self
    }

    pub fn with_big_tiff(mut self, big_tiff: BigTiff) -> Self {
        self.big_tiff = big_tiff;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_predictor(mut self, predictor: Predictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn with_overviews(mut self, overviews: bool) -> Self {
        self.overviews = overviews;
        self
    }

    pub fn with_software(mut self, software: &str) -> Self {
        self.software = Some(software.to_string());
        self
    }

    /// Encode the whole file, returning the number of bytes written
    pub fn encode<W: Write>(&self, writer: &mut W) -> EncodeResult<u64> {
        let (tile_width, tile_height) = self.tile_dimensions;
        if tile_width == 0 || tile_height == 0 || tile_width % 16 != 0 || tile_height % 16 != 0 {
            return Err(EncodeError::InvalidTileSize(self.tile_dimensions));
        }

        let levels = self.encode_levels()?;
        let data_bytesize: u64 = levels.iter().map(EncodedLevel::data_bytesize).sum();

        let variant = match self.big_tiff {
            BigTiff::Never => TiffVariant::Normal,
            BigTiff::Always => TiffVariant::Big,
            BigTiff::IfNeeded => {
                let head = self.build_tiff(TiffVariant::Normal, &levels).head_bytesize();
                if head as u64 + data_bytesize > u32::MAX as u64 {
                    TiffVariant::Big
                } else {
                    TiffVariant::Normal
                }
            }
        };

        // Directory sizes do not depend on offset values, so the head can be
        // measured with placeholders and the offsets filled in afterwards
        let mut tiff = self.build_tiff(variant, &levels);
        let head_bytesize = tiff.head_bytesize() as u64;

        let mut offset = head_bytesize;
        for (index, level) in levels.iter().enumerate().rev() {
            let mut offsets = Vec::with_capacity(level.tiles.len());
            for tile in level.tiles.iter() {
                offsets.push(offset);
                offset += tile.len() as u64;
            }
            let tile_offsets = match variant {
                TiffVariant::Normal => TagData::Long(
                    offsets
                        .iter()
                        .map(|o| u32::try_from(*o).map_err(|_| TiffError::OffsetOverflow(*o)))
                        .collect::<Result<_, _>>()?,
                ),
                TiffVariant::Big => TagData::Long8(offsets),
            };
            tiff.ifds[index].set_tag(TagId::TileOffsets, tile_offsets, self.endian);
        }

        let head = tiff.encode_head()?;
        debug!(
            "Writing {:?} TIFF: {} levels, {} byte head, {} bytes of tiles",
            variant,
            levels.len(),
            head.len(),
            data_bytesize
        );
        writer.write_all(&head)?;
        for level in levels.iter().rev() {
            for tile in level.tiles.iter() {
                writer.write_all(tile)?;
            }
        }
        writer.flush()?;

        Ok(head_bytesize + data_bytesize)
    }

    /// Full resolution plus 2x overviews until the image fits in a single tile
    fn encode_levels(&self) -> EncodeResult<Vec<EncodedLevel>> {
        let tile_width = self.tile_dimensions.0 as u32;
        let tile_height = self.tile_dimensions.1 as u32;
        let mut raster = self.raster.to_endian(self.endian);
        let mut levels = vec![];
        loop {
            levels.push(self.encode_tiles(&raster)?);
            let fits = raster.width() <= tile_width && raster.height() <= tile_height;
            if !self.overviews || fits {
                break;
            }
            raster = raster.downsample()?;
        }
        Ok(levels)
    }

    fn encode_tiles(&self, raster: &Raster) -> EncodeResult<EncodedLevel> {
        let tile_width = self.tile_dimensions.0 as u32;
        let tile_height = self.tile_dimensions.1 as u32;
        let cols = raster.width().div_ceil(tile_width);
        let rows = raster.height().div_ceil(tile_height);
        let bit_depth = raster.bits_per_sample.first().copied().unwrap_or(8) as usize;

        let mut tiles = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let mut tile = raster.tile(col, row, tile_width, tile_height);
                self.predictor.unpredict(
                    &mut tile,
                    tile_width as usize,
                    bit_depth,
                    raster.samples_per_pixel(),
                )?;
                tiles.push(self.compression.encode(&tile)?);
            }
        }
        Ok(EncodedLevel {
            dimensions: raster.dimensions,
            tiles,
        })
    }

    fn build_tiff(&self, variant: TiffVariant, levels: &[EncodedLevel]) -> Tiff {
        let endian = self.endian;
        let raster = &self.raster;
        let bps = raster.bits_per_sample.clone();

        let mut tiff = Tiff::new(endian, variant);
        for (index, level) in levels.iter().enumerate() {
            let ifd = if index == 0 {
                &mut tiff.ifds[0]
            } else {
                tiff.add_ifd()
            };

            let number_of_tiles = level.tiles.len();
            let tile_offsets = match variant {
                TiffVariant::Normal => TagData::Long(vec![0; number_of_tiles]),
                TiffVariant::Big => TagData::Long8(vec![0; number_of_tiles]),
            };
            let byte_counts = level.tiles.iter().map(|tile| tile.len() as u32).collect();

            if index > 0 {
                ifd.set_tag(
                    TagId::NewSubfileType,
                    TagData::from_long(NEW_SUBFILE_REDUCED_RESOLUTION),
                    endian,
                );
            }
            ifd.set_tag(TagId::ImageWidth, TagData::from_long(level.dimensions.0), endian);
            ifd.set_tag(TagId::ImageHeight, TagData::from_long(level.dimensions.1), endian);
            ifd.set_tag(TagId::BitsPerSample, TagData::Short(bps.clone()), endian);
            ifd.set_tag(TagId::Compression, TagData::from_short(self.compression.into()), endian);
            ifd.set_tag(
                TagId::PhotometricInterpretation,
                TagData::from_short(raster.interpretation.into()),
                endian,
            );
            ifd.set_tag(TagId::SamplesPerPixel, TagData::from_short(bps.len() as u16), endian);
            ifd.set_tag(
                TagId::PlanarConfiguration,
                TagData::from_short(PlanarConfiguration::Chunky.into()),
                endian,
            );
            if self.predictor != Predictor::No {
                ifd.set_tag(TagId::Predictor, TagData::from_short(self.predictor.into()), endian);
            }
            ifd.set_tag(TagId::TileWidth, TagData::from_short(self.tile_dimensions.0), endian);
            ifd.set_tag(TagId::TileLength, TagData::from_short(self.tile_dimensions.1), endian);
            ifd.set_tag(TagId::TileOffsets, tile_offsets, endian);
            ifd.set_tag(TagId::TileByteCounts, TagData::Long(byte_counts), endian);
            if !raster.extra_samples.is_empty() {
                let extra = raster.extra_samples.iter().map(|e| (*e).into()).collect();
                ifd.set_tag(TagId::ExtraSamples, TagData::Short(extra), endian);
            }
            let formats = raster.sample_format.iter().map(|s| (*s).into()).collect();
            ifd.set_tag(TagId::SampleFormat, TagData::Short(formats), endian);

            if index == 0 {
                if let Some(geo_tags) = &self.geo_tags {
                    geo_tags.add_to_ifd(ifd, endian);
                }
                if let Some(software) = &self.software {
                    ifd.set_tag(TagId::Software, TagData::from_string(software), endian);
                }
            }
        }
        tiff
    }
}
