use super::compression::{Compression, Predictor};
use super::CloudTiffError;
use crate::raster::{ExtraSamples, PhotometricInterpretation, Raster, SampleFormat};
use crate::tiff::{Endian, Ifd, TagId, TiffError};
use std::fmt::Display;
use std::io::{Read, Seek, SeekFrom};

/// One tiled image of a COG, either the full resolution image or an overview
#[derive(Clone, Debug)]
pub struct Level {
    pub dimensions: (u32, u32),
    pub tile_width: u32,
    pub tile_height: u32,
    pub compression: Compression,
    pub predictor: Predictor,
    pub interpretation: PhotometricInterpretation,
    pub bits_per_sample: Vec<u16>,
    pub sample_format: Vec<SampleFormat>,
    pub extra_samples: Vec<ExtraSamples>,
    pub endian: Endian,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<usize>,
}

impl Level {
    pub fn from_ifd(ifd: &Ifd, endian: Endian) -> Result<Self, CloudTiffError> {
        // Required tags
        let width = ifd.get_tag_value(TagId::ImageWidth)?;
        let height = ifd.get_tag_value(TagId::ImageHeight)?;
        let tile_width = ifd.get_tag_value(TagId::TileWidth)?;
        let tile_height = ifd.get_tag_value(TagId::TileLength)?;
        let compression = ifd.get_tag_value::<u16>(TagId::Compression)?.into();
        let bits_per_sample: Vec<u16> = ifd.get_tag_values(TagId::BitsPerSample)?;
        let offsets = ifd.get_tag_values(TagId::TileOffsets)?;
        let byte_counts = ifd.get_tag_values(TagId::TileByteCounts)?;

        // Optional tags
        let predictor = ifd
            .get_tag_value::<u16>(TagId::Predictor)
            .unwrap_or(1)
            .into();
        let interpretation = ifd
            .get_tag_value::<u16>(TagId::PhotometricInterpretation)
            .unwrap_or(PhotometricInterpretation::Unknown.into())
            .into();
        let sample_format = ifd
            .get_tag_values::<u16>(TagId::SampleFormat)
            .unwrap_or_else(|_| vec![SampleFormat::Unsigned.into(); bits_per_sample.len()])
            .into_iter()
            .map(SampleFormat::from)
            .collect();
        let extra_samples = ifd
            .get_tag_values::<u16>(TagId::ExtraSamples)
            .unwrap_or_default()
            .into_iter()
            .map(ExtraSamples::from)
            .collect();

        if offsets.len() != byte_counts.len() {
            return Err(CloudTiffError::BadTiff(TiffError::BadTag(
                TagId::TileOffsets,
            )));
        }

        let level = Self {
            dimensions: (width, height),
            tile_width,
            tile_height,
            compression,
            predictor,
            interpretation,
            bits_per_sample,
            sample_format,
            extra_samples,
            endian,
            offsets,
            byte_counts,
        };
        if level.tile_width == 0
            || level.tile_height == 0
            || level.offsets.len() != level.col_count() * level.row_count()
        {
            return Err(CloudTiffError::BadTiff(TiffError::BadTag(
                TagId::TileOffsets,
            )));
        }
        Ok(level)
    }

    pub fn megapixels(&self) -> f64 {
        (self.dimensions.0 as f64 * self.dimensions.1 as f64) / 1e6
    }

    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    pub fn col_count(&self) -> usize {
        self.width().div_ceil(self.tile_width) as usize
    }

    pub fn row_count(&self) -> usize {
        self.height().div_ceil(self.tile_height) as usize
    }

    pub fn tile_byte_range(&self, index: usize) -> Result<(u64, u64), CloudTiffError> {
        let (Some(offset), Some(byte_count)) =
            (self.offsets.get(index), self.byte_counts.get(index))
        else {
            return Err(CloudTiffError::TileIndexOutOfRange((
                index,
                self.offsets.len().saturating_sub(1),
            )));
        };
        Ok((*offset, offset + *byte_count as u64))
    }

    /// Decompress one tile into its full, padded, tile sized buffer
    pub fn extract_tile_from_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, CloudTiffError> {
        let mut buffer = self.compression.decode(bytes)?;

        let bit_depth = self.bits_per_sample.first().copied().unwrap_or(8) as usize;
        self.predictor.predict(
            buffer.as_mut_slice(),
            self.tile_width as usize,
            bit_depth,
            self.bits_per_sample.len(),
        )?;
        Ok(buffer)
    }

    /// Read every tile of this level and stitch them into one raster
    pub fn read_raster<R: Read + Seek>(&self, stream: &mut R) -> Result<Raster, CloudTiffError> {
        let mut raster = Raster::blank(
            self.dimensions,
            self.bits_per_sample.clone(),
            self.interpretation,
            self.sample_format.clone(),
            self.extra_samples.clone(),
            self.endian,
        )?;

        let col_count = self.col_count();
        for index in 0..self.offsets.len() {
            let (start, end) = self.tile_byte_range(index)?;
            let mut bytes = vec![0; (end - start) as usize];
            stream.seek(SeekFrom::Start(start))?;
            stream.read_exact(&mut bytes)?;

            let tile = self.extract_tile_from_bytes(&bytes)?;
            raster.put_tile(
                (index % col_count) as u32,
                (index / col_count) as u32,
                self.tile_width,
                self.tile_height,
                &tile,
            )?;
        }
        Ok(raster)
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Level({}x{}, {} tiles, {:?} Compression, {:?} Predictor)",
            self.dimensions.0,
            self.dimensions.1,
            self.offsets.len(),
            self.compression,
            self.predictor
        )
    }
}
