use crate::tiff::Endian;
use std::fmt::{self, Display};

mod ops;
mod photometrics;

pub use photometrics::{ExtraSamples, PhotometricInterpretation, PlanarConfiguration, SampleFormat};

#[derive(Debug)]
pub enum RasterError {
    BufferSize((usize, (u32, u32), Vec<u16>)),
    PixelIndex((u32, u32)),
    NotSupported(String),
}

impl Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::BufferSize((len, dims, bps)) => write!(
                f,
                "buffer of {len} bytes does not fit a {}x{} raster with {bps:?} bits per sample",
                dims.0, dims.1
            ),
            RasterError::PixelIndex((x, y)) => write!(f, "pixel ({x}, {y}) is out of range"),
            RasterError::NotSupported(msg) => write!(f, "raster not supported: {msg}"),
        }
    }
}

impl std::error::Error for RasterError {}

/// Chunky (interleaved) pixel buffer with byte aligned samples
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pub dimensions: (u32, u32),
    pub buffer: Vec<u8>,
    pub bits_per_sample: Vec<u16>,
    pub interpretation: PhotometricInterpretation,
    pub sample_format: Vec<SampleFormat>,
    pub extra_samples: Vec<ExtraSamples>,
    pub endian: Endian,
    bytes_per_pixel: usize, // calculated from bits_per_sample and cached
}

impl Raster {
    pub fn new(
        dimensions: (u32, u32),
        buffer: Vec<u8>,
        bits_per_sample: Vec<u16>,
        interpretation: PhotometricInterpretation,
        sample_format: Vec<SampleFormat>,
        extra_samples: Vec<ExtraSamples>,
        endian: Endian,
    ) -> Result<Self, RasterError> {
        let bytes_per_pixel = bytes_per_pixel(&bits_per_sample)?;
        let required_bytes = dimensions.0 as usize * dimensions.1 as usize * bytes_per_pixel;
        if buffer.len() != required_bytes {
            return Err(RasterError::BufferSize((
                buffer.len(),
                dimensions,
                bits_per_sample,
            )));
        }
        Ok(Self {
            dimensions,
            buffer,
            bits_per_sample,
            interpretation,
            sample_format,
            extra_samples,
            endian,
            bytes_per_pixel,
        })
    }

    pub fn blank(
        dimensions: (u32, u32),
        bits_per_sample: Vec<u16>,
        interpretation: PhotometricInterpretation,
        sample_format: Vec<SampleFormat>,
        extra_samples: Vec<ExtraSamples>,
        endian: Endian,
    ) -> Result<Self, RasterError> {
        let bytes_per_pixel = bytes_per_pixel(&bits_per_sample)?;
        let buffer = vec![0; dimensions.0 as usize * dimensions.1 as usize * bytes_per_pixel];
        Self::new(
            dimensions,
            buffer,
            bits_per_sample,
            interpretation,
            sample_format,
            extra_samples,
            endian,
        )
    }

    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.bits_per_sample.len()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.dimensions.0 || y >= self.dimensions.1 {
            return None;
        }
        let start = self.pixel_offset(x, y);
        Some(&self.buffer[start..start + self.bytes_per_pixel])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: &[u8]) -> Result<(), RasterError> {
        if x >= self.dimensions.0 || y >= self.dimensions.1 {
            return Err(RasterError::PixelIndex((x, y)));
        }
        if pixel.len() != self.bytes_per_pixel {
            return Err(RasterError::NotSupported(format!(
                "pixel of {} bytes, expected {}",
                pixel.len(),
                self.bytes_per_pixel
            )));
        }
        let start = self.pixel_offset(x, y);
        self.buffer[start..start + self.bytes_per_pixel].copy_from_slice(pixel);
        Ok(())
    }

    fn row_size(&self) -> usize {
        self.dimensions.0 as usize * self.bytes_per_pixel
    }

    fn pixel_offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.row_size() + x as usize * self.bytes_per_pixel
    }
}

fn bytes_per_pixel(bits_per_sample: &[u16]) -> Result<usize, RasterError> {
    if bits_per_sample.is_empty() || bits_per_sample.iter().any(|bits| bits % 8 != 0) {
        return Err(RasterError::NotSupported(format!(
            "Samples are not byte aligned: {bits_per_sample:?}"
        )));
    }
    Ok(bits_per_sample.iter().map(|bits| *bits as usize / 8).sum())
}

impl Display for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Raster({}x{}, {:?}, {:?}, {}Bytes, {:?} Endian)",
            self.dimensions.0,
            self.dimensions.1,
            self.bits_per_sample,
            self.interpretation,
            self.buffer.len(),
            self.endian
        )
    }
}
