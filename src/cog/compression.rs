// https://en.wikipedia.org/wiki/TIFF#TIFF_Compression_Tag
// https://exiftool.org/TagNames/EXIF.html#Compression

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use num_enum::{FromPrimitive, IntoPrimitive};
use salzweg::decoder::{DecodingError, TiffStyleDecoder};
use salzweg::encoder::{EncodingError, TiffStyleEncoder};
use std::fmt;
use std::io::{self, Read, Write};

#[derive(Debug)]
pub enum CompressionError {
    LzwDecode(DecodingError),
    LzwEncode(EncodingError),
    CompressionNotSupported(Compression),
    PredictorNotSupported(Predictor),
    IoError(io::Error),
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::LzwDecode(e) => write!(f, "LZW decoding failed: {e:?}"),
            CompressionError::LzwEncode(e) => write!(f, "LZW encoding failed: {e:?}"),
            CompressionError::CompressionNotSupported(c) => {
                write!(f, "{c:?} compression not supported")
            }
            CompressionError::PredictorNotSupported(p) => write!(f, "{p:?} predictor not supported"),
            CompressionError::IoError(e) => write!(f, "compression I/O failed: {e}"),
        }
    }
}

impl std::error::Error for CompressionError {}

impl From<io::Error> for CompressionError {
    fn from(e: io::Error) -> Self {
        CompressionError::IoError(e)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum Compression {
    Uncompressed = 1,
    Lzw = 5,
    Jpeg = 7,
    DeflateAdobe = 8,
    PackBits = 32773,
    Deflate = 32946,
    Zstd = 50000,
    WebP = 50001,

    #[num_enum(default)]
    Unknown = 0x0000,
}

impl Compression {
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match self {
            Self::Uncompressed => Ok(bytes.to_vec()),
            Self::Lzw => TiffStyleDecoder::decode_to_vec(bytes).map_err(CompressionError::LzwDecode),
            Self::DeflateAdobe | Self::Deflate => {
                let mut buf = vec![];
                ZlibDecoder::new(bytes).read_to_end(&mut buf)?;
                Ok(buf)
            }
            other => Err(CompressionError::CompressionNotSupported(*other)),
        }
    }

    pub fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match self {
            Self::Uncompressed => Ok(bytes.to_vec()),
            Self::Lzw => TiffStyleEncoder::encode_to_vec(bytes).map_err(CompressionError::LzwEncode),
            Self::DeflateAdobe => {
                let mut encoder = ZlibEncoder::new(vec![], flate2::Compression::default());
                encoder.write_all(bytes)?;
                Ok(encoder.finish()?)
            }
            other => Err(CompressionError::CompressionNotSupported(*other)),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum Predictor {
    No = 1,
    Horizontal = 2,
    FloatingPoint = 3,

    #[num_enum(default)]
    Unknown = 0x0000,
}

impl Predictor {
    /// Undo the predictor on a decompressed tile
    pub fn predict(
        &self,
        buffer: &mut [u8],
        width: usize,
        bit_depth: usize,
        samples_per_pixel: usize,
    ) -> Result<(), CompressionError> {
        match self {
            Self::No => {}
            Self::Horizontal if bit_depth == 8 => {
                let row_bytes = width * samples_per_pixel;
                for row in buffer.chunks_exact_mut(row_bytes) {
                    for i in samples_per_pixel..row.len() {
                        row[i] = row[i].wrapping_add(row[i - samples_per_pixel]);
                    }
                }
            }
            other => return Err(CompressionError::PredictorNotSupported(*other)),
        }
        Ok(())
    }

    /// Apply the predictor to a tile before compression
    pub fn unpredict(
        &self,
        buffer: &mut [u8],
        width: usize,
        bit_depth: usize,
        samples_per_pixel: usize,
    ) -> Result<(), CompressionError> {
        match self {
            Self::No => {}
            Self::Horizontal if bit_depth == 8 => {
                let row_bytes = width * samples_per_pixel;
                for row in buffer.chunks_exact_mut(row_bytes) {
                    // Walk backwards so every difference uses the original left neighbour
                    for i in (samples_per_pixel..row.len()).rev() {
                        row[i] = row[i].wrapping_sub(row[i - samples_per_pixel]);
                    }
                }
            }
            other => return Err(CompressionError::PredictorNotSupported(*other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tile() -> Vec<u8> {
        (0..64 * 64 * 4).map(|i| ((i / 7) % 251) as u8).collect()
    }

    #[test]
    fn lossless_codecs_restore_input() {
        let tile = sample_tile();
        for compression in [
            Compression::Uncompressed,
            Compression::Lzw,
            Compression::DeflateAdobe,
        ] {
            let encoded = compression.encode(&tile).unwrap();
            assert_eq!(compression.decode(&encoded).unwrap(), tile, "{compression:?}");
        }
    }

    #[test]
    fn compressible_data_shrinks() {
        let tile = vec![0_u8; 256 * 256];
        assert!(Compression::Lzw.encode(&tile).unwrap().len() < tile.len() / 10);
        assert!(Compression::DeflateAdobe.encode(&tile).unwrap().len() < tile.len() / 10);
    }

    #[test]
    fn horizontal_predictor_is_reversible() {
        let tile = sample_tile();
        let mut buffer = tile.clone();
        Predictor::Horizontal.unpredict(&mut buffer, 64, 8, 4).unwrap();
        assert_ne!(buffer, tile);
        Predictor::Horizontal.predict(&mut buffer, 64, 8, 4).unwrap();
        assert_eq!(buffer, tile);
    }

    #[test]
    fn unsupported_codecs_are_reported() {
        assert!(matches!(
            Compression::Jpeg.encode(&[0]),
            Err(CompressionError::CompressionNotSupported(Compression::Jpeg))
        ));
        assert!(matches!(
            Predictor::Horizontal.predict(&mut [0, 0], 1, 16, 1),
            Err(CompressionError::PredictorNotSupported(Predictor::Horizontal))
        ));
    }
}
