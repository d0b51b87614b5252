//! In-memory observation grids and their georeferencing

use crate::raster::{PhotometricInterpretation, Raster, RasterError, SampleFormat};
use crate::tiff::Endian;
use ndarray::Array2;

mod bounds;
mod transform;

pub use bounds::{BoundsError, GeoBounds};
pub use transform::GeoTransform;

/// A numeric type an observation grid can be stored as
pub trait GridSample: Copy + Send + Sync + 'static {
    const BITS: u16;
    const FORMAT: SampleFormat;

    fn to_f64(self) -> f64;
    fn write_bytes(self, endian: Endian, buffer: &mut Vec<u8>);
}

macro_rules! grid_sample {
    ($t:ty, $n:literal, $format:expr) => {
        impl GridSample for $t {
            const BITS: u16 = $n * 8;
            const FORMAT: SampleFormat = $format;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn write_bytes(self, endian: Endian, buffer: &mut Vec<u8>) {
                buffer.extend(endian.encode::<$n, $t>(self));
            }
        }
    };
}

grid_sample!(u8, 1, SampleFormat::Unsigned);
grid_sample!(i8, 1, SampleFormat::Signed);
grid_sample!(u16, 2, SampleFormat::Unsigned);
grid_sample!(i16, 2, SampleFormat::Signed);
grid_sample!(u32, 4, SampleFormat::Unsigned);
grid_sample!(i32, 4, SampleFormat::Signed);
grid_sample!(u64, 8, SampleFormat::Unsigned);
grid_sample!(i64, 8, SampleFormat::Signed);
grid_sample!(f32, 4, SampleFormat::Float);
grid_sample!(f64, 8, SampleFormat::Float);

/// 2D rainfall samples, row-major with row 0 at the northern edge.
///
/// The container's numeric type is kept so the grid can be written back
/// bit-for-bit.
#[derive(Clone, Debug, PartialEq)]
pub enum ObservationGrid {
    UInt8(Array2<u8>),
    Int8(Array2<i8>),
    UInt16(Array2<u16>),
    Int16(Array2<i16>),
    UInt32(Array2<u32>),
    Int32(Array2<i32>),
    UInt64(Array2<u64>),
    Int64(Array2<i64>),
    Float32(Array2<f32>),
    Float64(Array2<f64>),
}

macro_rules! with_samples {
    ($grid:expr, $samples:ident => $body:expr) => {
        match $grid {
            ObservationGrid::UInt8($samples) => $body,
            ObservationGrid::Int8($samples) => $body,
            ObservationGrid::UInt16($samples) => $body,
            ObservationGrid::Int16($samples) => $body,
            ObservationGrid::UInt32($samples) => $body,
            ObservationGrid::Int32($samples) => $body,
            ObservationGrid::UInt64($samples) => $body,
            ObservationGrid::Int64($samples) => $body,
            ObservationGrid::Float32($samples) => $body,
            ObservationGrid::Float64($samples) => $body,
        }
    };
}

impl ObservationGrid {
    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        let (rows, cols) = with_samples!(self, samples => samples.dim());
        (cols as u32, rows as u32)
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn bits_per_sample(&self) -> u16 {
        with_samples!(self, samples => sample_bits(samples))
    }

    pub fn sample_format(&self) -> SampleFormat {
        with_samples!(self, samples => sample_format(samples))
    }

    /// Apply `f` to every sample, as f64, keeping the grid shape
    pub fn map_values<U, F: Fn(f64) -> U>(&self, f: F) -> Array2<U> {
        with_samples!(self, samples => samples.map(|v| f(v.to_f64())))
    }

    pub fn value_at(&self, row: usize, col: usize) -> Option<f64> {
        with_samples!(self, samples => samples.get((row, col)).map(|v| v.to_f64()))
    }

    /// Single band raster holding the samples unchanged
    pub fn to_raster(&self, endian: Endian) -> Result<Raster, RasterError> {
        let dimensions = self.dimensions();
        let bits = self.bits_per_sample();
        let capacity = dimensions.0 as usize * dimensions.1 as usize * bits as usize / 8;
        let mut buffer = Vec::with_capacity(capacity);
        with_samples!(self, samples => {
            // ndarray iterates in logical row-major order regardless of memory layout
            for v in samples.iter() {
                v.write_bytes(endian, &mut buffer);
            }
        });
        Raster::new(
            dimensions,
            buffer,
            vec![bits],
            PhotometricInterpretation::BlackIsZero,
            vec![self.sample_format()],
            vec![],
            endian,
        )
    }
}

fn sample_bits<T: GridSample>(_: &Array2<T>) -> u16 {
    T::BITS
}

fn sample_format<T: GridSample>(_: &Array2<T>) -> SampleFormat {
    T::FORMAT
}

macro_rules! grid_from {
    ($t:ty, $variant:ident) => {
        impl From<Array2<$t>> for ObservationGrid {
            fn from(samples: Array2<$t>) -> Self {
                ObservationGrid::$variant(samples)
            }
        }
    };
}

grid_from!(u8, UInt8);
grid_from!(i8, Int8);
grid_from!(u16, UInt16);
grid_from!(i16, Int16);
grid_from!(u32, UInt32);
grid_from!(i32, Int32);
grid_from!(u64, UInt64);
grid_from!(i64, Int64);
grid_from!(f32, Float32);
grid_from!(f64, Float64);

/// Everything read from one observation container
#[derive(Clone, Debug)]
pub struct Observation {
    pub grid: ObservationGrid,
    pub bounds: GeoBounds,
}

impl Observation {
    pub fn transform(&self) -> GeoTransform {
        let (width, height) = self.grid.dimensions();
        GeoTransform::from_bounds(&self.bounds, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn dimensions_are_width_then_height() {
        let grid = ObservationGrid::from(Array2::<f32>::zeros((100, 200)));
        assert_eq!(grid.dimensions(), (200, 100));
        assert_eq!(grid.bits_per_sample(), 32);
        assert_eq!(grid.sample_format(), SampleFormat::Float);
    }

    #[test]
    fn raster_keeps_samples_bit_for_bit() {
        let grid = ObservationGrid::from(array![[0.1_f32, -1.0], [35.25, f32::MAX]]);
        let raster = grid.to_raster(Endian::Little).unwrap();
        let expected: Vec<u8> = [0.1_f32, -1.0, 35.25, f32::MAX]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        assert_eq!(raster.buffer, expected);
        assert_eq!(raster.bits_per_sample, vec![32]);
    }

    #[test]
    fn raster_follows_logical_order_for_transposed_views() {
        let grid = ObservationGrid::from(array![[1_u16, 2], [3, 4]].reversed_axes());
        let raster = grid.to_raster(Endian::Big).unwrap();
        assert_eq!(raster.buffer, vec![0, 1, 0, 3, 0, 2, 0, 4]);
    }

    #[test]
    fn wide_integers_keep_their_type() {
        let beyond_f64 = (1_i64 << 53) + 1;
        let grid = ObservationGrid::from(array![[beyond_f64, -1]]);
        assert_eq!(grid.bits_per_sample(), 64);
        assert_eq!(grid.sample_format(), SampleFormat::Signed);
        let raster = grid.to_raster(Endian::Little).unwrap();
        assert_eq!(&raster.buffer[..8], &beyond_f64.to_le_bytes());

        let grid = ObservationGrid::from(array![[-5_i8, 7]]);
        assert_eq!((grid.bits_per_sample(), grid.sample_format()), (8, SampleFormat::Signed));
        assert_eq!(grid.to_raster(Endian::Big).unwrap().buffer, vec![0xFB, 7]);

        let grid = ObservationGrid::from(array![[u32::MAX], [1]]);
        assert_eq!((grid.bits_per_sample(), grid.sample_format()), (32, SampleFormat::Unsigned));
        assert_eq!(grid.value_at(0, 0), Some(u32::MAX as f64));
    }

    #[test]
    fn value_lookup() {
        let grid = ObservationGrid::from(array![[1_i16, -2], [3, 4]]);
        assert_eq!(grid.value_at(0, 1), Some(-2.0));
        assert_eq!(grid.value_at(2, 0), None);
    }
}
