use super::{Raster, RasterError};
use crate::tiff::Endian;

impl Raster {
    /// Copy one tile out of the raster. Edge tiles are zero padded to the full
    /// tile size, as TIFF tiles always are.
    pub fn tile(&self, col: u32, row: u32, tile_width: u32, tile_height: u32) -> Vec<u8> {
        let bpp = self.bytes_per_pixel();
        let tile_row_size = tile_width as usize * bpp;
        let mut tile = vec![0; tile_row_size * tile_height as usize];

        let x0 = col * tile_width;
        let y0 = row * tile_height;
        if x0 >= self.width() || y0 >= self.height() {
            return tile;
        }
        let copy_width = tile_width.min(self.width() - x0) as usize * bpp;
        let copy_height = tile_height.min(self.height() - y0);

        for j in 0..copy_height {
            let src = self.pixel_offset(x0, y0 + j);
            let dst = j as usize * tile_row_size;
            tile[dst..dst + copy_width].copy_from_slice(&self.buffer[src..src + copy_width]);
        }
        tile
    }

    /// Inverse of `tile`, padding outside the raster is dropped
    pub fn put_tile(
        &mut self,
        col: u32,
        row: u32,
        tile_width: u32,
        tile_height: u32,
        tile: &[u8],
    ) -> Result<(), RasterError> {
        let bpp = self.bytes_per_pixel();
        let tile_row_size = tile_width as usize * bpp;
        if tile.len() < tile_row_size * tile_height as usize {
            return Err(RasterError::NotSupported(format!(
                "tile of {} bytes, expected {}",
                tile.len(),
                tile_row_size * tile_height as usize
            )));
        }

        let x0 = col * tile_width;
        let y0 = row * tile_height;
        if x0 >= self.width() || y0 >= self.height() {
            return Err(RasterError::PixelIndex((x0, y0)));
        }
        let copy_width = tile_width.min(self.width() - x0) as usize * bpp;
        let copy_height = tile_height.min(self.height() - y0);

        for j in 0..copy_height {
            let dst = self.pixel_offset(x0, y0 + j);
            let src = j as usize * tile_row_size;
            self.buffer[dst..dst + copy_width].copy_from_slice(&tile[src..src + copy_width]);
        }
        Ok(())
    }

    /// Half resolution copy, nearest neighbour so sample values are never blended
    pub fn downsample(&self) -> Result<Self, RasterError> {
        let bpp = self.bytes_per_pixel();
        let width = self.width().div_ceil(2);
        let height = self.height().div_ceil(2);
        let mut buffer = Vec::with_capacity(width as usize * height as usize * bpp);

        for j in 0..height {
            for i in 0..width {
                let src = self.pixel_offset(i * 2, j * 2);
                buffer.extend_from_slice(&self.buffer[src..src + bpp]);
            }
        }

        Self::new(
            (width, height),
            buffer,
            self.bits_per_sample.clone(),
            self.interpretation,
            self.sample_format.clone(),
            self.extra_samples.clone(),
            self.endian,
        )
    }

    /// Same samples in the requested byte order
    pub fn to_endian(&self, endian: Endian) -> Self {
        let mut converted = self.clone();
        if endian == self.endian || self.bits_per_sample.iter().all(|bits| *bits == 8) {
            converted.endian = endian;
            return converted;
        }

        let sample_sizes: Vec<usize> = self
            .bits_per_sample
            .iter()
            .map(|bits| *bits as usize / 8)
            .collect();
        for pixel in converted.buffer.chunks_exact_mut(self.bytes_per_pixel()) {
            let mut start = 0;
            for size in sample_sizes.iter() {
                pixel[start..start + size].reverse();
                start += size;
            }
        }
        converted.endian = endian;
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{PhotometricInterpretation, SampleFormat};

    fn gray(width: u32, height: u32) -> Raster {
        let buffer = (0..width * height).map(|v| v as u8).collect();
        Raster::new(
            (width, height),
            buffer,
            vec![8],
            PhotometricInterpretation::BlackIsZero,
            vec![SampleFormat::Unsigned],
            vec![],
            Endian::Little,
        )
        .unwrap()
    }

    #[test]
    fn edge_tiles_are_padded() {
        let raster = gray(3, 3);
        assert_eq!(raster.tile(0, 0, 2, 2), vec![0, 1, 3, 4]);
        assert_eq!(raster.tile(1, 0, 2, 2), vec![2, 0, 5, 0]);
        assert_eq!(raster.tile(1, 1, 2, 2), vec![8, 0, 0, 0]);
    }

    #[test]
    fn tiles_reassemble() {
        let raster = gray(5, 3);
        let mut rebuilt = Raster::blank(
            (5, 3),
            vec![8],
            PhotometricInterpretation::BlackIsZero,
            vec![SampleFormat::Unsigned],
            vec![],
            Endian::Little,
        )
        .unwrap();
        for row in 0..2 {
            for col in 0..3 {
                let tile = raster.tile(col, row, 2, 2);
                rebuilt.put_tile(col, row, 2, 2, &tile).unwrap();
            }
        }
        assert_eq!(rebuilt, raster);
    }

    #[test]
    fn downsample_rounds_up() {
        let raster = gray(5, 3);
        let half = raster.downsample().unwrap();
        assert_eq!(half.dimensions, (3, 2));
        assert_eq!(half.buffer, vec![0, 2, 4, 10, 12, 14]);
    }

    #[test]
    fn endian_swaps_each_sample() {
        let raster = Raster::new(
            (1, 1),
            vec![1, 2, 3, 4],
            vec![16, 16],
            PhotometricInterpretation::BlackIsZero,
            vec![SampleFormat::Unsigned; 2],
            vec![],
            Endian::Little,
        )
        .unwrap();
        let swapped = raster.to_endian(Endian::Big);
        assert_eq!(swapped.buffer, vec![2, 1, 4, 3]);
        assert_eq!(swapped.endian, Endian::Big);
    }
}
