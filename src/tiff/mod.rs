use std::fmt::Display;
use std::io::{self, Read, Seek};

mod endian;
mod error;
mod ifd;
mod tag;

pub use endian::Endian;
pub use error::{TiffError, TiffResult};
pub use ifd::Ifd;
pub use tag::{Tag, TagData, TagId, TagType};

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TiffVariant {
    Normal,
    Big,
}

impl TiffVariant {
    pub(crate) fn read_offset<R: Read>(&self, endian: Endian, stream: &mut R) -> io::Result<u64> {
        match self {
            TiffVariant::Normal => endian.read::<4, u32>(stream).map(|v| v as u64),
            TiffVariant::Big => endian.read(stream),
        }
    }

    pub(crate) fn offset_bytes(&self, endian: Endian, offset: u64) -> TiffResult<Vec<u8>> {
        match self {
            TiffVariant::Normal => {
                let offset: u32 = offset
                    .try_into()
                    .map_err(|_| TiffError::OffsetOverflow(offset))?;
                Ok(endian.encode(offset).to_vec())
            }
            TiffVariant::Big => Ok(endian.encode(offset).to_vec()),
        }
    }

    pub const fn offset_bytesize(&self) -> usize {
        match self {
            TiffVariant::Normal => 4,
            TiffVariant::Big => 8,
        }
    }

    pub const fn header_bytesize(&self) -> usize {
        match self {
            TiffVariant::Normal => 8,
            TiffVariant::Big => 16,
        }
    }

    /// Size of the tag count that starts every IFD
    pub const fn count_bytesize(&self) -> usize {
        match self {
            TiffVariant::Normal => 2,
            TiffVariant::Big => 8,
        }
    }

    /// Size of one IFD entry: code, type, count, value/offset
    pub const fn entry_bytesize(&self) -> usize {
        4 + 2 * self.offset_bytesize()
    }
}

#[derive(Clone, Debug)]
pub struct Tiff {
    pub endian: Endian,
    pub variant: TiffVariant,
    pub ifds: Vec<Ifd>,
}

impl Tiff {
    pub fn new(endian: Endian, variant: TiffVariant) -> Self {
        Self {
            endian,
            variant,
            ifds: vec![Ifd::new()],
        }
    }

    pub fn open<R: Read + Seek>(stream: &mut R) -> TiffResult<Self> {
        // TIFF Header
        let mut buf = [0; 4];
        stream.read_exact(&mut buf)?;

        let endian = match &buf[..2] {
            b"II" => Endian::Little,
            b"MM" => Endian::Big,
            _ => return Err(TiffError::BadMagicBytes),
        };

        let variant = match endian.decode::<2, u16>([buf[2], buf[3]])? {
            42 => TiffVariant::Normal,
            43 => TiffVariant::Big,
            _ => return Err(TiffError::BadMagicBytes),
        };

        if TiffVariant::Big == variant {
            // BigTIFFs have 4 extra bytes in the header
            let _offset_bytesize: u16 = endian.read(stream)?; // 0x0008
            let _: u16 = endian.read(stream)?; // 0x0000
        }

        // IFDs
        let mut ifds = vec![];
        let mut ifd_offset = variant.read_offset(endian, stream)?;
        while ifd_offset != 0 {
            let (ifd, next_offset) = Ifd::parse(stream, ifd_offset, endian, variant)?;
            ifd_offset = next_offset;
            ifds.push(ifd);
        }

        Ok(Self {
            endian,
            variant,
            ifds,
        })
    }

    pub fn ifd0(&self) -> TiffResult<&Ifd> {
        self.ifds.first().ok_or(TiffError::NoIfd0)
    }

    pub fn ifd0_mut(&mut self) -> TiffResult<&mut Ifd> {
        self.ifds.first_mut().ok_or(TiffError::NoIfd0)
    }

    pub fn add_ifd(&mut self) -> &mut Ifd {
        self.ifds.push(Ifd::new());
        let last = self.ifds.len() - 1;
        &mut self.ifds[last]
    }

    /// Byte size of the header plus every IFD, laid out back to back
    pub fn head_bytesize(&self) -> usize {
        self.variant.header_bytesize()
            + self
                .ifds
                .iter()
                .map(|ifd| ifd.encoded_bytesize(self.variant))
                .sum::<usize>()
    }

    /// Encode the header followed by the chained IFDs.
    ///
    /// Everything else in the file (image data) is expected to start at
    /// `head_bytesize()`, which is what a cloud optimized layout needs: a reader
    /// can index the whole pyramid from a single range request on the file head.
    pub fn encode_head(&self) -> TiffResult<Vec<u8>> {
        let endian = self.endian;
        let variant = self.variant;
        let mut bytes = Vec::with_capacity(self.head_bytesize());

        // Header
        bytes.extend_from_slice(endian.magic());
        match variant {
            TiffVariant::Normal => bytes.extend(endian.encode(42_u16)),
            TiffVariant::Big => {
                bytes.extend(endian.encode(43_u16));
                bytes.extend(endian.encode(8_u16));
                bytes.extend(endian.encode(0_u16));
            }
        }
        let first_offset = variant.header_bytesize() as u64;
        bytes.extend(variant.offset_bytes(endian, first_offset)?);

        // IFDs
        let mut offset = first_offset;
        for (i, ifd) in self.ifds.iter().enumerate() {
            let size = ifd.encoded_bytesize(variant) as u64;
            let next_offset = if i + 1 < self.ifds.len() {
                offset + size
            } else {
                0
            };
            bytes.extend(ifd.encode(offset, next_offset, endian, variant)?);
            offset += size;
        }

        Ok(bytes)
    }
}

impl Display for Tiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TIFF({:?}, {:?} Endian)", self.variant, self.endian)?;
        for (i, ifd) in self.ifds.iter().enumerate() {
            writeln!(f, "IFD {i}:")?;
            for tag in ifd.0.iter() {
                writeln!(f, "\t{}", tag)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_tiff(variant: TiffVariant, endian: Endian) -> Tiff {
        let mut tiff = Tiff::new(endian, variant);
        let ifd0 = tiff.ifd0_mut().unwrap();
        ifd0.set_tag(TagId::ImageWidth, TagData::from_long(300), endian);
        ifd0.set_tag(TagId::ImageHeight, TagData::from_long(200), endian);
        ifd0.set_tag(TagId::BitsPerSample, TagData::Short(vec![8, 8, 8, 8]), endian);
        ifd0.set_tag(TagId::Software, TagData::from_string("radarcog"), endian);
        ifd0.set_tag(
            TagId::ModelPixelScale,
            TagData::Double(vec![0.01, 0.01, 0.0]),
            endian,
        );
        let ifd1 = tiff.add_ifd();
        ifd1.set_tag(TagId::ImageWidth, TagData::from_long(150), endian);
        ifd1.set_tag(TagId::ImageHeight, TagData::from_long(100), endian);
        tiff
    }

    #[test]
    fn head_survives_reparse() {
        for variant in [TiffVariant::Normal, TiffVariant::Big] {
            for endian in [Endian::Little, Endian::Big] {
                let tiff = sample_tiff(variant, endian);
                let bytes = tiff.encode_head().unwrap();
                assert_eq!(bytes.len(), tiff.head_bytesize());

                let parsed = Tiff::open(&mut Cursor::new(bytes)).unwrap();
                assert_eq!(parsed.variant, variant);
                assert_eq!(parsed.endian, endian);
                assert_eq!(parsed.ifds.len(), 2);

                let ifd0 = parsed.ifd0().unwrap();
                assert_eq!(ifd0.get_tag_value::<u32>(TagId::ImageWidth).unwrap(), 300);
                assert_eq!(
                    ifd0.get_tag_values::<u16>(TagId::BitsPerSample).unwrap(),
                    vec![8, 8, 8, 8]
                );
                assert_eq!(
                    ifd0.get_tag(TagId::Software).unwrap().as_string().unwrap(),
                    "radarcog"
                );
                assert_eq!(
                    ifd0.get_tag_values::<f64>(TagId::ModelPixelScale).unwrap(),
                    vec![0.01, 0.01, 0.0]
                );
                assert_eq!(
                    parsed.ifds[1].get_tag_value::<u32>(TagId::ImageHeight).unwrap(),
                    100
                );
            }
        }
    }

    #[test]
    fn tags_are_kept_sorted() {
        let tiff = sample_tiff(TiffVariant::Normal, Endian::Little);
        let codes: Vec<u16> = tiff.ifds[0].0.iter().map(|tag| tag.code).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn rejects_non_tiff() {
        let result = Tiff::open(&mut Cursor::new(b"GIF89a..".to_vec()));
        assert!(matches!(result, Err(TiffError::BadMagicBytes)));
    }

    #[test]
    fn classic_offsets_overflow() {
        assert!(matches!(
            TiffVariant::Normal.offset_bytes(Endian::Little, u32::MAX as u64 + 1),
            Err(TiffError::OffsetOverflow(_))
        ));
        assert!(TiffVariant::Big
            .offset_bytes(Endian::Little, u32::MAX as u64 + 1)
            .is_ok());
    }
}
