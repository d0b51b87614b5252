use num_traits::NumCast;

use super::{Endian, Tag, TagData, TagId, TagType, TiffError, TiffResult, TiffVariant};
use std::io::{Read, Seek, SeekFrom};

#[derive(Clone, Debug, Default)]
pub struct Ifd(pub Vec<Tag>);

impl Ifd {
    pub fn new() -> Self {
        Self(vec![])
    }

    pub fn parse<R: Read + Seek>(
        stream: &mut R,
        offset: u64,
        endian: Endian,
        variant: TiffVariant,
    ) -> TiffResult<(Ifd, u64)> {
        // IFD starts at offset
        stream.seek(SeekFrom::Start(offset))?;

        // IFD header is just the number of tags
        let tag_count = match variant {
            TiffVariant::Normal => endian.read::<2, u16>(stream)? as u64,
            TiffVariant::Big => endian.read(stream)?,
        };

        // Parse each tag in the IFD
        let mut tags = Vec::with_capacity(tag_count as usize);
        for _ in 0..tag_count {
            let code = endian.read(stream)?;
            let datatype: TagType = endian.read::<2, u16>(stream)?.into();
            let count = variant.read_offset(endian, stream)? as usize;

            let data_size = count * datatype.size_in_bytes();
            let offset_size = variant.offset_bytesize();

            let data = if data_size > offset_size {
                let data_offset = variant.read_offset(endian, stream)?;
                let pos = stream.stream_position()?;
                let mut data = vec![0; data_size];
                stream.seek(SeekFrom::Start(data_offset))?;
                stream.read_exact(&mut data)?;
                stream.seek(SeekFrom::Start(pos))?;
                data
            } else {
                let mut data = vec![0; offset_size];
                stream.read_exact(&mut data)?;
                data.truncate(data_size);
                data
            };

            tags.push(Tag {
                code,
                datatype,
                endian,
                count,
                data,
            });
        }

        let ifd = Ifd(tags);
        let next_ifd_offset = variant.read_offset(endian, stream)?;

        Ok((ifd, next_ifd_offset))
    }

    pub fn get_tag_by_code(&self, code: u16) -> Option<&Tag> {
        let Self(tags) = &self;
        tags.iter().find(|tag| tag.code == code)
    }

    pub fn get_tag(&self, id: TagId) -> TiffResult<&Tag> {
        self.get_tag_by_code(id.into())
            .ok_or(TiffError::MissingTag(id))
    }

    pub fn get_tag_values<T: NumCast>(&self, id: TagId) -> TiffResult<Vec<T>> {
        self.get_tag(id)?.values().ok_or(TiffError::BadTag(id))
    }

    pub fn get_tag_value<T: NumCast + Copy>(&self, id: TagId) -> TiffResult<T> {
        self.get_tag(id)?.value().ok_or(TiffError::BadTag(id))
    }

    /// Insert or replace a tag. Entries stay sorted by code as TIFF requires.
    pub fn set_tag(&mut self, id: TagId, data: TagData, endian: Endian) {
        let code: u16 = id.into();
        let tag = Tag {
            code,
            datatype: data.tag_type(),
            count: data.len(),
            data: data.bytes(endian),
            endian,
        };
        let Self(tags) = self;
        match tags.binary_search_by_key(&code, |tag| tag.code) {
            Ok(index) => tags[index] = tag,
            Err(index) => tags.insert(index, tag),
        }
    }

    /// Size of this IFD once encoded, including tag data that does not fit inline
    pub fn encoded_bytesize(&self, variant: TiffVariant) -> usize {
        let Self(tags) = self;
        let offset_size = variant.offset_bytesize();
        let external: usize = tags
            .iter()
            .filter(|tag| tag.data.len() > offset_size)
            .map(|tag| padded_len(tag.data.len()))
            .sum();
        variant.count_bytesize() + tags.len() * variant.entry_bytesize() + offset_size + external
    }

    /// Encode the IFD as it will sit at `offset` within the file.
    ///
    /// Tag data too large for the entry is placed directly after the entries,
    /// word aligned.
    pub fn encode(
        &self,
        offset: u64,
        next_offset: u64,
        endian: Endian,
        variant: TiffVariant,
    ) -> TiffResult<Vec<u8>> {
        let Self(tags) = self;
        let offset_size = variant.offset_bytesize();
        let entries_size =
            variant.count_bytesize() + tags.len() * variant.entry_bytesize() + offset_size;
        let external_start = offset + entries_size as u64;

        let mut entries = Vec::with_capacity(entries_size);
        let mut external = vec![];

        match variant {
            TiffVariant::Normal => entries.extend(endian.encode(tags.len() as u16)),
            TiffVariant::Big => entries.extend(endian.encode(tags.len() as u64)),
        }

        for tag in tags {
            let datatype: u16 = tag.datatype.into();
            entries.extend(endian.encode(tag.code));
            entries.extend(endian.encode(datatype));
            entries.extend(variant.offset_bytes(endian, tag.count as u64)?);
            if tag.data.len() > offset_size {
                let data_offset = external_start + external.len() as u64;
                entries.extend(variant.offset_bytes(endian, data_offset)?);
                external.extend_from_slice(&tag.data);
                external.resize(padded_len(external.len()), 0);
            } else {
                let mut inline = tag.data.clone();
                inline.resize(offset_size, 0);
                entries.extend(inline);
            }
        }

        entries.extend(variant.offset_bytes(endian, next_offset)?);
        entries.extend(external);
        Ok(entries)
    }
}

fn padded_len(len: usize) -> usize {
    len + (len % 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_carry_code_type_and_count() {
        let mut ifd = Ifd::new();
        ifd.set_tag(TagId::ImageWidth, TagData::Short(vec![300]), Endian::Little);
        ifd.set_tag(
            TagId::ModelPixelScale,
            TagData::Double(vec![0.01, 0.02, 0.0]),
            Endian::Little,
        );

        let bytes = ifd.encode(8, 0, Endian::Little, TiffVariant::Normal).unwrap();
        assert_eq!(bytes.len(), ifd.encoded_bytesize(TiffVariant::Normal));
        assert_eq!(&bytes[0..2], &[2, 0]);
        // ImageWidth, Short, count 1, value inline
        assert_eq!(&bytes[2..14], &[0x00, 0x01, 3, 0, 1, 0, 0, 0, 44, 1, 0, 0]);
        // ModelPixelScale, Double, count 3, data after the next-IFD offset
        assert_eq!(&bytes[14..22], &[0x0E, 0x83, 12, 0, 3, 0, 0, 0]);
        let data_offset = 8 + 2 + 2 * 12 + 4;
        assert_eq!(&bytes[22..26], &(data_offset as u32).to_le_bytes());
    }

    #[test]
    fn big_entries_use_wide_counts() {
        let mut ifd = Ifd::new();
        ifd.set_tag(TagId::TileOffsets, TagData::Long8(vec![16, 32]), Endian::Big);

        let bytes = ifd.encode(16, 0, Endian::Big, TiffVariant::Big).unwrap();
        assert_eq!(&bytes[0..8], &1_u64.to_be_bytes());
        assert_eq!(&bytes[8..10], &0x0144_u16.to_be_bytes());
        assert_eq!(&bytes[10..12], &16_u16.to_be_bytes());
        assert_eq!(&bytes[12..20], &2_u64.to_be_bytes());
    }
}
