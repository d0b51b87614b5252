// refs
// https://www.itu.int/itudoc/itu-t/com16/tiff-fx/docs/tiff6.pdf
// https://www.awaresystems.be/imaging/tiff/bigtiff.html

use super::Endian;
use num_enum::{FromPrimitive, IntoPrimitive};
use num_traits::NumCast;
use std::fmt::Display;

mod data;
mod id;

pub use data::TagData;
pub use id::TagId;

#[derive(Clone, Debug)]
pub struct Tag {
    pub code: u16,
    pub datatype: TagType,
    pub count: usize,
    pub data: Vec<u8>,
    pub endian: Endian,
}

impl Tag {
    pub fn id(&self) -> Option<TagId> {
        TagId::try_from(self.code).ok()
    }

    /// Numeric values of the tag, cast to `T`. None if any value does not fit.
    pub fn values<T: NumCast>(&self) -> Option<Vec<T>> {
        let endian = self.endian;
        let bytes = self.data.as_slice();
        match self.datatype {
            TagType::Byte | TagType::Undefined => bytes.iter().map(|v| T::from(*v)).collect(),
            TagType::SByte => bytes.iter().map(|v| T::from(*v as i8)).collect(),
            TagType::Short => endian.decode_all_to_primative::<2, u16, T>(bytes),
            TagType::SShort => endian.decode_all_to_primative::<2, i16, T>(bytes),
            TagType::Long | TagType::Ifd => endian.decode_all_to_primative::<4, u32, T>(bytes),
            TagType::SLong => endian.decode_all_to_primative::<4, i32, T>(bytes),
            TagType::Float => endian.decode_all_to_primative::<4, f32, T>(bytes),
            TagType::Double => endian.decode_all_to_primative::<8, f64, T>(bytes),
            TagType::Long8 | TagType::Ifd8 => endian.decode_all_to_primative::<8, u64, T>(bytes),
            TagType::SLong8 => endian.decode_all_to_primative::<8, i64, T>(bytes),
            TagType::Rational => {
                let parts = endian.decode_all::<4, u32>(bytes)?;
                parts
                    .chunks_exact(2)
                    .map(|c| T::from(c[0] as f64 / c[1] as f64))
                    .collect()
            }
            TagType::SRational => {
                let parts = endian.decode_all::<4, i32>(bytes)?;
                parts
                    .chunks_exact(2)
                    .map(|c| T::from(c[0] as f64 / c[1] as f64))
                    .collect()
            }
            TagType::Ascii | TagType::Unknown => None,
        }
    }

    pub fn value<T: NumCast + Copy>(&self) -> Option<T> {
        self.values().and_then(|v| v.first().copied())
    }

    pub fn as_string(&self) -> Option<String> {
        match self.datatype {
            TagType::Ascii => String::from_utf8(self.data.clone())
                .ok()
                .map(|s| s.trim_end_matches('\0').to_string()),
            _ => None,
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut value_string = match (self.as_string(), self.values::<f64>()) {
            (Some(s), _) => s.replace('\n', "\\n"),
            (None, Some(values)) if values.len() == 1 => format!("{}", values[0]),
            (None, Some(values)) => format!("{values:?}"),
            (None, None) => "Undefined".to_string(),
        };
        if value_string.len() > 100 {
            value_string = format!("{}...", &value_string[..98])
        }
        let id_string = match self.id() {
            Some(id) => format!("{id:?}"),
            None => format!("Unknown({})", self.code),
        };
        write!(
            f,
            "{} {:?}[{}]: {}",
            id_string, self.datatype, self.count, value_string
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum TagType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
    Ifd = 13,
    Long8 = 16,
    SLong8 = 17,
    Ifd8 = 18,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

impl TagType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            TagType::Byte | TagType::Ascii | TagType::SByte | TagType::Undefined => 1,
            TagType::Short | TagType::SShort => 2,
            TagType::Long | TagType::SLong | TagType::Float | TagType::Ifd => 4,
            TagType::Rational
            | TagType::SRational
            | TagType::Double
            | TagType::Long8
            | TagType::SLong8
            | TagType::Ifd8 => 8,
            TagType::Unknown => 1,
        }
    }
}
