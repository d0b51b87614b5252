// https://docs.ogc.org/is/19-008r4/19-008r4.html#_requirements_class_geokeydirectorytag

use std::fmt::Display;

use super::{GeoKeyId, GeoKeyValue, GeoTiffError};
use crate::tiff::{Endian, Ifd, TagData, TagId, TagType};

#[derive(Clone, Debug)]
pub struct GeoKeyDirectory {
    pub version: u16,
    pub revision: (u16, u16),
    pub keys: Vec<GeoKey>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoKey {
    pub code: u16,
    pub value: GeoKeyValue,
}

impl GeoKey {
    pub fn id(&self) -> Option<GeoKeyId> {
        GeoKeyId::try_from(self.code).ok()
    }
}

impl Default for GeoKeyDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoKeyDirectory {
    pub fn new() -> Self {
        Self {
            version: 1,
            revision: (1, 0),
            keys: vec![],
        }
    }

    pub fn parse(ifd: &Ifd) -> Result<Self, GeoTiffError> {
        let directory_values: Vec<u16> = ifd
            .get_tag(TagId::GeoKeyDirectory)
            .map_err(|_| GeoTiffError::MissingTag(TagId::GeoKeyDirectory))?
            .values()
            .ok_or(GeoTiffError::BadTag(TagId::GeoKeyDirectory))?;

        // Directory header
        let [version, revision, minor_revision, key_count] = directory_values
            .get(..4)
            .and_then(|header| <[u16; 4]>::try_from(header).ok())
            .ok_or(GeoTiffError::BadTag(TagId::GeoKeyDirectory))?;

        // Directory size validation
        let min_valid_directory_size = 4 + key_count as usize * 4;
        if directory_values.len() < min_valid_directory_size {
            return Err(GeoTiffError::BadTag(TagId::GeoKeyDirectory));
        }

        // Parse keys
        let keys: Vec<GeoKey> = directory_values[4..min_valid_directory_size]
            .chunks_exact(4)
            .map(|entry| {
                let (code, location, count, offset) = (entry[0], entry[1], entry[2], entry[3]);

                let value = if location == 0 {
                    GeoKeyValue::Short(vec![offset])
                } else {
                    let start = offset as usize;
                    let end = start + count as usize;
                    ifd.get_tag_by_code(location)
                        .and_then(|tag| match tag.datatype {
                            TagType::Ascii => tag.as_string().and_then(|s| {
                                s.get(start..end.min(s.len())).map(|s| {
                                    GeoKeyValue::Ascii(
                                        s.trim_end_matches(['|', '\0']).to_string(),
                                    )
                                })
                            }),
                            TagType::Short => tag
                                .values::<u16>()
                                .and_then(|v| v.get(start..end).map(|v| v.to_vec()))
                                .map(GeoKeyValue::Short),
                            TagType::Double => tag
                                .values::<f64>()
                                .and_then(|v| v.get(start..end).map(|v| v.to_vec()))
                                .map(GeoKeyValue::Double),
                            _ => None,
                        })
                        .unwrap_or(GeoKeyValue::Undefined)
                };

                GeoKey { code, value }
            })
            .collect();

        Ok(Self {
            version,
            revision: (revision, minor_revision),
            keys,
        })
    }

    pub fn add_to_ifd(&self, ifd: &mut Ifd, endian: Endian) {
        let (key_directory, ascii_params, double_params) = self.unparse();
        ifd.set_tag(
            TagId::GeoKeyDirectory,
            TagData::Short(key_directory),
            endian,
        );
        if !ascii_params.is_empty() {
            ifd.set_tag(
                TagId::GeoAsciiParams,
                TagData::from_string(&ascii_params),
                endian,
            );
        }
        if !double_params.is_empty() {
            ifd.set_tag(
                TagId::GeoDoubleParams,
                TagData::Double(double_params),
                endian,
            );
        }
    }

    /// Flatten the directory into the GeoKeyDirectory, GeoAsciiParams and
    /// GeoDoubleParams tag contents. Keys are written in ascending code order.
    pub fn unparse(&self) -> (Vec<u16>, String, Vec<f64>) {
        let mut keys: Vec<&GeoKey> = self.keys.iter().collect();
        keys.sort_by_key(|key| key.code);

        let mut directory = vec![
            self.version,
            self.revision.0,
            self.revision.1,
            keys.len() as u16,
        ];
        let mut shorts: Vec<u16> = vec![];
        let mut asciis = String::new();
        let mut doubles: Vec<f64> = vec![];
        let dir_size = 4 * (keys.len() + 1) as u16;

        for key in keys {
            directory.push(key.code);
            match &key.value {
                GeoKeyValue::Short(vec) if vec.len() == 1 => directory.extend([0, 1, vec[0]]),
                GeoKeyValue::Short(vec) if vec.is_empty() => directory.extend([0, 0, 0]),
                GeoKeyValue::Short(vec) => {
                    directory.extend([
                        TagId::GeoKeyDirectory.into(),
                        vec.len() as u16,
                        dir_size + shorts.len() as u16,
                    ]);
                    shorts.extend(vec);
                }
                GeoKeyValue::Ascii(s) => {
                    // Each ascii value is terminated by a pipe within the shared param string
                    directory.extend([
                        TagId::GeoAsciiParams.into(),
                        s.len() as u16 + 1,
                        asciis.len() as u16,
                    ]);
                    asciis.push_str(s);
                    asciis.push('|');
                }
                GeoKeyValue::Double(vec) => {
                    directory.extend([
                        TagId::GeoDoubleParams.into(),
                        vec.len() as u16,
                        doubles.len() as u16,
                    ]);
                    doubles.extend(vec);
                }
                GeoKeyValue::Undefined => directory.extend([0, 0, 0]),
            }
        }

        ([directory, shorts].concat(), asciis, doubles)
    }
}

impl Display for GeoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_string = match self.id() {
            Some(id) => format!("{id:?}"),
            None => format!("0x{:04X}", self.code),
        };
        write!(f, "{}: {}", id_string, self.value)
    }
}
