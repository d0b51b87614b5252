// https://docs.ogc.org/is/19-008r4/19-008r4.html#_geotiff_tags_for_coordinate_transformations

use crate::grid::GeoTransform;
use crate::tiff::{Endian, Ifd, TagData, TagId};
use std::fmt::Display;

mod error;
mod id;
mod keys;
mod value;

pub use error::GeoTiffError;
pub use id::GeoKeyId;
pub use keys::{GeoKey, GeoKeyDirectory};
pub use value::GeoKeyValue;

#[derive(Clone, Debug)]
pub struct GeoTags {
    pub directory: GeoKeyDirectory,
    pub model: GeoModel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GeoModel {
    Transformed(GeoModelTransformed),
    Scaled(GeoModelScaled),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoModelTransformed {
    pub transformation: [f64; 16],
    pub tiepoint: Option<[f64; 6]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoModelScaled {
    pub pixel_scale: [f64; 3],
    pub tiepoint: [f64; 6],
}

impl Display for GeoTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GeoTIFF Tags:")?;
        match &self.model {
            GeoModel::Transformed(model) => {
                writeln!(f, "  Tiepoint: {:?}", model.tiepoint)?;
                writeln!(f, "  Transformation: {:?}", model.transformation)?;
            }
            GeoModel::Scaled(model) => {
                writeln!(f, "  Tiepoint: {:?}", model.tiepoint)?;
                writeln!(f, "  Pixel Scale: {:?}", model.pixel_scale)?;
            }
        }
        write!(
            f,
            "  Directory: {{version: {}, revision: {}.{}}}",
            self.directory.version, self.directory.revision.0, self.directory.revision.1,
        )?;
        if !self.directory.keys.is_empty() {
            write!(f, "\n  Keys:")?;
            for key in self.directory.keys.iter() {
                write!(f, "\n    {key}")?;
            }
        }
        Ok(())
    }
}

impl GeoTags {
    pub fn from_tiepoint_and_scale(tiepoint: [f64; 6], pixel_scale: [f64; 3]) -> Self {
        Self {
            model: GeoModel::Scaled(GeoModelScaled {
                tiepoint,
                pixel_scale,
            }),
            directory: GeoKeyDirectory::new(),
        }
    }

    /// Geo tags for a north-up raster in a geographic (lon/lat degree) CRS
    pub fn geographic(epsg: u16, transform: &GeoTransform) -> Self {
        let (lon, lat) = transform.origin;
        let (dx, dy) = transform.pixel_size;
        let mut tags = Self::from_tiepoint_and_scale([0.0, 0.0, 0.0, lon, lat, 0.0], [dx, -dy, 0.0]);
        tags.set_key(
            GeoKeyId::GTModelTypeGeoKey,
            GeoKeyValue::Short(vec![id::MODEL_TYPE_GEOGRAPHIC]),
        );
        tags.set_key(
            GeoKeyId::GTRasterTypeGeoKey,
            GeoKeyValue::Short(vec![id::RASTER_PIXEL_IS_AREA]),
        );
        tags.set_key(
            GeoKeyId::GeographicTypeGeoKey,
            GeoKeyValue::Short(vec![epsg]),
        );
        if epsg == 4326 {
            tags.set_key(
                GeoKeyId::GeogCitationGeoKey,
                GeoKeyValue::Ascii("WGS 84".to_string()),
            );
        }
        tags.set_key(
            GeoKeyId::GeogAngularUnitsGeoKey,
            GeoKeyValue::Short(vec![id::ANGULAR_UNIT_DEGREE]),
        );
        tags
    }

    pub fn parse(ifd: &Ifd) -> Result<Self, GeoTiffError> {
        let tiepoint = get_tag_as_array(ifd, TagId::ModelTiepoint).ok();
        let pixel_scale = get_tag_as_array(ifd, TagId::ModelPixelScale).ok();
        let transformation = get_tag_as_array(ifd, TagId::ModelTransformation).ok();
        let model = match (tiepoint, pixel_scale, transformation) {
            (Some(tiepoint), Some(pixel_scale), _) => GeoModel::Scaled(GeoModelScaled {
                tiepoint,
                pixel_scale,
            }),
            (tiepoint, _, Some(transformation)) => GeoModel::Transformed(GeoModelTransformed {
                tiepoint,
                transformation,
            }),
            _ => return Err(GeoTiffError::MissingTag(TagId::ModelPixelScale)),
        };

        let directory = GeoKeyDirectory::parse(ifd)?;

        Ok(Self { model, directory })
    }

    pub fn add_to_ifd(&self, ifd: &mut Ifd, endian: Endian) {
        match &self.model {
            GeoModel::Transformed(model) => {
                ifd.set_tag(
                    TagId::ModelTransformation,
                    TagData::Double(model.transformation.to_vec()),
                    endian,
                );
                if let Some(tiepoint) = model.tiepoint {
                    ifd.set_tag(
                        TagId::ModelTiepoint,
                        TagData::Double(tiepoint.to_vec()),
                        endian,
                    );
                }
            }
            GeoModel::Scaled(model) => {
                ifd.set_tag(
                    TagId::ModelTiepoint,
                    TagData::Double(model.tiepoint.to_vec()),
                    endian,
                );
                ifd.set_tag(
                    TagId::ModelPixelScale,
                    TagData::Double(model.pixel_scale.to_vec()),
                    endian,
                );
            }
        }
        self.directory.add_to_ifd(ifd, endian);
    }

    pub fn set_key<I: Into<u16>>(&mut self, id: I, value: GeoKeyValue) {
        let code: u16 = id.into();
        let key = GeoKey { code, value };
        let keys = &mut self.directory.keys;
        if let Some(index) = keys.iter().position(|key| key.code == code) {
            keys[index] = key;
        } else {
            keys.push(key);
        }
    }

    pub fn get_key(&self, id: GeoKeyId) -> Option<&GeoKeyValue> {
        let code: u16 = id.into();
        self.directory
            .keys
            .iter()
            .find(|key| key.code == code)
            .map(|key| &key.value)
    }

    pub fn epsg(&self) -> Option<u16> {
        self.get_key(GeoKeyId::ProjectedCSTypeGeoKey)
            .or_else(|| self.get_key(GeoKeyId::GeographicTypeGeoKey))
            .and_then(|value| value.as_number())
    }

    /// Affine transform of a north-up raster, None for rotated models
    pub fn transform(&self) -> Option<GeoTransform> {
        match &self.model {
            GeoModel::Scaled(model) => {
                let [i, j, _, x, y, _] = model.tiepoint;
                let [sx, sy, _] = model.pixel_scale;
                Some(GeoTransform {
                    origin: (x - i * sx, y + j * sy),
                    pixel_size: (sx, -sy),
                })
            }
            GeoModel::Transformed(model) => {
                let m = model.transformation;
                if m[1] != 0.0 || m[4] != 0.0 {
                    return None;
                }
                Some(GeoTransform {
                    origin: (m[3], m[7]),
                    pixel_size: (m[0], m[5]),
                })
            }
        }
    }
}

fn get_tag_as_array<const N: usize>(ifd: &Ifd, id: TagId) -> Result<[f64; N], GeoTiffError> {
    ifd.get_tag(id)
        .map_err(|_| GeoTiffError::MissingTag(id))?
        .values::<f64>()
        .and_then(|values| values.try_into().ok())
        .ok_or(GeoTiffError::BadTag(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GeoBounds;

    #[test]
    fn geographic_tags_survive_an_ifd() {
        let bounds = GeoBounds::new(-2.0, 50.0, 0.0, 52.0);
        let transform = GeoTransform::from_bounds(&bounds, 200, 100);
        let tags = GeoTags::geographic(4326, &transform);

        let mut ifd = Ifd::new();
        tags.add_to_ifd(&mut ifd, Endian::Little);
        let parsed = GeoTags::parse(&ifd).unwrap();

        assert_eq!(parsed.model, tags.model);
        assert_eq!(parsed.epsg(), Some(4326));
        assert_eq!(parsed.transform(), Some(transform));
        assert_eq!(
            parsed.get_key(GeoKeyId::GeogCitationGeoKey),
            Some(&GeoKeyValue::Ascii("WGS 84".to_string()))
        );
        assert_eq!(
            parsed.get_key(GeoKeyId::GTModelTypeGeoKey),
            Some(&GeoKeyValue::Short(vec![2]))
        );
    }

    #[test]
    fn unparse_orders_keys() {
        let mut tags = GeoTags::from_tiepoint_and_scale([0.0; 6], [1.0, 1.0, 0.0]);
        tags.set_key(GeoKeyId::GeographicTypeGeoKey, GeoKeyValue::Short(vec![4326]));
        tags.set_key(GeoKeyId::GTModelTypeGeoKey, GeoKeyValue::Short(vec![2]));
        let (directory, _, _) = tags.directory.unparse();
        assert_eq!(directory, vec![1, 1, 0, 2, 1024, 0, 1, 2, 2048, 0, 1, 4326]);
    }

    #[test]
    fn missing_model_is_an_error() {
        let ifd = Ifd::new();
        assert!(matches!(
            GeoTags::parse(&ifd),
            Err(GeoTiffError::MissingTag(TagId::ModelPixelScale))
        ));
    }
}
