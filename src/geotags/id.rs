// https://docs.ogc.org/is/19-008r4/19-008r4.html#_summary_of_geokey_ids_and_names

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, TryFromPrimitive, Eq, Hash)]
#[repr(u16)]
pub enum GeoKeyId {
    GTModelTypeGeoKey = 1024,
    GTRasterTypeGeoKey = 1025,
    GTCitationGeoKey = 1026,
    GeographicTypeGeoKey = 2048,
    GeogCitationGeoKey = 2049,
    GeogGeodeticDatumGeoKey = 2050,
    GeogAngularUnitsGeoKey = 2054,
    GeogEllipsoidGeoKey = 2056,
    GeogSemiMajorAxisGeoKey = 2057,
    GeogInvFlatteningGeoKey = 2059,
    ProjectedCSTypeGeoKey = 3072,
    ProjLinearUnitsGeoKey = 3076,
}

/// GTModelTypeGeoKey values
pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
/// GTRasterTypeGeoKey values
pub const RASTER_PIXEL_IS_AREA: u16 = 1;
/// GeogAngularUnitsGeoKey values
pub const ANGULAR_UNIT_DEGREE: u16 = 9102;
