//! Observation containers: one gridded scan plus its corner coordinates

use crate::grid::Observation;
use std::path::Path;

mod error;
#[cfg(feature = "hdf5")]
mod h5;

pub use error::{ContainerError, ContainerResult};
#[cfg(feature = "hdf5")]
pub use h5::Hdf5Source;

pub const DEFAULT_DATASET: &str = "dataset1/data1/data";
pub const DEFAULT_BOUNDS_GROUP: &str = "where";

/// Names of the corner attributes, in `GeoBounds` field order
pub const BOUNDS_ATTRIBUTES: [&str; 4] = ["LL_lon", "LL_lat", "UR_lon", "UR_lat"];

/// Anything that can produce an observation from a file on disk
pub trait ObservationSource {
    fn read_observation(&self, path: &Path) -> ContainerResult<Observation>;
}

impl<S: ObservationSource + ?Sized> ObservationSource for &S {
    fn read_observation(&self, path: &Path) -> ContainerResult<Observation> {
        (**self).read_observation(path)
    }
}

/// Stand-in source for builds without an HDF5 reader
#[cfg(not(feature = "hdf5"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct Unsupported;

#[cfg(not(feature = "hdf5"))]
impl ObservationSource for Unsupported {
    fn read_observation(&self, path: &Path) -> ContainerResult<Observation> {
        Err(ContainerError::Read {
            path: path.to_path_buf(),
            reason: "built without HDF5 support".to_string(),
        })
    }
}
