// https://support.hdfgroup.org/documentation/hdf5/latest/
// ODIM_H5 layout: dataset1/data1/data holds the scan, /where holds the corners

use super::{
    ContainerError, ContainerResult, ObservationSource, BOUNDS_ATTRIBUTES,
    DEFAULT_BOUNDS_GROUP, DEFAULT_DATASET,
};
use crate::grid::{BoundsError, GeoBounds, Observation, ObservationGrid};
use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
use hdf5::{Dataset, File, Group};
use std::path::Path;
use tracing::debug;

/// Reads observations from HDF5 files
#[derive(Clone, Debug)]
pub struct Hdf5Source {
    dataset: String,
    bounds_group: String,
}

impl Default for Hdf5Source {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            bounds_group: DEFAULT_BOUNDS_GROUP.to_string(),
        }
    }
}

impl Hdf5Source {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset: &str) -> Self {
        self.dataset = dataset.to_string();
        self
    }

    pub fn with_bounds_group(mut self, group: &str) -> Self {
        self.bounds_group = group.to_string();
        self
    }
}

impl ObservationSource for Hdf5Source {
    fn read_observation(&self, path: &Path) -> ContainerResult<Observation> {
        let file = File::open(path).map_err(|e| ContainerError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let dataset = file
            .dataset(&self.dataset)
            .map_err(|_| ContainerError::MissingDataset(self.dataset.clone()))?;
        let grid = read_grid(&dataset, &self.dataset).map_err(|e| match e {
            GridReadError::Unsupported(msg) => ContainerError::UnsupportedType(msg),
            GridReadError::Hdf5(e) => ContainerError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let group = file
            .group(&self.bounds_group)
            .map_err(|_| ContainerError::MissingAttribute(self.bounds_group.clone()))?;
        let [ll_lon, ll_lat, ur_lon, ur_lat] = [
            read_bound(&group, BOUNDS_ATTRIBUTES[0])?,
            read_bound(&group, BOUNDS_ATTRIBUTES[1])?,
            read_bound(&group, BOUNDS_ATTRIBUTES[2])?,
            read_bound(&group, BOUNDS_ATTRIBUTES[3])?,
        ];
        let bounds = GeoBounds::new(ll_lon, ll_lat, ur_lon, ur_lat).validated()?;

        debug!(
            "Read {}x{} grid of {:?} from {}, bounds {}",
            grid.width(),
            grid.height(),
            grid.sample_format(),
            path.display(),
            bounds
        );
        Ok(Observation { grid, bounds })
    }
}

enum GridReadError {
    Unsupported(String),
    Hdf5(hdf5::Error),
}

impl From<hdf5::Error> for GridReadError {
    fn from(e: hdf5::Error) -> Self {
        GridReadError::Hdf5(e)
    }
}

fn read_grid(dataset: &Dataset, name: &str) -> Result<ObservationGrid, GridReadError> {
    let ndim = dataset.ndim();
    if ndim != 2 {
        return Err(GridReadError::Unsupported(format!(
            "{name} has {ndim} dimensions, expected 2"
        )));
    }

    let grid: ObservationGrid = match dataset.dtype()?.to_descriptor()? {
        TypeDescriptor::Unsigned(IntSize::U1) => dataset.read_2d::<u8>()?.into(),
        TypeDescriptor::Integer(IntSize::U1) => dataset.read_2d::<i8>()?.into(),
        TypeDescriptor::Unsigned(IntSize::U2) => dataset.read_2d::<u16>()?.into(),
        TypeDescriptor::Integer(IntSize::U2) => dataset.read_2d::<i16>()?.into(),
        TypeDescriptor::Unsigned(IntSize::U4) => dataset.read_2d::<u32>()?.into(),
        TypeDescriptor::Integer(IntSize::U4) => dataset.read_2d::<i32>()?.into(),
        TypeDescriptor::Unsigned(IntSize::U8) => dataset.read_2d::<u64>()?.into(),
        TypeDescriptor::Integer(IntSize::U8) => dataset.read_2d::<i64>()?.into(),
        TypeDescriptor::Float(FloatSize::U4) => dataset.read_2d::<f32>()?.into(),
        TypeDescriptor::Float(FloatSize::U8) => dataset.read_2d::<f64>()?.into(),
        other => {
            return Err(GridReadError::Unsupported(format!(
                "{name} holds {other:?}, expected numbers"
            )))
        }
    };
    Ok(grid)
}

/// Corner attributes are scalars, or single element arrays in some producers
fn read_bound(group: &Group, name: &str) -> ContainerResult<f64> {
    let attr = group
        .attr(name)
        .map_err(|_| ContainerError::MissingAttribute(name.to_string()))?;
    let values = attr
        .read_raw::<f64>()
        .map_err(|_| BoundsError::NotNumeric(name.to_string()))?;
    match values.as_slice() {
        [value] => Ok(*value),
        _ => Err(BoundsError::NotNumeric(name.to_string()).into()),
    }
}
