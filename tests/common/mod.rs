#![allow(dead_code)]

use ndarray::{array, Array2};
use radarcog::archive::{ArchiveError, ArchiveResult, ArchiveStore};
use radarcog::container::{ContainerError, ContainerResult, ObservationSource};
use radarcog::{GeoBounds, Observation, ObservationGrid};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

pub const CORRUPT: &[u8] = b"corrupt";

/// Serves the same observation for every readable file, fails on `CORRUPT`
pub struct FakeSource {
    pub grid: ObservationGrid,
    pub bounds: GeoBounds,
}

impl FakeSource {
    pub fn scenario() -> Self {
        Self {
            grid: array![[0.0_f64, 0.3], [1.5, 35.0]].into(),
            bounds: GeoBounds::new(-2.0, 50.0, 0.0, 52.0),
        }
    }

    pub fn wide() -> Self {
        let grid: Array2<f32> =
            Array2::from_shape_fn((100, 200), |(r, c)| ((r * 7 + c * 3) % 50) as f32 - 5.0);
        Self {
            grid: grid.into(),
            bounds: GeoBounds::new(-2.0, 50.0, 0.0, 52.0),
        }
    }
}

impl ObservationSource for FakeSource {
    fn read_observation(&self, path: &Path) -> ContainerResult<Observation> {
        let bytes = std::fs::read(path).map_err(|e| ContainerError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if bytes == CORRUPT {
            return Err(ContainerError::MissingDataset("dataset1/data1/data".into()));
        }
        Ok(Observation {
            grid: self.grid.clone(),
            bounds: self.bounds,
        })
    }
}

/// In-memory archive that records every download
#[derive(Default)]
pub struct FakeArchive {
    objects: BTreeMap<String, Vec<u8>>,
    pub downloads: RefCell<Vec<String>>,
}

impl FakeArchive {
    pub fn with(mut self, key: &str, bytes: &[u8]) -> Self {
        self.objects.insert(key.to_string(), bytes.to_vec());
        self
    }

    pub fn downloaded(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }
}

impl ArchiveStore for FakeArchive {
    fn list_prefixes(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        let mut prefixes: Vec<String> = self
            .objects
            .keys()
            .filter_map(|key| key.strip_prefix(prefix))
            .filter_map(|rest| rest.split_once('/'))
            .map(|(child, _)| format!("{prefix}{child}/"))
            .collect();
        prefixes.dedup();
        Ok(prefixes)
    }

    fn list_keys(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        Ok(self
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn download(&self, key: &str, dest: &Path) -> ArchiveResult<u64> {
        let bytes = self.objects.get(key).ok_or(ArchiveError::Download {
            key: key.to_string(),
            reason: "no such key".to_string(),
        })?;
        std::fs::write(dest, bytes)?;
        self.downloads.borrow_mut().push(key.to_string());
        Ok(bytes.len() as u64)
    }
}
