//! Remote observation archives, partitioned `radar/<year>/<month>/<day>/<file>.h5`

use std::path::Path;

mod error;
mod local;
mod s3;

pub use error::{ArchiveError, ArchiveResult};
pub use local::DirectoryArchive;
#[cfg(feature = "s3")]
pub use s3::S3Archive;

pub const DEFAULT_BUCKET: &str = "met-office-radar-obs-data";
pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_PREFIX: &str = "radar/";
pub const OBSERVATION_SUFFIX: &str = ".h5";

/// Listing and fetching of archive objects by key
pub trait ArchiveStore {
    /// Immediate child prefixes of `prefix`, each ending in `/`
    fn list_prefixes(&self, prefix: &str) -> ArchiveResult<Vec<String>>;

    /// Every object key under `prefix`
    fn list_keys(&self, prefix: &str) -> ArchiveResult<Vec<String>>;

    /// Fetch `key` into the file at `dest`, returning the byte count
    fn download(&self, key: &str, dest: &Path) -> ArchiveResult<u64>;
}

impl<A: ArchiveStore + ?Sized> ArchiveStore for &A {
    fn list_prefixes(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        (**self).list_prefixes(prefix)
    }

    fn list_keys(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        (**self).list_keys(prefix)
    }

    fn download(&self, key: &str, dest: &Path) -> ArchiveResult<u64> {
        (**self).download(key, dest)
    }
}

impl<A: ArchiveStore + ?Sized> ArchiveStore for Box<A> {
    fn list_prefixes(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        (**self).list_prefixes(prefix)
    }

    fn list_keys(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        (**self).list_keys(prefix)
    }

    fn download(&self, key: &str, dest: &Path) -> ArchiveResult<u64> {
        (**self).download(key, dest)
    }
}

/// Last path segment of a key, `radar/2024/01/02/scan.h5` -> `scan.h5`
pub fn key_file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// File name without its extension, used to name conversion outputs
pub fn key_base_name(key: &str) -> &str {
    let name = key_file_name(key);
    match name.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => name,
    }
}

/// Lexical descending order, most recent partition first
pub fn sort_descending(items: &mut [String]) {
    items.sort_unstable_by(|a, b| b.cmp(a));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names() {
        let key = "radar/2024/01/02/metoffice_20240102_1200.h5";
        assert_eq!(key_file_name(key), "metoffice_20240102_1200.h5");
        assert_eq!(key_base_name(key), "metoffice_20240102_1200");
        assert_eq!(key_base_name("radar/a.b.h5"), "a.b");
        assert_eq!(key_base_name("noext"), "noext");
        assert_eq!(key_base_name(".hidden"), ".hidden");
    }

    #[test]
    fn descending_is_lexical() {
        let mut items = vec!["radar/2023/".to_string(), "radar/2025/".into(), "radar/2024/".into()];
        sort_descending(&mut items);
        assert_eq!(items, vec!["radar/2025/", "radar/2024/", "radar/2023/"]);
    }
}
