use super::{ArchiveError, ArchiveResult, ArchiveStore};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Archive mirrored on a local filesystem, keys map onto relative paths
#[derive(Clone, Debug)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn entries(&self, prefix: &str) -> ArchiveResult<Vec<(String, bool)>> {
        let dir = self.root.join(prefix);
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            // A missing partition lists as empty, like an unused object prefix
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(ArchiveError::List {
                    prefix: prefix.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let mut entries = vec![];
        for entry in read_dir {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push((name, entry.file_type()?.is_dir()));
        }
        Ok(entries)
    }
}

impl ArchiveStore for DirectoryArchive {
    fn list_prefixes(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        Ok(self
            .entries(prefix)?
            .into_iter()
            .filter(|(_, is_dir)| *is_dir)
            .map(|(name, _)| format!("{prefix}{name}/"))
            .collect())
    }

    fn list_keys(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        let mut keys = vec![];
        for (name, is_dir) in self.entries(prefix)? {
            if is_dir {
                keys.extend(self.list_keys(&format!("{prefix}{name}/"))?);
            } else {
                keys.push(format!("{prefix}{name}"));
            }
        }
        Ok(keys)
    }

    fn download(&self, key: &str, dest: &Path) -> ArchiveResult<u64> {
        fs::copy(self.root.join(key), dest).map_err(|e| ArchiveError::Download {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn mirrors_key_hierarchy() {
        let dir = TempDir::new().unwrap();
        let day = dir.path().join("radar/2024/01/02");
        fs::create_dir_all(&day).unwrap();
        fs::write(day.join("a.h5"), b"scan").unwrap();
        fs::write(day.join("notes.txt"), b"").unwrap();
        fs::create_dir_all(dir.path().join("radar/2023")).unwrap();

        let archive = DirectoryArchive::new(dir.path());
        let mut years = archive.list_prefixes("radar/").unwrap();
        years.sort();
        assert_eq!(years, vec!["radar/2023/", "radar/2024/"]);

        let mut keys = archive.list_keys("radar/2024/").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["radar/2024/01/02/a.h5", "radar/2024/01/02/notes.txt"]);

        assert!(archive.list_keys("radar/1999/").unwrap().is_empty());

        let dest = dir.path().join("copy.h5");
        assert_eq!(archive.download("radar/2024/01/02/a.h5", &dest).unwrap(), 4);
        assert!(matches!(
            archive.download("radar/missing.h5", &dest),
            Err(ArchiveError::Download { .. })
        ));
    }
}
