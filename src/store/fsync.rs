//! Low-level fsync operations for snapshot durability.
//!
//! Both file and directory fsyncs are required for crash safety: on POSIX
//! systems, renaming a file updates the directory entry, and without an
//! fsync on the directory that entry may not survive a power loss even if
//! the file contents were synced.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Syncs a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory to disk, ensuring directory entries are durable.
///
/// Without this, a freshly renamed snapshot might revert to its temp name
/// after a crash.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn fsync_file_works() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut file = File::create(&path).unwrap();
        file.write_all(b"{}").unwrap();

        fsync_file(&file).unwrap();
    }

    #[test]
    fn fsync_dir_works() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("data.json")).unwrap();

        fsync_dir(dir.path()).unwrap();
    }

    #[test]
    fn fsync_dir_fails_on_nonexistent() {
        let result = fsync_dir(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(result.is_err());
    }
}
