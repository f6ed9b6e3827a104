//! Disk side of a transfer.
//!
//! Bodies are streamed into a spool file inside the destination directory and
//! renamed onto the resolved name only after the transfer succeeded, so a file
//! under a resolved name is always complete. Spool files left behind by a
//! crashed run are swept before the next pass.

mod spool;

use std::fs;
use std::io;
use std::path::Path;

pub use spool::SpoolFile;

/// Prefix of spool files; never produced by the destination resolver for real URLs.
pub const SPOOL_PREFIX: &str = ".dsfetch-";
/// Suffix of spool files.
pub const SPOOL_SUFFIX: &str = ".part";

/// True if `path` exists and is a regular file (following symlinks).
pub fn is_present(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Create `dir` (and parents) if needed.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

fn is_spool_name(name: &str) -> bool {
    name.starts_with(SPOOL_PREFIX) && name.ends_with(SPOOL_SUFFIX)
}

/// Remove spool files left in `dir` by an interrupted run. Returns how many were removed.
pub fn sweep_spool_files(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if !is_spool_name(&name.to_string_lossy()) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %entry.path().display(), "could not remove stale spool file: {}", e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn spool_finalize_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("img.png");
        let mut spool = SpoolFile::create_in(dir.path()).unwrap();
        spool.write_all(b"hello").unwrap();
        assert_eq!(spool.bytes_written(), 5);
        assert!(!is_present(&dest));
        spool.finalize(&dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn dropped_spool_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut spool = SpoolFile::create_in(dir.path()).unwrap();
            spool.write_all(b"partial").unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn finalize_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("same.jpg");
        std::fs::write(&dest, b"first").unwrap();
        let mut spool = SpoolFile::create_in(dir.path()).unwrap();
        spool.write_all(b"second").unwrap();
        spool.finalize(&dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"second");
    }

    #[test]
    fn sweep_removes_only_spool_files() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(".dsfetch-abc123.part");
        let mut f = std::fs::File::create(&stale).unwrap();
        f.write_all(b"x").unwrap();
        std::fs::write(dir.path().join("keep.jpg"), b"y").unwrap();
        std::fs::write(dir.path().join("notes.part"), b"z").unwrap();
        assert_eq!(sweep_spool_files(dir.path()).unwrap(), 1);
        assert!(!stale.exists());
        assert!(dir.path().join("keep.jpg").exists());
        assert!(dir.path().join("notes.part").exists());
    }

    #[test]
    fn directories_are_not_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a.jpg")).unwrap();
        assert!(!is_present(&dir.path().join("a.jpg")));
        assert!(!is_present(&dir.path().join("missing.jpg")));
    }
}
