//! Spool file for one in-flight transfer.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::{SPOOL_PREFIX, SPOOL_SUFFIX};

/// Uniquely named temp file in the destination directory. Deleted on drop
/// unless [`SpoolFile::finalize`] moved it into place.
pub struct SpoolFile {
    file: NamedTempFile,
    written: u64,
}

impl SpoolFile {
    /// Create a new spool file in `dir`; `dir` must exist.
    pub fn create_in(dir: &Path) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(SPOOL_PREFIX)
            .suffix(SPOOL_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self { file, written: 0 })
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Sync and atomically rename onto `dest`, replacing any file already there.
    /// `dest` must be on the same filesystem as the spool file.
    pub fn finalize(mut self, dest: &Path) -> io::Result<()> {
        self.file.flush()?;
        self.file.as_file().sync_all()?;
        self.file.persist(dest).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Write for SpoolFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
