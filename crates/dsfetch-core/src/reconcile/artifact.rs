//! Persisted URL lists in the destination directory.
//!
//! `_missing.txt` exists only while a retry cycle is running; `_failed.txt`
//! exists only after a split ended with URLs still missing. Both are valid
//! manifests, so an operator or script can feed them straight back in.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::scheduler::FailedUrl;
use crate::storage::SpoolFile;

/// Transient list of URLs being retried.
pub const MISSING_LIST: &str = "_missing.txt";
/// URLs still missing after both passes, one `reason<TAB>url` line each.
pub const FAILURE_LIST: &str = "_failed.txt";

pub fn missing_list_path(dir: &Path) -> PathBuf {
    dir.join(MISSING_LIST)
}

pub fn failure_list_path(dir: &Path) -> PathBuf {
    dir.join(FAILURE_LIST)
}

/// Writes `lines` to `dir/name`, replacing the previous version atomically.
fn write_lines<I>(dir: &Path, name: &str, lines: I) -> io::Result<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let path = dir.join(name);
    let mut spool = SpoolFile::create_in(dir)?;
    for line in lines {
        spool.write_all(line.as_bytes())?;
        spool.write_all(b"\n")?;
    }
    spool.finalize(&path)?;
    Ok(path)
}

pub fn write_missing_list(dir: &Path, urls: &[String]) -> io::Result<PathBuf> {
    write_lines(dir, MISSING_LIST, urls.iter().cloned())
}

pub fn write_failure_list(dir: &Path, failures: &[FailedUrl]) -> io::Result<PathBuf> {
    write_lines(
        dir,
        FAILURE_LIST,
        failures
            .iter()
            .map(|f| format!("{}\t{}", one_line(&f.reason), f.url)),
    )
}

/// Removes `dir/name`. Returns true if a file was removed; absence is not an error.
pub fn remove_artifact(dir: &Path, name: &str) -> io::Result<bool> {
    match std::fs::remove_file(dir.join(name)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn one_line(reason: &str) -> String {
    reason
        .chars()
        .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
