//! `dsfetch reconcile` – list what is still missing without downloading.

use anyhow::{Context, Result};
use dsfetch_core::reconcile::{self, artifact};
use std::path::Path;

pub fn run_reconcile(manifest: &Path, output: &Path, limit: usize, write: bool) -> Result<()> {
    let missing = reconcile::reconcile_manifest(manifest, limit, output)
        .with_context(|| format!("failed to reconcile {}", manifest.display()))?;

    if missing.is_empty() {
        println!("Nothing missing in {}.", output.display());
        return Ok(());
    }
    for url in missing.urls() {
        println!("{}", url);
    }
    if write {
        std::fs::create_dir_all(output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        let path = artifact::write_missing_list(output, missing.urls())?;
        eprintln!("{} missing URL(s) written to {}", missing.len(), path.display());
    } else {
        eprintln!("{} missing URL(s)", missing.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_persists_missing_list() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("urls.txt");
        std::fs::write(&manifest, "https://h/a.png\nhttps://h/b.png\n").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("a.png"), b"x").unwrap();

        run_reconcile(&manifest, &out, 0, true).unwrap();
        let list = std::fs::read_to_string(artifact::missing_list_path(&out)).unwrap();
        assert_eq!(list.trim(), "https://h/b.png");
    }

    #[test]
    fn absent_manifest_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        run_reconcile(&dir.path().join("absent.txt"), dir.path(), 0, true).unwrap();
        assert!(!artifact::missing_list_path(dir.path()).exists());
    }
}
