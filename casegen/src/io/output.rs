//! Durable output writes.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Replace `path` with `contents`, flushed to disk before returning.
///
/// Writes a sibling temp file, syncs it, then renames it over the target so a
/// failed run never leaves a half-written artifact behind.
pub fn write_durable(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let file_name = path
        .file_name()
        .with_context(|| format!("output path has no file name {}", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file =
        File::create(&tmp_path).with_context(|| format!("create {}", tmp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write {}", tmp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("flush {}", tmp_path.display()))?;
    drop(file);

    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_existing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("gen_test.go");
        fs::write(&path, "old contents that are longer").expect("seed");

        write_durable(&path, "new").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
        assert!(!temp.path().join("gen_test.go.tmp").exists());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out").join("nested").join("cases.yaml");
        write_durable(&path, "testing: x\n").expect("write");
        assert!(path.is_file());
    }
}
