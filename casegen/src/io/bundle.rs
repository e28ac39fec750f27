//! Source bundle builder: the code every prompt is grounded on.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::recognizer::LineRecognizer;
use crate::core::types::SourceBundle;

/// Read `paths` in order and concatenate them into one annotated bundle.
///
/// The package name is taken from the first package declaration of the first
/// file only; a first file without one yields an empty package. Bytes that
/// are not valid UTF-8 are replaced rather than rejected. Any unreadable path
/// aborts the whole build.
#[instrument(skip_all, fields(files = paths.len()))]
pub fn build_bundle<P: AsRef<Path>>(
    paths: &[P],
    recognizer: &dyn LineRecognizer,
) -> Result<SourceBundle> {
    let mut bundle = SourceBundle::default();

    for (idx, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let raw = fs::read(path).with_context(|| format!("read source file {}", path.display()))?;
        let contents = String::from_utf8_lossy(&raw);

        if idx == 0 {
            bundle.package = contents
                .lines()
                .find_map(|line| recognizer.package_name(line))
                .unwrap_or_default()
                .to_string();
        }

        bundle.text.push_str("// file: ");
        bundle.text.push_str(&path.display().to_string());
        bundle.text.push('\n');
        bundle.text.push_str(&contents);
        if !contents.ends_with('\n') {
            bundle.text.push('\n');
        }
    }

    debug!(package = %bundle.package, bytes = bundle.text.len(), "built source bundle");
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recognizer::GoRecognizer;

    #[test]
    fn package_comes_from_first_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("cache.go");
        let second = temp.path().join("store.go");
        fs::write(&first, "// Package cache.\npackage cache\n\nfunc Get() {}\n").expect("write");
        fs::write(&second, "package other\n\nfunc Put() {}").expect("write");

        let bundle = build_bundle(&[&first, &second], &GoRecognizer).expect("bundle");
        assert_eq!(bundle.package, "cache");

        let first_at = bundle.text.find("func Get() {}").expect("first content");
        let second_at = bundle.text.find("func Put() {}").expect("second content");
        assert!(first_at < second_at);
        assert!(bundle.text.contains(&format!("// file: {}\n", first.display())));
        assert!(bundle.text.contains(&format!("// file: {}\n", second.display())));
        assert!(bundle.text.ends_with("func Put() {}\n"));
    }

    #[test]
    fn missing_package_is_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("snippet.go");
        let second = temp.path().join("pkg.go");
        fs::write(&first, "func Get() {}\n").expect("write");
        fs::write(&second, "package late\n").expect("write");

        let bundle = build_bundle(&[&first, &second], &GoRecognizer).expect("bundle");
        assert_eq!(bundle.package, "");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("latin1.go");
        fs::write(&path, b"package demo\n\n// caf\xe9\nfunc Get() {}\n").expect("write");

        let bundle = build_bundle(&[&path], &GoRecognizer).expect("bundle");
        assert_eq!(bundle.package, "demo");
        assert!(bundle.text.contains("// caf\u{FFFD}\n"));
        assert!(bundle.text.ends_with("func Get() {}\n"));
    }

    #[test]
    fn unreadable_file_aborts_build() {
        let temp = tempfile::tempdir().expect("tempdir");
        let present = temp.path().join("present.go");
        fs::write(&present, "package demo\n").expect("write");
        let missing = temp.path().join("missing.go");

        let err = build_bundle(&[&present, &missing], &GoRecognizer).unwrap_err();
        assert!(format!("{err:#}").contains("missing.go"));
    }
}
