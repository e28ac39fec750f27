//! Line-level recognition of package, import and fence lines.
//!
//! Aggregation never parses generated code; it only classifies single trimmed
//! lines. Keeping the classification behind [`LineRecognizer`] lets a stricter
//! recognizer replace [`GoRecognizer`] without touching the merge algorithm.

/// Classifies individual (already trimmed) lines of source text.
pub trait LineRecognizer: Send + Sync {
    /// Returns the declared package name if `line` is a package declaration.
    fn package_name<'a>(&self, line: &'a str) -> Option<&'a str>;

    /// Markdown code fence the backend wraps its answers in.
    fn is_fence(&self, line: &str) -> bool;

    /// First line of a multi-line import block.
    fn opens_import_block(&self, line: &str) -> bool;

    /// Closing line of a multi-line import block.
    fn closes_import_block(&self, line: &str) -> bool;

    /// Returns the import entry if `line` is a single-line import statement.
    fn single_import<'a>(&self, line: &'a str) -> Option<&'a str>;
}

/// Prefix-based recognizer for Go sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoRecognizer;

impl LineRecognizer for GoRecognizer {
    fn package_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.strip_prefix("package ").map(str::trim)
    }

    fn is_fence(&self, line: &str) -> bool {
        line.starts_with("```")
    }

    fn opens_import_block(&self, line: &str) -> bool {
        line.starts_with("import (")
    }

    fn closes_import_block(&self, line: &str) -> bool {
        line.starts_with(')')
    }

    fn single_import<'a>(&self, line: &'a str) -> Option<&'a str> {
        if line.starts_with("import \"") {
            line.strip_prefix("import ")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_package_lines() {
        let go = GoRecognizer;
        assert_eq!(go.package_name("package demo"), Some("demo"));
        assert_eq!(go.package_name("package demo_test "), Some("demo_test"));
        assert_eq!(go.package_name("packages"), None);
        assert_eq!(go.package_name("// package demo"), None);
    }

    #[test]
    fn recognizes_fences_with_language_tags() {
        let go = GoRecognizer;
        assert!(go.is_fence("```"));
        assert!(go.is_fence("```go"));
        assert!(!go.is_fence("`inline`"));
    }

    #[test]
    fn single_import_keeps_quoted_path() {
        let go = GoRecognizer;
        assert_eq!(go.single_import("import \"fmt\""), Some("\"fmt\""));
        assert_eq!(go.single_import("import ("), None);
        assert_eq!(go.single_import("important := 1"), None);
    }

    #[test]
    fn import_block_markers() {
        let go = GoRecognizer;
        assert!(go.opens_import_block("import ("));
        assert!(go.closes_import_block(")"));
        assert!(!go.closes_import_block("\"fmt\""));
    }
}
