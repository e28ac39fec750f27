//! Merge independently generated fragments into one source file.
//!
//! Each fragment is the raw answer for one test case and usually carries its
//! own package line, imports and code fences. Aggregation walks every fragment
//! line by line, drops package and fence lines, hoists imports into a single
//! deduplicated block and keeps everything else as body text in input order.

use std::collections::HashSet;

use thiserror::Error;

use crate::core::recognizer::{GoRecognizer, LineRecognizer};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("import block opened on line {line} of fragment {fragment} is never closed")]
    UnterminatedImportBlock { fragment: usize, line: usize },
}

/// The merged document, kept in sections until rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedArtifact {
    pub package: String,
    /// Unique import entries in first-seen order.
    pub imports: Vec<String>,
    pub body: String,
}

impl AggregatedArtifact {
    /// Render the artifact as a Go source file.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.package.is_empty() {
            out.push_str("package ");
            out.push_str(&self.package);
            out.push('\n');
        }
        out.push('\n');
        if !self.imports.is_empty() {
            out.push_str("\nimport (\n");
            for entry in &self.imports {
                out.push('\t');
                out.push_str(entry);
                out.push('\n');
            }
            out.push_str(")\n\n");
        }
        out.push_str(&self.body);
        out
    }
}

/// Insertion-ordered set of import entries keyed by exact text.
#[derive(Debug, Default)]
struct ImportSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl ImportSet {
    fn insert(&mut self, entry: &str) {
        if entry.is_empty() || self.seen.contains(entry) {
            return;
        }
        self.seen.insert(entry.to_string());
        self.ordered.push(entry.to_string());
    }
}

/// Line-oriented fragment merger.
#[derive(Debug, Clone, Default)]
pub struct Aggregator<R = GoRecognizer> {
    recognizer: R,
    comment_bodies: bool,
}

impl Aggregator<GoRecognizer> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: LineRecognizer> Aggregator<R> {
    pub fn with_recognizer(recognizer: R) -> Self {
        Self {
            recognizer,
            comment_bodies: false,
        }
    }

    /// Prefix every body line with `// ` so merged text stays inert.
    pub fn comment_bodies(mut self, enabled: bool) -> Self {
        self.comment_bodies = enabled;
        self
    }

    /// Merge `fragments` in order under `package`.
    ///
    /// Fails if any fragment opens an import block without closing it; no
    /// partial artifact is returned in that case.
    pub fn aggregate<S: AsRef<str>>(
        &self,
        package: &str,
        fragments: &[S],
    ) -> Result<AggregatedArtifact, AggregateError> {
        let mut imports = ImportSet::default();
        let mut body = String::new();

        for (fragment_idx, fragment) in fragments.iter().enumerate() {
            self.merge_fragment(fragment_idx, fragment.as_ref(), &mut imports, &mut body)?;
            body.push('\n');
        }

        Ok(AggregatedArtifact {
            package: package.to_string(),
            imports: imports.ordered,
            body,
        })
    }

    fn merge_fragment(
        &self,
        fragment_idx: usize,
        fragment: &str,
        imports: &mut ImportSet,
        body: &mut String,
    ) -> Result<(), AggregateError> {
        let mut lines = fragment.split('\n').enumerate();
        while let Some((line_idx, line)) = lines.next() {
            let trimmed = line.trim();

            if self.recognizer.package_name(trimmed).is_some() || self.recognizer.is_fence(trimmed)
            {
                continue;
            }

            if self.recognizer.opens_import_block(trimmed) {
                let mut closed = false;
                for (_, entry) in lines.by_ref() {
                    let entry = entry.trim();
                    if self.recognizer.closes_import_block(entry) {
                        closed = true;
                        break;
                    }
                    imports.insert(entry);
                }
                if !closed {
                    return Err(AggregateError::UnterminatedImportBlock {
                        fragment: fragment_idx,
                        line: line_idx + 1,
                    });
                }
                continue;
            }

            if let Some(entry) = self.recognizer.single_import(trimmed) {
                imports.insert(entry);
                continue;
            }

            if self.comment_bodies {
                body.push_str("// ");
            }
            body.push_str(line);
            body.push('\n');
        }
        Ok(())
    }
}
