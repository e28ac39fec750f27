//! Shared data types for spec files and source bundles.

use serde::{Deserialize, Serialize};

/// One named test case to generate.
///
/// Names are not required to be unique; duplicates produce duplicate test
/// functions in the generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecItem {
    pub name: String,
    #[serde(default, alias = "description")]
    pub instructions: String,
}

/// A spec file: the subject under test and its ordered cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecBatch {
    #[serde(rename = "testing", default)]
    pub subject: String,
    #[serde(rename = "cases", alias = "specs", default)]
    pub items: Vec<SpecItem>,
}

/// Concatenated source files shared read-only by every generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBundle {
    /// Package declared by the first file, or empty when it declares none.
    pub package: String,
    /// All file contents, each preceded by a comment naming its path.
    pub text: String,
}
