//! Spec file (YAML) loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::types::SpecBatch;

/// Load a spec batch from a YAML file.
pub fn load_spec_batch(path: &Path) -> Result<SpecBatch> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_spec_batch(&contents).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_spec_batch(contents: &str) -> Result<SpecBatch> {
    let batch: SpecBatch = serde_yaml::from_str(contents).context("parse spec yaml")?;
    Ok(batch)
}
