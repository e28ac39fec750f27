//! Orchestration for the `cases` and `code` commands.
//!
//! Both commands read their inputs up front, talk to the backend only through
//! [`GenerationClient`], and write their single output file last so a failed
//! run leaves nothing behind.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::client::GenerationClient;
use crate::core::aggregate::Aggregator;
use crate::core::fences::{strip_fence_lines, with_subject_header};
use crate::core::recognizer::GoRecognizer;
use crate::dispatch::Dispatcher;
use crate::io::bundle::build_bundle;
use crate::io::config::ConfigError;
use crate::io::output::write_durable;
use crate::io::spec_file::{load_spec_batch, parse_spec_batch};

/// Inputs for generating test code from a spec file.
#[derive(Debug, Clone)]
pub struct CodeRequest {
    pub spec_file: PathBuf,
    pub code_files: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub concurrency: usize,
    pub comment_bodies: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOutcome {
    pub cases: usize,
    pub imports: usize,
    pub output_file: PathBuf,
}

/// Generate one test function per spec item and merge them into one file.
#[instrument(skip_all, fields(spec_file = %request.spec_file.display()))]
pub async fn run_code(client: Arc<GenerationClient>, request: &CodeRequest) -> Result<CodeOutcome> {
    if request.code_files.is_empty() {
        return Err(ConfigError::MissingInput("code files").into());
    }
    let batch = load_spec_batch(&request.spec_file)?;
    if batch.items.is_empty() {
        warn!("spec file has no cases");
    }
    let bundle = build_bundle(&request.code_files, &GoRecognizer).context("build source bundle")?;
    let bundle = Arc::new(bundle);

    let fragments = Dispatcher::new(client, request.concurrency)
        .dispatch(&batch, Arc::clone(&bundle))
        .await
        .context("generate test code")?;

    let artifact = Aggregator::new()
        .comment_bodies(request.comment_bodies)
        .aggregate(&bundle.package, &fragments)
        .context("merge generated code")?;
    write_durable(&request.output_file, &artifact.render())?;

    info!(
        cases = fragments.len(),
        imports = artifact.imports.len(),
        "test code written"
    );
    Ok(CodeOutcome {
        cases: fragments.len(),
        imports: artifact.imports.len(),
        output_file: request.output_file.clone(),
    })
}

/// Inputs for generating a spec file from source code.
#[derive(Debug, Clone)]
pub struct CasesRequest {
    pub spec_file: PathBuf,
    pub code_files: Vec<PathBuf>,
    pub subject: String,
    /// Generate a free-form description first and use it as extra context.
    pub describe: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasesOutcome {
    /// Number of cases parsed back from the written file, if it parsed.
    pub cases: Option<usize>,
    pub spec_file: PathBuf,
}

/// Ask the backend for test cases covering `subject` and write them as a spec file.
///
/// The written file is meant for human review, so a document that does not
/// parse as a spec batch is still written (with a warning).
#[instrument(skip_all, fields(subject = %request.subject))]
pub async fn run_cases(client: &GenerationClient, request: &CasesRequest) -> Result<CasesOutcome> {
    if request.subject.trim().is_empty() {
        return Err(ConfigError::MissingInput("what to test").into());
    }
    if request.code_files.is_empty() {
        return Err(ConfigError::MissingInput("code files").into());
    }
    let bundle = build_bundle(&request.code_files, &GoRecognizer).context("build source bundle")?;

    let description = if request.describe {
        Some(
            client
                .generate_specification(&request.subject, &bundle.text)
                .await
                .context("generate specification")?,
        )
    } else {
        None
    };

    let list = client
        .generate_case_list(&request.subject, &bundle.text, description.as_deref())
        .await
        .context("generate test list")?;
    let cases = client
        .generate_cases(&request.subject, &bundle.text, &list)
        .await
        .context("generate test cases")?;

    let document = with_subject_header(&request.subject, &strip_fence_lines(&cases));
    let parsed = match parse_spec_batch(&document) {
        Ok(batch) => Some(batch.items.len()),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "generated cases do not parse, review the file");
            None
        }
    };
    write_durable(&request.spec_file, &document)?;

    Ok(CasesOutcome {
        cases: parsed,
        spec_file: request.spec_file.clone(),
    })
}
