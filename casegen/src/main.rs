//! casegen: generate test cases and test code with a chat-completion model.
//!
//! `casegen cases` drafts a reviewable YAML list of test cases for a piece of
//! code. `casegen code` turns that list into one merged test file, generating
//! every case concurrently.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use casegen::backend::openai::OpenAiBackend;
use casegen::client::{ClientSettings, GenerationClient};
use casegen::exit_codes;
use casegen::io::config::{CasegenConfig, ConfigError, DEFAULT_CONFIG_PATH, load_config};
use casegen::io::transcript::FileTranscript;
use casegen::logging;
use casegen::pipeline::{CasesRequest, CodeRequest, run_cases, run_code};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "casegen",
    version,
    about = "Generate test cases and test code with a chat-completion model"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured model.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the configured maximum output tokens (0 picks a per-model default).
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Extra instructions appended to every prompt.
    #[arg(long, global = true)]
    extra: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draft a YAML spec file of test cases for a function or type.
    Cases {
        /// Where to write the generated spec file.
        #[arg(long)]
        spec_file: PathBuf,
        /// Source files to show the model (comma-separated).
        #[arg(long, value_delimiter = ',', required = true)]
        code_files: Vec<PathBuf>,
        /// What to test, e.g. a function name.
        #[arg(long)]
        what: String,
        /// Generate a description of the code first and use it as context.
        #[arg(long)]
        describe: bool,
    },
    /// Generate one merged test file from a spec file.
    Code {
        /// Spec file listing the cases to generate.
        #[arg(long)]
        spec_file: PathBuf,
        /// Source files to show the model (comma-separated).
        #[arg(long, value_delimiter = ',', required = true)]
        code_files: Vec<PathBuf>,
        /// Where to write the merged test file.
        #[arg(long)]
        output_file: PathBuf,
        /// Maximum number of requests in flight (defaults to the config value).
        #[arg(long)]
        concurrency: Option<usize>,
        /// Comment out generated bodies in the merged file.
        #[arg(long)]
        comment: bool,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    let code = match run(Cli::parse()).await {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            if err.chain().any(|cause| cause.is::<ConfigError>()) {
                exit_codes::CONFIG
            } else {
                exit_codes::FAILED
            }
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = resolve_config(&cli)?;
    let client = build_client(&cfg, cli.extra.clone())?;

    match cli.command {
        Command::Cases {
            spec_file,
            code_files,
            what,
            describe,
        } => {
            let request = CasesRequest {
                spec_file,
                code_files,
                subject: what,
                describe,
            };
            let outcome = run_cases(&client, &request).await?;
            println!();
            match outcome.cases {
                Some(count) => println!(
                    "Wrote {count} cases to {}",
                    outcome.spec_file.display()
                ),
                None => println!(
                    "Wrote {} (it does not parse as a spec file yet, edit it first)",
                    outcome.spec_file.display()
                ),
            }
            println!(
                "Review it, then run: casegen code --spec-file {} --code-files {} --output-file <file>_test.go",
                outcome.spec_file.display(),
                join_paths(&request.code_files)
            );
        }
        Command::Code {
            spec_file,
            code_files,
            output_file,
            concurrency,
            comment,
        } => {
            let request = CodeRequest {
                spec_file,
                code_files,
                output_file,
                concurrency: concurrency.unwrap_or(cfg.concurrency),
                comment_bodies: comment || cfg.comment_bodies,
            };
            let outcome = run_code(Arc::new(client), &request).await?;
            println!(
                "Wrote {} test functions ({} imports) to {}",
                outcome.cases,
                outcome.imports,
                outcome.output_file.display()
            );
        }
    }
    Ok(())
}

/// Load the config file and apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<CasegenConfig> {
    let mut cfg = load_config(&cli.config)?;
    if let Some(model) = &cli.model {
        cfg.model = model.clone();
    }
    if let Some(max_tokens) = cli.max_tokens {
        cfg.max_tokens = max_tokens;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Build the client. Fails before any network activity when the key is missing.
fn build_client(cfg: &CasegenConfig, extra: Option<String>) -> Result<GenerationClient> {
    let api_key = cfg.api_key()?;
    let backend = OpenAiBackend::new(&cfg.base_url, api_key, cfg.request_timeout())
        .context("build HTTP client")?;
    let transcript = FileTranscript::open(&cfg.transcript_path, true)?;
    let settings = ClientSettings::from_config(cfg, extra);
    GenerationClient::new(Arc::new(backend), Arc::new(transcript), settings)
        .context("load prompt templates")
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(",")
}
