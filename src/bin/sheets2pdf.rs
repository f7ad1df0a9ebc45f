//! CLI binary for sheets2pdf.
//!
//! A thin shim over the library crate: maps flags and environment variables
//! to `RunConfig`, drives the OAuth helper subcommands, and prints the run
//! summary.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sheets2pdf::{
    run, AuthConfig, AuthProvider, DriveClient, FolderPolicy, RunConfig, RunOutput,
    RunProgressCallback, DEFAULT_MIN_DISPATCH_INTERVAL_MS, DEFAULT_MIN_VALID_SIZE,
    DEFAULT_PAGE_SIZE,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI definition ───────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "sheets2pdf",
    about = "Export every sheet of the spreadsheets in a Drive folder to per-sheet PDFs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the OAuth consent URL to open in a browser.
    AuthUrl,
    /// Exchange an authorisation code for a token and persist it.
    Exchange {
        /// The code from the OAuth redirect.
        code: String,
    },
    /// Convert the source folder (requires a stored token).
    Run(RunArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// Drive folder id holding the source spreadsheets.
    #[arg(long, env = "DRIVE_SHEETS")]
    source_folder: String,

    /// Drive folder id receiving the per-document output folders.
    #[arg(long, env = "DRIVE_PDF")]
    dest_folder: String,

    /// Minimum interval between quota-sensitive dispatches, in milliseconds.
    #[arg(long, env = "MIN_DISPATCH_INTERVAL_MS", default_value_t = DEFAULT_MIN_DISPATCH_INTERVAL_MS)]
    min_dispatch_interval_ms: u64,

    /// Minimum artifact byte size to accept an export.
    #[arg(long, env = "MIN_VALID_PDF_SIZE", default_value_t = DEFAULT_MIN_VALID_SIZE)]
    min_valid_size: u64,

    /// Listing page size cap.
    #[arg(long, env = "LIST_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Maximum export attempts per sheet before giving up.
    #[arg(long, env = "MAX_EXPORT_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,

    /// Initial retry backoff in milliseconds (doubles per attempt).
    #[arg(long, env = "EXPORT_RETRY_BACKOFF_MS", default_value_t = 500)]
    retry_backoff_ms: u64,

    /// Documents processed concurrently.
    #[arg(long, default_value_t = 4)]
    document_concurrency: usize,

    /// Sheets per document exported concurrently.
    #[arg(long, default_value_t = 8)]
    job_concurrency: usize,

    /// Reuse an existing same-named output folder instead of creating a
    /// duplicate on re-runs.
    #[arg(long)]
    reuse_folders: bool,

    /// Treat any failed sheet or document as a non-zero exit.
    #[arg(long)]
    strict: bool,

    /// Disable the progress bar (log lines only).
    #[arg(long)]
    no_progress: bool,
}

// ── Progress bar callback ────────────────────────────────────────────────────

/// Terminal progress: one bar over documents, a printed line per settled
/// sheet. Sheets across documents settle out of order; `println` through the
/// bar keeps the output coherent.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold} [{bar:40.green/238}] {pos}/{len} documents  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl RunProgressCallback for CliProgress {
    fn on_run_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_job_done(&self, document: &str, tab: &str, byte_size: u64, attempts: u32) {
        let retries = if attempts > 1 {
            dim(&format!("  ({attempts} attempts)"))
        } else {
            String::new()
        };
        self.bar.println(format!(
            "  {} {document} / {tab}  {}{retries}",
            green("✓"),
            dim(&format!("{} KiB", byte_size / 1024)),
        ));
    }

    fn on_job_failed(&self, document: &str, tab: &str, error: &str) {
        self.bar
            .println(format!("  {} {document} / {tab}  {}", red("✗"), red(error)));
    }

    fn on_document_settled(&self, _document: &str, _done: usize, _failed: usize) {
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _done: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sheets2pdf=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::AuthUrl => {
            let provider = AuthProvider::new(auth_config()?);
            println!("{}", provider.auth_url());
            Ok(())
        }
        Command::Exchange { code } => {
            let provider = AuthProvider::new(auth_config()?);
            let token = provider.exchange_code(&code).await?;
            println!("Token stored. Access token ends in …{}", tail(&token.access_token));
            Ok(())
        }
        Command::Run(args) => cmd_run(args).await,
    }
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let auth = auth_config()?;
    let provider = AuthProvider::new(auth.clone());
    let token = provider
        .load_stored_token()?
        .ok_or(sheets2pdf::Sheets2PdfError::CredentialMissing {
            token_path: auth.token_path.clone(),
        })?;

    let mut builder = RunConfig::builder()
        .source_folder_id(args.source_folder)
        .dest_folder_id(args.dest_folder)
        .min_dispatch_interval_ms(args.min_dispatch_interval_ms)
        .min_valid_size(args.min_valid_size)
        .page_size(args.page_size)
        .max_attempts(args.max_attempts)
        .retry_backoff_ms(args.retry_backoff_ms)
        .document_concurrency(args.document_concurrency)
        .job_concurrency(args.job_concurrency)
        .folder_policy(if args.reuse_folders {
            FolderPolicy::ReuseExisting
        } else {
            FolderPolicy::AlwaysCreate
        });
    if !args.no_progress {
        builder = builder.progress_callback(CliProgress::new());
    }
    let config = builder.build()?;

    let client = Arc::new(DriveClient::new(token.access_token)?);
    let output = run(client, &config).await.context("conversion run failed")?;

    print_summary(&output);

    if args.strict {
        output.into_result().context("run finished with failures")?;
    }
    Ok(())
}

fn print_summary(output: &RunOutput) {
    let s = &output.stats;
    println!(
        "\n{} {} documents, {}/{} sheets converted, {} folders created, {} undersized retries",
        bold("Done:"),
        s.documents,
        s.jobs_done,
        s.jobs_total,
        s.folders_created,
        s.total_deletes,
    );
    println!(
        "Total execution time: {:.2} s",
        s.elapsed_ms as f64 / 1000.0
    );

    let failed: Vec<_> = output.failed_jobs().collect();
    if !failed.is_empty() || s.documents_failed > 0 {
        println!("\n{}", bold(&red("Failures:")));
        for report in output.reports.iter().filter(|r| r.error.is_some()) {
            if let Some(e) = &report.error {
                println!("  {} {}", red("✗"), e);
            }
        }
        for job in failed {
            if let sheets2pdf::JobOutcome::Failed(e) = &job.outcome {
                println!("  {} {} — {}", red("✗"), job.document.name, e);
            }
        }
    }
}

fn auth_config() -> Result<AuthConfig> {
    Ok(AuthConfig {
        client_id: require_env("CLIENT_ID")?,
        client_secret: require_env("CLIENT_SECRET")?,
        redirect_uri: require_env("REDIRECT_URI")?,
        token_path: PathBuf::from(
            std::env::var("TOKEN_PATH").unwrap_or_else(|_| "token.json".into()),
        ),
    })
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => bail!("environment variable {name} is not set"),
    }
}

fn tail(s: &str) -> &str {
    let n = s.len().saturating_sub(6);
    &s[n..]
}
