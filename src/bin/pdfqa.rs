//! CLI binary for pdfqa.
//!
//! A thin shim over the library crate: `serve` runs the upload endpoint,
//! `ask` runs the client workflow against it, `inspect` prints the local
//! report only.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfqa::client::{input, prepare};
use pdfqa::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, MIB};
use pdfqa::pipeline::compress::format_megabytes;
use pdfqa::{
    ClientConfig, Derivation, DocumentReport, QaError, Selection, ServiceConfig, UploadClient,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn spinner(prefix: &str, msg: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS);
    bar.set_style(style);
    bar.set_prefix(prefix.to_string());
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the server (API key from the environment)
  export GEMINI_API_KEY=...
  pdfqa serve --port 5000

  # Ask a question about a local PDF
  pdfqa ask report.pdf "Summarize the pdf."

  # Ask against a remote server, JSON output
  pdfqa ask --endpoint https://qa.example.com/upload --json report.pdf "Who is the author?"

  # Local report only (no server, no API key)
  pdfqa inspect report.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     Google Gemini API key (serve)
  GEMINI_MODEL       Model ID (serve)
  GEMINI_BASE_URL    Gemini REST base URL (serve)
  PDFQA_BIND         Listen address, e.g. 0.0.0.0:5000 (serve)
  PORT_BACKEND       Listen port on all interfaces (serve)
  PDFQA_ENDPOINT     Upload URL (ask)
  RUST_LOG           Log filter, overrides --verbose
"#;

/// Ask questions about PDF documents with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "pdfqa",
    version,
    about = "Ask questions about PDF documents: compressed upload, text extraction, Gemini answers",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFQA_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the upload endpoint.
    Serve(ServeArgs),
    /// Upload a PDF with a question and print the answer.
    Ask(AskArgs),
    /// Print page count, metadata, preview and language of a PDF.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "PDFQA_BIND", default_value = "0.0.0.0:5000")]
    bind: String,

    /// Listen port on all interfaces; overrides --bind.
    #[arg(long, env = "PORT_BACKEND")]
    port: Option<u16>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Gemini REST base URL.
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// LLM call timeout in seconds.
    #[arg(long, env = "PDFQA_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Retries on transient LLM failures.
    #[arg(long, env = "PDFQA_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Maximum upload size in MiB.
    #[arg(long, env = "PDFQA_MAX_UPLOAD_MB", default_value_t = 200)]
    max_upload_mb: usize,

    /// Maximum decompressed document size in MiB.
    #[arg(long, env = "PDFQA_MAX_DOCUMENT_MB", default_value_t = 512)]
    max_document_mb: usize,
}

#[derive(Args, Debug)]
struct AskArgs {
    /// PDF file to upload.
    input: PathBuf,

    /// Question about the document.
    question: String,

    /// Upload endpoint URL.
    #[arg(long, env = "PDFQA_ENDPOINT", default_value = "http://127.0.0.1:5000/upload")]
    endpoint: String,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "PDFQA_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Output JSON (report, sizes, answer) instead of text.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDFQA_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// PDF file to inspect.
    input: PathBuf,

    /// Output the report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The server logs at info; client commands stay quiet unless asked,
    // their output is the report and the answer.
    let filter = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Command::Serve(_), false) => "info",
        _ => "error",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Ask(args) => run_ask(args).await,
        Command::Inspect(args) => run_inspect(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let bind = match args.port {
        Some(port) => format!("0.0.0.0:{port}"),
        None => args.bind,
    };

    let mut builder = ServiceConfig::builder()
        .bind_addr(bind)
        .model(args.model)
        .base_url(args.base_url)
        .api_timeout_secs(args.api_timeout)
        .max_retries(args.max_retries)
        .max_upload_bytes(args.max_upload_mb.saturating_mul(MIB))
        .max_document_bytes(args.max_document_mb.saturating_mul(MIB));
    if let Some(key) = args.api_key {
        builder = builder.api_key(key);
    }
    let config = builder.build().context("Invalid configuration")?;

    eprintln!(
        "{} {}  {}",
        cyan("◆"),
        bold(&format!("pdfqa listening on {}", config.bind_addr)),
        dim(&format!("model {}", config.llm.model))
    );
    pdfqa::serve(config).await.context("Server failed")?;
    Ok(())
}

async fn run_ask(args: AskArgs) -> Result<()> {
    let show_progress = !args.no_progress && !args.json;
    let start = Instant::now();

    // ── Select & prepare ─────────────────────────────────────────────────
    let file = input::read_pdf(&args.input)
        .await
        .with_context(|| format!("Cannot use {}", args.input.display()))?;
    let original_len = file.len();
    let name = file.name.clone();

    let bar = show_progress.then(|| spinner("Preparing", &name));
    let selection = Selection::new();
    prepare::prepare(&selection, file).await;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let report = selection.report();
    let compressed_len = selection.compressed().ready().map(|c| c.len());

    if !args.json {
        print_report(&name, &report);
        match compressed_len {
            Some(len) => eprintln!(
                "{} {} → {}  {}",
                green("✓"),
                format_megabytes(original_len),
                bold(&format_megabytes(len)),
                dim(&format!(
                    "({:.1}% of original)",
                    100.0 * len as f64 / original_len.max(1) as f64
                )),
            ),
            None => eprintln!("{} {}", red("✗"), QaError::CompressedArtifactMissing),
        }
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let submission = selection
        .submission(&args.question)
        .context("Cannot submit")?;

    let client = UploadClient::new(&ClientConfig {
        endpoint: args.endpoint,
        timeout_secs: args.timeout,
    })
    .context("Invalid client configuration")?;

    let bar = show_progress.then(|| spinner("Asking", client.endpoint()));
    let result = client.submit(submission).await;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    let answer = result.context("Upload failed")?;

    if args.json {
        let out = serde_json::json!({
            "file": name,
            "report": report.ready(),
            "originalBytes": original_len,
            "compressedBytes": compressed_len,
            "answer": answer,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialise output")?
        );
    } else {
        println!("{}", answer.text);
        eprintln!(
            "{}  model {}  {}ms",
            green("✔"),
            bold(&answer.model_version),
            start.elapsed().as_millis()
        );
    }
    Ok(())
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let report = pdfqa::inspect(&args.input)
        .await
        .context("Failed to inspect PDF")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else {
        let name = args.input.display().to_string();
        print_report(&name, &Derivation::Ready(report));
    }
    Ok(())
}

/// Human-readable report on stderr, leaving stdout for the answer.
fn print_report(name: &str, report: &Derivation<DocumentReport>) {
    match report {
        Derivation::Ready(r) => {
            eprintln!("File:         {}", bold(name));
            eprintln!("Pages:        {}", r.page_count);
            eprintln!("Title:        {}", r.metadata.title);
            eprintln!("Author:       {}", r.metadata.author);
            eprintln!("Keywords:     {}", r.metadata.keywords);
            if let Some(lang) = &r.language {
                eprintln!("Language:     {}", lang);
            }
            if let Some(p) = &r.preview {
                eprintln!("Words:        {}", p.word_count);
                eprintln!("Characters:   {}", p.char_count);
                eprintln!("{}", dim("── Preview ──────────────────────────────────────"));
                eprintln!("{}", p.text);
                eprintln!("{}", dim("─────────────────────────────────────────────────"));
            }
            for w in &r.warnings {
                eprintln!("{} {}", cyan("⚠"), w);
            }
        }
        Derivation::Failed(e) => eprintln!("{} {} ({})", red("✗"), bold(name), e),
        Derivation::Pending => eprintln!("{} {}", dim("…"), name),
    }
}
