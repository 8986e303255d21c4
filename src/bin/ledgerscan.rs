//! CLI binary for ledgerscan.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service and
//! `convert` runs one flow against a local file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use ledgerscan::{
    require_api_key, serve, DocumentKind, Export, ExtractionConfig, Extractor, ServerConfig,
    DEFAULT_MODEL, DEFAULT_PROVIDER,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on 0.0.0.0:8000
  ledgerscan serve --host 0.0.0.0

  # Ledger photo → accounting template CSV
  ledgerscan convert ledger.jpg -o template.csv

  # Any bill → literal XLSX transcription
  ledgerscan convert --mode direct bill.pdf -o bill.xlsx

  # Use OpenAI instead of Gemini
  ledgerscan --provider openai --model gpt-4.1-mini convert ledger.png

ENDPOINTS (serve):
  POST /process-document/   multipart field "file" → converted_template.csv
  POST /export-to-excel/    multipart field "file" → exported_data.xlsx
  GET  /health

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  PDFIUM_LIB_PATH         Directory containing libpdfium
  RUST_LOG                Overrides the log filter
"#;

/// Extract society ledgers and bills into CSV / XLSX using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "ledgerscan",
    version,
    about = "Extract society ledgers and bills into CSV / XLSX using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// LLM provider: gemini, openai, anthropic, mistral, openrouter, ollama.
    #[arg(long, global = true, env = "LEDGERSCAN_PROVIDER", default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// Vision model ID.
    #[arg(long, global = true, env = "LEDGERSCAN_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Per-call LLM timeout in seconds. No deadline when unset.
    #[arg(long, global = true, env = "LEDGERSCAN_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Directory containing the pdfium shared library.
    #[arg(long, global = true, env = "LEDGERSCAN_PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LEDGERSCAN_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        #[arg(long, env = "LEDGERSCAN_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(long, env = "LEDGERSCAN_PORT", default_value_t = 8000)]
        port: u16,

        /// Largest accepted upload, in bytes.
        #[arg(long, env = "LEDGERSCAN_MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
        max_upload_bytes: usize,
    },

    /// Convert one local JPEG, PNG or PDF file.
    Convert {
        /// Input document. Its type is taken from the extension.
        input: PathBuf,

        #[arg(long, value_enum, default_value = "template")]
        mode: Mode,

        /// Output path. Defaults to the flow's download name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Accounting template CSV.
    Template,
    /// Literal XLSX transcription.
    Direct,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // A missing key would only surface on the first request; fail now instead.
    require_api_key(&cli.provider).context("Missing LLM credential")?;

    let config = build_config(&cli)?;
    let extractor = Extractor::from_config(config).context("Failed to initialise LLM provider")?;

    match cli.command {
        Command::Serve {
            host,
            port,
            max_upload_bytes,
        } => {
            let server = ServerConfig {
                host,
                port,
                max_upload_bytes,
            };
            serve(&server, Arc::new(extractor))
                .await
                .with_context(|| format!("Server on {} failed", server.addr()))?;
        }
        Command::Convert {
            input,
            mode,
            output,
        } => {
            convert_file(&extractor, &input, mode, output.as_deref()).await?;
        }
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .provider_name(&cli.provider)
        .model(&cli.model);
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref path) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path);
    }
    builder.build().context("Invalid configuration")
}

async fn convert_file(
    extractor: &Extractor,
    input: &Path,
    mode: Mode,
    output: Option<&Path>,
) -> Result<()> {
    let kind = DocumentKind::from_path(input)
        .with_context(|| format!("Cannot convert {}", input.display()))?;
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    spinner.set_prefix(match mode {
        Mode::Template => "Template",
        Mode::Direct => "Direct",
    });
    spinner.set_message(format!("Reading {}…", input.display()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    let result = match mode {
        Mode::Template => extractor.template_export_kind(bytes, kind).await,
        Mode::Direct => extractor.direct_export_kind(bytes, kind).await,
    };
    spinner.finish_and_clear();
    let export: Export = result.context("Conversion failed")?;

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(export.filename));
    tokio::fs::write(&path, &export.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    eprintln!(
        "{}  {}  {}",
        green("✔"),
        bold(&path.display().to_string()),
        dim(&format!(
            "{} bytes, {}ms",
            export.bytes.len(),
            start.elapsed().as_millis()
        )),
    );
    Ok(())
}
