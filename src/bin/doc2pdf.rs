//! CLI binary for edgequake-doc2pdf.
//!
//! A thin shim over the library crate: `serve` runs the web front end,
//! `convert` runs one batch over local files. Both map their flags onto
//! `ConversionConfig`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_doc2pdf::{
    convert_paths, AppState, BatchProgressCallback, Category, ConversionConfig, Dispatcher,
    ProgressCallback, ServerConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the file currently being converted.
    file_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            file_started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.file_started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} file(s)…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, filename: &str) {
        *self.file_started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(filename.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, filename: &str) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            filename,
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs();

        // Converter stderr can be long; keep one line per file.
        let msg = match error.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} file(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Web front end on http://127.0.0.1:5000
  doc2pdf serve

  # Listen on all interfaces, allow 200 MB uploads
  doc2pdf serve --bind 0.0.0.0:8080 --max-upload-mb 200

  # Convert local files; several outputs are zipped
  doc2pdf convert report.docx slides.pptx notes.md

  # Force a conversion type (PDF → Word)
  doc2pdf convert -t pdf scan.pdf --output-dir ./converted

  # JSON summary for scripts
  doc2pdf convert --json *.xlsx

ROUTING:
  Category     Extensions       Converter     Output
  ─────────    ───────────────  ───────────   ──────
  word         doc, docx        LibreOffice   pdf
  powerpoint   ppt, pptx        LibreOffice   pdf
  excel        xls, xlsx        LibreOffice   pdf
  text         txt              LibreOffice   pdf
  image        jpg, jpeg, png   img2pdf       pdf
  markdown     md               pandoc        pdf
  pdf          pdf              LibreOffice   docx

ENVIRONMENT VARIABLES:
  DOC2PDF_UPLOAD_DIR      Staging directory for uploads (default: uploads)
  DOC2PDF_OUTPUT_DIR      Directory for finished downloads (default: outputs)
  DOC2PDF_SOFFICE         LibreOffice executable (default: soffice)
  DOC2PDF_PANDOC          pandoc executable (default: pandoc)
  DOC2PDF_IMG2PDF         img2pdf executable (default: img2pdf)
  DOC2PDF_PDF_ENGINE      PDF engine passed to pandoc
  DOC2PDF_TIMEOUT         Per-file converter timeout in seconds (default: 120)
  DOC2PDF_BIND            serve: listen address (default: 127.0.0.1:5000)
  DOC2PDF_MAX_UPLOAD_MB   serve: request body limit in MiB (default: 50)
  RUST_LOG                Overrides the log filter
"#;

/// Convert office documents, text, Markdown and images to PDF (and PDF to Word).
#[derive(Parser, Debug)]
#[command(
    name = "doc2pdf",
    version,
    about = "Convert office documents, text, Markdown and images to PDF (and PDF to Word)",
    long_about = "Convert Word, PowerPoint, Excel, text, Markdown and image files to PDF, and PDF \
to Word, through LibreOffice, pandoc and img2pdf. Runs as a small web service or converts \
local files directly.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOC2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOC2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web front end.
    Serve(ServeArgs),
    /// Convert local files as one batch.
    Convert(ConvertArgs),
}

/// Directories and converter programs, shared by both subcommands.
#[derive(Args, Debug)]
struct ToolArgs {
    /// Directory in which each batch stages its uploads.
    #[arg(long, env = "DOC2PDF_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory for finished files and archives.
    #[arg(long, env = "DOC2PDF_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// LibreOffice executable.
    #[arg(long, env = "DOC2PDF_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// pandoc executable.
    #[arg(long, env = "DOC2PDF_PANDOC", default_value = "pandoc")]
    pandoc: PathBuf,

    /// img2pdf executable.
    #[arg(long, env = "DOC2PDF_IMG2PDF", default_value = "img2pdf")]
    img2pdf: PathBuf,

    /// PDF engine for pandoc (e.g. xelatex, wkhtmltopdf).
    #[arg(long, env = "DOC2PDF_PDF_ENGINE")]
    pdf_engine: Option<String>,

    /// Per-file converter timeout in seconds.
    #[arg(long, env = "DOC2PDF_TIMEOUT", default_value_t = 120)]
    timeout: u64,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    tools: ToolArgs,

    /// Address to listen on.
    #[arg(long, env = "DOC2PDF_BIND", default_value = "127.0.0.1:5000")]
    bind: String,

    /// Largest accepted upload request, in MiB.
    #[arg(long, env = "DOC2PDF_MAX_UPLOAD_MB", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..=4096))]
    max_upload_mb: u64,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Files to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    tools: ToolArgs,

    /// Conversion type for every file: word, powerpoint, excel, text, image,
    /// markdown or pdf. Detected from each extension when omitted.
    #[arg(short = 't', long = "type", value_parser = parse_category)]
    conversion_type: Option<Category>,

    /// Print the batch result as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOC2PDF_NO_PROGRESS")]
    no_progress: bool,
}

fn parse_category(s: &str) -> std::result::Result<Category, String> {
    s.parse().map_err(|e: edgequake_doc2pdf::Doc2PdfError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs during `convert`.
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.no_progress && !args.json,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args, show_progress, cli.quiet).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = build_config(&args.tools, None)?;
    let server = ServerConfig {
        bind: args.bind,
        max_upload_bytes: usize::try_from(args.max_upload_mb * 1024 * 1024)
            .context("--max-upload-mb is too large for this platform")?,
    };
    let state = AppState::new(config).context("Failed to initialise server state")?;
    edgequake_doc2pdf::serve(&server, state)
        .await
        .with_context(|| format!("Server on {} failed", server.bind))
}

async fn run_convert(args: ConvertArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args.tools, progress_cb)?;
    let dispatcher = Dispatcher::from_config(&config);

    let output = convert_paths(&args.inputs, args.conversion_type, &dispatcher, &config)
        .await
        .context("Conversion failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", output.artifact.path().display());

    if !quiet {
        if !show_progress {
            for failure in &output.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!(
            "{}  {}/{} files  {}ms  →  {}",
            if output.failures.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.converted_files,
            output.stats.total_files,
            output.stats.duration_ms,
            bold(&output.artifact.path().display().to_string()),
        );
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(tools: &ToolArgs, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .upload_dir(&tools.upload_dir)
        .output_dir(&tools.output_dir)
        .soffice_path(&tools.soffice)
        .pandoc_path(&tools.pandoc)
        .img2pdf_path(&tools.img2pdf)
        .tool_timeout_secs(tools.timeout);
    if let Some(ref engine) = tools.pdf_engine {
        builder = builder.pdf_engine(engine.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}
