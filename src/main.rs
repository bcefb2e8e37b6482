use clap::Parser;
use codesheet::{CancelFlag, ExportError, ExportEvent, ExportOptions, ExportPipelineBuilder, ExportRequest};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

// Many short-lived image buffers per page; mimalloc keeps fragmentation down.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Export a list of codes as QR code or barcode sheets in PDF.
#[derive(Parser, Debug)]
#[command(name = "codesheet", version, about)]
struct Cli {
    /// Text file with one code per line. Blank lines are ignored.
    codes: PathBuf,

    /// Directory the PDF files are written to. Created if missing.
    output_dir: PathBuf,

    /// JSON file with export options (camelCase keys). Defaults apply to missing keys.
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Override the symbol mode from the options file (qr or barcode).
    #[arg(short, long)]
    mode: Option<String>,

    /// Upper bound on render worker threads.
    #[arg(long, default_value_t = codesheet::pipeline::DEFAULT_WORKER_CAP)]
    workers: usize,

    /// Output file name prefix.
    #[arg(long)]
    prefix: Option<String>,
}

fn read_codes(path: &Path) -> Result<Vec<String>, ExportError> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        if e.is_cancelled() {
            warn!("Export cancelled; finished files were kept.");
            std::process::exit(130);
        }
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ExportError> {
    let mut options = match &cli.options {
        Some(path) => ExportOptions::from_file(path)?,
        None => ExportOptions::default(),
    };
    if let Some(mode) = &cli.mode {
        options.mode = serde_json::from_value(serde_json::Value::String(mode.to_ascii_lowercase()))?;
    }

    let codes = read_codes(&cli.codes)?;
    info!("Loaded {} codes from {}", codes.len(), cli.codes.display());
    let request = ExportRequest::new(codes, &options)?;

    let (tx, rx) = async_channel::unbounded();
    let cancel = CancelFlag::new();
    let mut builder = ExportPipelineBuilder::new()
        .with_worker_cap(cli.workers)
        .with_event_sender(tx)
        .with_cancel_flag(cancel.clone());
    if let Some(prefix) = cli.prefix {
        builder = builder.with_file_prefix(prefix);
    }
    let pipeline = builder.build()?;

    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling after the current page...");
            cancel.cancel();
        }
    });

    let progress = tokio::spawn(async move {
        let mut last_page = 0;
        while let Ok(event) = rx.recv().await {
            match event {
                ExportEvent::Exporting { page, page_total, index, total } if page != last_page => {
                    last_page = page;
                    info!("Page {}/{} (item {}/{})", page, page_total, index, total);
                }
                ExportEvent::FileDone { file_index, path } => {
                    info!("File #{} written: {}", file_index, path.display());
                }
                event if event.is_terminal() => break,
                _ => {}
            }
        }
    });

    let output_dir = cli.output_dir;
    let result = tokio::task::spawn_blocking(move || pipeline.run(&request, &output_dir))
        .await
        .map_err(|e| ExportError::Io(std::io::Error::other(e)))?;

    ctrl_c.abort();
    let _ = progress.await;

    let summary = result?;
    info!(
        "Wrote {} pages to {} files in {}",
        summary.pages,
        summary.files.len(),
        summary.output_dir.display()
    );
    if !summary.skipped.is_empty() {
        warn!("{} items could not be drawn: {:?}", summary.skipped.len(), summary.skipped);
    }
    Ok(())
}
