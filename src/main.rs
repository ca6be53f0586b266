use std::{path::PathBuf, process, sync::Arc};

use clap::Parser;
use flash_downloader::{
    api::{ApiClient, ApiConfig, YtDlpResolver},
    config::DEFAULT_DOWNLOAD_ROOT,
    AppError, DownloadOrchestrator, DownloadRequest, EngineConfig, EngineEvent, EventSink,
    Resolution, SessionReport,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Download a video or a whole playlist at a chosen resolution.
#[derive(Parser, Debug)]
#[command(name = "flash-downloader", version)]
struct Args {
    /// Video or playlist URL
    url: String,

    /// One of 144, 240, 360, 480, 720, 1080
    #[arg(short, long)]
    resolution: Option<String>,

    /// Prefix playlist files with their position ("3 _ Title")
    #[arg(short, long)]
    number_items: bool,

    /// Download folder
    #[arg(short, long, env = "FLASH_DOWNLOAD_DIR", default_value = DEFAULT_DOWNLOAD_ROOT)]
    output: PathBuf,

    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", env = "FLASH_YTDLP", default_value = "yt-dlp")]
    ytdlp: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()).await {
        error!("Application error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let client = ApiClient::new(ApiConfig {
        ytdlp_binary: args.ytdlp,
        ..ApiConfig::default()
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = DownloadOrchestrator::new(
        Arc::new(YtDlpResolver::new(client)),
        EngineConfig::with_download_root(args.output),
        EventSink::new(tx),
    );

    // Unparsable input is left to the engine, which rejects it as InvalidResolution.
    let resolution = args
        .resolution
        .as_deref()
        .and_then(|r| r.parse::<Resolution>().ok());
    let mut handle =
        orchestrator.start(DownloadRequest::new(args.url, resolution, args.number_items))?;

    println!("Press Enter to pause or resume.");
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    let report = loop {
        tokio::select! {
            joined = &mut handle => {
                break joined.map_err(|e| AppError::Io(format!("Download task failed: {e}")))?;
            }
            Some(event) = rx.recv() => print_event(&event),
            Ok(Some(_)) = stdin.next_line() => {
                if orchestrator.toggle_pause().is_none() {
                    println!("Nothing to pause.");
                }
            }
        }
    };

    while let Ok(event) = rx.try_recv() {
        print_event(&event);
    }
    print_summary(&report);

    match report.aborted {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::StatusMessage(text) => println!("{text}"),
        EngineEvent::Progress {
            downloaded,
            total: Some(total),
        } if *total > 0 => {
            debug!("Downloading: {:.1}%", *downloaded as f64 / *total as f64 * 100.0);
        }
        EngineEvent::ItemError {
            index,
            title,
            error,
        } => println!("#{index} {title} failed [{:?}]: {error}", error.kind()),
        EngineEvent::DownloadError(error) => {
            println!("Download failed [{:?}]: {error}", error.kind())
        }
        EngineEvent::PauseStateChanged(true) => println!("Paused. Press Enter to resume."),
        other => debug!(?other, "engine event"),
    }
}

fn print_summary(report: &SessionReport) {
    println!(
        "Finished: {} downloaded, {} skipped, {} failed",
        report.completed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for path in &report.completed {
        println!("  {}", path.display());
    }
}
