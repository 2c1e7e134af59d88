//! acfun-dl - AcFun video downloader
//!
//! Downloads single videos or an UP's whole upload list, fetching the video
//! and audio tracks of every part and merging them with ffmpeg.

use acfun_dl::app::{describe, App, BatchSummary};
use acfun_dl::downloader::{FfmpegMerger, TransferProgress, TransferStatus};
use acfun_dl::extractor::{Quality, Uid, Vid, VideoExtractor};
use acfun_dl::http::HttpClient;
use acfun_dl::utils::AppSettings;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "acfun-dl", version, about = "Download videos from AcFun")]
struct Args {
    /// Output directory
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Preferred quality: 1080p, 720p, 480p or 360p (lower ones are used as fallback)
    #[arg(short, long, global = true)]
    quality: Option<Quality>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download one video
    Video {
        /// Video id, `ac` id or video page URL
        vid: Vid,
    },
    /// Download the videos of an UP, newest first
    Up {
        /// UP id or space URL
        uid: Uid,
        /// Stop after this many videos
        #[arg(long)]
        max: Option<usize>,
    },
    /// Show video metadata without downloading
    Info {
        vid: Vid,
        /// Print the extracted metadata as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let mut settings = AppSettings::load(args.config.as_deref())?;
    if let Some(output) = args.output.clone() {
        settings.download_location = output;
    }
    if let Some(quality) = args.quality {
        settings.quality = quality;
    }

    let rt = tokio::runtime::Runtime::new()?;
    let code = rt.block_on(run(args.command, settings))?;
    drop(rt);
    std::process::exit(code);
}

/// Work that needs the downloader
enum Job {
    Video(Vid),
    Up(Uid, Option<usize>),
}

async fn run(command: Command, settings: AppSettings) -> Result<i32> {
    let job = match command {
        Command::Info { vid, json } => return show_info(&settings, &vid, json).await,
        Command::Video { vid } => Job::Video(vid),
        Command::Up { uid, max } => Job::Up(uid, max),
    };

    let merger = FfmpegMerger::locate(settings.ffmpeg_path.as_deref())
        .context("ffmpeg is required to merge video and audio tracks")?;
    info!("Using ffmpeg at {}", merger.program().display());

    // Create progress channel
    let (progress_tx, progress_rx) = tokio::sync::mpsc::channel::<TransferProgress>(100);
    let reporter = tokio::spawn(report_progress(progress_rx));

    let app = App::from_settings(&settings, Arc::new(merger), Some(progress_tx))?;
    info!("Saving to {}", app.output_dir().display());

    let summary = match job {
        Job::Video(vid) => app.run_video(&vid).await,
        Job::Up(uid, max) => app.run_up(&uid, max).await,
    };

    // Dropping the app closes the progress channel
    drop(app);
    let _ = reporter.await;

    print_summary(&summary);
    Ok(summary.exit_code())
}

async fn show_info(settings: &AppSettings, vid: &Vid, json: bool) -> Result<i32> {
    let client = HttpClient::from_config(&settings.client_config(), settings.retry_policy())?;
    let info = VideoExtractor::new(client)
        .fetch_video_info(vid)
        .await
        .with_context(|| format!("Failed to extract {}", vid))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", describe(&info));
    }
    Ok(0)
}

async fn report_progress(mut progress_rx: tokio::sync::mpsc::Receiver<TransferProgress>) {
    while let Some(progress) = progress_rx.recv().await {
        match &progress.status {
            TransferStatus::Downloading if progress.total_bytes > 0 => info!(
                "Part {} {}: {:.1}%, {:.2} MB/s",
                progress.part,
                progress.kind,
                progress.percentage() * 100.0,
                progress.speed / 1024.0 / 1024.0
            ),
            TransferStatus::Downloading => info!(
                "Part {} {}: {:.2} MB, {:.2} MB/s",
                progress.part,
                progress.kind,
                progress.downloaded_bytes as f64 / 1024.0 / 1024.0,
                progress.speed / 1024.0 / 1024.0
            ),
            TransferStatus::Failed(reason) => {
                error!("Part {} {} failed: {}", progress.part, progress.kind, reason)
            }
            TransferStatus::Starting | TransferStatus::Completed => {}
        }
    }
}

fn print_summary(summary: &BatchSummary) {
    for file in &summary.files {
        println!("Saved {}", file.display());
    }
    for failure in &summary.failures {
        eprintln!("FAILED {} [{}]: {}", failure.subject, failure.error.kind(), failure.error);
    }
    if summary.is_success() {
        println!("Done: {} video(s) downloaded", summary.videos_ok);
    } else {
        eprintln!(
            "Finished with {} failure(s), {} video(s) fully downloaded",
            summary.failures.len(),
            summary.videos_ok
        );
    }
}
