//! Command orchestration shared by the CLI and the integration tests

use crate::downloader::{DownloadReport, Downloader, Merger, TransferProgress};
use crate::extractor::{Quality, Uid, UpLister, Vid, VideoExtractor, VideoInfo};
use crate::http::HttpClient;
use crate::utils::config::AppSettings;
use crate::utils::error::{AcfunError, Result};
use futures::StreamExt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// One failed unit of a command
#[derive(Debug)]
pub struct Failure {
    /// What failed, e.g. `ac123 part 2` or `UP 42 listing`
    pub subject: String,
    pub error: AcfunError,
}

/// Outcome of a `video` or `up` command
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub videos_ok: usize,
    pub files: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    fn record_report(&mut self, report: DownloadReport) {
        if report.is_success() {
            self.videos_ok += 1;
        }
        for part in report.parts {
            match part.result {
                Ok(path) => self.files.push(path),
                Err(error) => self.failures.push(Failure {
                    subject: format!("{} part {}", report.vid, part.index),
                    error,
                }),
            }
        }
    }

    fn record_error(&mut self, subject: String, error: AcfunError) {
        error!("{}: {}", subject, error);
        self.failures.push(Failure { subject, error });
    }
}

/// Extractor, lister and downloader wired to one HTTP client
pub struct App {
    extractor: VideoExtractor,
    lister: UpLister,
    downloader: Downloader,
    quality: Quality,
    output_dir: PathBuf,
}

impl App {
    pub fn new(
        extractor: VideoExtractor,
        lister: UpLister,
        downloader: Downloader,
        quality: Quality,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            lister,
            downloader,
            quality,
            output_dir: output_dir.into(),
        }
    }

    /// Build the network-backed application from settings
    pub fn from_settings(
        settings: &AppSettings,
        merger: Arc<dyn Merger>,
        progress_tx: Option<mpsc::Sender<TransferProgress>>,
    ) -> Result<Self> {
        let client = HttpClient::from_config(&settings.client_config(), settings.retry_policy())?;

        let extractor = VideoExtractor::new(client.clone());
        let lister = UpLister::new(client.clone())
            .page_size(settings.page_size)
            .page_delay(settings.page_delay());
        let mut downloader = Downloader::new(client, merger);
        if let Some(tx) = progress_tx {
            downloader = downloader.with_progress(tx);
        }

        Ok(Self::new(
            extractor,
            lister,
            downloader,
            settings.quality,
            settings.download_location.clone(),
        ))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Metadata only
    pub async fn video_info(&self, vid: &Vid) -> Result<VideoInfo> {
        self.extractor.fetch_video_info(vid).await
    }

    /// Extract and download one video
    pub async fn run_video(&self, vid: &Vid) -> BatchSummary {
        let mut summary = BatchSummary::default();
        self.download_into(vid, &mut summary).await;
        summary
    }

    /// Download an UP's videos one after another, newest first.
    ///
    /// Videos are fetched as the listing produces them, so a listing error
    /// late in the walk keeps everything downloaded before it.
    pub async fn run_up(&self, uid: &Uid, max: Option<usize>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut listing = Box::pin(self.lister.list_videos(uid, max));
        let mut seen = 0usize;

        while let Some(item) = listing.next().await {
            match item {
                Ok(vid) => {
                    seen += 1;
                    info!("UP {} video {}: {}", uid, seen, vid);
                    self.download_into(&vid, &mut summary).await;
                }
                Err(e) => {
                    summary.record_error(format!("UP {} listing", uid), e);
                    break;
                }
            }
        }

        info!(
            "UP {}: {} video(s) listed, {} fully downloaded, {} failure(s)",
            uid,
            seen,
            summary.videos_ok,
            summary.failures.len()
        );
        summary
    }

    async fn download_into(&self, vid: &Vid, summary: &mut BatchSummary) {
        match self.extractor.fetch_video_info(vid).await {
            Ok(info) => {
                let report = self
                    .downloader
                    .download(&info, self.quality, &self.output_dir)
                    .await;
                summary.record_report(report);
            }
            Err(e) => summary.record_error(vid.to_string(), e),
        }
    }
}

/// Human-readable description for the `info` command
pub fn describe(info: &VideoInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", info.id, info.title);
    let _ = writeln!(out, "Uploader: {} (uid {})", info.uploader.name, info.uploader.uid);
    if let Some(date) = info.upload_date {
        let _ = writeln!(out, "Uploaded: {}", date.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(cover) = &info.cover_url {
        let _ = writeln!(out, "Cover: {}", cover);
    }
    let _ = writeln!(out, "Parts: {}", info.parts.len());
    for part in &info.parts {
        let qualities: Vec<&str> = part.qualities().iter().map(Quality::as_str).collect();
        let qualities = if qualities.is_empty() {
            "no streams".to_string()
        } else {
            qualities.join(", ")
        };
        let _ = writeln!(out, "  p{} {} [{}]", part.index, part.title, qualities);
    }
    out
}
