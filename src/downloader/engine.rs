//! Part-by-part download engine

use crate::downloader::merger::Merger;
use crate::downloader::progress::{StreamKind, TransferProgress};
use crate::downloader::task::DownloadTask;
use crate::downloader::transfer::{download_stream, Transfer};
use crate::extractor::{Part, Quality, StreamSet, Vid, VideoInfo};
use crate::http::HttpClient;
use crate::utils::error::{AcfunError, Result};
use crate::utils::organizer::part_output_path;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Result of one part
#[derive(Debug)]
pub struct PartOutcome {
    pub index: u32,
    /// Quality actually downloaded, once a stream was selected
    pub quality: Option<Quality>,
    pub result: Result<PathBuf>,
}

impl PartOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-part outcomes of one video, in ascending part order
#[derive(Debug)]
pub struct DownloadReport {
    pub vid: Vid,
    pub parts: Vec<PartOutcome>,
}

impl DownloadReport {
    pub fn is_success(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(PartOutcome::is_success)
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.parts
            .iter()
            .filter_map(|p| p.result.as_ref().ok().map(PathBuf::as_path))
    }

    pub fn failures(&self) -> impl Iterator<Item = (u32, &AcfunError)> {
        self.parts
            .iter()
            .filter_map(|p| p.result.as_ref().err().map(|e| (p.index, e)))
    }
}

/// Downloads every part of a video and merges its tracks
#[derive(Clone)]
pub struct Downloader {
    client: HttpClient,
    merger: Arc<dyn Merger>,
    progress_tx: Option<mpsc::Sender<TransferProgress>>,
}

impl Downloader {
    pub fn new(client: HttpClient, merger: Arc<dyn Merger>) -> Self {
        Self {
            client,
            merger,
            progress_tx: None,
        }
    }

    /// Send transfer progress to `tx`
    pub fn with_progress(mut self, tx: mpsc::Sender<TransferProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Download all parts sequentially. A failing part does not stop the others.
    pub async fn download(
        &self,
        info: &VideoInfo,
        quality: Quality,
        output_dir: &Path,
    ) -> DownloadReport {
        info!(
            "Downloading {} \"{}\" ({} part(s)) at {}",
            info.id,
            info.title,
            info.parts.len(),
            quality
        );

        let mut parts = Vec::with_capacity(info.parts.len());
        for part in &info.parts {
            let outcome = self.download_part(info, part, quality, output_dir).await;
            match &outcome.result {
                Ok(path) => {
                    info!("{} part {} saved to {}", info.id, part.index, path.display())
                }
                Err(e) => error!("{} part {} failed: {}", info.id, part.index, e),
            }
            parts.push(outcome);
        }

        DownloadReport {
            vid: info.id.clone(),
            parts,
        }
    }

    async fn download_part(
        &self,
        info: &VideoInfo,
        part: &Part,
        requested: Quality,
        output_dir: &Path,
    ) -> PartOutcome {
        let Some((quality, streams)) = part.select_stream(requested) else {
            return PartOutcome {
                index: part.index,
                quality: None,
                result: Err(AcfunError::NoStream {
                    part: part.index,
                    requested: requested.to_string(),
                }),
            };
        };
        if quality != requested {
            warn!(
                "Part {}: {} not available, falling back to {}",
                part.index, requested, quality
            );
        }

        let output_path = part_output_path(output_dir, info, part);
        let result = self
            .fetch_and_merge(part.index, streams, output_dir, output_path)
            .await;

        PartOutcome {
            index: part.index,
            quality: Some(quality),
            result,
        }
    }

    async fn fetch_and_merge(
        &self,
        index: u32,
        streams: &StreamSet,
        output_dir: &Path,
        output_path: PathBuf,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir).await?;
        let task = DownloadTask::new(output_dir, index, output_path)?;

        let video = Transfer {
            part: index,
            kind: StreamKind::Video,
            url: &streams.video_url,
            path: task.video_path(),
        };
        let audio = Transfer {
            part: index,
            kind: StreamKind::Audio,
            url: &streams.audio_url,
            path: task.audio_path(),
        };

        // The first failure drops the sibling transfer
        let progress_tx = self.progress_tx.as_ref();
        let (video_bytes, audio_bytes) = tokio::try_join!(
            download_stream(&self.client, video, progress_tx),
            download_stream(&self.client, audio, progress_tx),
        )
        .map_err(|failure| AcfunError::Download {
            part: index,
            reason: failure.to_string(),
        })?;
        debug!(
            "Part {} tracks ready: video {} bytes, audio {} bytes",
            index, video_bytes, audio_bytes
        );

        // A failed merge leaves its partial file in the scratch dir, never at the output path
        self.merger
            .merge(task.video_path(), task.audio_path(), task.merged_path())
            .await
            .map_err(|e| AcfunError::Merge {
                part: index,
                reason: e.to_string(),
            })?;
        tokio::fs::rename(task.merged_path(), task.output_path()).await?;

        let output = task.output_path().to_path_buf();
        task.cleanup();
        Ok(output)
    }
}
