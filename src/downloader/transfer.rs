//! Streaming a single video or audio track to disk

use crate::downloader::progress::{StreamKind, TransferProgress};
use crate::http::{HttpClient, RetryFailure, TransportError};
use futures::StreamExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// One track of one part
#[derive(Debug, Clone, Copy)]
pub struct Transfer<'a> {
    pub part: u32,
    pub kind: StreamKind,
    pub url: &'a str,
    pub path: &'a Path,
}

/// Download a track to `transfer.path`, retrying failed attempts from scratch.
///
/// Returns the number of bytes written.
pub async fn download_stream(
    client: &HttpClient,
    transfer: Transfer<'_>,
    progress_tx: Option<&mpsc::Sender<TransferProgress>>,
) -> Result<u64, RetryFailure> {
    let label = format!("part {} {} stream", transfer.part, transfer.kind);
    client
        .retry_policy()
        .run(&label, |attempt| async move {
            if attempt > 1 {
                debug!(
                    "Restarting part {} {} stream (attempt {})",
                    transfer.part, transfer.kind, attempt
                );
            }
            let result = download_attempt(client, transfer, progress_tx).await;
            if let Err(e) = &result {
                let mut failed = TransferProgress::new(transfer.part, transfer.kind, 0);
                failed.failed(e.to_string());
                report(progress_tx, &failed).await;
            }
            result
        })
        .await
}

/// Single attempt to download a track
async fn download_attempt(
    client: &HttpClient,
    transfer: Transfer<'_>,
    progress_tx: Option<&mpsc::Sender<TransferProgress>>,
) -> Result<u64, TransportError> {
    let response = client.open_stream(transfer.url).await?;
    let expected = response.content_length;
    let mut body = response.body;

    let mut progress = TransferProgress::new(transfer.part, transfer.kind, expected.unwrap_or(0));
    report(progress_tx, &progress).await;

    // Truncates leftovers from a previous attempt
    let mut file = BufWriter::new(File::create(transfer.path).await?);
    let mut downloaded = 0u64;

    let start_time = Instant::now();
    let mut last_update_time = start_time;

    loop {
        let chunk = match timeout(client.timeout(), body.next()).await {
            Ok(Some(chunk)) => chunk?,
            Ok(None) => break,
            Err(_) => return Err(TransportError::Timeout),
        };
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        // Update progress every second
        let now = Instant::now();
        if now.duration_since(last_update_time) >= Duration::from_secs(1) {
            progress.update(downloaded, speed(downloaded, start_time));
            report(progress_tx, &progress).await;
            last_update_time = now;
        }
    }

    file.flush().await?;

    if let Some(expected) = expected {
        if downloaded != expected {
            return Err(TransportError::Body(format!(
                "stream ended after {downloaded} of {expected} bytes"
            )));
        }
    }

    progress.update(downloaded, speed(downloaded, start_time));
    progress.complete();
    report(progress_tx, &progress).await;

    info!(
        "Part {} {} stream downloaded ({} bytes)",
        transfer.part, transfer.kind, downloaded
    );
    Ok(downloaded)
}

fn speed(downloaded: u64, start_time: Instant) -> f64 {
    let elapsed = start_time.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        downloaded as f64 / elapsed
    } else {
        0.0
    }
}

async fn report(progress_tx: Option<&mpsc::Sender<TransferProgress>>, progress: &TransferProgress) {
    if let Some(tx) = progress_tx {
        if let Err(e) = tx.send(progress.clone()).await {
            warn!("Failed to send progress update for part {}: {}", progress.part, e);
        }
    }
}
