//! Progress tracking for stream transfers

use std::fmt;
use std::time::Duration;

/// Which half of a part a transfer carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress snapshot of one transfer
#[derive(Debug, Clone)]
pub struct TransferProgress {
    pub part: u32,
    pub kind: StreamKind,
    /// 0 when the server did not announce a length
    pub total_bytes: u64,
    pub downloaded_bytes: u64,
    pub speed: f64, // bytes per second
    pub eta: Option<Duration>,
    pub status: TransferStatus,
}

impl TransferProgress {
    pub fn new(part: u32, kind: StreamKind, total_bytes: u64) -> Self {
        Self {
            part,
            kind,
            total_bytes,
            downloaded_bytes: 0,
            speed: 0.0,
            eta: None,
            status: TransferStatus::Starting,
        }
    }

    /// Update progress with new data
    pub fn update(&mut self, downloaded_bytes: u64, speed: f64) {
        self.downloaded_bytes = downloaded_bytes;
        self.speed = speed;
        self.status = TransferStatus::Downloading;

        if self.total_bytes > 0 && self.downloaded_bytes >= self.total_bytes {
            self.eta = Some(Duration::ZERO);
        } else if speed > 0.0 && self.total_bytes > 0 {
            let remaining = self.total_bytes - self.downloaded_bytes;
            self.eta = Some(Duration::from_secs_f64(remaining as f64 / speed));
        } else {
            self.eta = None;
        }
    }

    pub fn complete(&mut self) {
        self.status = TransferStatus::Completed;
        if self.total_bytes == 0 {
            self.total_bytes = self.downloaded_bytes;
        }
        self.eta = Some(Duration::ZERO);
    }

    /// Mark a failed attempt; a retry starts a fresh snapshot
    pub fn failed(&mut self, error: String) {
        self.status = TransferStatus::Failed(error);
    }

    /// Get progress percentage (0.0 to 1.0); 0.0 when the size is unknown
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.downloaded_bytes as f64 / self.total_bytes as f64).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TransferStatus {
    #[default]
    Starting,
    Downloading,
    Completed,
    Failed(String),
}
