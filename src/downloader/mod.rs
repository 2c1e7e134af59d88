//! Download engine module

pub mod engine;
pub mod merger;
pub mod progress;
pub mod task;
pub mod transfer;

// Re-export for convenience
pub use engine::{DownloadReport, Downloader, PartOutcome};
pub use merger::{FfmpegMerger, MergeFailure, Merger};
pub use progress::{StreamKind, TransferProgress, TransferStatus};
