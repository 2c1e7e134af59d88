//! acfun-dl library

pub mod app;
pub mod downloader;
pub mod extractor;
pub mod http;
pub mod utils;

// Re-export main types for easier use
pub use app::{App, BatchSummary};
pub use downloader::{DownloadReport, Downloader, FfmpegMerger, Merger, TransferProgress};
pub use extractor::{Part, Quality, Uid, UpLister, Vid, VideoExtractor, VideoInfo, VideoSummary};
pub use http::{ClientConfig, HttpClient, RetryPolicy, Transport};
pub use utils::{AcfunError, AppSettings};
