pub mod models;
pub mod parser;
pub mod uploader;
pub mod video;

pub use models::{Part, Quality, StreamSet, Uid, Uploader, Vid, VideoInfo, VideoSummary};
pub use uploader::UpLister;
pub use video::VideoExtractor;
