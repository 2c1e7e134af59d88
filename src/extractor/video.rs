//! Video page extractor

use crate::extractor::models::{Vid, VideoInfo};
use crate::extractor::parser::parse_video_page;
use crate::http::HttpClient;
use crate::utils::error::Result;
use tracing::{debug, info};

pub const ACFUN_BASE_URL: &str = "https://www.acfun.cn";

/// Fetches video pages and turns them into [`VideoInfo`]
#[derive(Clone)]
pub struct VideoExtractor {
    client: HttpClient,
    base_url: String,
}

impl VideoExtractor {
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, ACFUN_BASE_URL)
    }

    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn page_url(&self, vid: &Vid) -> String {
        format!("{}/v/ac{}", self.base_url, vid.as_str())
    }

    /// Extract video information without downloading
    pub async fn fetch_video_info(&self, vid: &Vid) -> Result<VideoInfo> {
        let url = self.page_url(vid);
        debug!("Extracting video info for {}", url);

        let html = self.client.get_text(&url, &[]).await?;
        let info = parse_video_page(vid, &html)?;

        info!(
            "Extracted {} \"{}\" ({} part(s))",
            info.id,
            info.title,
            info.parts.len()
        );
        Ok(info)
    }
}
