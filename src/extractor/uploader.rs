//! Paginated listing of an UP's videos

use crate::extractor::models::{Uid, Vid, VideoSummary};
use crate::extractor::parser::parse_listing_page;
use crate::extractor::video::ACFUN_BASE_URL;
use crate::http::HttpClient;
use crate::utils::error::{AcfunError, Result};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Walks the `ac-space-video-list` endpoint page by page
#[derive(Clone)]
pub struct UpLister {
    client: HttpClient,
    base_url: String,
    page_size: usize,
    page_delay: Duration,
}

struct ListState {
    page: u32,
    pending: VecDeque<VideoSummary>,
    yielded: usize,
    last_page: bool,
}

impl UpLister {
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, ACFUN_BASE_URL)
    }

    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: Duration::from_millis(500),
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Pause between consecutive page requests
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Lazily list the UP's videos, newest first.
    ///
    /// Pages are only requested when the consumer needs more items. The
    /// stream ends after a short page or once `max` items were produced. A
    /// failed page ends the stream with that error; earlier items stay valid.
    pub fn list_summaries<'a>(
        &'a self,
        uid: &'a Uid,
        max: Option<usize>,
    ) -> impl Stream<Item = Result<VideoSummary>> + 'a {
        let state = ListState {
            page: 1,
            pending: VecDeque::new(),
            yielded: 0,
            last_page: false,
        };

        stream::try_unfold(state, move |mut st| async move {
            loop {
                if max.is_some_and(|m| st.yielded >= m) {
                    return Ok::<_, AcfunError>(None);
                }
                if let Some(item) = st.pending.pop_front() {
                    st.yielded += 1;
                    return Ok(Some((item, st)));
                }
                if st.last_page {
                    return Ok(None);
                }

                if st.page > 1 && !self.page_delay.is_zero() {
                    sleep(self.page_delay).await;
                }
                let items = self.fetch_page(uid, st.page).await?;
                st.last_page = items.len() < self.page_size;
                st.page += 1;
                st.pending.extend(items);
            }
        })
    }

    /// Video ids only
    pub fn list_videos<'a>(
        &'a self,
        uid: &'a Uid,
        max: Option<usize>,
    ) -> impl Stream<Item = Result<Vid>> + 'a {
        self.list_summaries(uid, max)
            .map(|item| item.map(|summary| summary.vid))
    }

    /// Drain the listing into a vector, stopping at the first error
    pub async fn collect_videos(&self, uid: &Uid, max: Option<usize>) -> Result<Vec<VideoSummary>> {
        let mut listing = Box::pin(self.list_summaries(uid, max));
        let mut videos = Vec::new();
        while let Some(item) = listing.next().await {
            videos.push(item?);
        }
        info!("UP {} has {} listed video(s)", uid, videos.len());
        Ok(videos)
    }

    async fn fetch_page(&self, uid: &Uid, page: u32) -> Result<Vec<VideoSummary>, AcfunError> {
        let url = format!("{}/u/{}", self.base_url, uid.as_str());
        let query = [
            ("quickViewId", "ac-space-video-list".to_string()),
            ("reqID", page.to_string()),
            ("ajaxpipe", "1".to_string()),
            ("type", "video".to_string()),
            ("order", "newest".to_string()),
            ("page", page.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("t", Utc::now().timestamp_millis().to_string()),
        ]
        .map(|(k, v)| (k.to_string(), v));

        debug!("Fetching page {} of UP {}", page, uid);
        let body = self.client.get_text(&url, &query).await?;
        let items = parse_listing_page(uid.as_str(), &body)?;
        debug!("Page {} of UP {} returned {} item(s)", page, uid, items.len());
        Ok(items)
    }
}
