//! In-memory AcFun site, CDN and merger used by the integration tests.
#![allow(dead_code)]

use acfun_dl::downloader::{Downloader, MergeFailure, Merger};
use acfun_dl::extractor::{Quality, UpLister, VideoExtractor};
use acfun_dl::http::{HttpClient, RetryPolicy, StreamResponse, Transport, TransportError};
use acfun_dl::App;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SITE: &str = "https://site.test";

/// Scripted responses keyed by URL (plus `?page=N` for listing requests).
///
/// A text route answers with its responses in order and repeats the last
/// one once the script runs out.
#[derive(Default)]
pub struct FakeSite {
    texts: Mutex<HashMap<String, Vec<Result<String, TransportError>>>>,
    streams: Mutex<HashMap<String, Result<Vec<u8>, TransportError>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeSite {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn text(&self, key: impl Into<String>, responses: Vec<Result<String, TransportError>>) {
        self.texts.lock().unwrap().insert(key.into(), responses);
    }

    pub fn video_page(&self, id: u64, payload: &str) {
        self.text(format!("{SITE}/v/ac{id}"), vec![Ok(video_page_html(payload))]);
    }

    pub fn stream(&self, url: impl Into<String>, body: Result<Vec<u8>, TransportError>) {
        self.streams.lock().unwrap().insert(url.into(), body);
    }

    /// Number of requests made for `key`
    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Number of requests whose key starts with `prefix`
    pub fn calls_with_prefix(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(_, n)| *n)
            .sum()
    }

    fn record(&self, key: &str) -> usize {
        let mut calls = self.calls.lock().unwrap();
        let n = calls.entry(key.to_string()).or_insert(0);
        *n += 1;
        *n - 1
    }
}

fn route_key(url: &str, query: &[(String, String)]) -> String {
    match query.iter().find(|(k, _)| k == "page") {
        Some((_, page)) => format!("{url}?page={page}"),
        None => url.to_string(),
    }
}

#[async_trait]
impl Transport for FakeSite {
    async fn get_text(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<String, TransportError> {
        let key = route_key(url, query);
        let n = self.record(&key);
        let texts = self.texts.lock().unwrap();
        match texts.get(&key) {
            Some(responses) if !responses.is_empty() => {
                responses[n.min(responses.len() - 1)].clone()
            }
            _ => Err(TransportError::Status(404)),
        }
    }

    async fn get_stream(&self, url: &str) -> Result<StreamResponse, TransportError> {
        self.record(url);
        let body = self
            .streams
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(Err(TransportError::Status(404)))?;
        let chunks: Vec<Result<Bytes, TransportError>> = body
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(StreamResponse {
            content_length: Some(body.len() as u64),
            body: stream::iter(chunks).boxed(),
        })
    }
}

pub fn video_page_html(payload: &str) -> String {
    format!(
        "<html><head><script>window.pageInfo = {{}};\nwindow.videoInfo = {payload};\n</script></head><body><h1 class=\"title\">heading</h1></body></html>"
    )
}

/// Stream list for one part, every quality served from `{cdn}/{tag}/{quality}/{v,a}`
pub fn streams_json(cdn_tag: &str, qualities: &[Quality]) -> String {
    let entries: Vec<String> = qualities
        .iter()
        .map(|q| {
            format!(
                r#"{{"qualityType":"{q}","videoUrl":"https://cdn.test/{cdn_tag}/{q}/v","audioUrl":"https://cdn.test/{cdn_tag}/{q}/a"}}"#
            )
        })
        .collect();
    format!("[{}]", entries.join(","))
}

pub fn cdn_url(cdn_tag: &str, quality: Quality, track: &str) -> String {
    format!("https://cdn.test/{cdn_tag}/{quality}/{track}")
}

/// Serve both tracks of `cdn_tag` at `quality`
pub fn serve_part(site: &FakeSite, cdn_tag: &str, quality: Quality) {
    site.stream(cdn_url(cdn_tag, quality, "v"), Ok(format!("V[{cdn_tag}]").into_bytes()));
    site.stream(cdn_url(cdn_tag, quality, "a"), Ok(format!("A[{cdn_tag}]").into_bytes()));
}

/// Listing endpoint body with one anchor per id
pub fn listing_body(ids: &[u64]) -> String {
    let anchors: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<a class=\"ac-space-video\" href=\"/v/ac{id}\"><p class=\"title\">video {id}</p><p class=\"date\">2024/01/02</p></a>"#
            )
        })
        .collect();
    format!(r#"{{"html":"<div>{anchors}</div>"}}/*<!-- fetch-stream -->*/"#)
}

/// Script an UP listing of `ids` split into pages of `page_size`
pub fn serve_listing(site: &FakeSite, uid: u64, ids: &[u64], page_size: usize) {
    let pages: Vec<&[u64]> = ids.chunks(page_size).collect();
    for (i, page) in pages.iter().enumerate() {
        site.text(
            format!("{SITE}/u/{uid}?page={}", i + 1),
            vec![Ok(listing_body(page))],
        );
    }
    // Past the end the endpoint returns an empty page
    site.text(
        format!("{SITE}/u/{uid}?page={}", pages.len() + 1),
        vec![Ok(listing_body(&[]))],
    );
}

/// Writes `video + audio` into the output, like a mux that cannot fail
pub struct ConcatMerger;

#[async_trait]
impl Merger for ConcatMerger {
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), MergeFailure> {
        let io = |source| MergeFailure::Spawn {
            program: "concat".to_string(),
            source,
        };
        let mut data = tokio::fs::read(video).await.map_err(io)?;
        data.extend(tokio::fs::read(audio).await.map_err(io)?);
        tokio::fs::write(output, data).await.map_err(io)?;
        Ok(())
    }
}

/// Behaves like ffmpeg exiting with status 1 after writing a partial file
pub struct BrokenMerger;

#[async_trait]
impl Merger for BrokenMerger {
    async fn merge(&self, _video: &Path, _audio: &Path, output: &Path) -> Result<(), MergeFailure> {
        // ffmpeg has already written a header when it gives up
        let _ = std::fs::write(output, b"ftyp");
        Err(MergeFailure::ExitStatus {
            status: "exit status: 1".to_string(),
            stderr: "moov atom not found".to_string(),
        })
    }
}

pub fn client(site: Arc<FakeSite>, attempts: usize) -> HttpClient {
    HttpClient::new(
        site,
        RetryPolicy::new(attempts, Duration::from_millis(100)).no_backoff(),
        Duration::from_secs(5),
    )
}

pub fn app(
    site: Arc<FakeSite>,
    merger: Arc<dyn Merger>,
    quality: Quality,
    output_dir: &Path,
) -> App {
    let client = client(site, 3);
    App::new(
        VideoExtractor::with_base_url(client.clone(), SITE),
        UpLister::with_base_url(client.clone(), SITE)
            .page_size(10)
            .page_delay(Duration::ZERO),
        Downloader::new(client, merger),
        quality,
        output_dir,
    )
}

/// Entries left behind in `dir` by unfinished parts
pub fn leftover_temp_dirs(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with(".acfun-dl-"))
                .count()
        })
        .unwrap_or(0)
}
