//! Parsing of AcFun page payloads
//!
//! Video pages embed their metadata as a JSON object assigned to
//! `window.videoInfo`. Single-part videos describe their streams under
//! `currentVideoInfo`; multi-part videos list every part under `videoList`.
//! Both shapes are normalised into [`PartLayout`] right after parsing and then
//! into the uniform `parts` sequence of [`VideoInfo`].

use crate::extractor::models::{Part, Quality, StreamSet, Uploader, Vid, VideoInfo, VideoSummary};
use crate::utils::error::{AcfunError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

pub const VIDEO_INFO_MARKER: &str = "window.videoInfo =";
pub const FETCH_STREAM_TRAILER: &str = "/*<!-- fetch-stream -->*/";

static HREF_VID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/v/ac(\d+)").expect("valid regex"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideoPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    create_time_millis: Option<i64>,
    #[serde(default)]
    current_video_info: Option<RawPart>,
    #[serde(default)]
    video_list: Vec<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default, deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPart {
    #[serde(default)]
    title: String,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStream {
    quality_type: String,
    video_url: String,
    audio_url: String,
}

/// Shape of the part data found in a payload
#[derive(Debug)]
enum PartLayout {
    Single(RawPart),
    Multi(Vec<RawPart>),
}

#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    html: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Slice of `html` holding the JSON value assigned after the marker
pub fn locate_payload(html: &str) -> Option<&str> {
    let start = html.find(VIDEO_INFO_MARKER)? + VIDEO_INFO_MARKER.len();
    let rest = html[start..].trim_start();
    rest.starts_with('{').then_some(rest)
}

/// Parse a video page into a [`VideoInfo`]
pub fn parse_video_page(vid: &Vid, html: &str) -> Result<VideoInfo> {
    let payload_text = locate_payload(html)
        .ok_or_else(|| AcfunError::parse(vid.to_string(), "videoInfo marker not found"))?;

    // The payload is followed by `;` and the rest of the script, so only the
    // first JSON value is read.
    let payload: RawVideoPayload = serde_json::Deserializer::from_str(payload_text)
        .into_iter::<RawVideoPayload>()
        .next()
        .ok_or_else(|| AcfunError::parse(vid.to_string(), "empty videoInfo payload"))?
        .map_err(|e| AcfunError::parse(vid.to_string(), format!("invalid videoInfo JSON: {e}")))?;

    let title = if payload.title.trim().is_empty() {
        page_heading(html)
            .ok_or_else(|| AcfunError::parse(vid.to_string(), "video has no title"))?
    } else {
        payload.title.trim().to_string()
    };

    let layout = classify(payload.current_video_info, payload.video_list)
        .ok_or_else(|| AcfunError::parse(vid.to_string(), "payload lists no parts"))?;
    let parts = normalize(layout, &title);
    debug!("{} has {} part(s)", vid, parts.len());

    let uploader = payload
        .user
        .map(|u| Uploader {
            uid: u.id,
            name: u.name,
        })
        .unwrap_or_default();

    Ok(VideoInfo {
        id: vid.clone(),
        title,
        uploader,
        cover_url: payload.cover_url.filter(|url| !url.is_empty()),
        upload_date: payload.create_time_millis.and_then(DateTime::<Utc>::from_timestamp_millis),
        parts,
    })
}

fn classify(current: Option<RawPart>, list: Vec<RawPart>) -> Option<PartLayout> {
    if list.len() > 1 {
        return Some(PartLayout::Multi(list));
    }
    current
        .or_else(|| list.into_iter().next())
        .map(PartLayout::Single)
}

fn normalize(layout: PartLayout, video_title: &str) -> Vec<Part> {
    match layout {
        PartLayout::Single(raw) => vec![build_part(1, raw, video_title)],
        PartLayout::Multi(mut raws) => {
            // Stable sort keeps source order for equal or missing priorities
            raws.sort_by_key(|raw| raw.priority.unwrap_or(i64::MAX));
            raws.into_iter()
                .enumerate()
                .map(|(i, raw)| {
                    let fallback = format!("P{}", i + 1);
                    build_part(i as u32 + 1, raw, &fallback)
                })
                .collect()
        }
    }
}

fn build_part(index: u32, raw: RawPart, fallback_title: &str) -> Part {
    let mut streams = BTreeMap::new();
    for stream in raw.streams {
        match stream.quality_type.parse::<Quality>() {
            Ok(quality) => {
                streams.entry(quality).or_insert(StreamSet {
                    video_url: stream.video_url,
                    audio_url: stream.audio_url,
                });
            }
            Err(_) => debug!("Skipping unknown quality '{}'", stream.quality_type),
        }
    }

    let title = raw.title.trim();
    Part {
        index,
        title: if title.is_empty() {
            fallback_title.to_string()
        } else {
            title.to_string()
        },
        streams,
    }
}

fn page_heading(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1.title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Parse one page of the UP listing endpoint
pub fn parse_listing_page(uid: &str, body: &str) -> Result<Vec<VideoSummary>> {
    let json_part = body.split(FETCH_STREAM_TRAILER).next().unwrap_or_default().trim();
    let page: ListingPage = serde_json::from_str(json_part)
        .map_err(|e| AcfunError::parse(uid, format!("invalid listing JSON: {e}")))?;

    let fragment = Html::parse_fragment(&page.html);
    let item_sel = selector("a.ac-space-video")?;
    let title_sel = selector("p.title")?;
    let date_sel = selector(".date")?;

    let mut videos = Vec::new();
    for item in fragment.select(&item_sel) {
        let href = item.value().attr("href").unwrap_or_default();
        let Some(vid) = HREF_VID_REGEX
            .captures(href)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<Vid>().ok())
        else {
            debug!("Skipping listing entry without video id: {}", href);
            continue;
        };

        let title = item
            .select(&title_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let upload_date = item
            .select(&date_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .and_then(|text| NaiveDate::parse_from_str(text.trim(), "%Y/%m/%d").ok());

        videos.push(VideoSummary {
            vid,
            title,
            upload_date,
        });
    }

    Ok(videos)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AcfunError::parse(css, format!("bad selector: {e}")))
}
