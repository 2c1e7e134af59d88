//! Data structures for video information

use crate::utils::error::AcfunError;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:https?://)?(?:www\.|m\.)?acfun\.cn/v/)?(?:ac)?([0-9A-Za-z_]+)/?(?:[?#].*)?$")
        .expect("valid regex")
});

static UID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:https?://)?(?:www\.|m\.)?acfun\.cn/u/)?(\d+)/?(?:[?#].*)?$")
        .expect("valid regex")
});

/// AcFun video id, stored without the `ac` prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vid(String);

impl Vid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Vid {
    type Err = AcfunError;

    /// Accepts `41502955`, `ac41502955` or `https://www.acfun.cn/v/ac41502955`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VID_REGEX
            .captures(s.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| Vid(m.as_str().to_string()))
            .ok_or_else(|| AcfunError::InvalidId(s.to_string()))
    }
}

impl fmt::Display for Vid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ac{}", self.0)
    }
}

/// AcFun user (UP) id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Uid {
    type Err = AcfunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UID_REGEX
            .captures(s.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| Uid(m.as_str().to_string()))
            .ok_or_else(|| AcfunError::InvalidId(s.to_string()))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The UP who published a video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Uploader {
    pub uid: String,
    pub name: String,
}

/// Resolution tier, ordered from lowest to highest
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Quality {
    #[serde(rename = "360p")]
    Q360,
    #[serde(rename = "480p")]
    Q480,
    #[default]
    #[serde(rename = "720p")]
    Q720,
    #[serde(rename = "1080p")]
    Q1080,
}

impl Quality {
    /// All tiers, highest first
    pub const ALL: [Quality; 4] = [Quality::Q1080, Quality::Q720, Quality::Q480, Quality::Q360];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Q1080 => "1080p",
            Quality::Q720 => "720p",
            Quality::Q480 => "480p",
            Quality::Q360 => "360p",
        }
    }

    /// This tier followed by every lower one, highest first
    pub fn fallbacks(self) -> impl Iterator<Item = Quality> {
        Self::ALL.into_iter().filter(move |q| *q <= self)
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1080p" | "1080" => Ok(Quality::Q1080),
            "720p" | "720" => Ok(Quality::Q720),
            "480p" | "480" => Ok(Quality::Q480),
            "360p" | "360" => Ok(Quality::Q360),
            other => Err(format!(
                "unknown quality '{other}' (expected one of 1080p, 720p, 480p, 360p)"
            )),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-limited URLs for the separate video and audio tracks of one part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSet {
    pub video_url: String,
    pub audio_url: String,
}

/// One segment (P) of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// 1-based position on the site
    pub index: u32,
    pub title: String,
    pub streams: BTreeMap<Quality, StreamSet>,
}

impl Part {
    /// Requested quality or the nearest lower tier that is available
    pub fn select_stream(&self, requested: Quality) -> Option<(Quality, &StreamSet)> {
        requested
            .fallbacks()
            .find_map(|q| self.streams.get(&q).map(|set| (q, set)))
    }

    /// Available tiers, highest first
    pub fn qualities(&self) -> Vec<Quality> {
        self.streams.keys().rev().copied().collect()
    }
}

/// Video information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: Vid,
    pub title: String,
    pub uploader: Uploader,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub upload_date: Option<DateTime<Utc>>,
    pub parts: Vec<Part>,
}

impl VideoInfo {
    pub fn is_multi_part(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Entry of an UP's video listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub vid: Vid,
    pub title: String,
    pub upload_date: Option<NaiveDate>,
}
