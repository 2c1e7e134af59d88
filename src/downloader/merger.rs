//! Combining the video and audio tracks of a part with ffmpeg

use crate::utils::platform::find_ffmpeg;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MergeFailure {
    #[error("ffmpeg not found. Please install ffmpeg or set ffmpeg_path")]
    NotFound,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("reported success but {0} was not created")]
    MissingOutput(PathBuf),
}

/// External tool that muxes a video-only and an audio-only file
#[async_trait]
pub trait Merger: Send + Sync {
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), MergeFailure>;
}

/// ffmpeg subprocess merger
#[derive(Debug, Clone)]
pub struct FfmpegMerger {
    program: PathBuf,
}

impl FfmpegMerger {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use the configured binary if given, otherwise search the usual places
    pub fn locate(configured: Option<&Path>) -> Result<Self, MergeFailure> {
        match configured {
            Some(path) => Ok(Self::new(path)),
            None => find_ffmpeg().map(Self::new).ok_or(MergeFailure::NotFound),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn arguments(video: &Path, audio: &Path, output: &Path) -> Vec<std::ffi::OsString> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            video.as_os_str().to_owned(),
            "-i".into(),
            audio.as_os_str().to_owned(),
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            "aac".into(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl Merger for FfmpegMerger {
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), MergeFailure> {
        debug!(
            "Merging {} + {} into {}",
            video.display(),
            audio.display(),
            output.display()
        );

        let result = AsyncCommand::new(&self.program)
            .args(Self::arguments(video, audio, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MergeFailure::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(MergeFailure::ExitStatus {
                status: result.status.to_string(),
                stderr,
            });
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(MergeFailure::MissingOutput(output.to_path_buf()));
        }

        info!("Merged into {}", output.display());
        Ok(())
    }
}
