//! Per-part scratch space

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const TEMP_PREFIX: &str = ".acfun-dl-";

/// Temp files and output path of one part.
///
/// The temp directory lives inside the output directory and is removed when
/// the task is dropped, whichever way the part ends.
#[derive(Debug)]
pub struct DownloadTask {
    temp_dir: TempDir,
    video_path: PathBuf,
    audio_path: PathBuf,
    merged_path: PathBuf,
    output_path: PathBuf,
}

impl DownloadTask {
    pub fn new(output_dir: &Path, part: u32, output_path: PathBuf) -> io::Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("{TEMP_PREFIX}p{part}-"))
            .tempdir_in(output_dir)?;
        let video_path = temp_dir.path().join("video.m4s");
        let audio_path = temp_dir.path().join("audio.m4s");
        let merged_path = temp_dir.path().join("merged.mp4");
        debug!("Part {} scratch dir: {}", part, temp_dir.path().display());

        Ok(Self {
            temp_dir,
            video_path,
            audio_path,
            merged_path,
            output_path,
        })
    }

    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    pub fn audio_path(&self) -> &Path {
        &self.audio_path
    }

    /// Where the merger writes; only moved to the output path once complete
    pub fn merged_path(&self) -> &Path {
        &self.merged_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Remove the temp files now, logging instead of failing
    pub fn cleanup(self) {
        let path = self.temp_dir.path().to_path_buf();
        if let Err(e) = self.temp_dir.close() {
            warn!("Failed to remove temp dir {}: {}", path.display(), e);
        } else {
            debug!("Removed temp dir {}", path.display());
        }
    }
}

/// Whether `name` looks like a scratch directory left by this tool
pub fn is_temp_entry(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX)
}
