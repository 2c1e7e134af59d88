//! Platform-specific utilities for acfun-dl
//!
//! This module provides cross-platform abstractions for:
//! - The settings directory
//! - Locating the ffmpeg executable

use std::path::PathBuf;

const APP_DIR: &str = "acfun-dl";

/// Returns the configuration directory
/// - macOS: ~/Library/Application Support/acfun-dl
/// - Windows: %APPDATA%\acfun-dl
/// - Linux: ~/.config/acfun-dl
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default location of the settings file
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Platform-specific executable extension
pub fn exe_extension() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        ".exe"
    }
    #[cfg(not(target_os = "windows"))]
    {
        ""
    }
}

/// Returns the path to the ffmpeg executable
pub fn find_ffmpeg() -> Option<PathBuf> {
    // 1. Check next to our own binary (portable installs)
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let adjacent = exe_dir.join(format!("ffmpeg{}", exe_extension()));
            if adjacent.is_file() {
                return Some(adjacent);
            }
        }
    }

    // 2. Fall back to system PATH
    which::which("ffmpeg").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_named_after_app() {
        let dir = config_dir();
        assert_eq!(dir.file_name().and_then(|n| n.to_str()), Some(APP_DIR));
    }

    #[test]
    fn test_settings_path_is_json_in_config_dir() {
        let path = settings_path();
        assert!(path.starts_with(config_dir()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
    }

    #[test]
    fn test_found_ffmpeg_is_named_ffmpeg() {
        // Only meaningful where ffmpeg is installed
        if let Some(path) = find_ffmpeg() {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            assert_eq!(stem, "ffmpeg");
        }
    }
}
