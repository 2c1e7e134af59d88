//! Output file naming

use crate::extractor::{Part, VideoInfo};
use std::path::{Path, PathBuf};

/// Longest sanitized name in bytes, leaving room for suffixes and the extension
pub const MAX_NAME_BYTES: usize = 180;

/// Budgets of the two titles in a multi-part name; together with the
/// `_p{index}_` marker they stay within [`MAX_NAME_BYTES`]
const MAX_TITLE_BYTES: usize = 100;
const MAX_PART_TITLE_BYTES: usize = 60;

const OUTPUT_EXTENSION: &str = "mp4";
const FALLBACK_NAME: &str = "untitled";

/// Sanitize a title for safe filesystem usage
///
/// Prevents path traversal and invalid characters, and keeps the result
/// within [`MAX_NAME_BYTES`] without splitting a multi-byte character.
/// Applying it twice gives the same result as applying it once.
///
/// # Examples
/// ```
/// use acfun_dl::utils::organizer::sanitize_filename;
/// assert_eq!(sanitize_filename("../../etc/passwd"), "_etc_passwd");
/// assert_eq!(sanitize_filename("Part/1: Test?"), "Part_1_ Test_");
/// assert_eq!(sanitize_filename("   "), "untitled");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    sanitize_within(name, MAX_NAME_BYTES)
}

fn sanitize_within(name: &str, max_bytes: usize) -> String {
    // Characters invalid on Windows/macOS/Linux filesystems
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

    // Step 1: Replace invalid and control characters
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if invalid_chars.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Step 2: Remove path traversal sequences ("...." leaves nothing, "..." leaves ".")
    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "");
    }

    // Step 3: Collapse whitespace runs
    sanitized = sanitized.split_whitespace().collect::<Vec<_>>().join(" ");

    // Step 4: Collapse multiple underscores
    while sanitized.contains("__") {
        sanitized = sanitized.replace("__", "_");
    }

    // Step 5: No hidden files, no trailing dots (Windows issue)
    sanitized = trim_dots_and_spaces(&sanitized).to_string();

    // Step 6: Limit length
    if sanitized.len() > max_bytes {
        let cut = floor_char_boundary(&sanitized, max_bytes);
        sanitized.truncate(cut);
        sanitized = trim_dots_and_spaces(&sanitized).to_string();
    }

    // Step 7: Ensure not empty
    if sanitized.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    sanitized
}

fn trim_dots_and_spaces(s: &str) -> &str {
    s.trim_matches(|c: char| c == '.' || c.is_whitespace())
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut cut = max.min(s.len());
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}

/// File name of a merged part, e.g. `Title.mp4` or `Title_p2_Chapter two.mp4`
///
/// Titles are shortened separately so the part marker always survives and
/// every part of a video gets its own file.
pub fn part_file_name(info: &VideoInfo, part: &Part) -> String {
    let stem = if info.is_multi_part() {
        format!(
            "{}_p{}_{}",
            sanitize_within(&info.title, MAX_TITLE_BYTES),
            part.index,
            sanitize_within(&part.title, MAX_PART_TITLE_BYTES)
        )
    } else {
        sanitize_filename(&info.title)
    };
    format!("{}.{}", stem, OUTPUT_EXTENSION)
}

/// Where a part ends up inside `output_dir`
pub fn part_output_path(output_dir: &Path, info: &VideoInfo, part: &Part) -> PathBuf {
    output_dir.join(part_file_name(info, part))
}
