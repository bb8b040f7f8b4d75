//! Media file scanner
//!
//! Walks the given paths to collect the video files that are to be matched.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::media::MediaFile;
use super::text_utils::is_video_file;

/// Collect video files below `paths`, sorted by path.
///
/// Plain files are taken as given when they have a video extension;
/// directories are walked recursively, following links. Unreadable entries
/// are logged and skipped.
pub fn collect_media_files<P: AsRef<Path>>(paths: &[P]) -> Vec<MediaFile> {
    let mut files = Vec::new();

    for root in paths {
        let root = root.as_ref();
        if !root.exists() {
            warn!(path = %root.display(), "Path does not exist");
            continue;
        }

        for entry in WalkDir::new(root).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || !is_video_file(&path.to_string_lossy()) {
                continue;
            }
            match MediaFile::from_path(path) {
                Ok(file) => {
                    debug!(path = %path.display(), size = ?file.size, "Found video file");
                    files.push(file);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to read file metadata"),
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    info!(roots = paths.len(), total = files.len(), "Found video files");
    files
}
