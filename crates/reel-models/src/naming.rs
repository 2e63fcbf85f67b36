//! File naming for stored videos.

use chrono::{DateTime, Utc};

/// Stored video name: `{account}_{YYYYmmdd_HHMMSS}_{index}.mp4`.
pub fn video_filename(account: &str, timestamp: DateTime<Utc>, index: usize) -> String {
    format!("{}_{}_{}.mp4", account, timestamp.format("%Y%m%d_%H%M%S"), index)
}

/// Public URL of a file stored under `remote_dir` on a host served at `base_url`.
pub fn public_url(base_url: &str, remote_dir: &str, filename: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let dir = remote_dir.trim_matches('/');
    if dir.is_empty() {
        format!("{}/{}", base, filename)
    } else {
        format!("{}/{}/{}", base, dir, filename)
    }
}
