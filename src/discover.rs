//! Locate the export to use for a source among the files of its directory.
use std::path::{Path, PathBuf};
use tracing::debug;

/// Return the most recently modified file in `dir` with one of `extensions` that isn't older than `max_age`
/// at `now`, or `None` if there is no such file.
///
/// Extensions are compared without the leading dot and ignoring case. Unreadable entries are ignored.
pub fn latest_file(
    dir: &Path,
    extensions: &[String],
    max_age: time::Duration,
    now: time::OffsetDateTime,
) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), %err, "cannot list directory");
            return None;
        }
    };
    let mut candidates = 0;
    let latest = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry.path().extension().and_then(|ext| ext.to_str()).map_or(false, |ext| {
                extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
        })
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = time::OffsetDateTime::from(metadata.modified().ok()?);
            candidates += 1;
            (now - modified <= max_age).then(|| (modified, entry.path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path);
    match &latest {
        Some(path) => debug!(file = %path.display(), candidates, "selected export"),
        None => debug!(dir = %dir.display(), candidates, "no recent export found"),
    }
    latest
}
