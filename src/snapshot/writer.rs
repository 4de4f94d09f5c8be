use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::{METADATA_FILE, PERFORMANCES_FILE, SHOWS_FILE, SONGS_FILE, Snapshot};
use crate::models::SnapshotMetadata;

/// Write a snapshot as compact JSON files into `dir` (created if missing).
/// Absent optional fields are omitted. `metadata.json` is regenerated from
/// the collections, stamped with `export_date` (defaults to now, UTC).
pub fn write_dir(dir: &Path, snapshot: &Snapshot, export_date: Option<&str>) -> Result<SnapshotMetadata> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    write_json(dir, SHOWS_FILE, &snapshot.shows)?;
    write_json(dir, SONGS_FILE, &snapshot.songs)?;
    write_json(dir, PERFORMANCES_FILE, &snapshot.performances)?;

    let metadata = SnapshotMetadata {
        export_date: export_date
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        total_shows: snapshot.shows.len(),
        total_songs: snapshot.songs.len(),
        total_performances: snapshot.performances.len(),
    };
    write_json(dir, METADATA_FILE, &metadata)?;

    log::info!(
        "Exported {} shows, {} songs, {} performances to {}",
        metadata.total_shows,
        metadata.total_songs,
        metadata.total_performances,
        dir.display()
    );
    Ok(metadata)
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, file: &str, value: &T) -> Result<()> {
    let path = dir.join(file);
    let json = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize {file}"))?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
}
