pub mod loader;
pub mod writer;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{Performance, Show, SnapshotMetadata, Song};

pub use loader::Loader;

pub const SHOWS_FILE: &str = "shows.json";
pub const SONGS_FILE: &str = "songs.json";
pub const PERFORMANCES_FILE: &str = "performances.json";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("Snapshot data unavailable from {location}: {message}")]
    DataUnavailable { location: String, message: String },
    #[error("Malformed snapshot file {file}: {message}")]
    MalformedSnapshot { file: String, message: String },
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// The three flat collections exported from the setlist database.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub shows: Vec<Show>,
    pub songs: Vec<Song>,
    pub performances: Vec<Performance>,
    pub metadata: Option<SnapshotMetadata>,
}

impl Snapshot {
    /// Parse and validate the three collections from their raw JSON text.
    pub fn from_json(
        shows: &str,
        songs: &str,
        performances: &str,
        metadata: Option<&str>,
    ) -> Result<Self> {
        let snapshot = Self {
            shows: parse_file(SHOWS_FILE, shows)?,
            songs: parse_file(SONGS_FILE, songs)?,
            performances: parse_file(PERFORMANCES_FILE, performances)?,
            metadata: metadata.and_then(parse_metadata),
        };
        snapshot.validate()?;
        snapshot.check_metadata();
        Ok(snapshot)
    }

    /// Show dates must be `YYYY-MM-DD`: latest-performance lookup and
    /// grouping compare them as strings.
    fn validate(&self) -> Result<()> {
        for show in &self.shows {
            let valid = show.date.len() == 10
                && NaiveDate::parse_from_str(&show.date, "%Y-%m-%d").is_ok();
            if !valid {
                return Err(SnapshotError::MalformedSnapshot {
                    file: SHOWS_FILE.to_string(),
                    message: format!("show {} has invalid date \"{}\"", show.id, show.date),
                });
            }
        }
        Ok(())
    }

    /// Warn (only) when `metadata.json` disagrees with the collections.
    fn check_metadata(&self) {
        let Some(meta) = &self.metadata else {
            return;
        };
        let actual = (self.shows.len(), self.songs.len(), self.performances.len());
        let expected = (meta.total_shows, meta.total_songs, meta.total_performances);
        if actual != expected {
            log::warn!(
                "Snapshot metadata ({}) lists {:?} shows/songs/performances, found {:?}",
                meta.export_date,
                expected,
                actual
            );
        }
    }
}

fn parse_file<T: DeserializeOwned>(file: &str, text: &str) -> Result<Vec<T>> {
    serde_json::from_str(text).map_err(|e| SnapshotError::MalformedSnapshot {
        file: file.to_string(),
        message: e.to_string(),
    })
}

fn parse_metadata(text: &str) -> Option<SnapshotMetadata> {
    match serde_json::from_str(text) {
        Ok(meta) => Some(meta),
        Err(e) => {
            log::warn!("Ignoring unreadable {METADATA_FILE}: {e}");
            None
        }
    }
}

/// Where a snapshot comes from. Fetching is blocking I/O; the loader runs it
/// on a worker thread.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> Result<Snapshot>;

    /// Human-readable location for logs and errors.
    fn describe(&self) -> String;
}

/// An already-parsed snapshot is its own source (embedding, fixtures).
impl SnapshotSource for Snapshot {
    fn fetch(&self) -> Result<Snapshot> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "in-memory snapshot".to_string()
    }
}

/// Snapshot files in a local directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, file: &str) -> Result<String> {
        let path = self.dir.join(file);
        std::fs::read_to_string(&path).map_err(|e| SnapshotError::DataUnavailable {
            location: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn read_optional(&self, file: &str) -> Option<String> {
        let path = self.dir.join(file);
        std::fs::read_to_string(&path)
            .inspect_err(|e| log::debug!("No {}: {}", path.display(), e))
            .ok()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotSource for DirSource {
    fn fetch(&self) -> Result<Snapshot> {
        log::info!("Reading snapshot from {}", self.dir.display());
        let shows = self.read(SHOWS_FILE)?;
        let songs = self.read(SONGS_FILE)?;
        let performances = self.read(PERFORMANCES_FILE)?;
        let metadata = self.read_optional(METADATA_FILE);
        Snapshot::from_json(&shows, &songs, &performances, metadata.as_deref())
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Snapshot files served over HTTP (static hosting).
pub struct HttpSource {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, file: &str) -> String {
        format!("{}/{}", self.base_url, file)
    }

    fn get(&self, file: &str) -> Result<String> {
        let url = self.url(file);
        log::debug!("Fetching {url}");
        self.agent
            .get(&url)
            .call()
            .and_then(|mut response| response.body_mut().read_to_string())
            .map_err(|e| SnapshotError::DataUnavailable {
                location: url,
                message: e.to_string(),
            })
    }
}

impl SnapshotSource for HttpSource {
    fn fetch(&self) -> Result<Snapshot> {
        log::info!("Fetching snapshot from {}", self.base_url);
        let shows = self.get(SHOWS_FILE)?;
        let songs = self.get(SONGS_FILE)?;
        let performances = self.get(PERFORMANCES_FILE)?;
        let metadata = self
            .get(METADATA_FILE)
            .inspect_err(|e| log::debug!("No metadata: {e}"))
            .ok();
        Snapshot::from_json(&shows, &songs, &performances, metadata.as_deref())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
