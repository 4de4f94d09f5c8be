use serde::{Deserialize, Serialize};

/// A single concert event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    /// ISO-8601 date (YYYY-MM-DD). Lexicographic order is chronological order.
    pub date: String,
    pub performance_name: String,
    pub venue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A distinct song in the artist's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_url: Option<String>,
}

/// A song played at a show. Field names are shortened in the snapshot
/// to keep the payload small: `h` = show id, `s` = song id, `o` = order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(rename = "h")]
    pub show_id: i64,
    #[serde(rename = "s")]
    pub song_id: i64,
    #[serde(rename = "o", default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Lifetime statistics for one song across every loaded show.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SongStats {
    pub total_appearances: usize,
    /// `total_appearances / total_shows`, rounded to 3 decimals. 0 with no shows.
    pub selection_rate: f64,
}

/// Most recent show a song was played at.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestPerformance {
    pub performance: String,
    pub venue: String,
    pub date: String,
}

impl LatestPerformance {
    pub const UNKNOWN: &'static str = "Unknown";

    /// Sentinel for songs with no resolvable show.
    pub fn unknown() -> Self {
        Self {
            performance: Self::UNKNOWN.to_string(),
            venue: Self::UNKNOWN.to_string(),
            date: String::new(),
        }
    }
}

/// One song row in an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub id: i64,
    pub song_name: String,
    pub song_url: Option<String>,
    pub hit_count: usize,
    pub total_appearances: usize,
    pub selection_rate: f64,
    pub latest_performance: String,
    pub latest_venue: String,
    pub latest_date: String,
}

/// Songs heard across a set of shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardAnalysis {
    pub songs: Vec<AnalysisRow>,
    pub completion_rate: f64,
    pub total_songs: usize,
    pub heard_songs: usize,
}

/// Songs played historically but never at any of a set of shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseAnalysis {
    pub songs: Vec<AnalysisRow>,
    /// Fraction of the catalog never heard.
    pub completion_rate: f64,
    pub total_songs: usize,
    pub never_heard_songs: usize,
}

/// Snapshot totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_shows: usize,
    pub total_songs: usize,
    pub total_performances: usize,
}

/// A named group of shows, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowGroup {
    pub group_name: String,
    pub shows: Vec<Show>,
}

/// Optional `metadata.json` written alongside the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub export_date: String,
    pub total_shows: usize,
    pub total_songs: usize,
    pub total_performances: usize,
}

/// Round to 3 decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
