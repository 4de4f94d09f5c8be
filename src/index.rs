use std::collections::{HashMap, HashSet};

use crate::models::{CatalogStats, Performance, Show, Song, SongStats, round3};
use crate::snapshot::Snapshot;

/// Lookup structures derived from one snapshot. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Indices {
    pub show_by_id: HashMap<i64, Show>,
    pub song_by_id: HashMap<i64, Song>,
    /// Show id → song ids, in performance order, one entry per song.
    pub songs_of_show: HashMap<i64, Vec<i64>>,
    /// Song id → show ids, in performance order, one entry per show.
    pub shows_of_song: HashMap<i64, Vec<i64>>,
    /// Lifetime stats for every song in the catalog (including never-played ones).
    pub song_stats: HashMap<i64, SongStats>,
    /// Show ids in snapshot order.
    pub show_order: Vec<i64>,
    /// Song ids in snapshot order.
    pub song_order: Vec<i64>,
    pub total_shows: usize,
    /// Performance rows skipped because their show or song id is unknown.
    pub dropped_performances: usize,
}

/// A loaded snapshot together with the indices built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub snapshot: Snapshot,
    pub indices: Indices,
}

impl Catalog {
    pub fn new(snapshot: Snapshot) -> Self {
        let indices = build(&snapshot.shows, &snapshot.songs, &snapshot.performances);
        Self { snapshot, indices }
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total_shows: self.snapshot.shows.len(),
            total_songs: self.snapshot.songs.len(),
            total_performances: self.snapshot.performances.len(),
        }
    }
}

/// Adjacency accumulated over the performance rows.
#[derive(Default)]
struct Adjacency {
    songs_of_show: HashMap<i64, Vec<i64>>,
    shows_of_song: HashMap<i64, Vec<i64>>,
    seen: HashSet<(i64, i64)>,
    dropped: usize,
    duplicates: usize,
}

/// Build all indices from the three snapshot collections.
///
/// Performances referencing an unknown show or song are dropped (and counted).
/// A repeated (show, song) pair counts once. Duplicate show or song ids keep
/// the first row.
pub fn build(shows: &[Show], songs: &[Song], performances: &[Performance]) -> Indices {
    let (show_by_id, show_order) = index_by_id(shows, |s| s.id, "show");
    let (song_by_id, song_order) = index_by_id(songs, |s| s.id, "song");

    let adjacency = performances.iter().fold(Adjacency::default(), |mut acc, perf| {
        if !show_by_id.contains_key(&perf.show_id) || !song_by_id.contains_key(&perf.song_id) {
            acc.dropped += 1;
        } else if !acc.seen.insert((perf.show_id, perf.song_id)) {
            acc.duplicates += 1;
        } else {
            acc.songs_of_show.entry(perf.show_id).or_default().push(perf.song_id);
            acc.shows_of_song.entry(perf.song_id).or_default().push(perf.show_id);
        }
        acc
    });

    if adjacency.dropped > 0 {
        log::warn!(
            "Dropped {} performance rows referencing unknown shows or songs",
            adjacency.dropped
        );
    }
    if adjacency.duplicates > 0 {
        log::debug!(
            "Collapsed {} repeated song entries within a show",
            adjacency.duplicates
        );
    }

    let total_shows = show_by_id.len();
    let song_stats: HashMap<i64, SongStats> = song_order
        .iter()
        .map(|id| {
            let total_appearances = adjacency.shows_of_song.get(id).map_or(0, Vec::len);
            (*id, lifetime_stats(total_appearances, total_shows))
        })
        .collect();

    log::info!(
        "Indexed {} shows, {} songs, {} performances",
        total_shows,
        song_by_id.len(),
        adjacency.seen.len()
    );

    Indices {
        show_by_id,
        song_by_id,
        songs_of_show: adjacency.songs_of_show,
        shows_of_song: adjacency.shows_of_song,
        song_stats,
        show_order,
        song_order,
        total_shows,
        dropped_performances: adjacency.dropped,
    }
}

/// Selection rate is guarded against an empty show collection.
fn lifetime_stats(total_appearances: usize, total_shows: usize) -> SongStats {
    let selection_rate = if total_shows == 0 {
        0.0
    } else {
        round3(total_appearances as f64 / total_shows as f64)
    };
    SongStats {
        total_appearances,
        selection_rate,
    }
}

fn index_by_id<T: Clone>(
    rows: &[T],
    id_of: impl Fn(&T) -> i64,
    kind: &str,
) -> (HashMap<i64, T>, Vec<i64>) {
    let mut by_id = HashMap::with_capacity(rows.len());
    let mut order = Vec::with_capacity(rows.len());
    for row in rows {
        let id = id_of(row);
        if by_id.contains_key(&id) {
            log::warn!("Duplicate {kind} id {id}, keeping the first row");
            continue;
        }
        by_id.insert(id, row.clone());
        order.push(id);
    }
    (by_id, order)
}
