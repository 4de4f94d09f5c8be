use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::index::Indices;
use crate::models::{AnalysisRow, ForwardAnalysis, LatestPerformance, ReverseAnalysis, Show};

/// Songs heard across the selected shows, most-heard first.
///
/// Unknown show ids contribute nothing. Rows with equal `hit_count` keep the
/// order in which their song was first encountered.
pub fn analyze_songs(indices: &Indices, show_ids: &[i64]) -> ForwardAnalysis {
    let heard = heard_songs(indices, show_ids);

    let mut songs: Vec<AnalysisRow> = heard
        .iter()
        .filter_map(|&(song_id, hit_count)| analysis_row(indices, song_id, hit_count))
        .collect();
    songs.sort_by(|a, b| b.hit_count.cmp(&a.hit_count));

    let total_songs = indices.song_by_id.len();
    ForwardAnalysis {
        completion_rate: rate(heard.len(), total_songs),
        heard_songs: heard.len(),
        total_songs,
        songs,
    }
}

/// Songs played at some point in history but at none of the selected shows,
/// most frequently played first.
///
/// Songs with zero lifetime appearances are left out of the report entirely,
/// so `completion_rate` here undercounts the unheard part of the catalog when
/// such songs exist.
pub fn analyze_reverse_songs(indices: &Indices, show_ids: &[i64]) -> ReverseAnalysis {
    let heard: HashSet<i64> = heard_songs(indices, show_ids)
        .into_iter()
        .map(|(song_id, _)| song_id)
        .collect();

    let mut songs: Vec<AnalysisRow> = indices
        .song_order
        .iter()
        .copied()
        .filter(|id| !heard.contains(id))
        .filter(|id| {
            indices
                .song_stats
                .get(id)
                .is_some_and(|s| s.total_appearances > 0)
        })
        .filter_map(|id| analysis_row(indices, id, 0))
        .collect();
    songs.sort_by(|a, b| {
        b.selection_rate
            .partial_cmp(&a.selection_rate)
            .unwrap_or(Ordering::Equal)
    });

    let total_songs = indices.song_by_id.len();
    ReverseAnalysis {
        completion_rate: rate(songs.len(), total_songs),
        never_heard_songs: songs.len(),
        total_songs,
        songs,
    }
}

/// Most recent show a song was played at.
///
/// Dates compare as strings (ISO-8601). On equal dates the show listed first
/// in the song's adjacency wins.
pub fn latest_performance(indices: &Indices, song_id: i64) -> LatestPerformance {
    let latest = indices
        .shows_of_song
        .get(&song_id)
        .into_iter()
        .flatten()
        .filter_map(|show_id| indices.show_by_id.get(show_id))
        .fold(None::<&Show>, |best, show| match best {
            Some(b) if show.date <= b.date => Some(b),
            _ => Some(show),
        });

    match latest {
        Some(show) => LatestPerformance {
            performance: show.performance_name.clone(),
            venue: show.venue.clone(),
            date: show.date.clone(),
        },
        None => LatestPerformance::unknown(),
    }
}

/// (song id, hit count) for every song played at any selected show, in
/// first-encounter order. Repeated show ids in the selection count once.
fn heard_songs(indices: &Indices, show_ids: &[i64]) -> Vec<(i64, usize)> {
    let mut selected = HashSet::with_capacity(show_ids.len());
    let mut order: Vec<i64> = Vec::new();
    let mut hits: HashMap<i64, usize> = HashMap::new();

    for show_id in show_ids {
        if !selected.insert(*show_id) || !indices.show_by_id.contains_key(show_id) {
            continue;
        }
        for song_id in indices.songs_of_show.get(show_id).into_iter().flatten() {
            let count = hits.entry(*song_id).or_insert_with(|| {
                order.push(*song_id);
                0
            });
            *count += 1;
        }
    }

    order.into_iter().map(|id| (id, hits[&id])).collect()
}

fn analysis_row(indices: &Indices, song_id: i64, hit_count: usize) -> Option<AnalysisRow> {
    let song = indices.song_by_id.get(&song_id)?;
    let stats = indices.song_stats.get(&song_id).copied().unwrap_or_default();
    let latest = latest_performance(indices, song_id);

    Some(AnalysisRow {
        id: song.id,
        song_name: song.name.clone(),
        song_url: song.song_url.clone(),
        hit_count,
        total_appearances: stats.total_appearances,
        selection_rate: stats.selection_rate,
        latest_performance: latest.performance,
        latest_venue: latest.venue,
        latest_date: latest.date,
    })
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build;
    use crate::index::tests::{perf, show, song};

    fn single_show_indices() -> Indices {
        build(
            &[show(1, "2020-01-01")],
            &[song(10, "A"), song(11, "B")],
            &[perf(1, 10)],
        )
    }

    /// Four shows, five songs; song 14 is never played anywhere.
    fn tour_indices() -> Indices {
        let shows = vec![
            show(1, "2019-05-01"),
            show(2, "2019-05-02"),
            show(3, "2020-08-10"),
            show(4, "2021-12-24"),
        ];
        let songs = vec![
            song(10, "Opener"),
            song(11, "Ballad"),
            song(12, "Encore"),
            song(13, "Rarity"),
            song(14, "Unreleased"),
        ];
        let perfs = vec![
            perf(1, 10),
            perf(1, 11),
            perf(2, 10),
            perf(2, 12),
            perf(3, 10),
            perf(3, 11),
            perf(3, 12),
            perf(4, 13),
        ];
        build(&shows, &songs, &perfs)
    }

    #[test]
    fn test_forward_single_show() {
        let idx = single_show_indices();
        let result = analyze_songs(&idx, &[1]);

        assert_eq!(result.songs.len(), 1);
        let row = &result.songs[0];
        assert_eq!(row.id, 10);
        assert_eq!(row.song_name, "A");
        assert_eq!(row.hit_count, 1);
        assert_eq!(row.total_appearances, 1);
        assert_eq!(row.selection_rate, 1.0);
        assert_eq!(row.latest_performance, "Live 1");
        assert_eq!(row.latest_venue, "Venue 1");
        assert_eq!(result.completion_rate, 0.5);
        assert_eq!(result.total_songs, 2);
        assert_eq!(result.heard_songs, 1);
    }

    #[test]
    fn test_reverse_excludes_zero_appearance_songs() {
        let idx = single_show_indices();
        let result = analyze_reverse_songs(&idx, &[1]);

        assert!(result.songs.is_empty());
        assert_eq!(result.never_heard_songs, 0);
        assert_eq!(result.completion_rate, 0.0);
        assert_eq!(result.total_songs, 2);
    }

    #[test]
    fn test_reverse_includes_song_played_elsewhere() {
        let idx = build(
            &[show(1, "2020-01-01"), show(2, "2020-02-01")],
            &[song(10, "A"), song(11, "B")],
            &[perf(1, 10), perf(2, 11)],
        );
        let result = analyze_reverse_songs(&idx, &[1]);

        assert_eq!(result.songs.len(), 1);
        let row = &result.songs[0];
        assert_eq!(row.id, 11);
        assert_eq!(row.hit_count, 0);
        assert_eq!(row.total_appearances, 1);
        assert_eq!(row.selection_rate, 0.5);
        assert_eq!(row.latest_date, "2020-02-01");
        assert_eq!(result.completion_rate, 0.5);
    }

    #[test]
    fn test_empty_selection() {
        let idx = tour_indices();
        let result = analyze_songs(&idx, &[]);
        assert!(result.songs.is_empty());
        assert_eq!(result.completion_rate, 0.0);
        assert_eq!(result.heard_songs, 0);
        assert_eq!(result.total_songs, 5);
    }

    #[test]
    fn test_unknown_show_id_contributes_nothing() {
        let idx = tour_indices();
        let result = analyze_songs(&idx, &[999]);
        assert!(result.songs.is_empty());
        assert_eq!(result.heard_songs, 0);

        let mixed = analyze_songs(&idx, &[999, 4]);
        assert_eq!(mixed.heard_songs, 1);
        assert_eq!(mixed.songs[0].id, 13);
    }

    #[test]
    fn test_hit_count_per_song() {
        let idx = tour_indices();
        let result = analyze_songs(&idx, &[1, 2, 3]);

        let hits: Vec<(i64, usize)> = result.songs.iter().map(|r| (r.id, r.hit_count)).collect();
        // Opener in all three; Ballad and Encore in two each, in encounter order
        assert_eq!(hits, vec![(10, 3), (11, 2), (12, 2)]);
        assert_eq!(result.heard_songs, 3);
        assert_eq!(result.completion_rate, 0.6);
    }

    #[test]
    fn test_hit_count_never_exceeds_appearances() {
        let idx = tour_indices();
        let result = analyze_songs(&idx, &[1, 2, 3, 4]);
        for row in &result.songs {
            assert!(row.hit_count <= row.total_appearances);
            assert!((0.0..=1.0).contains(&row.selection_rate));
        }
    }

    #[test]
    fn test_repeated_show_id_counts_once() {
        let idx = tour_indices();
        let once = analyze_songs(&idx, &[1]);
        let twice = analyze_songs(&idx, &[1, 1]);
        assert_eq!(once, twice);
        assert_eq!(twice.songs[0].hit_count, 1);
    }

    #[test]
    fn test_ties_keep_first_encounter_order() {
        let idx = build(
            &[show(1, "2020-01-01"), show(2, "2020-01-02")],
            &[song(10, "A"), song(11, "B"), song(12, "C"), song(13, "D")],
            &[perf(1, 12), perf(1, 10), perf(2, 13), perf(2, 11), perf(2, 10)],
        );
        let result = analyze_songs(&idx, &[1, 2]);
        let ids: Vec<i64> = result.songs.iter().map(|r| r.id).collect();
        // 10 is heard twice; the rest once, in the order first seen
        assert_eq!(ids, vec![10, 12, 13, 11]);
    }

    #[test]
    fn test_reverse_sorted_by_selection_rate() {
        let idx = tour_indices();
        let result = analyze_reverse_songs(&idx, &[4]);
        let ids: Vec<i64> = result.songs.iter().map(|r| r.id).collect();
        // Opener 3/4, then Ballad and Encore tie at 2/4 in catalog order; Unreleased excluded
        assert_eq!(ids, vec![10, 11, 12]);
        assert!(result.songs.iter().all(|r| r.hit_count == 0));
        assert_eq!(result.never_heard_songs, 3);
    }

    #[test]
    fn test_heard_plus_never_heard_bounded_by_catalog() {
        let idx = tour_indices();
        for selection in [vec![1], vec![2, 4], vec![1, 2, 3], vec![1, 2, 3, 4]] {
            let forward = analyze_songs(&idx, &selection);
            let reverse = analyze_reverse_songs(&idx, &selection);
            assert!(forward.heard_songs + reverse.songs.len() <= forward.total_songs);
        }
    }

    #[test]
    fn test_completion_rates_complement_without_zero_appearance_songs() {
        let idx = build(
            &[show(1, "2020-01-01"), show(2, "2020-02-01")],
            &[song(10, "A"), song(11, "B"), song(12, "C"), song(13, "D")],
            &[perf(1, 10), perf(2, 11), perf(2, 12), perf(2, 13)],
        );
        let forward = analyze_songs(&idx, &[1]);
        let reverse = analyze_reverse_songs(&idx, &[1]);
        assert!((forward.completion_rate - (1.0 - reverse.completion_rate)).abs() < 1e-9);
    }

    #[test]
    fn test_completion_rates_asymmetric_with_zero_appearance_song() {
        let idx = tour_indices();
        let forward = analyze_songs(&idx, &[4]);
        let reverse = analyze_reverse_songs(&idx, &[4]);
        // Unreleased (14) is neither heard nor counted as never heard
        assert_eq!(forward.completion_rate, 0.2);
        assert_eq!(reverse.completion_rate, 0.6);
        assert!(forward.completion_rate + reverse.completion_rate < 1.0);
    }

    #[test]
    fn test_latest_performance_picks_max_date() {
        let idx = tour_indices();
        let latest = latest_performance(&idx, 10);
        assert_eq!(latest.date, "2020-08-10");
        assert_eq!(latest.performance, "Live 3");
        assert_eq!(latest.venue, "Venue 3");
    }

    #[test]
    fn test_latest_performance_tie_keeps_first_encountered() {
        let mut early = show(1, "2020-01-01");
        early.performance_name = "Matinee".into();
        let mut late = show(2, "2020-01-01");
        late.performance_name = "Evening".into();
        let idx = build(&[early, late], &[song(10, "A")], &[perf(1, 10), perf(2, 10)]);
        assert_eq!(latest_performance(&idx, 10).performance, "Matinee");

        let mut early = show(1, "2020-01-01");
        early.performance_name = "Matinee".into();
        let mut late = show(2, "2020-01-01");
        late.performance_name = "Evening".into();
        let idx = build(&[early, late], &[song(10, "A")], &[perf(2, 10), perf(1, 10)]);
        assert_eq!(latest_performance(&idx, 10).performance, "Evening");
    }

    #[test]
    fn test_latest_performance_unknown_sentinel() {
        let idx = tour_indices();
        let latest = latest_performance(&idx, 14);
        assert_eq!(latest, LatestPerformance::unknown());
        assert_eq!(latest.performance, "Unknown");
        assert_eq!(latest.venue, "Unknown");
        assert_eq!(latest.date, "");

        assert_eq!(latest_performance(&idx, 999), LatestPerformance::unknown());
    }

    #[test]
    fn test_empty_catalog() {
        let idx = build(&[], &[], &[]);
        let forward = analyze_songs(&idx, &[1]);
        assert_eq!(forward.completion_rate, 0.0);
        assert_eq!(forward.total_songs, 0);
        let reverse = analyze_reverse_songs(&idx, &[1]);
        assert_eq!(reverse.completion_rate, 0.0);
        assert!(reverse.songs.is_empty());
    }

    #[test]
    fn test_song_url_passed_through() {
        let mut s = song(10, "A");
        s.song_url = Some("https://example.org/songs/a".into());
        let shows: Vec<Show> = vec![show(1, "2020-01-01")];
        let idx = build(&shows, &[s], &[perf(1, 10)]);
        let result = analyze_songs(&idx, &[1]);
        assert_eq!(
            result.songs[0].song_url.as_deref(),
            Some("https://example.org/songs/a")
        );
    }
}
