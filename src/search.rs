use crate::index::Indices;
use crate::models::Show;

/// Default cap on search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Case-insensitive substring search over performance names and venues.
/// An empty (or blank) query matches nothing. Results keep snapshot order.
pub fn search_shows(indices: &Indices, query: &str, limit: usize) -> Vec<Show> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }

    indices
        .show_order
        .iter()
        .filter_map(|id| indices.show_by_id.get(id))
        .filter(|show| {
            show.performance_name.to_lowercase().contains(&q)
                || show.venue.to_lowercase().contains(&q)
        })
        .take(limit)
        .cloned()
        .collect()
}
