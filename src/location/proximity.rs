//! Radius filtering over a candidate set.
//!
//! Candidates are ranked by distance and cut to the nearest `limit` first,
//! then filtered by radius. A point inside the radius but outside the nearest
//! `limit` is therefore dropped.

use std::cmp::Ordering;

use crate::geo::Coordinate;

use super::types::{LocationRecord, SearchResult};

/// Radius used when a caller supplies none, in miles.
pub const DEFAULT_RADIUS_MILES: f64 = 20.0;

/// Result cap used when a caller supplies none.
pub const DEFAULT_LIMIT: usize = 100;

/// Pick `value` unless it is absent or zero.
pub fn radius_or_default(radius: Option<f64>) -> f64 {
    match radius {
        Some(r) if r != 0.0 && !r.is_nan() => r,
        _ => DEFAULT_RADIUS_MILES,
    }
}

/// Pick `value` unless it is absent or zero.
pub fn limit_or_default(limit: Option<usize>) -> usize {
    match limit {
        Some(l) if l > 0 => l,
        _ => DEFAULT_LIMIT,
    }
}

/// Order by distance, then start time (undated first), then id.
pub fn by_distance(a: &SearchResult, b: &SearchResult) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.record.start.cmp(&b.record.start))
        .then_with(|| a.record.id.cmp(&b.record.id))
}

/// Order by start time (undated first), then id.
pub fn by_start(a: &LocationRecord, b: &LocationRecord) -> Ordering {
    a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id))
}

/// Compute distances for every candidate that has a coordinate and return
/// the nearest `limit`, ordered.
pub fn nearest<'a, I>(candidates: I, origin: &Coordinate, limit: usize) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a LocationRecord>,
{
    let mut ranked: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|rec| {
            let at = rec.coordinate?;
            Some(SearchResult::new(rec.clone(), origin.miles_to(&at)))
        })
        .collect();
    ranked.sort_by(by_distance);
    ranked.truncate(limit);
    ranked
}

/// Nearest `limit` candidates, then those strictly closer than `radius`.
pub fn within<'a, I>(
    candidates: I,
    origin: &Coordinate,
    radius: f64,
    limit: usize,
) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a LocationRecord>,
{
    let mut ranked = nearest(candidates, origin, limit);
    ranked.retain(|r| r.distance < radius);
    ranked
}
