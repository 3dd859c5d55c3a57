//! Radius searches, including the staged widening used to find events
//! around a location.
//!
//! Stage flow:  50 mi (≥2) → 100 mi (≥2) → 500 mi (≥1) → nearest 5 events

use crate::geo::Coordinate;

use super::matcher::{self, Predicate};
use super::proximity::{limit_or_default, radius_or_default, DEFAULT_RADIUS_MILES};
use super::resolver::lookup_location;
use super::store::{Bounds, LocationStore};
use super::types::{KindFilter, LocationKind, LocationRecord, SearchQuery, SearchResult, StoreError};

/// One step of the widening policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusStage {
    pub radius: f64,
    /// Stop here when at least this many events are found.
    pub min_results: usize,
}

/// Widening stages tried in order before the unbounded fallback.
pub const EVENT_STAGES: [RadiusStage; 3] = [
    RadiusStage { radius: 50.0, min_results: 2 },
    RadiusStage { radius: 100.0, min_results: 2 },
    RadiusStage { radius: 500.0, min_results: 1 },
];

/// Candidate pool considered at each stage.
pub const STAGE_POOL: usize = 500;

/// Events returned when no stage succeeds.
pub const FALLBACK_EVENT_COUNT: usize = 5;

/// Radius applied by `nearest_five_events` when none is supplied.
pub const NEAREST_EVENTS_DEFAULT_RADIUS: f64 = 25_000.0;

/// Radius used by `search_locations` to ask for the two nearest only.
const WIDE_LOOKUP_RADIUS: f64 = 1500.0;

/// Events around `origin`, widening the radius until enough are found.
///
/// Stages run strictly one after another; each replaces the previous
/// attempt. If nothing lies within the last stage, the nearest events are
/// returned regardless of distance.
pub fn progressive_events<S: LocationStore + ?Sized>(
    store: &S,
    origin: &Coordinate,
) -> Result<Vec<SearchResult>, StoreError> {
    let events = KindFilter::only(LocationKind::Event);

    for stage in EVENT_STAGES {
        let found = store.within(origin, stage.radius, &events, &Predicate::All, STAGE_POOL)?;
        tracing::debug!(
            radius = stage.radius,
            found = found.len(),
            needed = stage.min_results,
            "Event radius stage"
        );
        if found.len() >= stage.min_results {
            return Ok(found);
        }
    }

    tracing::debug!(count = FALLBACK_EVENT_COUNT, "No events within staged radii, taking nearest");
    store.nearest(origin, &events, FALLBACK_EVENT_COUNT)
}

/// Events within an explicit radius of `origin`; no widening.
pub fn events_within<S: LocationStore + ?Sized>(
    store: &S,
    origin: &Coordinate,
    radius: f64,
) -> Result<Vec<SearchResult>, StoreError> {
    store.within(
        origin,
        radius,
        &KindFilter::only(LocationKind::Event),
        &Predicate::All,
        STAGE_POOL,
    )
}

/// Events around the location a slug names, with staged widening.
///
/// An unknown slug, or one naming a record without a coordinate, yields an
/// empty list.
pub fn events_by_location<S: LocationStore + ?Sized>(
    store: &S,
    slug: &str,
) -> Result<Vec<SearchResult>, StoreError> {
    match anchor(store, slug)? {
        Some(origin) => progressive_events(store, &origin),
        None => Ok(Vec::new()),
    }
}

/// Events within `radius` of the location a slug names.
pub fn events_within_radius_by_location<S: LocationStore + ?Sized>(
    store: &S,
    slug: &str,
    radius: f64,
) -> Result<Vec<SearchResult>, StoreError> {
    match anchor(store, slug)? {
        Some(origin) => events_within(store, &origin, radius),
        None => Ok(Vec::new()),
    }
}

fn anchor<S: LocationStore + ?Sized>(store: &S, slug: &str) -> Result<Option<Coordinate>, StoreError> {
    let Some(location) = lookup_location(store, slug)? else {
        tracing::debug!(slug, "No location for slug");
        return Ok(None);
    };
    if location.coordinate.is_none() {
        tracing::warn!(id = location.id, kind = %location.kind, "Location has no coordinate");
    }
    Ok(location.coordinate)
}

/// Every kind within the query radius.
pub fn search_all_locations<S: LocationStore + ?Sized>(
    store: &S,
    query: &SearchQuery,
) -> Result<Vec<SearchResult>, StoreError> {
    store.within(
        &query.origin(),
        radius_or_default(query.radius),
        &KindFilter::Any,
        &Predicate::All,
        limit_or_default(query.limit),
    )
}

/// Records carrying the query tag within the query radius. No tag, no
/// results.
pub fn search_all_by_tag_and_radius<S: LocationStore + ?Sized>(
    store: &S,
    query: &SearchQuery,
) -> Result<Vec<SearchResult>, StoreError> {
    let Some(predicate) = matcher::tag_predicate(query.tag.as_deref()) else {
        return Ok(Vec::new());
    };
    store.within(
        &query.origin(),
        radius_or_default(query.radius),
        &KindFilter::Any,
        &predicate,
        limit_or_default(query.limit),
    )
}

/// Centers and satsangs, plus events matching the query keywords, within
/// the query radius. No keywords, no results.
pub fn search_all_by_keywords_and_radius<S: LocationStore + ?Sized>(
    store: &S,
    query: &SearchQuery,
) -> Result<Vec<SearchResult>, StoreError> {
    let Some(predicate) =
        matcher::keyword_predicate(query.keywords.as_deref(), query.exclude_keywords.as_deref())
    else {
        return Ok(Vec::new());
    };
    store.within(
        &query.origin(),
        radius_or_default(query.radius),
        &matcher::kind_whitelist(query.kinds.as_deref()),
        &predicate,
        limit_or_default(query.limit),
    )
}

/// Closest locations for a map pin: the two nearest when asked for the
/// 1500 mile radius, otherwise up to ten.
pub fn search_locations<S: LocationStore + ?Sized>(
    store: &S,
    origin: &Coordinate,
    radius: Option<f64>,
) -> Result<Vec<SearchResult>, StoreError> {
    let radius = radius.unwrap_or(DEFAULT_RADIUS_MILES);
    let limit = if radius == WIDE_LOOKUP_RADIUS { 2 } else { 10 };
    store.within(origin, radius, &KindFilter::Any, &Predicate::All, limit)
}

/// Everything plotted inside a map viewport.
pub fn search_by_bounds<S: LocationStore + ?Sized>(
    store: &S,
    bounds: &Bounds,
) -> Result<Vec<LocationRecord>, StoreError> {
    store.in_bounds(bounds)
}

/// The four nearest events.
pub fn nearest_four_events<S: LocationStore + ?Sized>(
    store: &S,
    origin: &Coordinate,
) -> Result<Vec<SearchResult>, StoreError> {
    store.nearest(origin, &KindFilter::only(LocationKind::Event), 4)
}

/// The five nearest events other than `exclude_id`, cut at `radius`.
pub fn nearest_five_events<S: LocationStore + ?Sized>(
    store: &S,
    origin: &Coordinate,
    radius: Option<f64>,
    exclude_id: Option<i64>,
) -> Result<Vec<SearchResult>, StoreError> {
    let radius = match radius {
        Some(r) if r > 0.0 => r,
        _ => NEAREST_EVENTS_DEFAULT_RADIUS,
    };
    let predicate = exclude_id.map_or(Predicate::All, Predicate::Not);
    store.within(
        origin,
        radius,
        &KindFilter::only(LocationKind::Event),
        &predicate,
        FALLBACK_EVENT_COUNT,
    )
}
