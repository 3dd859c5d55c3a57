//! Read-only catalog access.
//!
//! `LocationStore` is the engine's only I/O seam. `CatalogStore` keeps the
//! whole catalog in memory, loaded once from a JSON array of records and
//! validated on the way in.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::geo::Coordinate;

use super::matcher::{normalize_key, Predicate};
use super::proximity;
use super::types::{KindFilter, LocationRecord, SearchResult, StoreError};

/// Axis-aligned map viewport in degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct Bounds {
    #[serde(rename = "latTop")]
    pub top: f64,
    #[serde(rename = "latBottom")]
    pub bottom: f64,
    #[serde(rename = "lngLeft")]
    pub left: f64,
    #[serde(rename = "lngRight")]
    pub right: f64,
}

impl Bounds {
    /// Open-interval containment. A viewport whose right edge is not east of
    /// its left edge wraps the antimeridian.
    pub fn contains(&self, at: &Coordinate) -> bool {
        if !(at.lat < self.top && at.lat > self.bottom) {
            return false;
        }
        if self.right > self.left {
            at.lng > self.left && at.lng < self.right
        } else {
            (at.lng > self.left && at.lng < 180.0) || (at.lng > -180.0 && at.lng < self.right)
        }
    }
}

/// Read access to the location catalog.
pub trait LocationStore {
    /// Nearest `limit` records of the admitted kinds, ascending distance.
    fn nearest(
        &self,
        origin: &Coordinate,
        kinds: &KindFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError>;

    /// Of the nearest `limit` records admitted by `kinds` and `predicate`,
    /// those strictly closer than `radius`; ascending distance then start.
    fn within(
        &self,
        origin: &Coordinate,
        radius: f64,
        kinds: &KindFilter,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError>;

    /// Records whose coordinate rounded to 4 places equals `at` rounded the
    /// same way. Unordered.
    fn exact_at(&self, at: &Coordinate, kinds: &KindFilter) -> Result<Vec<LocationRecord>, StoreError>;

    /// Records whose normalised slug equals `slug`, ascending start.
    fn by_slug(&self, slug: &str, kinds: &KindFilter) -> Result<Vec<LocationRecord>, StoreError>;

    /// Records matching `predicate` with no distance bound, ascending start.
    /// Distance is reported as 0.
    fn by_tag_or_center(
        &self,
        predicate: &Predicate,
        kinds: &KindFilter,
    ) -> Result<Vec<SearchResult>, StoreError>;

    /// Records matching `predicate`, ascending start.
    fn list(&self, predicate: &Predicate, kinds: &KindFilter) -> Result<Vec<LocationRecord>, StoreError>;

    /// Records inside a map viewport, in catalog order.
    fn in_bounds(&self, bounds: &Bounds) -> Result<Vec<LocationRecord>, StoreError>;
}

/// In-memory catalog.
#[derive(Debug, Default)]
pub struct CatalogStore {
    records: Vec<LocationRecord>,
}

impl CatalogStore {
    /// Build from records, rejecting malformed entries.
    pub fn from_records(records: Vec<LocationRecord>) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(records.len());
        for rec in &records {
            if !seen.insert(rec.id) {
                return Err(StoreError::DuplicateId(rec.id));
            }
            validate(rec)?;
        }
        Ok(Self { records })
    }

    /// Load a JSON array of records from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let store = Self::from_reader(BufReader::new(file))?;
        tracing::info!(path = %path.display(), count = store.len(), "Loaded location catalog");
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let records: Vec<LocationRecord> = serde_json::from_reader(reader)?;
        Self::from_records(records)
    }

    /// Default catalog location: `~/.locator/catalog.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".locator")
            .join("catalog.json")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn admitted<'a>(
        &'a self,
        kinds: &'a KindFilter,
        predicate: &'a Predicate,
    ) -> impl Iterator<Item = &'a LocationRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| kinds.admits(r.kind) && predicate.matches(r))
    }

    fn sorted_by_start<'a, I>(records: I) -> Vec<LocationRecord>
    where
        I: Iterator<Item = &'a LocationRecord>,
    {
        let mut out: Vec<LocationRecord> = records.cloned().collect();
        out.sort_by(proximity::by_start);
        out
    }
}

fn validate(rec: &LocationRecord) -> Result<(), StoreError> {
    match rec.coordinate {
        Some(c) if !c.is_finite() => Err(StoreError::InvalidRecord {
            id: rec.id,
            reason: format!("non-finite coordinate ({}, {})", c.lat, c.lng),
        }),
        None if rec.kind.requires_coordinate() => Err(StoreError::InvalidRecord {
            id: rec.id,
            reason: format!("{} requires a coordinate", rec.kind),
        }),
        _ => Ok(()),
    }
}

impl LocationStore for CatalogStore {
    fn nearest(
        &self,
        origin: &Coordinate,
        kinds: &KindFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        Ok(proximity::nearest(
            self.admitted(kinds, &Predicate::All),
            origin,
            limit,
        ))
    }

    fn within(
        &self,
        origin: &Coordinate,
        radius: f64,
        kinds: &KindFilter,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        Ok(proximity::within(
            self.admitted(kinds, predicate),
            origin,
            radius,
            limit,
        ))
    }

    fn exact_at(&self, at: &Coordinate, kinds: &KindFilter) -> Result<Vec<LocationRecord>, StoreError> {
        let target = at.rounded();
        Ok(self
            .admitted(kinds, &Predicate::All)
            .filter(|r| r.coordinate.is_some_and(|c| c.rounded() == target))
            .cloned()
            .collect())
    }

    fn by_slug(&self, slug: &str, kinds: &KindFilter) -> Result<Vec<LocationRecord>, StoreError> {
        let slug = normalize_key(slug);
        Ok(Self::sorted_by_start(
            self.admitted(kinds, &Predicate::All)
                .filter(|r| normalize_key(&r.slug) == slug),
        ))
    }

    fn by_tag_or_center(
        &self,
        predicate: &Predicate,
        kinds: &KindFilter,
    ) -> Result<Vec<SearchResult>, StoreError> {
        Ok(Self::sorted_by_start(self.admitted(kinds, predicate))
            .into_iter()
            .map(|r| SearchResult::new(r, 0.0))
            .collect())
    }

    fn list(&self, predicate: &Predicate, kinds: &KindFilter) -> Result<Vec<LocationRecord>, StoreError> {
        Ok(Self::sorted_by_start(self.admitted(kinds, predicate)))
    }

    fn in_bounds(&self, bounds: &Bounds) -> Result<Vec<LocationRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.coordinate.is_some_and(|c| bounds.contains(&c)))
            .cloned()
            .collect())
    }
}
