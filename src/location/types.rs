//! Core types for the location engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::geo::Coordinate;

/// What a catalog entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    Center,
    Satsang,
    Event,
    OnlineEvent,
    MasterEvent,
}

impl LocationKind {
    pub const ALL: [LocationKind; 5] = [
        Self::Center,
        Self::Satsang,
        Self::Event,
        Self::OnlineEvent,
        Self::MasterEvent,
    ];

    /// Whether records of this kind must carry a coordinate.
    pub fn requires_coordinate(&self) -> bool {
        matches!(self, Self::Center | Self::Satsang | Self::Event)
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Center => write!(f, "Center"),
            Self::Satsang => write!(f, "Satsang"),
            Self::Event => write!(f, "Event"),
            Self::OnlineEvent => write!(f, "OnlineEvent"),
            Self::MasterEvent => write!(f, "MasterEvent"),
        }
    }
}

impl FromStr for LocationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.to_string().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown location kind '{}'", trimmed))
    }
}

/// Which kinds a store read may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindFilter {
    Any,
    OneOf(Vec<LocationKind>),
    NoneOf(Vec<LocationKind>),
}

impl KindFilter {
    pub fn only(kind: LocationKind) -> Self {
        Self::OneOf(vec![kind])
    }

    pub fn except(kind: LocationKind) -> Self {
        Self::NoneOf(vec![kind])
    }

    pub fn admits(&self, kind: LocationKind) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(kinds) => kinds.contains(&kind),
            Self::NoneOf(kinds) => !kinds.contains(&kind),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: i64,
    pub kind: LocationKind,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
    pub name: String,
    #[serde(default)]
    pub blurb: String,
    /// Sequence of `#tag#` tokens.
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub center_id: Option<i64>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub fax_number: Option<String>,
    /// Conferencing id for online events.
    #[serde(default)]
    pub conference_id: Option<String>,
    #[serde(default)]
    pub hide_location: bool,
    #[serde(default)]
    pub hide_time: bool,
}

impl LocationRecord {
    /// Minimal record; remaining fields default to empty.
    pub fn new(id: i64, kind: LocationKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            coordinate: None,
            name: name.into(),
            blurb: String::new(),
            tag: String::new(),
            slug: String::new(),
            start: None,
            center_id: None,
            locale: None,
            address1: None,
            address2: None,
            city: None,
            state: None,
            country: None,
            zip_code: None,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            fax_number: None,
            conference_id: None,
            hide_location: false,
            hide_time: false,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.coordinate = Some(Coordinate::new(lat, lng));
        self
    }

    /// Locale with the catalog default applied.
    pub fn effective_locale(&self) -> &str {
        self.locale.as_deref().unwrap_or("en")
    }

    /// Whether the record explicitly declares an English locale.
    pub fn is_english(&self) -> bool {
        self.locale
            .as_deref()
            .is_some_and(|l| l.trim().eq_ignore_ascii_case("en"))
    }
}

/// A record paired with its distance from the query origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub record: LocationRecord,
    /// Statute miles from the query origin.
    pub distance: f64,
}

impl SearchResult {
    pub fn new(record: LocationRecord, distance: f64) -> Self {
        Self { record, distance }
    }

    pub fn id(&self) -> i64 {
        self.record.id
    }
}

/// Parameters of a radius search as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub lat: f64,
    pub lng: f64,
    /// Miles; `None` or 0 falls back to the operation default.
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default, rename = "limitResultCount")]
    pub limit: Option<usize>,
    #[serde(default, rename = "locationTag")]
    pub tag: Option<String>,
    #[serde(default, rename = "eventKeywords")]
    pub keywords: Option<String>,
    #[serde(default, rename = "excludeKeywords")]
    pub exclude_keywords: Option<String>,
    #[serde(default, rename = "locationTypes")]
    pub kinds: Option<String>,
}

impl SearchQuery {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            ..Default::default()
        }
    }

    pub fn origin(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Which slice of the catalog a slug is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugDomain {
    Location,
    Event,
    MasterEvent,
    OnlineEvent,
}

/// Outcome of a slug lookup. A miss is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found {
        record: LocationRecord,
        /// Photo links for centers and satsangs.
        gallery: Option<Vec<String>>,
    },
    NotFound {
        /// Normalised slug, kept for diagnostics.
        slug: String,
    },
}

impl Resolution {
    pub fn record(&self) -> Option<&LocationRecord> {
        match self {
            Self::Found { record, .. } => Some(record),
            Self::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Catalog access failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Catalog not found at: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid record {id}: {reason}")]
    InvalidRecord { id: i64, reason: String },
    #[error("Duplicate location id {0}")]
    DuplicateId(i64),
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("satsang".parse::<LocationKind>(), Ok(LocationKind::Satsang));
        assert_eq!(" OnlineEvent ".parse::<LocationKind>(), Ok(LocationKind::OnlineEvent));
        assert!("Retreat".parse::<LocationKind>().is_err());
    }

    #[test]
    fn test_kind_filter() {
        assert!(KindFilter::Any.admits(LocationKind::MasterEvent));
        assert!(KindFilter::only(LocationKind::Event).admits(LocationKind::Event));
        assert!(!KindFilter::only(LocationKind::Event).admits(LocationKind::Center));
        assert!(!KindFilter::except(LocationKind::Event).admits(LocationKind::Event));
        assert!(KindFilter::except(LocationKind::Event).admits(LocationKind::Satsang));
    }

    #[test]
    fn test_locale_defaults() {
        let mut rec = LocationRecord::new(1, LocationKind::Satsang, "Group");
        assert_eq!(rec.effective_locale(), "en");
        assert!(!rec.is_english());
        rec.locale = Some("EN".into());
        assert!(rec.is_english());
        rec.locale = Some("fr".into());
        assert_eq!(rec.effective_locale(), "fr");
    }

    #[test]
    fn test_record_deserialize_minimal() {
        let json = r#"{"id": 7, "kind": "Center", "name": "Downtown",
            "coordinate": {"lat": 41.0, "lng": -87.0}, "start": "2026-03-01T19:30:00"}"#;
        let rec: LocationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.kind, LocationKind::Center);
        assert_eq!(rec.coordinate, Some(Coordinate::new(41.0, -87.0)));
        assert!(rec.start.is_some());
        assert!(rec.tag.is_empty());
    }

    #[test]
    fn test_search_query_field_names() {
        let json = r#"{"lat": 1.0, "lng": 2.0, "radius": 30, "limitResultCount": 5,
            "eventKeywords": "yoga", "locationTypes": "Event"}"#;
        let q: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(q.radius, Some(30.0));
        assert_eq!(q.limit, Some(5));
        assert_eq!(q.keywords.as_deref(), Some("yoga"));
        assert_eq!(q.kinds.as_deref(), Some("Event"));
    }
}
