//! Tag and keyword predicates over catalog records.
//!
//! Predicates are plain values evaluated in memory; user input is never
//! spliced into query text.

use super::types::{KindFilter, LocationKind, LocationRecord};

/// A filter applied to candidate records before distance ranking.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Admits every record.
    All,
    /// Record tag string contains `#tag#` (tag already normalised).
    Tag(String),
    /// Centers and satsangs unconditionally; events only through the inner
    /// keyword set. Other kinds never match.
    CentersOrEvents(KeywordSet),
    /// Belongs to the given center.
    Center(i64),
    /// Belongs to the given center, or carries the tag.
    CenterOrTag { center_id: i64, tag: String },
    /// Specific conferencing id.
    Conference(String),
    /// Every record except the given id.
    Not(i64),
}

impl Predicate {
    pub fn matches(&self, record: &LocationRecord) -> bool {
        match self {
            Self::All => true,
            Self::Tag(tag) => tag_matches(&record.tag, tag),
            Self::CentersOrEvents(set) => match record.kind {
                LocationKind::Center | LocationKind::Satsang => true,
                LocationKind::Event => set.matches(record),
                _ => false,
            },
            Self::Center(center_id) => record.center_id == Some(*center_id),
            Self::CenterOrTag { center_id, tag } => {
                record.center_id == Some(*center_id) || tag_matches(&record.tag, tag)
            }
            Self::Conference(id) => record.conference_id.as_deref() == Some(id.as_str()),
            Self::Not(id) => record.id != *id,
        }
    }
}

/// Include/exclude keyword terms, already split and trimmed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeywordSet {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl KeywordSet {
    /// Build from raw `a,b;c` style lists. Returns `None` when no include
    /// term is left after trimming.
    pub fn parse(keywords: &str, exclude: Option<&str>) -> Option<Self> {
        let include = split_terms(keywords);
        if include.is_empty() {
            return None;
        }
        Some(Self {
            include,
            exclude: exclude.map(split_terms).unwrap_or_default(),
        })
    }

    pub fn matches(&self, record: &LocationRecord) -> bool {
        let name = record.name.to_lowercase();
        let blurb = record.blurb.to_lowercase();
        let hit = |term: &String| name.contains(term.as_str()) || blurb.contains(term.as_str());
        self.include.iter().any(hit) && !self.exclude.iter().any(hit)
    }
}

/// Normalise a tag or slug: lowercase with all whitespace removed.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Tag-mode predicate. `None` means the caller must short-circuit to an
/// empty result instead of matching everything.
pub fn tag_predicate(tag: Option<&str>) -> Option<Predicate> {
    let tag = normalize_key(tag?);
    if tag.is_empty() {
        return None;
    }
    Some(Predicate::Tag(tag))
}

/// Keyword-mode predicate for the mixed catalog search.
pub fn keyword_predicate(keywords: Option<&str>, exclude: Option<&str>) -> Option<Predicate> {
    KeywordSet::parse(keywords?, exclude).map(Predicate::CentersOrEvents)
}

/// Parse a `Center,Event;Satsang` whitelist.
///
/// Unknown names are dropped. A whitelist naming no known kind admits
/// nothing rather than everything.
pub fn kind_whitelist(raw: Option<&str>) -> KindFilter {
    let Some(raw) = raw else {
        return KindFilter::Any;
    };
    if raw.trim().is_empty() {
        return KindFilter::Any;
    }
    let mut kinds = Vec::new();
    for term in raw.split([',', ';']) {
        match term.parse::<LocationKind>() {
            Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Ok(_) => {}
            Err(e) => tracing::debug!(term = term.trim(), "Ignoring kind in whitelist: {}", e),
        }
    }
    KindFilter::OneOf(kinds)
}

fn tag_matches(record_tag: &str, tag: &str) -> bool {
    normalize_key(record_tag).contains(&format!("#{}#", tag))
}

fn split_terms(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
