//! Nearest distinct map points.
//!
//! Several catalog entries are often plotted at one spot (a center and the
//! satsangs meeting in it, events hosted there). Map markers want one entry
//! per spot, and the richest one: a center or satsang over an event.

use std::collections::HashMap;

use crate::geo::Coordinate;

use super::store::LocationStore;
use super::types::{KindFilter, LocationKind, SearchResult, StoreError};

/// Entries considered before collapsing shared coordinates.
pub const CANDIDATE_POOL: usize = 400;

/// Distinct points returned.
pub const POINT_COUNT: usize = 6;

/// The nearest distinct points to `origin`, each upgraded to a co-located
/// center or satsang where one exists.
pub fn nearest_points<S: LocationStore + ?Sized>(
    store: &S,
    origin: &Coordinate,
) -> Result<Vec<SearchResult>, StoreError> {
    nearest_k(store, origin, POINT_COUNT)
}

/// As [`nearest_points`] with an explicit point count.
pub fn nearest_k<S: LocationStore + ?Sized>(
    store: &S,
    origin: &Coordinate,
    k: usize,
) -> Result<Vec<SearchResult>, StoreError> {
    let candidates = store.nearest(origin, &KindFilter::Any, CANDIDATE_POOL)?;
    let mut points = collapse(candidates);
    points.truncate(k);

    let places = KindFilter::OneOf(vec![LocationKind::Center, LocationKind::Satsang]);
    for slot in points.iter_mut() {
        if slot.record.kind == LocationKind::Center {
            continue;
        }
        let Some(at) = slot.record.coordinate else {
            continue;
        };
        let mut matches = store.exact_at(&at, &places)?;
        if matches.is_empty() {
            continue;
        }
        let chosen = match matches.iter().position(|r| r.is_english()) {
            Some(i) => matches.swap_remove(i),
            None => matches.swap_remove(0),
        };
        tracing::trace!(from = slot.record.id, to = chosen.id, "Substituting co-located place");
        *slot = SearchResult::new(chosen, 0.0);
    }

    Ok(points)
}

/// One entry per exact coordinate: the lowest id at the smallest distance,
/// ordered by distance.
fn collapse(candidates: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut groups: HashMap<(u64, u64), (i64, f64)> = HashMap::new();
    let mut by_id: HashMap<i64, SearchResult> = HashMap::with_capacity(candidates.len());

    for cand in candidates {
        let Some(at) = cand.record.coordinate else {
            continue;
        };
        groups
            .entry(at.exact_key())
            .and_modify(|(id, dist)| {
                *id = (*id).min(cand.record.id);
                *dist = dist.min(cand.distance);
            })
            .or_insert((cand.record.id, cand.distance));
        by_id.insert(cand.record.id, cand);
    }

    let mut points: Vec<SearchResult> = groups
        .into_values()
        .filter_map(|(id, dist)| {
            by_id.remove(&id).map(|mut rep| {
                rep.distance = dist;
                rep
            })
        })
        .collect();
    points.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id().cmp(&b.id())));
    points
}

/// Locales spoken at a point, English first, `["en"]` when nothing is
/// plotted there. Entries without a locale count as English.
pub fn locales_at<S: LocationStore + ?Sized>(
    store: &S,
    at: &Coordinate,
) -> Result<Vec<String>, StoreError> {
    let mut locales: Vec<String> = store
        .exact_at(at, &KindFilter::Any)?
        .iter()
        .map(|r| r.effective_locale().trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    locales.sort();
    locales.dedup();

    let had_english = locales.iter().any(|l| l.eq_ignore_ascii_case("en"));
    locales.retain(|l| !l.eq_ignore_ascii_case("en"));
    if had_english || locales.is_empty() {
        locales.insert(0, "en".to_string());
    }
    Ok(locales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::store::CatalogStore;
    use crate::location::types::LocationRecord;

    fn rec(id: i64, kind: LocationKind, lat: f64, lng: f64) -> LocationRecord {
        LocationRecord::new(id, kind, format!("{} {}", kind, id)).at(lat, lng)
    }

    fn ids(results: &[SearchResult]) -> Vec<i64> {
        results.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_shared_coordinate_collapses_to_one() {
        let store = CatalogStore::from_records(vec![
            rec(20, LocationKind::Event, 1.0, 1.0),
            rec(11, LocationKind::Event, 1.0, 1.0),
            rec(30, LocationKind::Event, 2.0, 2.0),
        ])
        .unwrap();
        let out = nearest_points(&store, &Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(ids(&out), vec![11, 30]);
    }

    #[test]
    fn test_returns_at_most_six_in_distance_order() {
        let recs = (1..=9).map(|i| rec(i, LocationKind::Event, 0.0, i as f64 * 0.1)).collect();
        let store = CatalogStore::from_records(recs).unwrap();
        let out = nearest_points(&store, &Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(ids(&out), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_english_place_preferred() {
        let mut fr = rec(2, LocationKind::Satsang, 1.0, 1.0);
        fr.locale = Some("fr".into());
        let mut en = rec(3, LocationKind::Satsang, 1.0, 1.0);
        en.locale = Some("en".into());
        let store = CatalogStore::from_records(vec![
            rec(1, LocationKind::Event, 1.00001, 1.00001),
            fr,
            en,
        ])
        .unwrap();
        let out = nearest_points(&store, &Coordinate::new(1.00001, 1.00001)).unwrap();
        // event point is substituted with the English satsang at distance 0,
        // the satsang point itself is also resolved to the English one
        assert_eq!(out[0].id(), 3);
        assert_eq!(out[0].distance, 0.0);
        assert!(out.iter().all(|r| r.id() == 3));
    }

    #[test]
    fn test_position_preserved_on_substitution() {
        let store = CatalogStore::from_records(vec![
            rec(1, LocationKind::Center, 0.0, 0.1),
            rec(2, LocationKind::Event, 0.0, 0.2),
            rec(3, LocationKind::Event, 0.0, 0.3),
            rec(4, LocationKind::Satsang, 0.0, 0.30001),
        ])
        .unwrap();
        let out = nearest_points(&store, &Coordinate::new(0.0, 0.0)).unwrap();
        // event 3 and satsang 4 are distinct points but round to the same
        // 4-decimal coordinate, so event 3's slot becomes satsang 4
        assert_eq!(ids(&out), vec![1, 2, 4, 4]);
        assert!(out[1].distance > 0.0);
        assert_eq!(out[2].distance, 0.0);
    }

    #[test]
    fn test_center_never_substituted() {
        let mut satsang = rec(2, LocationKind::Satsang, 5.0, 5.0);
        satsang.locale = Some("en".into());
        let store = CatalogStore::from_records(vec![rec(1, LocationKind::Center, 5.0, 5.0), satsang]).unwrap();
        let out = nearest_points(&store, &Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(ids(&out), vec![1]);
        assert!(out[0].distance > 0.0);
    }

    #[test]
    fn test_first_place_when_no_english() {
        let mut de = rec(2, LocationKind::Satsang, 5.0, 5.0);
        de.locale = Some("de".into());
        let store = CatalogStore::from_records(vec![rec(1, LocationKind::Event, 5.0, 5.0), de]).unwrap();
        let out = nearest_points(&store, &Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(ids(&out), vec![2]);
    }

    #[test]
    fn test_locales_at() {
        let mut a = rec(1, LocationKind::Satsang, 3.0, 3.0);
        a.locale = Some("es".into());
        let b = rec(2, LocationKind::Satsang, 3.0, 3.0);
        let mut c = rec(3, LocationKind::Event, 3.0, 3.0);
        c.locale = Some("de".into());
        let mut d = rec(4, LocationKind::Event, 3.0, 3.0);
        d.locale = Some("es".into());
        let store = CatalogStore::from_records(vec![a, b, c, d]).unwrap();
        assert_eq!(
            locales_at(&store, &Coordinate::new(3.0, 3.0)).unwrap(),
            vec!["en", "de", "es"]
        );
        assert_eq!(locales_at(&store, &Coordinate::new(9.0, 9.0)).unwrap(), vec!["en"]);
    }

    #[test]
    fn test_locales_without_english() {
        let mut a = rec(1, LocationKind::Satsang, 3.0, 3.0);
        a.locale = Some("hi".into());
        let store = CatalogStore::from_records(vec![a]).unwrap();
        assert_eq!(locales_at(&store, &Coordinate::new(3.0, 3.0)).unwrap(), vec!["hi"]);
    }
}
