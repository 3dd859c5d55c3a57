//! Slug resolver: type-priority fallback chains per slug domain.
//!
//! Location flow:  non-event kinds → Center (gallery) | Satsang (gallery) → not found
//! Event flow:     Event → OnlineEvent → not found
//! Master flow:    MasterEvent → not found

use super::gallery::{GalleryKind, NoGallery, PhotoGallery};
use super::matcher::normalize_key;
use super::store::LocationStore;
use super::types::{KindFilter, LocationKind, LocationRecord, Resolution, SlugDomain, StoreError};

/// Resolves URL slugs against a store, attaching galleries for places.
pub struct SlugResolver<'a, S: ?Sized, G = NoGallery> {
    store: &'a S,
    gallery: G,
}

impl<'a, S: LocationStore + ?Sized> SlugResolver<'a, S, NoGallery> {
    pub fn new(store: &'a S) -> Self {
        Self { store, gallery: NoGallery }
    }
}

impl<'a, S: LocationStore + ?Sized, G: PhotoGallery> SlugResolver<'a, S, G> {
    pub fn with_gallery<H: PhotoGallery>(self, gallery: H) -> SlugResolver<'a, S, H> {
        SlugResolver { store: self.store, gallery }
    }

    /// Resolve `raw` within `domain`. Misses carry the normalised slug.
    pub fn resolve(&self, raw: &str, domain: SlugDomain) -> Result<Resolution, StoreError> {
        let slug = normalize_key(raw);
        let found = match domain {
            SlugDomain::Location => return self.resolve_location(slug),
            SlugDomain::Event => self
                .first(&slug, LocationKind::Event)?
                .map_or_else(|| self.first(&slug, LocationKind::OnlineEvent), |r| Ok(Some(r)))?,
            SlugDomain::MasterEvent => self.first(&slug, LocationKind::MasterEvent)?,
            SlugDomain::OnlineEvent => self.first(&slug, LocationKind::OnlineEvent)?,
        };

        Ok(match found {
            Some(record) => Resolution::Found { record, gallery: None },
            None => not_found(slug),
        })
    }

    fn resolve_location(&self, slug: String) -> Result<Resolution, StoreError> {
        let candidates = self
            .store
            .by_slug(&slug, &KindFilter::except(LocationKind::Event))?;

        let pick = |kind: LocationKind| candidates.iter().find(|r| r.kind == kind);
        let (record, gallery_kind) = if let Some(center) = pick(LocationKind::Center) {
            (center, GalleryKind::Center)
        } else if let Some(satsang) = pick(LocationKind::Satsang) {
            (satsang, GalleryKind::Satsang)
        } else {
            if let Some(other) = candidates.first() {
                tracing::debug!(id = other.id, kind = %other.kind, slug, "Slug names neither center nor satsang");
            }
            return Ok(not_found(slug));
        };

        let gallery = self.gallery.photos(record.id, gallery_kind);
        Ok(Resolution::Found {
            record: record.clone(),
            gallery: Some(gallery),
        })
    }

    fn first(&self, slug: &str, kind: LocationKind) -> Result<Option<LocationRecord>, StoreError> {
        Ok(self.store.by_slug(slug, &KindFilter::only(kind))?.into_iter().next())
    }
}

fn not_found(slug: String) -> Resolution {
    tracing::debug!(slug, "Slug not resolved");
    Resolution::NotFound { slug }
}

/// Record a slug names for event lookups: non-event kinds first, then any
/// kind. The first match wins.
pub fn lookup_location<S: LocationStore + ?Sized>(
    store: &S,
    raw: &str,
) -> Result<Option<LocationRecord>, StoreError> {
    let slug = normalize_key(raw);
    if let Some(place) = store
        .by_slug(&slug, &KindFilter::except(LocationKind::Event))?
        .into_iter()
        .next()
    {
        return Ok(Some(place));
    }
    Ok(store.by_slug(&slug, &KindFilter::Any)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::store::tests::FailingStore;
    use crate::location::store::CatalogStore;
    use chrono::NaiveDate;

    struct FixedGallery;

    impl PhotoGallery for FixedGallery {
        fn photos(&self, location_id: i64, kind: GalleryKind) -> Vec<String> {
            vec![format!("{}/{}", kind, location_id)]
        }
    }

    fn with_slug(id: i64, kind: LocationKind, slug: &str) -> LocationRecord {
        let mut r = LocationRecord::new(id, kind, slug);
        r.slug = slug.into();
        if kind.requires_coordinate() {
            r = r.at(10.0, 10.0);
        }
        r
    }

    fn store() -> CatalogStore {
        let day = |d| NaiveDate::from_ymd_opt(2026, 9, d).unwrap().and_hms_opt(18, 0, 0).unwrap();
        let mut later = with_slug(5, LocationKind::Event, "fall-retreat");
        later.start = Some(day(28));
        let mut earlier = with_slug(6, LocationKind::Event, "Fall-Retreat");
        earlier.start = Some(day(3));
        CatalogStore::from_records(vec![
            with_slug(1, LocationKind::Center, "mycenter"),
            with_slug(2, LocationKind::Satsang, "riverside"),
            with_slug(3, LocationKind::Satsang, "shared"),
            with_slug(4, LocationKind::Center, "shared"),
            later,
            earlier,
            with_slug(7, LocationKind::OnlineEvent, "webinar"),
            with_slug(8, LocationKind::MasterEvent, "summit"),
            with_slug(9, LocationKind::OnlineEvent, "orphan"),
            with_slug(10, LocationKind::Event, "riverside"),
        ])
        .unwrap()
    }

    #[test]
    fn test_location_slug_normalised() {
        let store = store();
        let resolver = SlugResolver::new(&store).with_gallery(FixedGallery);
        let res = resolver.resolve("My Center", SlugDomain::Location).unwrap();
        match res {
            Resolution::Found { record, gallery } => {
                assert_eq!(record.id, 1);
                assert_eq!(gallery, Some(vec!["CenterGallery/1".to_string()]));
            }
            other => panic!("expected found, got {:?}", other),
        }
    }

    #[test]
    fn test_center_preferred_over_satsang() {
        let store = store();
        let resolver = SlugResolver::new(&store);
        let res = resolver.resolve("SHARED", SlugDomain::Location).unwrap();
        assert_eq!(res.record().map(|r| r.id), Some(4));
    }

    #[test]
    fn test_satsang_gets_satsang_gallery() {
        let store = store();
        let resolver = SlugResolver::new(&store).with_gallery(FixedGallery);
        match resolver.resolve("riverside", SlugDomain::Location).unwrap() {
            Resolution::Found { record, gallery } => {
                assert_eq!(record.id, 2);
                assert_eq!(gallery, Some(vec!["SatsangGallery/2".to_string()]));
            }
            other => panic!("expected found, got {:?}", other),
        }
    }

    #[test]
    fn test_other_kind_in_location_chain_is_not_found() {
        let store = store();
        let resolver = SlugResolver::new(&store);
        let res = resolver.resolve("Web Inar", SlugDomain::Location).unwrap();
        assert_eq!(res, Resolution::NotFound { slug: "webinar".into() });
    }

    #[test]
    fn test_event_earliest_first() {
        let store = store();
        let resolver = SlugResolver::new(&store);
        let res = resolver.resolve("fall-retreat", SlugDomain::Event).unwrap();
        assert_eq!(res.record().map(|r| r.id), Some(6));
    }

    #[test]
    fn test_event_falls_back_to_online() {
        let store = store();
        let resolver = SlugResolver::new(&store);
        let res = resolver.resolve("webinar", SlugDomain::Event).unwrap();
        assert_eq!(res.record().map(|r| r.id), Some(7));
    }

    #[test]
    fn test_master_event_only_master() {
        let store = store();
        let resolver = SlugResolver::new(&store);
        assert!(resolver.resolve("summit", SlugDomain::MasterEvent).unwrap().is_found());
        assert!(!resolver.resolve("webinar", SlugDomain::MasterEvent).unwrap().is_found());
        assert!(!resolver.resolve("summit", SlugDomain::Event).unwrap().is_found());
    }

    #[test]
    fn test_not_found_carries_slug() {
        let store = store();
        let resolver = SlugResolver::new(&store);
        let res = resolver.resolve("  No Such Place ", SlugDomain::Event).unwrap();
        assert_eq!(res, Resolution::NotFound { slug: "nosuchplace".into() });
    }

    #[test]
    fn test_store_failure_is_error() {
        let resolver = SlugResolver::new(&FailingStore);
        assert!(resolver.resolve("anything", SlugDomain::Location).is_err());
    }

    #[test]
    fn test_lookup_location_prefers_places() {
        let store = store();
        let rec = lookup_location(&store, "riverside").unwrap().unwrap();
        assert_eq!(rec.id, 2);
        let rec = lookup_location(&store, " Fall-Retreat ").unwrap().unwrap();
        assert_eq!(rec.id, 6);
        assert!(lookup_location(&store, "nowhere").unwrap().is_none());
    }
}
