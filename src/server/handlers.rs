use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::geo::Coordinate;
use crate::location::listing::{self, CalendarItem};
use crate::location::{
    nearest, search, Bounds, LocationRecord, Resolution, SearchQuery, SearchResult, SlugDomain,
    SlugResolver, StoreError,
};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Catalog read failed: {}", e);
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn log_request(route: &str, detail: &str, count: usize, start: Instant) {
    let elapsed_ms = (start.elapsed().as_secs_f64() * 10_000.0).round() / 10.0;
    tracing::info!(route, detail, count, elapsed_ms, "request");
}

// ─── Bodies ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsEnvelope {
    pub events: Vec<LocationRecord>,
}

#[derive(Serialize)]
pub struct CalendarEnvelope {
    pub items: Vec<CalendarItem>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ResolutionBody {
    Found {
        #[serde(rename = "Location")]
        location: ResolvedLocation,
    },
    NotFound {
        empty: bool,
        #[serde(rename = "resolvedURL")]
        resolved_url: String,
    },
}

#[derive(Serialize)]
pub struct ResolvedLocation {
    #[serde(flatten)]
    pub record: LocationRecord,
    #[serde(rename = "photoGallery", skip_serializing_if = "Option::is_none")]
    pub photo_gallery: Option<Vec<String>>,
}

impl From<Resolution> for ResolutionBody {
    fn from(res: Resolution) -> Self {
        match res {
            Resolution::Found { record, gallery } => Self::Found {
                location: ResolvedLocation {
                    record,
                    photo_gallery: gallery,
                },
            },
            Resolution::NotFound { slug } => Self::NotFound {
                empty: true,
                resolved_url: slug,
            },
        }
    }
}

#[derive(Deserialize)]
pub struct PointBody {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default, rename = "eventId")]
    pub event_id: Option<i64>,
}

impl PointBody {
    fn origin(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

// ─── Online events ───────────────────────────────────────────────

pub async fn list_online_events(State(state): State<Arc<AppState>>) -> ApiResult<Vec<LocationRecord>> {
    let start = Instant::now();
    let events = listing::online_events(&state.store)?;
    log_request("ListOnlineEvents", "", events.len(), start);
    Ok(Json(events))
}

pub async fn list_online_events_by_tag(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> ApiResult<EventsEnvelope> {
    let start = Instant::now();
    let events = listing::online_events_by_tag(&state.store, Some(&tag))?;
    log_request("ListOnlineEventsByTag", &tag, events.len(), start);
    Ok(Json(EventsEnvelope { events }))
}

pub async fn list_all_events_by_tag(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> ApiResult<EventsEnvelope> {
    let start = Instant::now();
    let events = listing::all_events_by_tag(&state.store, Some(&tag))?;
    log_request("ListAllEventsByTag", &tag, events.len(), start);
    Ok(Json(EventsEnvelope { events }))
}

pub async fn online_event_by_conference_id(
    State(state): State<Arc<AppState>>,
    Path(conference_id): Path<String>,
) -> ApiResult<EventsEnvelope> {
    let start = Instant::now();
    let events = listing::online_events_by_conference(&state.store, &conference_id)?;
    log_request("OnlineEventByConferenceId", &conference_id, events.len(), start);
    Ok(Json(EventsEnvelope { events }))
}

pub async fn upcoming_online_events(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> ApiResult<EventsEnvelope> {
    let start = Instant::now();
    let exclude = event_id.trim().parse::<i64>().map_err(|_| {
        ApiError(StatusCode::BAD_REQUEST, format!("Invalid event id '{}'", event_id))
    })?;
    let events = listing::upcoming_online_events(&state.store, exclude)?;
    log_request("GetUpcomingOnlineEvents", &event_id, events.len(), start);
    Ok(Json(EventsEnvelope { events }))
}

pub async fn list_events_by_tag(
    State(state): State<Arc<AppState>>,
    Path((tag, center_id)): Path<(String, String)>,
) -> ApiResult<EventsEnvelope> {
    let start = Instant::now();
    let center_id = center_id.trim().parse::<i64>().ok();
    let events = listing::events_by_tag(&state.store, Some(&tag), center_id)?;
    log_request("ListEventsByTag", &tag, events.len(), start);
    Ok(Json(EventsEnvelope { events }))
}

// ─── Slug resolution ─────────────────────────────────────────────

fn resolve(state: &AppState, route: &str, slug: &str, domain: SlugDomain) -> ApiResult<ResolutionBody> {
    let start = Instant::now();
    let resolution = match &state.gallery {
        Some(gallery) => SlugResolver::new(&state.store)
            .with_gallery(gallery.clone())
            .resolve(slug, domain)?,
        None => SlugResolver::new(&state.store).resolve(slug, domain)?,
    };
    log_request(route, slug, usize::from(resolution.is_found()), start);
    Ok(Json(resolution.into()))
}

pub async fn search_location_by_url(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<ResolutionBody> {
    resolve(&state, "searchLocationByURL", &slug, SlugDomain::Location)
}

pub async fn search_event_by_url(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<ResolutionBody> {
    resolve(&state, "searchEventByURL", &slug, SlugDomain::Event)
}

pub async fn search_master_event_by_url(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<ResolutionBody> {
    resolve(&state, "searchMasterEventByURL", &slug, SlugDomain::MasterEvent)
}

// ─── Master events ───────────────────────────────────────────────

pub async fn list_latest_five_master_events(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<LocationRecord>> {
    let start = Instant::now();
    let events = listing::latest_master_events(&state.store)?;
    log_request("listLatestFiveMasterEvents", "", events.len(), start);
    Ok(Json(events))
}

pub async fn list_master_events(State(state): State<Arc<AppState>>) -> ApiResult<Vec<LocationRecord>> {
    let start = Instant::now();
    let events = listing::master_events(&state.store)?;
    log_request("listMasterEvents", "", events.len(), start);
    Ok(Json(events))
}

pub async fn list_master_events_for_calendar(
    State(state): State<Arc<AppState>>,
) -> ApiResult<CalendarEnvelope> {
    let start = Instant::now();
    let items = listing::master_event_calendar(&state.store)?;
    log_request("listMasterEventsForCalendar", "", items.len(), start);
    Ok(Json(CalendarEnvelope { items }))
}

// ─── Radius searches ─────────────────────────────────────────────

pub async fn search_all_locations_by_tag_and_radius(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SearchQuery>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let results = search::search_all_by_tag_and_radius(&state.store, &query)?;
    log_request(
        "searchAllLocationsByTagAndRadius",
        query.tag.as_deref().unwrap_or(""),
        results.len(),
        start,
    );
    Ok(Json(results))
}

pub async fn search_all_locations_by_keywords_and_radius(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SearchQuery>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let results = search::search_all_by_keywords_and_radius(&state.store, &query)?;
    log_request(
        "searchAllLocationsByKeywordsAndRadius",
        query.keywords.as_deref().unwrap_or(""),
        results.len(),
        start,
    );
    Ok(Json(results))
}

pub async fn search_all_locations(
    State(state): State<Arc<AppState>>,
    Json(query): Json<SearchQuery>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let results = search::search_all_locations(&state.store, &query)?;
    log_request("searchAllLocations", "", results.len(), start);
    Ok(Json(results))
}

pub async fn search_locations(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PointBody>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let results = search::search_locations(&state.store, &body.origin(), body.radius)?;
    log_request("searchLocations", "", results.len(), start);
    Ok(Json(results))
}

pub async fn search_locations_by_bounds(
    State(state): State<Arc<AppState>>,
    Json(bounds): Json<Bounds>,
) -> ApiResult<Vec<LocationRecord>> {
    let start = Instant::now();
    let results = search::search_by_bounds(&state.store, &bounds)?;
    log_request("searchLocationsByBounds", "", results.len(), start);
    Ok(Json(results))
}

pub async fn search_nearest_six(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PointBody>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let results = nearest::nearest_points(&state.store, &body.origin())?;
    log_request("searchNearestSix", "", results.len(), start);
    Ok(Json(results))
}

pub async fn search_nearest_four_events(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PointBody>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let results = search::nearest_four_events(&state.store, &body.origin())?;
    log_request("searchNearestFourEvents", "", results.len(), start);
    Ok(Json(results))
}

pub async fn search_nearest_five_events(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PointBody>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let results =
        search::nearest_five_events(&state.store, &body.origin(), body.radius, body.event_id)?;
    log_request("searchNearestFiveEvents", "", results.len(), start);
    Ok(Json(results))
}

pub async fn search_events_by_location(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let results = search::events_by_location(&state.store, &slug)?;
    log_request("searchEventsByLocation", &slug, results.len(), start);
    Ok(Json(results))
}

/// Radius used when the path segment is not a number.
const FALLBACK_EVENT_RADIUS: f64 = 50.0;

pub async fn search_events_within_radius_by_location(
    State(state): State<Arc<AppState>>,
    Path((slug, radius)): Path<(String, String)>,
) -> ApiResult<Vec<SearchResult>> {
    let start = Instant::now();
    let radius = parse_radius(&radius);
    let results = search::events_within_radius_by_location(&state.store, &slug, radius)?;
    log_request("searchEventsWithinRadiusByLocation", &slug, results.len(), start);
    Ok(Json(results))
}

fn parse_radius(raw: &str) -> f64 {
    match raw.trim().parse::<i64>() {
        Ok(r) => r as f64,
        Err(e) => {
            tracing::warn!(raw, "Invalid radius, defaulting to {}: {}", FALLBACK_EVENT_RADIUS, e);
            FALLBACK_EVENT_RADIUS
        }
    }
}

pub async fn fetch_locales_by_location(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PointBody>,
) -> ApiResult<Vec<String>> {
    let start = Instant::now();
    let locales = nearest::locales_at(&state.store, &body.origin())?;
    log_request("fetchLocalesByLocation", "", locales.len(), start);
    Ok(Json(locales))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{CatalogStore, LocationKind};

    fn state() -> Arc<AppState> {
        let mut center = LocationRecord::new(1, LocationKind::Center, "Lakeside").at(0.0, 0.0);
        center.slug = "lakeside".into();
        let near = LocationRecord::new(2, LocationKind::Event, "Picnic").at(0.1, 0.0);
        let far = LocationRecord::new(3, LocationKind::Event, "Hike").at(0.5, 0.0);
        Arc::new(AppState {
            store: CatalogStore::from_records(vec![center, near, far]).unwrap(),
            gallery: None,
        })
    }

    #[test]
    fn test_parse_radius() {
        assert_eq!(parse_radius("75"), 75.0);
        assert_eq!(parse_radius("abc"), 50.0);
    }

    #[tokio::test]
    async fn test_location_not_found_body() {
        let Json(body) = search_location_by_url(State(state()), Path("No Where".into()))
            .await
            .ok()
            .unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["empty"], true);
        assert_eq!(json["resolvedURL"], "nowhere");
    }

    #[tokio::test]
    async fn test_location_found_body() {
        let Json(body) = search_location_by_url(State(state()), Path("Lake Side".into()))
            .await
            .ok()
            .unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["Location"]["id"], 1);
        assert!(json["Location"]["photoGallery"].is_array());
    }

    #[tokio::test]
    async fn test_events_by_location_route() {
        let Json(results) = search_events_by_location(State(state()), Path("lakeside".into()))
            .await
            .ok()
            .unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_nearest_six_route() {
        let body = PointBody { lat: 0.0, lng: 0.0, radius: None, event_id: None };
        let Json(results) = search_nearest_six(State(state()), Json(body)).await.ok().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id(), 1);
    }
}
