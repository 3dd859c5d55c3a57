mod handlers;
mod state;

use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::routing::{any, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/ListOnlineEvents", get(handlers::list_online_events))
        .route("/ListOnlineEventsByTag/{tag}", any(handlers::list_online_events_by_tag))
        .route("/ListAllEventsByTag/{tag}", any(handlers::list_all_events_by_tag))
        .route(
            "/OnlineEventByConferenceId/{conference_id}",
            any(handlers::online_event_by_conference_id),
        )
        .route(
            "/GetUpcomingOnlineEvents/{event_id}",
            any(handlers::upcoming_online_events),
        )
        .route(
            "/ListEventsByTag/{tag}/{center_id}",
            any(handlers::list_events_by_tag),
        )
        .route("/searchLocationByURL/{slug}", any(handlers::search_location_by_url))
        .route("/searchEventByURL/{slug}", any(handlers::search_event_by_url))
        .route(
            "/searchMasterEventByURL/{slug}",
            any(handlers::search_master_event_by_url),
        )
        .route(
            "/listLatestFiveMasterEvents",
            get(handlers::list_latest_five_master_events),
        )
        .route("/listMasterEvents", get(handlers::list_master_events))
        .route(
            "/listMasterEventsForCalendar",
            get(handlers::list_master_events_for_calendar),
        )
        .route(
            "/searchAllLocationsByTagAndRadius",
            post(handlers::search_all_locations_by_tag_and_radius),
        )
        .route(
            "/searchAllLocationsByKeywordsAndRadius",
            post(handlers::search_all_locations_by_keywords_and_radius),
        )
        .route("/searchAllLocations", post(handlers::search_all_locations))
        .route("/searchLocations", post(handlers::search_locations))
        .route("/searchLocationsByBounds", post(handlers::search_locations_by_bounds))
        .route("/searchNearestSix", post(handlers::search_nearest_six))
        .route("/searchNearestFourEvents", post(handlers::search_nearest_four_events))
        .route("/searchNearestFiveEvents", post(handlers::search_nearest_five_events))
        .route(
            "/searchEventsByLocation/{slug}",
            any(handlers::search_events_by_location),
        )
        .route(
            "/searchEventsWithinRadiusByLocation/{slug}/{radius}",
            any(handlers::search_events_within_radius_by_location),
        )
        .route("/fetchLocalesByLocation", post(handlers::fetch_locales_by_location));

    Router::new()
        .nest("/api/locationsearch", api)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!("Cannot bind to {}: {}", addr, e);
        e
    })?;

    tracing::info!("Locator server listening on http://{}", addr);
    axum::serve(listener, app).await
}
