//! Start-ordered listings: online events, tagged events, master events and
//! the calendar feed built from them.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use super::matcher::{tag_predicate, Predicate};
use super::store::LocationStore;
use super::types::{KindFilter, LocationKind, LocationRecord, StoreError};

/// Online events listed on an event page's "upcoming" strip.
pub const UPCOMING_ONLINE_COUNT: usize = 5;

/// Master events shown on the landing page.
pub const LATEST_MASTER_COUNT: usize = 5;

pub fn online_events<S: LocationStore + ?Sized>(store: &S) -> Result<Vec<LocationRecord>, StoreError> {
    store.list(&Predicate::All, &KindFilter::only(LocationKind::OnlineEvent))
}

/// Online events carrying `tag`. An empty tag lists nothing.
pub fn online_events_by_tag<S: LocationStore + ?Sized>(
    store: &S,
    tag: Option<&str>,
) -> Result<Vec<LocationRecord>, StoreError> {
    tagged(store, tag, KindFilter::only(LocationKind::OnlineEvent))
}

/// In-person and online events carrying `tag`.
pub fn all_events_by_tag<S: LocationStore + ?Sized>(
    store: &S,
    tag: Option<&str>,
) -> Result<Vec<LocationRecord>, StoreError> {
    tagged(
        store,
        tag,
        KindFilter::OneOf(vec![LocationKind::OnlineEvent, LocationKind::Event]),
    )
}

fn tagged<S: LocationStore + ?Sized>(
    store: &S,
    tag: Option<&str>,
    kinds: KindFilter,
) -> Result<Vec<LocationRecord>, StoreError> {
    match tag_predicate(tag) {
        Some(predicate) => store.list(&predicate, &kinds),
        None => Ok(Vec::new()),
    }
}

pub fn online_events_by_conference<S: LocationStore + ?Sized>(
    store: &S,
    conference_id: &str,
) -> Result<Vec<LocationRecord>, StoreError> {
    store.list(
        &Predicate::Conference(conference_id.trim().to_string()),
        &KindFilter::only(LocationKind::OnlineEvent),
    )
}

/// The next few online events, skipping the one being viewed.
pub fn upcoming_online_events<S: LocationStore + ?Sized>(
    store: &S,
    exclude_id: i64,
) -> Result<Vec<LocationRecord>, StoreError> {
    let mut events = store.list(
        &Predicate::Not(exclude_id),
        &KindFilter::only(LocationKind::OnlineEvent),
    )?;
    events.truncate(UPCOMING_ONLINE_COUNT);
    Ok(events)
}

/// Events hosted by a center or carrying a tag. A center id of zero or
/// below is ignored.
pub fn events_by_tag<S: LocationStore + ?Sized>(
    store: &S,
    tag: Option<&str>,
    center_id: Option<i64>,
) -> Result<Vec<LocationRecord>, StoreError> {
    let events = KindFilter::only(LocationKind::Event);
    let tag = tag_predicate(tag);
    let predicate = match (center_id.filter(|id| *id > 0), tag) {
        (Some(center_id), Some(Predicate::Tag(tag))) => Predicate::CenterOrTag { center_id, tag },
        (Some(center_id), _) => Predicate::Center(center_id),
        (None, Some(tag)) => tag,
        (None, None) => return Ok(Vec::new()),
    };
    Ok(store
        .by_tag_or_center(&predicate, &events)?
        .into_iter()
        .map(|r| r.record)
        .collect())
}

pub fn master_events<S: LocationStore + ?Sized>(store: &S) -> Result<Vec<LocationRecord>, StoreError> {
    store.list(&Predicate::All, &KindFilter::only(LocationKind::MasterEvent))
}

pub fn latest_master_events<S: LocationStore + ?Sized>(
    store: &S,
) -> Result<Vec<LocationRecord>, StoreError> {
    let mut events = master_events(store)?;
    events.truncate(LATEST_MASTER_COUNT);
    Ok(events)
}

/// Satsangs attached to a center.
pub fn satsangs_of_center<S: LocationStore + ?Sized>(
    store: &S,
    center_id: i64,
) -> Result<Vec<LocationRecord>, StoreError> {
    store.list(
        &Predicate::Center(center_id),
        &KindFilter::only(LocationKind::Satsang),
    )
}

/// Centers and satsangs in a country (exact, case-sensitive name).
pub fn places_in_country<S: LocationStore + ?Sized>(
    store: &S,
    country: &str,
) -> Result<Vec<LocationRecord>, StoreError> {
    Ok(store
        .list(
            &Predicate::All,
            &KindFilter::OneOf(vec![LocationKind::Center, LocationKind::Satsang]),
        )?
        .into_iter()
        .filter(|r| r.country.as_deref() == Some(country))
        .collect())
}

/// One entry of the master-event calendar widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItem {
    pub name: String,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub time: Option<String>,
    pub duration: String,
    pub color: String,
    pub location: String,
    pub description: String,
    pub hide_location: bool,
    pub hide_time: bool,
}

impl CalendarItem {
    pub fn from_record(record: &LocationRecord) -> Self {
        let start = record.start;
        Self {
            name: record.name.clone(),
            day: start.map(|s| s.day()),
            month: start.map(|s| s.month()),
            year: start.map(|s| s.year()),
            time: start.map(|s| clock_time(&s)),
            duration: "1".into(),
            color: "1".into(),
            location: format_address(record),
            description: format_description(record),
            hide_location: record.hide_location,
            hide_time: record.hide_time,
        }
    }
}

pub fn master_event_calendar<S: LocationStore + ?Sized>(
    store: &S,
) -> Result<Vec<CalendarItem>, StoreError> {
    Ok(master_events(store)?.iter().map(CalendarItem::from_record).collect())
}

fn clock_time(at: &NaiveDateTime) -> String {
    at.format("%I:%M %p").to_string()
}

/// Postal address on one line. Online venues keep only the first line.
pub fn format_address(record: &LocationRecord) -> String {
    let mut address = record.address1.clone().unwrap_or_default();
    if address.to_lowercase().contains("online") {
        return address;
    }
    let rest = [
        &record.address2,
        &record.city,
        &record.state,
        &record.country,
        &record.zip_code,
    ];
    for part in rest.into_iter().flatten().filter(|p| !p.is_empty()) {
        address.push_str(", ");
        address.push_str(part);
    }
    address
}

/// Blurb plus contact block, as HTML.
pub fn format_description(record: &LocationRecord) -> String {
    let mut html = format!("<p>{}</p>", record.blurb);
    html.push_str("<p><b>Contact Information:</b><br/>");
    let lines = [
        ("Contact Person", &record.contact_name),
        ("Email", &record.contact_email),
        ("Phone", &record.contact_phone),
        ("Fax", &record.fax_number),
    ];
    for (label, value) in lines {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            html.push_str(&format!("<b>{}:</b> {}<br/>", label, v));
        }
    }
    html.push_str("</p>");
    html
}
