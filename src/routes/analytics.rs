use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AdminUser, ClientIp, Referrer, UserAgent};
use crate::db::DbPool;
use crate::geo;
use crate::models::analytics::{AnalyticsEvent, RealtimeSummary, StatsSummary};

#[derive(Debug, Deserialize)]
pub struct TrackForm {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// Referrers are stored as bare domains; full URLs would bloat the
/// grouping keys with query strings.
fn referrer_domain(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| raw.to_string())
}

#[post("/analytics/track", format = "json", data = "<form>")]
pub fn track(
    pool: &State<DbPool>,
    form: Json<TrackForm>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    referrer: Referrer,
) -> (Status, Json<Value>) {
    let session_id = form
        .session_id
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let event_type = form.event_type.as_deref().unwrap_or("page_view");

    let location = geo::lookup(&client_ip.0);
    let referrer = referrer.0.as_deref().map(referrer_domain);

    let result = AnalyticsEvent::record(
        pool,
        &session_id,
        event_type,
        form.section.as_deref(),
        form.item_id,
        form.item_name.as_deref(),
        Some(&client_ip.0),
        Some(&user_agent.0),
        Some(&location.country),
        Some(&location.city),
        referrer.as_deref(),
        form.duration,
    );

    match result {
        Ok(()) => (
            Status::Created,
            Json(json!({"message": "Event tracked", "session_id": session_id})),
        ),
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[get("/analytics/stats")]
pub fn stats(pool: &State<DbPool>, _admin: AdminUser) -> Json<StatsSummary> {
    Json(AnalyticsEvent::stats(pool))
}

#[get("/analytics/realtime")]
pub fn realtime(pool: &State<DbPool>, _admin: AdminUser) -> Json<RealtimeSummary> {
    Json(AnalyticsEvent::realtime(pool))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![track, stats, realtime]
}
