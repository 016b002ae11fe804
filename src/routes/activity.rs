use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::activity::ActivityEntry;

/// Entity types the undo switch knows how to rebuild from a snapshot.
const UNDOABLE: &[&str] = &["project", "skill", "experience", "contact"];

#[get("/activity?<limit>")]
pub fn list(pool: &State<DbPool>, _admin: AdminUser, limit: Option<i64>) -> Json<Vec<ActivityEntry>> {
    let limit = limit.unwrap_or(50).max(1);
    Json(ActivityEntry::list(pool, limit))
}

#[post("/activity/undo/<id>")]
pub fn undo(pool: &State<DbPool>, admin: AdminUser, id: i64) -> (Status, Json<Value>) {
    let entry = match ActivityEntry::find_by_id(pool, id) {
        Some(e) => e,
        None => {
            return (
                Status::NotFound,
                Json(json!({"message": "Activity entry not found"})),
            )
        }
    };

    if entry.undone {
        return (
            Status::BadRequest,
            Json(json!({"message": "This action has already been undone"})),
        );
    }
    if entry.action != "delete" {
        return (
            Status::BadRequest,
            Json(json!({"message": "Only delete actions can be undone"})),
        );
    }
    if entry.data_snapshot.is_none() {
        return (
            Status::BadRequest,
            Json(json!({"message": "No data available to restore"})),
        );
    }
    if !UNDOABLE.contains(&entry.entity_type.as_str()) {
        return (
            Status::BadRequest,
            Json(json!({"message": "Entity type not supported for undo"})),
        );
    }

    match ActivityEntry::restore(pool, &entry) {
        Ok(restored_id) => {
            if let Err(e) = ActivityEntry::mark_undone(pool, entry.id) {
                log::warn!("Restored entity but failed to flag undo: {}", e);
            }
            ActivityEntry::log(
                pool,
                "undo",
                &entry.entity_type,
                Some(restored_id),
                entry.entity_name.as_deref(),
                &admin.username,
                None,
            );
            (
                Status::Ok,
                Json(json!({
                    "message": format!("{} restored successfully", entry.entity_type),
                    "restored_id": restored_id,
                })),
            )
        }
        Err(e) => (
            Status::InternalServerError,
            Json(json!({"message": format!("Error restoring item: {}", e)})),
        ),
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, undo]
}
