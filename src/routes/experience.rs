use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::activity::ActivityEntry;
use crate::models::experience::{Experience, ExperienceForm, ExperiencePatch};

#[get("/experience")]
pub fn list(pool: &State<DbPool>) -> Json<Vec<Experience>> {
    Json(Experience::list(pool))
}

#[get("/experience/<id>")]
pub fn get(pool: &State<DbPool>, id: i64) -> Option<Json<Experience>> {
    Experience::find_by_id(pool, id).map(Json)
}

#[post("/experience", format = "json", data = "<form>")]
pub fn create(
    pool: &State<DbPool>,
    admin: AdminUser,
    form: Json<ExperienceForm>,
) -> (Status, Json<Value>) {
    match Experience::create(pool, &form) {
        Ok(id) => match Experience::find_by_id(pool, id) {
            Some(exp) => {
                ActivityEntry::log(
                    pool,
                    "create",
                    "experience",
                    Some(id),
                    Some(&exp.display_name()),
                    &admin.username,
                    None,
                );
                (
                    Status::Created,
                    Json(serde_json::to_value(&exp).unwrap_or(Value::Null)),
                )
            }
            None => (
                Status::InternalServerError,
                Json(json!({"message": "Experience not found after insert"})),
            ),
        },
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[put("/experience/<id>", format = "json", data = "<patch>")]
pub fn update(
    pool: &State<DbPool>,
    admin: AdminUser,
    id: i64,
    patch: Json<ExperiencePatch>,
) -> (Status, Json<Value>) {
    let old = match Experience::find_by_id(pool, id) {
        Some(e) => serde_json::to_value(&e).unwrap_or(Value::Null),
        None => {
            return (
                Status::NotFound,
                Json(json!({"message": "Experience not found"})),
            )
        }
    };

    match Experience::update(pool, id, &patch) {
        Ok(exp) => {
            let new = serde_json::to_value(&exp).unwrap_or(Value::Null);
            ActivityEntry::log(
                pool,
                "update",
                "experience",
                Some(exp.id),
                Some(&exp.display_name()),
                &admin.username,
                Some(&json!({"old": old, "new": new})),
            );
            (Status::Ok, Json(new))
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[delete("/experience/<id>")]
pub fn delete(pool: &State<DbPool>, admin: AdminUser, id: i64) -> (Status, Json<Value>) {
    let exp = match Experience::find_by_id(pool, id) {
        Some(e) => e,
        None => {
            return (
                Status::NotFound,
                Json(json!({"message": "Experience not found"})),
            )
        }
    };

    let snapshot = serde_json::to_value(&exp).unwrap_or(Value::Null);

    match Experience::delete(pool, id) {
        Ok(()) => {
            ActivityEntry::log(
                pool,
                "delete",
                "experience",
                Some(id),
                Some(&exp.display_name()),
                &admin.username,
                Some(&snapshot),
            );
            (
                Status::Ok,
                Json(json!({
                    "message": "Experience deleted successfully",
                    "deleted_data": snapshot,
                })),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, get, create, update, delete]
}
