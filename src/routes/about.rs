use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::about::{About, AboutPatch};
use crate::models::activity::ActivityEntry;

#[get("/about")]
pub fn get(pool: &State<DbPool>) -> Result<Json<About>, (Status, Json<Value>)> {
    match About::get(pool) {
        Some(about) => Ok(Json(about)),
        None => Err((
            Status::NotFound,
            Json(json!({"message": "About information not found"})),
        )),
    }
}

#[put("/about", format = "json", data = "<patch>")]
pub fn update(
    pool: &State<DbPool>,
    admin: AdminUser,
    patch: Json<AboutPatch>,
) -> (Status, Json<Value>) {
    let old = About::get(pool)
        .map(|a| serde_json::to_value(&a).unwrap_or(Value::Null))
        .unwrap_or_else(|| json!({}));

    match About::upsert(pool, &patch) {
        Ok(about) => {
            let new = serde_json::to_value(&about).unwrap_or(Value::Null);
            ActivityEntry::log(
                pool,
                "update",
                "about",
                Some(about.id),
                Some(&about.name),
                &admin.username,
                Some(&json!({"old": old, "new": new})),
            );
            (Status::Ok, Json(new))
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![get, update]
}
