use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::db::DbPool;

#[get("/health")]
pub fn health(pool: &State<DbPool>) -> (Status, Json<Value>) {
    match pool.get() {
        Ok(_) => (Status::Ok, Json(json!({"status": "healthy"}))),
        Err(_) => (
            Status::ServiceUnavailable,
            Json(json!({"status": "unhealthy"})),
        ),
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![health]
}
