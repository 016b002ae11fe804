use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::activity::ActivityEntry;
use crate::models::project::{Project, ProjectForm, ProjectPatch};

#[get("/projects")]
pub fn list(pool: &State<DbPool>) -> Json<Vec<Project>> {
    Json(Project::list(pool))
}

#[get("/projects/<id>")]
pub fn get(pool: &State<DbPool>, id: i64) -> Option<Json<Project>> {
    Project::find_by_id(pool, id).map(Json)
}

#[post("/projects", format = "json", data = "<form>")]
pub fn create(
    pool: &State<DbPool>,
    admin: AdminUser,
    form: Json<ProjectForm>,
) -> (Status, Json<Value>) {
    match Project::create(pool, &form) {
        Ok(id) => {
            let project = Project::find_by_id(pool, id);
            ActivityEntry::log(
                pool,
                "create",
                "project",
                Some(id),
                Some(&form.title),
                &admin.username,
                None,
            );
            (
                Status::Created,
                Json(serde_json::to_value(&project).unwrap_or(Value::Null)),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[put("/projects/<id>", format = "json", data = "<patch>")]
pub fn update(
    pool: &State<DbPool>,
    admin: AdminUser,
    id: i64,
    patch: Json<ProjectPatch>,
) -> (Status, Json<Value>) {
    let old = match Project::find_by_id(pool, id) {
        Some(p) => serde_json::to_value(&p).unwrap_or(Value::Null),
        None => return (Status::NotFound, Json(json!({"message": "Project not found"}))),
    };

    match Project::update(pool, id, &patch) {
        Ok(project) => {
            let new = serde_json::to_value(&project).unwrap_or(Value::Null);
            ActivityEntry::log(
                pool,
                "update",
                "project",
                Some(project.id),
                Some(&project.title),
                &admin.username,
                Some(&json!({"old": old, "new": new})),
            );
            (Status::Ok, Json(new))
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[delete("/projects/<id>")]
pub fn delete(pool: &State<DbPool>, admin: AdminUser, id: i64) -> (Status, Json<Value>) {
    let project = match Project::find_by_id(pool, id) {
        Some(p) => p,
        None => return (Status::NotFound, Json(json!({"message": "Project not found"}))),
    };

    let snapshot = serde_json::to_value(&project).unwrap_or(Value::Null);

    match Project::delete(pool, id) {
        Ok(()) => {
            ActivityEntry::log(
                pool,
                "delete",
                "project",
                Some(id),
                Some(&project.title),
                &admin.username,
                Some(&snapshot),
            );
            (
                Status::Ok,
                Json(json!({
                    "message": "Project deleted successfully",
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
