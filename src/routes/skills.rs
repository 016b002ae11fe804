use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::activity::ActivityEntry;
use crate::models::skill::{Skill, SkillForm, SkillPatch};

#[get("/skills")]
pub fn list(pool: &State<DbPool>) -> Json<Vec<Skill>> {
    Json(Skill::list(pool))
}

#[post("/skills", format = "json", data = "<form>")]
pub fn create(
    pool: &State<DbPool>,
    admin: AdminUser,
    form: Json<SkillForm>,
) -> (Status, Json<Value>) {
    match Skill::create(pool, &form) {
        Ok(id) => {
            let skill = Skill::find_by_id(pool, id);
            ActivityEntry::log(
                pool,
                "create",
                "skill",
                Some(id),
                Some(&form.name),
                &admin.username,
                None,
            );
            (
                Status::Created,
                Json(serde_json::to_value(&skill).unwrap_or(Value::Null)),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[put("/skills/<id>", format = "json", data = "<patch>")]
pub fn update(
    pool: &State<DbPool>,
    admin: AdminUser,
    id: i64,
    patch: Json<SkillPatch>,
) -> (Status, Json<Value>) {
    let old = match Skill::find_by_id(pool, id) {
        Some(s) => serde_json::to_value(&s).unwrap_or(Value::Null),
        None => return (Status::NotFound, Json(json!({"message": "Skill not found"}))),
    };

    match Skill::update(pool, id, &patch) {
        Ok(skill) => {
            let new = serde_json::to_value(&skill).unwrap_or(Value::Null);
            ActivityEntry::log(
                pool,
                "update",
                "skill",
                Some(skill.id),
                Some(&skill.name),
                &admin.username,
                Some(&json!({"old": old, "new": new})),
            );
            (Status::Ok, Json(new))
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[delete("/skills/<id>")]
pub fn delete(pool: &State<DbPool>, admin: AdminUser, id: i64) -> (Status, Json<Value>) {
    let skill = match Skill::find_by_id(pool, id) {
        Some(s) => s,
        None => return (Status::NotFound, Json(json!({"message": "Skill not found"}))),
    };

    let snapshot = serde_json::to_value(&skill).unwrap_or(Value::Null);

    match Skill::delete(pool, id) {
        Ok(()) => {
            ActivityEntry::log(
                pool,
                "delete",
                "skill",
                Some(id),
                Some(&skill.name),
                &admin.username,
                Some(&snapshot),
            );
            (
                Status::Ok,
                Json(json!({
                    "message": "Skill deleted successfully",
                    "deleted_data": snapshot,
                })),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, create, update, delete]
}
