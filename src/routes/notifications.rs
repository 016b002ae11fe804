use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::models::blog::BlogLike;
use crate::models::comment::BlogComment;

#[get("/notifications")]
pub fn list(pool: &State<DbPool>, _admin: AdminUser) -> Json<Value> {
    let unread_likes = BlogLike::unread_count(pool);
    let unread_comments = BlogComment::unread_count(pool);

    Json(json!({
        "unread_likes": unread_likes,
        "unread_comments": unread_comments,
        "total_unread": unread_likes + unread_comments,
        "recent_likes": BlogLike::recent_unread(pool, 10),
        "recent_comments": BlogComment::recent_unread(pool, 10),
    }))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadForm {
    #[serde(rename = "type")]
    pub kind: String,
}

#[post("/notifications/mark-read", format = "json", data = "<form>")]
pub fn mark_read(
    pool: &State<DbPool>,
    _admin: AdminUser,
    form: Json<MarkReadForm>,
) -> (Status, Json<Value>) {
    let kind = form.kind.as_str();

    if kind == "likes" || kind == "all" {
        if let Err(e) = BlogLike::mark_all_read(pool) {
            return (Status::InternalServerError, Json(json!({"message": e})));
        }
    }
    if kind == "comments" || kind == "all" {
        if let Err(e) = BlogComment::mark_all_read(pool) {
            return (Status::InternalServerError, Json(json!({"message": e})));
        }
    }

    (
        Status::Ok,
        Json(json!({"message": "Notifications marked as read"})),
    )
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list, mark_read]
}
