use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AdminUser, ClientIp, UserAgent};
use crate::db::DbPool;
use crate::models::activity::ActivityEntry;
use crate::models::blog::{Blog, BlogForm, BlogLike, BlogPatch};
use crate::models::comment::{BlogComment, CommentForm, CommentLike, CommentThread};

// ── Posts ──────────────────────────────────────────────

#[get("/blogs?<published>&<homepage>")]
pub fn list(pool: &State<DbPool>, published: Option<bool>, homepage: Option<bool>) -> Json<Vec<Blog>> {
    let published_only = published.unwrap_or(true);
    let homepage_only = homepage.unwrap_or(false);
    Json(Blog::list(pool, published_only, homepage_only))
}

#[get("/blogs/all")]
pub fn list_all(pool: &State<DbPool>, _admin: AdminUser) -> Json<Vec<Blog>> {
    Json(Blog::list_all(pool))
}

#[get("/blogs/<id>")]
pub fn get(pool: &State<DbPool>, id: i64) -> Option<Json<Blog>> {
    Blog::find_by_id(pool, id)?;
    let _ = Blog::increment_views(pool, id);
    Blog::find_by_id(pool, id).map(Json)
}

#[get("/blogs/slug/<slug>")]
pub fn get_by_slug(pool: &State<DbPool>, slug: &str) -> Option<Json<Blog>> {
    let blog = Blog::find_by_slug(pool, slug)?;
    let _ = Blog::increment_views(pool, blog.id);
    Blog::find_by_id(pool, blog.id).map(Json)
}

#[post("/blogs", format = "json", data = "<form>")]
pub fn create(
    pool: &State<DbPool>,
    admin: AdminUser,
    form: Json<BlogForm>,
) -> (Status, Json<Value>) {
    match Blog::create(pool, &form, &admin.username) {
        Ok(id) => {
            let blog = Blog::find_by_id(pool, id);
            ActivityEntry::log(
                pool,
                "create",
                "blog",
                Some(id),
                Some(&form.title),
                &admin.username,
                None,
            );
            (
                Status::Created,
                Json(serde_json::to_value(&blog).unwrap_or(Value::Null)),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[put("/blogs/<id>", format = "json", data = "<patch>")]
pub fn update(
    pool: &State<DbPool>,
    admin: AdminUser,
    id: i64,
    patch: Json<BlogPatch>,
) -> (Status, Json<Value>) {
    let old = match Blog::find_by_id(pool, id) {
        Some(b) => serde_json::to_value(&b).unwrap_or(Value::Null),
        None => return (Status::NotFound, Json(json!({"message": "Blog not found"}))),
    };

    match Blog::update(pool, id, &patch) {
        Ok(blog) => {
            let new = serde_json::to_value(&blog).unwrap_or(Value::Null);
            ActivityEntry::log(
                pool,
                "update",
                "blog",
                Some(blog.id),
                Some(&blog.title),
                &admin.username,
                Some(&json!({"old": old, "new": new})),
            );
            (Status::Ok, Json(new))
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[delete("/blogs/<id>")]
pub fn delete(pool: &State<DbPool>, admin: AdminUser, id: i64) -> (Status, Json<Value>) {
    let blog = match Blog::find_by_id(pool, id) {
        Some(b) => b,
        None => return (Status::NotFound, Json(json!({"message": "Blog not found"}))),
    };

    let snapshot = serde_json::to_value(&blog).unwrap_or(Value::Null);

    match Blog::delete(pool, id) {
        Ok(()) => {
            ActivityEntry::log(
                pool,
                "delete",
                "blog",
                Some(id),
                Some(&blog.title),
                &admin.username,
                Some(&snapshot),
            );
            (
                Status::Ok,
                Json(json!({
                    "message": "Blog deleted successfully",
                    "deleted_data": snapshot,
                })),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

// ── Likes ──────────────────────────────────────────────

#[post("/blogs/<id>/like")]
pub fn like(pool: &State<DbPool>, id: i64, client_ip: ClientIp, user_agent: UserAgent) -> (Status, Json<Value>) {
    if Blog::find_by_id(pool, id).is_none() {
        return (Status::NotFound, Json(json!({"message": "Blog not found"})));
    }

    match BlogLike::like(pool, id, &client_ip.0, &user_agent.0) {
        Ok((true, count)) => (
            Status::Created,
            Json(json!({"message": "Blog liked", "liked": true, "count": count})),
        ),
        Ok((false, _)) => (
            Status::Ok,
            Json(json!({"message": "Already liked", "liked": true})),
        ),
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[get("/blogs/<id>/likes")]
pub fn likes(pool: &State<DbPool>, id: i64, client_ip: ClientIp) -> Json<Value> {
    let count = BlogLike::count(pool, id);
    let liked = BlogLike::liked_by(pool, id, &client_ip.0);
    Json(json!({"count": count, "liked": liked}))
}

// ── Comments ───────────────────────────────────────────

#[get("/blogs/<id>/comments")]
pub fn comments(pool: &State<DbPool>, id: i64) -> Json<Vec<CommentThread>> {
    Json(BlogComment::for_blog(pool, id))
}

#[post("/blogs/<id>/comments", format = "json", data = "<form>")]
pub fn create_comment(
    pool: &State<DbPool>,
    id: i64,
    form: Json<CommentForm>,
    client_ip: ClientIp,
    user_agent: UserAgent,
) -> (Status, Json<Value>) {
    if Blog::find_by_id(pool, id).is_none() {
        return (Status::NotFound, Json(json!({"message": "Blog not found"})));
    }

    match BlogComment::create(pool, id, &form, &client_ip.0, &user_agent.0) {
        Ok(comment_id) => {
            let comment = BlogComment::find_by_id(pool, comment_id);
            (
                Status::Created,
                Json(serde_json::to_value(&comment).unwrap_or(Value::Null)),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    pub content: String,
}

#[post("/blogs/comments/<id>/reply", format = "json", data = "<form>")]
pub fn reply_to_comment(
    pool: &State<DbPool>,
    admin: AdminUser,
    id: i64,
    form: Json<ReplyForm>,
    client_ip: ClientIp,
    user_agent: UserAgent,
) -> (Status, Json<Value>) {
    let parent = match BlogComment::find_by_id(pool, id) {
        Some(c) => c,
        None => {
            return (
                Status::NotFound,
                Json(json!({"message": "Comment not found"})),
            )
        }
    };

    let comment_form = CommentForm {
        parent_id: Some(id),
        author_name: form.author_name.clone().unwrap_or(admin.username),
        author_email: form.author_email.clone(),
        content: form.content.clone(),
    };

    match BlogComment::create(pool, parent.blog_id, &comment_form, &client_ip.0, &user_agent.0) {
        Ok(reply_id) => {
            let reply = BlogComment::find_by_id(pool, reply_id);
            (
                Status::Created,
                Json(serde_json::to_value(&reply).unwrap_or(Value::Null)),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

// ── Comment likes ──────────────────────────────────────

#[post("/comments/<id>/like")]
pub fn like_comment(
    pool: &State<DbPool>,
    id: i64,
    client_ip: ClientIp,
    user_agent: UserAgent,
) -> (Status, Json<Value>) {
    if BlogComment::find_by_id(pool, id).is_none() {
        return (
            Status::NotFound,
            Json(json!({"message": "Comment not found"})),
        );
    }

    match CommentLike::toggle(pool, id, &client_ip.0, &user_agent.0) {
        Ok((true, count)) => (
            Status::Created,
            Json(json!({"message": "Comment liked", "liked": true, "count": count})),
        ),
        Ok((false, count)) => (
            Status::Ok,
            Json(json!({"message": "Comment unliked", "liked": false, "count": count})),
        ),
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[get("/comments/<id>/likes")]
pub fn comment_likes(pool: &State<DbPool>, id: i64, client_ip: ClientIp) -> Option<Json<Value>> {
    let comment = BlogComment::find_by_id(pool, id)?;
    let liked = CommentLike::liked_by(pool, id, &client_ip.0);
    // The cached count on the comment row is the served value
    Some(Json(json!({"count": comment.like_count, "liked": liked})))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list,
        list_all,
        get,
        get_by_slug,
        create,
        update,
        delete,
        like,
        likes,
        comments,
        create_comment,
        reply_to_comment,
        like_comment,
        comment_likes
    ]
}
