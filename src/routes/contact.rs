use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::email;
use crate::models::activity::ActivityEntry;
use crate::models::contact::{Contact, ContactForm};

#[post("/contact", format = "json", data = "<form>")]
pub fn create(pool: &State<DbPool>, form: Json<ContactForm>) -> (Status, Json<Value>) {
    match Contact::create(pool, &form) {
        Ok(id) => {
            if let Some(contact) = Contact::find_by_id(pool, id) {
                email::send_contact_notification(pool, &contact);
            }
            (
                Status::Created,
                Json(json!({
                    "message": "Contact form submitted successfully",
                    "id": id,
                })),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[get("/contact")]
pub fn list(pool: &State<DbPool>, _admin: AdminUser) -> Json<Vec<Contact>> {
    Json(Contact::list(pool))
}

#[get("/contact/<id>")]
pub fn get(pool: &State<DbPool>, _admin: AdminUser, id: i64) -> Option<Json<Contact>> {
    Contact::find_by_id(pool, id).map(Json)
}

#[put("/contact/<id>/read")]
pub fn mark_read(pool: &State<DbPool>, _admin: AdminUser, id: i64) -> (Status, Json<Value>) {
    if Contact::find_by_id(pool, id).is_none() {
        return (
            Status::NotFound,
            Json(json!({"message": "Contact not found"})),
        );
    }
    match Contact::mark_read(pool, id) {
        Ok(contact) => (
            Status::Ok,
            Json(serde_json::to_value(&contact).unwrap_or(Value::Null)),
        ),
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[delete("/contact/<id>")]
pub fn delete(pool: &State<DbPool>, admin: AdminUser, id: i64) -> (Status, Json<Value>) {
    let contact = match Contact::find_by_id(pool, id) {
        Some(c) => c,
        None => {
            return (
                Status::NotFound,
                Json(json!({"message": "Contact not found"})),
            )
        }
    };

    let snapshot = serde_json::to_value(&contact).unwrap_or(Value::Null);

    match Contact::delete(pool, id) {
        Ok(()) => {
            ActivityEntry::log(
                pool,
                "delete",
                "contact",
                Some(id),
                Some(&format!("Contact from {}", contact.name)),
                &admin.username,
                Some(&snapshot),
            );
            (
                Status::Ok,
                Json(json!({
                    "message": "Contact deleted successfully",
                    "deleted_data": snapshot,
                })),
            )
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![create, list, get, mark_read, delete]
}
