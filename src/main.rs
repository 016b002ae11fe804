#[macro_use]
extern crate rocket;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use serde_json::{json, Value};

mod auth;
mod boot;
mod db;
mod email;
mod geo;
mod github;
mod models;
mod rate_limit;
mod routes;

#[cfg(test)]
mod tests;

use db::DbPool;
use models::settings::Setting;
use rate_limit::RateLimiter;

/// Adds CORS headers for origins listed in the cors_origins setting.
/// The frontend is served from a different host, so every API response
/// needs these.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS Headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let origin = match req.headers().get_one("Origin") {
            Some(o) => o.to_string(),
            None => return,
        };

        let allowed = match req.rocket().state::<DbPool>() {
            Some(pool) => Setting::get_or(pool, "cors_origins", ""),
            None => return,
        };

        if allowed.split(',').any(|o| o.trim() == origin) {
            res.set_header(Header::new("Access-Control-Allow-Origin", origin));
            res.set_header(Header::new("Vary", "Origin"));
            res.set_header(Header::new(
                "Access-Control-Allow-Methods",
                "GET, POST, PUT, DELETE, OPTIONS",
            ));
            res.set_header(Header::new(
                "Access-Control-Allow-Headers",
                "Authorization, Content-Type",
            ));
        }
    }
}

/// Answers CORS preflight for every API path.
#[options("/<_..>")]
fn preflight() -> Status {
    Status::NoContent
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({"message": "Missing or invalid authorization"}))
}

#[catch(404)]
fn not_found() -> Json<Value> {
    Json(json!({"message": "Not found"}))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    Json(json!({"message": "Malformed request body"}))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(json!({"message": "Internal server error"}))
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check — verify/create the data directory before touching the DB
    boot::run();

    let pool = db::init_pool().expect("Failed to initialize database pool");
    db::run_migrations(&pool).expect("Failed to run database migrations");
    db::seed_defaults(&pool).expect("Failed to seed default settings");

    if let Err(e) = auth::cleanup_expired_sessions(&pool) {
        log::warn!("Session cleanup failed: {}", e);
    }

    let api_routes: Vec<rocket::Route> = [
        routes![preflight],
        routes::auth::routes(),
        routes::projects::routes(),
        routes::about::routes(),
        routes::skills::routes(),
        routes::experience::routes(),
        routes::contact::routes(),
        routes::activity::routes(),
        routes::analytics::routes(),
        routes::github::routes(),
        routes::blogs::routes(),
        routes::notifications::routes(),
        routes::health::routes(),
    ]
    .into_iter()
    .flatten()
    .collect();

    rocket::build()
        .manage(pool)
        .manage(RateLimiter::new())
        .attach(Cors)
        .mount("/api", api_routes)
        .register(
            "/",
            catchers![unauthorized, not_found, unprocessable, server_error],
        )
}
