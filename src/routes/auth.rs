use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, ClientIp, UserAgent};
use crate::db::DbPool;
use crate::models::settings::Setting;
use crate::rate_limit::RateLimiter;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[post("/login", format = "json", data = "<form>")]
pub fn login(
    pool: &State<DbPool>,
    limiter: &State<RateLimiter>,
    form: Json<LoginForm>,
    client_ip: ClientIp,
    user_agent: UserAgent,
) -> (Status, Json<Value>) {
    let rate_key = format!("login:{}", client_ip.0);
    let max_attempts = Setting::get_i64(pool, "login_rate_limit").max(1) as u64;
    let window = std::time::Duration::from_secs(15 * 60);

    if !limiter.check_and_record(&rate_key, max_attempts, window) {
        return (
            Status::TooManyRequests,
            Json(json!({"message": "Too many login attempts. Please try again in 15 minutes."})),
        );
    }

    let admin_username = Setting::get_or(pool, "admin_username", "admin");
    let password_hash = Setting::get_or(pool, "admin_password_hash", "");

    if form.username != admin_username
        || password_hash.is_empty()
        || !auth::verify_password(&form.password, &password_hash)
    {
        return (
            Status::Unauthorized,
            Json(json!({"message": "Invalid credentials"})),
        );
    }

    match auth::create_session(pool, Some(&client_ip.0), Some(&user_agent.0)) {
        Ok(token) => (Status::Ok, Json(json!({"access_token": token}))),
        Err(e) => {
            log::error!("Session creation failed: {}", e);
            (
                Status::InternalServerError,
                Json(json!({"message": "Session creation failed"})),
            )
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login]
}
