use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::github::{self, FetchError};
use crate::models::activity::ActivityEntry;
use crate::models::github_settings::{GitHubSettings, GitHubSettingsPatch};

#[get("/github/settings")]
pub fn get_settings(pool: &State<DbPool>, _admin: AdminUser) -> (Status, Json<Value>) {
    match GitHubSettings::get_or_create(pool) {
        Ok(settings) => (Status::Ok, Json(settings.safe_json())),
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[get("/github/settings/public")]
pub fn get_settings_public(pool: &State<DbPool>) -> Json<Value> {
    let enabled = GitHubSettings::find(pool)
        .map(|s| s.enabled)
        .unwrap_or(false);
    Json(json!({"enabled": enabled}))
}

#[put("/github/settings", format = "json", data = "<patch>")]
pub fn update_settings(
    pool: &State<DbPool>,
    admin: AdminUser,
    patch: Json<GitHubSettingsPatch>,
) -> (Status, Json<Value>) {
    let old = GitHubSettings::find(pool)
        .map(|s| s.safe_json())
        .unwrap_or_else(|| json!({}));

    match GitHubSettings::update(pool, &patch) {
        Ok(settings) => {
            let new = settings.safe_json();
            ActivityEntry::log(
                pool,
                "update",
                "github_settings",
                Some(settings.id),
                Some("GitHub Settings"),
                &admin.username,
                Some(&json!({"old": old, "new": new})),
            );
            (Status::Ok, Json(new))
        }
        Err(e) => (Status::InternalServerError, Json(json!({"message": e}))),
    }
}

#[get("/github/repos")]
pub fn fetch_repos(pool: &State<DbPool>, _admin: AdminUser) -> (Status, Json<Value>) {
    let settings = match GitHubSettings::find(pool) {
        Some(s) => s,
        None => {
            return (
                Status::BadRequest,
                Json(json!({
                    "message": "GitHub settings not found. Please configure GitHub settings first."
                })),
            )
        }
    };

    let username = match settings.github_username.as_deref().filter(|u| !u.is_empty()) {
        Some(u) => u,
        None => {
            return (
                Status::BadRequest,
                Json(json!({
                    "message": "GitHub username not configured. Please enter your GitHub username in settings."
                })),
            )
        }
    };

    match github::fetch_user_repos(username, settings.github_token.as_deref()) {
        Ok(repos) => {
            if let Err(e) = GitHubSettings::touch_last_sync(pool, settings.id) {
                log::warn!("Failed to stamp GitHub last_sync: {}", e);
            }
            (Status::Ok, Json(json!({"repos": repos})))
        }
        Err(FetchError::Status(code)) => (
            Status::new(code),
            Json(json!({"message": format!("GitHub API error: {}", code)})),
        ),
        Err(FetchError::Request(e)) => {
            log::warn!("GitHub repos fetch failed: {}", e);
            (
                Status::InternalServerError,
                Json(json!({"message": format!("Error fetching repos: {}", e)})),
            )
        }
    }
}

/// Public repo listing. Never errors at the HTTP level — the frontend
/// renders or hides the section based on the error field.
#[get("/github/repos/public")]
pub fn fetch_repos_public(pool: &State<DbPool>) -> Json<Value> {
    let settings = match GitHubSettings::find(pool) {
        Some(s) => s,
        None => {
            return Json(json!({"repos": [], "error": "GitHub settings not configured"}));
        }
    };

    if !settings.enabled {
        return Json(json!({"repos": [], "error": "GitHub section is disabled"}));
    }

    let username = match settings.github_username.as_deref().filter(|u| !u.is_empty()) {
        Some(u) => u,
        None => {
            return Json(json!({"repos": [], "error": "GitHub username not configured"}));
        }
    };

    if settings.selected_repos.is_empty() {
        return Json(json!({
            "repos": [],
            "error": "No repositories selected. Please select repositories in admin settings."
        }));
    }

    match github::fetch_user_repos(username, settings.github_token.as_deref()) {
        Ok(repos) => {
            let selected = github::filter_selected(repos, &settings.selected_repos);
            Json(json!({"repos": selected}))
        }
        Err(e) => {
            let message = e.public_message();
            log::warn!("GitHub public repos fetch failed: {}", message);
            Json(json!({"repos": [], "error": message}))
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        get_settings,
        get_settings_public,
        update_settings,
        fetch_repos,
        fetch_repos_public
    ]
}
