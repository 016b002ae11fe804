use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Row};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::DbPool;

/// GitHub section configuration. Single row, created on first access.
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub id: i64,
    pub github_username: Option<String>,
    pub github_token: Option<String>,
    pub enabled: bool,
    pub selected_repos: Vec<String>,
    pub last_sync: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Selected repos arrive either as an array or a pre-encoded JSON string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RepoSelection {
    List(Vec<String>),
    Json(String),
}

impl RepoSelection {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            RepoSelection::List(v) => v,
            // Invalid JSON is treated as an empty selection
            RepoSelection::Json(s) => serde_json::from_str(&s).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GitHubSettingsPatch {
    pub github_username: Option<String>,
    pub github_token: Option<String>,
    pub enabled: Option<bool>,
    pub selected_repos: Option<RepoSelection>,
}

impl GitHubSettings {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let enabled: i64 = row.get("enabled")?;
        let selected: Option<String> = row.get("selected_repos")?;
        Ok(GitHubSettings {
            id: row.get("id")?,
            github_username: row.get("github_username")?,
            github_token: row.get("github_token")?,
            enabled: enabled != 0,
            selected_repos: selected
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            last_sync: row.get("last_sync")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find(pool: &DbPool) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM github_settings LIMIT 1", [], Self::from_row)
            .ok()
    }

    pub fn get_or_create(pool: &DbPool) -> Result<Self, String> {
        if let Some(settings) = Self::find(pool) {
            return Ok(settings);
        }
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("INSERT INTO github_settings DEFAULT VALUES", [])
            .map_err(|e| e.to_string())?;
        Self::find(pool).ok_or_else(|| "GitHub settings row missing".to_string())
    }

    pub fn update(pool: &DbPool, patch: &GitHubSettingsPatch) -> Result<Self, String> {
        let current = Self::get_or_create(pool)?;
        let conn = pool.get().map_err(|e| e.to_string())?;

        let selected = patch
            .selected_repos
            .clone()
            .map(|s| s.into_vec())
            .unwrap_or(current.selected_repos);
        let selected = serde_json::to_string(&selected).map_err(|e| e.to_string())?;

        conn.execute(
            "UPDATE github_settings SET github_username=?1, github_token=?2, enabled=?3,
             selected_repos=?4, updated_at=CURRENT_TIMESTAMP WHERE id=?5",
            params![
                patch
                    .github_username
                    .as_ref()
                    .or(current.github_username.as_ref()),
                patch
                    .github_token
                    .as_ref()
                    .or(current.github_token.as_ref()),
                patch.enabled.unwrap_or(current.enabled) as i64,
                selected,
                current.id,
            ],
        )
        .map_err(|e| e.to_string())?;

        Self::find(pool).ok_or_else(|| "GitHub settings row missing".to_string())
    }

    pub fn touch_last_sync(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE github_settings SET last_sync = ?1 WHERE id = ?2",
            params![Utc::now().naive_utc(), id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// JSON view with the token masked. The raw token never leaves the
    /// database through the API.
    pub fn safe_json(&self) -> Value {
        json!({
            "id": self.id,
            "github_username": self.github_username,
            "github_token": self.github_token.as_ref().map(|_| "***"),
            "enabled": self.enabled,
            "selected_repos": self.selected_repos,
            "last_sync": self.last_sync,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }
}
