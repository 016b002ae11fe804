use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub detailed_description: Option<String>,
    pub technologies: Vec<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub image_url: Option<String>,
    pub screenshots: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub detailed_description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
}

/// Partial update — absent fields keep their current values.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub detailed_description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub image_url: Option<String>,
    pub screenshots: Option<Vec<String>>,
}

pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_json_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

impl Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let technologies: String = row.get("technologies")?;
        Ok(Project {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            detailed_description: row.get("detailed_description")?,
            technologies: split_csv(&technologies),
            github_url: row.get("github_url")?,
            live_url: row.get("live_url")?,
            image_url: row.get("image_url")?,
            screenshots: parse_json_list(row.get("screenshots")?),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM projects WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare("SELECT * FROM projects ORDER BY created_at DESC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &ProjectForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        let screenshots = serde_json::to_string(&form.screenshots).map_err(|e| e.to_string())?;

        conn.execute(
            "INSERT INTO projects (title, description, detailed_description, technologies,
             github_url, live_url, image_url, screenshots)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                form.title,
                form.description,
                form.detailed_description,
                form.technologies.join(","),
                form.github_url,
                form.live_url,
                form.image_url,
                screenshots,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, patch: &ProjectPatch) -> Result<Self, String> {
        let current = Self::find_by_id(pool, id).ok_or_else(|| "Project not found".to_string())?;
        let conn = pool.get().map_err(|e| e.to_string())?;

        let technologies = patch
            .technologies
            .clone()
            .unwrap_or(current.technologies);
        let screenshots = patch.screenshots.clone().unwrap_or(current.screenshots);
        let screenshots = serde_json::to_string(&screenshots).map_err(|e| e.to_string())?;

        conn.execute(
            "UPDATE projects SET title=?1, description=?2, detailed_description=?3,
             technologies=?4, github_url=?5, live_url=?6, image_url=?7, screenshots=?8,
             updated_at=CURRENT_TIMESTAMP WHERE id=?9",
            params![
                patch.title.as_ref().unwrap_or(&current.title),
                patch.description.as_ref().unwrap_or(&current.description),
                patch
                    .detailed_description
                    .as_ref()
                    .or(current.detailed_description.as_ref()),
                technologies.join(","),
                patch.github_url.as_ref().or(current.github_url.as_ref()),
                patch.live_url.as_ref().or(current.live_url.as_ref()),
                patch.image_url.as_ref().or(current.image_url.as_ref()),
                screenshots,
                id,
            ],
        )
        .map_err(|e| e.to_string())?;

        Self::find_by_id(pool, id).ok_or_else(|| "Project not found".to_string())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM projects WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
