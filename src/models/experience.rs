use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

use super::project::split_csv;

/// A work-history entry. Dates are free-form strings ("08/2023", "Present")
/// because the timeline renders them verbatim.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Experience {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub short_description: Option<String>,
    pub detailed_description: Option<String>,
    pub technologies: Vec<String>,
    pub company_logo_url: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ExperienceForm {
    pub company: String,
    pub position: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub detailed_description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub company_logo_url: Option<String>,
    #[serde(default, rename = "order")]
    pub sort_order: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExperiencePatch {
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub short_description: Option<String>,
    pub detailed_description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub company_logo_url: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: Option<i64>,
}

impl Experience {
    /// Display name used in the activity trail.
    pub fn display_name(&self) -> String {
        format!("{} at {}", self.position, self.company)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let technologies: Option<String> = row.get("technologies")?;
        Ok(Experience {
            id: row.get("id")?,
            company: row.get("company")?,
            position: row.get("position")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            location: row.get("location")?,
            short_description: row.get("short_description")?,
            detailed_description: row.get("detailed_description")?,
            technologies: technologies.map(|t| split_csv(&t)).unwrap_or_default(),
            company_logo_url: row.get("company_logo_url")?,
            sort_order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM experience WHERE id = ?1",
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

        let mut stmt = match conn
            .prepare("SELECT * FROM experience ORDER BY sort_order DESC, start_date DESC")
        {
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
        conn.query_row("SELECT COUNT(*) FROM experience", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &ExperienceForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        conn.execute(
            "INSERT INTO experience (company, position, start_date, end_date, location,
             short_description, detailed_description, technologies, company_logo_url, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                form.company,
                form.position,
                form.start_date,
                form.end_date.as_deref().unwrap_or("Present"),
                form.location,
                form.short_description,
                form.detailed_description,
                form.technologies.join(","),
                form.company_logo_url,
                form.sort_order,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, patch: &ExperiencePatch) -> Result<Self, String> {
        let current =
            Self::find_by_id(pool, id).ok_or_else(|| "Experience not found".to_string())?;
        let conn = pool.get().map_err(|e| e.to_string())?;

        let technologies = patch
            .technologies
            .clone()
            .unwrap_or(current.technologies);

        conn.execute(
            "UPDATE experience SET company=?1, position=?2, start_date=?3, end_date=?4,
             location=?5, short_description=?6, detailed_description=?7, technologies=?8,
             company_logo_url=?9, sort_order=?10, updated_at=CURRENT_TIMESTAMP WHERE id=?11",
            params![
                patch.company.as_ref().unwrap_or(&current.company),
                patch.position.as_ref().unwrap_or(&current.position),
                patch.start_date.as_ref().unwrap_or(&current.start_date),
                patch.end_date.as_ref().or(current.end_date.as_ref()),
                patch.location.as_ref().or(current.location.as_ref()),
                patch
                    .short_description
                    .as_ref()
                    .or(current.short_description.as_ref()),
                patch
                    .detailed_description
                    .as_ref()
                    .or(current.detailed_description.as_ref()),
                technologies.join(","),
                patch
                    .company_logo_url
                    .as_ref()
                    .or(current.company_logo_url.as_ref()),
                patch.sort_order.unwrap_or(current.sort_order),
                id,
            ],
        )
        .map_err(|e| e.to_string())?;

        Self::find_by_id(pool, id).ok_or_else(|| "Experience not found".to_string())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM experience WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
