use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub proficiency: i64,
    pub icon: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct SkillForm {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub proficiency: i64,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub proficiency: Option<i64>,
    pub icon: Option<String>,
}

impl Skill {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Skill {
            id: row.get("id")?,
            name: row.get("name")?,
            category: row.get("category")?,
            proficiency: row.get("proficiency")?,
            icon: row.get("icon")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM skills WHERE id = ?1",
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

        let mut stmt = match conn.prepare("SELECT * FROM skills ORDER BY id") {
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
        conn.query_row("SELECT COUNT(*) FROM skills", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &SkillForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO skills (name, category, proficiency, icon) VALUES (?1, ?2, ?3, ?4)",
            params![form.name, form.category, form.proficiency, form.icon],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, patch: &SkillPatch) -> Result<Self, String> {
        let current = Self::find_by_id(pool, id).ok_or_else(|| "Skill not found".to_string())?;
        let conn = pool.get().map_err(|e| e.to_string())?;

        conn.execute(
            "UPDATE skills SET name=?1, category=?2, proficiency=?3, icon=?4 WHERE id=?5",
            params![
                patch.name.as_ref().unwrap_or(&current.name),
                patch.category.as_ref().or(current.category.as_ref()),
                patch.proficiency.unwrap_or(current.proficiency),
                patch.icon.as_ref().or(current.icon.as_ref()),
                id,
            ],
        )
        .map_err(|e| e.to_string())?;

        Self::find_by_id(pool, id).ok_or_else(|| "Skill not found".to_string())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM skills WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
