use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::Serialize;
use serde_json::Value;

use crate::db::DbPool;

use super::contact::{Contact, ContactForm};
use super::experience::{Experience, ExperienceForm};
use super::project::{Project, ProjectForm};
use super::skill::{Skill, SkillForm};

/// One admin action. Delete entries carry a full JSON snapshot of the row
/// so it can be restored; update entries carry `{old, new}` for audit only.
#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub entity_name: Option<String>,
    pub admin_user: String,
    pub data_snapshot: Option<Value>,
    pub undone: bool,
    #[serde(rename = "timestamp")]
    pub created_at: NaiveDateTime,
}

impl ActivityEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let undone: i64 = row.get("undone")?;
        let snapshot: Option<String> = row.get("data_snapshot")?;
        Ok(ActivityEntry {
            id: row.get("id")?,
            action: row.get("action")?,
            entity_type: row.get("entity_type")?,
            entity_id: row.get("entity_id")?,
            entity_name: row.get("entity_name")?,
            admin_user: row.get("admin_user")?,
            data_snapshot: snapshot.and_then(|s| serde_json::from_str(&s).ok()),
            undone: undone != 0,
            created_at: row.get("created_at")?,
        })
    }

    pub fn log(
        pool: &DbPool,
        action: &str,
        entity_type: &str,
        entity_id: Option<i64>,
        entity_name: Option<&str>,
        admin_user: &str,
        snapshot: Option<&Value>,
    ) {
        if let Ok(conn) = pool.get() {
            let snapshot_json = snapshot.map(|v| v.to_string());
            let _ = conn.execute(
                "INSERT INTO activity_log (action, entity_type, entity_id, entity_name, admin_user, data_snapshot)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![action, entity_type, entity_id, entity_name, admin_user, snapshot_json],
            );
        }
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM activity_log WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn
            .prepare("SELECT * FROM activity_log ORDER BY created_at DESC, id DESC LIMIT ?1")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map(params![limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM activity_log", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn mark_undone(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE activity_log SET undone = 1 WHERE id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Rebuild the deleted row from this entry's snapshot and insert it.
    /// The snapshot is the entity's own serialized form, so it feeds
    /// straight back through the entity's create path (a new id is
    /// assigned). Returns the restored row's id.
    pub fn restore(pool: &DbPool, entry: &ActivityEntry) -> Result<i64, String> {
        let snapshot = entry
            .data_snapshot
            .clone()
            .ok_or_else(|| "No data available to restore".to_string())?;

        match entry.entity_type.as_str() {
            "project" => {
                let form: ProjectForm =
                    serde_json::from_value(snapshot).map_err(|e| e.to_string())?;
                Project::create(pool, &form)
            }
            "skill" => {
                let form: SkillForm =
                    serde_json::from_value(snapshot).map_err(|e| e.to_string())?;
                Skill::create(pool, &form)
            }
            "experience" => {
                let form: ExperienceForm =
                    serde_json::from_value(snapshot).map_err(|e| e.to_string())?;
                Experience::create(pool, &form)
            }
            "contact" => {
                let form: ContactForm =
                    serde_json::from_value(snapshot).map_err(|e| e.to_string())?;
                Contact::create(pool, &form)
            }
            other => Err(format!("Entity type not supported for undo: {}", other)),
        }
    }
}
