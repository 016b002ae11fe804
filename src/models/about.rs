use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

use super::project::split_csv;

/// Profile information. The table holds at most one row, created on the
/// first admin write.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct About {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub hero_top_skills: Vec<String>,
    pub hero_short_description: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// Hero skills arrive either as an array or a comma-joined string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillList {
    List(Vec<String>),
    Csv(String),
}

impl SkillList {
    /// Normalized list, capped at the five slots the hero section shows.
    pub fn into_vec(self) -> Vec<String> {
        let items = match self {
            SkillList::List(v) => v,
            SkillList::Csv(s) => split_csv(&s),
        };
        items.into_iter().take(5).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AboutPatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub hero_top_skills: Option<SkillList>,
    pub hero_short_description: Option<String>,
}

impl About {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let hero: Option<String> = row.get("hero_top_skills")?;
        Ok(About {
            id: row.get("id")?,
            name: row.get("name")?,
            title: row.get("title")?,
            bio: row.get("bio")?,
            email: row.get("email")?,
            github_url: row.get("github_url")?,
            linkedin_url: row.get("linkedin_url")?,
            twitter_url: row.get("twitter_url")?,
            profile_image_url: row.get("profile_image_url")?,
            hero_top_skills: hero.map(|h| split_csv(&h)).unwrap_or_default(),
            hero_short_description: row.get("hero_short_description")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get(pool: &DbPool) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM about LIMIT 1", [], Self::from_row)
            .ok()
    }

    /// Apply a partial update, creating the singleton row first if needed.
    pub fn upsert(pool: &DbPool, patch: &AboutPatch) -> Result<Self, String> {
        if Self::get(pool).is_none() {
            let conn = pool.get().map_err(|e| e.to_string())?;
            conn.execute("INSERT INTO about (name) VALUES ('')", [])
                .map_err(|e| e.to_string())?;
        }
        let current = Self::get(pool).ok_or_else(|| "About row missing".to_string())?;
        let conn = pool.get().map_err(|e| e.to_string())?;

        let hero = patch
            .hero_top_skills
            .clone()
            .map(|s| s.into_vec())
            .unwrap_or(current.hero_top_skills);

        conn.execute(
            "UPDATE about SET name=?1, title=?2, bio=?3, email=?4, github_url=?5,
             linkedin_url=?6, twitter_url=?7, profile_image_url=?8, hero_top_skills=?9,
             hero_short_description=?10, updated_at=CURRENT_TIMESTAMP WHERE id=?11",
            params![
                patch.name.as_ref().unwrap_or(&current.name),
                patch.title.as_ref().or(current.title.as_ref()),
                patch.bio.as_ref().or(current.bio.as_ref()),
                patch.email.as_ref().or(current.email.as_ref()),
                patch.github_url.as_ref().or(current.github_url.as_ref()),
                patch.linkedin_url.as_ref().or(current.linkedin_url.as_ref()),
                patch.twitter_url.as_ref().or(current.twitter_url.as_ref()),
                patch
                    .profile_image_url
                    .as_ref()
                    .or(current.profile_image_url.as_ref()),
                hero.join(","),
                patch
                    .hero_short_description
                    .as_ref()
                    .or(current.hero_short_description.as_ref()),
                current.id,
            ],
        )
        .map_err(|e| e.to_string())?;

        Self::get(pool).ok_or_else(|| "About row missing".to_string())
    }
}
