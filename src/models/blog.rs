use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

use super::project::split_csv;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub banner_image_url: Option<String>,
    pub content: String,
    pub author: String,
    pub published: bool,
    pub featured: bool,
    pub show_on_homepage: bool,
    pub tags: Vec<String>,
    pub reading_time: Option<i64>,
    pub views: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub published_at: Option<NaiveDateTime>,
}

/// Tags arrive either as an array or a comma-joined string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagList {
    List(Vec<String>),
    Csv(String),
}

impl TagList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            TagList::List(v) => v,
            TagList::Csv(s) => split_csv(&s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BlogForm {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub banner_image_url: Option<String>,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub show_on_homepage: bool,
    #[serde(default)]
    pub tags: Option<TagList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlogPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub banner_image_url: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published: Option<bool>,
    pub featured: Option<bool>,
    pub show_on_homepage: Option<bool>,
    pub tags: Option<TagList>,
}

/// Estimated reading time in minutes at ~200 words per minute,
/// measured over the tag-stripped content. Always at least one minute.
pub fn reading_time(content: &str) -> i64 {
    let text = match Regex::new(r"<[^>]+>") {
        Ok(re) => re.replace_all(content, " ").into_owned(),
        Err(_) => content.to_string(),
    };
    let words = text.split_whitespace().count() as f64;
    ((words / 200.0).round() as i64).max(1)
}

impl Blog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let published: i64 = row.get("published")?;
        let featured: i64 = row.get("featured")?;
        let homepage: i64 = row.get("show_on_homepage")?;
        let tags: Option<String> = row.get("tags")?;
        Ok(Blog {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            excerpt: row.get("excerpt")?,
            banner_image_url: row.get("banner_image_url")?,
            content: row.get("content")?,
            author: row.get("author")?,
            published: published != 0,
            featured: featured != 0,
            show_on_homepage: homepage != 0,
            tags: tags.map(|t| split_csv(&t)).unwrap_or_default(),
            reading_time: row.get("reading_time")?,
            views: row.get("views")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            published_at: row.get("published_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM blogs WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM blogs WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Public listing: published (and optionally homepage-flagged) posts,
    /// most recently published first.
    pub fn list(pool: &DbPool, published_only: bool, homepage_only: bool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut sql = "SELECT * FROM blogs WHERE 1=1".to_string();
        if published_only {
            sql.push_str(" AND published = 1");
        }
        if homepage_only {
            sql.push_str(" AND show_on_homepage = 1");
        }
        sql.push_str(" ORDER BY published_at DESC, created_at DESC");

        let mut stmt = match conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Admin listing: everything including drafts, newest first.
    pub fn list_all(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare("SELECT * FROM blogs ORDER BY created_at DESC") {
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
        conn.query_row("SELECT COUNT(*) FROM blogs", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &BlogForm, default_author: &str) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        // Slug from the form, or slugified title; collisions get a
        // timestamp suffix so the unique constraint never trips.
        let mut post_slug = form
            .slug
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slug::slugify(&form.title));
        let exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM blogs WHERE slug = ?1",
                params![post_slug],
                |row| row.get(0),
            )
            .map_err(|e| e.to_string())?;
        if exists > 0 {
            post_slug = format!("{}-{}", post_slug, Utc::now().format("%Y%m%d%H%M%S"));
        }

        let minutes = reading_time(&form.content);
        let tags = form.tags.clone().map(|t| t.into_vec()).unwrap_or_default();
        let published_at: Option<NaiveDateTime> =
            form.published.then(|| Utc::now().naive_utc());

        conn.execute(
            "INSERT INTO blogs (title, slug, excerpt, banner_image_url, content, author,
             published, featured, show_on_homepage, tags, reading_time, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                form.title,
                post_slug,
                form.excerpt,
                form.banner_image_url,
                form.content,
                form.author.as_deref().unwrap_or(default_author),
                form.published as i64,
                form.featured as i64,
                form.show_on_homepage as i64,
                tags.join(","),
                minutes,
                published_at,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, patch: &BlogPatch) -> Result<Self, String> {
        let current = Self::find_by_id(pool, id).ok_or_else(|| "Blog not found".to_string())?;
        let conn = pool.get().map_err(|e| e.to_string())?;

        let minutes = match patch.content.as_ref() {
            Some(content) => Some(reading_time(content)),
            None => current.reading_time,
        };
        let tags = patch
            .tags
            .clone()
            .map(|t| t.into_vec())
            .unwrap_or(current.tags);
        let published = patch.published.unwrap_or(current.published);
        // Stamp publication time only on the draft -> published transition
        let published_at = if published && !current.published {
            Some(Utc::now().naive_utc())
        } else {
            current.published_at
        };

        conn.execute(
            "UPDATE blogs SET title=?1, slug=?2, excerpt=?3, banner_image_url=?4, content=?5,
             author=?6, published=?7, featured=?8, show_on_homepage=?9, tags=?10,
             reading_time=?11, published_at=?12, updated_at=CURRENT_TIMESTAMP WHERE id=?13",
            params![
                patch.title.as_ref().unwrap_or(&current.title),
                patch.slug.as_ref().unwrap_or(&current.slug),
                patch.excerpt.as_ref().or(current.excerpt.as_ref()),
                patch
                    .banner_image_url
                    .as_ref()
                    .or(current.banner_image_url.as_ref()),
                patch.content.as_ref().unwrap_or(&current.content),
                patch.author.as_ref().unwrap_or(&current.author),
                published as i64,
                patch.featured.unwrap_or(current.featured) as i64,
                patch.show_on_homepage.unwrap_or(current.show_on_homepage) as i64,
                tags.join(","),
                minutes,
                published_at,
                id,
            ],
        )
        .map_err(|e| e.to_string())?;

        Self::find_by_id(pool, id).ok_or_else(|| "Blog not found".to_string())
    }

    pub fn increment_views(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE blogs SET views = views + 1 WHERE id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM comment_likes WHERE comment_id IN
             (SELECT id FROM blog_comments WHERE blog_id = ?1)",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM blog_comments WHERE blog_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM blog_likes WHERE blog_id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM blogs WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

// ── Blog likes ─────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogLike {
    pub id: i64,
    pub blog_id: i64,
    pub user_ip: Option<String>,
    #[serde(skip_serializing)]
    pub user_agent: Option<String>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

impl BlogLike {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let read: i64 = row.get("read")?;
        Ok(BlogLike {
            id: row.get("id")?,
            blog_id: row.get("blog_id")?,
            user_ip: row.get("user_ip")?,
            user_agent: row.get("user_agent")?,
            read: read != 0,
            created_at: row.get("created_at")?,
        })
    }

    /// Record a like; one per requester IP per post. Returns whether a new
    /// like was created and the current count. There is no unlike.
    pub fn like(pool: &DbPool, blog_id: i64, ip: &str, ua: &str) -> Result<(bool, i64), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        let already: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM blog_likes WHERE blog_id = ?1 AND user_ip = ?2",
                params![blog_id, ip],
                |row| row.get(0),
            )
            .map_err(|e| e.to_string())?;

        if already > 0 {
            return Ok((false, Self::count(pool, blog_id)));
        }

        conn.execute(
            "INSERT OR IGNORE INTO blog_likes (blog_id, user_ip, user_agent) VALUES (?1, ?2, ?3)",
            params![blog_id, ip, ua],
        )
        .map_err(|e| e.to_string())?;

        Ok((true, Self::count(pool, blog_id)))
    }

    pub fn count(pool: &DbPool, blog_id: i64) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM blog_likes WHERE blog_id = ?1",
            params![blog_id],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn liked_by(pool: &DbPool, blog_id: i64, ip: &str) -> bool {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return false,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM blog_likes WHERE blog_id = ?1 AND user_ip = ?2",
            params![blog_id, ip],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c > 0)
        .unwrap_or(false)
    }

    pub fn unread_count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM blog_likes WHERE read = 0",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn recent_unread(pool: &DbPool, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn
            .prepare("SELECT * FROM blog_likes WHERE read = 0 ORDER BY created_at DESC LIMIT ?1")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map(params![limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn mark_all_read(pool: &DbPool) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("UPDATE blog_likes SET read = 1 WHERE read = 0", [])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
