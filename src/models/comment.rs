use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BlogComment {
    pub id: i64,
    pub blog_id: i64,
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub author_email: Option<String>,
    pub content: String,
    #[serde(skip_serializing)]
    pub user_ip: Option<String>,
    #[serde(skip_serializing)]
    pub user_agent: Option<String>,
    pub approved: bool,
    pub like_count: i64,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

/// A top-level comment with its direct replies, as the public endpoint
/// returns them.
#[derive(Debug, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: BlogComment,
    pub replies: Vec<BlogComment>,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub author_name: String,
    #[serde(default)]
    pub author_email: Option<String>,
    pub content: String,
}

impl BlogComment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let approved: i64 = row.get("approved")?;
        let read: i64 = row.get("read")?;
        Ok(BlogComment {
            id: row.get("id")?,
            blog_id: row.get("blog_id")?,
            parent_id: row.get("parent_id")?,
            author_name: row.get("author_name")?,
            author_email: row.get("author_email")?,
            content: row.get("content")?,
            user_ip: row.get("user_ip")?,
            user_agent: row.get("user_agent")?,
            approved: approved != 0,
            like_count: row.get("like_count")?,
            read: read != 0,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM blog_comments WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    /// Approved top-level comments for a post, oldest first, each carrying
    /// its approved replies.
    pub fn for_blog(pool: &DbPool, blog_id: i64) -> Vec<CommentThread> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare(
            "SELECT * FROM blog_comments
             WHERE blog_id = ?1 AND approved = 1 AND parent_id IS NULL
             ORDER BY created_at ASC, id ASC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let top_level: Vec<BlogComment> = stmt
            .query_map(params![blog_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default();

        top_level
            .into_iter()
            .map(|comment| {
                let replies = Self::replies(pool, comment.id);
                CommentThread { comment, replies }
            })
            .collect()
    }

    pub fn replies(pool: &DbPool, parent_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut stmt = match conn.prepare(
            "SELECT * FROM blog_comments
             WHERE parent_id = ?1 AND approved = 1
             ORDER BY created_at ASC, id ASC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map(params![parent_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, blog_id: i64) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM blog_comments WHERE blog_id = ?1",
            params![blog_id],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn create(
        pool: &DbPool,
        blog_id: i64,
        form: &CommentForm,
        ip: &str,
        ua: &str,
    ) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        // Comments are auto-approved; the approved column exists so
        // moderation can be turned on without a schema change.
        conn.execute(
            "INSERT INTO blog_comments (blog_id, parent_id, author_name, author_email, content,
             user_ip, user_agent, approved)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
            params![
                blog_id,
                form.parent_id,
                form.author_name,
                form.author_email,
                form.content,
                ip,
                ua,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    pub fn unread_count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM blog_comments WHERE read = 0 AND approved = 1",
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

        let mut stmt = match conn.prepare(
            "SELECT * FROM blog_comments WHERE read = 0 AND approved = 1
             ORDER BY created_at DESC LIMIT ?1",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        stmt.query_map(params![limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn mark_all_read(pool: &DbPool) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("UPDATE blog_comments SET read = 1 WHERE read = 0", [])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

// ── Comment likes ──────────────────────────────────────

pub struct CommentLike;

impl CommentLike {
    /// Toggle a like for the requester IP. Returns (liked, count) where
    /// `liked` reflects the state after the toggle. The cached like_count
    /// on the comment is kept in step and never drops below zero.
    pub fn toggle(
        pool: &DbPool,
        comment_id: i64,
        ip: &str,
        ua: &str,
    ) -> Result<(bool, i64), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;

        let existing: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?1 AND user_ip = ?2",
                params![comment_id, ip],
                |row| row.get(0),
            )
            .map_err(|e| e.to_string())?;

        if existing > 0 {
            conn.execute(
                "DELETE FROM comment_likes WHERE comment_id = ?1 AND user_ip = ?2",
                params![comment_id, ip],
            )
            .map_err(|e| e.to_string())?;
            conn.execute(
                "UPDATE blog_comments SET like_count = MAX(0, like_count - 1) WHERE id = ?1",
                params![comment_id],
            )
            .map_err(|e| e.to_string())?;
            return Ok((false, Self::count(pool, comment_id)));
        }

        conn.execute(
            "INSERT OR IGNORE INTO comment_likes (comment_id, user_ip, user_agent)
             VALUES (?1, ?2, ?3)",
            params![comment_id, ip, ua],
        )
        .map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE blog_comments SET like_count = like_count + 1 WHERE id = ?1",
            params![comment_id],
        )
        .map_err(|e| e.to_string())?;

        Ok((true, Self::count(pool, comment_id)))
    }

    pub fn count(pool: &DbPool, comment_id: i64) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?1",
            params![comment_id],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    pub fn liked_by(pool: &DbPool, comment_id: i64, ip: &str) -> bool {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return false,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?1 AND user_ip = ?2",
            params![comment_id, ip],
            |row| row.get::<_, i64>(0),
        )
        .map(|c| c > 0)
        .unwrap_or(false)
    }
}
