use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Database file location, overridable for deployments with a mounted volume.
pub fn database_path() -> String {
    std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/folio.db".to_string())
}

pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file(database_path());
    let pool = Pool::builder().max_size(10).build(manager)?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Portfolio projects
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            detailed_description TEXT,
            technologies TEXT NOT NULL DEFAULT '',
            github_url TEXT,
            live_url TEXT,
            image_url TEXT,
            screenshots TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- About (single row)
        CREATE TABLE IF NOT EXISTS about (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            title TEXT,
            bio TEXT,
            email TEXT,
            github_url TEXT,
            linkedin_url TEXT,
            twitter_url TEXT,
            profile_image_url TEXT,
            hero_top_skills TEXT,
            hero_short_description TEXT,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Skills
        CREATE TABLE IF NOT EXISTS skills (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT,
            proficiency INTEGER NOT NULL DEFAULT 0,
            icon TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Work experience (timeline)
        CREATE TABLE IF NOT EXISTS experience (
            id INTEGER PRIMARY KEY,
            company TEXT NOT NULL,
            position TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            location TEXT,
            short_description TEXT,
            detailed_description TEXT,
            technologies TEXT,
            company_logo_url TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Contact form submissions
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            subject TEXT,
            message TEXT NOT NULL,
            read INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Admin activity trail. Rows are append-only; the undone flag is
        -- flipped once when a delete is restored.
        CREATE TABLE IF NOT EXISTS activity_log (
            id INTEGER PRIMARY KEY,
            action TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id INTEGER,
            entity_name TEXT,
            admin_user TEXT NOT NULL,
            data_snapshot TEXT,
            undone INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- GitHub section configuration (single row)
        CREATE TABLE IF NOT EXISTS github_settings (
            id INTEGER PRIMARY KEY,
            github_username TEXT,
            github_token TEXT,
            enabled INTEGER NOT NULL DEFAULT 0,
            selected_repos TEXT,
            last_sync DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Blog posts
        CREATE TABLE IF NOT EXISTS blogs (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            excerpt TEXT,
            banner_image_url TEXT,
            content TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT 'Admin',
            published INTEGER NOT NULL DEFAULT 0,
            featured INTEGER NOT NULL DEFAULT 0,
            show_on_homepage INTEGER NOT NULL DEFAULT 0,
            tags TEXT,
            reading_time INTEGER,
            views INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            published_at DATETIME
        );

        -- Blog likes, one per requester IP per post
        CREATE TABLE IF NOT EXISTS blog_likes (
            id INTEGER PRIMARY KEY,
            blog_id INTEGER NOT NULL,
            user_ip TEXT,
            user_agent TEXT,
            read INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(blog_id, user_ip),
            FOREIGN KEY (blog_id) REFERENCES blogs(id)
        );

        -- Blog comments, threaded one level via parent_id
        CREATE TABLE IF NOT EXISTS blog_comments (
            id INTEGER PRIMARY KEY,
            blog_id INTEGER NOT NULL,
            parent_id INTEGER,
            author_name TEXT NOT NULL,
            author_email TEXT,
            content TEXT NOT NULL,
            user_ip TEXT,
            user_agent TEXT,
            approved INTEGER NOT NULL DEFAULT 1,
            like_count INTEGER NOT NULL DEFAULT 0,
            read INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (blog_id) REFERENCES blogs(id),
            FOREIGN KEY (parent_id) REFERENCES blog_comments(id)
        );

        -- Comment likes, one per requester IP per comment
        CREATE TABLE IF NOT EXISTS comment_likes (
            id INTEGER PRIMARY KEY,
            comment_id INTEGER NOT NULL,
            user_ip TEXT,
            user_agent TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(comment_id, user_ip),
            FOREIGN KEY (comment_id) REFERENCES blog_comments(id)
        );

        -- Visitor interaction events
        CREATE TABLE IF NOT EXISTS analytics (
            id INTEGER PRIMARY KEY,
            session_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            section TEXT,
            item_id INTEGER,
            item_name TEXT,
            ip_address TEXT,
            user_agent TEXT,
            country TEXT,
            city TEXT,
            referrer TEXT,
            duration INTEGER,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_analytics_session ON analytics(session_id);
        CREATE INDEX IF NOT EXISTS idx_analytics_event ON analytics(event_type);
        CREATE INDEX IF NOT EXISTS idx_analytics_date ON analytics(created_at);
        CREATE INDEX IF NOT EXISTS idx_analytics_country ON analytics(country);

        -- Admin sessions
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            ip_address TEXT,
            user_agent TEXT
        );

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );
        ",
    )?;

    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // Admin account
        ("admin_username", env_or("ADMIN_USERNAME", "admin")),
        ("session_expiry_hours", "24".to_string()),
        ("login_rate_limit", "5".to_string()),
        // CORS
        (
            "cors_origins",
            env_or(
                "CORS_ORIGINS",
                "http://localhost:3000,http://localhost:5173",
            ),
        ),
        // Contact notification email
        ("mail_smtp_host", env_or("MAIL_SMTP_HOST", "smtp.gmail.com")),
        ("mail_smtp_port", env_or("MAIL_SMTP_PORT", "587")),
        ("mail_username", env_or("MAIL_USERNAME", "")),
        ("mail_password", env_or("MAIL_PASSWORD", "")),
        ("mail_from", env_or("MAIL_FROM", "")),
        ("admin_email", env_or("ADMIN_EMAIL", "")),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    // Seed admin password if not set
    let admin_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key = 'admin_password_hash'",
        [],
        |row| row.get(0),
    )?;

    if admin_exists == 0 {
        // Default password: "admin123" — override with ADMIN_PASSWORD
        let password = env_or("ADMIN_PASSWORD", "admin123");
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            params![hash],
        )?;
    }

    Ok(())
}
