#![cfg(test)]

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::json;

use crate::auth;
use crate::db::{run_migrations, seed_defaults, DbPool};
use crate::github::{filter_selected, RepoSummary};
use crate::models::about::{About, AboutPatch, SkillList};
use crate::models::activity::ActivityEntry;
use crate::models::analytics::AnalyticsEvent;
use crate::models::blog::{reading_time, Blog, BlogForm, BlogLike, BlogPatch, TagList};
use crate::models::comment::{BlogComment, CommentForm, CommentLike};
use crate::models::contact::{Contact, ContactForm};
use crate::models::experience::{Experience, ExperienceForm, ExperiencePatch};
use crate::models::github_settings::{GitHubSettings, GitHubSettingsPatch, RepoSelection};
use crate::models::project::{split_csv, Project, ProjectForm, ProjectPatch};
use crate::models::settings::Setting;
use crate::models::skill::{Skill, SkillForm, SkillPatch};
use crate::rate_limit::RateLimiter;

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Create a fresh in-memory SQLite pool with all migrations + seed defaults applied.
/// Uses a named shared-cache in-memory DB so multiple connections see the same data.
/// Pre-seeds admin_password_hash with a fast bcrypt hash to avoid the expensive
/// DEFAULT_COST hash in seed_defaults (which can take 60s+ in debug builds).
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:testdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    }
    run_migrations(&pool).expect("Failed to run migrations");
    // Pre-insert admin_password_hash so seed_defaults skips the slow bcrypt call
    {
        let conn = pool.get().unwrap();
        let fast = bcrypt::hash("admin123", 4).unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            rusqlite::params![fast],
        )
        .unwrap();
    }
    seed_defaults(&pool).expect("Failed to seed defaults");
    pool
}

/// Fast bcrypt hash for tests (cost=4 instead of DEFAULT_COST=12).
fn fast_hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_set_and_get() {
    let pool = test_pool();
    Setting::set(&pool, "test_key", "hello").unwrap();
    assert_eq!(Setting::get(&pool, "test_key"), Some("hello".to_string()));
}

#[test]
fn settings_get_or_default() {
    let pool = test_pool();
    assert_eq!(Setting::get_or(&pool, "nonexistent", "fallback"), "fallback");
    Setting::set(&pool, "exists", "val").unwrap();
    assert_eq!(Setting::get_or(&pool, "exists", "fallback"), "val");
}

#[test]
fn settings_get_bool() {
    let pool = test_pool();
    Setting::set(&pool, "flag_true", "true").unwrap();
    Setting::set(&pool, "flag_one", "1").unwrap();
    Setting::set(&pool, "flag_false", "false").unwrap();
    assert!(Setting::get_bool(&pool, "flag_true"));
    assert!(Setting::get_bool(&pool, "flag_one"));
    assert!(!Setting::get_bool(&pool, "flag_false"));
    assert!(!Setting::get_bool(&pool, "missing_flag"));
}

#[test]
fn settings_get_i64() {
    let pool = test_pool();
    Setting::set(&pool, "num", "42").unwrap();
    assert_eq!(Setting::get_i64(&pool, "num"), 42);
    assert_eq!(Setting::get_i64(&pool, "missing"), 0);
}

#[test]
fn settings_seeded_admin() {
    let pool = test_pool();
    assert!(!Setting::get_or(&pool, "admin_username", "").is_empty());
    assert!(!Setting::get_or(&pool, "admin_password_hash", "").is_empty());
    assert_eq!(Setting::get_i64(&pool, "session_expiry_hours"), 24);
}

// ═══════════════════════════════════════════════════════════
// Projects
// ═══════════════════════════════════════════════════════════

fn make_project_form(title: &str) -> ProjectForm {
    ProjectForm {
        title: title.to_string(),
        description: "A data pipeline".to_string(),
        detailed_description: Some("Longer write-up".to_string()),
        technologies: vec!["Rust".to_string(), "SQLite".to_string()],
        github_url: Some("https://github.com/user/repo".to_string()),
        live_url: None,
        image_url: None,
        screenshots: vec!["/img/a.png".to_string(), "/img/b.png".to_string()],
    }
}

#[test]
fn project_crud() {
    let pool = test_pool();

    let id = Project::create(&pool, &make_project_form("Pipeline")).unwrap();
    assert!(id > 0);

    let project = Project::find_by_id(&pool, id).unwrap();
    assert_eq!(project.title, "Pipeline");
    assert_eq!(project.technologies, vec!["Rust", "SQLite"]);
    assert_eq!(project.screenshots.len(), 2);

    assert_eq!(Project::count(&pool), 1);
    assert_eq!(Project::list(&pool).len(), 1);

    Project::delete(&pool, id).unwrap();
    assert!(Project::find_by_id(&pool, id).is_none());
    assert_eq!(Project::count(&pool), 0);
}

#[test]
fn project_partial_update_keeps_fields() {
    let pool = test_pool();
    let id = Project::create(&pool, &make_project_form("Original")).unwrap();

    let patch = ProjectPatch {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    let updated = Project::update(&pool, id, &patch).unwrap();

    assert_eq!(updated.title, "Renamed");
    // Untouched fields survive
    assert_eq!(updated.description, "A data pipeline");
    assert_eq!(updated.technologies, vec!["Rust", "SQLite"]);
    assert_eq!(updated.screenshots.len(), 2);
}

#[test]
fn project_update_replaces_lists() {
    let pool = test_pool();
    let id = Project::create(&pool, &make_project_form("Original")).unwrap();

    let patch = ProjectPatch {
        technologies: Some(vec!["Python".to_string()]),
        screenshots: Some(vec![]),
        ..Default::default()
    };
    let updated = Project::update(&pool, id, &patch).unwrap();

    assert_eq!(updated.technologies, vec!["Python"]);
    assert!(updated.screenshots.is_empty());
}

#[test]
fn project_update_missing_is_error() {
    let pool = test_pool();
    let patch = ProjectPatch::default();
    assert!(Project::update(&pool, 999, &patch).is_err());
}

#[test]
fn split_csv_trims_and_drops_empty() {
    assert_eq!(split_csv("a, b ,c"), vec!["a", "b", "c"]);
    assert_eq!(split_csv(""), Vec::<String>::new());
    assert_eq!(split_csv("solo"), vec!["solo"]);
    assert_eq!(split_csv("a,,b"), vec!["a", "b"]);
}

// ═══════════════════════════════════════════════════════════
// About (singleton)
// ═══════════════════════════════════════════════════════════

#[test]
fn about_created_on_first_write() {
    let pool = test_pool();
    assert!(About::get(&pool).is_none());

    let patch = AboutPatch {
        name: Some("Jane Doe".to_string()),
        title: Some("Engineer".to_string()),
        ..Default::default()
    };
    let about = About::upsert(&pool, &patch).unwrap();
    assert_eq!(about.name, "Jane Doe");

    // Second write updates the same row
    let patch2 = AboutPatch {
        bio: Some("Builds things".to_string()),
        ..Default::default()
    };
    let about2 = About::upsert(&pool, &patch2).unwrap();
    assert_eq!(about2.id, about.id);
    assert_eq!(about2.name, "Jane Doe");
    assert_eq!(about2.bio, Some("Builds things".to_string()));
}

#[test]
fn about_hero_skills_capped_at_five() {
    let pool = test_pool();
    let skills: Vec<String> = (1..=8).map(|i| format!("Skill{}", i)).collect();
    let patch = AboutPatch {
        name: Some("Jane".to_string()),
        hero_top_skills: Some(SkillList::List(skills)),
        ..Default::default()
    };
    let about = About::upsert(&pool, &patch).unwrap();
    assert_eq!(about.hero_top_skills.len(), 5);
    assert_eq!(about.hero_top_skills[0], "Skill1");
}

#[test]
fn about_hero_skills_accepts_csv() {
    let pool = test_pool();
    let patch = AboutPatch {
        name: Some("Jane".to_string()),
        hero_top_skills: Some(SkillList::Csv("Python, SQL ,ETL".to_string())),
        ..Default::default()
    };
    let about = About::upsert(&pool, &patch).unwrap();
    assert_eq!(about.hero_top_skills, vec!["Python", "SQL", "ETL"]);
}

#[test]
fn skill_list_deserializes_both_shapes() {
    let from_list: SkillList = serde_json::from_value(json!(["a", "b"])).unwrap();
    assert_eq!(from_list.into_vec(), vec!["a", "b"]);

    let from_csv: SkillList = serde_json::from_value(json!("a,b")).unwrap();
    assert_eq!(from_csv.into_vec(), vec!["a", "b"]);
}

// ═══════════════════════════════════════════════════════════
// Skills
// ═══════════════════════════════════════════════════════════

#[test]
fn skill_crud() {
    let pool = test_pool();

    let id = Skill::create(
        &pool,
        &SkillForm {
            name: "Rust".to_string(),
            category: Some("Programming Languages".to_string()),
            proficiency: 90,
            icon: Some("FaRust".to_string()),
        },
    )
    .unwrap();

    let skill = Skill::find_by_id(&pool, id).unwrap();
    assert_eq!(skill.name, "Rust");
    assert_eq!(skill.proficiency, 90);

    let patch = SkillPatch {
        proficiency: Some(95),
        ..Default::default()
    };
    let updated = Skill::update(&pool, id, &patch).unwrap();
    assert_eq!(updated.proficiency, 95);
    assert_eq!(updated.name, "Rust");
    assert_eq!(updated.category, Some("Programming Languages".to_string()));

    assert_eq!(Skill::count(&pool), 1);
    Skill::delete(&pool, id).unwrap();
    assert_eq!(Skill::count(&pool), 0);
}

// ═══════════════════════════════════════════════════════════
// Experience
// ═══════════════════════════════════════════════════════════

fn make_experience_form(company: &str, sort_order: i64) -> ExperienceForm {
    ExperienceForm {
        company: company.to_string(),
        position: "Data Engineer".to_string(),
        start_date: "08/2023".to_string(),
        end_date: None,
        location: Some("Remote".to_string()),
        short_description: None,
        detailed_description: None,
        technologies: vec!["Python".to_string(), "SQL".to_string()],
        company_logo_url: None,
        sort_order,
    }
}

#[test]
fn experience_crud_and_defaults() {
    let pool = test_pool();

    let id = Experience::create(&pool, &make_experience_form("Acme", 1)).unwrap();
    let exp = Experience::find_by_id(&pool, id).unwrap();

    // end_date defaults to Present when omitted
    assert_eq!(exp.end_date, Some("Present".to_string()));
    assert_eq!(exp.display_name(), "Data Engineer at Acme");
    assert_eq!(exp.technologies, vec!["Python", "SQL"]);

    let patch = ExperiencePatch {
        end_date: Some("01/2025".to_string()),
        ..Default::default()
    };
    let updated = Experience::update(&pool, id, &patch).unwrap();
    assert_eq!(updated.end_date, Some("01/2025".to_string()));
    assert_eq!(updated.company, "Acme");

    Experience::delete(&pool, id).unwrap();
    assert_eq!(Experience::count(&pool), 0);
}

#[test]
fn experience_ordering() {
    let pool = test_pool();
    Experience::create(&pool, &make_experience_form("Older", 1)).unwrap();
    Experience::create(&pool, &make_experience_form("Newer", 2)).unwrap();

    let all = Experience::list(&pool);
    assert_eq!(all.len(), 2);
    // Highest sort_order first
    assert_eq!(all[0].company, "Newer");
    assert_eq!(all[1].company, "Older");
}

// ═══════════════════════════════════════════════════════════
// Contacts
// ═══════════════════════════════════════════════════════════

#[test]
fn contact_crud() {
    let pool = test_pool();

    let id = Contact::create(
        &pool,
        &ContactForm {
            name: "Alice".to_string(),
            email: "alice@test.com".to_string(),
            subject: None,
            message: "Hello!".to_string(),
            read: false,
        },
    )
    .unwrap();

    let contact = Contact::find_by_id(&pool, id).unwrap();
    // Subject falls back to the default
    assert_eq!(contact.subject, Some("Portfolio Contact".to_string()));
    assert!(!contact.read);

    let updated = Contact::mark_read(&pool, id).unwrap();
    assert!(updated.read);

    assert_eq!(Contact::list(&pool).len(), 1);
    Contact::delete(&pool, id).unwrap();
    assert_eq!(Contact::count(&pool), 0);
}

// ═══════════════════════════════════════════════════════════
// Activity log + undo
// ═══════════════════════════════════════════════════════════

#[test]
fn activity_log_and_list() {
    let pool = test_pool();

    ActivityEntry::log(&pool, "create", "skill", Some(1), Some("Rust"), "admin", None);
    ActivityEntry::log(&pool, "update", "project", Some(2), Some("Pipeline"), "admin", None);
    ActivityEntry::log(&pool, "delete", "contact", Some(3), None, "admin", None);

    assert_eq!(ActivityEntry::count(&pool), 3);
    assert_eq!(ActivityEntry::list(&pool, 50).len(), 3);
    assert_eq!(ActivityEntry::list(&pool, 2).len(), 2);

    // Newest first
    let entries = ActivityEntry::list(&pool, 50);
    assert_eq!(entries[0].action, "delete");
}

#[test]
fn activity_snapshot_round_trips() {
    let pool = test_pool();
    let snapshot = json!({"title": "T", "description": "D"});
    ActivityEntry::log(&pool, "delete", "project", Some(1), Some("T"), "admin", Some(&snapshot));

    let entry = &ActivityEntry::list(&pool, 1)[0];
    assert_eq!(entry.data_snapshot.as_ref().unwrap()["title"], "T");
    assert!(!entry.undone);
}

#[test]
fn undo_restores_deleted_project() {
    let pool = test_pool();
    let id = Project::create(&pool, &make_project_form("Doomed")).unwrap();
    let project = Project::find_by_id(&pool, id).unwrap();
    let snapshot = serde_json::to_value(&project).unwrap();

    Project::delete(&pool, id).unwrap();
    ActivityEntry::log(&pool, "delete", "project", Some(id), Some("Doomed"), "admin", Some(&snapshot));

    let entry = ActivityEntry::list(&pool, 1).remove(0);
    let restored_id = ActivityEntry::restore(&pool, &entry).unwrap();
    assert_ne!(restored_id, 0);

    let restored = Project::find_by_id(&pool, restored_id).unwrap();
    assert_eq!(restored.title, "Doomed");
    assert_eq!(restored.technologies, vec!["Rust", "SQLite"]);
    assert_eq!(restored.screenshots.len(), 2);

    ActivityEntry::mark_undone(&pool, entry.id).unwrap();
    let after = ActivityEntry::find_by_id(&pool, entry.id).unwrap();
    assert!(after.undone);
}

#[test]
fn undo_restores_deleted_skill() {
    let pool = test_pool();
    let id = Skill::create(
        &pool,
        &SkillForm {
            name: "Kafka".to_string(),
            category: Some("Big Data".to_string()),
            proficiency: 85,
            icon: None,
        },
    )
    .unwrap();
    let snapshot = serde_json::to_value(Skill::find_by_id(&pool, id).unwrap()).unwrap();
    Skill::delete(&pool, id).unwrap();
    ActivityEntry::log(&pool, "delete", "skill", Some(id), Some("Kafka"), "admin", Some(&snapshot));

    let entry = ActivityEntry::list(&pool, 1).remove(0);
    let restored_id = ActivityEntry::restore(&pool, &entry).unwrap();
    let restored = Skill::find_by_id(&pool, restored_id).unwrap();
    assert_eq!(restored.name, "Kafka");
    assert_eq!(restored.proficiency, 85);
}

#[test]
fn undo_restores_deleted_experience() {
    let pool = test_pool();
    let id = Experience::create(&pool, &make_experience_form("Acme", 2)).unwrap();
    let snapshot = serde_json::to_value(Experience::find_by_id(&pool, id).unwrap()).unwrap();
    Experience::delete(&pool, id).unwrap();
    ActivityEntry::log(&pool, "delete", "experience", Some(id), None, "admin", Some(&snapshot));

    let entry = ActivityEntry::list(&pool, 1).remove(0);
    let restored_id = ActivityEntry::restore(&pool, &entry).unwrap();
    let restored = Experience::find_by_id(&pool, restored_id).unwrap();
    assert_eq!(restored.company, "Acme");
    assert_eq!(restored.sort_order, 2);
    assert_eq!(restored.end_date, Some("Present".to_string()));
}

#[test]
fn undo_restores_deleted_contact_with_read_flag() {
    let pool = test_pool();
    let id = Contact::create(
        &pool,
        &ContactForm {
            name: "Bob".to_string(),
            email: "bob@test.com".to_string(),
            subject: Some("Hi".to_string()),
            message: "Hey".to_string(),
            read: false,
        },
    )
    .unwrap();
    Contact::mark_read(&pool, id).unwrap();
    let snapshot = serde_json::to_value(Contact::find_by_id(&pool, id).unwrap()).unwrap();
    Contact::delete(&pool, id).unwrap();
    ActivityEntry::log(&pool, "delete", "contact", Some(id), None, "admin", Some(&snapshot));

    let entry = ActivityEntry::list(&pool, 1).remove(0);
    let restored_id = ActivityEntry::restore(&pool, &entry).unwrap();
    let restored = Contact::find_by_id(&pool, restored_id).unwrap();
    assert_eq!(restored.name, "Bob");
    assert!(restored.read);
}

#[test]
fn undo_rejects_unsupported_entity() {
    let pool = test_pool();
    let entry = ActivityEntry {
        id: 1,
        action: "delete".to_string(),
        entity_type: "blog".to_string(),
        entity_id: Some(1),
        entity_name: None,
        admin_user: "admin".to_string(),
        data_snapshot: Some(json!({"title": "x"})),
        undone: false,
        created_at: chrono::Utc::now().naive_utc(),
    };
    let err = ActivityEntry::restore(&pool, &entry).unwrap_err();
    assert!(err.contains("not supported"));
}

#[test]
fn undo_requires_snapshot() {
    let pool = test_pool();
    let entry = ActivityEntry {
        id: 1,
        action: "delete".to_string(),
        entity_type: "project".to_string(),
        entity_id: Some(1),
        entity_name: None,
        admin_user: "admin".to_string(),
        data_snapshot: None,
        undone: false,
        created_at: chrono::Utc::now().naive_utc(),
    };
    let err = ActivityEntry::restore(&pool, &entry).unwrap_err();
    assert!(err.contains("No data available"));
}

// ═══════════════════════════════════════════════════════════
// Blog
// ═══════════════════════════════════════════════════════════

fn make_blog_form(title: &str, published: bool) -> BlogForm {
    BlogForm {
        title: title.to_string(),
        slug: None,
        excerpt: Some("Preview".to_string()),
        banner_image_url: None,
        content: "<p>Some words to read here</p>".to_string(),
        author: None,
        published,
        featured: false,
        show_on_homepage: false,
        tags: Some(TagList::List(vec!["rust".to_string(), "sqlite".to_string()])),
    }
}

#[test]
fn blog_create_generates_slug() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Hello World", false), "admin").unwrap();
    let blog = Blog::find_by_id(&pool, id).unwrap();
    assert_eq!(blog.slug, "hello-world");
    assert_eq!(blog.author, "admin");
    assert_eq!(blog.tags, vec!["rust", "sqlite"]);
    assert_eq!(blog.reading_time, Some(1));
    assert!(!blog.published);
    assert!(blog.published_at.is_none());
}

#[test]
fn blog_slug_collision_gets_suffix() {
    let pool = test_pool();
    let first = Blog::create(&pool, &make_blog_form("Hello World", false), "admin").unwrap();
    let second = Blog::create(&pool, &make_blog_form("Hello World", false), "admin").unwrap();

    let a = Blog::find_by_id(&pool, first).unwrap();
    let b = Blog::find_by_id(&pool, second).unwrap();
    assert_eq!(a.slug, "hello-world");
    assert_ne!(a.slug, b.slug);
    assert!(b.slug.starts_with("hello-world-"));
}

#[test]
fn blog_explicit_slug_wins() {
    let pool = test_pool();
    let mut form = make_blog_form("Some Title", false);
    form.slug = Some("custom-slug".to_string());
    let id = Blog::create(&pool, &form, "admin").unwrap();
    assert_eq!(Blog::find_by_id(&pool, id).unwrap().slug, "custom-slug");
}

#[test]
fn blog_publish_transition_stamps_once() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Draft", false), "admin").unwrap();
    assert!(Blog::find_by_id(&pool, id).unwrap().published_at.is_none());

    let publish = BlogPatch {
        published: Some(true),
        ..Default::default()
    };
    let published = Blog::update(&pool, id, &publish).unwrap();
    let first_stamp = published.published_at;
    assert!(first_stamp.is_some());

    // A later edit must not move the publication time
    let retitle = BlogPatch {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    let edited = Blog::update(&pool, id, &retitle).unwrap();
    assert_eq!(edited.published_at, first_stamp);
    assert!(edited.published);
}

#[test]
fn blog_created_published_gets_stamp() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Live", true), "admin").unwrap();
    let blog = Blog::find_by_id(&pool, id).unwrap();
    assert!(blog.published);
    assert!(blog.published_at.is_some());
}

#[test]
fn blog_reading_time_recalculated_on_content_change() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Post", false), "admin").unwrap();
    assert_eq!(Blog::find_by_id(&pool, id).unwrap().reading_time, Some(1));

    let long_content = format!("<p>{}</p>", "word ".repeat(600));
    let patch = BlogPatch {
        content: Some(long_content),
        ..Default::default()
    };
    let updated = Blog::update(&pool, id, &patch).unwrap();
    assert_eq!(updated.reading_time, Some(3));
}

#[test]
fn blog_views_increment() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Post", true), "admin").unwrap();
    assert_eq!(Blog::find_by_id(&pool, id).unwrap().views, 0);
    Blog::increment_views(&pool, id).unwrap();
    Blog::increment_views(&pool, id).unwrap();
    assert_eq!(Blog::find_by_id(&pool, id).unwrap().views, 2);
}

#[test]
fn blog_list_filters() {
    let pool = test_pool();
    Blog::create(&pool, &make_blog_form("Published", true), "admin").unwrap();
    let mut homepage = make_blog_form("Homepage", true);
    homepage.show_on_homepage = true;
    Blog::create(&pool, &homepage, "admin").unwrap();
    Blog::create(&pool, &make_blog_form("Draft", false), "admin").unwrap();

    assert_eq!(Blog::count(&pool), 3);
    assert_eq!(Blog::list(&pool, true, false).len(), 2);
    assert_eq!(Blog::list(&pool, true, true).len(), 1);
    assert_eq!(Blog::list(&pool, false, false).len(), 3);
    assert_eq!(Blog::list_all(&pool).len(), 3);
}

#[test]
fn blog_find_by_slug() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Findable", true), "admin").unwrap();
    let blog = Blog::find_by_slug(&pool, "findable").unwrap();
    assert_eq!(blog.id, id);
    assert!(Blog::find_by_slug(&pool, "missing").is_none());
}

#[test]
fn blog_delete_cascades() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Doomed", true), "admin").unwrap();

    BlogLike::like(&pool, id, "1.2.3.4", "UA").unwrap();
    let cid = BlogComment::create(
        &pool,
        id,
        &CommentForm {
            parent_id: None,
            author_name: "A".to_string(),
            author_email: None,
            content: "hi".to_string(),
        },
        "1.2.3.4",
        "UA",
    )
    .unwrap();
    CommentLike::toggle(&pool, cid, "1.2.3.4", "UA").unwrap();

    Blog::delete(&pool, id).unwrap();
    assert!(Blog::find_by_id(&pool, id).is_none());
    assert_eq!(BlogLike::count(&pool, id), 0);
    assert_eq!(BlogComment::count(&pool, id), 0);
    assert_eq!(CommentLike::count(&pool, cid), 0);
}

#[test]
fn reading_time_strips_tags() {
    let html = format!("<article><h1>Title</h1><p>{}</p></article>", "word ".repeat(400));
    assert_eq!(reading_time(&html), 2);
    assert_eq!(reading_time("<p>short</p>"), 1);
    assert_eq!(reading_time(""), 1);
}

#[test]
fn tag_list_deserializes_both_shapes() {
    let from_list: TagList = serde_json::from_value(json!(["a", "b"])).unwrap();
    assert_eq!(from_list.into_vec(), vec!["a", "b"]);

    let from_csv: TagList = serde_json::from_value(json!("a, b")).unwrap();
    assert_eq!(from_csv.into_vec(), vec!["a", "b"]);
}

// ═══════════════════════════════════════════════════════════
// Blog likes
// ═══════════════════════════════════════════════════════════

#[test]
fn blog_like_once_per_ip() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Likeable", true), "admin").unwrap();

    let (created, count) = BlogLike::like(&pool, id, "1.1.1.1", "UA").unwrap();
    assert!(created);
    assert_eq!(count, 1);

    // Same IP again: no new like
    let (created, count) = BlogLike::like(&pool, id, "1.1.1.1", "UA").unwrap();
    assert!(!created);
    assert_eq!(count, 1);

    // Different IP counts
    let (created, count) = BlogLike::like(&pool, id, "2.2.2.2", "UA").unwrap();
    assert!(created);
    assert_eq!(count, 2);

    assert!(BlogLike::liked_by(&pool, id, "1.1.1.1"));
    assert!(!BlogLike::liked_by(&pool, id, "3.3.3.3"));
}

#[test]
fn blog_like_notifications() {
    let pool = test_pool();
    let id = Blog::create(&pool, &make_blog_form("Post", true), "admin").unwrap();
    BlogLike::like(&pool, id, "1.1.1.1", "UA").unwrap();
    BlogLike::like(&pool, id, "2.2.2.2", "UA").unwrap();

    assert_eq!(BlogLike::unread_count(&pool), 2);
    assert_eq!(BlogLike::recent_unread(&pool, 10).len(), 2);

    BlogLike::mark_all_read(&pool).unwrap();
    assert_eq!(BlogLike::unread_count(&pool), 0);
    assert!(BlogLike::recent_unread(&pool, 10).is_empty());
}

// ═══════════════════════════════════════════════════════════
// Comments
// ═══════════════════════════════════════════════════════════

fn make_comment(author: &str, parent: Option<i64>) -> CommentForm {
    CommentForm {
        parent_id: parent,
        author_name: author.to_string(),
        author_email: None,
        content: "Nice post".to_string(),
    }
}

#[test]
fn comment_threading() {
    let pool = test_pool();
    let blog_id = Blog::create(&pool, &make_blog_form("Post", true), "admin").unwrap();

    let top = BlogComment::create(&pool, blog_id, &make_comment("Alice", None), "1.1.1.1", "UA").unwrap();
    let _reply =
        BlogComment::create(&pool, blog_id, &make_comment("Admin", Some(top)), "2.2.2.2", "UA")
            .unwrap();
    let _other = BlogComment::create(&pool, blog_id, &make_comment("Bob", None), "3.3.3.3", "UA").unwrap();

    let threads = BlogComment::for_blog(&pool, blog_id);
    // Two top-level comments, oldest first
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].comment.author_name, "Alice");
    assert_eq!(threads[0].replies.len(), 1);
    assert_eq!(threads[0].replies[0].author_name, "Admin");
    assert!(threads[1].replies.is_empty());
}

#[test]
fn comment_reply_references_parent() {
    let pool = test_pool();
    let blog_id = Blog::create(&pool, &make_blog_form("Post", true), "admin").unwrap();
    let top = BlogComment::create(&pool, blog_id, &make_comment("A", None), "1.1.1.1", "UA").unwrap();
    let reply = BlogComment::create(&pool, blog_id, &make_comment("B", Some(top)), "1.1.1.1", "UA").unwrap();

    let comment = BlogComment::find_by_id(&pool, reply).unwrap();
    assert_eq!(comment.parent_id, Some(top));
    assert_eq!(comment.blog_id, blog_id);
}

#[test]
fn comment_like_toggles() {
    let pool = test_pool();
    let blog_id = Blog::create(&pool, &make_blog_form("Post", true), "admin").unwrap();
    let cid = BlogComment::create(&pool, blog_id, &make_comment("A", None), "9.9.9.9", "UA").unwrap();

    let (liked, count) = CommentLike::toggle(&pool, cid, "1.1.1.1", "UA").unwrap();
    assert!(liked);
    assert_eq!(count, 1);
    assert_eq!(BlogComment::find_by_id(&pool, cid).unwrap().like_count, 1);
    assert!(CommentLike::liked_by(&pool, cid, "1.1.1.1"));

    // Second toggle from the same IP unlikes
    let (liked, count) = CommentLike::toggle(&pool, cid, "1.1.1.1", "UA").unwrap();
    assert!(!liked);
    assert_eq!(count, 0);
    assert_eq!(BlogComment::find_by_id(&pool, cid).unwrap().like_count, 0);
    assert!(!CommentLike::liked_by(&pool, cid, "1.1.1.1"));
}

#[test]
fn comment_notifications() {
    let pool = test_pool();
    let blog_id = Blog::create(&pool, &make_blog_form("Post", true), "admin").unwrap();
    BlogComment::create(&pool, blog_id, &make_comment("A", None), "1.1.1.1", "UA").unwrap();
    BlogComment::create(&pool, blog_id, &make_comment("B", None), "2.2.2.2", "UA").unwrap();

    assert_eq!(BlogComment::unread_count(&pool), 2);
    assert_eq!(BlogComment::recent_unread(&pool, 1).len(), 1);

    BlogComment::mark_all_read(&pool).unwrap();
    assert_eq!(BlogComment::unread_count(&pool), 0);
}

// ═══════════════════════════════════════════════════════════
// Analytics
// ═══════════════════════════════════════════════════════════

fn record_event(pool: &DbPool, session: &str, event: &str, section: Option<&str>, item: Option<&str>, country: &str, city: &str) {
    AnalyticsEvent::record(
        pool,
        session,
        event,
        section,
        None,
        item,
        Some("1.2.3.4"),
        Some("UA"),
        Some(country),
        Some(city),
        None,
        None,
    )
    .unwrap();
}

#[test]
fn analytics_stats_aggregation() {
    let pool = test_pool();

    record_event(&pool, "s1", "page_view", None, None, "United States", "New York");
    record_event(&pool, "s1", "section_view", Some("projects"), None, "United States", "New York");
    record_event(&pool, "s1", "project_click", Some("projects"), Some("Pipeline"), "United States", "New York");
    record_event(&pool, "s2", "page_view", None, None, "India", "Pune");
    record_event(&pool, "s2", "section_view", Some("skills"), None, "India", "Pune");
    record_event(&pool, "s2", "project_click", Some("projects"), Some("Pipeline"), "India", "Pune");
    record_event(&pool, "s3", "page_view", None, None, "Unknown", "Unknown");

    let stats = AnalyticsEvent::stats(&pool);

    assert_eq!(stats.total_visitors, 3);
    assert_eq!(stats.total_views, 3); // page_view events only

    // Any event with a section counts toward section_views
    let projects = stats
        .section_views
        .iter()
        .find(|s| s.section == "projects")
        .unwrap();
    assert_eq!(projects.count, 2);

    assert_eq!(stats.top_projects.len(), 1);
    assert_eq!(stats.top_projects[0].name, "Pipeline");
    assert_eq!(stats.top_projects[0].count, 2);

    // Unknown is excluded, distinct sessions per country
    assert_eq!(stats.visitors_by_country.len(), 2);
    assert!(stats
        .visitors_by_country
        .iter()
        .all(|c| c.country != "Unknown"));

    assert_eq!(stats.visitors_by_city.len(), 2);
    assert_eq!(stats.recent_activity.len(), 7);
    assert!(!stats.hourly_traffic.is_empty());
}

#[test]
fn analytics_realtime_window() {
    let pool = test_pool();
    record_event(&pool, "s1", "page_view", None, None, "Germany", "Berlin");
    record_event(&pool, "s1", "section_view", Some("about"), None, "Germany", "Berlin");
    record_event(&pool, "s2", "page_view", None, None, "France", "Paris");

    let realtime = AnalyticsEvent::realtime(&pool);
    assert_eq!(realtime.visitors_last_hour, 2);
    assert_eq!(realtime.views_last_hour, 3);
    assert_eq!(realtime.recent_locations.len(), 2);

    // Events older than an hour fall out of the window
    {
        let conn = pool.get().unwrap();
        conn.execute(
            "UPDATE analytics SET created_at = datetime('now', '-2 hours')",
            [],
        )
        .unwrap();
    }
    let later = AnalyticsEvent::realtime(&pool);
    assert_eq!(later.visitors_last_hour, 0);
    assert_eq!(later.views_last_hour, 0);
}

#[test]
fn analytics_recent_activity_is_capped() {
    let pool = test_pool();
    for i in 0..60 {
        record_event(&pool, &format!("s{}", i), "page_view", None, None, "Unknown", "Unknown");
    }
    let stats = AnalyticsEvent::stats(&pool);
    assert_eq!(stats.recent_activity.len(), 50);
}

// ═══════════════════════════════════════════════════════════
// GitHub settings + repo filtering
// ═══════════════════════════════════════════════════════════

#[test]
fn github_settings_singleton() {
    let pool = test_pool();
    assert!(GitHubSettings::find(&pool).is_none());

    let first = GitHubSettings::get_or_create(&pool).unwrap();
    let second = GitHubSettings::get_or_create(&pool).unwrap();
    assert_eq!(first.id, second.id);
    assert!(!first.enabled);
    assert!(first.selected_repos.is_empty());
}

#[test]
fn github_settings_update_and_masking() {
    let pool = test_pool();
    let patch = GitHubSettingsPatch {
        github_username: Some("octocat".to_string()),
        github_token: Some("ghp_secret".to_string()),
        enabled: Some(true),
        selected_repos: Some(RepoSelection::List(vec!["octocat/hello".to_string()])),
    };
    let settings = GitHubSettings::update(&pool, &patch).unwrap();

    assert_eq!(settings.github_username, Some("octocat".to_string()));
    assert!(settings.enabled);
    assert_eq!(settings.selected_repos, vec!["octocat/hello"]);

    // The API view never exposes the token
    let safe = settings.safe_json();
    assert_eq!(safe["github_token"], "***");
    assert_eq!(safe["github_username"], "octocat");

    // Partial update keeps existing values
    let patch2 = GitHubSettingsPatch {
        enabled: Some(false),
        ..Default::default()
    };
    let updated = GitHubSettings::update(&pool, &patch2).unwrap();
    assert!(!updated.enabled);
    assert_eq!(updated.github_username, Some("octocat".to_string()));
    assert_eq!(updated.github_token, Some("ghp_secret".to_string()));
}

#[test]
fn github_selected_repos_accepts_json_string() {
    let pool = test_pool();
    let patch = GitHubSettingsPatch {
        selected_repos: Some(RepoSelection::Json("[\"a\",\"b\"]".to_string())),
        ..Default::default()
    };
    let settings = GitHubSettings::update(&pool, &patch).unwrap();
    assert_eq!(settings.selected_repos, vec!["a", "b"]);

    // Invalid JSON degrades to an empty selection
    let patch = GitHubSettingsPatch {
        selected_repos: Some(RepoSelection::Json("not json".to_string())),
        ..Default::default()
    };
    let settings = GitHubSettings::update(&pool, &patch).unwrap();
    assert!(settings.selected_repos.is_empty());
}

fn make_repo(name: &str, full_name: &str) -> RepoSummary {
    RepoSummary {
        id: 1,
        name: name.to_string(),
        full_name: full_name.to_string(),
        description: None,
        html_url: format!("https://github.com/{}", full_name),
        language: Some("Rust".to_string()),
        stars: 0,
        forks: 0,
        updated_at: None,
        created_at: None,
        is_private: false,
        default_branch: Some("main".to_string()),
    }
}

#[test]
fn github_filter_selected_matches_name_or_full_name() {
    let repos = vec![
        make_repo("alpha", "me/alpha"),
        make_repo("beta", "me/beta"),
        make_repo("gamma", "me/gamma"),
    ];

    let selected = vec!["me/alpha".to_string(), "beta".to_string()];
    let filtered = filter_selected(repos, &selected);
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[0].name, "alpha");
    assert_eq!(filtered[1].name, "beta");
}

// ═══════════════════════════════════════════════════════════
// Auth: passwords + sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn password_hash_and_verify() {
    let hash = fast_hash("my_secure_password");
    assert!(auth::verify_password("my_secure_password", &hash));
    assert!(!auth::verify_password("wrong_password", &hash));
}

#[test]
fn password_hash_unique_salts() {
    let h1 = fast_hash("same");
    let h2 = fast_hash("same");
    assert_ne!(h1, h2); // bcrypt uses random salts
    assert!(auth::verify_password("same", &h1));
    assert!(auth::verify_password("same", &h2));
}

#[test]
fn session_create_and_validate() {
    let pool = test_pool();
    let token = auth::create_session(&pool, Some("1.2.3.4"), Some("TestAgent")).unwrap();
    assert!(!token.is_empty());
    assert!(auth::validate_session(&pool, &token));
    assert!(!auth::validate_session(&pool, "nonexistent"));
}

#[test]
fn session_cleanup_expired() {
    let pool = test_pool();
    let valid = auth::create_session(&pool, None, None).unwrap();

    // Manually insert an expired session
    {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO sessions (id, created_at, expires_at) VALUES ('expired-sess', datetime('now', '-2 days'), datetime('now', '-1 day'))",
            [],
        )
        .unwrap();
    }

    assert!(!auth::validate_session(&pool, "expired-sess"));

    auth::cleanup_expired_sessions(&pool).unwrap();
    assert!(auth::validate_session(&pool, &valid));
    let count: i64 = {
        let conn = pool.get().unwrap();
        conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap()
    };
    assert_eq!(count, 1);
}

// ═══════════════════════════════════════════════════════════
// Rate limiter
// ═══════════════════════════════════════════════════════════

#[test]
fn rate_limiter_blocks_after_limit() {
    let limiter = RateLimiter::new();
    let window = std::time::Duration::from_secs(60);

    assert!(limiter.check_and_record("login:1.1.1.1", 3, window));
    assert!(limiter.check_and_record("login:1.1.1.1", 3, window));
    assert!(limiter.check_and_record("login:1.1.1.1", 3, window));
    assert!(!limiter.check_and_record("login:1.1.1.1", 3, window));

    // Other keys are unaffected
    assert!(limiter.check_and_record("login:2.2.2.2", 3, window));
}
