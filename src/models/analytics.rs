use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: i64,
    pub session_id: String,
    pub event_type: String,
    pub section: Option<String>,
    pub item_id: Option<i64>,
    pub item_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub referrer: Option<String>,
    pub duration: Option<i64>,
    #[serde(rename = "timestamp")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct SectionCount {
    pub section: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CityCount {
    pub city: String,
    pub country: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct HourCount {
    pub hour: i64,
    pub count: i64,
}

/// Dashboard rollup over the whole event table.
#[derive(Debug, Serialize)]
pub struct StatsSummary {
    pub total_visitors: i64,
    pub total_views: i64,
    pub section_views: Vec<SectionCount>,
    pub top_projects: Vec<NamedCount>,
    pub visitors_by_country: Vec<CountryCount>,
    pub visitors_by_city: Vec<CityCount>,
    pub recent_activity: Vec<AnalyticsEvent>,
    pub hourly_traffic: Vec<HourCount>,
}

/// Last-hour slice for the live dashboard widget.
#[derive(Debug, Serialize)]
pub struct RealtimeSummary {
    pub visitors_last_hour: i64,
    pub views_last_hour: i64,
    pub recent_locations: Vec<CityCount>,
}

impl AnalyticsEvent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AnalyticsEvent {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            event_type: row.get("event_type")?,
            section: row.get("section")?,
            item_id: row.get("item_id")?,
            item_name: row.get("item_name")?,
            ip_address: row.get("ip_address")?,
            user_agent: row.get("user_agent")?,
            country: row.get("country")?,
            city: row.get("city")?,
            referrer: row.get("referrer")?,
            duration: row.get("duration")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn record(
        pool: &DbPool,
        session_id: &str,
        event_type: &str,
        section: Option<&str>,
        item_id: Option<i64>,
        item_name: Option<&str>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        country: Option<&str>,
        city: Option<&str>,
        referrer: Option<&str>,
        duration: Option<i64>,
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO analytics (session_id, event_type, section, item_id, item_name,
             ip_address, user_agent, country, city, referrer, duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                session_id, event_type, section, item_id, item_name, ip_address, user_agent,
                country, city, referrer, duration
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn stats(pool: &DbPool) -> StatsSummary {
        let empty = StatsSummary {
            total_visitors: 0,
            total_views: 0,
            section_views: vec![],
            top_projects: vec![],
            visitors_by_country: vec![],
            visitors_by_city: vec![],
            recent_activity: vec![],
            hourly_traffic: vec![],
        };
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return empty,
        };

        let total_visitors: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT session_id) FROM analytics",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        let total_views: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM analytics WHERE event_type = 'page_view'",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        let section_views: Vec<SectionCount> = conn
            .prepare(
                "SELECT section, COUNT(*) as count FROM analytics
                 WHERE section IS NOT NULL
                 GROUP BY section",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(SectionCount {
                        section: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        let top_projects: Vec<NamedCount> = conn
            .prepare(
                "SELECT item_name, COUNT(*) as count FROM analytics
                 WHERE event_type = 'project_click' AND item_name IS NOT NULL
                 GROUP BY item_name
                 ORDER BY count DESC
                 LIMIT 10",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(NamedCount {
                        name: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        let visitors_by_country: Vec<CountryCount> = conn
            .prepare(
                "SELECT country, COUNT(DISTINCT session_id) as count FROM analytics
                 WHERE country IS NOT NULL AND country != 'Unknown'
                 GROUP BY country
                 ORDER BY count DESC",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(CountryCount {
                        country: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        let visitors_by_city: Vec<CityCount> = conn
            .prepare(
                "SELECT city, country, COUNT(DISTINCT session_id) as count FROM analytics
                 WHERE city IS NOT NULL AND city != 'Unknown'
                 GROUP BY city, country
                 ORDER BY count DESC
                 LIMIT 20",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(CityCount {
                        city: row.get(0)?,
                        country: row.get(1)?,
                        count: row.get(2)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        let recent_activity: Vec<AnalyticsEvent> = conn
            .prepare(
                "SELECT * FROM analytics
                 WHERE created_at >= datetime('now', '-1 day')
                 ORDER BY created_at DESC
                 LIMIT 50",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], Self::from_row)
                    .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        let hourly_traffic: Vec<HourCount> = conn
            .prepare(
                "SELECT CAST(strftime('%H', created_at) AS INTEGER) as hour, COUNT(*) as count
                 FROM analytics
                 WHERE created_at >= datetime('now', '-1 day')
                 GROUP BY hour
                 ORDER BY hour",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(HourCount {
                        hour: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        StatsSummary {
            total_visitors,
            total_views,
            section_views,
            top_projects,
            visitors_by_country,
            visitors_by_city,
            recent_activity,
            hourly_traffic,
        }
    }

    pub fn realtime(pool: &DbPool) -> RealtimeSummary {
        let empty = RealtimeSummary {
            visitors_last_hour: 0,
            views_last_hour: 0,
            recent_locations: vec![],
        };
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return empty,
        };

        let visitors_last_hour: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT session_id) FROM analytics
                 WHERE created_at >= datetime('now', '-1 hour')",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        let views_last_hour: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM analytics
                 WHERE created_at >= datetime('now', '-1 hour')",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        let recent_locations: Vec<CityCount> = conn
            .prepare(
                "SELECT city, country, COUNT(DISTINCT session_id) as count FROM analytics
                 WHERE created_at >= datetime('now', '-1 hour')
                 AND city IS NOT NULL AND city != 'Unknown'
                 GROUP BY city, country
                 ORDER BY count DESC
                 LIMIT 10",
            )
            .and_then(|mut stmt| {
                stmt.query_map([], |row| {
                    Ok(CityCount {
                        city: row.get(0)?,
                        country: row.get(1)?,
                        count: row.get(2)?,
                    })
                })
                .map(|rows| rows.filter_map(|r| r.ok()).collect())
            })
            .unwrap_or_default();

        RealtimeSummary {
            visitors_last_hour,
            views_last_hour,
            recent_locations,
        }
    }
}
