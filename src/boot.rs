use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::db;

/// Run all boot checks. Call this before Rocket launches.
/// Creates the data directory if missing and aborts when the database
/// location is unusable.
pub fn run() {
    info!("Folio boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    let db_path = db::database_path();
    let db_dir = Path::new(&db_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // ── 1. Data directory ──────────────────────────────
    if !db_dir.exists() {
        match fs::create_dir_all(db_dir) {
            Ok(_) => info!("  Created directory: {}", db_dir.display()),
            Err(e) => {
                error!("  FAILED to create directory {}: {}", db_dir.display(), e);
                errors += 1;
            }
        }
    }

    // ── 2. Data directory writable ─────────────────────
    if db_dir.exists() {
        let test_file = db_dir.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) => {
                error!("  Database directory not writable: {}", e);
                errors += 1;
            }
        }
    }

    // ── 3. Mail configuration ──────────────────────────
    let mail_user = std::env::var("MAIL_USERNAME").unwrap_or_default();
    let admin_email = std::env::var("ADMIN_EMAIL").unwrap_or_default();
    if mail_user.is_empty() || admin_email.is_empty() {
        warn!("  Mail not fully configured (contact notifications disabled)");
        warnings += 1;
    }

    // ── Summary ────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
}
