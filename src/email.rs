use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::db::DbPool;
use crate::models::contact::Contact;
use crate::models::settings::Setting;

struct SmtpConfig {
    host: String,
    port: u16,
    username: String,
    password: String,
}

fn smtp_config(pool: &DbPool) -> SmtpConfig {
    SmtpConfig {
        host: Setting::get_or(pool, "mail_smtp_host", "smtp.gmail.com"),
        port: Setting::get_i64(pool, "mail_smtp_port").clamp(1, 65535) as u16,
        username: Setting::get_or(pool, "mail_username", ""),
        password: Setting::get_or(pool, "mail_password", ""),
    }
}

/// Notify the admin about a new contact form submission. Best-effort:
/// the submission is already stored, so a mail failure is logged and
/// swallowed.
pub fn send_contact_notification(pool: &DbPool, contact: &Contact) {
    let admin_email = Setting::get_or(pool, "admin_email", "");
    let config = smtp_config(pool);
    if admin_email.is_empty() || config.username.is_empty() {
        log::info!("Mail not configured, skipping contact notification");
        return;
    }

    let from = {
        let configured = Setting::get_or(pool, "mail_from", "");
        if configured.is_empty() {
            config.username.clone()
        } else {
            configured
        }
    };

    let subject = format!(
        "Portfolio Contact: {}",
        contact.subject.as_deref().unwrap_or("Portfolio Contact")
    );
    let body = format!(
        "New contact form submission:\n\n\
         Name: {}\n\
         Email: {}\n\n\
         Message:\n{}\n",
        contact.name, contact.email, contact.message,
    );

    if let Err(e) = send_smtp(&config, &from, &admin_email, &subject, &body) {
        log::warn!("Failed to send contact notification: {}", e);
    }
}

fn send_smtp(
    config: &SmtpConfig,
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), String> {
    if config.host.is_empty() || config.username.is_empty() {
        return Err("SMTP host or username not configured".into());
    }

    let email = Message::builder()
        .from(from.parse().map_err(|e| format!("Invalid from address: {}", e))?)
        .to(to.parse().map_err(|e| format!("Invalid to address: {}", e))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| format!("Failed to build email: {}", e))?;

    let creds = Credentials::new(config.username.clone(), config.password.clone());

    let mailer = SmtpTransport::starttls_relay(&config.host)
        .map_err(|e| format!("SMTP relay error: {}", e))?
        .port(config.port)
        .credentials(creds)
        .build();

    mailer
        .send(&email)
        .map_err(|e| format!("SMTP send error: {}", e))?;
    Ok(())
}
