pub mod about;
pub mod activity;
pub mod analytics;
pub mod blog;
pub mod comment;
pub mod contact;
pub mod experience;
pub mod github_settings;
pub mod project;
pub mod settings;
pub mod skill;
