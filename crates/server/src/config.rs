use std::env;

use worklog_core::calendar::{WeekConvention, DEFAULT_WEEK_SPAN};

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub static_dir: String,
    pub week_convention: WeekConvention,
    pub history_weeks: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/worklog.db?mode=rwc".to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            week_convention: env::var("WEEK_CONVENTION")
                .ok()
                .and_then(|c| match c.parse() {
                    Ok(convention) => Some(convention),
                    Err(e) => {
                        tracing::warn!("Ignoring WEEK_CONVENTION: {e}");
                        None
                    }
                })
                .unwrap_or_default(),
            history_weeks: env::var("HISTORY_WEEKS")
                .ok()
                .and_then(|w| w.parse().ok())
                .filter(|w| *w > 0)
                .unwrap_or(DEFAULT_WEEK_SPAN),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "sqlite::memory:".to_string(),
            static_dir: "static".to_string(),
            week_convention: WeekConvention::Iso,
            history_weeks: DEFAULT_WEEK_SPAN,
        }
    }
}
