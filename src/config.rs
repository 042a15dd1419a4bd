// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

/// Trailing-edge quiescence window before an edit is written to scratch storage.
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 5000;

/// How long the "saving" indicator stays raised after a scratch write.
pub const DEFAULT_SAVING_INDICATOR_MS: u64 = 2000;

/// Fraction of items a learner must get right to pass.
pub const PASSING_RATIO: f64 = 0.5;

/// Number of blank choices a fresh multiple-choice item starts with.
pub const DEFAULT_CHOICE_COUNT: usize = 4;

/// A multiple-choice item never drops below this many choices.
pub const MIN_CHOICE_COUNT: usize = 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub rust_log: String,
    pub log_dir: Option<String>,
    pub draft_database_url: String,
    pub autosave_debounce: Duration,
    pub saving_indicator: Duration,
    pub passing_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rust_log: "info".to_string(),
            log_dir: None,
            draft_database_url: "sqlite::memory:".to_string(),
            autosave_debounce: Duration::from_millis(DEFAULT_AUTOSAVE_DEBOUNCE_MS),
            saving_indicator: Duration::from_millis(DEFAULT_SAVING_INDICATOR_MS),
            passing_ratio: PASSING_RATIO,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let rust_log = env::var("RUST_LOG").unwrap_or(defaults.rust_log);

        let log_dir = env::var("LOG_DIR").ok().filter(|dir| !dir.trim().is_empty());

        let draft_database_url =
            env::var("DRAFT_DATABASE_URL").unwrap_or(defaults.draft_database_url);

        let autosave_debounce = Duration::from_millis(parse_var(
            "AUTOSAVE_DEBOUNCE_MS",
            DEFAULT_AUTOSAVE_DEBOUNCE_MS,
        ));

        let saving_indicator = Duration::from_millis(parse_var(
            "SAVING_INDICATOR_MS",
            DEFAULT_SAVING_INDICATOR_MS,
        ));

        let passing_ratio = parse_var("PASSING_RATIO", PASSING_RATIO);

        Self {
            rust_log,
            log_dir,
            draft_database_url,
            autosave_debounce,
            saving_indicator,
            passing_ratio,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} has invalid value {:?}, using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
