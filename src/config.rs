use std::env;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::warn;

pub const DEFAULT_PHOTO_QUERIES: [&str; 24] = [
    "fog",
    "shadow",
    "reflection",
    "empty room",
    "window light",
    "silhouette",
    "abandoned place",
    "lonely chair",
    "doorway",
    "stairs",
    "water surface",
    "forest path",
    "night light",
    "blurred motion",
    "quiet street",
    "dark room",
    "mirror",
    "corridor",
    "misty forest",
    "old house",
    "vintage interior",
    "soft light",
    "lonely bench",
    "deserted pier",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    pub log_dir: String,
    pub privileged_username: String,
    pub unsplash_access_key: String,
    pub unsplash_api_url: String,
    pub unsplash_orientation: String,
    pub unsplash_content_filter: String,
    pub unsplash_count: u32,
    pub unsplash_timeout_seconds: u64,
    pub photo_queries: Vec<String>,
    pub query_limit: usize,
    pub attempts_per_query: usize,
    pub recent_cache_limit: usize,
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

fn env_string(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn env_u64(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> u64 {
    lookup(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: usize) -> usize {
    lookup(name)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_csv(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Vec<String> {
    lookup(name)
        .unwrap_or_default()
        .split(',')
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn normalize_orientation(value: String) -> String {
    let lowered = value.trim().to_lowercase();
    match lowered.as_str() {
        "" => String::new(),
        "portrait" | "landscape" | "squarish" => lowered,
        _ => {
            warn!(
                "Unknown UNSPLASH_ORIENTATION value '{}'; defaulting to portrait.",
                value
            );
            "portrait".to_string()
        }
    }
}

fn normalize_content_filter(value: String) -> String {
    let lowered = value.trim().to_lowercase();
    match lowered.as_str() {
        "" | "low" | "high" => lowered,
        _ => {
            warn!(
                "Unknown UNSPLASH_CONTENT_FILTER value '{}'; leaving it unset.",
                value
            );
            String::new()
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut photo_queries = env_csv(&lookup, "PHOTO_QUERIES");
        if photo_queries.is_empty() {
            photo_queries = DEFAULT_PHOTO_QUERIES
                .iter()
                .map(|query| query.to_string())
                .collect();
        }

        Config {
            bot_token: env_string(&lookup, "BOT_TOKEN", "").trim().to_string(),
            log_level: env_string(&lookup, "LOG_LEVEL", "info").to_lowercase(),
            log_dir: env_string(&lookup, "LOG_DIR", "logs"),
            privileged_username: env_string(&lookup, "PRIVILEGED_USERNAME", "evgeny_pashkin")
                .trim()
                .to_string(),
            unsplash_access_key: env_string(&lookup, "UNSPLASH_ACCESS_KEY", "")
                .trim()
                .to_string(),
            unsplash_api_url: env_string(
                &lookup,
                "UNSPLASH_API_URL",
                "https://api.unsplash.com/photos/random",
            ),
            unsplash_orientation: normalize_orientation(env_string(
                &lookup,
                "UNSPLASH_ORIENTATION",
                "portrait",
            )),
            unsplash_content_filter: normalize_content_filter(env_string(
                &lookup,
                "UNSPLASH_CONTENT_FILTER",
                "",
            )),
            unsplash_count: env_u64(&lookup, "UNSPLASH_COUNT", 0).min(30) as u32,
            unsplash_timeout_seconds: env_u64(&lookup, "UNSPLASH_TIMEOUT_SECONDS", 10).max(1),
            photo_queries,
            query_limit: env_usize(&lookup, "QUERY_LIMIT", 8),
            attempts_per_query: env_usize(&lookup, "ATTEMPTS_PER_QUERY", 3).max(1),
            recent_cache_limit: env_usize(&lookup, "RECENT_CACHE_LIMIT", 200),
        }
    }

    /// Both secrets are required before any update is served.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            return Err(anyhow!("BOT_TOKEN is required"));
        }
        if self.unsplash_access_key.is_empty() {
            return Err(anyhow!("UNSPLASH_ACCESS_KEY is required"));
        }
        Ok(())
    }
}
