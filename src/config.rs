//! # Bot Configuration Module
//!
//! This module defines configuration structures for the bot core,
//! including report storage, dialogue timeout, and lookup-client settings.
//!
//! Configuration is read from the environment exactly once at startup
//! ([`BotConfig::from_env`]); the core components receive plain values.

use std::env;
use std::path::PathBuf;

// Constants for bot configuration
pub const DEFAULT_REPORT_DIR: &str = "./reports";
pub const DEFAULT_DIALOG_TIMEOUT_SECS: u64 = 600; // 10 minutes of idle dialogue
pub const DEFAULT_HH_BASE: &str = "https://api.hh.ru";
pub const DEFAULT_USER_AGENT: &str = "hr-assist-bot/0.1";
pub const DEFAULT_PAGES: u32 = 3;
pub const DEFAULT_PER_PAGE: u32 = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Settings for the hh.ru vacancy lookup client
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base URL of the vacancies API
    pub base_url: String,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Number of result pages to fetch per query
    pub pages: u32,
    /// Results requested per page
    pub per_page: u32,
    /// Timeout for a single HTTP request in seconds
    pub request_timeout_secs: u64,
    /// Maximum number of retry attempts per page
    pub max_retries: u32,
    /// Base delay between retries in milliseconds (jittered)
    pub base_retry_delay_ms: u64,
    /// Pause between page fetches in milliseconds
    pub page_pause_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HH_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pages: DEFAULT_PAGES,
            per_page: DEFAULT_PER_PAGE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: 3,
            base_retry_delay_ms: 1000, // 1 second
            page_pause_ms: 400,
        }
    }
}

/// Top-level configuration for the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Directory where report artifacts are written
    pub report_dir: PathBuf,
    /// Idle timeout after which a dialogue session is discarded, seconds
    pub dialog_idle_timeout_secs: u64,
    /// Lookup client settings
    pub search: SearchConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            dialog_idle_timeout_secs: DEFAULT_DIALOG_TIMEOUT_SECS,
            search: SearchConfig::default(),
        }
    }
}

impl BotConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(dir) = env::var("REPORT_DIR") {
            if !dir.trim().is_empty() {
                cfg.report_dir = PathBuf::from(dir);
            }
        }
        if let Some(secs) = env_u64("DIALOG_TIMEOUT_SECS") {
            cfg.dialog_idle_timeout_secs = secs;
        }
        if let Ok(base) = env::var("PARSER_HH_BASE") {
            if !base.trim().is_empty() {
                cfg.search.base_url = base;
            }
        }
        if let Ok(agent) = env::var("PARSER_USER_AGENT") {
            if !agent.trim().is_empty() {
                cfg.search.user_agent = agent;
            }
        }
        if let Some(secs) = env_u64("REQUEST_TIMEOUT") {
            cfg.search.request_timeout_secs = secs;
        }
        cfg
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_reasonable() {
        let cfg = BotConfig::default();
        assert_eq!(cfg.report_dir, PathBuf::from(DEFAULT_REPORT_DIR));
        assert_eq!(cfg.dialog_idle_timeout_secs, 600);
        assert!(cfg.search.pages > 0);
        assert!(cfg.search.per_page > 0);
        assert!(cfg.search.max_retries <= 10);
        assert!(cfg.search.request_timeout_secs > 0);
    }
}
