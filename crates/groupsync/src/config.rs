use std::{env, time::Duration};

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB table holding Group rows (default: "groupsync-groups").
    pub groups_table: String,
    /// DynamoDB table holding UserProfile rows (default:
    /// "groupsync-profiles").
    pub profiles_table: String,
    /// Name of the invite-code GSI on the groups table (default:
    /// "invite_code-index").
    pub invite_code_index: String,
    /// Redis connection URL (default: "redis://localhost:6379").
    /// Note: Only used when the `redis` feature is enabled.
    pub redis_url: String,
    /// TTL for cached free/busy results in seconds (default: 86,400).
    pub free_busy_ttl_seconds: u64,
    /// Maximum entries in the in-process cache (default: 10,000).
    pub cache_max_entries: usize,
    /// Base URL of the Google Calendar API (default:
    /// "https://www.googleapis.com/calendar/v3"). Overridable for tests.
    pub google_api_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GROUPS_TABLE_NAME` - groups table (default: "groupsync-groups")
    /// - `PROFILES_TABLE_NAME` - profiles table (default: "groupsync-profiles")
    /// - `INVITE_CODE_INDEX_NAME` - invite-code GSI (default: "invite_code-index")
    /// - `REDIS_URL` - Redis URL (default: "redis://localhost:6379")
    /// - `FREE_BUSY_TTL_SECONDS` - cache TTL (default: 86,400)
    /// - `CACHE_MAX_ENTRIES` - in-process cache capacity (default: 10,000)
    /// - `GOOGLE_API_BASE_URL` - Google Calendar API base URL
    pub fn from_env() -> Self {
        Self {
            groups_table: env::var("GROUPS_TABLE_NAME")
                .unwrap_or_else(|_| "groupsync-groups".to_string()),
            profiles_table: env::var("PROFILES_TABLE_NAME")
                .unwrap_or_else(|_| "groupsync-profiles".to_string()),
            invite_code_index: env::var("INVITE_CODE_INDEX_NAME")
                .unwrap_or_else(|_| "invite_code-index".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            free_busy_ttl_seconds: env::var("FREE_BUSY_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            google_api_base_url: env::var("GOOGLE_API_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
        }
    }

    /// Get the free/busy cache TTL as a Duration.
    pub fn free_busy_ttl(&self) -> Duration {
        Duration::from_secs(self.free_busy_ttl_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
