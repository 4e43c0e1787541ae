use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default backend base URL. The hosted backend sleeps when idle, which is
/// why the executor carries cold-start retry logic.
pub const DEFAULT_BASE_URL: &str = "https://cleanfilesbackend.onrender.com";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;

/// Gateway configuration. Every field can be overridden at startup, either
/// through the environment (`from_env`) or by mutating the struct before the
/// gateway is constructed.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Upper bound on a single in-flight request. A request past this bound
    /// is cancelled and reported as `Timeout`, distinct from a connection
    /// failure.
    pub request_timeout: Duration,
    /// Total attempt budget for cold-start (502/503) and transport retries.
    pub max_retries: u32,
    /// Fixed inter-attempt delay.
    pub retry_delay: Duration,
    /// Forces fallback mode regardless of backend reachability.
    pub demo_mode: bool,
    /// Where the session (tokens, profile, mode flag) is persisted.
    pub state_path: PathBuf,
    /// Simulated latency band for fallback operations, in milliseconds.
    /// An empty range disables the delay (used by tests).
    pub fallback_latency_ms: Range<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            demo_mode: false,
            state_path: std::env::temp_dir().join("recruitai_session.json"),
            fallback_latency_ms: 150..450,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables, falling back to the
    /// defaults above for anything unset.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Self::default();
        Ok(Self {
            base_url: std::env::var("RECRUITAI_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: Duration::from_millis(env_u64(
                "RECRUITAI_TIMEOUT_MS",
                DEFAULT_TIMEOUT_MS,
            )?),
            max_retries: env_u64("RECRUITAI_MAX_RETRIES", u64::from(DEFAULT_MAX_RETRIES))? as u32,
            retry_delay: Duration::from_millis(env_u64(
                "RECRUITAI_RETRY_DELAY_MS",
                DEFAULT_RETRY_DELAY_MS,
            )?),
            demo_mode: std::env::var("RECRUITAI_DEMO_MODE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            state_path: std::env::var("RECRUITAI_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            fallback_latency_ms: env_u64(
                "RECRUITAI_FALLBACK_LATENCY_MIN_MS",
                defaults.fallback_latency_ms.start,
            )?..env_u64(
                "RECRUITAI_FALLBACK_LATENCY_MAX_MS",
                defaults.fallback_latency_ms.end,
            )?,
        })
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}
