//! Configuration module
//!
//! Environment-driven configuration for the connector service: bind address,
//! body/fetch limits, session retention, blob storage, and the recognizer
//! endpoint. Values are read once at startup via [`Config::from_env`].

use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 23119;
const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_IDLE_SECS: u64 = 600;
const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_MAX_SESSIONS: usize = 100;
const DEFAULT_RECOGNIZER_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RECOGNITION_WORKERS: usize = 2;

#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP listener binds to. Loopback by default; the service
    /// trusts its callers and must not be exposed beyond the local machine.
    pub bind_address: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
    /// Upper bound on a single fetched attachment body.
    pub max_attachment_bytes: usize,
    pub fetch_timeout_secs: u64,
    /// Directory snapshot and file attachments are written under.
    pub blob_dir: PathBuf,
    pub session_idle_secs: u64,
    pub session_sweep_interval_secs: u64,
    pub max_sessions: usize,
    /// Metadata recognition web service. Recognition is disabled when unset.
    pub recognizer_url: Option<String>,
    pub recognizer_timeout_secs: u64,
    pub recognition_workers: usize,
    pub environment: String,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let blob_dir = env::var("REFSTASH_BLOB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("refstash-attachments"));

        Ok(Self {
            bind_address: env_or("REFSTASH_BIND_ADDRESS", "127.0.0.1"),
            server_port: env_parse("REFSTASH_PORT", DEFAULT_PORT),
            cors_origins: env::var("REFSTASH_CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_body_bytes: env_parse("REFSTASH_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
            max_attachment_bytes: env_parse(
                "REFSTASH_MAX_ATTACHMENT_BYTES",
                DEFAULT_MAX_ATTACHMENT_BYTES,
            ),
            fetch_timeout_secs: env_parse("REFSTASH_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS),
            blob_dir,
            session_idle_secs: env_parse("REFSTASH_SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS),
            session_sweep_interval_secs: env_parse(
                "REFSTASH_SESSION_SWEEP_INTERVAL_SECS",
                DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
            ),
            max_sessions: env_parse("REFSTASH_MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            recognizer_url: env::var("REFSTASH_RECOGNIZER_URL").ok().filter(|s| !s.is_empty()),
            recognizer_timeout_secs: env_parse(
                "REFSTASH_RECOGNIZER_TIMEOUT_SECS",
                DEFAULT_RECOGNIZER_TIMEOUT_SECS,
            ),
            recognition_workers: env_parse(
                "REFSTASH_RECOGNITION_WORKERS",
                DEFAULT_RECOGNITION_WORKERS,
            ),
            environment: env_or("ENVIRONMENT", "development"),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            server_port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            blob_dir: env::temp_dir().join("refstash-attachments"),
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
            session_sweep_interval_secs: DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            recognizer_url: None,
            recognizer_timeout_secs: DEFAULT_RECOGNIZER_TIMEOUT_SECS,
            recognition_workers: DEFAULT_RECOGNITION_WORKERS,
            environment: "development".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
