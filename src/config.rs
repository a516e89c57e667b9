use std::time::Duration;

/// 100 MiB, the per-file upload ceiling.
pub const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub blob_root: String,
    pub public_url: String,
    pub max_upload_bytes: u64,
    pub session_idle_minutes: i64,
}

impl Config {
    /// Reads `.env` and the process environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: dotenv::var("SYNCBRIDGE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: dotenv::var("DATABASE_URL").unwrap_or(defaults.database_url),
            blob_root: dotenv::var("BLOB_ROOT").unwrap_or(defaults.blob_root),
            public_url: dotenv::var("PUBLIC_URL").unwrap_or(defaults.public_url),
            max_upload_bytes: dotenv::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            session_idle_minutes: dotenv::var("SESSION_IDLE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.session_idle_minutes),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "sqlite://syncbridge.db?mode=rwc".to_string(),
            blob_root: "./blobs".to_string(),
            public_url: "http://localhost:8080".to_string(),
            max_upload_bytes: MAX_FILE_BYTES,
            session_idle_minutes: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Quiet period before a text edit is written.
    pub debounce: Duration,
    pub max_file_bytes: u64,
    pub reconnect_delay: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            max_file_bytes: MAX_FILE_BYTES,
            reconnect_delay: Duration::from_secs(2),
        }
    }
}
