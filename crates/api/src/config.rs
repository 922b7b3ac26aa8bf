use std::path::PathBuf;

use chrono::Duration;
use tripcheck_core::continuity::{
    Enforcement, MileagePolicy, PostTripMode, DEFAULT_MAX_MILEAGE, DEFAULT_POST_TRIP_TOLERANCE,
};
use tripcheck_core::lifecycle::{EditPolicy, DEFAULT_EDIT_WINDOW_MINS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Lifecycle and continuity policy knobs.
    pub policy: InspectionPolicy,
    /// Directory backing the local object store (default: `./uploads`).
    pub upload_dir: PathBuf,
    /// Base URL under which stored photos are served.
    pub public_base_url: String,
}

/// Rules applied by the inspection service.
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectionPolicy {
    pub edit: EditPolicy,
    pub mileage: MileagePolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                    |
    /// |----------------------------------|----------------------------|
    /// | `HOST`                           | `0.0.0.0`                  |
    /// | `PORT`                           | `3000`                     |
    /// | `CORS_ORIGINS`                   | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`                       |
    /// | `UPLOAD_DIR`                     | `./uploads`                |
    /// | `PUBLIC_BASE_URL`                | `http://localhost:3000`    |
    ///
    /// Policy variables are documented on [`InspectionPolicy::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upload_dir =
            PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()));

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            policy: InspectionPolicy::from_env(),
            upload_dir,
            public_base_url,
        }
    }
}

impl InspectionPolicy {
    /// Load policy from environment variables.
    ///
    /// | Env Var                          | Default     |
    /// |----------------------------------|-------------|
    /// | `EDIT_WINDOW_MINS`               | `30`        |
    /// | `ADMIN_OVERRIDES_EDIT_WINDOW`    | `false`     |
    /// | `MAX_MILEAGE`                    | `1000000`   |
    /// | `POST_TRIP_MILEAGE_MODE`         | `tolerance` |
    /// | `POST_TRIP_MILEAGE_TOLERANCE`    | `1`         |
    /// | `POST_TRIP_MILEAGE_ENFORCEMENT`  | `warn`      |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let window_mins: i64 = env_or("EDIT_WINDOW_MINS", DEFAULT_EDIT_WINDOW_MINS)
            .parse()
            .expect("EDIT_WINDOW_MINS must be a valid i64");
        let admin_overrides_window: bool = env_or("ADMIN_OVERRIDES_EDIT_WINDOW", false)
            .parse()
            .expect("ADMIN_OVERRIDES_EDIT_WINDOW must be true or false");

        let max_mileage: i64 = env_or("MAX_MILEAGE", DEFAULT_MAX_MILEAGE)
            .parse()
            .expect("MAX_MILEAGE must be a valid i64");
        let tolerance: i64 = env_or("POST_TRIP_MILEAGE_TOLERANCE", DEFAULT_POST_TRIP_TOLERANCE)
            .parse()
            .expect("POST_TRIP_MILEAGE_TOLERANCE must be a valid i64");
        let post_trip_mode =
            PostTripMode::parse(&env_or("POST_TRIP_MILEAGE_MODE", "tolerance"), tolerance)
                .unwrap_or_else(|e| panic!("POST_TRIP_MILEAGE_MODE: {e}"));
        let enforcement: Enforcement = env_or("POST_TRIP_MILEAGE_ENFORCEMENT", "warn")
            .parse()
            .unwrap_or_else(|e| panic!("POST_TRIP_MILEAGE_ENFORCEMENT: {e}"));

        Self {
            edit: EditPolicy {
                window: Duration::minutes(window_mins),
                admin_overrides_window,
            },
            mileage: MileagePolicy {
                max_mileage,
                post_trip_mode,
                enforcement,
            },
        }
    }
}

fn env_or(key: &str, default: impl ToString) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
