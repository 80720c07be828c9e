//! Server configuration from environment variables

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;

const DEFAULT_DATA_DIR: &str = ".taskflow-data";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_JWT_SECRET: &str = "dev-jwt-secret-change-me";
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 8;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub cors: bool,
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env_string("PORT")
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let token_ttl_seconds = env_string("TASKFLOW_TOKEN_TTL_SECONDS")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);

        let jwt_secret = env_string("TASKFLOW_JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("TASKFLOW_JWT_SECRET is not set, using the development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        Self {
            data_dir: env_string("TASKFLOW_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            host: env_string("TASKFLOW_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            jwt_secret,
            token_ttl_seconds,
            cors: env_flag("TASKFLOW_CORS", true),
        }
    }

    /// Defaults rooted at `data_dir`, ignoring the environment
    #[cfg(test)]
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            jwt_secret: "test-secret".to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            cors: false,
        }
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join("tasks.json")
    }

    pub fn auth_dir(&self) -> PathBuf {
        self.data_dir.join("auth")
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid TASKFLOW_HOST '{}'", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
