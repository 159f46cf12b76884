use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Explicit `LOG_FORMAT`, else JSON in production and pretty elsewhere.
    pub fn resolve(raw: Option<&str>, env: &Environment) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("json") => Self::Json,
            Some("compact") => Self::Compact,
            Some("pretty") => Self::Pretty,
            _ if matches!(env, Environment::Prod) => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub log_format: LogFormat,
    pub server_addr: String,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Autosave
    pub autosave_debounce: Duration,
    pub snapshot_dir: Option<PathBuf>,
    pub change_channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Environment::Dev,
            log_format: LogFormat::Pretty,
            server_addr: "0.0.0.0:8080".to_string(),
            cors_allow_origins: vec!["http://localhost:3000".to_string()],
            autosave_debounce: Duration::from_millis(1500),
            snapshot_dir: None,
            change_channel_capacity: 256,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let env = Environment::parse(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let log_format = LogFormat::resolve(env::var("LOG_FORMAT").ok().as_deref(), &env);
        let server_addr = env::var("SERVER_ADDR").unwrap_or(defaults.server_addr);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Autosave
        let autosave_debounce = match env::var("AUTOSAVE_DEBOUNCE_MS") {
            Ok(raw) => Duration::from_millis(
                raw.trim()
                    .parse()
                    .with_context(|| format!("AUTOSAVE_DEBOUNCE_MS is not a number: {}", raw))?,
            ),
            Err(_) => defaults.autosave_debounce,
        };
        let snapshot_dir = env::var("SNAPSHOT_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let change_channel_capacity = env::var("CHANGE_CHANNEL_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.change_channel_capacity);

        Ok(Settings {
            env,
            log_format,
            server_addr,
            cors_allow_origins,
            autosave_debounce,
            snapshot_dir,
            change_channel_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_names() {
        assert_eq!(Environment::parse("Production"), Environment::Prod);
        assert_eq!(Environment::parse("staging"), Environment::Staging);
        assert_eq!(Environment::parse("anything"), Environment::Dev);
    }

    #[test]
    fn log_format_follows_environment_unless_set() {
        assert_eq!(LogFormat::resolve(None, &Environment::Prod), LogFormat::Json);
        assert_eq!(LogFormat::resolve(None, &Environment::Dev), LogFormat::Pretty);
        assert_eq!(
            LogFormat::resolve(Some("Compact"), &Environment::Prod),
            LogFormat::Compact
        );
    }
}
