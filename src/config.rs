// Settings: defaults -> optional TOML file -> ZIMAM_* environment variables.
// Command-line overrides are applied by the binaries on top of this.

use crate::clock::{self, Clock, OffsetClock};
use crate::language::Language;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_CONFIG_PATH: &str = "zimam.toml";
pub const ENV_PREFIX: &str = "ZIMAM";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Language used when nothing has been saved yet
    pub language: Language,
    /// SQLite file; None keeps everything in memory for the session
    pub database: Option<PathBuf>,
    pub export_dir: PathBuf,
    /// tracing filter level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Fixed UTC offset for "today"; None uses the host timezone
    pub utc_offset_minutes: Option<i32>,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: Language::En,
            database: None,
            export_dir: PathBuf::from("exports"),
            log_level: "info".to_string(),
            utc_offset_minutes: None,
            server: ServerSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Settings {
    /// Load settings. `path` defaults to `zimam.toml`, which may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: ::config::Environment) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let settings: Settings = ::config::Config::builder()
            .add_source(::config::File::from(file.as_path()).required(required))
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read settings from {}", file.display()))?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if let Some(minutes) = self.utc_offset_minutes {
            if OffsetClock::from_minutes(minutes).is_none() {
                return Err(anyhow!("utc_offset_minutes out of range: {}", minutes));
            }
        }
        Ok(())
    }

    /// Clock matching the configured timezone
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.utc_offset_minutes.and_then(OffsetClock::from_minutes) {
            Some(clock) => Arc::new(clock),
            None => clock::system(),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

/// `ZIMAM_LOG_LEVEL`, `ZIMAM_SERVER__PORT`: `_` after the prefix, `__` between nested keys
fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "zimam_delivery={level},zimam={level},zimam_server={level}"
        ))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("zimam-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.language, Language::En);
        assert_eq!(settings.database, None);
        assert_eq!(settings.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_load_from_file() {
        let path = write_config(
            r#"
language = "ar"
database = "data/zimam.db"
utc_offset_minutes = 240

[server]
port = 8080
"#,
        );

        let settings = Settings::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.language, Language::Ar);
        assert_eq!(settings.database, Some(PathBuf::from("data/zimam.db")));
        assert_eq!(settings.utc_offset_minutes, Some(240));
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("zimam-does-not-exist.toml");
        assert!(Settings::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_out_of_range_offset_rejected() {
        for minutes in ["100000", "40000000", "-40000000"] {
            let path = write_config(&format!("utc_offset_minutes = {}\n", minutes));
            let result = Settings::load(Some(path.as_path()));
            std::fs::remove_file(&path).unwrap();

            let err = result.unwrap_err();
            assert!(err.to_string().contains("out of range"), "{}: {:#}", minutes, err);
        }
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = write_config("log_level = \"warn\"\n[server]\nport = 8080\n");
        let vars: ::config::Map<String, String> = [
            ("ZIMAM_LOG_LEVEL", "debug"),
            ("ZIMAM_SERVER__PORT", "9090"),
            ("ZIMAM_LANGUAGE", "ar"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let settings =
            Settings::load_with_env(Some(path.as_path()), environment().source(Some(vars)))
                .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.language, Language::Ar);
    }
}
