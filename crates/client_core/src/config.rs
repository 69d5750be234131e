use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use toml::{Table, Value};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "classifier.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid server url '{url}': {source}")]
    InvalidServerUrl { url: String, source: url::ParseError },
    #[error("server url '{0}' must use http or https")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    /// Route prefix on the server, e.g. `/api`. Empty for the bare routes.
    pub api_prefix: String,
    pub health_check_on_startup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            api_prefix: String::new(),
            health_check_on_startup: true,
        }
    }
}

impl Settings {
    pub fn endpoints(&self) -> Result<Endpoints, SettingsError> {
        Endpoints::new(&self.server_url, &self.api_prefix)
    }

    /// Known keys only. Values of the wrong type are skipped.
    fn apply_table(&mut self, table: &Table) {
        if let Some(v) = table_str(table, "server_url") {
            self.server_url = v.to_string();
        }
        if let Some(v) = table_str(table, "api_prefix") {
            self.api_prefix = v.to_string();
        }
        let health = match table.get("health_check_on_startup") {
            Some(Value::Boolean(flag)) => Some(*flag),
            Some(Value::String(raw)) => parse_bool(raw),
            Some(other) => {
                tracing::warn!(value = %other, "health_check_on_startup must be a boolean");
                None
            }
            None => None,
        };
        if let Some(parsed) = health {
            self.health_check_on_startup = parsed;
        }
    }

    /// Environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CLASSIFIER_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__API_PREFIX") {
            self.api_prefix = v;
        }
        if let Some(v) = lookup("APP__HEALTH_CHECK_ON_STARTUP") {
            if let Some(parsed) = parse_bool(&v) {
                self.health_check_on_startup = parsed;
            }
        }
    }
}

/// Defaults, then the settings file, then the environment. An explicit
/// `path` must exist; the default `classifier.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    match fs::read_to_string(&path) {
        Ok(raw) => {
            let table = toml::from_str::<Table>(&raw).map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?;
            settings.apply_table(&table);
        }
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(SettingsError::Read { path, source }),
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

fn table_str<'a>(table: &'a Table, key: &str) -> Option<&'a str> {
    match table.get(key)? {
        Value::String(v) => Some(v.as_str()),
        other => {
            tracing::warn!(key, value = %other, "expected a string setting");
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolved service URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub health: Url,
    pub predict: Url,
    pub classes: Url,
}

impl Endpoints {
    pub fn new(server_url: &str, api_prefix: &str) -> Result<Self, SettingsError> {
        let trimmed = server_url.trim();
        let mut base = Url::parse(trimmed).map_err(|source| SettingsError::InvalidServerUrl {
            url: trimmed.to_string(),
            source,
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SettingsError::UnsupportedScheme(trimmed.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let prefix = api_prefix.trim().trim_matches('/');
        let join = |route: &str| {
            let relative = if prefix.is_empty() {
                route.to_string()
            } else {
                format!("{prefix}/{route}")
            };
            base.join(&relative)
                .map_err(|source| SettingsError::InvalidServerUrl {
                    url: trimmed.to_string(),
                    source,
                })
        };

        Ok(Self {
            health: join("health")?,
            predict: join("predict")?,
            classes: join("classes")?,
        })
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
