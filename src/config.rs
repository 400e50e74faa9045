use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
#[cfg(unix)]
use std::{fs::Permissions, os::unix::fs::PermissionsExt};

use serde::Deserialize;
use thiserror::Error;

use crate::default_config::DEFAULT_CONFIG_TOML;

pub const CONFIG_DIR_NAME: &str = ".gemini-todo";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME is not set")]
    NoHome,
    #[error("failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config file '{path}' is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to render merged config: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("{0} is not configured; set it in the config file or via {1}")]
    Missing(&'static str, &'static str),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TodoConfig {
    pub supabase: SupabaseConfig,
    pub gemini: GeminiConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            supabase: SupabaseConfig::default(),
            gemini: GeminiConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: "todos".to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-3-flash-preview".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl TodoConfig {
    /// Loads the config file (creating or topping it up with defaults), then
    /// applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = ensure_config_file(path)?;
        let mut config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = non_empty("SUPABASE_URL") {
            self.supabase.url = url;
        }
        if let Some(key) = non_empty("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = key;
        }
        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.gemini.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supabase.url.trim().is_empty() {
            return Err(ConfigError::Missing("supabase.url", "SUPABASE_URL"));
        }
        if self.supabase.anon_key.trim().is_empty() {
            return Err(ConfigError::Missing("supabase.anon_key", "SUPABASE_ANON_KEY"));
        }
        Ok(())
    }
}

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::NoHome)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Returns the file contents after merging in any default keys the user file
/// lacks. The file is rewritten only when the merge changed something.
pub fn ensure_config_file(path: &Path) -> Result<String, ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let existing = match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(io_err(err)),
    };
    let merged = merge_with_defaults(existing.as_deref()).map_err(|err| match err {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    if existing.as_deref() != Some(merged.as_str()) {
        write_owner_only_atomic(path, &merged).map_err(io_err)?;
    }
    Ok(merged)
}

fn merge_with_defaults(user_text: Option<&str>) -> Result<String, ConfigError> {
    let parse = |text: &str| -> Result<toml::Value, ConfigError> {
        if text.trim().is_empty() {
            return Ok(toml::Value::Table(toml::map::Map::new()));
        }
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })
    };
    let mut merged = parse(DEFAULT_CONFIG_TOML)?;
    merge_tables(&mut merged, parse(user_text.unwrap_or_default())?);
    Ok(toml::to_string_pretty(&merged)?)
}

fn merge_tables(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_map), toml::Value::Table(overlay_map)) => {
            for (key, item) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_tables(slot, item),
                    None => {
                        base_map.insert(key, item);
                    }
                }
            }
        }
        (slot, item) => *slot = item,
    }
}

fn write_owner_only_atomic(path: &Path, text: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let tmp = parent.join(format!(".config.toml.tmp-{}-{nanos}", std::process::id()));
    let file = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
    restrict_permissions(&tmp)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    fs::set_permissions(path, Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
