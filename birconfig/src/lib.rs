//! # BIR client configuration
//!
//! Configuration management for the BIR registry client:
//! - Loading configuration from a YAML file
//! - Merging with the embedded default configuration
//! - Environment variable overrides
//! - Path-based getters and setters, persisted on write
//! - Process-wide lazily loaded instance
//!
//! Client-specific settings (API key, timeout, endpoint) are exposed by
//! extension traits living in the crates that consume them, so this crate
//! only knows about the YAML tree and the logger section.
//!
//! ## Usage
//!
//! ```no_run
//! use birconfig::get_config;
//! use serde_yaml::Value;
//!
//! let config = get_config()?;
//! let level = config.get_log_min_level()?;
//! config.set_value(&["logger", "min_level"], Value::String("DEBUG".into()))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use once_cell::sync::OnceCell;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, info};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("bir.yaml");

static CONFIG: OnceCell<Arc<Config>> = OnceCell::new();

const ENV_CONFIG_DIR: &str = "BIR_CONFIG";
const ENV_PREFIX: &str = "BIR_CONFIG__";
const CONFIG_DIR_NAME: &str = ".birclient";
const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

/// Configuration manager
///
/// Holds the merged YAML tree behind a mutex. Every setter writes the whole
/// tree back to `config.yaml`.
#[derive(Debug)]
pub struct Config {
    config_dir: PathBuf,
    path: PathBuf,
    data: Mutex<Value>,
}

impl Config {
    /// Picks the configuration directory.
    ///
    /// Order: explicit `directory`, `BIR_CONFIG`, `./.birclient`,
    /// `~/.birclient`, and finally `./.birclient` (created on demand).
    fn find_config_dir(directory: &str) -> PathBuf {
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Config directory from environment");
            return PathBuf::from(env_path);
        }

        let local = Path::new(CONFIG_DIR_NAME);
        if local.exists() {
            return local.to_path_buf();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config;
            }
        }

        local.to_path_buf()
    }

    /// Creates the directory if needed and checks read/write access
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let probe = path.join(".write_test");
        fs::write(&probe, b"probe")?;
        fs::remove_file(&probe)?;
        fs::read_dir(path)?;

        Ok(())
    }

    /// Resolves and validates the configuration directory
    pub fn config_dir(directory: &str) -> Result<PathBuf> {
        let dir = Self::find_config_dir(directory);
        Self::validate_config_dir(&dir)
            .map_err(|e| anyhow!("Invalid configuration directory {}: {}", dir.display(), e))?;
        Ok(dir)
    }

    /// Loads the configuration from `directory` (empty for the default lookup)
    ///
    /// The embedded defaults are merged with `config.yaml` when it exists,
    /// keys are lowercased, `BIR_CONFIG__*` environment overrides are applied
    /// and the merged tree is written back.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        let path = config_dir.join(CONFIG_FILE_NAME);
        info!(config_dir = %config_dir.display(), "Using config directory");

        let mut merged: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path.display(), "Loaded config file");
                // Un fichier vide est valide : il ne surcharge rien
                if !data.iter().all(u8::is_ascii_whitespace) {
                    let external: Value = serde_yaml::from_slice(&data)?;
                    merge_yaml(&mut merged, &external);
                }
            }
            Err(_) => {
                info!(config_file = %path.display(), "Config file not found, using embedded defaults");
            }
        }

        let mut value = lower_keys(merged);
        apply_env_overrides(&mut value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(value),
        };
        config.save()?;
        Ok(config)
    }

    /// Directory holding `config.yaml`
    pub fn directory(&self) -> &Path {
        &self.config_dir
    }

    fn lock(&self) -> Result<MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }

    /// Writes the current tree to `config.yaml`
    pub fn save(&self) -> Result<()> {
        let yaml = {
            let data = self.lock()?;
            serde_yaml::to_string(&*data)?
        };
        fs::write(&self.path, yaml)?;
        debug!(config_file = %self.path.display(), "Configuration saved");
        Ok(())
    }

    /// Sets the value at `path` (e.g. `&["bir", "api_key"]`) and saves
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock()?;
            set_at(&mut data, path, value)?;
        }
        self.save()
    }

    /// Returns a copy of the value at `path`
    ///
    /// Keys are matched case-insensitively. A missing key is an error.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock()?;
        get_at(&data, path)
    }

    /// Returns the string at `path`, treating a missing key or an empty
    /// string as absent
    pub fn get_optional_string(&self, path: &[&str]) -> Result<Option<String>> {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s)),
            Ok(Value::String(_)) | Ok(Value::Null) | Err(_) => Ok(None),
            Ok(other) => Err(anyhow!(
                "{} is not a string: {:?}",
                path.join("."),
                other
            )),
        }
    }

    /// Minimum log level for subscribers installed by binaries
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    pub fn set_log_min_level(&self, level: &str) -> Result<()> {
        self.set_value(&["logger", "min_level"], Value::String(level.to_string()))
    }
}

/// Returns the process-wide configuration, loading it on first call
pub fn get_config() -> Result<Arc<Config>> {
    CONFIG
        .get_or_try_init(|| Config::load_config("").map(Arc::new))
        .cloned()
}

fn set_at(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        *data = value;
        return Ok(());
    };

    let Value::Mapping(map) = data else {
        return Err(anyhow!("Cannot set {}: parent is not a mapping", first));
    };

    let key = Value::String(first.to_lowercase());
    if rest.is_empty() {
        map.insert(key, value);
        Ok(())
    } else {
        let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
        set_at(entry, rest, value)
    }
}

fn get_at(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (depth, key) in path.iter().enumerate() {
        let Value::Mapping(map) = current else {
            return Err(anyhow!("{} is not a mapping", path[..depth].join(".")));
        };
        current = map
            .get(Value::String(key.to_lowercase()))
            .ok_or_else(|| anyhow!("Path {} does not exist", path[..=depth].join(".")))?;
    }
    Ok(current.clone())
}

/// `BIR_CONFIG__BIR__TIMEOUT_SECS=10` sets `bir.timeout_secs` to `10`
fn apply_env_overrides(config: &mut Value) {
    for (key, raw) in env::vars() {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = suffix.split("__").collect();
        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw.clone()));
        if let Err(e) = set_at(config, &path, value) {
            debug!(variable = %key, error = %e, "Ignoring environment override");
        }
    }
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys).collect()),
        other => other,
    }
}

/// Recursively merges `external` into `default`: mappings are merged key by
/// key, scalars and sequences are replaced.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
