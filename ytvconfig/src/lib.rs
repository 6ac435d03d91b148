//! # ytview configuration
//!
//! YAML configuration for the player front end:
//! - an embedded default configuration merged with `<config_dir>/config.yaml`
//! - environment variable overrides (`YTVIEW_CONFIG__PLAYER__STOP_GRACE_MS=250`)
//! - typed getters, plus `set_value` for raw edits
//! - a lazily loaded global instance
//!
//! ## Usage
//!
//! ```no_run
//! use ytvconfig::get_config;
//!
//! let config = get_config()?;
//! let port = config.get_remote_port()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = include_str!("ytview.yaml");

lazy_static! {
    static ref CONFIG: std::result::Result<Arc<Config>, String> =
        Config::load_config("").map(Arc::new).map_err(|e| e.to_string());
}

const ENV_CONFIG_DIR: &str = "YTVIEW_CONFIG";
const ENV_PREFIX: &str = "YTVIEW_CONFIG__";
const CONFIG_DIR_NAME: &str = ".ytview";

const DEFAULT_REMOTE_HOST: &str = "127.0.0.1";
const DEFAULT_REMOTE_PORT: u16 = 8080;
const DEFAULT_REMOTE_PASSWORD: &str = "ytview";
const DEFAULT_REMOTE_PATH: &str = "/requests/status.xml";
const DEFAULT_REMOTE_ATTEMPTS: u64 = 3;
const DEFAULT_REMOTE_RETRY_DELAY_MS: u64 = 100;
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 1000;
const DEFAULT_STOP_GRACE_MS: u64 = 100;
const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_LOG_FILE: &str = "logs/ytview.log";

/// Getter for a non-negative integer with default
macro_rules! impl_u64_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<u64> {
            match self.get_value($path)? {
                Value::Number(n) => Ok(n.as_u64().unwrap_or($default)),
                Value::String(s) => Ok(s.trim().parse().unwrap_or($default)),
                _ => Ok($default),
            }
        }
    };
}

/// Getter for a millisecond value exposed as a `Duration`
macro_rules! impl_duration_ms_config {
    ($getter:ident, $path:expr, $default_ms:expr) => {
        pub fn $getter(&self) -> Result<Duration> {
            let ms = match self.get_value($path)? {
                Value::Number(n) => n.as_u64().unwrap_or($default_ms),
                Value::String(s) => s.trim().parse().unwrap_or($default_ms),
                _ => $default_ms,
            };
            Ok(Duration::from_millis(ms))
        }
    };
}

/// Getter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path)? {
                Value::Bool(b) => Ok(b),
                _ => Ok($default),
            }
        }
    };
}

/// Getter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<String> {
            match self.get_value($path)? {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                _ => Ok($default.to_string()),
            }
        }
    };
}

/// Configuration manager for ytview
///
/// Holds the merged YAML tree and writes every change back to
/// `<config_dir>/config.yaml`.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(self.data.lock().clone()),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    /// Creates the directory if needed and checks it is readable and writable
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `YTVIEW_CONFIG` environment variable
    /// 3. `.ytview` in the current directory
    /// 4. `.ytview` in the user's home directory
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from `directory`, or from the searched
    /// directory when empty.
    ///
    /// The embedded defaults are merged with `config.yaml`, keys are
    /// lower-cased, `YTVIEW_CONFIG__*` overrides are applied and the result
    /// is saved back.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            data
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Keys are lower-cased on both sides before merging. An empty file
        // parses as Null and leaves the defaults in place.
        let external_value = lower_keys_value(serde_yaml::from_slice(&yaml_data)?);
        let mut config_value = lower_keys_value(default_value);
        if !external_value.is_null() {
            merge_yaml(&mut config_value, &external_value);
        }

        apply_env_overrides_from(&mut config_value, env::vars());

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.data.lock())?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// `path` is the list of keys, e.g. `&["player", "stop_grace_ms"]`.
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data.lock();
            set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    /// Gets the configuration value at `path`, failing if it does not exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock();
        get_value_internal(&data, path)
    }

    /// Resolves a configured file path against the config directory and
    /// creates its parent directory.
    pub fn get_managed_file(&self, path: &[&str], default: &str) -> Result<PathBuf> {
        let file = match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => {
                self.set_value(path, Value::String(default.to_string()))?;
                default.to_string()
            }
        };

        let file = Path::new(&file);
        let absolute = if file.is_absolute() {
            file.to_path_buf()
        } else {
            Path::new(&self.config_dir).join(file)
        };

        if let Some(parent) = absolute.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                info!(directory = %parent.display(), "Created directory");
            }
        }
        Ok(absolute)
    }

    // ------------------------------------------------------------------
    // player.remote_control
    // ------------------------------------------------------------------

    impl_string_config!(
        get_remote_host,
        &["player", "remote_control", "host"],
        DEFAULT_REMOTE_HOST
    );

    /// Control endpoint port, falling back to 8080 if unset or invalid
    pub fn get_remote_port(&self) -> Result<u16> {
        let raw = match self.get_value(&["player", "remote_control", "port"])? {
            Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            Value::String(s) => s.trim().parse::<u16>().ok(),
            _ => None,
        };
        Ok(raw.unwrap_or_else(|| {
            warn!("Invalid remote control port, using default {}", DEFAULT_REMOTE_PORT);
            DEFAULT_REMOTE_PORT
        }))
    }

    impl_string_config!(
        get_remote_password,
        &["player", "remote_control", "password"],
        DEFAULT_REMOTE_PASSWORD
    );

    impl_string_config!(
        get_remote_path,
        &["player", "remote_control", "path"],
        DEFAULT_REMOTE_PATH
    );

    impl_u64_config!(
        get_remote_attempts,
        &["player", "remote_control", "attempts"],
        DEFAULT_REMOTE_ATTEMPTS
    );

    impl_duration_ms_config!(
        get_remote_retry_delay,
        &["player", "remote_control", "retry_delay_ms"],
        DEFAULT_REMOTE_RETRY_DELAY_MS
    );

    impl_duration_ms_config!(
        get_remote_timeout,
        &["player", "remote_control", "timeout_ms"],
        DEFAULT_REMOTE_TIMEOUT_MS
    );

    // ------------------------------------------------------------------
    // player
    // ------------------------------------------------------------------

    impl_duration_ms_config!(
        get_stop_grace,
        &["player", "stop_grace_ms"],
        DEFAULT_STOP_GRACE_MS
    );

    impl_duration_ms_config!(
        get_progress_interval,
        &["player", "progress_interval_ms"],
        DEFAULT_PROGRESS_INTERVAL_MS
    );

    // ------------------------------------------------------------------
    // host.logger
    // ------------------------------------------------------------------

    impl_string_config!(
        get_log_min_level,
        &["host", "logger", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );

    impl_bool_config!(
        get_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Absolute path of the log file, its directory created if missing
    pub fn get_log_file(&self) -> Result<PathBuf> {
        self.get_managed_file(&["host", "logger", "file"], DEFAULT_LOG_FILE)
    }
}

/// Returns the global configuration instance, loaded on first access
///
/// ```no_run
/// let config = ytvconfig::get_config()?;
/// let grace = config.get_stop_grace()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_config() -> Result<Arc<Config>> {
    match &*CONFIG {
        Ok(config) => Ok(Arc::clone(config)),
        Err(err) => Err(anyhow!("failed to load ytview configuration: {}", err)),
    }
}

/// Applies `YTVIEW_CONFIG__A__B=value` pairs to `config`.
///
/// Values are parsed as YAML, so `true` or `250` keep their type.
pub fn apply_env_overrides_from<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let key_path = suffix.split("__").collect::<Vec<_>>();
        if key_path.iter().any(|k| k.is_empty()) {
            continue;
        }
        let yaml_value = convert_env_value(&value);
        if let Err(err) = set_value_internal(config, &key_path, yaml_value) {
            warn!(variable = %key, error = %err, "Ignoring configuration override");
        }
    }
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key_value = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key_value, value);
        } else {
            let entry = map
                .entry(key_value)
                .or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        if let Value::Mapping(map) = current {
            match map.get(&Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            }
        } else {
            return Err(anyhow!("Path {} is not a map", path[..i].join(".")));
        }
    }
    Ok(current.clone())
}

fn convert_env_value(value: &str) -> Value {
    match serde_yaml::from_str::<Value>(value) {
        Ok(Value::Null) if !value.trim().is_empty() => Value::String(value.to_string()),
        Ok(parsed) => parsed,
        Err(_) => Value::String(value.to_string()),
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges `external` into `default`: mappings recursively, anything else replaced.
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
