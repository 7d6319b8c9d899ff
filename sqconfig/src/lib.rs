//! # ShuffleQ Configuration Module
//!
//! This module provides configuration management for ShuffleQ, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ## Usage
//!
//! ```no_run
//! use sqconfig::get_config;
//!
//! // Get the global configuration
//! let config = get_config();
//!
//! // Access configuration values
//! let port = config.get_http_port();
//! let sentinel = config.get_sentinel_uri();
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::{info, warn};

// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("shuffleq.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load ShuffleQ configuration"));
}

const ENV_CONFIG_DIR: &str = "SHUFFLEQ_CONFIG";
const ENV_PREFIX: &str = "SHUFFLEQ_CONFIG__";

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_POLL_ATTEMPTS: usize = 5;
const DEFAULT_SETTLE_MS: u64 = 1000;

// The queue boundary marker inherited from the original deployment. Queueing
// this exact track defeats the prefix extraction; that collision is an
// accepted limitation, not detected or mitigated.
const DEFAULT_SENTINEL_URI: &str = "spotify:track:5zOKuItOTZhRCGtPrDYmlj";

/// Configuration manager for ShuffleQ
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
///
/// # Examples
///
/// ```no_run
/// use sqconfig::get_config;
///
/// let config = get_config();
/// let port = config.get_http_port();
/// println!("HTTP port: {}", port);
/// ```
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

// Manual Clone because of the Mutex
impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data.lock().unwrap().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(".shuffleq").exists() {
            return ".shuffleq".to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(".shuffleq");
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        ".shuffleq".to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        // Create if doesn't exist
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        // Verify it's a directory
        if !path.is_dir() {
            return Err(anyhow!("Config path is not a directory"));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        // Test read permission
        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `SHUFFLEQ_CONFIG` environment variable
    /// 3. `.shuffleq` in the current directory
    /// 4. `.shuffleq` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for
    /// read/write permissions.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created or validated
    pub fn config_dir(directory: &str) -> String {
        let dir_path = Self::find_config_dir(directory);
        let path = Path::new(&dir_path);

        Self::validate_config_dir(path).expect("Failed to validate configuration directory");

        dir_path
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or empty to use defaults
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing the loaded `Config` or an error
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory);
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        // Load the embedded default configuration
        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        // Try to load the external configuration file
        let yaml_data = if let Ok(data) = fs::read(&path) {
            info!(config_file = %path, "Loaded config file");
            data
        } else {
            info!(config_file = %path, "Config file not found, using default embedded config");
            DEFAULT_CONFIG.as_bytes().to_vec()
        };

        // Merge with the default configuration
        let external_value: Value = serde_yaml::from_slice(&yaml_data)?;
        merge_yaml(&mut default_value, &external_value);
        let mut config_value = Self::lower_keys_value(default_value);

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut config_value);

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
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Returns the configuration directory in use
    pub fn dir(&self) -> &str {
        &self.config_dir
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["host", "http_port"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()?;
        Ok(())
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key = path[0].to_lowercase();
            let key_value = Value::String(key.clone());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["host", "http_port"]`)
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing the YAML value or an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if key.starts_with(ENV_PREFIX) {
                let key_path = key
                    .trim_start_matches(ENV_PREFIX)
                    .split("__")
                    .collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                let _ = Self::set_value_internal(config, &key_path, yaml_value);
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        let new_key = Value::String(s.to_lowercase());
                        let new_val = Self::lower_keys_value(v);
                        new_map.insert(new_key, new_val);
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Gets the base URL for the HTTP server
    ///
    /// Returns the configured base URL, or the default localhost URL if
    /// not configured.
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["host", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            Ok(_) => {
                warn!("Base URL is not a string or empty, using default");
                DEFAULT_BASE_URL.to_string()
            }
            Err(err) => {
                warn!("Failed to get base URL: {}, using default", err);
                DEFAULT_BASE_URL.to_string()
            }
        }
    }

    /// Gets the HTTP port from configuration
    ///
    /// Returns the configured HTTP port, or the default port (8080) if not
    /// configured or invalid.
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap() as u16,
            Ok(Value::String(s)) => match s.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    warn!("Invalid HTTP port '{}', using default {}", s, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(_) => {
                warn!("HTTP port not a number or string, using default {}", DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }
            Err(err) => {
                warn!("Failed to get HTTP port: {}, using default {}", err, DEFAULT_HTTP_PORT);
                DEFAULT_HTTP_PORT
            }
        }
    }

    /// Sets the HTTP port in configuration
    pub fn set_http_port(&self, port: u16) -> Result<()> {
        let n = Number::from(port);
        self.set_value(&["host", "http_port"], Value::Number(n))
    }

    /// Gets the sentinel track URI used to mark the queue boundary
    ///
    /// The sentinel is appended to the remote queue so that the snapshot
    /// prefix belonging to the user can be told apart from auto-play
    /// suggestions. It must be a track the user never keeps in rotation;
    /// if the user queues this exact track themselves, the boundary
    /// detection silently truncates at their copy. That collision is an
    /// accepted limitation.
    pub fn get_sentinel_uri(&self) -> String {
        match self.get_value(&["shuffle", "sentinel_uri"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            Ok(_) => {
                warn!("Sentinel URI is not a string or empty, using default");
                DEFAULT_SENTINEL_URI.to_string()
            }
            Err(err) => {
                warn!("Failed to get sentinel URI: {}, using default", err);
                DEFAULT_SENTINEL_URI.to_string()
            }
        }
    }

    /// Sets the sentinel track URI
    pub fn set_sentinel_uri(&self, uri: &str) -> Result<()> {
        self.set_value(&["shuffle", "sentinel_uri"], Value::String(uri.to_string()))
    }

    /// Gets the maximum number of queue read attempts while waiting for
    /// the sentinel to become visible
    pub fn get_poll_attempts(&self) -> usize {
        match self.get_value(&["shuffle", "poll_attempts"]) {
            Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap() as usize,
            Ok(Value::Number(n)) if n.is_i64() && n.as_i64().unwrap() > 0 => {
                n.as_i64().unwrap() as usize
            }
            Ok(_) => {
                warn!("Poll attempts not a positive number, using default {}", DEFAULT_POLL_ATTEMPTS);
                DEFAULT_POLL_ATTEMPTS
            }
            Err(err) => {
                warn!("Failed to get poll attempts: {}, using default {}", err, DEFAULT_POLL_ATTEMPTS);
                DEFAULT_POLL_ATTEMPTS
            }
        }
    }

    /// Gets the settling delay applied after every remote call
    ///
    /// The remote service's queue visibility lags behind its write
    /// acknowledgements, so each call is followed by this fixed delay
    /// before its result is trusted.
    pub fn get_settle_delay(&self) -> Duration {
        let ms = match self.get_value(&["shuffle", "settle_ms"]) {
            Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap(),
            Ok(_) => {
                warn!("Settle delay not a number, using default {} ms", DEFAULT_SETTLE_MS);
                DEFAULT_SETTLE_MS
            }
            Err(err) => {
                warn!("Failed to get settle delay: {}, using default {} ms", err, DEFAULT_SETTLE_MS);
                DEFAULT_SETTLE_MS
            }
        };
        Duration::from_millis(ms)
    }

    /// Sets the settling delay in milliseconds
    pub fn set_settle_ms(&self, ms: u64) -> Result<()> {
        let n = Number::from(ms);
        self.set_value(&["shuffle", "settle_ms"], Value::Number(n))
    }
}

/// Returns the global configuration instance
///
/// This function provides access to the singleton configuration instance,
/// which is lazily loaded on first access.
///
/// # Examples
///
/// ```no_run
/// use sqconfig::get_config;
///
/// let config = get_config();
/// let port = config.get_http_port();
/// ```
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// This function recursively merges two YAML value trees:
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
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
        // Scalars and sequences are replaced wholesale
        (d, e) => *d = e.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_defaults() {
        let (_dir, config) = temp_config();
        assert_eq!(config.get_http_port(), 8080);
        assert_eq!(config.get_poll_attempts(), 5);
        assert_eq!(config.get_settle_delay(), Duration::from_millis(1000));
        assert!(config.get_sentinel_uri().starts_with("spotify:track:"));
    }

    #[test]
    fn test_set_get_value() {
        let (_dir, config) = temp_config();
        config
            .set_value(&["spotify", "client_id"], Value::String("abc123".into()))
            .unwrap();
        assert_eq!(
            config.get_value(&["spotify", "client_id"]).unwrap(),
            Value::String("abc123".into())
        );
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let (_dir, config) = temp_config();
        config
            .set_value(&["SPOTIFY", "Client_ID"], Value::String("xyz".into()))
            .unwrap();
        assert_eq!(
            config.get_value(&["spotify", "client_id"]).unwrap(),
            Value::String("xyz".into())
        );
    }

    #[test]
    fn test_set_http_port_roundtrip() {
        let (_dir, config) = temp_config();
        config.set_http_port(9090).unwrap();
        assert_eq!(config.get_http_port(), 9090);
    }

    #[test]
    fn test_settle_ms_roundtrip() {
        let (_dir, config) = temp_config();
        config.set_settle_ms(0).unwrap();
        assert_eq!(config.get_settle_delay(), Duration::ZERO);
    }

    #[test]
    fn test_external_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "host:\n  http_port: 9999\n",
        )
        .unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_http_port(), 9999);
        // Untouched sections keep their defaults
        assert_eq!(config.get_poll_attempts(), 5);
    }

    #[test]
    fn test_env_override() {
        // Uses a key no other test reads, so parallel loads are unaffected
        env::set_var("SHUFFLEQ_CONFIG__SPOTIFY__CLIENT_ID", "from-env");
        let (_dir, config) = temp_config();
        env::remove_var("SHUFFLEQ_CONFIG__SPOTIFY__CLIENT_ID");

        assert_eq!(
            config.get_value(&["spotify", "client_id"]).unwrap(),
            Value::String("from-env".into())
        );
    }

    #[test]
    fn test_config_is_persisted() {
        let dir = TempDir::new().unwrap();
        {
            let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
            config.set_http_port(8123).unwrap();
        }
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_http_port(), 8123);
    }
}
