use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Version of the xBrowserSync API this service speaks, reported by
/// `GET /info`.
pub const API_VERSION: &str = "1.1.13";

#[derive(Parser, Debug)]
#[command(name = "syncmark")]
#[command(about = "Runs the syncmark bookmark sync service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".syncmark")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_port")]
    port: i32,
    /// Free-form service message shown to clients in /info.
    #[serde(default)]
    pub message: String,
    /// Service status code: 1 = online, 2 = offline, 3 = not accepting
    /// new syncs.
    #[serde(default = "default_status")]
    pub status: i32,
}

fn default_database() -> String {
    "syncmark.db".to_string()
}

fn default_port() -> i32 {
    8080
}

fn default_status() -> i32 {
    crate::api::STATUS_ONLINE
}

impl Default for App {
    fn default() -> Self {
        App {
            database: default_database(),
            port: default_port(),
            message: String::new(),
            status: default_status(),
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> i32 {
        self.port
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    /// Loads config from the given YAML path. A missing file is not an
    /// error; defaults apply.
    pub fn new(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Config::default());
        }
        Config::load_config(path)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        let yaml_with_env = Config::substitute_env_vars(&yaml_str);
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    /// Expands `${VAR}` and `${VAR:-default}` references against the
    /// process environment. Unset variables without a default expand to
    /// the empty string.
    fn substitute_env_vars(yaml_str: &str) -> String {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            let Some(end) = result[actual_start..].find('}') else {
                break;
            };

            let var_name = &result[actual_start + 2..actual_start + end];
            let env_value = match var_name.split_once(":-") {
                Some((var, default)) => {
                    env::var(var).unwrap_or_else(|_| default.to_string())
                }
                None => env::var(var_name).unwrap_or_else(|_| {
                    tracing::warn!("environment variable '{}' not found", var_name);
                    String::new()
                }),
            };

            result.replace_range(actual_start..actual_start + end + 1, &env_value);
            offset = actual_start + env_value.len();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = Config::new("/definitely/not/a/config.yaml").unwrap();
        assert_eq!(cfg.app.get_port(), 8080);
        assert_eq!(cfg.app.get_db(), "syncmark.db");
        assert_eq!(cfg.app.status, 1);
    }

    #[test]
    fn parses_yaml_with_partial_app_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "app:\n  port: 9090\n  message: hello\n").unwrap();

        let cfg = Config::new(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.app.get_port(), 9090);
        assert_eq!(cfg.app.message, "hello");
        assert_eq!(cfg.app.get_db(), "syncmark.db");
    }

    #[test]
    fn substitutes_env_vars_with_defaults() {
        let out = Config::substitute_env_vars("port: ${SYNCMARK_TEST_UNSET_PORT:-7070}");
        assert_eq!(out, "port: 7070");

        unsafe { env::set_var("SYNCMARK_TEST_DB", "custom.db") };
        let out = Config::substitute_env_vars("database: ${SYNCMARK_TEST_DB}");
        assert_eq!(out, "database: custom.db");
    }
}
