use crate::domain::AccountClass;
use crate::error::{BackofficeError, Result};
use serde::Deserialize;
use std::env;
use std::fs;

const DEFAULT_DB_PATH: &str = "data/tatabuku.db";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_DIR: &str = "logs";

/// Runtime configuration, resolved from the environment (`.env` honored).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub port: u16,
    pub log_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_path =
            env::var("TATABUKU_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        let port = match env::var("TATABUKU_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| BackofficeError::Config(format!("invalid TATABUKU_PORT '{raw}'")))?,
            Err(_) => DEFAULT_PORT,
        };
        let log_dir = env::var("TATABUKU_LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());

        Ok(Self {
            database_path,
            port,
            log_dir,
        })
    }
}

/// Chart-of-accounts seed file (`chart_of_accounts.toml`).
#[derive(Debug, Deserialize)]
pub struct ChartFile {
    pub accounts: Vec<ChartAccount>,
}

#[derive(Debug, Deserialize)]
pub struct ChartAccount {
    pub code: String,
    pub name: String,
    pub class: AccountClass,
}

impl ChartFile {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BackofficeError::Config(format!("failed to read chart file '{path}': {e}"))
        })?;

        let chart: ChartFile = toml::from_str(&content)
            .map_err(|e| BackofficeError::Config(format!("invalid chart file '{path}': {e}")))?;

        if chart.accounts.is_empty() {
            return Err(BackofficeError::Config(format!(
                "chart file '{path}' defines no accounts"
            )));
        }

        Ok(chart)
    }
}
