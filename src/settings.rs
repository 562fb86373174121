use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PainelError, Result};
use crate::reports::CategoryField;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_transactions_file")]
    pub transactions_file: String,
    #[serde(default = "default_networth_file")]
    pub networth_file: String,
    #[serde(default = "default_household_categories")]
    pub household_categories: Vec<String>,
    #[serde(default = "default_household_field")]
    pub household_field: CategoryField,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_transactions_file() -> String {
    "dados.csv".to_string()
}

fn default_networth_file() -> String {
    "patrimonio.csv".to_string()
}

fn default_household_categories() -> Vec<String> {
    [
        "Academia Mami",
        "COMGÁS",
        "ENEL",
        "Fatura Mami",
        "IPTU",
        "Mercado",
        "NET Claro",
        "Prevent Sênior",
        "SABESP",
        "Casa",
        "Faxina",
        "Jardineiro",
        "Lima",
        "Piscina",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_household_field() -> CategoryField {
    CategoryField::Subcategoria
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            transactions_file: default_transactions_file(),
            networth_file: default_networth_file(),
            household_categories: default_household_categories(),
            household_field: default_household_field(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn transactions_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.transactions_file)
    }

    pub fn networth_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.networth_file)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("painel")
}

pub fn settings_path() -> PathBuf {
    std::env::var_os("PAINEL_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("settings.json"))
}

/// Settings from disk, or defaults when the file is missing.
/// A file that exists but can't be parsed is an error.
pub fn load_settings() -> Result<Settings> {
    let path = settings_path();
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content)
        .map_err(|e| PainelError::Settings(format!("{}: {e}", path.display())))
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = settings_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| PainelError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
