use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_LOCALE: &str = "es-AR";
pub const DEFAULT_CURRENCY: &str = "ARS";
const DATA_DIR_NAME: &str = "gasto";

/// User-level preferences for the terminal front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Formatting preset tag, e.g. `es-AR`, `pt-BR`, `en-US`.
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    /// ISO 4217 code shown with amounts.
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root for per-user expense data. Defaults to `<data dir>/gasto`.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            currency: Self::default_currency(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_locale() -> String {
        DEFAULT_LOCALE.into()
    }

    pub fn default_currency() -> String {
        DEFAULT_CURRENCY.into()
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(DATA_DIR_NAME)
    }
}
