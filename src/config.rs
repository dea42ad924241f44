//! Trainer configuration.
//!
//! Every field has a default, so an empty TOML document yields the
//! same configuration as [`TrainerConfig::default`].

use std::time::Duration;

use serde::Deserialize;

use crate::{error::TrainerError, messages::Locale};

pub const DEFAULT_TABLEBASE_URL: &str = "https://tablebase.lichess.ovh/standard";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub locale: Locale,
    /// Pause before the opponent replies, in milliseconds
    pub opponent_delay_ms: u64,
    /// Minimum wdl change that earns an informational toast
    pub significant_wdl_threshold: f64,
    /// Number of candidate moves requested from the knowledge base
    pub top_moves_limit: usize,
    pub tablebase: TablebaseConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            opponent_delay_ms: 500,
            significant_wdl_threshold: 1.0,
            top_moves_limit: 3,
            tablebase: TablebaseConfig::default(),
        }
    }
}

impl TrainerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, TrainerError> {
        Ok(toml::from_str(source)?)
    }

    pub fn opponent_delay(&self) -> Duration {
        Duration::from_millis(self.opponent_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TablebaseConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for TablebaseConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TABLEBASE_URL.to_owned(),
            timeout_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = TrainerConfig::from_toml_str("").unwrap();
        assert_eq!(config, TrainerConfig::default());
        assert_eq!(config.opponent_delay(), Duration::from_millis(500));
    }

    #[test]
    fn overrides_nested_fields() {
        let config = TrainerConfig::from_toml_str(
            r#"
            locale = "de"
            opponent_delay_ms = 1200

            [tablebase]
            timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.locale, Locale::De);
        assert_eq!(config.opponent_delay_ms, 1200);
        assert_eq!(config.top_moves_limit, 3);
        assert_eq!(config.tablebase.timeout_ms, 250);
        assert_eq!(config.tablebase.base_url, DEFAULT_TABLEBASE_URL);
    }

    #[test]
    fn rejects_unknown_locale() {
        assert!(matches!(
            TrainerConfig::from_toml_str(r#"locale = "fr""#),
            Err(TrainerError::Config(_))
        ));
    }
}
