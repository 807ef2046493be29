use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Tunables for the delivery queue
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// How many processed membership-event ids to remember for duplicate
    /// suppression
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
    /// Membership events older than this (by server timestamp) are ignored
    #[serde(default = "default_max_event_age_secs")]
    pub max_event_age_secs: u64,
}

fn default_dedup_capacity() -> usize {
    1000
}

fn default_max_event_age_secs() -> u64 {
    15 // seconds
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: default_dedup_capacity(),
            max_event_age_secs: default_max_event_age_secs(),
        }
    }
}

impl DeliveryConfig {
    /// Load configuration from an optional `courier` config file and
    /// `COURIER_*` environment variables, on top of the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let builder = Config::builder()
            // Start with default values
            .set_default("dedup_capacity", 1000)?
            .set_default("max_event_age_secs", 15)?
            // Load config file if exists
            .add_source(File::with_name("courier").required(false))
            // Load from environment variables
            // COURIER_DEDUP_CAPACITY, COURIER_MAX_EVENT_AGE_SECS
            .add_source(Environment::with_prefix("courier").try_parsing(true));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = DeliveryConfig::default();
        assert_eq!(config.dedup_capacity, 1000);
        assert_eq!(config.max_event_age_secs, 15);
    }

    #[test]
    fn test_load_without_sources_yields_defaults() {
        // No courier config file and no COURIER_* variables in the test
        // environment, so the builder falls through to its defaults.
        let config = DeliveryConfig::load().unwrap();
        assert_eq!(config.dedup_capacity, 1000);
        assert_eq!(config.max_event_age_secs, 15);
    }
}
