use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, LedgerConfig, LoggingConfig, Simulation, TelegramConfig, VenueConfig};
pub use telemetry::init_tracing;

/// Prefix of environment variables that override file settings,
/// e.g. `FUNDARB_TELEGRAM__TOKEN` or `FUNDARB_VENUES__BINANCE__API_KEY`.
pub const ENV_PREFIX: &str = "FUNDARB";

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the configuration file,
/// layers environment overrides on top, deserializes the result into our strongly-typed
/// `Config` struct and validates it.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Same as [`load_config`] but reads an explicit file path.
pub fn load_config_from(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_validates_a_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [simulation]
            poll_interval_secs = 5

            [venues.bybit]
            leverage = 5
            fee_pct = 0.0006

            [venues.bitget]
            leverage = 5
            fee_pct = 0.0006
            "#
        )
        .unwrap();

        let config = load_config_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.simulation.poll_interval_secs, 5);
        assert_eq!(config.venues.len(), 2);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let result = load_config_from("/definitely/not/here/config.toml");
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
