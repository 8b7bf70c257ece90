use crate::error::ConfigError;
use core_types::{VenueId, VenueTerms};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: Simulation,
    /// Keyed by venue name (`binance`, `bybit`, `okx`, `bitget`).
    pub venues: BTreeMap<String, VenueConfig>,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Contains the constants of the simulated trading account.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Simulation {
    /// Virtual balance every venue starts with.
    pub start_balance: Decimal,
    /// Margin committed to each leg of a position.
    pub open_margin: Decimal,
    /// Both venues of a pair must hold at least this much to open.
    pub min_balance: Decimal,
    /// Opportunities expected to earn less than this are ignored.
    pub min_net_profit: Decimal,
    /// Assumed slippage per leg, as a fraction of notional.
    pub slippage_pct: Decimal,
    pub poll_interval_secs: u64,
    /// Maximum relative price move between entry and settlement.
    pub price_stable_pct: Decimal,
    pub markets_refresh_interval_secs: u64,
    /// Extra sleep after a cycle fails.
    pub fault_backoff_secs: u64,
    /// Timeout applied to every venue HTTP request.
    pub request_timeout_secs: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            start_balance: dec!(500),
            open_margin: dec!(250),
            min_balance: dec!(300),
            min_net_profit: dec!(5),
            slippage_pct: dec!(0.001),
            poll_interval_secs: 10,
            price_stable_pct: dec!(0.003),
            markets_refresh_interval_secs: 60,
            fault_backoff_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

impl Simulation {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn markets_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.markets_refresh_interval_secs)
    }

    pub fn fault_backoff(&self) -> Duration {
        Duration::from_secs(self.fault_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Credentials and trading terms for one venue.
#[derive(Clone, Deserialize)]
pub struct VenueConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret: String,
    pub leverage: Decimal,
    pub fee_pct: Decimal,
}

impl VenueConfig {
    pub fn terms(&self) -> VenueTerms {
        VenueTerms {
            leverage: self.leverage,
            fee_pct: self.fee_pct,
        }
    }
}

impl fmt::Debug for VenueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueConfig")
            .field("api_key", &redact(&self.api_key))
            .field("secret", &redact(&self.secret))
            .field("leverage", &self.leverage)
            .field("fee_pct", &self.fee_pct)
            .finish()
    }
}

/// Telegram Bot API credentials. Alerting is disabled when either is empty.
#[derive(Clone, Default, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub chat_id: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &redact(&self.token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Where settled trades are appended.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs/simulator_log.csv"),
        }
    }
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_prefix: "fundarb.log".to_string(),
            level: "info".to_string(),
        }
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "<unset>" } else { "<redacted>" }
}

impl Config {
    /// Checks the loaded values for anything the simulator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let venues = self.venue_terms()?;
        if venues.len() < 2 {
            return Err(ConfigError::ValidationError(
                "at least two venues must be configured".to_string(),
            ));
        }
        for (venue, terms) in &venues {
            if terms.leverage <= Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "venues.{venue}.leverage must be greater than 0"
                )));
            }
            if terms.fee_pct.is_sign_negative() {
                return Err(ConfigError::ValidationError(format!(
                    "venues.{venue}.fee_pct must not be negative"
                )));
            }
        }

        let sim = &self.simulation;
        if sim.open_margin <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "simulation.open_margin must be greater than 0".to_string(),
            ));
        }
        if sim.start_balance.is_sign_negative() || sim.min_balance.is_sign_negative() {
            return Err(ConfigError::ValidationError(
                "simulation balances must not be negative".to_string(),
            ));
        }
        if sim.slippage_pct.is_sign_negative() || sim.price_stable_pct.is_sign_negative() {
            return Err(ConfigError::ValidationError(
                "simulation.slippage_pct and simulation.price_stable_pct must not be negative"
                    .to_string(),
            ));
        }
        if sim.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "simulation.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves the configured venue names into typed ids with their terms.
    pub fn venue_terms(&self) -> Result<BTreeMap<VenueId, VenueTerms>, ConfigError> {
        self.venues
            .iter()
            .map(|(name, venue)| {
                let id = name
                    .parse::<VenueId>()
                    .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
                Ok((id, venue.terms()))
            })
            .collect()
    }

    /// Looks up the raw settings of one venue, including credentials.
    pub fn venue(&self, id: VenueId) -> Option<&VenueConfig> {
        self.venues
            .iter()
            .find(|(name, _)| name.parse::<VenueId>().ok() == Some(id))
            .map(|(_, venue)| venue)
    }

    pub fn telegram_enabled(&self) -> bool {
        !self.telegram.token.is_empty() && !self.telegram.chat_id.is_empty()
    }
}
