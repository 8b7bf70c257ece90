use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The trading venues the simulator knows how to talk to.
///
/// The declaration order is also the registry order: when two venues quote the
/// same funding rate, the one declared first ranks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueId {
    Binance,
    Bybit,
    Okx,
    Bitget,
}

impl VenueId {
    pub const ALL: [VenueId; 4] = [VenueId::Binance, VenueId::Bybit, VenueId::Okx, VenueId::Bitget];

    pub fn as_str(&self) -> &'static str {
        match self {
            VenueId::Binance => "binance",
            VenueId::Bybit => "bybit",
            VenueId::Okx => "okx",
            VenueId::Bitget => "bitget",
        }
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VenueId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(VenueId::Binance),
            "bybit" => Ok(VenueId::Bybit),
            "okx" => Ok(VenueId::Okx),
            "bitget" => Ok(VenueId::Bitget),
            other => Err(CoreError::InvalidInput("venue".to_string(), other.to_string())),
        }
    }
}

/// Which side of a hedged pair a leg represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegSide {
    Long,
    Short,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_ids_parse_case_insensitively() {
        assert_eq!("Binance".parse::<VenueId>().unwrap(), VenueId::Binance);
        assert_eq!(" okx ".parse::<VenueId>().unwrap(), VenueId::Okx);
        assert!("kraken".parse::<VenueId>().is_err());
    }

    #[test]
    fn display_matches_config_keys() {
        for venue in VenueId::ALL {
            assert_eq!(venue.to_string().parse::<VenueId>().unwrap(), venue);
        }
    }
}
