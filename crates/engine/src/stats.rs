use core_types::{TradeRecord, VenueId};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::info;

/// Running counters for the current process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub cycles: u64,
    pub faults: u64,
    pub opened: u64,
    pub rejected: u64,
    pub settled: u64,
    pub cleaned: u64,
    pub realized_profit: Decimal,
}

impl SessionStats {
    pub fn record_settlement(&mut self, record: &TradeRecord) {
        self.settled += 1;
        self.realized_profit += record.net_profit;
    }

    pub fn log_summary(&self, balances: &BTreeMap<VenueId, Decimal>, open_positions: usize) {
        let balances: Vec<String> = balances
            .iter()
            .map(|(venue, balance)| format!("{}={}", venue, balance.round_dp(4)))
            .collect();
        info!(
            cycles = self.cycles,
            faults = self.faults,
            opened = self.opened,
            rejected = self.rejected,
            settled = self.settled,
            cleaned = self.cleaned,
            open_positions,
            realized_profit = %self.realized_profit.round_dp(4),
            balances = %balances.join(" "),
            "Session summary."
        );
    }
}
