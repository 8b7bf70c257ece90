use core_types::{TradeRecord, VenueId};

/// A helper function to escape characters that have special meaning in Telegram's MarkdownV2.
pub fn escape_markdown(text: &str) -> String {
    let special_chars = r"_*[]()~`>#+-=|{}.!";
    text.chars().fold(String::with_capacity(text.len()), |mut out, c| {
        if special_chars.contains(c) {
            out.push('\\');
        }
        out.push(c);
        out
    })
}

/// Announces a settled simulated trade.
pub fn settlement_message(record: &TradeRecord) -> String {
    let icon = if record.net_profit.is_sign_negative() { "🔻" } else { "💰" };
    format!(
        "{} *Simulated trade settled: {}*\nLong `{}` @ {}\nShort `{}` @ {}\nNet profit: *{}* USDT",
        icon,
        escape_markdown(&record.coin),
        record.long_venue,
        escape_markdown(&record.long_entry_price.to_string()),
        record.short_venue,
        escape_markdown(&record.short_entry_price.to_string()),
        escape_markdown(&record.net_profit.round_dp(4).to_string()),
    )
}

/// Sent once when the simulator starts.
pub fn startup_message(venues: &[VenueId]) -> String {
    let names: Vec<&str> = venues.iter().map(|v| v.as_str()).collect();
    format!(
        "✅ *Funding arbitrage simulator started*\nVenues: {}",
        escape_markdown(&names.join(", "))
    )
}
