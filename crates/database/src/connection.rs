use crate::error::DbError;
use std::fs;
use std::path::Path;
use tracing::info;

/// Column names of the trade log, in file order.
pub const HEADER: [&str; 7] = [
    "timestamp",
    "coin",
    "ex_long",
    "ex_short",
    "net_profit",
    "long_price",
    "short_price",
];

/// Makes sure the trade log exists and starts with its header row.
///
/// Parent directories are created as needed. An existing non-empty file is left
/// untouched, so restarting the simulator keeps appending to the same log.
pub fn prepare_trade_log(path: &Path) -> Result<(), DbError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let needs_header = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => return Err(e.into()),
    };

    if needs_header {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        info!(path = %path.display(), "Created trade log.");
    }

    Ok(())
}
