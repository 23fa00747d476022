pub mod client;
pub mod snapshot;
pub mod trades;
pub mod types;

pub use client::ExchangeSnapshotClient;
pub use types::{ApiErrorBody, DepthSnapshot, RawTrade};

pub const DEPTH_PATH: &str = "/api/v3/depth";
pub const TRADES_PATH: &str = "/api/v3/trades";

/// Parses an exchange decimal string such as `"50123.45"` into a finite f64.
pub(crate) fn parse_number(field: &str, raw: &str) -> std::result::Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("{} \"{}\" is not a finite number", field, raw)),
        Err(e) => Err(format!("failed to parse {} \"{}\": {}", field, raw, e)),
    }
}
