pub mod binance;
pub mod config;
pub mod error;
pub mod table;

pub use binance::ExchangeSnapshotClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use table::{OrderBookTable, PriceLevelRow, Side, TradeRow, TradeTable};
