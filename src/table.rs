use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLevelRow {
    pub price: f64,
    pub volume: f64,
    pub side: Side,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRow {
    pub price: f64,
    pub quantity: f64,
    pub timestamp: DateTime<Utc>,
    pub is_buyer_maker: bool,
}

// bids first, then asks, each in exchange order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct OrderBookTable {
    rows: Vec<PriceLevelRow>,
}

impl OrderBookTable {
    pub const COLUMNS: [&'static str; 4] = ["price", "volume", "side", "timestamp"];

    pub fn from_rows(rows: Vec<PriceLevelRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PriceLevelRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceLevelRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn head(&self, n: usize) -> &[PriceLevelRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn bids(&self) -> impl Iterator<Item = &PriceLevelRow> {
        self.rows.iter().filter(|r| r.side == Side::Bid)
    }

    pub fn asks(&self) -> impl Iterator<Item = &PriceLevelRow> {
        self.rows.iter().filter(|r| r.side == Side::Ask)
    }

    /// Capture instant shared by every row, `None` for an empty book.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.rows.first().map(|r| r.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct TradeTable {
    rows: Vec<TradeRow>,
}

impl TradeTable {
    pub const COLUMNS: [&'static str; 4] = ["price", "quantity", "timestamp", "is_buyer_maker"];

    pub fn from_rows(rows: Vec<TradeRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TradeRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &TradeRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn head(&self, n: usize) -> &[TradeRow] {
        &self.rows[..n.min(self.rows.len())]
    }
}

fn fmt_time(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn render_book_rows(rows: &[PriceLevelRow]) -> String {
    let mut out = format!(
        "{:>16} {:>16} {:>5} {:>26}\n",
        OrderBookTable::COLUMNS[0],
        OrderBookTable::COLUMNS[1],
        OrderBookTable::COLUMNS[2],
        OrderBookTable::COLUMNS[3]
    );
    for row in rows {
        out.push_str(&format!(
            "{:>16} {:>16} {:>5} {:>26}\n",
            row.price,
            row.volume,
            row.side,
            fmt_time(&row.timestamp)
        ));
    }
    out
}

pub fn render_trade_rows(rows: &[TradeRow]) -> String {
    let mut out = format!(
        "{:>16} {:>16} {:>26} {:>14}\n",
        TradeTable::COLUMNS[0],
        TradeTable::COLUMNS[1],
        TradeTable::COLUMNS[2],
        TradeTable::COLUMNS[3]
    );
    for row in rows {
        out.push_str(&format!(
            "{:>16} {:>16} {:>26} {:>14}\n",
            row.price,
            row.quantity,
            fmt_time(&row.timestamp),
            row.is_buyer_maker
        ));
    }
    out
}

impl fmt::Display for OrderBookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_book_rows(&self.rows))
    }
}

impl fmt::Display for TradeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_trade_rows(&self.rows))
    }
}
