use chrono::{DateTime, Utc};

use crate::binance::client::{ExchangeSnapshotClient, encode_params};
use crate::binance::types::DepthSnapshot;
use crate::binance::{DEPTH_PATH, parse_number};
use crate::error::{Error, Result};
use crate::table::{OrderBookTable, PriceLevelRow, Side};

impl ExchangeSnapshotClient {
    /// Fetches the top `depth_levels` of the book as one co-timed snapshot.
    pub fn fetch_order_book(&self) -> Result<OrderBookTable> {
        let params = [
            ("symbol", self.symbol().to_string()),
            ("limit", self.depth_levels().to_string()),
        ];
        let response = self.get_json(DEPTH_PATH, &params)?;

        let snapshot: DepthSnapshot = serde_json::from_value(response.body).map_err(|e| {
            Error::ExchangeRequest {
                endpoint: DEPTH_PATH.to_string(),
                params: encode_params(&params),
                status: Some(response.status),
                timed_out: false,
                message: format!("unexpected depth snapshot shape: {}", e),
                source: Some(Box::new(e)),
            }
        })?;

        // one clock read per snapshot, every row shares it
        let captured_at = Utc::now();
        let table = book_table_from_snapshot(snapshot, captured_at)?;

        tracing::debug!(
            symbol = %self.symbol(),
            rows = table.len(),
            %captured_at,
            "Fetched order book"
        );

        Ok(table)
    }
}

/// Flattens a depth snapshot into rows, bids then asks, stamped with `captured_at`.
pub fn book_table_from_snapshot(
    snapshot: DepthSnapshot,
    captured_at: DateTime<Utc>,
) -> Result<OrderBookTable> {
    let mut rows = Vec::with_capacity(snapshot.bids.len() + snapshot.asks.len());

    let sides = [(Side::Bid, snapshot.bids), (Side::Ask, snapshot.asks)];
    for (side, levels) in sides {
        for (level, raw) in levels.into_iter().enumerate() {
            let index = rows.len();
            let malformed = |message: String| Error::MalformedRecord {
                endpoint: DEPTH_PATH.to_string(),
                index,
                message: format!("{} level {}: {}", side, level, message),
            };

            let [price, volume] = serde_json::from_value::<[String; 2]>(raw)
                .map_err(|e| malformed(e.to_string()))?;

            rows.push(PriceLevelRow {
                price: parse_number("price", &price).map_err(malformed)?,
                volume: parse_number("volume", &volume).map_err(malformed)?,
                side,
                timestamp: captured_at,
            });
        }
    }

    Ok(OrderBookTable::from_rows(rows))
}
