use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::binance::client::{ExchangeSnapshotClient, encode_params};
use crate::binance::types::RawTrade;
use crate::binance::{TRADES_PATH, parse_number};
use crate::config::DEFAULT_TRADES_LIMIT;
use crate::error::{Error, Result};
use crate::table::{TradeRow, TradeTable};

impl ExchangeSnapshotClient {
    /// Fetches up to `limit` recent trades (500 when `None`).
    ///
    /// The upper bound is left to the exchange, which rejects oversized
    /// limits with an error status.
    pub fn fetch_recent_trades(&self, limit: Option<u32>) -> Result<TradeTable> {
        let limit = limit.unwrap_or(DEFAULT_TRADES_LIMIT);
        if limit == 0 {
            return Err(Error::Configuration(
                "trade limit must be a positive integer".to_string(),
            ));
        }

        let params = [
            ("symbol", self.symbol().to_string()),
            ("limit", limit.to_string()),
        ];
        let response = self.get_json(TRADES_PATH, &params)?;

        let items = match response.body {
            Value::Array(items) => items,
            other => {
                return Err(Error::ExchangeRequest {
                    endpoint: TRADES_PATH.to_string(),
                    params: encode_params(&params),
                    status: Some(response.status),
                    timed_out: false,
                    message: format!("expected a JSON array of trades, got {}", json_kind(&other)),
                    source: None,
                });
            }
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<RawTrade>(item).map_err(|e| Error::MalformedRecord {
                    endpoint: TRADES_PATH.to_string(),
                    index,
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let table = trade_table_from_records(records)?;

        tracing::debug!(symbol = %self.symbol(), limit, rows = table.len(), "Fetched recent trades");

        Ok(table)
    }
}

/// Maps wire trades onto the four output columns. Any bad record fails the whole table.
pub fn trade_table_from_records(records: Vec<RawTrade>) -> Result<TradeTable> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            trade_row(raw).map_err(|message| Error::MalformedRecord {
                endpoint: TRADES_PATH.to_string(),
                index,
                message,
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(TradeTable::from_rows)
}

fn trade_row(raw: RawTrade) -> std::result::Result<TradeRow, String> {
    Ok(TradeRow {
        price: parse_number("price", &raw.price)?,
        quantity: parse_number("qty", &raw.qty)?,
        timestamp: millis_to_utc(raw.time)?,
        is_buyer_maker: raw.is_buyer_maker,
    })
}

fn millis_to_utc(ms: i64) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| format!("time {} is out of range", ms))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binance::testing::run_blocking;
    use crate::config::ClientConfig;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn raw(price: &str, qty: &str, time: i64, is_buyer_maker: bool) -> RawTrade {
        RawTrade {
            price: price.to_string(),
            qty: qty.to_string(),
            time,
            is_buyer_maker,
        }
    }

    #[test]
    fn maps_wire_fields_onto_columns() {
        let table = trade_table_from_records(vec![
            raw("50123.45", "0.01200000", 1_700_000_000_000, true),
            raw("50123.50", "1.5", 1_700_000_000_250, false),
        ])
        .unwrap();

        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.price, 50123.45);
        assert_eq!(first.quantity, 0.012);
        assert_eq!(first.timestamp, Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap());
        assert!(first.is_buyer_maker);
        assert!(!table.rows()[1].is_buyer_maker);
        assert_eq!(table.rows()[1].timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn unparsable_quantity_fails_whole_table() {
        let err = trade_table_from_records(vec![
            raw("1.0", "1.0", 0, false),
            raw("1.0", "n/a", 0, false),
        ])
        .unwrap_err();

        match err {
            Error::MalformedRecord { index, message, .. } => {
                assert_eq!(index, 1);
                assert!(message.contains("qty"));
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_time_is_malformed() {
        let err = trade_table_from_records(vec![raw("1.0", "1.0", i64::MAX, false)]).unwrap_err();
        assert!(err.is_malformed_record());
    }

    #[test]
    fn columns_are_fixed() {
        assert_eq!(TradeTable::COLUMNS, ["price", "quantity", "timestamp", "is_buyer_maker"]);
    }

    #[tokio::test]
    async fn fetch_uses_default_limit_and_drops_extra_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/trades"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("limit", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "price": "50123.45", "qty": "0.001", "quoteQty": "50.12", "time": 1700000000000i64, "isBuyerMaker": true, "isBestMatch": true},
                {"id": 2, "price": "50123.46", "qty": "0.002", "quoteQty": "100.24", "time": 1700000000001i64, "isBuyerMaker": false, "isBestMatch": true},
                {"id": 3, "price": "50123.40", "qty": "0.003", "quoteQty": "150.37", "time": 1700000000002i64, "isBuyerMaker": true, "isBestMatch": true}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let table = run_blocking(move || {
            ExchangeSnapshotClient::with_config(ClientConfig::new("btcusdt").base_url(uri))?
                .fetch_recent_trades(None)
        })
        .await
        .unwrap();

        assert_eq!(table.len(), 3);
        let flags: Vec<bool> = table.iter().map(|t| t.is_buyer_maker).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(
            table.rows()[0].timestamp,
            Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
        );

        let row = serde_json::to_string(&table.rows()[0]).unwrap();
        let positions: Vec<usize> = TradeTable::COLUMNS
            .iter()
            .map(|column| row.find(&format!("\"{}\":", column)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "columns out of order: {row}");
        assert_eq!(row.matches("\":").count(), TradeTable::COLUMNS.len());
    }

    #[tokio::test]
    async fn fetch_passes_explicit_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/trades"))
            .and(query_param("symbol", "ETHUSDT"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"price": "2000.1", "qty": "1", "time": 1700000000000i64, "isBuyerMaker": false}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let table = run_blocking(move || {
            ExchangeSnapshotClient::with_config(ClientConfig::new("ethusdt").base_url(uri))?
                .fetch_recent_trades(Some(2))
        })
        .await
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].price, 2000.1);
    }

    #[tokio::test]
    async fn missing_qty_is_malformed_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/trades"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"price": "1.0", "qty": "1.0", "time": 1700000000000i64, "isBuyerMaker": true},
                {"price": "1.0", "time": 1700000000001i64, "isBuyerMaker": true}
            ])))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = run_blocking(move || {
            ExchangeSnapshotClient::with_config(ClientConfig::new("BTCUSDT").base_url(uri))?
                .fetch_recent_trades(None)
        })
        .await
        .unwrap_err();

        match err {
            Error::MalformedRecord { index, message, .. } => {
                assert_eq!(index, 1);
                assert!(message.contains("qty"));
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_type_for_flag_is_malformed_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/trades"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"price": "1.0", "qty": "1.0", "time": 1700000000000i64, "isBuyerMaker": "yes"}
            ])))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = run_blocking(move || {
            ExchangeSnapshotClient::with_config(ClientConfig::new("BTCUSDT").base_url(uri))?
                .fetch_recent_trades(None)
        })
        .await
        .unwrap_err();

        assert!(err.is_malformed_record());
    }

    #[tokio::test]
    async fn object_body_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/trades"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"trades": []})))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = run_blocking(move || {
            ExchangeSnapshotClient::with_config(ClientConfig::new("BTCUSDT").base_url(uri))?
                .fetch_recent_trades(None)
        })
        .await
        .unwrap_err();

        assert!(err.is_exchange_request());
        assert!(err.to_string().contains("an object"));
    }

    #[tokio::test]
    async fn rejected_limit_surfaces_exchange_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/trades"))
            .and(query_param("limit", "5000"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": -1100,
                "msg": "Illegal characters found in parameter 'limit'"
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = run_blocking(move || {
            ExchangeSnapshotClient::with_config(ClientConfig::new("BTCUSDT").base_url(uri))?
                .fetch_recent_trades(Some(5000))
        })
        .await
        .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("limit=5000"));
    }

    #[test]
    fn zero_limit_is_rejected_before_any_request() {
        let client = ExchangeSnapshotClient::new("BTCUSDT", None).unwrap();
        let err = client.fetch_recent_trades(Some(0)).unwrap_err();
        assert!(err.is_configuration());
    }
}
