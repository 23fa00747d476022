use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// levels stay raw so one bad level is reported on its own, not as a bad envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DepthSnapshot {
    #[serde(rename = "lastUpdateId", default)]
    pub last_update_id: Option<u64>,
    pub bids: Vec<Value>, // [price, qty]
    pub asks: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTrade {
    pub price: String,
    pub qty: String,
    pub time: i64, // ms since epoch
    #[serde(rename = "isBuyerMaker")]
    pub is_buyer_maker: bool,
}

// error payload binance sends alongside 4xx/5xx
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

impl DepthSnapshot {
    // generate fake snapshot for benches and tests
    pub fn fake_snapshot(n_levels: usize) -> Self {
        let mut rng = rand::rng();

        let bids = (0..n_levels)
            .map(|i| {
                let price = format!("{:.2}", 1000.0 + (n_levels - i) as f64); // descending
                let qty = format!("{:.5}", rng.random_range(0.001..10.0));
                json!([price, qty])
            })
            .collect::<Vec<_>>();

        let asks = (0..n_levels)
            .map(|i| {
                let price = format!("{:.2}", 1000.0 + (n_levels + i) as f64); // ascending
                let qty = format!("{:.5}", rng.random_range(0.001..10.0));
                json!([price, qty])
            })
            .collect::<Vec<_>>();

        Self {
            last_update_id: Some(0),
            bids,
            asks,
        }
    }
}

impl RawTrade {
    pub fn fake_trades(n: usize, start_ms: i64) -> Vec<Self> {
        let mut rng = rand::rng();

        (0..n)
            .map(|i| Self {
                price: format!("{:.2}", rng.random_range(990.0..1010.0)),
                qty: format!("{:.5}", rng.random_range(0.001..2.0)),
                time: start_ms + i as i64,
                is_buyer_maker: rng.random_bool(0.5),
            })
            .collect()
    }
}
