use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use binance_snapshot::config;
use binance_snapshot::table::{render_book_rows, render_trade_rows};
use binance_snapshot::ExchangeSnapshotClient;

const PREVIEW_ROWS: usize = 5;

fn main() -> Result<()> {
    // Install default crypto provider for rustls before any TLS connections
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // logs go to stderr so the tables on stdout stay clean
    let (log_writer, _log_guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(log_writer)
        .init();

    let config = config::load_config();
    let client = ExchangeSnapshotClient::with_config(config)
        .context("Failed to create exchange client")?;

    tracing::info!(symbol = client.symbol(), depth_levels = client.depth_levels(), "Fetching snapshot");

    let book = client
        .fetch_order_book()
        .with_context(|| format!("Failed to fetch order book for {}", client.symbol()))?;
    let trades = client
        .fetch_recent_trades(None)
        .with_context(|| format!("Failed to fetch recent trades for {}", client.symbol()))?;

    tracing::info!(levels = book.len(), trades = trades.len(), "Fetched snapshot");

    println!("{}", render_book_rows(book.head(PREVIEW_ROWS)));
    println!("{}", render_trade_rows(trades.head(PREVIEW_ROWS)));

    Ok(())
}
