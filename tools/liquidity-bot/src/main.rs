//! Demo wiring: exchange + liquidity bot + audit journal
//!
//! Loads configuration from the JSON file given as the first argument (or
//! defaults), lists the configured tickers, registers the market-maker
//! principal, spawns the quoting loop, and logs trade events until ctrl-c.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, Mutex};

use exchange::{Exchange, ExchangeConfig};
use liquidity_bot::LiquidityBot;
use persistence::{Journal, JournalConfig};
use types::user::User;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ExchangeConfig::from_file(&path)?,
        None => ExchangeConfig::default(),
    };

    let exchange = Arc::new(Exchange::new(config.ticker_prices()?));
    tracing::info!(tickers = exchange.tickers().len(), "exchange listed");

    let market_maker = User::market_maker("liquidity-bot");
    let market_maker_id = market_maker.user_id;
    exchange.register_user(market_maker);

    let journal_dir = std::env::var("JOURNAL_DIR").unwrap_or_else(|_| "journal".to_string());
    let journal = Arc::new(Mutex::new(Journal::open(JournalConfig::new(&journal_dir))?));
    tracing::info!(dir = %journal_dir, "audit journal open");

    let mut trades = exchange.subscribe();
    tokio::spawn(async move {
        loop {
            match trades.recv().await {
                Ok(event) => {
                    for trade in &event.trades {
                        tracing::info!(
                            ticker = %event.ticker,
                            price = %trade.price,
                            quantity = trade.quantity,
                            "trade"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "trade log fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let bot = LiquidityBot::new(
        Arc::clone(&exchange),
        Arc::clone(&journal),
        market_maker_id,
        config.liquidity_bot.clone(),
    );
    tokio::spawn(bot.run());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    for stats in exchange.get_stats().await {
        tracing::info!(
            ticker = %stats.ticker,
            last_price = %stats.last_price,
            bids = stats.bid_orders,
            asks = stats.ask_orders,
            "final book state"
        );
    }
    Ok(())
}
