//! Trade event fanout
//!
//! The exchange publishes one [`TradeEvent`] per completed placement that
//! produced at least one trade, after the ticker lock is released. Delivery
//! is best-effort: a slow or absent subscriber never blocks the engine and
//! never affects settlement.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use types::ids::Ticker;
use types::trade::Trade;

/// Trades produced by one matched order, in fill order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub ticker: Ticker,
    pub trades: Vec<Trade>,
}

/// Broadcast channel wrapper for trade events
#[derive(Debug)]
pub(crate) struct TradeFeed {
    sender: broadcast::Sender<TradeEvent>,
}

impl TradeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TradeEvent> {
        self.sender.subscribe()
    }

    /// Publish trades for a ticker; no-op when the batch is empty
    pub fn publish(&self, ticker: &Ticker, trades: &[Trade]) {
        if trades.is_empty() {
            return;
        }
        let event = TradeEvent {
            ticker: ticker.clone(),
            trades: trades.to_vec(),
        };
        // send only fails when no subscriber is listening
        if self.sender.send(event).is_err() {
            tracing::trace!(ticker = %ticker, "no trade subscribers");
        }
    }
}
