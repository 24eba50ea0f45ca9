//! Order book for a single ticker
//!
//! Both sides are price levels in a BTreeMap for deterministic iteration:
//! bids walk descending (highest first), asks ascending (lowest first).
//! Within a level orders are FIFO.

pub mod price_level;

pub use price_level::PriceLevel;

use std::collections::BTreeMap;
use types::ids::{OrderId, Ticker, UserId};
use types::order::{Order, Side};
use types::price::Price;

/// Resting bids and asks for one ticker
#[derive(Debug, Clone)]
pub struct OrderBook {
    ticker: Ticker,
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
}

impl OrderBook {
    /// Create a new empty book
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Insert a resting order on its side, preserving price-time priority
    pub fn add(&mut self, order: Order) {
        let side = self.side_mut(order.side);
        side.entry(order.price).or_default().push_back(order);
    }

    /// Remove an order by id from whichever side it rests on
    ///
    /// Returns `None` if the order is not on the book (idempotent).
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        for levels in [&mut self.bids, &mut self.asks] {
            let mut hit = None;
            for (price, level) in levels.iter_mut() {
                if let Some(order) = level.remove(order_id) {
                    hit = Some((*price, order));
                    break;
                }
            }
            if let Some((price, order)) = hit {
                if levels.get(&price).is_some_and(|l| l.is_empty()) {
                    levels.remove(&price);
                }
                return Some(order);
            }
        }
        None
    }

    /// Remove every resting order owned by `user_id` from both sides
    pub fn remove_by_user(&mut self, user_id: &UserId) -> Vec<Order> {
        let mut removed = Vec::new();
        for levels in [&mut self.bids, &mut self.asks] {
            for level in levels.values_mut() {
                removed.extend(level.remove_by_user(user_id));
            }
            levels.retain(|_, level| !level.is_empty());
        }
        removed
    }

    /// Find a resting order by id
    pub fn find(&self, order_id: &OrderId) -> Option<&Order> {
        self.bids
            .values()
            .chain(self.asks.values())
            .flat_map(|level| level.iter())
            .find(|o| &o.order_id == order_id)
    }

    /// Best (highest) bid price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Best (lowest) ask price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Top-of-book price for one side
    pub fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.best_bid(),
            Side::Sell => self.best_ask(),
        }
    }

    /// Mutable access to the order at the top of matching priority on `side`
    pub fn front_mut(&mut self, side: Side) -> Option<&mut Order> {
        match side {
            Side::Buy => self.bids.values_mut().next_back().and_then(|l| l.front_mut()),
            Side::Sell => self.asks.values_mut().next().and_then(|l| l.front_mut()),
        }
    }

    /// Pop the order at the top of matching priority on `side`
    pub fn pop_front(&mut self, side: Side) -> Option<Order> {
        let price = self.best_price(side)?;
        let levels = self.side_mut(side);
        let level = levels.get_mut(&price)?;
        let order = level.pop_front();
        if level.is_empty() {
            levels.remove(&price);
        }
        order
    }

    /// Aggregated (price, total quantity) levels for one side, in priority order
    pub fn depth(&self, side: Side) -> Vec<(Price, i64)> {
        match side {
            Side::Buy => self
                .bids
                .iter()
                .rev()
                .map(|(price, level)| (*price, level.total_quantity()))
                .collect(),
            Side::Sell => self
                .asks
                .iter()
                .map(|(price, level)| (*price, level.total_quantity()))
                .collect(),
        }
    }

    /// Resting orders on one side in matching priority
    pub fn orders(&self, side: Side) -> Vec<&Order> {
        match side {
            Side::Buy => self
                .bids
                .values()
                .rev()
                .flat_map(|level| level.iter())
                .collect(),
            Side::Sell => self.asks.values().flat_map(|level| level.iter()).collect(),
        }
    }

    /// Number of resting orders on one side
    pub fn order_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.values().map(|l| l.order_count()).sum(),
            Side::Sell => self.asks.values().map(|l| l.order_count()).sum(),
        }
    }

    /// Check if both sides are empty
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}
