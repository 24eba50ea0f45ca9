//! Order lifecycle types

use crate::ids::{OrderId, Ticker, UserId};
use crate::price::Price;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Time-in-force policy for orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-Till-Cancel: remains until filled or explicitly cancelled
    GTC,
    /// Immediate-Or-Cancel: match immediately, cancel remainder
    IOC,
    /// Fill-Or-Kill: full match or reject entirely
    FOK,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Resting with no fills
    Open,
    /// Partially matched, remainder resting
    Partial,
    /// Completely matched (terminal)
    Filled,
    /// Cancelled by user or remainder disposal (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// A limit order
///
/// `quantity` is the remaining quantity and is decremented in place as fills
/// occur; `original_quantity` is the immutable submission quantity.
/// `created_at` is a per-ticker monotonic sequence assigned by the exchange
/// on acceptance and is the FIFO tie-breaker at equal price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub ticker: Ticker,
    pub side: Side,
    pub price: Price,
    pub quantity: i64,
    pub original_quantity: i64,
    pub time_in_force: TimeInForce,
    pub created_at: u64,
    pub status: OrderStatus,
}

impl Order {
    /// Create a new order awaiting acceptance
    pub fn new(
        user_id: UserId,
        ticker: Ticker,
        side: Side,
        price: Price,
        quantity: i64,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            user_id,
            ticker,
            side,
            price,
            quantity,
            original_quantity: quantity,
            time_in_force,
            created_at: 0,
            status: OrderStatus::Open,
        }
    }

    /// Quantity filled so far
    pub fn filled_quantity(&self) -> i64 {
        self.original_quantity - self.quantity
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.quantity == 0
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        self.filled_quantity() > 0
    }

    /// Reduce remaining quantity by a fill and adjust status
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity
    pub fn fill(&mut self, fill_quantity: i64) {
        assert!(
            fill_quantity > 0 && fill_quantity <= self.quantity,
            "Fill would exceed order quantity"
        );
        self.quantity -= fill_quantity;
        self.status = if self.quantity == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };
    }

    /// Mark the order cancelled
    ///
    /// # Panics
    /// Panics if the order is already in a terminal state
    pub fn cancel(&mut self) {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");
        self.status = OrderStatus::Cancelled;
    }
}
