//! Audit record types
//!
//! Flat, serializable projections of the engine's in-memory state. One
//! [`AuditEvent`] batch per request captures the incoming order, every
//! produced trade, every resting order whose quantity changed, and the
//! final balances of every affected user.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::ids::{OrderId, Ticker, TradeId, UserId};
use types::order::{Order, OrderStatus, Side, TimeInForce};
use types::price::Price;
use types::trade::Trade;
use types::user::User;

/// Persisted projection of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub ticker: Ticker,
    pub side: Side,
    pub price: Price,
    pub original_quantity: i64,
    pub filled_quantity: i64,
    pub status: OrderStatus,
    pub time_in_force: TimeInForce,
    pub created_at: u64,
}

impl From<&Order> for OrderRecord {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id,
            ticker: order.ticker.clone(),
            side: order.side,
            price: order.price,
            original_quantity: order.original_quantity,
            filled_quantity: order.filled_quantity(),
            status: order.status,
            time_in_force: order.time_in_force,
            created_at: order.created_at,
        }
    }
}

/// Persisted projection of a trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: TradeId,
    pub ticker: Ticker,
    pub price: Price,
    pub quantity: i64,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub created_at: i64,
}

impl From<&Trade> for TradeRecord {
    fn from(trade: &Trade) -> Self {
        Self {
            trade_id: trade.trade_id,
            ticker: trade.ticker.clone(),
            price: trade.price,
            quantity: trade.quantity,
            buyer_id: trade.buyer_id,
            seller_id: trade.seller_id,
            buy_order_id: trade.buy_order_id,
            sell_order_id: trade.sell_order_id,
            created_at: trade.created_at,
        }
    }
}

/// Persisted projection of a user's balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub cash: Decimal,
    pub holdings: BTreeMap<String, i64>,
    pub is_market_maker: bool,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        let holdings = user
            .holdings
            .iter()
            .map(|(ticker, holding)| (ticker.as_str().to_string(), holding.total))
            .collect();
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            cash: user.cash.total,
            holdings,
            is_market_maker: user.is_market_maker,
        }
    }
}

/// One persisted state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuditEvent {
    /// A new incoming order was accepted
    OrderAccepted(OrderRecord),
    /// A resting order's fill state changed during matching
    OrderUpdated(OrderRecord),
    /// An order was cancelled (user request or IOC disposal)
    OrderCancelled(OrderRecord),
    /// A trade was produced
    TradeExecuted(TradeRecord),
    /// Final balances of an affected user
    UserBalances(UserRecord),
}

impl AuditEvent {
    /// Event type tag written to the journal
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::OrderAccepted(_) => "OrderAccepted",
            AuditEvent::OrderUpdated(_) => "OrderUpdated",
            AuditEvent::OrderCancelled(_) => "OrderCancelled",
            AuditEvent::TradeExecuted(_) => "TradeExecuted",
            AuditEvent::UserBalances(_) => "UserBalances",
        }
    }
}
