//! Trade execution types

use crate::ids::{OrderId, Ticker, TradeId, UserId};
use crate::price::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A completed fill between a buy order and a sell order
///
/// Immutable once produced. The price is always the resting order's price at
/// the moment of the fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub ticker: Ticker,
    pub price: Price,
    pub quantity: i64,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    /// Unix nanosecond timestamp
    pub created_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ticker: Ticker,
        price: Price,
        quantity: i64,
        buyer_id: UserId,
        seller_id: UserId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        created_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            ticker,
            price,
            quantity,
            buyer_id,
            seller_id,
            buy_order_id,
            sell_order_id,
            created_at,
        }
    }

    /// Cash moved from buyer to seller (price × quantity)
    pub fn notional(&self) -> Decimal {
        self.price.notional(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_notional() {
        let trade = Trade::new(
            Ticker::new("FUN"),
            Price::from_str("100.50").unwrap(),
            10,
            UserId::new(),
            UserId::new(),
            OrderId::new(),
            OrderId::new(),
            1_708_123_456_789_000_000,
        );

        assert_eq!(trade.notional(), Decimal::from(1005));
    }

    #[test]
    fn test_trade_serialization() {
        let trade = Trade::new(
            Ticker::new("MEME"),
            Price::from_u64(50),
            3,
            UserId::new(),
            UserId::new(),
            OrderId::new(),
            OrderId::new(),
            1_708_123_456_789_000_000,
        );

        let json = serde_json::to_string(&trade).unwrap();
        let deserialized: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deserialized);
    }
}
