//! Error taxonomy for the exchange
//!
//! Every failure is signalled as a typed return value before any state
//! mutation; none of these variants indicates a partially applied request.

use crate::ids::{OrderId, Ticker, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failure kinds for exchange operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("ticker '{ticker}' is not listed on this exchange")]
    UnknownTicker { ticker: String },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("user {user_id} is not registered on this exchange")]
    UnknownUser { user_id: UserId },

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient shares: need {required} {ticker}, have {available}")]
    InsufficientShares {
        ticker: Ticker,
        required: i64,
        available: i64,
    },

    #[error("fill-or-kill order not fully fillable: {fillable} of {requested} available")]
    NotFullyFillable { fillable: i64, requested: i64 },

    #[error("order {order_id} not found")]
    NotFound { order_id: OrderId },

    #[error("order {order_id} belongs to another user")]
    Forbidden { order_id: OrderId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_ticker_display() {
        let err = ExchangeError::UnknownTicker {
            ticker: "NOPE".to_string(),
        };
        assert_eq!(err.to_string(), "ticker 'NOPE' is not listed on this exchange");
    }

    #[test]
    fn test_insufficient_funds_display() {
        let err = ExchangeError::InsufficientFunds {
            required: Decimal::from(1050),
            available: Decimal::from(1000),
        };
        assert!(err.to_string().contains("1050"));
        assert!(err.to_string().contains("1000"));
    }

    #[test]
    fn test_not_fully_fillable_display() {
        let err = ExchangeError::NotFullyFillable {
            fillable: 5,
            requested: 10,
        };
        assert!(err.to_string().contains("5 of 10"));
    }
}
