//! User balances with escrow reservations
//!
//! Cash and share balances carry `total`/`locked` counters. Placing an order
//! locks the backing cash or shares; settlement spends from the locked
//! portion and credits the counterparty; cancellation unlocks. Buying power
//! is the available (unlocked) cash.
//!
//! Market-maker principals bypass the reservation bookkeeping entirely and
//! act as an inventory sink whose balances may go negative.

use crate::ids::{Ticker, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cash balance with escrow reservation
///
/// Invariant: 0 <= locked <= total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBalance {
    pub total: Decimal,
    pub locked: Decimal,
}

impl CashBalance {
    pub fn new(total: Decimal) -> Self {
        Self {
            total,
            locked: Decimal::ZERO,
        }
    }

    /// Unlocked cash (buying power)
    pub fn available(&self) -> Decimal {
        self.total - self.locked
    }

    /// Check balance invariant: 0 <= locked <= total
    pub fn check_invariant(&self) -> bool {
        self.locked >= Decimal::ZERO && self.locked <= self.total
    }

    /// Reserve a portion of available cash
    ///
    /// # Panics
    /// Panics if amount exceeds available cash
    pub fn lock(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Lock amount must be non-negative");
        assert!(amount <= self.available(), "Insufficient available cash");

        self.locked += amount;

        debug_assert!(self.check_invariant(), "Invariant violated after lock");
    }

    /// Release a portion of locked cash
    ///
    /// # Panics
    /// Panics if amount exceeds locked cash
    pub fn unlock(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Unlock amount must be non-negative");
        assert!(amount <= self.locked, "Insufficient locked cash");

        self.locked -= amount;

        debug_assert!(self.check_invariant(), "Invariant violated after unlock");
    }

    /// Spend from locked cash (settlement of a fill)
    ///
    /// # Panics
    /// Panics if amount exceeds locked cash
    pub fn spend_locked(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Spend amount must be non-negative");
        assert!(amount <= self.locked, "Insufficient locked cash");

        self.locked -= amount;
        self.total -= amount;

        debug_assert!(self.check_invariant(), "Invariant violated after spend");
    }

    /// Credit available cash (trade settlement)
    pub fn credit(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "Credit amount must be non-negative");
        self.total += amount;
    }

    /// Apply a signed delta without reservation checks (market-maker only)
    pub fn apply_unchecked(&mut self, delta: Decimal) {
        self.total += delta;
    }
}

/// Share holding for a single ticker with escrow reservation
///
/// Invariant for non-market-maker users: 0 <= locked <= total.
/// Market-maker totals may go negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub total: i64,
    pub locked: i64,
}

impl Holding {
    pub fn new(total: i64) -> Self {
        Self { total, locked: 0 }
    }

    /// Unlocked shares available to sell
    pub fn available(&self) -> i64 {
        self.total - self.locked
    }

    /// Check holding invariant: 0 <= locked <= total
    pub fn check_invariant(&self) -> bool {
        self.locked >= 0 && self.locked <= self.total
    }

    /// Reserve shares backing a sell order
    ///
    /// # Panics
    /// Panics if quantity exceeds available shares
    pub fn lock(&mut self, quantity: i64) {
        assert!(quantity >= 0, "Lock quantity must be non-negative");
        assert!(quantity <= self.available(), "Insufficient available shares");

        self.locked += quantity;

        debug_assert!(self.check_invariant(), "Invariant violated after lock");
    }

    /// Release reserved shares
    ///
    /// # Panics
    /// Panics if quantity exceeds locked shares
    pub fn unlock(&mut self, quantity: i64) {
        assert!(quantity >= 0, "Unlock quantity must be non-negative");
        assert!(quantity <= self.locked, "Insufficient locked shares");

        self.locked -= quantity;

        debug_assert!(self.check_invariant(), "Invariant violated after unlock");
    }

    /// Deliver shares from the locked portion (settlement of a fill)
    ///
    /// # Panics
    /// Panics if quantity exceeds locked shares
    pub fn spend_locked(&mut self, quantity: i64) {
        assert!(quantity >= 0, "Spend quantity must be non-negative");
        assert!(quantity <= self.locked, "Insufficient locked shares");

        self.locked -= quantity;
        self.total -= quantity;

        debug_assert!(self.check_invariant(), "Invariant violated after spend");
    }

    /// Credit shares (trade settlement)
    pub fn credit(&mut self, quantity: i64) {
        assert!(quantity >= 0, "Credit quantity must be non-negative");
        self.total += quantity;
    }

    /// Apply a signed delta without reservation checks (market-maker only)
    pub fn apply_unchecked(&mut self, delta: i64) {
        self.total += delta;
    }
}

/// A user or trading agent with cash and share balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub cash: CashBalance,
    pub holdings: HashMap<Ticker, Holding>,
    pub is_market_maker: bool,
}

impl User {
    /// Create a new user with starting cash and no holdings
    pub fn new(username: impl Into<String>, starting_cash: Decimal) -> Self {
        Self {
            user_id: UserId::new(),
            username: username.into(),
            cash: CashBalance::new(starting_cash),
            holdings: HashMap::new(),
            is_market_maker: false,
        }
    }

    /// Create the market-maker principal
    ///
    /// Escrow and balance checks are bypassed for this user; its balances
    /// track inventory and may go negative.
    pub fn market_maker(username: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(),
            username: username.into(),
            cash: CashBalance::new(Decimal::ZERO),
            holdings: HashMap::new(),
            is_market_maker: true,
        }
    }

    /// Cash available for new buy orders
    pub fn buying_power(&self) -> Decimal {
        self.cash.available()
    }

    /// Shares of `ticker` available for new sell orders
    pub fn available_shares(&self, ticker: &Ticker) -> i64 {
        self.holdings.get(ticker).map_or(0, |h| h.available())
    }

    /// Mutable holding for a ticker, created on first touch
    pub fn holding_mut(&mut self, ticker: &Ticker) -> &mut Holding {
        self.holdings.entry(ticker.clone()).or_default()
    }

    /// Settle the buy leg of a fill: receive shares, pay cash
    pub fn settle_buy(&mut self, ticker: &Ticker, quantity: i64, value: Decimal) {
        if self.is_market_maker {
            self.cash.apply_unchecked(-value);
            self.holding_mut(ticker).apply_unchecked(quantity);
        } else {
            self.cash.spend_locked(value);
            self.holding_mut(ticker).credit(quantity);
        }
    }

    /// Settle the sell leg of a fill: deliver shares, receive cash
    pub fn settle_sell(&mut self, ticker: &Ticker, quantity: i64, value: Decimal) {
        if self.is_market_maker {
            self.holding_mut(ticker).apply_unchecked(-quantity);
            self.cash.apply_unchecked(value);
        } else {
            self.holding_mut(ticker).spend_locked(quantity);
            self.cash.credit(value);
        }
    }
}
