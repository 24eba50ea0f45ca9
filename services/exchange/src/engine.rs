//! Exchange core: the settlement authority
//!
//! Owns every order book, the user table, and the per-ticker locks. All
//! externally visible state transitions on orders and balances pass through
//! here: escrow, matching, settlement, refunds, and cancellation.
//!
//! Concurrency model: one `tokio::sync::Mutex` per ticker, held for the full
//! place/cancel critical section. Operations on different tickers run in
//! parallel; no code path ever holds two ticker locks. The user table is a
//! `std::sync::RwLock` taken for short, non-await critical sections inside
//! the ticker lock.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use types::errors::ExchangeError;
use types::ids::{OrderId, Ticker, UserId};
use types::order::{Order, OrderStatus, Side, TimeInForce};
use types::price::Price;
use types::trade::Trade;
use types::user::User;

use crate::book::OrderBook;
use crate::events::{TradeEvent, TradeFeed};
use crate::matching;

const TRADE_EVENT_CAPACITY: usize = 1024;

/// Per-ticker state guarded by that ticker's lock
struct TickerState {
    book: OrderBook,
    last_trade: Option<Price>,
    initial_price: Price,
    /// Monotonic sequence for `created_at` assignment
    next_seq: u64,
}

/// Result of a completed `place_order`
///
/// Carries everything the caller needs to persist the request as one
/// transaction: the incoming order's final state, the trades, the resting
/// orders whose quantity changed, and every user whose balances moved.
#[derive(Debug, Clone)]
pub struct PlacementReport {
    pub order: Order,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
    pub resting_changed: Vec<Order>,
    pub affected_users: Vec<UserId>,
}

/// Reservation released by a cancellation
#[derive(Debug, Clone, PartialEq)]
pub enum Refund {
    Cash(Decimal),
    Shares { quantity: i64 },
    /// Market-maker orders carry no reservation
    None,
}

/// Result of a completed `cancel_order`
#[derive(Debug, Clone)]
pub struct CancelReport {
    pub order: Order,
    pub refund: Refund,
}

/// Aggregated depth snapshot taken under the ticker lock
#[derive(Debug, Clone, Serialize)]
pub struct BookSnapshot {
    pub ticker: Ticker,
    pub bids: Vec<(Price, i64)>,
    pub asks: Vec<(Price, i64)>,
}

/// Per-ticker summary for operator logging
#[derive(Debug, Clone, Serialize)]
pub struct TickerStats {
    pub ticker: Ticker,
    pub last_price: Price,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub bid_orders: usize,
    pub ask_orders: usize,
}

/// The multi-ticker exchange engine
pub struct Exchange {
    books: HashMap<Ticker, Mutex<TickerState>>,
    /// Listing order for deterministic iteration
    tickers: Vec<Ticker>,
    users: RwLock<HashMap<UserId, User>>,
    feed: TradeFeed,
}

impl Exchange {
    /// Create an exchange listing the given tickers at their initial prices
    pub fn new(tickers: impl IntoIterator<Item = (Ticker, Price)>) -> Self {
        let mut books = HashMap::new();
        let mut listing = Vec::new();
        for (ticker, initial_price) in tickers {
            listing.push(ticker.clone());
            books.insert(
                ticker.clone(),
                Mutex::new(TickerState {
                    book: OrderBook::new(ticker),
                    last_trade: None,
                    initial_price,
                    next_seq: 1,
                }),
            );
        }
        listing.sort();

        Self {
            books,
            tickers: listing,
            users: RwLock::new(HashMap::new()),
            feed: TradeFeed::new(TRADE_EVENT_CAPACITY),
        }
    }

    /// Listed tickers in sorted order
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Register a user; the in-memory record is authoritative from here on
    pub fn register_user(&self, user: User) {
        let mut users = self.users.write().expect("user table lock poisoned");
        tracing::info!(user_id = %user.user_id, username = %user.username, "user registered");
        users.insert(user.user_id, user);
    }

    /// Snapshot of a user's current balances
    pub fn get_user(&self, user_id: &UserId) -> Option<User> {
        let users = self.users.read().expect("user table lock poisoned");
        users.get(user_id).cloned()
    }

    /// Subscribe to trade events
    pub fn subscribe(&self) -> broadcast::Receiver<TradeEvent> {
        self.feed.subscribe()
    }

    /// Validate, escrow, match, and settle an order
    ///
    /// The whole sequence executes atomically with respect to any other
    /// operation on the same ticker. Failures are returned before any state
    /// mutation; once settlement begins it completes.
    pub async fn place_order(&self, mut order: Order) -> Result<PlacementReport, ExchangeError> {
        if order.quantity <= 0 {
            return Err(ExchangeError::InvalidOrder {
                reason: format!("quantity must be positive, got {}", order.quantity),
            });
        }

        let book_lock = self
            .books
            .get(&order.ticker)
            .ok_or_else(|| ExchangeError::UnknownTicker {
                ticker: order.ticker.as_str().to_string(),
            })?;

        let aggressor_mm = {
            let users = self.users.read().expect("user table lock poisoned");
            users
                .get(&order.user_id)
                .map(|u| u.is_market_maker)
                .ok_or(ExchangeError::UnknownUser {
                    user_id: order.user_id,
                })?
        };

        let mut state = book_lock.lock().await;

        order.created_at = state.next_seq;
        state.next_seq += 1;
        order.original_quantity = order.quantity;
        order.status = OrderStatus::Open;

        // FOK pre-check: reject before any escrow is taken
        if order.time_in_force == TimeInForce::FOK {
            let fillable = matching::fillable_quantity(&state.book, order.side, order.price);
            if fillable < order.quantity {
                return Err(ExchangeError::NotFullyFillable {
                    fillable,
                    requested: order.quantity,
                });
            }
        }

        if !aggressor_mm {
            self.take_escrow(&order)?;
        }

        let now = now_nanos();
        let add_remainder = order.time_in_force == TimeInForce::GTC;
        let outcome = matching::match_order(&mut state.book, &mut order, add_remainder, now);

        if let Some(last) = outcome.trades.last() {
            state.last_trade = Some(last.price);
        }

        let affected_users = self.settle(&order, aggressor_mm, &outcome.trades);

        drop(state);

        self.feed.publish(&order.ticker, &outcome.trades);
        tracing::debug!(
            order_id = %order.order_id,
            ticker = %order.ticker,
            status = ?order.status,
            fills = outcome.trades.len(),
            "order placed"
        );

        Ok(PlacementReport {
            status: order.status,
            trades: outcome.trades,
            resting_changed: outcome.touched_resting,
            affected_users,
            order,
        })
    }

    /// Reserve the cash or shares backing an order
    fn take_escrow(&self, order: &Order) -> Result<(), ExchangeError> {
        let mut users = self.users.write().expect("user table lock poisoned");
        let user = users
            .get_mut(&order.user_id)
            .expect("existence checked before locking");

        match order.side {
            Side::Buy => {
                let required = order.price.notional(order.quantity);
                let available = user.buying_power();
                if required > available {
                    return Err(ExchangeError::InsufficientFunds {
                        required,
                        available,
                    });
                }
                user.cash.lock(required);
            }
            Side::Sell => {
                let available = user.available_shares(&order.ticker);
                if order.quantity > available {
                    return Err(ExchangeError::InsufficientShares {
                        ticker: order.ticker.clone(),
                        required: order.quantity,
                        available,
                    });
                }
                user.holding_mut(&order.ticker).lock(order.quantity);
            }
        }
        Ok(())
    }

    /// Apply every produced trade to user balances, release the aggressor's
    /// price-improvement excess, and dispose of an IOC remainder
    fn settle(&self, order: &Order, aggressor_mm: bool, trades: &[Trade]) -> Vec<UserId> {
        let mut affected = vec![order.user_id];
        let mut users = self.users.write().expect("user table lock poisoned");

        for trade in trades {
            let value = trade.notional();
            {
                let buyer = users
                    .get_mut(&trade.buyer_id)
                    .expect("trade parties are registered");
                buyer.settle_buy(&order.ticker, trade.quantity, value);

                // Buy aggressor escrowed at its limit; fills print at the
                // resting price, so the excess reservation is released here.
                if order.side == Side::Buy && !aggressor_mm {
                    let excess = (order.price.as_decimal() - trade.price.as_decimal())
                        * Decimal::from(trade.quantity);
                    if excess > Decimal::ZERO {
                        buyer.cash.unlock(excess);
                    }
                }
            }
            let seller = users
                .get_mut(&trade.seller_id)
                .expect("trade parties are registered");
            seller.settle_sell(&order.ticker, trade.quantity, value);

            for user_id in [trade.buyer_id, trade.seller_id] {
                if !affected.contains(&user_id) {
                    affected.push(user_id);
                }
            }
        }

        // IOC: the unmatched remainder was not added to the book; release
        // its reservation in full.
        if order.time_in_force == TimeInForce::IOC && order.quantity > 0 && !aggressor_mm {
            let user = users
                .get_mut(&order.user_id)
                .expect("existence checked before locking");
            match order.side {
                Side::Buy => user.cash.unlock(order.price.notional(order.quantity)),
                Side::Sell => user.holding_mut(&order.ticker).unlock(order.quantity),
            }
        }

        affected
    }

    /// Cancel a resting order, releasing its remaining reservation in full
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<CancelReport, ExchangeError> {
        for ticker in &self.tickers {
            let mut state = self.books[ticker].lock().await;

            let Some(found) = state.book.find(&order_id) else {
                continue;
            };
            if found.user_id != user_id {
                return Err(ExchangeError::Forbidden { order_id });
            }

            let mut order = state
                .book
                .remove(&order_id)
                .expect("found on the book under the lock");
            order.cancel();
            let refund = self.release_reservation(&order);

            tracing::debug!(order_id = %order_id, ticker = %ticker, "order cancelled");
            return Ok(CancelReport { order, refund });
        }

        Err(ExchangeError::NotFound { order_id })
    }

    /// Cancel every resting order a user owns on one ticker
    ///
    /// Used by the liquidity bot to clear stale quotes before reposting.
    pub async fn cancel_all_for_user(
        &self,
        ticker: &Ticker,
        user_id: UserId,
    ) -> Result<Vec<Order>, ExchangeError> {
        let mut state = self.ticker_state(ticker)?.lock().await;

        let mut cancelled = state.book.remove_by_user(&user_id);
        for order in &mut cancelled {
            order.cancel();
            self.release_reservation(order);
        }
        Ok(cancelled)
    }

    /// Release the reservation backing a removed order
    fn release_reservation(&self, order: &Order) -> Refund {
        let mut users = self.users.write().expect("user table lock poisoned");
        let user = users
            .get_mut(&order.user_id)
            .expect("resting orders belong to registered users");

        if user.is_market_maker {
            return Refund::None;
        }

        match order.side {
            Side::Buy => {
                let amount = order.price.notional(order.quantity);
                user.cash.unlock(amount);
                Refund::Cash(amount)
            }
            Side::Sell => {
                user.holding_mut(&order.ticker).unlock(order.quantity);
                Refund::Shares {
                    quantity: order.quantity,
                }
            }
        }
    }

    /// Depth snapshot taken under the ticker lock
    pub async fn get_book(&self, ticker: &Ticker) -> Result<BookSnapshot, ExchangeError> {
        let state = self.ticker_state(ticker)?.lock().await;
        Ok(BookSnapshot {
            ticker: ticker.clone(),
            bids: state.book.depth(Side::Buy),
            asks: state.book.depth(Side::Sell),
        })
    }

    /// A user's resting orders on one ticker, in matching priority per side
    pub async fn open_orders(
        &self,
        ticker: &Ticker,
        user_id: UserId,
    ) -> Result<Vec<Order>, ExchangeError> {
        let state = self.ticker_state(ticker)?.lock().await;
        Ok(state
            .book
            .orders(Side::Buy)
            .into_iter()
            .chain(state.book.orders(Side::Sell))
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    /// Best bid and ask
    pub async fn get_best(
        &self,
        ticker: &Ticker,
    ) -> Result<(Option<Price>, Option<Price>), ExchangeError> {
        let state = self.ticker_state(ticker)?.lock().await;
        Ok((state.book.best_bid(), state.book.best_ask()))
    }

    /// Reference price for a ticker
    ///
    /// The last trade price; before any trade has printed, the midpoint of
    /// the book if both sides are populated, else the configured initial
    /// price.
    pub async fn get_last_price(&self, ticker: &Ticker) -> Result<Price, ExchangeError> {
        let state = self.ticker_state(ticker)?.lock().await;
        Ok(state
            .last_trade
            .or_else(|| mid_price(&state.book))
            .unwrap_or(state.initial_price))
    }

    /// Administrative override of the reference price
    pub async fn set_last_price(
        &self,
        ticker: &Ticker,
        price: Price,
    ) -> Result<(), ExchangeError> {
        let mut state = self.ticker_state(ticker)?.lock().await;
        state.last_trade = Some(price);
        Ok(())
    }

    /// Per-ticker summaries, each taken under its own lock
    pub async fn get_stats(&self) -> Vec<TickerStats> {
        let mut stats = Vec::with_capacity(self.tickers.len());
        for ticker in &self.tickers {
            let state = self.books[ticker].lock().await;
            stats.push(TickerStats {
                ticker: ticker.clone(),
                last_price: state
                    .last_trade
                    .or_else(|| mid_price(&state.book))
                    .unwrap_or(state.initial_price),
                best_bid: state.book.best_bid(),
                best_ask: state.book.best_ask(),
                bid_orders: state.book.order_count(Side::Buy),
                ask_orders: state.book.order_count(Side::Sell),
            });
        }
        stats
    }

    fn ticker_state(&self, ticker: &Ticker) -> Result<&Mutex<TickerState>, ExchangeError> {
        self.books
            .get(ticker)
            .ok_or_else(|| ExchangeError::UnknownTicker {
                ticker: ticker.as_str().to_string(),
            })
    }
}

/// Midpoint of the best bid and ask, when both exist
fn mid_price(book: &OrderBook) -> Option<Price> {
    match (book.best_bid(), book.best_ask()) {
        (Some(bid), Some(ask)) => {
            Price::try_new((bid.as_decimal() + ask.as_decimal()) / Decimal::from(2))
        }
        _ => None,
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}
