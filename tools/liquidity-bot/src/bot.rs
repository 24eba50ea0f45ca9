//! Market-maker quoting loop
//!
//! On a fixed cadence, for each listed ticker: cancel the bot's stale
//! quotes, look up the reference price, and post a GTC bid at
//! `price × (1 − spread)` and a GTC ask at `price × (1 + spread)` with a
//! random size. The bot is an ordinary exchange client; only its
//! market-maker flag exempts it from escrow, so it can never be starved of
//! inventory.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tokio::sync::Mutex;

use exchange::{Exchange, LiquidityBotConfig, PlacementReport};
use persistence::{AuditEvent, Journal, JournalError, OrderRecord, TradeRecord, UserRecord};
use types::errors::ExchangeError;
use types::ids::{Ticker, UserId};
use types::order::{Order, Side, TimeInForce};
use types::price::Price;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
}

/// Background liquidity provider
pub struct LiquidityBot {
    exchange: Arc<Exchange>,
    journal: Arc<Mutex<Journal>>,
    user_id: UserId,
    config: LiquidityBotConfig,
    rng: ChaCha8Rng,
}

impl LiquidityBot {
    /// Create a bot quoting on behalf of the registered market-maker user
    pub fn new(
        exchange: Arc<Exchange>,
        journal: Arc<Mutex<Journal>>,
        user_id: UserId,
        config: LiquidityBotConfig,
    ) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            exchange,
            journal,
            user_id,
            config,
            rng,
        }
    }

    /// Run the quoting loop until the task is dropped
    pub async fn run(mut self) {
        tracing::info!(
            interval_ms = self.config.interval_ms,
            spread = %self.config.spread,
            "liquidity bot running"
        );
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.interval_ms));
        loop {
            interval.tick().await;
            for ticker in self.exchange.tickers().to_vec() {
                if let Err(error) = self.quote(&ticker).await {
                    tracing::warn!(ticker = %ticker, %error, "quote cycle failed");
                }
            }
        }
    }

    /// One quote cycle for one ticker: cancel, reprice, repost, journal
    pub async fn quote(&mut self, ticker: &Ticker) -> Result<(), BotError> {
        let cancelled = self
            .exchange
            .cancel_all_for_user(ticker, self.user_id)
            .await?;

        let reference = self.exchange.get_last_price(ticker).await?.as_decimal();
        let offset = reference * self.config.spread;
        let quantity = self.quote_size();

        let mut reports = Vec::with_capacity(2);
        if let Some(bid_price) = Price::try_new(reference - offset) {
            let bid = Order::new(
                self.user_id,
                ticker.clone(),
                Side::Buy,
                bid_price,
                quantity,
                TimeInForce::GTC,
            );
            reports.push(self.exchange.place_order(bid).await?);
        }
        if let Some(ask_price) = Price::try_new(reference + offset) {
            let ask = Order::new(
                self.user_id,
                ticker.clone(),
                Side::Sell,
                ask_price,
                quantity,
                TimeInForce::GTC,
            );
            reports.push(self.exchange.place_order(ask).await?);
        }

        let events = self.audit_events(&cancelled, &reports);
        if !events.is_empty() {
            let mut journal = self.journal.lock().await;
            journal.commit(now_nanos(), &events)?;
        }

        tracing::debug!(
            ticker = %ticker,
            cancelled = cancelled.len(),
            quoted = reports.len(),
            quantity,
            "quotes refreshed"
        );
        Ok(())
    }

    fn quote_size(&mut self) -> i64 {
        let lo = self.config.min_quantity.max(1);
        let hi = self.config.max_quantity.max(lo);
        self.rng.gen_range(lo..=hi)
    }

    /// Build the cycle's audit batch: cancellations, new quotes, fills, and
    /// the final balances of everyone the fills touched
    fn audit_events(&self, cancelled: &[Order], reports: &[PlacementReport]) -> Vec<AuditEvent> {
        let mut events = Vec::new();

        for order in cancelled {
            events.push(AuditEvent::OrderCancelled(OrderRecord::from(order)));
        }
        for report in reports {
            events.push(AuditEvent::OrderAccepted(OrderRecord::from(&report.order)));
            for resting in &report.resting_changed {
                events.push(AuditEvent::OrderUpdated(OrderRecord::from(resting)));
            }
            for trade in &report.trades {
                events.push(AuditEvent::TradeExecuted(TradeRecord::from(trade)));
            }
        }

        let mut affected: Vec<UserId> = Vec::new();
        for report in reports {
            for user_id in &report.affected_users {
                if !affected.contains(user_id) {
                    affected.push(*user_id);
                }
            }
        }
        for user_id in affected {
            if let Some(user) = self.exchange.get_user(&user_id) {
                events.push(AuditEvent::UserBalances(UserRecord::from(&user)));
            }
        }

        events
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::{JournalConfig, JournalReader};
    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use types::user::User;

    fn setup(tmp: &TempDir) -> (Arc<Exchange>, Arc<Mutex<Journal>>, UserId) {
        let exchange = Arc::new(Exchange::new([(Ticker::new("FUN"), Price::from_u64(100))]));
        let mm = User::market_maker("bot");
        let mm_id = mm.user_id;
        exchange.register_user(mm);

        let journal = Journal::open(JournalConfig::new(tmp.path())).unwrap();
        (exchange, Arc::new(Mutex::new(journal)), mm_id)
    }

    fn bot_config() -> LiquidityBotConfig {
        LiquidityBotConfig {
            interval_ms: 10,
            spread: Decimal::new(1, 2),
            min_quantity: 5,
            max_quantity: 20,
            seed: 42,
        }
    }

    #[tokio::test]
    async fn test_quote_posts_two_sided_market() {
        let tmp = TempDir::new().unwrap();
        let (exchange, journal, mm_id) = setup(&tmp);
        let ticker = Ticker::new("FUN");
        let mut bot = LiquidityBot::new(Arc::clone(&exchange), journal, mm_id, bot_config());

        bot.quote(&ticker).await.unwrap();

        let (best_bid, best_ask) = exchange.get_best(&ticker).await.unwrap();
        assert_eq!(best_bid, Some(Price::from_u64(99)));
        assert_eq!(best_ask, Some(Price::from_u64(101)));
    }

    #[tokio::test]
    async fn test_requote_cancels_stale_quotes() {
        let tmp = TempDir::new().unwrap();
        let (exchange, journal, mm_id) = setup(&tmp);
        let ticker = Ticker::new("FUN");
        let mut bot = LiquidityBot::new(Arc::clone(&exchange), journal, mm_id, bot_config());

        bot.quote(&ticker).await.unwrap();
        bot.quote(&ticker).await.unwrap();

        let snapshot = exchange.get_book(&ticker).await.unwrap();
        let bid_total: i64 = snapshot.bids.iter().map(|(_, q)| q).sum();
        let ask_total: i64 = snapshot.asks.iter().map(|(_, q)| q).sum();
        assert_eq!(snapshot.bids.len(), 1, "exactly one resting bid quote");
        assert_eq!(snapshot.asks.len(), 1, "exactly one resting ask quote");
        assert!(bid_total >= 5 && bid_total <= 20);
        assert!(ask_total >= 5 && ask_total <= 20);
    }

    #[tokio::test]
    async fn test_cycle_is_journaled() {
        let tmp = TempDir::new().unwrap();
        let (exchange, journal, mm_id) = setup(&tmp);
        let ticker = Ticker::new("FUN");
        let mut bot = LiquidityBot::new(exchange, journal, mm_id, bot_config());

        bot.quote(&ticker).await.unwrap();

        let events = JournalReader::new(tmp.path()).read_events().unwrap();
        let accepted = events
            .iter()
            .filter(|e| matches!(e, AuditEvent::OrderAccepted(_)))
            .count();
        let balances = events
            .iter()
            .filter(|e| matches!(e, AuditEvent::UserBalances(_)))
            .count();
        assert_eq!(accepted, 2, "bid and ask recorded");
        assert_eq!(balances, 1, "market-maker balances recorded");
    }

    #[tokio::test]
    async fn test_requote_journals_cancellations() {
        let tmp = TempDir::new().unwrap();
        let (exchange, journal, mm_id) = setup(&tmp);
        let ticker = Ticker::new("FUN");
        let mut bot = LiquidityBot::new(exchange, journal, mm_id, bot_config());

        bot.quote(&ticker).await.unwrap();
        bot.quote(&ticker).await.unwrap();

        let events = JournalReader::new(tmp.path()).read_events().unwrap();
        let cancelled = events
            .iter()
            .filter(|e| matches!(e, AuditEvent::OrderCancelled(_)))
            .count();
        assert_eq!(cancelled, 2, "second cycle cancels both stale quotes");
    }

    #[tokio::test]
    async fn test_same_seed_same_sizes() {
        let tmp_a = TempDir::new().unwrap();
        let tmp_b = TempDir::new().unwrap();
        let (exchange_a, journal_a, mm_a) = setup(&tmp_a);
        let (exchange_b, journal_b, mm_b) = setup(&tmp_b);
        let ticker = Ticker::new("FUN");

        let mut bot_a = LiquidityBot::new(Arc::clone(&exchange_a), journal_a, mm_a, bot_config());
        let mut bot_b = LiquidityBot::new(Arc::clone(&exchange_b), journal_b, mm_b, bot_config());

        bot_a.quote(&ticker).await.unwrap();
        bot_b.quote(&ticker).await.unwrap();

        let book_a = exchange_a.get_book(&ticker).await.unwrap();
        let book_b = exchange_b.get_book(&ticker).await.unwrap();
        assert_eq!(book_a.bids, book_b.bids);
        assert_eq!(book_a.asks, book_b.asks);
    }

    #[tokio::test]
    async fn test_extreme_spread_quotes_one_sided() {
        let tmp = TempDir::new().unwrap();
        let (exchange, journal, mm_id) = setup(&tmp);
        let ticker = Ticker::new("FUN");
        let config = LiquidityBotConfig {
            spread: Decimal::from(1), // 100% spread: bid price would be zero
            ..bot_config()
        };
        let mut bot = LiquidityBot::new(Arc::clone(&exchange), journal, mm_id, config);

        bot.quote(&ticker).await.unwrap();

        let (best_bid, best_ask) = exchange.get_best(&ticker).await.unwrap();
        assert_eq!(best_bid, None, "zero bid price is not quoted");
        assert_eq!(best_ask, Some(Price::from_u64(200)));
    }
}
