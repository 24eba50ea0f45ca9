//! Exchange configuration
//!
//! Loaded from a JSON file; every field has a default matching the demo
//! deployment, so a missing file or empty object is still runnable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use thiserror::Error;
use types::ids::Ticker;
use types::order::TimeInForce;
use types::price::Price;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid ticker symbol '{0}'")]
    InvalidTicker(String),

    #[error("invalid initial price {price} for ticker '{ticker}'")]
    InvalidPrice { ticker: String, price: Decimal },
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Listed tickers and their initial prices
    pub tickers: BTreeMap<String, Decimal>,
    /// Fallback time-in-force when a request omits it
    pub default_tif: TimeInForce,
    /// Cash granted to newly registered users
    pub starting_cash: Decimal,
    /// Liquidity bot cadence and quote shape
    pub liquidity_bot: LiquidityBotConfig,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        let mut tickers = BTreeMap::new();
        tickers.insert("FUN".to_string(), Decimal::from(100));
        tickers.insert("MEME".to_string(), Decimal::from(50));
        tickers.insert("YOLO".to_string(), Decimal::from(200));
        tickers.insert("HODL".to_string(), Decimal::from(75));
        tickers.insert("PUMP".to_string(), Decimal::from(25));

        Self {
            tickers,
            default_tif: TimeInForce::GTC,
            starting_cash: Decimal::from(10_000),
            liquidity_bot: LiquidityBotConfig::default(),
        }
    }
}

impl ExchangeConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Validated (ticker, initial price) pairs
    pub fn ticker_prices(&self) -> Result<Vec<(Ticker, Price)>, ConfigError> {
        self.tickers
            .iter()
            .map(|(symbol, price)| {
                let ticker = Ticker::try_new(symbol.clone())
                    .ok_or_else(|| ConfigError::InvalidTicker(symbol.clone()))?;
                let price = Price::try_new(*price).ok_or(ConfigError::InvalidPrice {
                    ticker: symbol.clone(),
                    price: *price,
                })?;
                Ok((ticker, price))
            })
            .collect()
    }
}

/// Liquidity bot settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityBotConfig {
    /// Quote cycle cadence in milliseconds
    pub interval_ms: u64,
    /// Half-spread as a fraction of the reference price (0.01 = 1%)
    pub spread: Decimal,
    /// Minimum quote size in shares
    pub min_quantity: i64,
    /// Maximum quote size in shares
    pub max_quantity: i64,
    /// RNG seed for quote sizes
    pub seed: u64,
}

impl Default for LiquidityBotConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            spread: Decimal::new(1, 2),
            min_quantity: 5,
            max_quantity: 20,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExchangeConfig::default();
        assert_eq!(config.tickers.len(), 5);
        assert_eq!(config.tickers["FUN"], Decimal::from(100));
        assert_eq!(config.default_tif, TimeInForce::GTC);
        assert_eq!(config.starting_cash, Decimal::from(10_000));
        assert_eq!(config.liquidity_bot.interval_ms, 2_000);
    }

    #[test]
    fn test_ticker_prices_validated() {
        let config = ExchangeConfig::default();
        let pairs = config.ticker_prices().unwrap();
        assert_eq!(pairs.len(), 5);
        assert!(pairs.iter().any(|(t, p)| t.as_str() == "YOLO" && *p == Price::from_u64(200)));
    }

    #[test]
    fn test_invalid_ticker_rejected() {
        let mut config = ExchangeConfig::default();
        config.tickers.insert("bad!".to_string(), Decimal::from(10));
        assert!(matches!(
            config.ticker_prices(),
            Err(ConfigError::InvalidTicker(_))
        ));
    }

    #[test]
    fn test_invalid_price_rejected() {
        let mut config = ExchangeConfig::default();
        config.tickers.insert("ZERO".to_string(), Decimal::ZERO);
        assert!(matches!(
            config.ticker_prices(),
            Err(ConfigError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ExchangeConfig =
            serde_json::from_str(r#"{"tickers": {"ABC": "42.5"}}"#).unwrap();
        assert_eq!(config.tickers.len(), 1);
        assert_eq!(config.tickers["ABC"], Decimal::new(425, 1));
        assert_eq!(config.starting_cash, Decimal::from(10_000));
        assert_eq!(config.liquidity_bot.spread, Decimal::new(1, 2));
    }

    #[test]
    fn test_round_trip() {
        let config = ExchangeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ExchangeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tickers, config.tickers);
        assert_eq!(parsed.liquidity_bot.seed, config.liquidity_bot.seed);
    }
}
