//! Liquidity bot
//!
//! Background task that keeps two-sided quotes on every listed ticker using
//! the market-maker bypass. Each cycle cancels the previous quotes, reads
//! the reference price, and reposts a bid/ask pair around it; the whole
//! cycle is journaled on the same audit contract as user activity.

pub mod bot;

pub use bot::{BotError, LiquidityBot};
