//! # matchbook
//!
//! Concurrent price-time priority matching engine: per-instrument limit
//! order books, deterministic FIFO matching within a price, and a
//! symbol-keyed engine facade safe to share across threads.
//!
//! ## Entry point
//!
//! Use [`MatchingEngine`] as the single entry point: create with
//! [`MatchingEngine::new`], then [`MatchingEngine::submit`],
//! [`MatchingEngine::cancel`], and [`MatchingEngine::snapshot`]. Books are
//! created on first reference.
//!
//! ## Example
//!
//! ```rust
//! use matchbook::{MatchingEngine, OrderRequest, OrderStatus, Side};
//! use rust_decimal::Decimal;
//!
//! let engine = MatchingEngine::new();
//! let sell = OrderRequest::limit("alice", "BTC/USD", Side::Sell, Decimal::from(100), Decimal::from(10));
//! engine.submit(sell).unwrap();
//!
//! let buy = OrderRequest::limit("bob", "BTC/USD", Side::Buy, Decimal::from(100), Decimal::from(4));
//! let result = engine.submit(buy).unwrap();
//! assert_eq!(result.trades.len(), 1);
//! assert_eq!(result.trades[0].quantity, Decimal::from(4));
//! assert_eq!(result.order.status, OrderStatus::Filled);
//! ```
//!
//! ## Lower-level API
//!
//! [`OrderBook`] can be used directly for single-threaded work; it exposes
//! the same submit/cancel/snapshot surface against one instrument, with the
//! caller providing the [`LogicalClock`].

pub mod clock;
pub mod engine;
pub mod error;
mod matching;
pub mod order_book;
pub mod order_flow;
pub mod price_level;
pub mod types;

pub use clock::LogicalClock;
pub use engine::MatchingEngine;
pub use error::EngineError;
pub use order_book::OrderBook;
pub use order_flow::{replay, FlowConfig, OrderFlow};
pub use price_level::PriceLevel;
pub use types::{
    BookSnapshot, LevelSnapshot, Order, OrderId, OrderKind, OrderRequest, OrderStatus,
    RejectReason, RestingInfo, Side, SubmitResult, Trade, TradeId,
};
