//! Core value records: identifiers, orders, trades, and the submit/snapshot
//! surfaces.
//!
//! All identifiers are newtype wrappers. [`Order`] carries the mutable fill
//! counters and lifecycle status; [`Trade`] is immutable once emitted.

use crate::error::EngineError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique order identifier. Generated at admission unless the client
/// supplied one with the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique trade identifier, generated at execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(Uuid);

impl TradeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind. Stop orders are accepted into the record but matched as limit
/// orders at the stop price; trigger semantics live outside this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
    Market,
    Stop,
}

/// Order lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Partial,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Terminal orders no longer rest on any book and cannot be cancelled.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Submit input: what the transport layer hands the engine.
///
/// `id` is the optional client-supplied order id; when absent the engine
/// assigns one at admission. `price` is required (and positive) for limit
/// and stop orders and ignored for market orders.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    pub id: Option<OrderId>,
    pub owner_id: String,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
}

impl OrderRequest {
    pub fn limit(
        owner_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: None,
            owner_id: owner_id.into(),
            symbol: symbol.into(),
            side,
            kind: OrderKind::Limit,
            price: Some(price),
            quantity,
        }
    }

    pub fn market(
        owner_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: None,
            owner_id: owner_id.into(),
            symbol: symbol.into(),
            side,
            kind: OrderKind::Market,
            price: None,
            quantity,
        }
    }

    /// The stop price is carried as the limit price; see [`OrderKind::Stop`].
    pub fn stop(
        owner_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        stop_price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: None,
            owner_id: owner_id.into(),
            symbol: symbol.into(),
            side,
            kind: OrderKind::Stop,
            price: Some(stop_price),
            quantity,
        }
    }

    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = Some(id);
        self
    }

    /// Field-level validation. Rejections here mutate nothing.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.symbol.is_empty() {
            return Err(EngineError::InvalidRequest(
                "symbol must not be empty".into(),
            ));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(EngineError::InvalidRequest(
                "quantity must be positive".into(),
            ));
        }
        match self.kind {
            OrderKind::Market => Ok(()),
            OrderKind::Limit | OrderKind::Stop => match self.price {
                Some(p) if p > Decimal::ZERO => Ok(()),
                Some(_) => Err(EngineError::InvalidRequest(
                    "price must be positive".into(),
                )),
                None => Err(EngineError::InvalidRequest(
                    "limit and stop orders require a price".into(),
                )),
            },
        }
    }
}

/// An order as the engine owns it: identity plus mutable fill accounting.
///
/// `filled + remaining == quantity` at all times; `filled` only grows.
/// Timestamps are logical ticks from the engine clock and are observational
/// only; matching priority is arrival order under the book lock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner_id: String,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub filled: Decimal,
    pub remaining: Decimal,
    pub status: OrderStatus,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Order {
    /// Builds the admitted order for a validated request. Market orders drop
    /// any price the client sent.
    pub(crate) fn admit(request: OrderRequest, id: OrderId, now: u64) -> Self {
        let price = match request.kind {
            OrderKind::Market => None,
            OrderKind::Limit | OrderKind::Stop => request.price,
        };
        Self {
            id,
            owner_id: request.owner_id,
            symbol: request.symbol,
            side: request.side,
            kind: request.kind,
            price,
            quantity: request.quantity,
            filled: Decimal::ZERO,
            remaining: request.quantity,
            status: OrderStatus::New,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies one execution to the fill counters and status.
    /// Precondition: `0 < quantity <= self.remaining`.
    pub(crate) fn apply_fill(&mut self, quantity: Decimal, now: u64) {
        self.filled += quantity;
        self.remaining -= quantity;
        self.status = if self.remaining.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };
        self.updated_at = now;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One execution between a resting maker and an incoming taker.
/// `price` is always the maker's limit price.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub symbol: String,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer_owner_id: String,
    pub seller_owner_id: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub executed_at: u64,
}

/// Why an admitted order ended up rejected after matching ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// A market order could not be fully filled; the partial executions
    /// stand and the residual is rejected.
    MarketOrderIncomplete,
}

/// Residual that rested on the book after matching.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestingInfo {
    pub price: Decimal,
    pub remaining: Decimal,
}

/// Outcome of one submission: the final order state, the trades it produced
/// (in matching order), and where any residual rests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitResult {
    pub order: Order,
    pub trades: Vec<Trade>,
    pub resting: Option<RestingInfo>,
    pub reject: Option<RejectReason>,
}

impl SubmitResult {
    pub fn is_rejected(&self) -> bool {
        self.reject.is_some()
    }

    pub fn is_resting(&self) -> bool {
        self.resting.is_some()
    }
}

/// One side's level in a snapshot: price, aggregate remaining quantity, and
/// the number of resting orders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: Decimal,
    pub quantity: Decimal,
    pub orders: usize,
}

/// Point-in-time copy of one book: bids best-first (descending), asks
/// best-first (ascending). No references into the live book escape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: String,
    pub timestamp: u64,
    pub bids: Vec<LevelSnapshot>,
    pub asks: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<&LevelSnapshot> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&LevelSnapshot> {
        self.asks.first()
    }
}
