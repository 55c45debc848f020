//! Error taxonomy surfaced to callers.
//!
//! Every failure is synchronous and reported to the direct caller only;
//! nothing is retried inside the engine. Invariant violations are
//! programming errors and are not representable here.

use crate::types::{OrderId, OrderStatus};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Bad quantity, bad price, missing price, wrong or empty symbol.
    /// No state was mutated.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An order with the same id was already admitted to this book.
    #[error("order {0} already exists")]
    OrderExists(OrderId),

    /// Cancel or lookup for an id this engine has never admitted.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// Cancel of an order that is already filled, cancelled, or rejected.
    #[error("order {order_id} is already terminal ({status:?})")]
    AlreadyTerminal {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A symbol-scoped query named a symbol with no book.
    #[error("no order book for symbol {0}")]
    UnknownSymbol(String),

    /// Symbol removal refused while the book still holds resting orders.
    #[error("order book for {0} still has resting orders")]
    SymbolBusy(String),
}
