//! Multi-instrument matching engine facade.
//!
//! [`MatchingEngine`] demultiplexes by symbol: a registry lock is held just
//! long enough to find or create the book, then the work happens under that
//! book's own lock. Submissions against different symbols therefore proceed
//! in parallel, while each book stays a single serialised critical section.
//!
//! Lock order is registry before book, never the reverse, and no thread
//! holds two book locks at once.

use crate::clock::LogicalClock;
use crate::error::EngineError;
use crate::order_book::OrderBook;
use crate::types::{BookSnapshot, Order, OrderId, OrderRequest, SubmitResult};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type SharedBook = Arc<RwLock<OrderBook>>;

/// Registry of order books keyed by symbol. Books are created on first
/// reference; all operations are `&self` and safe to call from any thread.
pub struct MatchingEngine {
    books: RwLock<BTreeMap<String, SharedBook>>,
    clock: LogicalClock,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(BTreeMap::new()),
            clock: LogicalClock::new(),
        }
    }

    /// Submits an order, creating the symbol's book on first reference.
    /// Matching runs under the book's writer lock; the registry lock is
    /// released before the book lock is taken.
    pub fn submit(&self, request: OrderRequest) -> Result<SubmitResult, EngineError> {
        request.validate()?;
        let book = self.book_or_create(&request.symbol);
        let result = book.write().expect("book lock poisoned").submit(request, &self.clock);
        if let Ok(result) = &result {
            debug!(
                "engine: order {} on {} -> {:?}, {} trade(s)",
                result.order.id,
                result.order.symbol,
                result.order.status,
                result.trades.len()
            );
        }
        result
    }

    /// Cancels by id. Order ids do not carry the symbol, so books are asked
    /// in symbol order until one recognises the id; each book is locked on
    /// its own, never two at once.
    pub fn cancel(&self, order_id: OrderId) -> Result<Order, EngineError> {
        for book in self.all_books() {
            match book.write().expect("book lock poisoned").cancel(order_id, &self.clock) {
                Err(EngineError::NotFound(_)) => continue,
                outcome => return outcome,
            }
        }
        Err(EngineError::NotFound(order_id))
    }

    /// Point-in-time snapshot of one book.
    pub fn snapshot(&self, symbol: &str) -> Result<BookSnapshot, EngineError> {
        let book = self.book(symbol)?;
        let snapshot = book.read().expect("book lock poisoned").snapshot(&self.clock);
        Ok(snapshot)
    }

    /// Cloned order record by id, searching books in symbol order.
    pub fn get_order(&self, order_id: OrderId) -> Result<Order, EngineError> {
        for book in self.all_books() {
            if let Some(order) = book.read().expect("book lock poisoned").get_order(order_id) {
                return Ok(order);
            }
        }
        Err(EngineError::NotFound(order_id))
    }

    /// All of one owner's orders on a symbol, live and terminal.
    pub fn orders_by_owner(&self, symbol: &str, owner_id: &str) -> Result<Vec<Order>, EngineError> {
        let book = self.book(symbol)?;
        let orders = book.read().expect("book lock poisoned").orders_by_owner(owner_id);
        Ok(orders)
    }

    /// Orders currently resting on a symbol's book.
    pub fn resting_orders(&self, symbol: &str) -> Result<Vec<Order>, EngineError> {
        let book = self.book(symbol)?;
        let orders = book.read().expect("book lock poisoned").resting_orders();
        Ok(orders)
    }

    /// Best bid price on a symbol, if any.
    pub fn best_bid(&self, symbol: &str) -> Result<Option<Decimal>, EngineError> {
        let book = self.book(symbol)?;
        let best = book.read().expect("book lock poisoned").best_bid();
        Ok(best)
    }

    /// Best ask price on a symbol, if any.
    pub fn best_ask(&self, symbol: &str) -> Result<Option<Decimal>, EngineError> {
        let book = self.book(symbol)?;
        let best = book.read().expect("book lock poisoned").best_ask();
        Ok(best)
    }

    /// Creates an empty book for a symbol ahead of any order flow.
    pub fn add_symbol(&self, symbol: &str) -> Result<(), EngineError> {
        if symbol.is_empty() {
            return Err(EngineError::InvalidRequest("symbol must not be empty".into()));
        }
        let mut books = self.books.write().expect("registry lock poisoned");
        if books.contains_key(symbol) {
            return Err(EngineError::InvalidRequest(format!(
                "symbol {symbol} already exists"
            )));
        }
        books.insert(
            symbol.to_string(),
            Arc::new(RwLock::new(OrderBook::new(symbol))),
        );
        debug!("engine: added symbol {symbol}");
        Ok(())
    }

    /// Destroys a symbol's book. Refused while any order rests on it.
    pub fn remove_symbol(&self, symbol: &str) -> Result<(), EngineError> {
        let mut books = self.books.write().expect("registry lock poisoned");
        let Some(book) = books.get(symbol) else {
            return Err(EngineError::UnknownSymbol(symbol.to_string()));
        };
        if book.read().expect("book lock poisoned").has_resting_orders() {
            return Err(EngineError::SymbolBusy(symbol.to_string()));
        }
        books.remove(symbol);
        debug!("engine: removed symbol {symbol}");
        Ok(())
    }

    /// Registered symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        self.books
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    fn book(&self, symbol: &str) -> Result<SharedBook, EngineError> {
        self.books
            .read()
            .expect("registry lock poisoned")
            .get(symbol)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }

    fn book_or_create(&self, symbol: &str) -> SharedBook {
        if let Ok(book) = self.book(symbol) {
            return book;
        }
        let mut books = self.books.write().expect("registry lock poisoned");
        books
            .entry(symbol.to_string())
            .or_insert_with(|| {
                debug!("engine: creating order book for {symbol}");
                Arc::new(RwLock::new(OrderBook::new(symbol)))
            })
            .clone()
    }

    /// Snapshot of the registry, symbol order. Taken under the registry
    /// lock, used after it is released so book locks are never nested
    /// inside it.
    fn all_books(&self) -> Vec<SharedBook> {
        self.books
            .read()
            .expect("registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
