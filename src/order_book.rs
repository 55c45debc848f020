//! Single-instrument order book: bids and asks, price-time priority.
//!
//! Each side is a price-ordered index of FIFO [`PriceLevel`]s; best bid is
//! the highest price, best ask the lowest. The book also keeps an archive of
//! every order it has admitted (live and terminal) and a location lookup for
//! the orders currently resting on it.
//!
//! The book itself is a plain single-writer structure. Concurrency lives in
//! [`crate::engine::MatchingEngine`], which wraps each book in a `RwLock`:
//! `submit` and `cancel` run under the writer lock, `snapshot` and the read
//! queries under the read lock.

use crate::clock::LogicalClock;
use crate::error::EngineError;
use crate::matching;
use crate::price_level::PriceLevel;
use crate::types::{
    BookSnapshot, LevelSnapshot, Order, OrderId, OrderKind, OrderRequest, OrderStatus,
    RejectReason, RestingInfo, Side, SubmitResult,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// One execution taken from the book (one per resting order filled).
#[derive(Clone, Debug)]
pub(crate) struct Fill {
    pub maker_order_id: OrderId,
    pub maker_owner_id: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub executed_at: u64,
}

/// Per-symbol book state.
pub struct OrderBook {
    symbol: String,
    bids: BTreeMap<Decimal, PriceLevel>,
    asks: BTreeMap<Decimal, PriceLevel>,
    /// Every order admitted to this book, live and terminal. Terminal
    /// records stay so a second cancel reports `AlreadyTerminal` rather
    /// than `NotFound`.
    orders: HashMap<OrderId, Order>,
    /// id -> (side, price) for orders currently resting on the book.
    resting: HashMap<OrderId, (Side, Decimal)>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
            resting: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Admits one order: validate, match against the opposite side, then
    /// rest or reject any residual. Runs to completion under one writer
    /// lock; the returned trades are in matching order.
    pub fn submit(
        &mut self,
        request: OrderRequest,
        clock: &LogicalClock,
    ) -> Result<SubmitResult, EngineError> {
        request.validate()?;
        if request.symbol != self.symbol {
            return Err(EngineError::InvalidRequest(format!(
                "order symbol {} does not match book {}",
                request.symbol, self.symbol
            )));
        }
        let id = request.id.unwrap_or_else(OrderId::new);
        if self.orders.contains_key(&id) {
            return Err(EngineError::OrderExists(id));
        }

        let now = clock.tick();
        let mut order = Order::admit(request, id, now);
        let trades = matching::match_incoming(self, &mut order, clock);

        let mut resting = None;
        let mut reject = None;
        if order.remaining > Decimal::ZERO {
            match order.kind {
                OrderKind::Market => {
                    // Residual market quantity is rejected; the executions
                    // already taken stand.
                    order.status = OrderStatus::Rejected;
                    order.updated_at = clock.tick();
                    reject = Some(RejectReason::MarketOrderIncomplete);
                    debug!(
                        "book {}: market order {} rejected with {} unfilled",
                        self.symbol, order.id, order.remaining
                    );
                }
                OrderKind::Limit | OrderKind::Stop => {
                    if let Some(limit_price) = order.price {
                        self.insert_resting(limit_price, &order);
                        resting = Some(RestingInfo {
                            price: limit_price,
                            remaining: order.remaining,
                        });
                    }
                }
            }
        }

        self.orders.insert(order.id, order.clone());
        trace!(
            "book {}: order {} submitted, {} trade(s), status {:?}",
            self.symbol,
            order.id,
            trades.len(),
            order.status
        );
        Ok(SubmitResult {
            order,
            trades,
            resting,
            reject,
        })
    }

    /// Cancels a resting order. Returns the cancelled order, or an error if
    /// the id is unknown or the order is already terminal.
    pub fn cancel(
        &mut self,
        order_id: OrderId,
        clock: &LogicalClock,
    ) -> Result<Order, EngineError> {
        let status = self
            .orders
            .get(&order_id)
            .map(|o| o.status)
            .ok_or(EngineError::NotFound(order_id))?;
        if status.is_terminal() {
            return Err(EngineError::AlreadyTerminal { order_id, status });
        }

        if let Some((side, price)) = self.resting.remove(&order_id) {
            let index = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            if let Some(level) = index.get_mut(&price) {
                level.remove(&order_id);
                if level.is_empty() {
                    index.remove(&price);
                }
            }
        }

        let now = clock.tick();
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(EngineError::NotFound(order_id))?;
        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        debug!("book {}: order {} cancelled", self.symbol, order_id);
        Ok(order.clone())
    }

    /// Point-in-time copy of both sides: bids best-first (descending price),
    /// asks best-first (ascending).
    pub fn snapshot(&self, clock: &LogicalClock) -> BookSnapshot {
        let level_snapshot = |price: &Decimal, level: &PriceLevel| LevelSnapshot {
            price: *price,
            quantity: level.total_quantity(),
            orders: level.order_count(),
        };
        BookSnapshot {
            symbol: self.symbol.clone(),
            timestamp: clock.tick(),
            bids: self
                .bids
                .iter()
                .rev()
                .map(|(p, l)| level_snapshot(p, l))
                .collect(),
            asks: self
                .asks
                .iter()
                .map(|(p, l)| level_snapshot(p, l))
                .collect(),
        }
    }

    /// Cloned order record by id (live or terminal).
    pub fn get_order(&self, order_id: OrderId) -> Option<Order> {
        self.orders.get(&order_id).cloned()
    }

    /// All orders this book has seen for an owner, live and terminal,
    /// oldest first.
    pub fn orders_by_owner(&self, owner_id: &str) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| o.owner_id == owner_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    /// Cloned copies of the orders currently resting on the book.
    pub fn resting_orders(&self) -> Vec<Order> {
        self.resting
            .keys()
            .filter_map(|id| self.orders.get(id).cloned())
            .collect()
    }

    /// Best bid price (None if the side is empty).
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Best ask price (None if the side is empty).
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// True while any order rests on either side (blocks symbol removal).
    pub fn has_resting_orders(&self) -> bool {
        !self.resting.is_empty()
    }

    fn insert_resting(&mut self, price: Decimal, order: &Order) {
        let index = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        index
            .entry(price)
            .or_default()
            .push_back(order.id, order.remaining);
        self.resting.insert(order.id, (order.side, price));
        trace!(
            "book {}: order {} resting {:?} {} @ {}",
            self.symbol,
            order.id,
            order.side,
            order.remaining,
            price
        );
    }

    /// Takes liquidity from the ask side for an incoming buy, best price
    /// first, FIFO within a price. `limit` of None means a market order
    /// (every price crosses). Updates maker records, the location lookup,
    /// and the level indices; returns one fill per maker touched.
    pub(crate) fn take_from_asks(
        &mut self,
        limit: Option<Decimal>,
        want: Decimal,
        clock: &LogicalClock,
    ) -> Vec<Fill> {
        let mut fills = Vec::new();
        let mut want = want;
        while want > Decimal::ZERO {
            let Some(best) = self.asks.keys().next().copied() else {
                break;
            };
            if let Some(limit) = limit {
                if best > limit {
                    break;
                }
            }
            let Some(level) = self.asks.get_mut(&best) else {
                break;
            };
            let taken = Self::drain_level(
                level,
                &mut self.orders,
                &mut self.resting,
                best,
                want,
                clock,
                &mut fills,
            );
            let emptied = level.is_empty();
            if emptied {
                self.asks.remove(&best);
            }
            if taken.is_zero() {
                break;
            }
            want -= taken;
        }
        fills
    }

    /// Mirror of [`Self::take_from_asks`] for an incoming sell against the
    /// bid side (best = highest price).
    pub(crate) fn take_from_bids(
        &mut self,
        limit: Option<Decimal>,
        want: Decimal,
        clock: &LogicalClock,
    ) -> Vec<Fill> {
        let mut fills = Vec::new();
        let mut want = want;
        while want > Decimal::ZERO {
            let Some(best) = self.bids.keys().next_back().copied() else {
                break;
            };
            if let Some(limit) = limit {
                if best < limit {
                    break;
                }
            }
            let Some(level) = self.bids.get_mut(&best) else {
                break;
            };
            let taken = Self::drain_level(
                level,
                &mut self.orders,
                &mut self.resting,
                best,
                want,
                clock,
                &mut fills,
            );
            let emptied = level.is_empty();
            if emptied {
                self.bids.remove(&best);
            }
            if taken.is_zero() {
                break;
            }
            want -= taken;
        }
        fills
    }

    /// Drains up to `want` quantity from one level, front to back. Maker
    /// archive records and the location lookup stay consistent with the
    /// queue: a fully filled maker is popped and delisted, a partially
    /// filled one keeps its slot.
    #[allow(clippy::too_many_arguments)]
    fn drain_level(
        level: &mut PriceLevel,
        orders: &mut HashMap<OrderId, Order>,
        resting: &mut HashMap<OrderId, (Side, Decimal)>,
        price: Decimal,
        want: Decimal,
        clock: &LogicalClock,
        fills: &mut Vec<Fill>,
    ) -> Decimal {
        let mut taken = Decimal::ZERO;
        while taken < want {
            let Some(front) = level.front() else {
                break;
            };
            let maker_id = front.order_id;
            let quantity = front.remaining.min(want - taken);
            let Some(maker) = orders.get_mut(&maker_id) else {
                // A queue slot without an archive record violates the
                // book's bookkeeping; drop the slot rather than loop.
                debug_assert!(false, "level entry without archive record");
                level.pop_front();
                continue;
            };
            let executed_at = clock.tick();
            maker.apply_fill(quantity, executed_at);
            fills.push(Fill {
                maker_order_id: maker_id,
                maker_owner_id: maker.owner_id.clone(),
                price,
                quantity,
                executed_at,
            });
            if maker.remaining.is_zero() {
                level.pop_front();
                resting.remove(&maker_id);
            } else {
                level.fill_front(quantity);
            }
            taken += quantity;
        }
        taken
    }
}
