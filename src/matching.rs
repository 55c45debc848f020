//! Price-time priority matching.
//!
//! [`match_incoming`] runs one admitted order against the opposite side of
//! its book: best price first, FIFO within a price, trade price always the
//! maker's. The taker is never matched against its own side, and nothing
//! here blocks or allocates beyond the returned trades.

use crate::clock::LogicalClock;
use crate::order_book::OrderBook;
use crate::types::{Order, OrderKind, Side, Trade, TradeId};

/// Matches `taker` against the book until its remaining quantity is zero,
/// the opposite side is exhausted, or the price condition stops crossing.
/// Both sides' fill counters and statuses are updated in place; the caller
/// decides what happens to any residual.
pub(crate) fn match_incoming(
    book: &mut OrderBook,
    taker: &mut Order,
    clock: &LogicalClock,
) -> Vec<Trade> {
    // Market orders cross every level; limit and stop orders carry a limit.
    let limit = match taker.kind {
        OrderKind::Market => None,
        OrderKind::Limit | OrderKind::Stop => taker.price,
    };

    let fills = match taker.side {
        Side::Buy => book.take_from_asks(limit, taker.remaining, clock),
        Side::Sell => book.take_from_bids(limit, taker.remaining, clock),
    };

    let mut trades = Vec::with_capacity(fills.len());
    for fill in fills {
        taker.apply_fill(fill.quantity, fill.executed_at);
        let (buy_order_id, sell_order_id, buyer_owner_id, seller_owner_id) = match taker.side {
            Side::Buy => (
                taker.id,
                fill.maker_order_id,
                taker.owner_id.clone(),
                fill.maker_owner_id,
            ),
            Side::Sell => (
                fill.maker_order_id,
                taker.id,
                fill.maker_owner_id,
                taker.owner_id.clone(),
            ),
        };
        trades.push(Trade {
            id: TradeId::new(),
            symbol: taker.symbol.clone(),
            buy_order_id,
            sell_order_id,
            buyer_owner_id,
            seller_owner_id,
            price: fill.price,
            quantity: fill.quantity,
            executed_at: fill.executed_at,
        });
    }
    trades
}
