//! Property-based and deterministic invariant tests.
//!
//! Uses proptest to generate (seed, num_requests); replays synthetic order
//! flow into the engine and asserts after every submission: level aggregates
//! equal the sum of resting remaining quantities, fill accounting conserves
//! quantity, and no trade violates its taker's price limit.

use matchbook::{
    replay, EngineError, FlowConfig, MatchingEngine, OrderFlow, OrderKind, Side, SubmitResult,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

const SYMBOL: &str = "BTC/USD";

fn flow(seed: u64, num_requests: usize) -> OrderFlow {
    OrderFlow::new(FlowConfig {
        seed,
        symbol: SYMBOL.to_string(),
        num_requests,
        ..Default::default()
    })
}

/// Level aggregates must equal the sum of resting orders' remaining
/// quantities, per side, and level order counts must add up to the number
/// of resting orders.
fn assert_aggregates_consistent(engine: &MatchingEngine) {
    let resting = engine.resting_orders(SYMBOL).unwrap();
    let snapshot = engine.snapshot(SYMBOL).unwrap();

    let side_sum = |side: Side| -> Decimal {
        resting
            .iter()
            .filter(|o| o.side == side)
            .map(|o| o.remaining)
            .sum()
    };
    let bid_total: Decimal = snapshot.bids.iter().map(|l| l.quantity).sum();
    let ask_total: Decimal = snapshot.asks.iter().map(|l| l.quantity).sum();
    assert_eq!(bid_total, side_sum(Side::Buy), "bid aggregates out of step");
    assert_eq!(ask_total, side_sum(Side::Sell), "ask aggregates out of step");

    let level_orders: usize = snapshot
        .bids
        .iter()
        .chain(snapshot.asks.iter())
        .map(|l| l.orders)
        .sum();
    assert_eq!(level_orders, resting.len(), "lookup and levels disagree");

    for level in snapshot.bids.iter().chain(snapshot.asks.iter()) {
        assert!(level.orders > 0, "empty level must be removed");
        assert!(level.quantity > Decimal::ZERO);
    }
}

/// Every order's filled quantity must equal the sum of its trade quantities,
/// and filled + remaining must equal the original quantity.
fn assert_fill_conservation(engine: &MatchingEngine, results: &[SubmitResult]) {
    let mut traded: HashMap<matchbook::OrderId, Decimal> = HashMap::new();
    for result in results {
        for trade in &result.trades {
            assert!(trade.quantity > Decimal::ZERO, "trade quantity must be positive");
            assert!(trade.price >= Decimal::ZERO, "trade price must be non-negative");
            *traded.entry(trade.buy_order_id).or_default() += trade.quantity;
            *traded.entry(trade.sell_order_id).or_default() += trade.quantity;
        }
    }
    for result in results {
        let order = engine.get_order(result.order.id).unwrap();
        let expected = traded.get(&order.id).copied().unwrap_or_default();
        assert_eq!(order.filled, expected, "filled must equal summed trade quantity");
        assert_eq!(
            order.filled + order.remaining,
            order.quantity,
            "filled + remaining must equal original quantity"
        );
        assert!(order.filled >= Decimal::ZERO);
        assert!(order.remaining >= Decimal::ZERO);
    }
}

/// No trade may violate its taker's limit: a buy never pays above its
/// limit, a sell never receives below it.
fn assert_cross_condition(results: &[SubmitResult]) {
    for result in results {
        if result.order.kind == OrderKind::Market {
            continue;
        }
        let Some(limit) = result.order.price else {
            continue;
        };
        for trade in &result.trades {
            match result.order.side {
                Side::Buy => assert!(
                    trade.price <= limit,
                    "buy taker filled above its limit: {} > {}",
                    trade.price,
                    limit
                ),
                Side::Sell => assert!(
                    trade.price >= limit,
                    "sell taker filled below its limit: {} < {}",
                    trade.price,
                    limit
                ),
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// For any (seed, num_requests) in range: the book's aggregates are
    /// consistent after every submission, and fill accounting and price
    /// limits hold over the whole run.
    #[test]
    fn prop_invariants_hold_after_replay(seed in 0u64..100_000u64, num_requests in 10usize..150usize) {
        let engine = MatchingEngine::new();
        let requests = flow(seed, num_requests).all_requests();

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(engine.submit(request).unwrap());
            assert_aggregates_consistent(&engine);
        }
        assert_fill_conservation(&engine, &results);
        assert_cross_condition(&results);
    }

    /// Cancelling every resting order leaves the book empty and the
    /// aggregates consistent at each step.
    #[test]
    fn prop_cancel_drains_the_book(seed in 0u64..100_000u64, num_requests in 10usize..80usize) {
        let engine = MatchingEngine::new();
        let requests = flow(seed, num_requests).all_requests();
        replay(&engine, requests).unwrap();

        for order in engine.resting_orders(SYMBOL).unwrap() {
            engine.cancel(order.id).unwrap();
            assert_aggregates_consistent(&engine);
        }
        let snapshot = engine.snapshot(SYMBOL).unwrap();
        assert!(snapshot.bids.is_empty());
        assert!(snapshot.asks.is_empty());
    }
}

/// Submit-then-cancel of a non-crossing limit order restores the book's
/// level populations exactly.
#[test]
fn cancel_restores_pre_submit_book() {
    let engine = MatchingEngine::new();
    let requests = flow(77, 60).all_requests();
    replay(&engine, requests).unwrap();

    let before = engine.snapshot(SYMBOL).unwrap();
    let best_ask = engine.best_ask(SYMBOL).unwrap();

    // A buy strictly below the best ask cannot cross.
    let price = best_ask.map_or(Decimal::from(50), |p| p - Decimal::from(10));
    let probe = engine
        .submit(matchbook::OrderRequest::limit(
            "probe",
            SYMBOL,
            Side::Buy,
            price,
            Decimal::from(3),
        ))
        .unwrap();
    assert!(probe.trades.is_empty());

    engine.cancel(probe.order.id).unwrap();
    let after = engine.snapshot(SYMBOL).unwrap();
    assert_eq!(before.bids, after.bids);
    assert_eq!(before.asks, after.asks);
    assert_eq!(
        engine.get_order(probe.order.id).unwrap().status,
        matchbook::OrderStatus::Cancelled
    );
}

/// Deterministic replay: same flow, same trade count, same traded quantity,
/// same final book shape.
#[test]
fn deterministic_replay_same_seed_same_outcome() {
    let run = |seed: u64| {
        let engine = MatchingEngine::new();
        let results = replay(&engine, flow(seed, 120).all_requests()).unwrap();
        let trades: usize = results.iter().map(|r| r.trades.len()).sum();
        let quantity: Decimal = results
            .iter()
            .flat_map(|r| r.trades.iter().map(|t| t.quantity))
            .sum();
        let snapshot = engine.snapshot(SYMBOL).unwrap();
        (trades, quantity, snapshot.bids, snapshot.asks)
    };

    let first = run(999);
    let second = run(999);
    assert_eq!(first, second, "same seed must reproduce the same outcome");
}

/// A rejected market order leaves no trace on the book but keeps its
/// partial executions.
#[test]
fn market_residual_rejection_is_observable() {
    let engine = MatchingEngine::new();
    engine
        .submit(matchbook::OrderRequest::limit(
            "maker",
            SYMBOL,
            Side::Sell,
            Decimal::from(100),
            Decimal::from(10),
        ))
        .unwrap();

    let market = engine
        .submit(matchbook::OrderRequest::market(
            "taker",
            SYMBOL,
            Side::Buy,
            Decimal::from(25),
        ))
        .unwrap();

    assert_eq!(market.trades.len(), 1);
    assert!(market.is_rejected());
    assert_aggregates_consistent(&engine);

    // The rejected order is terminal: cancelling it reports as much.
    let err = engine.cancel(market.order.id).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyTerminal { .. }));
}
