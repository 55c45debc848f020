//! Deterministic synthetic order flow.
//!
//! Seeded request stream for replay tests, concurrency tests, and load
//! benchmarks. Same config (including seed) produces the same sequence of
//! requests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::engine::MatchingEngine;
use crate::error::EngineError;
use crate::types::{OrderKind, OrderRequest, Side, SubmitResult};

/// Configuration for the synthetic request generator. Ranges are inclusive.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// RNG seed. Same seed, same request stream.
    pub seed: u64,
    /// Symbol stamped on every generated request.
    pub symbol: String,
    /// Number of requests produced by [`OrderFlow::all_requests`].
    pub num_requests: usize,
    /// Probability of Buy (0.0..=1.0); Sell otherwise.
    pub buy_ratio: f64,
    /// Probability of a limit order, then of a market order; the remainder
    /// are stop orders. The two should sum to at most 1.0.
    pub limit_ratio: f64,
    pub market_ratio: f64,
    /// Price range for limit and stop orders. Ignored for market.
    pub price_min: i64,
    pub price_max: i64,
    /// Quantity range, whole units.
    pub quantity_min: u64,
    pub quantity_max: u64,
    /// Number of distinct owner ids (owner-1..=owner-N).
    pub num_owners: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            symbol: "BTC/USD".to_string(),
            num_requests: 1000,
            buy_ratio: 0.5,
            limit_ratio: 0.85,
            market_ratio: 0.1,
            price_min: 95,
            price_max: 105,
            quantity_min: 1,
            quantity_max: 100,
            num_owners: 5,
        }
    }
}

/// Deterministic request stream. Create with [`OrderFlow::new`], then pull
/// requests.
pub struct OrderFlow {
    rng: StdRng,
    config: FlowConfig,
}

impl OrderFlow {
    pub fn new(config: FlowConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { rng, config }
    }

    /// Generates the next request, advancing the RNG.
    pub fn next_request(&mut self) -> OrderRequest {
        let side = if self.rng.gen::<f64>() < self.config.buy_ratio {
            Side::Buy
        } else {
            Side::Sell
        };
        let kind_roll = self.rng.gen::<f64>();
        let kind = if kind_roll < self.config.limit_ratio {
            OrderKind::Limit
        } else if kind_roll < self.config.limit_ratio + self.config.market_ratio {
            OrderKind::Market
        } else {
            OrderKind::Stop
        };
        let quantity = Decimal::from(
            self.rng
                .gen_range(self.config.quantity_min..=self.config.quantity_max),
        );
        let price = match kind {
            OrderKind::Market => None,
            OrderKind::Limit | OrderKind::Stop => Some(Decimal::from(
                self.rng
                    .gen_range(self.config.price_min..=self.config.price_max),
            )),
        };
        let owner = format!(
            "owner-{}",
            self.rng.gen_range(1..=self.config.num_owners.max(1))
        );
        OrderRequest {
            id: None,
            owner_id: owner,
            symbol: self.config.symbol.clone(),
            side,
            kind,
            price,
            quantity,
        }
    }

    /// Returns exactly `n` requests, advancing the generator.
    pub fn take_requests(&mut self, n: usize) -> Vec<OrderRequest> {
        (0..n).map(|_| self.next_request()).collect()
    }

    /// Returns the full stream as sized by `config.num_requests`.
    pub fn all_requests(&mut self) -> Vec<OrderRequest> {
        self.take_requests(self.config.num_requests)
    }
}

/// Replays requests into the engine, collecting every submit outcome.
/// Stops at the first validation error (generated flow never produces one).
pub fn replay(
    engine: &MatchingEngine,
    requests: impl IntoIterator<Item = OrderRequest>,
) -> Result<Vec<SubmitResult>, EngineError> {
    let mut results = Vec::new();
    for request in requests {
        results.push(engine.submit(request)?);
    }
    Ok(results)
}
