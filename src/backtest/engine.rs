use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::backtest::result::BacktestResult;
use crate::config::BacktestConfig;
use crate::error::BacktestError;
use crate::market::candle::PriceSeries;
use crate::signal::PositionSeries;

/// Vectorized backtest engine.
///
/// Aligns a position series with a price series and derives the strategy
/// return and equity columns in a single pass. Holds no state between runs
/// and performs no I/O, so independent runs (parameter sweeps) can fan out
/// across threads at the caller's discretion.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Creates an engine, rejecting invalid configuration up front.
    pub fn new(config: BacktestConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Runs the backtest and returns the fully populated result table.
    ///
    /// The position decided on one bar is exposed to the return realized on
    /// the next bar, so a signal can never profit from the move that
    /// produced it. Opening, resizing or flipping a position pays
    /// `cost_rate` per unit of absolute position change on the bar of the
    /// change; the very first bar earns nothing from price movement but
    /// pays the opening cost if a position starts there.
    pub fn run(
        &self,
        prices: &PriceSeries,
        positions: &PositionSeries,
    ) -> Result<BacktestResult, BacktestError> {
        let n = prices.len();
        debug!(bars = n, signals = positions.len(), "starting backtest run");

        let position = reindex_positions(prices, positions);
        let price = prices.closes();
        let timestamps: Vec<DateTime<Utc>> = prices.timestamps();

        let mut returns = vec![0.0; n];
        for t in 1..n {
            returns[t] = price[t] / price[t - 1] - 1.0;
        }

        let mut trade_flag = vec![0.0; n];
        let mut transaction_cost = vec![0.0; n];
        let mut strategy_return = vec![0.0; n];
        let mut equity = vec![0.0; n];
        let mut compounded = self.config.initial_capital;
        for t in 0..n {
            // Position before the series starts is flat.
            let prev_position = if t == 0 { 0.0 } else { position[t - 1] };
            trade_flag[t] = (position[t] - prev_position).abs();
            transaction_cost[t] = trade_flag[t] * self.config.cost_rate;
            let net = prev_position * returns[t] - transaction_cost[t];
            strategy_return[t] = if net.is_finite() { net } else { 0.0 };
            compounded *= 1.0 + strategy_return[t];
            equity[t] = compounded;
        }

        debug!(final_equity = equity[n - 1], "backtest run complete");

        Ok(BacktestResult {
            timestamps,
            position,
            price,
            returns,
            trade_flag,
            transaction_cost,
            strategy_return,
            equity,
            initial_capital: self.config.initial_capital,
            periods_per_year: self.config.periods_per_year,
        })
    }
}

/// Reindexes sparse position decisions onto the price timestamp axis.
///
/// Absent timestamps and non-finite values become flat; decisions whose
/// timestamp does not exist in the price index are dropped.
fn reindex_positions(prices: &PriceSeries, positions: &PositionSeries) -> Vec<f64> {
    let mut by_ts: HashMap<DateTime<Utc>, f64> = HashMap::with_capacity(positions.len());
    let mut non_finite = 0usize;
    for (ts, value) in positions.points() {
        let value = if value.is_finite() {
            *value
        } else {
            non_finite += 1;
            0.0
        };
        by_ts.insert(*ts, value);
    }

    let mut matched = 0usize;
    let out: Vec<f64> = prices
        .candles()
        .iter()
        .map(|c| match by_ts.get(&c.ts) {
            Some(v) => {
                matched += 1;
                *v
            }
            None => 0.0,
        })
        .collect();

    if non_finite > 0 {
        warn!(count = non_finite, "non-finite positions treated as flat");
    }
    let dropped = by_ts.len() - matched;
    if dropped > 0 {
        warn!(count = dropped, "position timestamps absent from price index dropped");
    }
    out
}
