use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output table of a single backtest run, indexed by timestamp.
///
/// All derived columns are computed exactly once by
/// [`BacktestEngine::run`](crate::backtest::engine::BacktestEngine::run);
/// the table has no mutating accessors and is treated as an immutable value
/// from then on. Analyzers only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub(crate) timestamps: Vec<DateTime<Utc>>,
    pub(crate) position: Vec<f64>,
    pub(crate) price: Vec<f64>,
    pub(crate) returns: Vec<f64>,
    pub(crate) trade_flag: Vec<f64>,
    pub(crate) transaction_cost: Vec<f64>,
    pub(crate) strategy_return: Vec<f64>,
    pub(crate) equity: Vec<f64>,
    pub(crate) initial_capital: f64,
    pub(crate) periods_per_year: f64,
}

impl BacktestResult {
    /// Number of rows (bars).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Position after reindexing onto the price axis; gaps are flat.
    pub fn position(&self) -> &[f64] {
        &self.position
    }

    /// Reference close price per bar.
    pub fn price(&self) -> &[f64] {
        &self.price
    }

    /// Simple period-over-period price change; the first value is 0.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Absolute position change per bar; nonzero means a trade happened
    /// there. Opening the very first position counts.
    pub fn trade_flag(&self) -> &[f64] {
        &self.trade_flag
    }

    /// `trade_flag * cost_rate`, charged on the bar of the change.
    pub fn transaction_cost(&self) -> &[f64] {
        &self.transaction_cost
    }

    /// Per-period return earned by the previous bar's position, net of
    /// transaction costs.
    pub fn strategy_return(&self) -> &[f64] {
        &self.strategy_return
    }

    /// Account value compounded from the initial capital:
    /// `equity[t] = initial_capital * prod(1 + strategy_return[0..=t])`.
    pub fn equity(&self) -> &[f64] {
        &self.equity
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Annualization factor the run was configured with; the analyzers use
    /// it so a result carries everything needed to interpret it.
    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
    }
}
