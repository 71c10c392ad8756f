use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::trades::{self, DetailedReport};
use crate::analysis::{max_drawdown, mean, population_std};
use crate::backtest::result::BacktestResult;
use crate::error::BacktestError;

/// Canonical risk/return statistics for one backtest run.
///
/// Ratios are kept in natural units (fractions); percent scaling happens in
/// [`MetricsReport::formatted`] so intermediate values stay composable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub initial_capital: f64,
    pub final_equity: f64,

    /// Fractional change of equity over the run; -0.10 means -10%.
    pub total_return: f64,

    /// Total return averaged per year of observations.
    pub annual_return: f64,

    /// `sqrt(periods_per_year) * mean(returns) / std(returns)`; 0 on a
    /// zero-variance series rather than NaN or infinity.
    pub sharpe_ratio: f64,

    /// Worst decline from the running equity peak, in [-1, 0].
    pub max_drawdown: f64,

    /// Share of nonzero-return periods that were profitable.
    pub win_rate: f64,

    /// Count of bars with a nonzero position change.
    pub total_trades: usize,

    /// Summed gains over absolute summed losses. `None` when the run has no
    /// losing periods but does have gains: the ratio is undefined, and the
    /// sentinel keeps infinities out of downstream arithmetic.
    pub profit_factor: Option<f64>,

    /// Annualized standard deviation of per-period strategy returns.
    pub daily_volatility: f64,
}

impl MetricsReport {
    /// All-zero report for display-only fallbacks.
    ///
    /// The analyzer never substitutes this internally; callers on rendering
    /// paths may, after catching the typed failure.
    pub fn zeroed(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            final_equity: initial_capital,
            total_return: 0.0,
            annual_return: 0.0,
            sharpe_ratio: 0.0,
            max_drawdown: 0.0,
            win_rate: 0.0,
            total_trades: 0,
            profit_factor: Some(0.0),
            daily_volatility: 0.0,
        }
    }

    /// Renders the report as `(metric name, formatted value)` pairs in
    /// presentation order. A thin wrapper: the numeric fields remain the
    /// computational contract.
    pub fn formatted(&self) -> Vec<(String, String)> {
        let profit_factor = match self.profit_factor {
            Some(pf) => format!("{:.2}", pf),
            None => "inf".to_string(),
        };
        [
            ("Initial Capital", format_dollars(self.initial_capital)),
            ("Final Capital", format_dollars(self.final_equity)),
            ("Total Return", format_percent(self.total_return)),
            ("Annual Return", format_percent(self.annual_return)),
            ("Sharpe Ratio", format!("{:.2}", self.sharpe_ratio)),
            ("Max Drawdown", format_percent(self.max_drawdown)),
            ("Win Rate", format_percent(self.win_rate)),
            ("Total Trades", self.total_trades.to_string()),
            ("Profit Factor", profit_factor),
            ("Daily Volatility", format_percent(self.daily_volatility)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Derives reports from a finished backtest run. Stateless and read-only:
/// the result table is never mutated.
pub struct PerformanceAnalyzer<'a> {
    result: &'a BacktestResult,
}

impl<'a> PerformanceAnalyzer<'a> {
    pub fn new(result: &'a BacktestResult) -> Self {
        Self { result }
    }

    /// Computes the canonical metrics set.
    ///
    /// Fails with [`BacktestError::InsufficientData`] below two rows; most
    /// of the ratios need a prior period.
    pub fn analyze(&self) -> Result<MetricsReport, BacktestError> {
        let r = self.result;
        if r.len() < 2 {
            return Err(BacktestError::InsufficientData(format!(
                "{} rows, need at least 2",
                r.len()
            )));
        }

        let equity = r.equity();
        let returns = r.strategy_return();
        let ppy = r.periods_per_year();

        let initial = equity[0];
        let final_equity = equity[equity.len() - 1];
        let total_return = if initial > 0.0 {
            final_equity / initial - 1.0
        } else {
            0.0
        };

        let years = r.len() as f64 / ppy;
        let annual_return = if years > 0.0 { total_return / years } else { 0.0 };

        let std = population_std(returns);
        let sharpe_ratio = if std == 0.0 {
            0.0
        } else {
            ppy.sqrt() * mean(returns) / std
        };

        let winners = returns.iter().filter(|&&x| x > 0.0).count();
        let active = returns.iter().filter(|&&x| x != 0.0).count();
        let win_rate = if active == 0 {
            0.0
        } else {
            winners as f64 / active as f64
        };

        let total_trades = r.trade_flag().iter().filter(|&&x| x != 0.0).count();

        let gains: f64 = returns.iter().filter(|&&x| x > 0.0).sum();
        let losses = returns.iter().filter(|&&x| x < 0.0).sum::<f64>().abs();
        let profit_factor = if losses > 0.0 {
            Some(gains / losses)
        } else if gains > 0.0 {
            None
        } else {
            Some(0.0)
        };

        let report = MetricsReport {
            initial_capital: r.initial_capital(),
            final_equity,
            total_return,
            annual_return,
            sharpe_ratio,
            max_drawdown: max_drawdown(equity),
            win_rate,
            total_trades,
            profit_factor,
            daily_volatility: std * ppy.sqrt(),
        };
        debug!(
            total_return = report.total_return,
            sharpe_ratio = report.sharpe_ratio,
            total_trades = report.total_trades,
            "performance analysis complete"
        );
        Ok(report)
    }

    /// Trade-level breakdown; see [`crate::analysis::trades`].
    pub fn detailed_analysis(&self) -> Result<DetailedReport, BacktestError> {
        trades::extract(self.result)
    }
}

fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// `$1,234,567.89` style, thousands-separated with two decimals.
fn format_dollars(value: f64) -> String {
    let abs = value.abs();
    let mut whole = abs.trunc() as u64;
    let mut cents = ((abs - abs.trunc()) * 100.0).round() as u64;
    if cents == 100 {
        whole += 1;
        cents = 0;
    }

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents)
}
