use serde::{Deserialize, Serialize};

use crate::analysis::{max_drawdown, mean, population_std};
use crate::backtest::result::BacktestResult;
use crate::error::BacktestError;

/// Risk-side statistics complementing the canonical metrics set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Annualized standard deviation of strategy returns, as a fraction.
    pub annual_volatility: f64,

    /// Historical 95% value-at-risk: the 5th-percentile per-period return.
    /// Non-positive for any run with losing periods.
    pub value_at_risk: f64,

    /// Sharpe variant that penalizes only downside deviation; 0 when the
    /// run has no losing periods.
    pub sortino_ratio: f64,

    /// Annual return over absolute max drawdown; 0 for a drawdown-free run.
    pub calmar_ratio: f64,
}

pub struct RiskAnalyzer<'a> {
    result: &'a BacktestResult,
}

impl<'a> RiskAnalyzer<'a> {
    pub fn new(result: &'a BacktestResult) -> Self {
        Self { result }
    }

    pub fn analyze(&self) -> Result<RiskReport, BacktestError> {
        let r = self.result;
        if r.len() < 2 {
            return Err(BacktestError::InsufficientData(format!(
                "{} rows, need at least 2",
                r.len()
            )));
        }

        let returns = r.strategy_return();
        let equity = r.equity();
        let ppy = r.periods_per_year();

        let annual_volatility = population_std(returns) * ppy.sqrt();
        let value_at_risk = percentile(returns, 0.05);

        let downside_sq = returns
            .iter()
            .map(|&x| if x < 0.0 { x * x } else { 0.0 })
            .sum::<f64>()
            / returns.len() as f64;
        let downside = downside_sq.sqrt();
        let sortino_ratio = if downside == 0.0 {
            0.0
        } else {
            ppy.sqrt() * mean(returns) / downside
        };

        let initial = equity[0];
        let total_return = if initial > 0.0 {
            equity[equity.len() - 1] / initial - 1.0
        } else {
            0.0
        };
        let years = r.len() as f64 / ppy;
        let annual_return = if years > 0.0 { total_return / years } else { 0.0 };
        let dd = max_drawdown(equity);
        let calmar_ratio = if dd == 0.0 { 0.0 } else { annual_return / dd.abs() };

        Ok(RiskReport {
            annual_volatility,
            value_at_risk,
            sortino_ratio,
            calmar_ratio,
        })
    }
}

/// Empirical quantile with linear interpolation between order statistics.
fn percentile(data: &[f64], q: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}
