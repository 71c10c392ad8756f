use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Starting account value the equity curve compounds from.
    pub initial_capital: f64,

    /// Cost charged per unit of absolute position change.
    /// 0.0002 = 2 basis points per unit traded.
    pub cost_rate: f64,

    /// Annualization factor for ratio metrics. 252 trading days by
    /// convention; pass bars-per-year for intraday series.
    pub periods_per_year: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            cost_rate: 0.0002,
            periods_per_year: 252.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktestError::Configuration(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !self.cost_rate.is_finite() || self.cost_rate < 0.0 {
            return Err(BacktestError::Configuration(format!(
                "cost_rate must be non-negative, got {}",
                self.cost_rate
            )));
        }
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(BacktestError::Configuration(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            )));
        }
        Ok(())
    }
}
