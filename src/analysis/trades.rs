use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backtest::result::BacktestResult;
use crate::error::BacktestError;

/// A realized trade: a maximal contiguous run of constant nonzero position.
///
/// Entry is the first bar of the run; exit is the bar where the position
/// changes away from the run's value. A sign flip without passing through
/// zero closes the old trade and opens the new one on the same bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub entry_ts: DateTime<Utc>,
    pub exit_ts: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Signed size held for the duration of the run.
    pub position: f64,
    /// `(exit_price - entry_price) * position`.
    pub profit: f64,
    pub bars_held: usize,
}

/// A run still open at the end of the series. Unrealized: excluded from the
/// realized statistics and surfaced separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTrade {
    pub entry_ts: DateTime<Utc>,
    pub entry_price: f64,
    pub position: f64,
    pub bars_held: usize,
}

/// Trade-level breakdown of a backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedReport {
    pub trades: Vec<ClosedTrade>,
    pub open_trade: Option<OpenTrade>,

    /// Realized trades with positive profit. Break-even trades count as
    /// losses.
    pub wins: usize,
    pub losses: usize,

    /// Mean profit of winning trades; 0 when there are none.
    pub avg_win: f64,
    /// Mean absolute loss of losing trades; 0 when there are none.
    pub avg_loss: f64,

    /// Sum of realized profits across all closed trades.
    pub total_profit: f64,
}

/// Walks the position column and groups it into trades.
pub(crate) fn extract(result: &BacktestResult) -> Result<DetailedReport, BacktestError> {
    if result.len() < 2 {
        return Err(BacktestError::InsufficientData(format!(
            "{} rows, need at least 2",
            result.len()
        )));
    }

    let position = result.position();
    let price = result.price();
    let ts = result.timestamps();

    let mut trades = Vec::new();
    // (entry index, run position)
    let mut current: Option<(usize, f64)> = None;

    for (i, &p) in position.iter().enumerate() {
        match current {
            None => {
                if p != 0.0 {
                    current = Some((i, p));
                }
            }
            Some((entry, value)) => {
                if p != value {
                    trades.push(ClosedTrade {
                        entry_ts: ts[entry],
                        exit_ts: ts[i],
                        entry_price: price[entry],
                        exit_price: price[i],
                        position: value,
                        profit: (price[i] - price[entry]) * value,
                        bars_held: i - entry,
                    });
                    current = if p != 0.0 { Some((i, p)) } else { None };
                }
            }
        }
    }

    let open_trade = current.map(|(entry, value)| OpenTrade {
        entry_ts: ts[entry],
        entry_price: price[entry],
        position: value,
        bars_held: result.len() - 1 - entry,
    });

    let win_profits: Vec<f64> = trades
        .iter()
        .map(|t| t.profit)
        .filter(|&p| p > 0.0)
        .collect();
    let loss_profits: Vec<f64> = trades
        .iter()
        .map(|t| t.profit)
        .filter(|&p| p <= 0.0)
        .collect();

    let avg = |v: &[f64]| {
        if v.is_empty() {
            0.0
        } else {
            v.iter().sum::<f64>() / v.len() as f64
        }
    };

    Ok(DetailedReport {
        wins: win_profits.len(),
        losses: loss_profits.len(),
        avg_win: avg(&win_profits),
        avg_loss: avg(&loss_profits).abs(),
        total_profit: trades.iter().map(|t| t.profit).sum(),
        trades,
        open_trade,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::engine::BacktestEngine;
    use crate::config::BacktestConfig;
    use crate::market::candle::{Candle, PriceSeries};
    use crate::signal::PositionSeries;
    use approx::assert_relative_eq;

    fn run(closes: &[f64], positions: Vec<f64>) -> BacktestResult {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::from_millis(i as i64 * 60_000, c, c, c, c, 1.0).unwrap())
            .collect();
        let prices = PriceSeries::new(candles).unwrap();
        let positions = PositionSeries::aligned(&prices, positions).unwrap();
        let engine = BacktestEngine::new(BacktestConfig {
            cost_rate: 0.0,
            ..Default::default()
        })
        .unwrap();
        engine.run(&prices, &positions).unwrap()
    }

    #[test]
    fn closed_run_becomes_one_trade() {
        let result = run(
            &[100.0, 102.0, 104.0, 106.0],
            vec![0.0, 1.0, 1.0, 0.0],
        );
        let report = extract(&result).unwrap();

        assert_eq!(report.trades.len(), 1);
        assert!(report.open_trade.is_none());
        let trade = &report.trades[0];
        assert_eq!(trade.entry_price, 102.0);
        assert_eq!(trade.exit_price, 106.0);
        assert_relative_eq!(trade.profit, 4.0, max_relative = 1e-12);
        assert_eq!(trade.bars_held, 2);
        assert_eq!(report.wins, 1);
        assert_eq!(report.losses, 0);
    }

    #[test]
    fn sign_flip_closes_and_opens_on_same_bar() {
        let result = run(&[100.0, 110.0, 99.0, 99.0], vec![1.0, 1.0, -1.0, 0.0]);
        let report = extract(&result).unwrap();

        assert_eq!(report.trades.len(), 2);
        let long = &report.trades[0];
        assert_eq!(long.position, 1.0);
        assert_eq!(long.exit_price, 99.0);
        assert_relative_eq!(long.profit, -1.0, max_relative = 1e-12);

        let short = &report.trades[1];
        assert_eq!(short.position, -1.0);
        assert_eq!(short.entry_price, 99.0);
        assert_eq!(short.exit_price, 99.0);
        assert_eq!(short.profit, 0.0);
        assert!(report.open_trade.is_none());
    }

    #[test]
    fn run_open_at_series_end_is_unrealized() {
        let result = run(&[100.0, 105.0, 110.0], vec![0.0, 2.0, 2.0]);
        let report = extract(&result).unwrap();

        assert!(report.trades.is_empty());
        let open = report.open_trade.unwrap();
        assert_eq!(open.entry_price, 105.0);
        assert_eq!(open.position, 2.0);
        assert_eq!(open.bars_held, 1);
        assert_eq!(report.total_profit, 0.0);
    }

    #[test]
    fn resize_without_flat_splits_runs() {
        let result = run(&[100.0, 101.0, 102.0, 103.0], vec![1.0, 2.0, 2.0, 0.0]);
        let report = extract(&result).unwrap();

        assert_eq!(report.trades.len(), 2);
        assert_eq!(report.trades[0].position, 1.0);
        assert_eq!(report.trades[0].bars_held, 1);
        assert_eq!(report.trades[1].position, 2.0);
        assert_relative_eq!(report.trades[1].profit, 4.0, max_relative = 1e-12);
    }

    #[test]
    fn too_short_series_is_rejected() {
        let result = run(&[100.0], vec![1.0]);
        assert!(matches!(
            extract(&result),
            Err(BacktestError::InsufficientData(_))
        ));
    }
}
