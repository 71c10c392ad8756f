//! Vectorized backtesting and performance analytics.
//!
//! The crate turns a price series plus a signal-driven position series into
//! per-period strategy returns net of transaction costs, a compounded equity
//! curve, and a standard set of risk/return statistics.
//!
//! Data flows one way: a [`SignalSource`] produces a [`PositionSeries`], the
//! [`BacktestEngine`] aligns it with a [`PriceSeries`] and produces an
//! immutable [`BacktestResult`], and the analyzers in [`analysis`] derive
//! reports from that result. No component mutates its inputs, and no run
//! shares state with another, so parameter sweeps can fan out `run` calls
//! across threads freely.

pub mod analysis;
pub mod backtest;
pub mod config;
pub mod error;
pub mod logging;
pub mod market;
pub mod signal;

pub use analysis::performance::{MetricsReport, PerformanceAnalyzer};
pub use analysis::risk::{RiskAnalyzer, RiskReport};
pub use analysis::trades::{ClosedTrade, DetailedReport, OpenTrade};
pub use backtest::engine::BacktestEngine;
pub use backtest::result::BacktestResult;
pub use config::BacktestConfig;
pub use error::BacktestError;
pub use market::candle::{Candle, PriceSeries};
pub use signal::{PositionSeries, SignalSource};
