use thiserror::Error;

/// Error taxonomy of the backtest core.
///
/// Failures propagate to the caller as typed values. The engine and the
/// analyzers either return a fully populated artifact or one of these
/// variants, never a partially computed table or a silently zero-filled
/// report. Callers that want a non-fatal "no results" rendering catch the
/// variant at their own boundary.
#[derive(Error, Debug)]
pub enum BacktestError {
    /// Malformed or missing input series: empty prices, non-monotonic or
    /// duplicate timestamps, non-finite closes, misaligned positions.
    #[error("data error: {0}")]
    Data(String),

    /// Fewer valid observations than a statistic requires.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
