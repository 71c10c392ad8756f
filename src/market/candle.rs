use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// Single OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Builds a bar from a millisecond epoch timestamp, the format market
    /// data feeds usually deliver. Returns `None` for out-of-range values.
    pub fn from_millis(
        ts: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Option<Self> {
        let ts = DateTime::from_timestamp_millis(ts)?;
        Some(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Time-ordered price history.
///
/// Construction validates the invariants the engine relies on; the series is
/// read-only afterwards. The data-loading collaborator owns the raw bars,
/// this type is the boundary where their shape is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// Validates and wraps a candle vector.
    ///
    /// Fails with [`BacktestError::Data`] when the vector is empty, when
    /// timestamps are not strictly increasing (duplicates included), or when
    /// any close is non-finite.
    pub fn new(candles: Vec<Candle>) -> Result<Self, BacktestError> {
        if candles.is_empty() {
            return Err(BacktestError::Data("price series is empty".to_string()));
        }
        for pair in candles.windows(2) {
            if pair[1].ts <= pair[0].ts {
                return Err(BacktestError::Data(format!(
                    "timestamps must be strictly increasing: {} then {}",
                    pair[0].ts, pair[1].ts
                )));
            }
        }
        if let Some(bad) = candles.iter().find(|c| !c.close.is_finite()) {
            return Err(BacktestError::Data(format!("non-finite close at {}", bad.ts)));
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Always `false`: construction rejects empty series.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.candles.iter().map(|c| c.ts).collect()
    }
}
