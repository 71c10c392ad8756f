use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BacktestError;
use crate::market::candle::PriceSeries;

/// Signed position decisions over time.
///
/// Positive is long, negative short, zero flat; the magnitude is the number
/// of units held. The series may be sparse relative to the price index: the
/// engine reindexes it onto the price axis and treats absent timestamps as
/// flat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSeries {
    points: Vec<(DateTime<Utc>, f64)>,
}

impl PositionSeries {
    pub fn new(points: Vec<(DateTime<Utc>, f64)>) -> Self {
        Self { points }
    }

    /// Builds a series aligned 1:1 with a price series, one decision per bar.
    pub fn aligned(prices: &PriceSeries, positions: Vec<f64>) -> Result<Self, BacktestError> {
        if positions.len() != prices.len() {
            return Err(BacktestError::Data(format!(
                "expected {} positions for {} bars, got {}",
                prices.len(),
                prices.len(),
                positions.len()
            )));
        }
        let points = prices
            .candles()
            .iter()
            .map(|c| c.ts)
            .zip(positions)
            .collect();
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(DateTime<Utc>, f64)] {
        &self.points
    }
}

/// The strategy seam.
///
/// Anything that can turn price history into position decisions plugs in
/// here; strategy variants are configurations behind one implementation of
/// this trait, not separate engine integrations. The core validates only
/// the output shape, never the signal logic.
pub trait SignalSource {
    fn generate_signals(&self, prices: &PriceSeries) -> Result<PositionSeries, BacktestError>;
}
