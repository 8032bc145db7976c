// =============================================================================
// Shared types used across the Gold Pulse service
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily gold fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Reasons a raw price list cannot become a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceSeriesError {
    #[error("price at {date} must be finite and positive, got {price}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("dates must be strictly increasing: {previous} is followed by {next}")]
    OutOfOrder { previous: NaiveDate, next: NaiveDate },
}

/// Date-ascending price history with no duplicate dates and only positive,
/// finite prices. Immutable once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate and wrap `points`.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, PriceSeriesError> {
        for p in &points {
            if !p.price.is_finite() || p.price <= 0.0 {
                return Err(PriceSeriesError::InvalidPrice {
                    date: p.date,
                    price: p.price,
                });
            }
        }
        for w in points.windows(2) {
            if w[1].date <= w[0].date {
                return Err(PriceSeriesError::OutOfOrder {
                    previous: w[0].date,
                    next: w[1].date,
                });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Price column, index-aligned with [`dates`](Self::dates).
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Keep only the points dated within the last `days` days of the
    /// series (inclusive of the most recent date).
    pub fn last_days(&self, days: u32) -> Self {
        let Some(latest) = self.points.last().map(|p| p.date) else {
            return Self::default();
        };
        let cutoff = latest - chrono::Duration::days(i64::from(days.saturating_sub(1)));
        let start = self.points.partition_point(|p| p.date < cutoff);
        Self {
            points: self.points[start..].to_vec(),
        }
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = PriceSeriesError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

/// Dashboard colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}
