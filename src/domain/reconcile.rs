//! Price-history reconciliation policy.
//!
//! Decides whether a new observation is a genuinely new price point or a
//! repeat of an unchanged price. History grows with the number of price
//! changes, not with the polling frequency: once the current record and
//! the most recently superseded one both carry the observed total and
//! currency, further identical readings are folded into the current
//! record.
//!
//! The rule needs *two* prior matching records, so the first repeat of a
//! price still inserts a row and only the third consecutive identical
//! reading collapses.

use chrono::{DateTime, Utc};

use super::listing::ListingId;
use super::price::{PriceObservation, PriceRecord};

/// Classification of an observation against the stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Same total and currency as the last two records.
    Stable,
    /// Anything else, including the first reading ever.
    Change,
}

/// Store mutation needed to absorb one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationAction {
    /// Overwrite the current record in place; no new row.
    UpdateInPlace(PriceRecord),
    /// Flip the current record (if any) to superseded and insert this one
    /// as the new current record.
    SupersedeAndInsert(PriceRecord),
}

impl ReconciliationAction {
    pub const fn record(&self) -> &PriceRecord {
        match self {
            Self::UpdateInPlace(record) | Self::SupersedeAndInsert(record) => record,
        }
    }

    /// Label used in logs and metrics.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::UpdateInPlace(_) => "refreshed",
            Self::SupersedeAndInsert(_) => "inserted",
        }
    }
}

/// Classify an observation given the current and latest superseded records.
pub fn classify(
    current: Option<&PriceRecord>,
    previous: Option<&PriceRecord>,
    observation: &PriceObservation,
) -> Classification {
    let (Some(current), Some(previous)) = (current, previous) else {
        return Classification::Change;
    };

    let total = observation.total();
    let stable = current.total == previous.total
        && previous.total == total
        && current.currency == previous.currency
        && previous.currency == observation.currency;

    if stable {
        Classification::Stable
    } else {
        Classification::Change
    }
}

/// Decide the store mutation for an observation.
pub fn reconcile(
    listing_id: ListingId,
    current: Option<&PriceRecord>,
    previous: Option<&PriceRecord>,
    observation: &PriceObservation,
    observed_at: DateTime<Utc>,
) -> ReconciliationAction {
    match (classify(current, previous, observation), current) {
        (Classification::Stable, Some(current)) => {
            let mut refreshed = current.clone();
            refreshed.refresh_from(observation, observed_at);
            ReconciliationAction::UpdateInPlace(refreshed)
        }
        _ => ReconciliationAction::SupersedeAndInsert(PriceRecord::from_observation(
            listing_id,
            observation,
            observed_at,
        )),
    }
}
