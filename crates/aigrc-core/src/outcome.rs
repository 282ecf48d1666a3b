//! Per-event and per-batch outcome types shared by the store, the HTTP
//! handlers, and the producer client.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-event outcome of a store or batch operation. A single discriminant
/// (`status`) rather than a struct of optional fields, per the
/// discriminated-union guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EventOutcome {
    Created {
        id: String,
        #[serde(rename = "receivedAt")]
        received_at: DateTime<Utc>,
    },
    Duplicate {
        id: String,
        #[serde(rename = "receivedAt")]
        received_at: DateTime<Utc>,
    },
    Rejected {
        id: String,
        error: ValidationError,
    },
}

impl EventOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Created { id, .. } | Self::Duplicate { id, .. } | Self::Rejected { id, .. } => id,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Aggregate response for a batch submission (and for a buffer flush that
/// merges several underlying calls into one).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchResponse {
    pub accepted: usize,
    pub rejected: usize,
    pub duplicate: usize,
    pub results: Vec<EventOutcome>,
}

impl BatchResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends one outcome, keeping the aggregate counters consistent — the
    /// invariant `accepted + rejected + duplicate == results.len()` holds
    /// after every push.
    pub fn push(&mut self, outcome: EventOutcome) {
        match &outcome {
            EventOutcome::Created { .. } => self.accepted += 1,
            EventOutcome::Duplicate { .. } => self.duplicate += 1,
            EventOutcome::Rejected { .. } => self.rejected += 1,
        }
        self.results.push(outcome);
    }

    /// Merges another batch response's results in, preserving relative order.
    pub fn extend(&mut self, other: BatchResponse) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.duplicate += other.duplicate;
        self.results.extend(other.results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_stay_consistent_with_results_len() {
        let mut batch = BatchResponse::empty();
        batch.push(EventOutcome::Created {
            id: "evt_1".into(),
            received_at: Utc::now(),
        });
        batch.push(EventOutcome::Rejected {
            id: "evt_2".into(),
            error: ValidationError::new(crate::error::EventErrorCode::EvtOrgMismatch, "mismatch"),
        });
        assert_eq!(batch.results.len(), batch.accepted + batch.rejected + batch.duplicate);
    }

    #[test]
    fn extend_preserves_order_and_sums_counters() {
        let mut a = BatchResponse::empty();
        a.push(EventOutcome::Created {
            id: "evt_1".into(),
            received_at: Utc::now(),
        });
        let mut b = BatchResponse::empty();
        b.push(EventOutcome::Duplicate {
            id: "evt_2".into(),
            received_at: Utc::now(),
        });
        a.extend(b);
        assert_eq!(a.results.len(), 2);
        assert_eq!(a.results[0].id(), "evt_1");
        assert_eq!(a.results[1].id(), "evt_2");
        assert_eq!(a.accepted, 1);
        assert_eq!(a.duplicate, 1);
    }
}
