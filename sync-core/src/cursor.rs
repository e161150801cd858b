//! Event cursor for the syncwatch model.
//!
//! This module tracks the id of the last event the model accepted and decides
//! whether the next event may be applied:
//! - Recording the last applied id (the "positions seen", not "understood")
//! - Rejecting stale or repeated ids
//! - Optionally detecting gaps (missed events) in the sequence
//!
//! Event ids are assigned by the daemon and strictly increase within one
//! daemon session. A violation means a batch was lost or the daemon
//! restarted, and the only safe recovery is a full resync.

use serde::{Deserialize, Serialize};
use syncwatch_types::EventId;
use thiserror::Error;

/// How strictly consecutive event ids must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPolicy {
    /// Each id must be greater than the last applied one.
    #[default]
    Monotonic,
    /// Each id must be exactly the last applied one plus one.
    ///
    /// The first event after a reset may carry any id.
    Contiguous,
}

/// Why an event was refused by the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderingViolation {
    /// The id is not after the last applied id.
    #[error("event {got} is not after last applied event {last}")]
    Stale {
        /// Last applied id.
        last: EventId,
        /// Offending id.
        got: EventId,
    },
    /// One or more ids were skipped.
    #[error("missed events: expected {expected}, got {got}")]
    Gap {
        /// The id that should have come next.
        expected: EventId,
        /// Offending id.
        got: EventId,
    },
}

/// Tracks the last applied event id.
///
/// `None` is the initial sentinel: it sits below every legal id.
#[derive(Debug, Clone)]
pub struct EventCursor {
    last: Option<EventId>,
    policy: OrderingPolicy,
}

impl EventCursor {
    /// Create a cursor at the sentinel.
    pub fn new(policy: OrderingPolicy) -> Self {
        Self { last: None, policy }
    }

    /// The last applied id, or `None` at the sentinel.
    pub fn last(&self) -> Option<EventId> {
        self.last
    }

    /// Whether no event has been applied since creation or reset.
    pub fn is_initial(&self) -> bool {
        self.last.is_none()
    }

    /// Check whether `id` may be applied next, without moving the cursor.
    pub fn check(&self, id: EventId) -> Result<(), OrderingViolation> {
        let Some(last) = self.last else {
            return Ok(());
        };
        if id <= last {
            return Err(OrderingViolation::Stale { last, got: id });
        }
        if self.policy == OrderingPolicy::Contiguous && id != last.next() {
            return Err(OrderingViolation::Gap {
                expected: last.next(),
                got: id,
            });
        }
        Ok(())
    }

    /// Move the cursor to `id` if it may be applied next.
    ///
    /// On error the cursor is left where it was.
    pub fn advance(&mut self, id: EventId) -> Result<(), OrderingViolation> {
        self.check(id)?;
        self.last = Some(id);
        Ok(())
    }

    /// Return the cursor to the sentinel.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for EventCursor {
    fn default() -> Self {
        Self::new(OrderingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: u64) -> EventId {
        EventId::new(value)
    }

    #[test]
    fn cursor_starts_at_sentinel() {
        let cursor = EventCursor::default();
        assert!(cursor.is_initial());
        assert_eq!(cursor.last(), None);
    }

    #[test]
    fn first_event_may_have_any_id() {
        let mut cursor = EventCursor::new(OrderingPolicy::Contiguous);
        assert!(cursor.advance(id(0)).is_ok());

        let mut cursor = EventCursor::new(OrderingPolicy::Contiguous);
        assert!(cursor.advance(id(5000)).is_ok());
        assert_eq!(cursor.last(), Some(id(5000)));
    }

    #[test]
    fn monotonic_accepts_gaps() {
        let mut cursor = EventCursor::new(OrderingPolicy::Monotonic);
        cursor.advance(id(1)).unwrap();
        cursor.advance(id(2)).unwrap();
        cursor.advance(id(10)).unwrap(); // Gap: 3..9 skipped

        assert_eq!(cursor.last(), Some(id(10)));
    }

    #[test]
    fn repeated_id_is_stale() {
        let mut cursor = EventCursor::default();
        cursor.advance(id(2)).unwrap();

        let err = cursor.advance(id(2)).unwrap_err();
        assert_eq!(
            err,
            OrderingViolation::Stale {
                last: id(2),
                got: id(2)
            }
        );
    }

    #[test]
    fn lower_id_is_stale_and_cursor_unchanged() {
        let mut cursor = EventCursor::default();
        cursor.advance(id(7)).unwrap();

        assert!(cursor.advance(id(3)).is_err());
        assert_eq!(cursor.last(), Some(id(7)));
    }

    #[test]
    fn contiguous_detects_gaps() {
        let mut cursor = EventCursor::new(OrderingPolicy::Contiguous);
        cursor.advance(id(1)).unwrap();
        cursor.advance(id(2)).unwrap();

        let err = cursor.advance(id(5)).unwrap_err(); // Gap: 3, 4 missing
        assert_eq!(
            err,
            OrderingViolation::Gap {
                expected: id(3),
                got: id(5)
            }
        );
        assert_eq!(cursor.last(), Some(id(2)));
    }

    #[test]
    fn contiguous_reports_stale_before_gap() {
        let mut cursor = EventCursor::new(OrderingPolicy::Contiguous);
        cursor.advance(id(4)).unwrap();
        assert!(matches!(
            cursor.check(id(1)),
            Err(OrderingViolation::Stale { .. })
        ));
    }

    #[test]
    fn reset_returns_to_sentinel() {
        let mut cursor = EventCursor::default();
        cursor.advance(id(100)).unwrap();

        cursor.reset();

        assert!(cursor.is_initial());
        assert!(cursor.advance(id(1)).is_ok()); // Lower ids are fine again
    }

    #[test]
    fn violation_display() {
        let err = OrderingViolation::Gap {
            expected: id(3),
            got: id(9),
        };
        assert_eq!(err.to_string(), "missed events: expected 3, got 9");
    }

    #[test]
    fn policy_deserializes_lowercase() {
        let policy: OrderingPolicy = serde_json::from_str("\"contiguous\"").unwrap();
        assert_eq!(policy, OrderingPolicy::Contiguous);
    }
}
