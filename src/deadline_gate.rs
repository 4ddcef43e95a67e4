//! Deadline gate: decides whether a gated action is currently permitted
//!
//! Deadlines are evaluated lazily at the moment of the gated action; there
//! is no timer. If no deadline exists for a restriction the action is
//! unrestricted. Otherwise the action is permitted only strictly before
//! the earliest not-yet-passed due instant; once that instant passes,
//! permission is revoked and never re-opens. All comparisons are in UTC.

use crate::assignment::{Deadline, DeadlineRestriction};
use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};

/// Whether the action gated by `restriction` is permitted at `now`
pub fn is_permitted(
    deadlines: &[Deadline],
    restriction: DeadlineRestriction,
    now: DateTime<Utc>,
) -> bool {
    let mut relevant = deadlines
        .iter()
        .filter(|d| d.restriction == restriction)
        .peekable();

    if relevant.peek().is_none() {
        return true;
    }
    relevant.min_by_key(|d| d.due_at).is_some_and(|earliest| !earliest.has_passed(now))
}

/// Gate an action, failing with the terminal [`DomainError::DeadlineExpired`]
pub fn check_permitted(
    deadlines: &[Deadline],
    restriction: DeadlineRestriction,
    now: DateTime<Utc>,
) -> DomainResult<()> {
    if is_permitted(deadlines, restriction, now) {
        Ok(())
    } else {
        Err(DomainError::DeadlineExpired {
            restriction: restriction.name().to_string(),
        })
    }
}
