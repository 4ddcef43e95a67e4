//! Assignments, deadlines and course enrollment
//!
//! An assignment is a course-level unit of work students can form projects
//! under. It owns the deadlines gating project creation and application
//! submission, and carries the default team size new projects start from.

use crate::entity::{AssignmentId, CourseId, DeadlineId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course-level unit of work students can form projects under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The assignment's identity
    pub id: AssignmentId,
    /// The course this assignment belongs to
    pub course_id: CourseId,
    /// Display name
    pub name: String,
    /// Team size new projects start from
    pub default_team_size: usize,
}

impl Assignment {
    /// Create a new assignment under a course
    pub fn new(course_id: CourseId, name: impl Into<String>, default_team_size: usize) -> Self {
        Self {
            id: AssignmentId::new(),
            course_id,
            name: name.into(),
            default_team_size,
        }
    }
}

/// Which action a deadline gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadlineRestriction {
    /// Creating a new project under the assignment
    ProjectCreation,
    /// Submitting an application to a published project
    ApplicationSubmission,
}

impl DeadlineRestriction {
    /// Name used in error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            DeadlineRestriction::ProjectCreation => "ProjectCreation",
            DeadlineRestriction::ApplicationSubmission => "ApplicationSubmission",
        }
    }
}

/// A named cutoff gating a specific action for an assignment
///
/// The due instant is normalized to UTC at construction; the original IANA
/// zone name is retained only for display. All gate comparisons happen in
/// UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    /// The deadline's identity
    pub id: DeadlineId,
    /// The assignment this deadline belongs to
    pub assignment_id: AssignmentId,
    /// The action this deadline gates
    pub restriction: DeadlineRestriction,
    /// Due instant, in UTC
    pub due_at: DateTime<Utc>,
    /// IANA time zone name the deadline was entered in, for display
    pub time_zone: String,
}

impl Deadline {
    /// Create a deadline for an assignment
    pub fn new(
        assignment_id: AssignmentId,
        restriction: DeadlineRestriction,
        due_at: DateTime<Utc>,
        time_zone: impl Into<String>,
    ) -> Self {
        Self {
            id: DeadlineId::new(),
            assignment_id,
            restriction,
            due_at,
            time_zone: time_zone.into(),
        }
    }

    /// Whether this deadline's due instant has passed at `now`
    pub fn has_passed(&self, now: DateTime<Utc>) -> bool {
        now >= self.due_at
    }
}

/// Roster membership: a user enrolled in a course
///
/// Used only to bound "total students" for dashboard counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// The course enrolled in
    pub course_id: CourseId,
    /// The enrolled user
    pub user_id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn deadline_passes_exactly_at_due_instant() {
        let assignment = Assignment::new(CourseId::new(), "Lab 1", 4);
        let due = Utc::now();
        let deadline = Deadline::new(
            assignment.id,
            DeadlineRestriction::ApplicationSubmission,
            due,
            "Europe/Amsterdam",
        );

        assert!(!deadline.has_passed(due - Duration::seconds(1)));
        assert!(deadline.has_passed(due));
        assert!(deadline.has_passed(due + Duration::seconds(1)));
    }

    #[test]
    fn restriction_names() {
        assert_eq!(DeadlineRestriction::ProjectCreation.name(), "ProjectCreation");
        assert_eq!(
            DeadlineRestriction::ApplicationSubmission.name(),
            "ApplicationSubmission"
        );
    }
}
