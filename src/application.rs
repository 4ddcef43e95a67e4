//! Applications: requests by an individual to join a project
//!
//! An application belongs to exactly one project. Approval by the product
//! owner only grants the applicant the right to join; membership changes
//! happen in the join operation, never here.

use crate::entity::{AggregateRoot, ApplicationId, ProjectId, UserId};
use crate::state_machine::{State, StateTransitions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review status of an application
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
pub enum ApplicationStatus {
    /// Awaiting the product owner's decision
    Pending,
    /// Approved; the applicant may join until the team fills up
    Approved,
    /// Turned down, either by the owner or by a sibling join
    Rejected,
}

impl State for ApplicationStatus {
    fn name(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl StateTransitions for ApplicationStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use ApplicationStatus::*;

        // The owner may flip an earlier decision; only a repeat of the
        // identical decision is a no-op.
        match self {
            Pending => vec![Approved, Rejected],
            Approved => vec![Rejected],
            Rejected => vec![Approved],
        }
    }
}

/// A request by an individual to join a specific project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// The application's identity
    pub id: ApplicationId,
    /// The project applied to
    pub project_id: ProjectId,
    /// The applicant's identity
    pub applicant: UserId,
    /// Why the applicant wants to join
    pub motivation: String,
    /// Current review status
    pub status: ApplicationStatus,
    /// When the application was submitted
    pub created_at: DateTime<Utc>,
    /// Version for optimistic concurrency
    pub version: u64,
}

impl AggregateRoot for Application {
    type Id = ApplicationId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
    }
}

impl Application {
    /// Create a pending application for a project
    pub fn new(project_id: ProjectId, applicant: UserId, motivation: impl Into<String>) -> Self {
        Self {
            id: ApplicationId::new(),
            project_id,
            applicant,
            motivation: motivation.into(),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            version: 0,
        }
    }

    /// Whether this application still takes part in matching
    ///
    /// Pending and approved applications are actionable; they are the ones
    /// auto-rejected when the applicant joins a different project.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self.status,
            ApplicationStatus::Pending | ApplicationStatus::Approved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::transition;

    #[test]
    fn new_applications_are_pending_and_actionable() {
        let app = Application::new(ProjectId::new(), UserId::new(), "I like Rust");
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert!(app.is_actionable());
    }

    #[test]
    fn rejected_applications_are_not_actionable() {
        let mut app = Application::new(ProjectId::new(), UserId::new(), "");
        app.status = ApplicationStatus::Rejected;
        assert!(!app.is_actionable());
    }

    #[test]
    fn decisions_can_flip_but_not_self_loop() {
        use ApplicationStatus::*;

        assert!(transition(Pending, Approved).is_ok());
        assert!(transition(Pending, Rejected).is_ok());
        assert!(transition(Approved, Rejected).is_ok());
        assert!(transition(Rejected, Approved).is_ok());
        assert!(transition(Approved, Approved).is_err());
    }
}
