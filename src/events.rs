//! Domain events and notification side effects
//!
//! Lifecycle operations never talk to the outside world directly: they
//! return the events they produced plus the notifications those events
//! address, and the caller hands them to a [`NotificationSink`].
//! Notification delivery is best-effort by contract; a failing sink must
//! never roll back the lifecycle transaction that produced the event.

use crate::application::ApplicationStatus;
use crate::entity::{ApplicationId, AssignmentId, ProjectId, UserId};
use crate::project::ProjectStatus;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Get the aggregate ID this event relates to
    fn aggregate_id(&self) -> Uuid;

    /// Get the event type name
    fn event_type(&self) -> &'static str;
}

/// Everything the lifecycle engine can report having done
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LifecycleEvent {
    /// A project was proposed under an assignment
    ProjectCreated {
        /// The new project
        project_id: ProjectId,
        /// The assignment it belongs to
        assignment_id: AssignmentId,
        /// Who created it
        actor: UserId,
    },
    /// A project's status moved along the state machine
    StatusChanged {
        /// The project whose status changed
        project_id: ProjectId,
        /// Who drove the transition
        actor: UserId,
        /// Status before
        from: ProjectStatus,
        /// Status after
        to: ProjectStatus,
    },
    /// Someone applied to a published project
    ApplicationSubmitted {
        /// The new application
        application_id: ApplicationId,
        /// The project applied to
        project_id: ProjectId,
        /// Who applied
        applicant: UserId,
    },
    /// The product owner decided on an application
    ApplicationReviewed {
        /// The application decided on
        application_id: ApplicationId,
        /// The project applied to
        project_id: ProjectId,
        /// The applicant the decision concerns
        applicant: UserId,
        /// The decision
        decision: ApplicationStatus,
    },
    /// An approved applicant joined the roster
    UserJoined {
        /// The project joined
        project_id: ProjectId,
        /// The new member
        user_id: UserId,
    },
    /// A sibling application was rejected because its applicant joined
    /// a different project in the same assignment
    ApplicationAutoRejected {
        /// The rejected application
        application_id: ApplicationId,
        /// The project it had applied to
        project_id: ProjectId,
        /// The applicant
        applicant: UserId,
    },
    /// A member was removed from the roster
    MemberRemoved {
        /// The project the member left
        project_id: ProjectId,
        /// The removed member
        member: UserId,
        /// Who removed them
        actor: UserId,
    },
    /// A project's content was cloned into another assignment
    ProjectImported {
        /// The project that was copied
        source_project_id: ProjectId,
        /// The fresh pending copy
        new_project_id: ProjectId,
        /// The assignment the copy lives under
        target_assignment_id: AssignmentId,
        /// Who imported it
        actor: UserId,
    },
    /// Accountability for a project moved to a different user
    ProductOwnerReassigned {
        /// The project concerned
        project_id: ProjectId,
        /// Previous owner
        previous_owner: UserId,
        /// New owner
        new_owner: UserId,
    },
    /// A reviewer recorded or revised a judgement
    ReviewRecorded {
        /// The project reviewed
        project_id: ProjectId,
        /// The reviewer
        reviewer: UserId,
    },
}

impl DomainEvent for LifecycleEvent {
    fn aggregate_id(&self) -> Uuid {
        use LifecycleEvent::*;

        match self {
            ProjectCreated { project_id, .. }
            | StatusChanged { project_id, .. }
            | UserJoined { project_id, .. }
            | MemberRemoved { project_id, .. }
            | ProductOwnerReassigned { project_id, .. }
            | ReviewRecorded { project_id, .. } => (*project_id).into(),
            ApplicationSubmitted { application_id, .. }
            | ApplicationReviewed { application_id, .. }
            | ApplicationAutoRejected { application_id, .. } => (*application_id).into(),
            ProjectImported { new_project_id, .. } => (*new_project_id).into(),
        }
    }

    fn event_type(&self) -> &'static str {
        use LifecycleEvent::*;

        match self {
            ProjectCreated { .. } => "ProjectCreated",
            StatusChanged { .. } => "StatusChanged",
            ApplicationSubmitted { .. } => "ApplicationSubmitted",
            ApplicationReviewed { .. } => "ApplicationReviewed",
            UserJoined { .. } => "UserJoined",
            ApplicationAutoRejected { .. } => "ApplicationAutoRejected",
            MemberRemoved { .. } => "MemberRemoved",
            ProjectImported { .. } => "ProjectImported",
            ProductOwnerReassigned { .. } => "ProductOwnerReassigned",
            ReviewRecorded { .. } => "ReviewRecorded",
        }
    }
}

/// A message addressed to one recipient, produced by a lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    /// Who should receive the message
    pub recipient: UserId,
    /// Human-readable message
    pub message: String,
    /// Optional link to the entity the message concerns
    pub link: Option<String>,
}

impl Notification {
    /// Create a notification without a link
    pub fn new(recipient: UserId, message: impl Into<String>) -> Self {
        Self {
            recipient,
            message: message.into(),
            link: None,
        }
    }

    /// Attach a link
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Fire-and-forget delivery collaborator
///
/// Implemented externally (mail, WebSocket push); the engine only hands
/// notifications over.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification
    fn emit(&self, notification: &Notification) -> Result<(), String>;
}

/// Deliver a batch best-effort: failures are logged, never propagated
pub fn dispatch_all(sink: &dyn NotificationSink, notifications: &[Notification]) {
    for notification in notifications {
        if let Err(reason) = sink.emit(notification) {
            tracing::warn!(
                recipient = %notification.recipient,
                %reason,
                "notification delivery failed; continuing"
            );
        }
    }
}

/// Recording sink for tests
#[derive(Clone, Default)]
pub struct RecordingSink {
    delivered: std::sync::Arc<std::sync::RwLock<Vec<Notification>>>,
}

impl RecordingSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.read().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, notification: &Notification) -> Result<(), String> {
        self.delivered.write().unwrap().push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn emit(&self, _notification: &Notification) -> Result<(), String> {
            Err("smtp down".to_string())
        }
    }

    #[test]
    fn event_types_are_stable() {
        let event = LifecycleEvent::UserJoined {
            project_id: ProjectId::new(),
            user_id: UserId::new(),
        };
        assert_eq!(event.event_type(), "UserJoined");
    }

    #[test]
    fn aggregate_id_points_at_the_application_for_application_events() {
        let application_id = ApplicationId::new();
        let event = LifecycleEvent::ApplicationSubmitted {
            application_id,
            project_id: ProjectId::new(),
            applicant: UserId::new(),
        };
        assert_eq!(event.aggregate_id(), (*application_id.as_uuid()));
    }

    #[test]
    fn dispatch_swallows_sink_failures() {
        let notifications = vec![Notification::new(UserId::new(), "hello")];
        // Must not panic or propagate.
        dispatch_all(&FailingSink, &notifications);
    }

    #[test]
    fn recording_sink_captures_in_order() {
        let sink = RecordingSink::new();
        let a = Notification::new(UserId::new(), "first");
        let b = Notification::new(UserId::new(), "second").with_link("/projects/1");
        dispatch_all(&sink, &[a.clone(), b.clone()]);

        assert_eq!(sink.delivered(), vec![a, b]);
    }
}
