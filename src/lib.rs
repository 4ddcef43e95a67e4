//! # CourseMatch Domain
//!
//! Core domain logic for matching students and researchers to course
//! assignments through proposed projects:
//! - **Lifecycle Engine**: orchestrates project and application transitions
//! - **Authorization Policy**: pure capability computation per actor
//! - **Deadline Gate**: permits or refuses actions per restriction kind
//! - **Team-Capacity Enforcer**: keeps rosters within their bound
//! - **Dashboard Aggregator**: read-only derived counts and lists
//!
//! ## Design Principles
//!
//! 1. **Explicit actors**: every operation takes an [`ActorContext`]; there
//!    is no ambient current-user state
//! 2. **Type Safety**: phantom-typed identifiers keep entity ids apart at
//!    compile time
//! 3. **Controlled State**: enums restrict statuses and transitions to
//!    valid options
//! 4. **Ids, not pointers**: relationships are id references resolved
//!    through store traits, never live object graphs
//! 5. **Side effects as data**: operations return the events and
//!    notifications they produced; delivery is the caller's concern
//!
//! Outer surfaces (HTTP, LMS login, sessions, mail transport, WebSockets)
//! live outside this crate and talk to it through the store and sink
//! traits.

#![warn(missing_docs)]

mod actor;
mod application;
mod assignment;
mod capacity;
mod dashboard;
mod deadline_gate;
mod engine;
mod entity;
mod errors;
mod events;
mod policy;
mod project;
mod review;
mod state_machine;
mod stores;

pub use actor::{ActorContext, Role};
pub use application::{Application, ApplicationStatus};
pub use assignment::{Assignment, Deadline, DeadlineRestriction, Enrollment};
pub use capacity::{check_capacity, has_capacity, remaining};
pub use dashboard::{DashboardAggregator, DashboardDetails, ProjectSummary};
pub use deadline_gate::{check_permitted, is_permitted};
pub use engine::{LifecycleEngine, Outcome, ProjectDraft};
pub use entity::{
    AggregateRoot, ApplicationId, ApplicationMarker, AssignmentId, AssignmentMarker, CourseId,
    CourseMarker, DeadlineId, DeadlineMarker, EntityId, ProjectId, ProjectMarker, ReviewId,
    ReviewMarker, UserId, UserMarker,
};
pub use errors::{DomainError, DomainResult};
pub use events::{
    dispatch_all, DomainEvent, LifecycleEvent, Notification, NotificationSink, RecordingSink,
};
pub use policy::{
    can, can_view, capabilities, role_capabilities, visible_projects, Capability,
    ALL_CAPABILITIES,
};
pub use project::{Project, ProjectStatus, ProjectUpdate, UpdateReport};
pub use review::{Review, ReviewStatus};
pub use state_machine::{transition, State, StateTransitions};
pub use stores::{
    ApplicationStore, AssignmentStore, DeadlineStore, EnrollmentStore, InMemoryApplicationStore,
    InMemoryAssignmentStore, InMemoryDeadlineStore, InMemoryEnrollmentStore, InMemoryProjectStore,
    InMemoryReviewStore, InMemoryRoleDirectory, ProjectStore, ReviewStore, RoleDirectory,
    StoreError, StoreResult,
};
