//! Store contracts and in-memory reference implementations
//!
//! The engine persists through these traits only; concrete wire formats
//! and storage engines live outside the crate. The contracts assume an
//! ACID-transactional relational store with foreign keys
//! Project→Assignment, Application→Project, Review→Project,
//! Deadline→Assignment and a Project↔User members association.
//!
//! Writes against aggregates take the version the caller loaded; a
//! mismatch fails with [`StoreError::VersionConflict`], which is what
//! serializes concurrent check-then-act sequences on the same row.
//!
//! The `InMemory*` types back the test suite and document the expected
//! semantics; they are not a production store.

use crate::actor::Role;
use crate::application::Application;
use crate::assignment::{Assignment, Deadline, Enrollment};
use crate::entity::{
    AggregateRoot, ApplicationId, AssignmentId, CourseId, ProjectId, UserId,
};
use crate::errors::DomainError;
use crate::project::Project;
use crate::review::Review;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Errors surfaced by store implementations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The referenced row does not exist
    #[error("Row not found: {0}")]
    NotFound(String),

    /// Optimistic version check failed
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// Version the caller loaded
        expected: u64,
        /// Version currently committed
        actual: u64,
    },

    /// Backend failure; the transaction was aborted
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => DomainError::EntityNotFound {
                entity_type: "Entity".to_string(),
                id: what,
            },
            StoreError::VersionConflict { expected, actual } => {
                DomainError::ConcurrencyConflict { expected, actual }
            }
            StoreError::Backend(reason) => DomainError::Storage(reason),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional storage for assignments
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Load an assignment by id
    async fn get(&self, id: AssignmentId) -> StoreResult<Option<Assignment>>;

    /// Persist an assignment
    async fn insert(&self, assignment: Assignment) -> StoreResult<()>;
}

/// Transactional storage for deadlines
#[async_trait]
pub trait DeadlineStore: Send + Sync {
    /// All deadlines for an assignment, across restrictions
    async fn for_assignment(&self, assignment_id: AssignmentId) -> StoreResult<Vec<Deadline>>;

    /// Persist a deadline
    async fn insert(&self, deadline: Deadline) -> StoreResult<()>;
}

/// Transactional storage for projects
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load a project by id
    async fn get(&self, id: ProjectId) -> StoreResult<Option<Project>>;

    /// Persist a new project
    async fn insert(&self, project: Project) -> StoreResult<()>;

    /// Persist an updated project, checking the version the caller loaded
    ///
    /// On success the committed copy, with its version incremented, is
    /// returned.
    async fn update(&self, project: Project, expected_version: u64) -> StoreResult<Project>;

    /// All projects under an assignment
    async fn by_assignment(&self, assignment_id: AssignmentId) -> StoreResult<Vec<Project>>;

    /// Projects under an assignment that have the user on their roster
    async fn member_of(
        &self,
        assignment_id: AssignmentId,
        user: UserId,
    ) -> StoreResult<Vec<Project>>;
}

/// Transactional storage for applications
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Load an application by id
    async fn get(&self, id: ApplicationId) -> StoreResult<Option<Application>>;

    /// Persist a new application
    async fn insert(&self, application: Application) -> StoreResult<()>;

    /// Persist an updated application, checking the loaded version
    async fn update(
        &self,
        application: Application,
        expected_version: u64,
    ) -> StoreResult<Application>;

    /// All applications against one project
    async fn by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Application>>;

    /// All applications submitted by one applicant, across projects
    async fn by_applicant(&self, applicant: UserId) -> StoreResult<Vec<Application>>;
}

/// Transactional storage for reviews, keyed by (project, reviewer)
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// The review a reviewer recorded for a project, if any
    async fn find(&self, project_id: ProjectId, reviewer: UserId) -> StoreResult<Option<Review>>;

    /// Insert or replace the review for (project, reviewer)
    async fn upsert(&self, review: Review) -> StoreResult<()>;

    /// All reviews recorded for a project
    async fn by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Review>>;
}

/// Read-mostly roster of enrolled students per course
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Enrolled students of a course
    async fn students_of(&self, course_id: CourseId) -> StoreResult<Vec<UserId>>;

    /// Record an enrollment
    async fn enroll(&self, enrollment: Enrollment) -> StoreResult<()>;
}

/// Authoritative role lookup, consulted fresh per operation
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// The user's current role, if known
    async fn role_of(&self, user: UserId) -> StoreResult<Option<Role>>;
}

// In-memory implementations

/// In-memory assignment store
#[derive(Clone, Default)]
pub struct InMemoryAssignmentStore {
    rows: Arc<RwLock<HashMap<AssignmentId, Assignment>>>,
}

impl InMemoryAssignmentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn get(&self, id: AssignmentId) -> StoreResult<Option<Assignment>> {
        Ok(self.rows.read().unwrap().get(&id).cloned())
    }

    async fn insert(&self, assignment: Assignment) -> StoreResult<()> {
        self.rows.write().unwrap().insert(assignment.id, assignment);
        Ok(())
    }
}

/// In-memory deadline store
#[derive(Clone, Default)]
pub struct InMemoryDeadlineStore {
    rows: Arc<RwLock<Vec<Deadline>>>,
}

impl InMemoryDeadlineStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeadlineStore for InMemoryDeadlineStore {
    async fn for_assignment(&self, assignment_id: AssignmentId) -> StoreResult<Vec<Deadline>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .iter()
            .filter(|d| d.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, deadline: Deadline) -> StoreResult<()> {
        self.rows.write().unwrap().push(deadline);
        Ok(())
    }
}

/// In-memory project store with an optimistic version check
#[derive(Clone, Default)]
pub struct InMemoryProjectStore {
    rows: Arc<RwLock<HashMap<ProjectId, Project>>>,
}

impl InMemoryProjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn get(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.rows.read().unwrap().get(&id).cloned())
    }

    async fn insert(&self, project: Project) -> StoreResult<()> {
        self.rows.write().unwrap().insert(project.id, project);
        Ok(())
    }

    async fn update(&self, mut project: Project, expected_version: u64) -> StoreResult<Project> {
        let mut rows = self.rows.write().unwrap();
        let current = rows
            .get(&project.id)
            .ok_or_else(|| StoreError::NotFound(project.id.to_string()))?;
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: current.version,
            });
        }
        project.version = expected_version;
        project.increment_version();
        rows.insert(project.id, project.clone());
        Ok(project)
    }

    async fn by_assignment(&self, assignment_id: AssignmentId) -> StoreResult<Vec<Project>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|p| p.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn member_of(
        &self,
        assignment_id: AssignmentId,
        user: UserId,
    ) -> StoreResult<Vec<Project>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|p| p.assignment_id == assignment_id && p.is_member(&user))
            .cloned()
            .collect())
    }
}

/// In-memory application store with an optimistic version check
#[derive(Clone, Default)]
pub struct InMemoryApplicationStore {
    rows: Arc<RwLock<HashMap<ApplicationId, Application>>>,
}

impl InMemoryApplicationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn get(&self, id: ApplicationId) -> StoreResult<Option<Application>> {
        Ok(self.rows.read().unwrap().get(&id).cloned())
    }

    async fn insert(&self, application: Application) -> StoreResult<()> {
        self.rows
            .write()
            .unwrap()
            .insert(application.id, application);
        Ok(())
    }

    async fn update(
        &self,
        mut application: Application,
        expected_version: u64,
    ) -> StoreResult<Application> {
        let mut rows = self.rows.write().unwrap();
        let current = rows
            .get(&application.id)
            .ok_or_else(|| StoreError::NotFound(application.id.to_string()))?;
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: current.version,
            });
        }
        application.version = expected_version;
        application.increment_version();
        rows.insert(application.id, application.clone());
        Ok(application)
    }

    async fn by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Application>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn by_applicant(&self, applicant: UserId) -> StoreResult<Vec<Application>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|a| a.applicant == applicant)
            .cloned()
            .collect())
    }
}

/// In-memory review store
#[derive(Clone, Default)]
pub struct InMemoryReviewStore {
    rows: Arc<RwLock<HashMap<(ProjectId, UserId), Review>>>,
}

impl InMemoryReviewStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn find(&self, project_id: ProjectId, reviewer: UserId) -> StoreResult<Option<Review>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .get(&(project_id, reviewer))
            .cloned())
    }

    async fn upsert(&self, review: Review) -> StoreResult<()> {
        self.rows
            .write()
            .unwrap()
            .insert((review.project_id, review.reviewer), review);
        Ok(())
    }

    async fn by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Review>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }
}

/// In-memory enrollment roster
#[derive(Clone, Default)]
pub struct InMemoryEnrollmentStore {
    rows: Arc<RwLock<Vec<Enrollment>>>,
}

impl InMemoryEnrollmentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn students_of(&self, course_id: CourseId) -> StoreResult<Vec<UserId>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.course_id == course_id)
            .map(|e| e.user_id)
            .collect())
    }

    async fn enroll(&self, enrollment: Enrollment) -> StoreResult<()> {
        self.rows.write().unwrap().push(enrollment);
        Ok(())
    }
}

/// In-memory role directory
#[derive(Clone, Default)]
pub struct InMemoryRoleDirectory {
    roles: Arc<RwLock<HashMap<UserId, Role>>>,
}

impl InMemoryRoleDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or change a user's role
    pub fn set_role(&self, user: UserId, role: Role) {
        self.roles.write().unwrap().insert(user, role);
    }
}

#[async_trait]
impl RoleDirectory for InMemoryRoleDirectory {
    async fn role_of(&self, user: UserId) -> StoreResult<Option<Role>> {
        Ok(self.roles.read().unwrap().get(&user).copied())
    }
}
