//! Read-only dashboard aggregation over an assignment
//!
//! Pure derivation of counts and short lists from current state. No side
//! effects, no locking; running concurrently with mutations is safe and a
//! slightly stale snapshot is acceptable, since the numbers are
//! informational.

use crate::application::ApplicationStatus;
use crate::assignment::Assignment;
use crate::entity::{AssignmentId, ProjectId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::project::{Project, ProjectStatus};
use crate::stores::{ApplicationStore, AssignmentStore, EnrollmentStore, ProjectStore};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// How many unassigned students the details view lists by name
const UNASSIGNED_SAMPLE: usize = 10;
/// How many review-queue projects the details view summarizes
const REVIEW_QUEUE_SAMPLE: usize = 5;

/// One line of the review queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ProjectSummary {
    /// The project awaiting review
    pub project_id: ProjectId,
    /// Its title
    pub title: String,
    /// Its current status
    pub status: ProjectStatus,
}

/// Derived counts and lists for one assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DashboardDetails {
    /// The assignment aggregated over
    pub assignment_id: AssignmentId,
    /// Students enrolled in the assignment's course
    pub total_students: usize,
    /// Distinct students either owning an approved or published project
    /// or holding an approved application
    pub assigned_students: usize,
    /// `max(0, total - assigned)`
    pub unassigned_students: usize,
    /// The first unassigned students, capped at ten
    pub unassigned_sample: Vec<UserId>,
    /// Projects awaiting a teacher's verdict (pending or revised)
    pub review_queue_projects: usize,
    /// The first review-queue projects, capped at five
    pub review_queue: Vec<ProjectSummary>,
    /// Projects sent back for changes
    pub needs_revision_projects: usize,
    /// Applications still awaiting a decision
    pub pending_applications: usize,
}

/// Read-only aggregator over the stores
#[derive(Clone)]
pub struct DashboardAggregator {
    assignments: Arc<dyn AssignmentStore>,
    projects: Arc<dyn ProjectStore>,
    applications: Arc<dyn ApplicationStore>,
    enrollments: Arc<dyn EnrollmentStore>,
}

impl DashboardAggregator {
    /// Assemble an aggregator over concrete stores
    pub fn new(
        assignments: Arc<dyn AssignmentStore>,
        projects: Arc<dyn ProjectStore>,
        applications: Arc<dyn ApplicationStore>,
        enrollments: Arc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            assignments,
            projects,
            applications,
            enrollments,
        }
    }

    /// Compute the dashboard for one assignment
    pub async fn details(&self, assignment_id: AssignmentId) -> DomainResult<DashboardDetails> {
        let assignment: Assignment = self
            .assignments
            .get(assignment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Assignment", assignment_id))?;

        let projects = self.projects.by_assignment(assignment_id).await?;
        let project_ids: HashSet<ProjectId> = projects.iter().map(|p| p.id).collect();

        let mut applications = Vec::new();
        for project in &projects {
            applications.extend(self.applications.by_project(project.id).await?);
        }
        // Defensive against stores that return applications beyond the
        // assignment's projects.
        applications.retain(|a| project_ids.contains(&a.project_id));

        let mut assigned: HashSet<UserId> = projects
            .iter()
            .filter(|p| {
                matches!(
                    p.status,
                    ProjectStatus::Approved | ProjectStatus::Published
                )
            })
            .map(|p| p.product_owner)
            .collect();
        assigned.extend(
            applications
                .iter()
                .filter(|a| a.status == ApplicationStatus::Approved)
                .map(|a| a.applicant),
        );

        let enrolled = self.enrollments.students_of(assignment.course_id).await?;
        let total_students = enrolled.len();
        let assigned_students = assigned.len();
        let unassigned_students = total_students.saturating_sub(assigned_students);
        let unassigned_sample: Vec<UserId> = enrolled
            .into_iter()
            .filter(|s| !assigned.contains(s))
            .take(UNASSIGNED_SAMPLE)
            .collect();

        let review_queue_all: Vec<&Project> = projects
            .iter()
            .filter(|p| matches!(p.status, ProjectStatus::Pending | ProjectStatus::Revised))
            .collect();
        let review_queue = review_queue_all
            .iter()
            .take(REVIEW_QUEUE_SAMPLE)
            .map(|p| ProjectSummary {
                project_id: p.id,
                title: p.title.clone(),
                status: p.status,
            })
            .collect();

        Ok(DashboardDetails {
            assignment_id,
            total_students,
            assigned_students,
            unassigned_students,
            unassigned_sample,
            review_queue_projects: review_queue_all.len(),
            review_queue,
            needs_revision_projects: projects
                .iter()
                .filter(|p| p.status == ProjectStatus::NeedsRevision)
                .count(),
            pending_applications: applications
                .iter()
                .filter(|a| a.status == ApplicationStatus::Pending)
                .count(),
        })
    }
}
