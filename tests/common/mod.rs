//! Shared test fixture: an engine wired to in-memory stores with one
//! seeded course and assignment.

#![allow(dead_code)]

use std::sync::Arc;

use coursematch_domain::{
    ActorContext, Assignment, AssignmentId, AssignmentStore, CourseId, DashboardAggregator,
    Deadline, DeadlineRestriction, DeadlineStore, Enrollment, EnrollmentStore,
    InMemoryApplicationStore, InMemoryAssignmentStore,
    InMemoryDeadlineStore, InMemoryEnrollmentStore, InMemoryProjectStore, InMemoryReviewStore,
    InMemoryRoleDirectory, LifecycleEngine, Project, ProjectDraft, ProjectStatus, Role, UserId,
};
use chrono::{Duration, Utc};

pub struct World {
    pub assignments: Arc<InMemoryAssignmentStore>,
    pub deadlines: Arc<InMemoryDeadlineStore>,
    pub projects: Arc<InMemoryProjectStore>,
    pub applications: Arc<InMemoryApplicationStore>,
    pub reviews: Arc<InMemoryReviewStore>,
    pub enrollments: Arc<InMemoryEnrollmentStore>,
    pub roles: Arc<InMemoryRoleDirectory>,
    pub engine: LifecycleEngine,
    pub dashboard: DashboardAggregator,
    pub course_id: CourseId,
    pub assignment_id: AssignmentId,
}

impl World {
    /// One course, one assignment with default team size 3, no deadlines.
    pub async fn new() -> Self {
        let assignments = Arc::new(InMemoryAssignmentStore::new());
        let deadlines = Arc::new(InMemoryDeadlineStore::new());
        let projects = Arc::new(InMemoryProjectStore::new());
        let applications = Arc::new(InMemoryApplicationStore::new());
        let reviews = Arc::new(InMemoryReviewStore::new());
        let enrollments = Arc::new(InMemoryEnrollmentStore::new());
        let roles = Arc::new(InMemoryRoleDirectory::new());

        let course_id = CourseId::new();
        let assignment = Assignment::new(course_id, "Software project", 3);
        let assignment_id = assignment.id;
        assignments.insert(assignment).await.unwrap();

        let engine = LifecycleEngine::new(
            assignments.clone(),
            deadlines.clone(),
            projects.clone(),
            applications.clone(),
            reviews.clone(),
            roles.clone(),
        );
        let dashboard = DashboardAggregator::new(
            assignments.clone(),
            projects.clone(),
            applications.clone(),
            enrollments.clone(),
        );

        Self {
            assignments,
            deadlines,
            projects,
            applications,
            reviews,
            enrollments,
            roles,
            engine,
            dashboard,
            course_id,
            assignment_id,
        }
    }

    /// Register an actor with the role directory.
    pub fn actor(&self, role: Role) -> ActorContext {
        let actor = ActorContext::new(UserId::new(), role);
        self.roles.set_role(actor.id, role);
        actor
    }

    /// A student enrolled in the seeded course.
    pub async fn enrolled_student(&self) -> ActorContext {
        let actor = self.actor(Role::Student);
        self.enrollments
            .enroll(Enrollment {
                course_id: self.course_id,
                user_id: actor.id,
            })
            .await
            .unwrap();
        actor
    }

    /// Add a deadline for the seeded assignment, offset from now.
    pub async fn deadline_in(&self, restriction: DeadlineRestriction, offset: Duration) {
        self.deadlines
            .insert(Deadline::new(
                self.assignment_id,
                restriction,
                Utc::now() + offset,
                "Europe/Amsterdam",
            ))
            .await
            .unwrap();
    }

    /// Create a pending project with an explicit team size.
    pub async fn pending_project(&self, owner: &ActorContext, team_size: usize) -> Project {
        self.engine
            .create_project(
                owner,
                self.assignment_id,
                ProjectDraft {
                    title: "Peer review tool".to_string(),
                    description: "Double-blind peer review".to_string(),
                    team_size: Some(team_size),
                },
            )
            .await
            .unwrap()
            .value
    }

    /// Drive a pending project through approval to publication.
    pub async fn publish(&self, teacher: &ActorContext, project: &Project) -> Project {
        self.engine
            .change_project_status(teacher, project.id, ProjectStatus::Approved)
            .await
            .unwrap();
        self.engine
            .change_project_status(teacher, project.id, ProjectStatus::Published)
            .await
            .unwrap()
            .value
    }

    /// Create a project and publish it in one step.
    pub async fn published_project(
        &self,
        owner: &ActorContext,
        teacher: &ActorContext,
        team_size: usize,
    ) -> Project {
        let project = self.pending_project(owner, team_size).await;
        self.publish(teacher, &project).await
    }
}
