//! Lifecycle engine: orchestrates project and application transitions
//!
//! Every operation takes an explicit [`ActorContext`], loads entities
//! through the store traits, consults the authorization policy and the
//! deadline gate, applies the capacity enforcer where membership changes,
//! and returns the updated state together with the events and
//! notifications the caller should dispatch. The engine itself never
//! delivers notifications and never authenticates.
//!
//! Storage obligations: a version conflict from a store surfaces as a
//! retryable [`DomainError::ConcurrencyConflict`]; a failed operation
//! leaves no partial state.

use crate::actor::{ActorContext, Role};
use crate::application::{Application, ApplicationStatus};
use crate::assignment::{Assignment, DeadlineRestriction};
use crate::capacity;
use crate::deadline_gate;
use crate::entity::{ApplicationId, AssignmentId, ProjectId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{LifecycleEvent, Notification};
use crate::policy::{self, Capability};
use crate::project::{Project, ProjectStatus, ProjectUpdate, UpdateReport};
use crate::review::{Review, ReviewStatus};
use crate::state_machine::{transition, State};
use crate::stores::{
    ApplicationStore, AssignmentStore, DeadlineStore, ProjectStore, ReviewStore, RoleDirectory,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Updated state plus the side effects the caller should dispatch
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    /// The committed state
    pub value: T,
    /// Events describing what happened
    pub events: Vec<LifecycleEvent>,
    /// Notifications addressed by those events; delivery is best-effort
    pub notifications: Vec<Notification>,
}

impl<T> Outcome<T> {
    fn quiet(value: T) -> Self {
        Self {
            value,
            events: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

/// Content for a new project proposal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDraft {
    /// Project title
    pub title: String,
    /// Project description
    pub description: String,
    /// Requested team size; defaults to the assignment's default
    pub team_size: Option<usize>,
}

/// The lifecycle engine over abstract stores
#[derive(Clone)]
pub struct LifecycleEngine {
    assignments: Arc<dyn AssignmentStore>,
    deadlines: Arc<dyn DeadlineStore>,
    projects: Arc<dyn ProjectStore>,
    applications: Arc<dyn ApplicationStore>,
    reviews: Arc<dyn ReviewStore>,
    roles: Arc<dyn RoleDirectory>,
}

impl LifecycleEngine {
    /// Assemble an engine over concrete stores
    pub fn new(
        assignments: Arc<dyn AssignmentStore>,
        deadlines: Arc<dyn DeadlineStore>,
        projects: Arc<dyn ProjectStore>,
        applications: Arc<dyn ApplicationStore>,
        reviews: Arc<dyn ReviewStore>,
        roles: Arc<dyn RoleDirectory>,
    ) -> Self {
        Self {
            assignments,
            deadlines,
            projects,
            applications,
            reviews,
            roles,
        }
    }

    // Loading helpers

    async fn load_assignment(&self, id: AssignmentId) -> DomainResult<Assignment> {
        self.assignments
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Assignment", id))
    }

    async fn load_project(&self, id: ProjectId) -> DomainResult<Project> {
        self.projects
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project", id))
    }

    async fn load_application(&self, id: ApplicationId) -> DomainResult<Application> {
        self.applications
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Application", id))
    }

    async fn creator_role(&self, project: &Project) -> DomainResult<Option<Role>> {
        Ok(self.roles.role_of(project.created_by).await?)
    }

    /// Load a project the actor may view; answers `NotFound` when
    /// visibility is denied so existence is never leaked.
    async fn load_visible_project(
        &self,
        actor: &ActorContext,
        id: ProjectId,
    ) -> DomainResult<Project> {
        let project = self.load_project(id).await?;
        let creator_role = self.creator_role(&project).await?;
        if !policy::can_view(actor, &project, creator_role) {
            debug!(actor = %actor.id, project = %id, "visibility denied; reporting not found");
            return Err(DomainError::not_found("Project", id));
        }
        Ok(project)
    }

    async fn require(
        &self,
        actor: &ActorContext,
        project: &Project,
        capability: Capability,
    ) -> DomainResult<()> {
        let creator_role = self.creator_role(project).await?;
        if policy::can(actor, project, creator_role, capability) {
            Ok(())
        } else {
            debug!(actor = %actor.id, project = %project.id, ?capability, "capability denied");
            Err(DomainError::unauthorized(format!(
                "{:?} on project {}",
                capability, project.id
            )))
        }
    }

    /// Per-assignment one-membership invariant
    async fn ensure_unassigned(
        &self,
        user: UserId,
        assignment_id: AssignmentId,
    ) -> DomainResult<()> {
        let memberships = self.projects.member_of(assignment_id, user).await?;
        if memberships.is_empty() {
            Ok(())
        } else {
            Err(DomainError::AlreadyAssigned {
                assignment_id: assignment_id.to_string(),
            })
        }
    }

    async fn check_deadline(
        &self,
        assignment_id: AssignmentId,
        restriction: DeadlineRestriction,
    ) -> DomainResult<()> {
        let deadlines = self.deadlines.for_assignment(assignment_id).await?;
        deadline_gate::check_permitted(&deadlines, restriction, Utc::now())
    }

    // Project operations

    /// Propose a new project under an assignment
    ///
    /// Gated by the `ProjectCreation` deadline. Student/researcher
    /// creators are seeded onto the roster, subject to the one-membership
    /// invariant; staff creators are not.
    pub async fn create_project(
        &self,
        actor: &ActorContext,
        assignment_id: AssignmentId,
        draft: ProjectDraft,
    ) -> DomainResult<Outcome<Project>> {
        let assignment = self.load_assignment(assignment_id).await?;
        self.check_deadline(assignment_id, DeadlineRestriction::ProjectCreation)
            .await?;
        if matches!(actor.role, Role::Student | Role::Researcher) {
            self.ensure_unassigned(actor.id, assignment_id).await?;
        }
        if draft.title.trim().is_empty() {
            return Err(DomainError::Validation("project title is empty".to_string()));
        }

        let team_size = draft.team_size.unwrap_or(assignment.default_team_size);
        if team_size == 0 {
            return Err(DomainError::Validation("team size must be positive".to_string()));
        }
        let project = Project::new(
            assignment_id,
            draft.title,
            draft.description,
            team_size,
            actor.id,
            actor.role,
        );
        self.projects.insert(project.clone()).await?;
        info!(project = %project.id, assignment = %assignment_id, actor = %actor.id, "project created");

        Ok(Outcome {
            events: vec![LifecycleEvent::ProjectCreated {
                project_id: project.id,
                assignment_id,
                actor: actor.id,
            }],
            notifications: Vec::new(),
            value: project,
        })
    }

    /// Edit project fields, honoring the core/asset partition
    ///
    /// Returns the explicit report of applied vs. skipped fields alongside
    /// the committed project.
    pub async fn update_project(
        &self,
        actor: &ActorContext,
        project_id: ProjectId,
        update: ProjectUpdate,
    ) -> DomainResult<Outcome<(Project, UpdateReport)>> {
        let mut project = self.load_visible_project(actor, project_id).await?;
        self.require(actor, &project, Capability::Edit).await?;

        if let Some(team_size) = update.team_size {
            if project.status.core_editable() && team_size < project.members.len() {
                return Err(DomainError::Validation(format!(
                    "team size {} below current roster of {}",
                    team_size,
                    project.members.len()
                )));
            }
        }

        let expected = project.version;
        let report = project.apply_update(update);
        let project = self.projects.update(project, expected).await?;

        Ok(Outcome::quiet((project, report)))
    }

    /// Drive the project status state machine
    ///
    /// Re-requesting the current status is an idempotent no-op. Owners may
    /// only resubmit (`NeedsRevision` to `Revised`); teachers and admins
    /// drive the rest, with publication additionally requiring the
    /// `Publish` capability.
    pub async fn change_project_status(
        &self,
        actor: &ActorContext,
        project_id: ProjectId,
        new_status: ProjectStatus,
    ) -> DomainResult<Outcome<Project>> {
        let mut project = self.load_visible_project(actor, project_id).await?;
        self.require(actor, &project, Capability::ChangeStatus)
            .await?;

        if project.status == new_status {
            return Ok(Outcome::quiet(project));
        }

        let staff_driven = matches!(actor.role, Role::Teacher | Role::Admin);
        if !staff_driven {
            let resubmit = project.status == ProjectStatus::NeedsRevision
                && new_status == ProjectStatus::Revised;
            if !resubmit {
                return Err(DomainError::unauthorized(format!(
                    "owners may only resubmit, not move {} to {}",
                    project.status.name(),
                    new_status.name()
                )));
            }
        }
        if new_status == ProjectStatus::Published {
            self.require(actor, &project, Capability::Publish).await?;
        }

        let from = project.status;
        project.status = transition(project.status, new_status)?;
        project.updated_at = Utc::now();
        let expected = project.version;
        let project = self.projects.update(project, expected).await?;
        info!(
            project = %project.id,
            from = from.name(),
            to = new_status.name(),
            actor = %actor.id,
            "project status changed"
        );

        let mut notifications = Vec::new();
        if project.product_owner != actor.id {
            notifications.push(
                Notification::new(
                    project.product_owner,
                    format!(
                        "Your project \"{}\" moved from {} to {}",
                        project.title,
                        from.name(),
                        new_status.name()
                    ),
                )
                .with_link(format!("/projects/{}", project.id)),
            );
        }

        Ok(Outcome {
            events: vec![LifecycleEvent::StatusChanged {
                project_id: project.id,
                actor: actor.id,
                from,
                to: new_status,
            }],
            notifications,
            value: project,
        })
    }

    /// Publish every approved project under an assignment
    ///
    /// Each transition is validated independently; projects not in
    /// `Approved` are skipped, not failed as a batch.
    pub async fn publish_all_projects(
        &self,
        actor: &ActorContext,
        assignment_id: AssignmentId,
    ) -> DomainResult<Outcome<Vec<Project>>> {
        if !policy::role_capabilities(actor.role).contains(&Capability::Publish) {
            return Err(DomainError::unauthorized("publishing requires course staff"));
        }
        self.load_assignment(assignment_id).await?;

        let mut published = Vec::new();
        let mut events = Vec::new();
        let mut notifications = Vec::new();
        for mut project in self.projects.by_assignment(assignment_id).await? {
            if project.status != ProjectStatus::Approved {
                continue;
            }
            let from = project.status;
            project.status = transition(project.status, ProjectStatus::Published)?;
            project.updated_at = Utc::now();
            let expected = project.version;
            let project = self.projects.update(project, expected).await?;
            events.push(LifecycleEvent::StatusChanged {
                project_id: project.id,
                actor: actor.id,
                from,
                to: ProjectStatus::Published,
            });
            notifications.push(
                Notification::new(
                    project.product_owner,
                    format!("Your project \"{}\" has been published", project.title),
                )
                .with_link(format!("/projects/{}", project.id)),
            );
            published.push(project);
        }
        info!(assignment = %assignment_id, count = published.len(), "published approved projects");

        Ok(Outcome {
            value: published,
            events,
            notifications,
        })
    }

    /// Move accountability for a project to a different user
    pub async fn reassign_product_owner(
        &self,
        actor: &ActorContext,
        project_id: ProjectId,
        new_owner: UserId,
    ) -> DomainResult<Outcome<Project>> {
        let mut project = self.load_visible_project(actor, project_id).await?;
        if actor.role != Role::Admin && project.product_owner != actor.id {
            return Err(DomainError::NotOwnerOfProject {
                project_id: project_id.to_string(),
            });
        }
        let previous_owner = project.product_owner;
        if previous_owner == new_owner {
            return Ok(Outcome::quiet(project));
        }

        project.product_owner = new_owner;
        project.updated_at = Utc::now();
        let expected = project.version;
        let project = self.projects.update(project, expected).await?;
        info!(project = %project.id, %previous_owner, %new_owner, "product owner reassigned");

        Ok(Outcome {
            events: vec![LifecycleEvent::ProductOwnerReassigned {
                project_id: project.id,
                previous_owner,
                new_owner,
            }],
            notifications: vec![Notification::new(
                new_owner,
                format!("You are now the product owner of \"{}\"", project.title),
            )
            .with_link(format!("/projects/{}", project.id))],
            value: project,
        })
    }

    /// Clone a project's content into another assignment as a fresh
    /// pending proposal with an empty roster
    pub async fn import_project(
        &self,
        actor: &ActorContext,
        source_project_id: ProjectId,
        target_assignment_id: AssignmentId,
    ) -> DomainResult<Outcome<Project>> {
        if !policy::role_capabilities(actor.role).contains(&Capability::Import) {
            return Err(DomainError::unauthorized("importing requires course staff"));
        }
        let source = self.load_visible_project(actor, source_project_id).await?;
        self.load_assignment(target_assignment_id).await?;

        let imported = source.cloned_into(target_assignment_id, actor.id);
        self.projects.insert(imported.clone()).await?;
        info!(
            source = %source_project_id,
            imported = %imported.id,
            assignment = %target_assignment_id,
            "project imported"
        );

        Ok(Outcome {
            events: vec![LifecycleEvent::ProjectImported {
                source_project_id,
                new_project_id: imported.id,
                target_assignment_id,
                actor: actor.id,
            }],
            notifications: Vec::new(),
            value: imported,
        })
    }

    /// Remove a member from a project's roster
    ///
    /// Does not re-open any previously rejected applications; re-applying
    /// is explicit.
    pub async fn remove_member(
        &self,
        actor: &ActorContext,
        project_id: ProjectId,
        member: UserId,
    ) -> DomainResult<Outcome<Project>> {
        let mut project = self.load_visible_project(actor, project_id).await?;
        self.require(actor, &project, Capability::RemoveMember)
            .await?;
        if !project.members.shift_remove(&member) {
            return Err(DomainError::not_found("Member", member));
        }

        project.updated_at = Utc::now();
        let expected = project.version;
        let project = self.projects.update(project, expected).await?;
        info!(project = %project.id, %member, actor = %actor.id, "member removed");

        Ok(Outcome {
            events: vec![LifecycleEvent::MemberRemoved {
                project_id: project.id,
                member,
                actor: actor.id,
            }],
            notifications: vec![Notification::new(
                member,
                format!("You were removed from \"{}\"", project.title),
            )],
            value: project,
        })
    }

    // Application operations

    /// Apply to a published project
    pub async fn create_application(
        &self,
        actor: &ActorContext,
        project_id: ProjectId,
        motivation: impl Into<String> + Send,
    ) -> DomainResult<Outcome<Application>> {
        let project = self.load_visible_project(actor, project_id).await?;
        if project.status != ProjectStatus::Published {
            return Err(DomainError::ProjectNotPublished {
                project_id: project_id.to_string(),
            });
        }
        self.check_deadline(
            project.assignment_id,
            DeadlineRestriction::ApplicationSubmission,
        )
        .await?;
        self.require(actor, &project, Capability::Apply).await?;
        self.ensure_unassigned(actor.id, project.assignment_id)
            .await?;

        // One application per (applicant, project); re-applying after a
        // rejection replaces nothing and is refused while any prior
        // application exists.
        let prior = self
            .applications
            .by_project(project_id)
            .await?
            .into_iter()
            .any(|a| a.applicant == actor.id);
        if prior {
            return Err(DomainError::DuplicateApplication {
                project_id: project_id.to_string(),
            });
        }

        let application = Application::new(project_id, actor.id, motivation);
        self.applications.insert(application.clone()).await?;
        info!(application = %application.id, project = %project_id, applicant = %actor.id, "application submitted");

        Ok(Outcome {
            events: vec![LifecycleEvent::ApplicationSubmitted {
                application_id: application.id,
                project_id,
                applicant: actor.id,
            }],
            notifications: vec![Notification::new(
                project.product_owner,
                format!("New application for \"{}\"", project.title),
            )
            .with_link(format!("/projects/{}/applications", project.id))],
            value: application,
        })
    }

    /// Decide on an application as the project's product owner
    ///
    /// Approval only grants the applicant the right to join; membership is
    /// mutated exclusively by [`LifecycleEngine::join_project`]. Repeating
    /// the identical decision is an idempotent no-op.
    pub async fn review_application(
        &self,
        actor: &ActorContext,
        application_id: ApplicationId,
        decision: ApplicationStatus,
    ) -> DomainResult<Outcome<Application>> {
        if decision == ApplicationStatus::Pending {
            return Err(DomainError::Validation(
                "decision must be Approved or Rejected".to_string(),
            ));
        }
        let mut application = self.load_application(application_id).await?;
        let project = self.load_project(application.project_id).await?;
        if actor.role != Role::Admin && project.product_owner != actor.id {
            return Err(DomainError::NotOwnerOfProject {
                project_id: project.id.to_string(),
            });
        }

        if application.status == decision {
            return Ok(Outcome::quiet(application));
        }
        application.status = transition(application.status, decision)?;
        let expected = application.version;
        let application = self.applications.update(application, expected).await?;
        info!(
            application = %application.id,
            decision = decision.name(),
            actor = %actor.id,
            "application reviewed"
        );

        let message = match decision {
            ApplicationStatus::Approved => format!(
                "Your application for \"{}\" was approved; you may now join",
                project.title
            ),
            _ => format!("Your application for \"{}\" was rejected", project.title),
        };

        Ok(Outcome {
            events: vec![LifecycleEvent::ApplicationReviewed {
                application_id: application.id,
                project_id: project.id,
                applicant: application.applicant,
                decision,
            }],
            notifications: vec![
                Notification::new(application.applicant, message)
                    .with_link(format!("/projects/{}", project.id)),
            ],
            value: application,
        })
    }

    /// Join a project after an approved application
    ///
    /// One atomic unit: the membership mutation plus the rejection of
    /// every other actionable application by the same applicant within
    /// the assignment. Sibling rejections are committed first and the
    /// membership last, so an aborted write never leaves the applicant on
    /// the roster with siblings still open; already-rejected siblings are
    /// restored when a later write aborts. Not idempotent - a second call
    /// fails with `AlreadyAssigned` and must not re-run the side effects.
    pub async fn join_project(
        &self,
        actor: &ActorContext,
        application_id: ApplicationId,
    ) -> DomainResult<Outcome<Project>> {
        let application = self.load_application(application_id).await?;
        if application.applicant != actor.id {
            return Err(DomainError::unauthorized(
                "only the applicant may join from their application",
            ));
        }
        if application.status != ApplicationStatus::Approved {
            return Err(DomainError::NotApproved {
                application_id: application_id.to_string(),
            });
        }

        let mut project = self.load_project(application.project_id).await?;
        self.ensure_unassigned(actor.id, project.assignment_id)
            .await?;
        self.require(actor, &project, Capability::Join).await?;
        capacity::check_capacity(&project)?;

        // Version-checked touch of the winning application: a review that
        // committed after our read surfaces here as a retryable conflict
        // instead of a join on a stale approval.
        let expected = application.version;
        let application = self.applications.update(application, expected).await?;

        // Reject every other actionable application by this applicant in
        // the same assignment, upholding the one-membership invariant.
        let assignment_projects: HashSet<ProjectId> = self
            .projects
            .by_assignment(project.assignment_id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let siblings: Vec<Application> = self
            .applications
            .by_applicant(actor.id)
            .await?
            .into_iter()
            .filter(|s| {
                s.id != application.id
                    && s.is_actionable()
                    && assignment_projects.contains(&s.project_id)
            })
            .collect();

        let mut rejected: Vec<(Application, ApplicationStatus)> = Vec::new();
        for mut sibling in siblings {
            let previous = sibling.status;
            sibling.status = ApplicationStatus::Rejected;
            let expected = sibling.version;
            match self.applications.update(sibling, expected).await {
                Ok(committed) => rejected.push((committed, previous)),
                Err(err) => {
                    self.restore_applications(&rejected).await;
                    return Err(err.into());
                }
            }
        }

        project.members.insert(actor.id);
        project.updated_at = Utc::now();
        let expected = project.version;
        let project = match self.projects.update(project, expected).await {
            Ok(committed) => committed,
            Err(err) => {
                self.restore_applications(&rejected).await;
                return Err(err.into());
            }
        };

        let mut events = vec![LifecycleEvent::UserJoined {
            project_id: project.id,
            user_id: actor.id,
        }];
        let mut notifications = vec![Notification::new(
            project.product_owner,
            format!("A new member joined \"{}\"", project.title),
        )
        .with_link(format!("/projects/{}", project.id))];
        for (sibling, _) in &rejected {
            events.push(LifecycleEvent::ApplicationAutoRejected {
                application_id: sibling.id,
                project_id: sibling.project_id,
                applicant: actor.id,
            });
            notifications.push(Notification::new(
                actor.id,
                "Your other applications in this assignment were closed".to_string(),
            ));
        }
        info!(project = %project.id, user = %actor.id, "user joined project");

        Ok(Outcome {
            value: project,
            events,
            notifications,
        })
    }

    /// Roll back sibling rejections after an aborted join, best-effort
    async fn restore_applications(&self, rejected: &[(Application, ApplicationStatus)]) {
        for (committed, previous) in rejected {
            let mut restored = committed.clone();
            restored.status = *previous;
            if let Err(err) = self.applications.update(restored, committed.version).await {
                warn!(
                    application = %committed.id,
                    %err,
                    "failed to restore application after aborted join"
                );
            }
        }
    }

    // Reviews

    /// Record or revise a reviewer's judgement on a project
    ///
    /// At most one review per (project, reviewer); recording again
    /// upserts.
    pub async fn upsert_review(
        &self,
        actor: &ActorContext,
        project_id: ProjectId,
        status: ReviewStatus,
        comment: Option<String>,
    ) -> DomainResult<Outcome<Review>> {
        let project = self.load_visible_project(actor, project_id).await?;
        self.require(actor, &project, Capability::Review).await?;

        let review = match self.reviews.find(project_id, actor.id).await? {
            Some(mut existing) => {
                existing.revise(status, comment);
                existing
            }
            None => Review::new(project_id, actor.id, status, comment),
        };
        self.reviews.upsert(review.clone()).await?;
        info!(project = %project_id, reviewer = %actor.id, "review recorded");

        Ok(Outcome {
            events: vec![LifecycleEvent::ReviewRecorded {
                project_id,
                reviewer: actor.id,
            }],
            notifications: vec![Notification::new(
                project.product_owner,
                format!("\"{}\" received a review", project.title),
            )
            .with_link(format!("/projects/{}", project.id))],
            value: review,
        })
    }

    // Queries

    /// Projects under an assignment the actor may view
    ///
    /// Visibility is enforced here, at the query boundary: a project the
    /// actor cannot view is absent from the result, not redacted.
    pub async fn list_projects(
        &self,
        actor: &ActorContext,
        assignment_id: AssignmentId,
    ) -> DomainResult<Vec<Project>> {
        let projects = self.projects.by_assignment(assignment_id).await?;

        let mut creator_roles: HashMap<UserId, Option<Role>> = HashMap::new();
        for project in &projects {
            if !creator_roles.contains_key(&project.created_by) {
                let role = self.roles.role_of(project.created_by).await?;
                creator_roles.insert(project.created_by, role);
            }
        }

        Ok(policy::visible_projects(actor, projects, |creator| {
            creator_roles.get(creator).copied().flatten()
        }))
    }

    /// Load one project the actor may view
    pub async fn get_project(
        &self,
        actor: &ActorContext,
        project_id: ProjectId,
    ) -> DomainResult<Project> {
        self.load_visible_project(actor, project_id).await
    }
}
