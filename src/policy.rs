//! Authorization policy: pure capability computation
//!
//! Capabilities are computed per (actor, project) from a data-driven
//! role table plus situational rules for ownership, membership and
//! publication, evaluated in a fixed precedence: Admin, then
//! creator/product-owner, then Teacher, then everyone else. Nothing here
//! touches storage; the engine resolves roles and feeds them in.
//!
//! Visibility is enforced at the query boundary: list results never
//! contain a project the actor cannot view, and single-entity loads answer
//! "not found" rather than "forbidden" when visibility itself is denied.

use crate::actor::{ActorContext, Role};
use crate::entity::UserId;
use crate::project::{Project, ProjectStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An atomic permission computed per actor per project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// See the project and its details
    View,
    /// Edit project fields (further restricted by the editability rule)
    Edit,
    /// Submit an application
    Apply,
    /// Join after an approved application
    Join,
    /// Record a review
    Review,
    /// Drive the status state machine
    ChangeStatus,
    /// Publish approved projects
    Publish,
    /// Remove a member from the roster
    RemoveMember,
    /// Import a project into another assignment
    Import,
}

/// Everything; granted to admins unconditionally
pub const ALL_CAPABILITIES: &[Capability] = &[
    Capability::View,
    Capability::Edit,
    Capability::Apply,
    Capability::Join,
    Capability::Review,
    Capability::ChangeStatus,
    Capability::Publish,
    Capability::RemoveMember,
    Capability::Import,
];

/// Role-granted capabilities, before situational rules
///
/// A plain data table so every (role, status, ownership) combination is
/// trivially unit-testable.
pub fn role_capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => ALL_CAPABILITIES,
        Role::Teacher => &[
            Capability::View,
            Capability::Review,
            Capability::ChangeStatus,
            Capability::Publish,
            Capability::RemoveMember,
            Capability::Import,
        ],
        Role::Student | Role::Researcher => &[Capability::Apply, Capability::Join],
    }
}

/// Whether the actor may see the project at all
///
/// `creator_role` is the current role of the project's creator; teacher-
/// and researcher-authored projects are visible pre-publication to any
/// verified actor.
pub fn can_view(actor: &ActorContext, project: &Project, creator_role: Option<Role>) -> bool {
    if actor.role == Role::Admin || actor.role == Role::Teacher {
        return true;
    }
    if project.is_owned_by(&actor.id) || project.is_member(&actor.id) {
        return true;
    }
    if !actor.verified {
        return false;
    }
    project.status == ProjectStatus::Published
        || creator_role.is_some_and(|role| role.authors_browsable_drafts())
}

/// Compute the full capability set for an actor on a project
pub fn capabilities(
    actor: &ActorContext,
    project: &Project,
    creator_role: Option<Role>,
) -> BTreeSet<Capability> {
    if actor.role == Role::Admin {
        return ALL_CAPABILITIES.iter().copied().collect();
    }

    let mut set = BTreeSet::new();
    if !can_view(actor, project, creator_role) {
        // Invisible projects grant nothing; queries must filter them out.
        return set;
    }
    set.insert(Capability::View);

    if project.is_owned_by(&actor.id) {
        // The owner's ChangeStatus is limited to the resubmit transition;
        // the engine enforces that restriction.
        set.insert(Capability::Edit);
        set.insert(Capability::ChangeStatus);
        set.insert(Capability::RemoveMember);
    }

    for cap in role_capabilities(actor.role) {
        set.insert(*cap);
    }

    // Nobody applies to their own project or to one they already sit on.
    if project.is_owned_by(&actor.id) || project.is_member(&actor.id) {
        set.remove(&Capability::Apply);
        set.remove(&Capability::Join);
    }

    set
}

/// Convenience: does the actor hold one capability on the project
pub fn can(
    actor: &ActorContext,
    project: &Project,
    creator_role: Option<Role>,
    capability: Capability,
) -> bool {
    capabilities(actor, project, creator_role).contains(&capability)
}

/// Query-boundary filter: keep only the projects the actor may view
pub fn visible_projects<F>(
    actor: &ActorContext,
    projects: impl IntoIterator<Item = Project>,
    creator_role: F,
) -> Vec<Project>
where
    F: Fn(&UserId) -> Option<Role>,
{
    projects
        .into_iter()
        .filter(|project| can_view(actor, project, creator_role(&project.created_by)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AssignmentId;
    use test_case::test_case;

    fn project_with(status: ProjectStatus, creator_role: Role) -> Project {
        let mut project = Project::new(
            AssignmentId::new(),
            "Sample",
            "",
            3,
            UserId::new(),
            creator_role,
        );
        project.status = status;
        project
    }

    #[test]
    fn admin_gets_everything() {
        let project = project_with(ProjectStatus::Pending, Role::Student);
        let admin = ActorContext::new(UserId::new(), Role::Admin);

        let set = capabilities(&admin, &project, Some(Role::Student));
        assert_eq!(set.len(), ALL_CAPABILITIES.len());
    }

    #[test_case(ProjectStatus::Pending, false ; "pending is hidden")]
    #[test_case(ProjectStatus::Approved, false ; "approved is hidden")]
    #[test_case(ProjectStatus::Published, true ; "published is visible")]
    fn student_visibility_tracks_publication(status: ProjectStatus, expected: bool) {
        let project = project_with(status, Role::Student);
        let stranger = ActorContext::new(UserId::new(), Role::Student);

        assert_eq!(can_view(&stranger, &project, Some(Role::Student)), expected);
    }

    #[test_case(Role::Teacher ; "teacher authored")]
    #[test_case(Role::Researcher ; "researcher authored")]
    fn staff_authored_projects_are_visible_pre_publication(creator_role: Role) {
        let project = project_with(ProjectStatus::Pending, creator_role);
        let stranger = ActorContext::new(UserId::new(), Role::Student);

        assert!(can_view(&stranger, &project, Some(creator_role)));
    }

    #[test]
    fn admin_authored_drafts_follow_the_ordinary_visibility_rule() {
        let project = project_with(ProjectStatus::Pending, Role::Admin);
        let stranger = ActorContext::new(UserId::new(), Role::Student);

        assert!(!can_view(&stranger, &project, Some(Role::Admin)));
    }

    #[test]
    fn invisible_projects_grant_no_capabilities() {
        let project = project_with(ProjectStatus::Pending, Role::Student);
        let stranger = ActorContext::new(UserId::new(), Role::Student);

        assert!(capabilities(&stranger, &project, Some(Role::Student)).is_empty());
    }

    #[test]
    fn owner_never_applies_to_own_project() {
        let mut project = project_with(ProjectStatus::Published, Role::Student);
        let owner = ActorContext::new(project.created_by, Role::Student);
        project.status = ProjectStatus::Published;

        let set = capabilities(&owner, &project, Some(Role::Student));
        assert!(set.contains(&Capability::Edit));
        assert!(set.contains(&Capability::ChangeStatus));
        assert!(set.contains(&Capability::RemoveMember));
        assert!(!set.contains(&Capability::Apply));
    }

    #[test]
    fn teacher_reviews_and_publishes_but_does_not_apply() {
        let project = project_with(ProjectStatus::Pending, Role::Student);
        let teacher = ActorContext::new(UserId::new(), Role::Teacher);

        let set = capabilities(&teacher, &project, Some(Role::Student));
        assert!(set.contains(&Capability::View));
        assert!(set.contains(&Capability::Review));
        assert!(set.contains(&Capability::ChangeStatus));
        assert!(set.contains(&Capability::Publish));
        assert!(!set.contains(&Capability::Apply));
        assert!(!set.contains(&Capability::Edit));
    }

    #[test]
    fn member_views_unpublished_project_but_cannot_reapply() {
        let mut project = project_with(ProjectStatus::Approved, Role::Student);
        let member = UserId::new();
        project.members.insert(member);
        let actor = ActorContext::new(member, Role::Student);

        let set = capabilities(&actor, &project, Some(Role::Student));
        assert!(set.contains(&Capability::View));
        assert!(!set.contains(&Capability::Apply));
        assert!(!set.contains(&Capability::Join));
    }

    #[test]
    fn unverified_actors_see_only_what_they_own() {
        let project = project_with(ProjectStatus::Published, Role::Teacher);
        let mut actor = ActorContext::new(UserId::new(), Role::Student);
        actor.verified = false;

        assert!(!can_view(&actor, &project, Some(Role::Teacher)));
    }

    #[test]
    fn visible_projects_filters_at_the_query_boundary() {
        let hidden = project_with(ProjectStatus::Pending, Role::Student);
        let published = project_with(ProjectStatus::Published, Role::Student);
        let staff_authored = project_with(ProjectStatus::Pending, Role::Teacher);
        let stranger = ActorContext::new(UserId::new(), Role::Student);

        let staff_creator = staff_authored.created_by;
        let visible = visible_projects(
            &stranger,
            vec![hidden.clone(), published.clone(), staff_authored.clone()],
            |creator| {
                if *creator == staff_creator {
                    Some(Role::Teacher)
                } else {
                    Some(Role::Student)
                }
            },
        );

        let ids: Vec<_> = visible.iter().map(|p| p.id).collect();
        assert!(!ids.contains(&hidden.id));
        assert!(ids.contains(&published.id));
        assert!(ids.contains(&staff_authored.id));
    }
}
