//! Project aggregate and its status state machine
//!
//! A project is a proposed piece of work tied to an assignment, with an
//! evolving approval status and a bounded member roster. Edits are
//! partitioned into core fields, frozen once the project leaves the
//! editable statuses, and asset fields, which stay patchable.

use crate::actor::Role;
use crate::entity::{AggregateRoot, AssignmentId, ProjectId, UserId};
use crate::state_machine::{State, StateTransitions};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Approval status of a project
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
pub enum ProjectStatus {
    /// Freshly proposed, awaiting a teacher's verdict
    Pending,
    /// Sent back by a teacher for changes
    NeedsRevision,
    /// Resubmitted by the owner after revision
    Revised,
    /// Accepted by a teacher, not yet visible to applicants
    Approved,
    /// Visible to applicants; terminal for owner edits
    Published,
    /// Turned down; terminal
    Rejected,
}

impl State for ProjectStatus {
    fn name(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "Pending",
            ProjectStatus::NeedsRevision => "NeedsRevision",
            ProjectStatus::Revised => "Revised",
            ProjectStatus::Approved => "Approved",
            ProjectStatus::Published => "Published",
            ProjectStatus::Rejected => "Rejected",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Published | ProjectStatus::Rejected)
    }
}

impl StateTransitions for ProjectStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use ProjectStatus::*;

        match self {
            Pending => vec![Approved, NeedsRevision, Rejected],
            NeedsRevision => vec![Revised],
            Revised => vec![Approved, NeedsRevision, Rejected],
            Approved => vec![Published],
            Published => vec![],
            Rejected => vec![],
        }
    }
}

impl ProjectStatus {
    /// Whether core fields are still editable by the owner in this status
    pub fn core_editable(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Pending | ProjectStatus::NeedsRevision | ProjectStatus::Revised
        )
    }
}

/// A proposed piece of work under an assignment with a bounded roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The project's identity
    pub id: ProjectId,
    /// The assignment this project belongs to
    pub assignment_id: AssignmentId,
    /// Current approval status
    pub status: ProjectStatus,

    // Core fields, frozen once the project leaves the editable statuses
    /// Project title
    pub title: String,
    /// Project description
    pub description: String,
    /// Link to the code repository
    pub repository_url: Option<String>,
    /// Link to the planning board
    pub board_url: Option<String>,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Membership capacity
    pub team_size: usize,

    // Asset fields, patchable in any status
    /// Background image shown on the project card
    pub background_url: Option<String>,
    /// Additional links
    pub extra_links: Vec<String>,

    /// The actor that created the project
    pub created_by: UserId,
    /// The actor currently accountable for the project
    pub product_owner: UserId,
    /// Member roster; never exceeds `team_size`
    pub members: IndexSet<UserId>,

    /// When this project was created
    pub created_at: DateTime<Utc>,
    /// When this project was last updated
    pub updated_at: DateTime<Utc>,
    /// Version for optimistic concurrency
    pub version: u64,
}

impl AggregateRoot for Project {
    type Id = ProjectId;

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

impl Project {
    /// Create a new pending project under an assignment
    ///
    /// The creator starts as product owner. Staff creators are not seeded
    /// into the roster; student and researcher creators are, since they
    /// work on the project themselves.
    pub fn new(
        assignment_id: AssignmentId,
        title: impl Into<String>,
        description: impl Into<String>,
        team_size: usize,
        created_by: UserId,
        creator_role: Role,
    ) -> Self {
        let now = Utc::now();
        let mut members = IndexSet::new();
        if matches!(creator_role, Role::Student | Role::Researcher) {
            members.insert(created_by);
        }
        Self {
            id: ProjectId::new(),
            assignment_id,
            status: ProjectStatus::Pending,
            title: title.into(),
            description: description.into(),
            repository_url: None,
            board_url: None,
            tags: Vec::new(),
            team_size,
            background_url: None,
            extra_links: Vec::new(),
            created_by,
            product_owner: created_by,
            members,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Whether the user is on the roster
    pub fn is_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    /// Whether the user created the project or currently owns it
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.created_by == *user || self.product_owner == *user
    }

    /// Clone this project's content into a new pending project under
    /// another assignment, with an empty roster and the importer as owner
    pub fn cloned_into(&self, target: AssignmentId, importer: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            assignment_id: target,
            status: ProjectStatus::Pending,
            title: self.title.clone(),
            description: self.description.clone(),
            repository_url: self.repository_url.clone(),
            board_url: self.board_url.clone(),
            tags: self.tags.clone(),
            team_size: self.team_size,
            background_url: self.background_url.clone(),
            extra_links: self.extra_links.clone(),
            created_by: importer,
            product_owner: importer,
            members: IndexSet::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Apply an update, honoring the core/asset field partition
    ///
    /// Core fields are assigned only while the status is editable; asset
    /// fields always. Instead of silently skipping frozen fields, the
    /// returned report says exactly which fields were applied and which
    /// were skipped, so callers can assert on it.
    pub fn apply_update(&mut self, update: ProjectUpdate) -> UpdateReport {
        let mut report = UpdateReport::default();
        let core_editable = self.status.core_editable();

        macro_rules! core_field {
            ($field:ident) => {
                if let Some(value) = update.$field {
                    if core_editable {
                        self.$field = value;
                        report.applied.push(stringify!($field));
                    } else {
                        report.skipped.push(stringify!($field));
                    }
                }
            };
        }
        macro_rules! asset_field {
            ($field:ident) => {
                if let Some(value) = update.$field {
                    self.$field = value;
                    report.applied.push(stringify!($field));
                }
            };
        }

        core_field!(title);
        core_field!(description);
        core_field!(repository_url);
        core_field!(board_url);
        core_field!(tags);
        core_field!(team_size);
        asset_field!(background_url);
        asset_field!(extra_links);

        if !report.applied.is_empty() {
            self.updated_at = Utc::now();
        }
        report
    }
}

/// Partial update for a project; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// New title (core)
    pub title: Option<String>,
    /// New description (core)
    pub description: Option<String>,
    /// New repository link (core)
    pub repository_url: Option<Option<String>>,
    /// New board link (core)
    pub board_url: Option<Option<String>>,
    /// New tags (core)
    pub tags: Option<Vec<String>>,
    /// New team size (core)
    pub team_size: Option<usize>,
    /// New background image (asset)
    pub background_url: Option<Option<String>>,
    /// New extra links (asset)
    pub extra_links: Option<Vec<String>>,
}

/// Which fields an update applied and which it skipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct UpdateReport {
    /// Fields that were assigned
    pub applied: Vec<&'static str>,
    /// Fields that were requested but frozen in the current status
    pub skipped: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::transition;
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        Project::new(
            AssignmentId::new(),
            "Peer review tool",
            "A tool for double-blind peer review",
            3,
            UserId::new(),
            Role::Student,
        )
    }

    #[test]
    fn creator_is_seeded_as_member_for_students() {
        let p = project();
        assert!(p.is_member(&p.created_by));
        assert_eq!(p.members.len(), 1);
    }

    #[test]
    fn staff_creators_stay_off_the_roster() {
        let p = Project::new(
            AssignmentId::new(),
            "Imported",
            "",
            3,
            UserId::new(),
            Role::Teacher,
        );
        assert!(p.members.is_empty());
        assert!(p.is_owned_by(&p.created_by));
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use ProjectStatus::*;

        assert!(transition(Pending, Approved).is_ok());
        assert!(transition(Pending, NeedsRevision).is_ok());
        assert!(transition(Pending, Rejected).is_ok());
        assert!(transition(NeedsRevision, Revised).is_ok());
        assert!(transition(Revised, Approved).is_ok());
        assert!(transition(Revised, NeedsRevision).is_ok());
        assert!(transition(Revised, Rejected).is_ok());
        assert!(transition(Approved, Published).is_ok());

        // Published is reachable only from Approved
        assert!(transition(Pending, Published).is_err());
        assert!(transition(NeedsRevision, Published).is_err());
        assert!(transition(Revised, Published).is_err());

        // Terminal states admit nothing
        assert!(transition(Published, Pending).is_err());
        assert!(transition(Rejected, Pending).is_err());
    }

    #[test]
    fn update_applies_core_fields_while_editable() {
        let mut p = project();
        let report = p.apply_update(ProjectUpdate {
            title: Some("New title".to_string()),
            team_size: Some(5),
            ..Default::default()
        });

        assert_eq!(report.applied, vec!["title", "team_size"]);
        assert!(report.skipped.is_empty());
        assert_eq!(p.title, "New title");
        assert_eq!(p.team_size, 5);
    }

    #[test]
    fn update_skips_core_fields_once_published() {
        let mut p = project();
        p.status = ProjectStatus::Published;

        let report = p.apply_update(ProjectUpdate {
            title: Some("Late edit".to_string()),
            background_url: Some(Some("https://img.example/bg.png".to_string())),
            ..Default::default()
        });

        assert_eq!(report.applied, vec!["background_url"]);
        assert_eq!(report.skipped, vec!["title"]);
        assert_eq!(p.title, "Peer review tool");
        assert_eq!(
            p.background_url,
            Some("https://img.example/bg.png".to_string())
        );
    }

    #[test]
    fn cloned_into_resets_lifecycle_state() {
        let mut p = project();
        p.status = ProjectStatus::Published;
        p.members.insert(UserId::new());

        let importer = UserId::new();
        let target = AssignmentId::new();
        let clone = p.cloned_into(target, importer);

        assert_eq!(clone.status, ProjectStatus::Pending);
        assert_eq!(clone.assignment_id, target);
        assert_eq!(clone.created_by, importer);
        assert_eq!(clone.product_owner, importer);
        assert!(clone.members.is_empty());
        assert_eq!(clone.title, p.title);
        assert_eq!(clone.version, 0);
    }
}
