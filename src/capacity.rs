//! Team-capacity enforcement
//!
//! The check is trivial on purpose; what matters is where it runs. The
//! engine evaluates it inside the same check-then-act unit as the
//! membership mutation, and the project's version check serializes
//! concurrent joins so the roster can never exceed the team size.

use crate::errors::{DomainError, DomainResult};
use crate::project::Project;

/// Whether the project can take one more member
pub fn has_capacity(project: &Project) -> bool {
    project.members.len() < project.team_size
}

/// Remaining seats on the roster
pub fn remaining(project: &Project) -> usize {
    project.team_size.saturating_sub(project.members.len())
}

/// Fail with [`DomainError::TeamFull`] when the roster is at capacity
pub fn check_capacity(project: &Project) -> DomainResult<()> {
    if has_capacity(project) {
        Ok(())
    } else {
        Err(DomainError::TeamFull {
            project_id: project.id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Role;
    use crate::entity::{AssignmentId, UserId};

    #[test]
    fn capacity_counts_down_to_zero() {
        let mut project = Project::new(
            AssignmentId::new(),
            "Sample",
            "",
            2,
            UserId::new(),
            Role::Student,
        );
        assert_eq!(remaining(&project), 1);
        assert!(has_capacity(&project));

        project.members.insert(UserId::new());
        assert_eq!(remaining(&project), 0);
        assert!(check_capacity(&project).is_err());
    }

    #[test]
    fn oversized_roster_saturates() {
        let mut project = Project::new(
            AssignmentId::new(),
            "Sample",
            "",
            1,
            UserId::new(),
            Role::Student,
        );
        project.members.insert(UserId::new());

        assert_eq!(remaining(&project), 0);
        assert!(!has_capacity(&project));
    }
}
