//! Actor identity and roles
//!
//! Authentication is an external collaborator: the web layer resolves the
//! caller's credential into an [`ActorContext`] and threads it explicitly
//! through every engine call. There is no ambient current-actor state, and
//! the role is resolved fresh per operation because visibility rules depend
//! on the current role and verification state.

use crate::entity::UserId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Role of an actor, mapped to a fixed capability set by the policy module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Role {
    /// Enrolled student
    Student,
    /// Course staff with review and publication authority
    Teacher,
    /// Researcher; may author projects visible pre-publication
    Researcher,
    /// Full, unconditional capability set
    Admin,
}

impl Role {
    /// Whether projects authored under this role are browsable before
    /// publication
    ///
    /// Only teacher- and researcher-authored proposals are; admin-authored
    /// drafts follow the ordinary visibility rule.
    pub fn authors_browsable_drafts(&self) -> bool {
        matches!(self, Role::Teacher | Role::Researcher)
    }
}

/// Resolved identity of the caller for one operation
///
/// Produced by the external authentication collaborator; the engine never
/// authenticates, it only authorizes given a resolved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActorContext {
    /// The actor's identity
    pub id: UserId,
    /// The actor's current role
    pub role: Role,
    /// Whether the identity has been verified by the authenticator
    pub verified: bool,
}

impl ActorContext {
    /// Create a context for a verified actor
    pub fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            verified: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_teacher_and_researcher_drafts_are_browsable() {
        assert!(!Role::Student.authors_browsable_drafts());
        assert!(Role::Teacher.authors_browsable_drafts());
        assert!(Role::Researcher.authors_browsable_drafts());
        assert!(!Role::Admin.authors_browsable_drafts());
    }

    #[test]
    fn actor_context_defaults_to_verified() {
        let actor = ActorContext::new(UserId::new(), Role::Student);
        assert!(actor.verified);
    }
}
