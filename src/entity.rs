//! Typed entity identifiers and aggregate lifecycle traits
//!
//! Every domain entity is addressed by a phantom-typed [`EntityId`] so that
//! a project id can never be confused with an application id at compile
//! time. Relationships between entities are plain id references resolved
//! through the store traits, never live object pointers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// A typed entity ID using phantom types for type safety
///
/// IDs are globally unique and persistent. The phantom type parameter
/// ensures that IDs for different entity types cannot be mixed up.
///
/// # Examples
///
/// ```rust
/// use coursematch_domain::{EntityId, ProjectMarker, UserMarker};
///
/// let project_id = EntityId::<ProjectMarker>::new();
/// let user_id = EntityId::<UserMarker>::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: EntityId<ProjectMarker> = user_id; // ERROR!
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> schemars::JsonSchema for EntityId<T> {
    fn schema_name() -> String {
        "EntityId".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        gen.subschema_for::<Uuid>()
    }
}

/// Marker trait for aggregate roots
///
/// Aggregates carry a version counter used for optimistic concurrency:
/// stores reject a write whose expected version does not match the
/// committed one, which is what serializes concurrent check-then-act
/// sequences such as two simultaneous joins against one project.
pub trait AggregateRoot: Sized {
    /// The type of ID for this aggregate
    type Id: Copy + Eq + Send + Sync;

    /// Get the aggregate's ID
    fn id(&self) -> Self::Id;

    /// Get the aggregate's version for optimistic concurrency
    fn version(&self) -> u64;

    /// Increment the version
    fn increment_version(&mut self);
}

// Marker types for entity IDs

/// Marker for course entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseMarker;

/// Marker for assignment entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentMarker;

/// Marker for project entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectMarker;

/// Marker for application entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationMarker;

/// Marker for review entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewMarker;

/// Marker for deadline entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeadlineMarker;

/// Marker for user identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserMarker;

/// Identifier for a course
pub type CourseId = EntityId<CourseMarker>;
/// Identifier for an assignment
pub type AssignmentId = EntityId<AssignmentMarker>;
/// Identifier for a project
pub type ProjectId = EntityId<ProjectMarker>;
/// Identifier for an application
pub type ApplicationId = EntityId<ApplicationMarker>;
/// Identifier for a review
pub type ReviewId = EntityId<ReviewMarker>;
/// Identifier for a deadline
pub type DeadlineId = EntityId<DeadlineMarker>;
/// Identifier for a user
pub type UserId = EntityId<UserMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_uniqueness() {
        let id1 = ProjectId::new();
        let id2 = ProjectId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_uuid().is_nil());
    }

    #[test]
    fn entity_id_from_uuid_round_trip() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);

        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(format!("{id}"), format!("{uuid}"));
    }

    #[test]
    fn entity_id_serde() {
        let original = ApplicationId::new();
        let json = serde_json::to_string(&original).unwrap();
        let deserialized: ApplicationId = serde_json::from_str(&json).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn entity_id_as_map_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        let id1 = ProjectId::new();
        let id2 = ProjectId::new();

        map.insert(id1, "alpha");
        map.insert(id2, "beta");

        assert_eq!(map.get(&id1), Some(&"alpha"));
        assert_eq!(map.len(), 2);
    }
}
