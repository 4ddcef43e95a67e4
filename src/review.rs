//! Reviews: a reviewer's recorded judgement on a project
//!
//! Separate from the approval status transition. At most one review exists
//! per (project, reviewer) pair; recording again upserts rather than
//! duplicating.

use crate::entity::{ProjectId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verdict of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    /// The reviewer endorses the project
    Approved,
    /// The reviewer asks for changes
    ChangesRequested,
    /// The reviewer rejects the project
    Rejected,
}

/// A reviewer's judgement on a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// The review's identity
    pub id: ReviewId,
    /// The project reviewed
    pub project_id: ProjectId,
    /// The reviewer's identity
    pub reviewer: UserId,
    /// The verdict
    pub status: ReviewStatus,
    /// Optional remarks for the project owner
    pub comment: Option<String>,
    /// When the review was last recorded
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Record a fresh review
    pub fn new(
        project_id: ProjectId,
        reviewer: UserId,
        status: ReviewStatus,
        comment: Option<String>,
    ) -> Self {
        Self {
            id: ReviewId::new(),
            project_id,
            reviewer,
            status,
            comment,
            updated_at: Utc::now(),
        }
    }

    /// Replace the verdict and remarks, keeping the identity
    pub fn revise(&mut self, status: ReviewStatus, comment: Option<String>) {
        self.status = status;
        self.comment = comment;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revise_keeps_identity() {
        let mut review = Review::new(
            ProjectId::new(),
            UserId::new(),
            ReviewStatus::ChangesRequested,
            Some("Trim the scope".to_string()),
        );
        let id = review.id;

        review.revise(ReviewStatus::Approved, None);

        assert_eq!(review.id, id);
        assert_eq!(review.status, ReviewStatus::Approved);
        assert_eq!(review.comment, None);
    }
}
