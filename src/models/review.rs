//! The PENDING -> APPROVED | REJECTED state machine shared by dish
//! suggestions and ingredient requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Action;
use super::status::ReviewStatus;
use super::user::User;
use crate::error::{KitchenError, Result};
use crate::validation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    status: ReviewStatus,
    reviewed_by: Option<i64>,
    reviewed_at: Option<DateTime<Utc>>,
    feedback: Option<String>,
}

impl Default for Review {
    fn default() -> Self {
        Self::pending()
    }
}

impl Review {
    pub fn pending() -> Self {
        Self {
            status: ReviewStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            feedback: None,
        }
    }

    /// Rebuilds a review from stored columns.
    pub(crate) fn restore(
        status: ReviewStatus,
        reviewed_by: Option<i64>,
        reviewed_at: Option<DateTime<Utc>>,
        feedback: Option<String>,
    ) -> Self {
        Self {
            status,
            reviewed_by,
            reviewed_at,
            feedback,
        }
    }

    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    pub fn reviewed_by(&self) -> Option<i64> {
        self.reviewed_by
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReviewStatus::Pending
    }

    pub(crate) fn approve(&mut self, reviewer: &User, action: Action, subject: &str) -> Result<()> {
        let reviewer_id = self.check_transition(reviewer, action, subject)?;
        self.settle(ReviewStatus::Approved, reviewer_id, None);
        Ok(())
    }

    pub(crate) fn reject(
        &mut self,
        reviewer: &User,
        action: Action,
        subject: &str,
        feedback: &str,
    ) -> Result<()> {
        let reviewer_id = self.check_transition(reviewer, action, subject)?;
        let feedback = Some(feedback.trim().to_string()).filter(|f| !f.is_empty());
        self.settle(ReviewStatus::Rejected, reviewer_id, feedback);
        Ok(())
    }

    // Authorization first, then the state precondition.
    fn check_transition(&self, reviewer: &User, action: Action, subject: &str) -> Result<i64> {
        reviewer.authorize(action)?;
        if self.status != ReviewStatus::Pending {
            return Err(KitchenError::illegal_state(format!(
                "Only pending {}s can be reviewed; this one is {}",
                subject, self.status
            )));
        }
        validation::require_id(reviewer.id, "Reviewer")
    }

    fn settle(&mut self, status: ReviewStatus, reviewer_id: i64, feedback: Option<String>) {
        self.status = status;
        self.reviewed_by = Some(reviewer_id);
        self.reviewed_at = Some(Utc::now());
        self.feedback = feedback;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(role: Role, id: Option<i64>) -> User {
        let mut user = User::new("Test", "User", "test@kitchen.com", "hash", role).unwrap();
        user.id = id;
        user
    }

    #[test]
    fn test_approve_sets_reviewer_and_time() {
        let mut review = Review::pending();
        review
            .approve(&user(Role::HeadChef, Some(1)), Action::ReviewDishSuggestion, "dish suggestion")
            .unwrap();

        assert_eq!(review.status(), ReviewStatus::Approved);
        assert_eq!(review.reviewed_by(), Some(1));
        assert!(review.reviewed_at().is_some());
        assert!(review.feedback().is_none());
    }

    #[test]
    fn test_reject_records_feedback() {
        let mut review = Review::pending();
        review
            .reject(
                &user(Role::HeadChef, Some(1)),
                Action::ReviewDishSuggestion,
                "dish suggestion",
                "  Too salty ",
            )
            .unwrap();

        assert_eq!(review.status(), ReviewStatus::Rejected);
        assert_eq!(review.feedback(), Some("Too salty"));
    }

    #[test]
    fn test_non_head_chef_is_unauthorized() {
        let mut review = Review::pending();
        let result = review.approve(
            &user(Role::SousChef, Some(2)),
            Action::ReviewDishSuggestion,
            "dish suggestion",
        );
        assert!(matches!(result, Err(KitchenError::Unauthorized(_))));
        assert!(review.is_pending());
    }

    #[test]
    fn test_second_transition_is_illegal() {
        let chef = user(Role::HeadChef, Some(1));
        let mut review = Review::pending();
        review
            .approve(&chef, Action::ReviewIngredientRequest, "ingredient request")
            .unwrap();

        let again = review.reject(&chef, Action::ReviewIngredientRequest, "ingredient request", "no");
        assert!(matches!(again, Err(KitchenError::IllegalState(_))));
        assert_eq!(review.status(), ReviewStatus::Approved);
    }

    #[test]
    fn test_transient_reviewer_is_invalid() {
        let mut review = Review::pending();
        let result = review.approve(
            &user(Role::HeadChef, None),
            Action::ReviewDishSuggestion,
            "dish suggestion",
        );
        assert!(matches!(result, Err(KitchenError::InvalidArgument(_))));
        assert!(review.is_pending());
    }
}
