//! Review documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::StoreError;
use crate::store::{parse_id, Document};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub review: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub tour: Uuid,
    pub user: Uuid,
}

impl Document for Review {
    const NAME: &'static str = "review";

    fn id(&self) -> Uuid {
        self.id
    }

    // One review per user and tour.
    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("tour, user", format!("{}, {}", self.tour, self.user))]
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(length(min = 1, message = "Review can not be empty!"))]
    pub review: Option<String>,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: Option<f64>,

    pub tour: Option<String>,

    pub user: Option<String>,
}

impl ReviewInput {
    pub fn into_review(self) -> Result<Review, StoreError> {
        self.validate()?;

        let mut missing = Vec::new();
        if self.review.as_deref().map(str::trim).unwrap_or("").is_empty() {
            missing.push("Review can not be empty!".to_string());
        }
        if self.rating.is_none() {
            missing.push("Review must have a rating".to_string());
        }
        if self.tour.is_none() {
            missing.push("Review must belong to a tour.".to_string());
        }
        if self.user.is_none() {
            missing.push("Review must belong to a user".to_string());
        }
        if !missing.is_empty() {
            return Err(StoreError::Validation(missing));
        }

        Ok(Review {
            id: Uuid::new_v4(),
            review: self.review.unwrap_or_default().trim().to_string(),
            rating: self.rating.unwrap_or_default(),
            created_at: Utc::now(),
            tour: parse_id(self.tour.as_deref().unwrap_or_default())?,
            user: parse_id(self.user.as_deref().unwrap_or_default())?,
        })
    }

    /// Reviews keep their tour and author; only text and rating change.
    pub fn apply(self, review: &mut Review) -> Result<(), StoreError> {
        self.validate()?;

        if let Some(text) = self.review {
            review.review = text.trim().to_string();
        }
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_review() {
        let tour = Uuid::new_v4();
        let user = Uuid::new_v4();
        let review = ReviewInput {
            review: Some("Amazing trip!".into()),
            rating: Some(5.0),
            tour: Some(tour.to_string()),
            user: Some(user.to_string()),
        }
        .into_review()
        .unwrap();

        assert_eq!(review.tour, tour);
        assert_eq!(review.user, user);
    }

    #[test]
    fn test_rating_range() {
        let err = ReviewInput {
            review: Some("Meh".into()),
            rating: Some(7.0),
            tour: Some(Uuid::new_v4().to_string()),
            user: Some(Uuid::new_v4().to_string()),
        }
        .into_review()
        .unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation(vec!["Rating must be between 1 and 5".into()])
        );
    }

    #[test]
    fn test_bad_reference_is_invalid_id() {
        let err = ReviewInput {
            review: Some("Nice".into()),
            rating: Some(4.0),
            tour: Some("5c88fa8cf4afda39709c2955".into()),
            user: Some(Uuid::new_v4().to_string()),
        }
        .into_review()
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidId { .. }));
    }
}
