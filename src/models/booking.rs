//! Booking documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::StoreError;
use crate::store::{parse_id, Document};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub tour: Uuid,
    pub user: Uuid,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub paid: bool,
}

impl Document for Booking {
    const NAME: &'static str = "booking";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BookingInput {
    pub tour: Option<String>,

    pub user: Option<String>,

    #[validate(range(min = 0.0, message = "Booking price cannot be negative"))]
    pub price: Option<f64>,

    pub paid: Option<bool>,
}

impl BookingInput {
    pub fn into_booking(self) -> Result<Booking, StoreError> {
        self.validate()?;

        let mut missing = Vec::new();
        if self.tour.is_none() {
            missing.push("Booking must belong to a Tour!".to_string());
        }
        if self.user.is_none() {
            missing.push("Booking must belong to a User!".to_string());
        }
        if self.price.is_none() {
            missing.push("Booking must have a price.".to_string());
        }
        if !missing.is_empty() {
            return Err(StoreError::Validation(missing));
        }

        Ok(Booking {
            id: Uuid::new_v4(),
            tour: parse_id(self.tour.as_deref().unwrap_or_default())?,
            user: parse_id(self.user.as_deref().unwrap_or_default())?,
            price: self.price.unwrap_or_default(),
            created_at: Utc::now(),
            paid: self.paid.unwrap_or(true),
        })
    }

    pub fn apply(self, booking: &mut Booking) -> Result<(), StoreError> {
        self.validate()?;

        if let Some(tour) = self.tour {
            booking.tour = parse_id(&tour)?;
        }
        if let Some(user) = self.user {
            booking.user = parse_id(&user)?;
        }
        if let Some(price) = self.price {
            booking.price = price;
        }
        if let Some(paid) = self.paid {
            booking.paid = paid;
        }
        Ok(())
    }
}
