//! Tour documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::StoreError;
use crate::store::Document;

pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "difficult" => Some(Difficulty::Difficult),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: u64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
}

impl Tour {
    pub fn set_ratings(&mut self, quantity: u64, average: f64) {
        self.ratings_quantity = quantity;
        self.ratings_average = round_rating(average);
    }

    pub fn duration_weeks(&self) -> f64 {
        self.duration as f64 / 7.0
    }
}

impl Document for Tour {
    const NAME: &'static str = "tour";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }

    fn visible(&self) -> bool {
        !self.secret_tour
    }
}

/// Round to one decimal place (4.666 → 4.7).
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// URL slug for a tour name: lowercase, alphanumeric runs joined by `-`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn validate_difficulty(value: &str) -> Result<(), ValidationError> {
    if Difficulty::parse(value).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("difficulty");
        err.message = Some("Difficulty is either: easy, medium, difficult".into());
        Err(err)
    }
}

/// Create / update payload. Every field is optional so the same type serves
/// partial updates; [`TourInput::into_tour`] enforces the required ones.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TourInput {
    #[validate(length(
        min = 10,
        max = 40,
        message = "A tour name must have between 10 and 40 characters"
    ))]
    pub name: Option<String>,

    #[validate(range(min = 1, message = "A tour must last at least one day"))]
    pub duration: Option<u32>,

    #[validate(range(min = 1, message = "A tour group must have at least one member"))]
    pub max_group_size: Option<u32>,

    #[validate(custom = "validate_difficulty")]
    pub difficulty: Option<String>,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,

    pub ratings_quantity: Option<u64>,

    pub price: Option<f64>,

    pub price_discount: Option<f64>,

    pub summary: Option<String>,

    pub description: Option<String>,

    pub image_cover: Option<String>,

    pub images: Option<Vec<String>>,

    pub start_dates: Option<Vec<DateTime<Utc>>>,

    pub secret_tour: Option<bool>,
}

impl TourInput {
    /// Build a new tour, checking required fields and cross-field rules.
    pub fn into_tour(self) -> Result<Tour, StoreError> {
        self.validate()?;

        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("A tour must have a name".to_string());
        }
        if self.duration.is_none() {
            missing.push("A tour must have a duration".to_string());
        }
        if self.max_group_size.is_none() {
            missing.push("A tour must have a group size".to_string());
        }
        if self.difficulty.is_none() {
            missing.push("A tour must have a difficulty".to_string());
        }
        if self.price.is_none() {
            missing.push("A tour must have a price".to_string());
        }
        if self.summary.as_deref().map(str::trim).unwrap_or("").is_empty() {
            missing.push("A tour must have a summary".to_string());
        }
        if self.image_cover.is_none() {
            missing.push("A tour must have a cover image".to_string());
        }
        if !missing.is_empty() {
            return Err(StoreError::Validation(missing));
        }

        let name = self.name.unwrap_or_default().trim().to_string();
        let price = self.price.unwrap_or_default();
        check_price(price)?;
        check_discount(self.price_discount, price)?;

        let mut tour = Tour {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            duration: self.duration.unwrap_or_default(),
            max_group_size: self.max_group_size.unwrap_or_default(),
            difficulty: self
                .difficulty
                .as_deref()
                .and_then(Difficulty::parse)
                .unwrap_or(Difficulty::Easy),
            ratings_average: DEFAULT_RATINGS_AVERAGE,
            ratings_quantity: 0,
            price,
            price_discount: self.price_discount,
            summary: self.summary.unwrap_or_default().trim().to_string(),
            description: self.description.map(|d| d.trim().to_string()),
            image_cover: self.image_cover.unwrap_or_default(),
            images: self.images.unwrap_or_default(),
            created_at: Utc::now(),
            start_dates: self.start_dates.unwrap_or_default(),
            secret_tour: self.secret_tour.unwrap_or(false),
        };
        tour.set_ratings(
            self.ratings_quantity.unwrap_or(0),
            self.ratings_average.unwrap_or(DEFAULT_RATINGS_AVERAGE),
        );
        Ok(tour)
    }

    /// Apply the present fields to an existing tour.
    pub fn apply(self, tour: &mut Tour) -> Result<(), StoreError> {
        self.validate()?;

        let price = self.price.unwrap_or(tour.price);
        let discount = self.price_discount.or(tour.price_discount);
        check_price(price)?;
        check_discount(discount, price)?;

        if let Some(name) = self.name {
            tour.name = name.trim().to_string();
            tour.slug = slugify(&tour.name);
        }
        if let Some(duration) = self.duration {
            tour.duration = duration;
        }
        if let Some(size) = self.max_group_size {
            tour.max_group_size = size;
        }
        if let Some(difficulty) = self.difficulty.as_deref().and_then(Difficulty::parse) {
            tour.difficulty = difficulty;
        }
        if let Some(average) = self.ratings_average {
            tour.ratings_average = round_rating(average);
        }
        if let Some(quantity) = self.ratings_quantity {
            tour.ratings_quantity = quantity;
        }
        tour.price = price;
        tour.price_discount = discount;
        if let Some(summary) = self.summary {
            tour.summary = summary.trim().to_string();
        }
        if let Some(description) = self.description {
            tour.description = Some(description.trim().to_string());
        }
        if let Some(cover) = self.image_cover {
            tour.image_cover = cover;
        }
        if let Some(images) = self.images {
            tour.images = images;
        }
        if let Some(dates) = self.start_dates {
            tour.start_dates = dates;
        }
        if let Some(secret) = self.secret_tour {
            tour.secret_tour = secret;
        }
        Ok(())
    }
}

fn check_price(price: f64) -> Result<(), StoreError> {
    if price > 0.0 {
        Ok(())
    } else {
        Err(StoreError::Validation(vec![
            "A tour price must be greater than 0".to_string(),
        ]))
    }
}

fn check_discount(discount: Option<f64>, price: f64) -> Result<(), StoreError> {
    match discount {
        Some(discount) if discount >= price => Err(StoreError::Validation(vec![format!(
            "Discount price ({}) should be below regular price",
            discount
        )])),
        _ => Ok(()),
    }
}
