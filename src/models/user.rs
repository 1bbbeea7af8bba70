//! User documents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::StoreError;
use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "guide" => Some(Role::Guide),
            "lead-guide" => Some(Role::LeadGuide),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: Role,
    /// Deactivated users are hidden from every query.
    #[serde(default = "default_active", skip_serializing)]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Document for User {
    const NAME: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone())]
    }

    fn visible(&self) -> bool {
        self.active
    }
}

fn validate_role(value: &str) -> Result<(), ValidationError> {
    if Role::parse(value).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("role");
        err.message = Some("Role is either: user, guide, lead-guide, admin".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 1, message = "Please tell us your name!"))]
    pub name: Option<String>,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    pub photo: Option<String>,

    #[validate(custom = "validate_role")]
    pub role: Option<String>,

    pub active: Option<bool>,
}

impl UserInput {
    pub fn into_user(self) -> Result<User, StoreError> {
        self.validate()?;

        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("Please tell us your name!".to_string());
        }
        if self.email.is_none() {
            missing.push("Please provide your email".to_string());
        }
        if !missing.is_empty() {
            return Err(StoreError::Validation(missing));
        }

        Ok(User {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_default().trim().to_string(),
            email: self.email.unwrap_or_default().trim().to_lowercase(),
            photo: self.photo.unwrap_or_else(|| "default.jpg".to_string()),
            role: self.role.as_deref().and_then(Role::parse).unwrap_or_default(),
            active: self.active.unwrap_or(true),
        })
    }

    pub fn apply(self, user: &mut User) -> Result<(), StoreError> {
        self.validate()?;

        if let Some(name) = self.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = self.email {
            user.email = email.trim().to_lowercase();
        }
        if let Some(photo) = self.photo {
            user.photo = photo;
        }
        if let Some(role) = self.role.as_deref().and_then(Role::parse) {
            user.role = role;
        }
        if let Some(active) = self.active {
            user.active = active;
        }
        Ok(())
    }
}
