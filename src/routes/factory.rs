//! Handler building blocks shared by every resource.

use axum::response::Response;

use crate::error::{AppError, StoreError};
use crate::http::query::QueryString;
use crate::http::response;
use crate::models::{Review, ReviewInput, Tour, TourInput, User, UserInput};
use crate::store::{parse_id, ApiFeatures, Collection, Document};

/// A create/update payload for documents of type `T`.
pub trait DocumentInput<T: Document> {
    fn create(self) -> Result<T, StoreError>;
    fn update(self, doc: &mut T) -> Result<(), StoreError>;
}

impl DocumentInput<Tour> for TourInput {
    fn create(self) -> Result<Tour, StoreError> {
        self.into_tour()
    }

    fn update(self, doc: &mut Tour) -> Result<(), StoreError> {
        self.apply(doc)
    }
}

impl DocumentInput<User> for UserInput {
    fn create(self) -> Result<User, StoreError> {
        self.into_user()
    }

    fn update(self, doc: &mut User) -> Result<(), StoreError> {
        self.apply(doc)
    }
}

impl DocumentInput<Review> for ReviewInput {
    fn create(self) -> Result<Review, StoreError> {
        self.into_review()
    }

    fn update(self, doc: &mut Review) -> Result<(), StoreError> {
        self.apply(doc)
    }
}

/// Fetch a visible document by its raw id. Hidden documents do not exist
/// as far as the API is concerned.
pub fn fetch<T: Document>(collection: &Collection<T>, raw_id: &str) -> Result<T, StoreError> {
    let doc = collection.get(parse_id(raw_id)?)?;
    if doc.visible() {
        Ok(doc)
    } else {
        Err(StoreError::NotFound(T::NAME))
    }
}

pub fn get_all<T, F>(
    collection: &Collection<T>,
    query: &QueryString,
    base: F,
) -> Result<Response, AppError>
where
    T: Document,
    F: Fn(&T) -> bool,
{
    let features = ApiFeatures::from_query(query);
    let docs = collection.query(&features, base)?;
    Ok(response::list(docs))
}

pub fn get_one<T: Document>(collection: &Collection<T>, raw_id: &str) -> Result<Response, AppError> {
    Ok(response::one(fetch(collection, raw_id)?))
}

pub fn create_one<T, I>(collection: &Collection<T>, input: I) -> Result<T, AppError>
where
    T: Document,
    I: DocumentInput<T>,
{
    let doc = input.create()?;
    Ok(collection.insert(doc)?)
}

pub fn update_one<T, I>(collection: &Collection<T>, raw_id: &str, input: I) -> Result<T, AppError>
where
    T: Document,
    I: DocumentInput<T>,
{
    let id = parse_id(raw_id)?;
    Ok(collection.update(id, |doc| {
        if !doc.visible() {
            return Err(StoreError::NotFound(T::NAME));
        }
        input.update(doc)
    })?)
}

pub fn delete_one<T: Document>(collection: &Collection<T>, raw_id: &str) -> Result<T, AppError> {
    let doc = fetch(collection, raw_id)?;
    Ok(collection.remove(doc.id())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(active: bool) -> User {
        UserInput {
            name: Some("Jonas".into()),
            email: Some(format!("jonas-{}@example.com", uuid::Uuid::new_v4())),
            active: Some(active),
            ..Default::default()
        }
        .into_user()
        .unwrap()
    }

    #[test]
    fn test_hidden_documents_are_not_found() {
        let users = Collection::new();
        let hidden = users.insert(user(false)).unwrap();
        let err = fetch(&users, &hidden.id.to_string()).unwrap_err();
        assert_eq!(err, StoreError::NotFound("user"));
    }

    #[test]
    fn test_update_and_delete() {
        let users = Collection::new();
        let created = create_one(&users, UserInput {
            name: Some("Lourdes Browning".into()),
            email: Some("loulou@example.com".into()),
            ..Default::default()
        })
        .unwrap();

        let id = created.id.to_string();
        let updated = update_one(&users, &id, UserInput {
            name: Some("Lourdes B.".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(updated.name, "Lourdes B.");
        assert_eq!(updated.email, "loulou@example.com");

        delete_one(&users, &id).unwrap();
        assert!(users.is_empty());
        assert_eq!(
            delete_one(&users, &id).unwrap_err().status,
            axum::http::StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_id() {
        let users: Collection<User> = Collection::new();
        let Err(err) = get_one(&users, "not-an-id") else {
            panic!("expected an invalid id error");
        };
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid id: not-an-id.");
    }
}
