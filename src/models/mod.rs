//! Documents served by the API.

pub mod booking;
pub mod review;
pub mod tour;
pub mod user;

pub use booking::{Booking, BookingInput};
pub use review::{Review, ReviewInput};
pub use tour::{Difficulty, Tour, TourInput};
pub use user::{Role, User, UserInput};
