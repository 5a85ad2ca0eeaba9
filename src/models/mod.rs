//! Data models
//!
//! Rust structs representing database entities.

mod dog;
mod food;
mod food_intake;
mod food_submission;
pub mod timestamp;
mod weight_entry;

pub use dog::{Dog, DogCreate, DogUpdate, Sex};
pub use food::{Food, FoodCreate};
pub use food_intake::{FoodIntake, FoodIntakeCreate};
pub use food_submission::{FoodSubmission, SubmissionStatus};
pub use weight_entry::{WeightEntry, WeightEntryCreate};
