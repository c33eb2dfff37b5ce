//! Tower Layer implementations

pub mod validation;

pub use validation::{ValidationLayer, ValidationService};
