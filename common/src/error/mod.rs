pub mod error_location;
pub mod sensation_error;
