mod driver;
mod error;
mod helpers;
