//! Domain models for the Medfast patient portal

mod appointment;
mod user;

pub use appointment::*;
pub use medical_test::*;
pub use user::*;
