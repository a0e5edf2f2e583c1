//! Shared types for the Medfast patient portal
//!
//! Domain enums, request/response DTOs and the response envelope used by the
//! backend and by API clients.

pub mod dto;
pub mod models;
pub mod response;
pub mod types;
pub mod validation;

pub use dto::*;
pub use models::*;
pub use response::*;
pub use types::*;
