//! Row types and DTOs, one module per table family.

pub mod application;
pub mod permission;
pub mod resource;
pub mod token;
pub mod user;
pub mod user_type;
