//! Authentication and authorization extractors for the admin surface.
//!
//! - [`auth::TokenUser`] -- the user behind an `Authorization: Token <t>` header.
//! - [`rbac::RequireAdmin`] -- a token user with `is_admin`.

pub mod auth;
pub mod rbac;
