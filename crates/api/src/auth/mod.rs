//! Credential handling for users of the auth service itself.

pub mod password;
