//! Domain layer for the civic auth service.
//!
//! Everything here is pure: permission levels, the policy that decides
//! whether an application or user may touch a resource, key and token
//! material, the seed catalogue, and the wire types shared with resource
//! services. Persistence lives in `civic-db`, HTTP in `civic-auth-api`.

pub mod api_keys;
pub mod catalog;
pub mod error;
pub mod hashing;
pub mod permission;
pub mod policy;
pub mod protocol;
pub mod tokens;
pub mod types;
