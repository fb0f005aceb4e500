//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod application_repo;
pub mod permission_repo;
pub mod resource_repo;
pub mod token_repo;
pub mod user_repo;
pub mod user_type_repo;

pub use application_repo::ApplicationRepo;
pub use permission_repo::PermissionRepo;
pub use resource_repo::ResourceRepo;
pub use token_repo::TokenRepo;
pub use user_repo::UserRepo;
pub use user_type_repo::UserTypeRepo;
