//! The `AuthStore` abstraction over persistence backends.
//!
//! Handlers and the resolver only ever see `Arc<dyn AuthStore>`. Two backends
//! exist: [`postgres::PgAuthStore`] for deployments and
//! [`memory::MemoryAuthStore`] for local development and tests.

use async_trait::async_trait;
use civic_core::permission::PermissionLevel;
use civic_core::types::{DbId, Timestamp};
use thiserror::Error;

use crate::models::application::{Application, NewApplication, UpdateApplication};
use crate::models::permission::{ApplicationGrant, UserTypeGrant};
use crate::models::resource::{NewSubResource, Resource, SubResource};
use crate::models::token::{NewUserToken, UserToken};
use crate::models::user::{NewUser, User};
use crate::models::user_type::{NewUserType, UserType};

pub mod memory;
pub mod postgres;

pub use memory::MemoryAuthStore;
pub use postgres::PgAuthStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AuthStore: Send + Sync {
    // -- Applications --------------------------------------------------------

    /// Fails with `Conflict` when the name or key hash is taken.
    async fn create_application(&self, input: NewApplication) -> StoreResult<Application>;
    async fn list_applications(&self) -> StoreResult<Vec<Application>>;
    async fn find_application(&self, id: DbId) -> StoreResult<Option<Application>>;
    async fn find_application_by_key_hash(&self, key_hash: &str)
        -> StoreResult<Option<Application>>;
    async fn update_application(
        &self,
        id: DbId,
        input: &UpdateApplication,
    ) -> StoreResult<Option<Application>>;
    async fn rotate_application_key(
        &self,
        id: DbId,
        key_hash: &str,
        key_prefix: &str,
        expires_at: Timestamp,
    ) -> StoreResult<Option<Application>>;

    // -- Resources -----------------------------------------------------------

    /// Fails with `Conflict` when the name is taken.
    async fn create_resource(&self, name: &str, description: &str) -> StoreResult<Resource>;
    async fn get_or_create_resource(&self, name: &str, description: &str)
        -> StoreResult<Resource>;
    async fn list_resources(&self) -> StoreResult<Vec<Resource>>;
    async fn find_resource(&self, name: &str) -> StoreResult<Option<Resource>>;

    /// Fails with `Conflict` when the resource already has a sub-resource of
    /// that name.
    async fn create_sub_resource(&self, input: &NewSubResource) -> StoreResult<SubResource>;
    async fn get_or_create_sub_resource(&self, input: &NewSubResource)
        -> StoreResult<SubResource>;
    async fn list_sub_resources(&self) -> StoreResult<Vec<SubResource>>;
    async fn find_sub_resource(
        &self,
        resource_name: &str,
        sub_resource_name: &str,
    ) -> StoreResult<Option<SubResource>>;

    // -- Application grants --------------------------------------------------

    async fn upsert_application_grant(
        &self,
        application_id: DbId,
        resource_id: DbId,
        levels: &[PermissionLevel],
    ) -> StoreResult<ApplicationGrant>;
    async fn find_application_grant(
        &self,
        application_id: DbId,
        resource_name: &str,
    ) -> StoreResult<Option<ApplicationGrant>>;
    async fn list_application_grants(&self, application_id: DbId)
        -> StoreResult<Vec<ApplicationGrant>>;

    // -- User types ----------------------------------------------------------

    async fn get_or_create_user_type(&self, input: &NewUserType) -> StoreResult<UserType>;
    async fn list_user_types(&self) -> StoreResult<Vec<UserType>>;
    async fn find_user_type(&self, name: &str) -> StoreResult<Option<UserType>>;
    /// Unknown names are silently absent from the result.
    async fn find_user_types(&self, names: &[String]) -> StoreResult<Vec<UserType>>;

    // -- Users ---------------------------------------------------------------

    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, input: NewUser, user_type_ids: &[DbId]) -> StoreResult<User>;
    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Replace the user's types and recompute `is_municipal_staff`.
    async fn set_user_types(&self, user_id: DbId, user_type_ids: &[DbId])
        -> StoreResult<Option<User>>;
    /// Returns `None` if the user does not exist.
    async fn set_user_active(&self, user_id: DbId, is_active: bool) -> StoreResult<Option<User>>;
    async fn user_types_of(&self, user_id: DbId) -> StoreResult<Vec<UserType>>;
    async fn record_login(&self, user_id: DbId) -> StoreResult<()>;

    // -- User-type grants ----------------------------------------------------

    async fn upsert_user_type_grant(
        &self,
        user_type_id: DbId,
        sub_resource_id: DbId,
        levels: &[PermissionLevel],
    ) -> StoreResult<UserTypeGrant>;
    async fn find_user_type_grant(
        &self,
        user_type_id: DbId,
        sub_resource_id: DbId,
    ) -> StoreResult<Option<UserTypeGrant>>;
    async fn find_user_type_grants(
        &self,
        user_type_ids: &[DbId],
        resource_name: &str,
        sub_resource_name: &str,
    ) -> StoreResult<Vec<UserTypeGrant>>;

    // -- Tokens --------------------------------------------------------------

    async fn create_token(&self, input: NewUserToken) -> StoreResult<UserToken>;
    /// A token matching `token_hash` that has not expired at `now`.
    async fn find_live_token(&self, token_hash: &str, now: Timestamp)
        -> StoreResult<Option<UserToken>>;
    async fn delete_token(&self, token_hash: &str) -> StoreResult<bool>;
    async fn delete_user_tokens(&self, user_id: DbId) -> StoreResult<u64>;
    async fn purge_expired_tokens(&self, now: Timestamp) -> StoreResult<u64>;

    // -- Operational ---------------------------------------------------------

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
