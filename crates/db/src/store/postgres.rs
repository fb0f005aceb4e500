//! PostgreSQL implementation of [`AuthStore`] over the repository layer.

use async_trait::async_trait;
use civic_core::permission::{level_names, PermissionLevel};
use civic_core::types::{DbId, Timestamp};

use super::{AuthStore, StoreError, StoreResult};
use crate::models::application::{Application, NewApplication, UpdateApplication};
use crate::models::permission::{ApplicationGrant, UserTypeGrant};
use crate::models::resource::{NewSubResource, Resource, SubResource};
use crate::models::token::{NewUserToken, UserToken};
use crate::models::user::{NewUser, User};
use crate::models::user_type::{NewUserType, UserType};
use crate::repositories::{
    ApplicationRepo, PermissionRepo, ResourceRepo, TokenRepo, UserRepo, UserTypeRepo,
};
use crate::DbPool;

#[derive(Clone)]
pub struct PgAuthStore {
    pool: DbPool,
}

impl PgAuthStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Turn constraint violations into domain-level store errors.
fn classify(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(format!("{what} already exists"));
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound(format!("{what} refers to a missing row"));
        }
    }
    if matches!(err, sqlx::Error::RowNotFound) {
        return StoreError::NotFound(what.to_string());
    }
    StoreError::Database(err)
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn create_application(&self, input: NewApplication) -> StoreResult<Application> {
        ApplicationRepo::create(&self.pool, &input)
            .await
            .map_err(|e| classify(e, "application"))
    }

    async fn list_applications(&self) -> StoreResult<Vec<Application>> {
        Ok(ApplicationRepo::list(&self.pool).await?)
    }

    async fn find_application(&self, id: DbId) -> StoreResult<Option<Application>> {
        Ok(ApplicationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_application_by_key_hash(
        &self,
        key_hash: &str,
    ) -> StoreResult<Option<Application>> {
        Ok(ApplicationRepo::find_by_key_hash(&self.pool, key_hash).await?)
    }

    async fn update_application(
        &self,
        id: DbId,
        input: &UpdateApplication,
    ) -> StoreResult<Option<Application>> {
        ApplicationRepo::update(&self.pool, id, input)
            .await
            .map_err(|e| classify(e, "application"))
    }

    async fn rotate_application_key(
        &self,
        id: DbId,
        key_hash: &str,
        key_prefix: &str,
        expires_at: Timestamp,
    ) -> StoreResult<Option<Application>> {
        ApplicationRepo::rotate(&self.pool, id, key_hash, key_prefix, expires_at)
            .await
            .map_err(|e| classify(e, "api key"))
    }

    async fn create_resource(&self, name: &str, description: &str) -> StoreResult<Resource> {
        ResourceRepo::create(&self.pool, name, description)
            .await
            .map_err(|e| classify(e, "resource"))
    }

    async fn get_or_create_resource(
        &self,
        name: &str,
        description: &str,
    ) -> StoreResult<Resource> {
        Ok(ResourceRepo::get_or_create(&self.pool, name, description).await?)
    }

    async fn list_resources(&self) -> StoreResult<Vec<Resource>> {
        Ok(ResourceRepo::list(&self.pool).await?)
    }

    async fn find_resource(&self, name: &str) -> StoreResult<Option<Resource>> {
        Ok(ResourceRepo::find_by_name(&self.pool, name).await?)
    }

    async fn create_sub_resource(&self, input: &NewSubResource) -> StoreResult<SubResource> {
        ResourceRepo::create_sub_resource(&self.pool, input)
            .await
            .map_err(|e| classify(e, "sub-resource"))
    }

    async fn get_or_create_sub_resource(
        &self,
        input: &NewSubResource,
    ) -> StoreResult<SubResource> {
        ResourceRepo::get_or_create_sub_resource(&self.pool, input)
            .await
            .map_err(|e| classify(e, "sub-resource"))
    }

    async fn list_sub_resources(&self) -> StoreResult<Vec<SubResource>> {
        Ok(ResourceRepo::list_sub_resources(&self.pool).await?)
    }

    async fn find_sub_resource(
        &self,
        resource_name: &str,
        sub_resource_name: &str,
    ) -> StoreResult<Option<SubResource>> {
        Ok(ResourceRepo::find_sub_resource(&self.pool, resource_name, sub_resource_name).await?)
    }

    async fn upsert_application_grant(
        &self,
        application_id: DbId,
        resource_id: DbId,
        levels: &[PermissionLevel],
    ) -> StoreResult<ApplicationGrant> {
        PermissionRepo::upsert_application_grant(
            &self.pool,
            application_id,
            resource_id,
            &level_names(levels),
        )
        .await
        .map_err(|e| classify(e, "application grant"))
    }

    async fn find_application_grant(
        &self,
        application_id: DbId,
        resource_name: &str,
    ) -> StoreResult<Option<ApplicationGrant>> {
        Ok(PermissionRepo::find_application_grant(&self.pool, application_id, resource_name).await?)
    }

    async fn list_application_grants(
        &self,
        application_id: DbId,
    ) -> StoreResult<Vec<ApplicationGrant>> {
        Ok(PermissionRepo::list_application_grants(&self.pool, application_id).await?)
    }

    async fn get_or_create_user_type(&self, input: &NewUserType) -> StoreResult<UserType> {
        Ok(UserTypeRepo::get_or_create(&self.pool, input).await?)
    }

    async fn list_user_types(&self) -> StoreResult<Vec<UserType>> {
        Ok(UserTypeRepo::list(&self.pool).await?)
    }

    async fn find_user_type(&self, name: &str) -> StoreResult<Option<UserType>> {
        Ok(UserTypeRepo::find_by_name(&self.pool, name).await?)
    }

    async fn find_user_types(&self, names: &[String]) -> StoreResult<Vec<UserType>> {
        Ok(UserTypeRepo::find_by_names(&self.pool, names).await?)
    }

    async fn create_user(&self, input: NewUser, user_type_ids: &[DbId]) -> StoreResult<User> {
        UserRepo::create(&self.pool, &input, user_type_ids)
            .await
            .map_err(|e| classify(e, "user"))
    }

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn set_user_types(
        &self,
        user_id: DbId,
        user_type_ids: &[DbId],
    ) -> StoreResult<Option<User>> {
        UserRepo::set_types(&self.pool, user_id, user_type_ids)
            .await
            .map_err(|e| classify(e, "user type"))
    }

    async fn set_user_active(&self, user_id: DbId, is_active: bool) -> StoreResult<Option<User>> {
        Ok(UserRepo::set_active(&self.pool, user_id, is_active).await?)
    }

    async fn user_types_of(&self, user_id: DbId) -> StoreResult<Vec<UserType>> {
        Ok(UserTypeRepo::list_for_user(&self.pool, user_id).await?)
    }

    async fn record_login(&self, user_id: DbId) -> StoreResult<()> {
        Ok(UserRepo::record_login(&self.pool, user_id).await?)
    }

    async fn upsert_user_type_grant(
        &self,
        user_type_id: DbId,
        sub_resource_id: DbId,
        levels: &[PermissionLevel],
    ) -> StoreResult<UserTypeGrant> {
        PermissionRepo::upsert_user_type_grant(
            &self.pool,
            user_type_id,
            sub_resource_id,
            &level_names(levels),
        )
        .await
        .map_err(|e| classify(e, "sub-resource"))
    }

    async fn find_user_type_grant(
        &self,
        user_type_id: DbId,
        sub_resource_id: DbId,
    ) -> StoreResult<Option<UserTypeGrant>> {
        Ok(PermissionRepo::find_user_type_grant(&self.pool, user_type_id, sub_resource_id).await?)
    }

    async fn find_user_type_grants(
        &self,
        user_type_ids: &[DbId],
        resource_name: &str,
        sub_resource_name: &str,
    ) -> StoreResult<Vec<UserTypeGrant>> {
        Ok(PermissionRepo::find_user_type_grants(
            &self.pool,
            user_type_ids,
            resource_name,
            sub_resource_name,
        )
        .await?)
    }

    async fn create_token(&self, input: NewUserToken) -> StoreResult<UserToken> {
        TokenRepo::create(&self.pool, &input)
            .await
            .map_err(|e| classify(e, "token"))
    }

    async fn find_live_token(
        &self,
        token_hash: &str,
        now: Timestamp,
    ) -> StoreResult<Option<UserToken>> {
        Ok(TokenRepo::find_live_by_hash(&self.pool, token_hash, now).await?)
    }

    async fn delete_token(&self, token_hash: &str) -> StoreResult<bool> {
        Ok(TokenRepo::delete_by_hash(&self.pool, token_hash).await?)
    }

    async fn delete_user_tokens(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(TokenRepo::delete_for_user(&self.pool, user_id).await?)
    }

    async fn purge_expired_tokens(&self, now: Timestamp) -> StoreResult<u64> {
        Ok(TokenRepo::purge_expired(&self.pool, now).await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
