//! In-memory implementation of [`AuthStore`].
//!
//! All state lives in one struct behind a `tokio::sync::RwLock`. Nothing is
//! durable; it exists for local development without `DATABASE_URL` and for
//! tests. Uniqueness rules mirror the PostgreSQL schema so both backends
//! report `Conflict` and `NotFound` in the same situations.

use async_trait::async_trait;
use chrono::Utc;
use civic_core::permission::{level_names, PermissionLevel};
use civic_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

use super::{AuthStore, StoreError, StoreResult};
use crate::models::application::{Application, NewApplication, UpdateApplication};
use crate::models::permission::{ApplicationGrant, UserTypeGrant};
use crate::models::resource::{NewSubResource, Resource, SubResource};
use crate::models::token::{NewUserToken, UserToken};
use crate::models::user::{NewUser, User};
use crate::models::user_type::{NewUserType, UserType};

#[derive(Default)]
struct State {
    last_id: DbId,
    applications: Vec<Application>,
    resources: Vec<Resource>,
    sub_resources: Vec<SubResource>,
    application_grants: Vec<ApplicationGrant>,
    user_types: Vec<UserType>,
    users: Vec<User>,
    /// `(user_id, user_type_id)` links.
    user_user_types: Vec<(DbId, DbId)>,
    user_type_grants: Vec<UserTypeGrant>,
    tokens: Vec<UserToken>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn resource_by_id(&self, id: DbId) -> StoreResult<&Resource> {
        self.resources
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("resource {id}")))
    }

    fn user_type_by_id(&self, id: DbId) -> StoreResult<&UserType> {
        self.user_types
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("user type {id}")))
    }

    fn types_of(&self, user_id: DbId) -> Vec<UserType> {
        let mut types: Vec<UserType> = self
            .user_user_types
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, t)| self.user_types.iter().find(|ut| ut.id == *t).cloned())
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        types
    }

    /// Link types to a user and recompute the municipal-staff flag.
    fn assign_types(&mut self, user_id: DbId, user_type_ids: &[DbId]) -> StoreResult<User> {
        for id in user_type_ids {
            self.user_type_by_id(*id)?;
        }
        for id in user_type_ids {
            if !self.user_user_types.contains(&(user_id, *id)) {
                self.user_user_types.push((user_id, *id));
            }
        }
        let is_staff = self.types_of(user_id).iter().any(|t| t.is_municipal_staff);
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        user.is_municipal_staff = is_staff;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct MemoryAuthStore {
    state: RwLock<State>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStore for MemoryAuthStore {
    async fn create_application(&self, input: NewApplication) -> StoreResult<Application> {
        let mut state = self.state.write().await;
        if state
            .applications
            .iter()
            .any(|a| a.name == input.name || a.api_key_hash == input.api_key_hash)
        {
            return Err(StoreError::Conflict("application already exists".into()));
        }
        let now = Utc::now();
        let app = Application {
            id: state.next_id(),
            name: input.name,
            api_key_hash: input.api_key_hash,
            api_key_prefix: input.api_key_prefix,
            is_active: true,
            api_key_expires_at: input.api_key_expires_at,
            created_at: now,
            updated_at: now,
        };
        state.applications.push(app.clone());
        Ok(app)
    }

    async fn list_applications(&self) -> StoreResult<Vec<Application>> {
        Ok(self.state.read().await.applications.clone())
    }

    async fn find_application(&self, id: DbId) -> StoreResult<Option<Application>> {
        let state = self.state.read().await;
        Ok(state.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn find_application_by_key_hash(
        &self,
        key_hash: &str,
    ) -> StoreResult<Option<Application>> {
        let state = self.state.read().await;
        Ok(state
            .applications
            .iter()
            .find(|a| a.api_key_hash == key_hash)
            .cloned())
    }

    async fn update_application(
        &self,
        id: DbId,
        input: &UpdateApplication,
    ) -> StoreResult<Option<Application>> {
        let mut state = self.state.write().await;
        if let Some(name) = &input.name {
            if state.applications.iter().any(|a| a.id != id && &a.name == name) {
                return Err(StoreError::Conflict("application already exists".into()));
            }
        }
        let Some(app) = state.applications.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            app.name = name.clone();
        }
        if let Some(active) = input.is_active {
            app.is_active = active;
        }
        app.updated_at = Utc::now();
        Ok(Some(app.clone()))
    }

    async fn rotate_application_key(
        &self,
        id: DbId,
        key_hash: &str,
        key_prefix: &str,
        expires_at: Timestamp,
    ) -> StoreResult<Option<Application>> {
        let mut state = self.state.write().await;
        let Some(app) = state.applications.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        app.api_key_hash = key_hash.to_string();
        app.api_key_prefix = key_prefix.to_string();
        app.api_key_expires_at = expires_at;
        app.updated_at = Utc::now();
        Ok(Some(app.clone()))
    }

    async fn create_resource(&self, name: &str, description: &str) -> StoreResult<Resource> {
        let mut state = self.state.write().await;
        if state.resources.iter().any(|r| r.name == name) {
            return Err(StoreError::Conflict("resource already exists".into()));
        }
        let resource = Resource {
            id: state.next_id(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        state.resources.push(resource.clone());
        Ok(resource)
    }

    async fn get_or_create_resource(
        &self,
        name: &str,
        description: &str,
    ) -> StoreResult<Resource> {
        if let Some(existing) = self.find_resource(name).await? {
            return Ok(existing);
        }
        match self.create_resource(name, description).await {
            Err(StoreError::Conflict(_)) => self
                .find_resource(name)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("resource {name}"))),
            other => other,
        }
    }

    async fn list_resources(&self) -> StoreResult<Vec<Resource>> {
        let mut resources = self.state.read().await.resources.clone();
        resources.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(resources)
    }

    async fn find_resource(&self, name: &str) -> StoreResult<Option<Resource>> {
        let state = self.state.read().await;
        Ok(state.resources.iter().find(|r| r.name == name).cloned())
    }

    async fn create_sub_resource(&self, input: &NewSubResource) -> StoreResult<SubResource> {
        let mut state = self.state.write().await;
        state.resource_by_id(input.resource_id)?;
        if state
            .sub_resources
            .iter()
            .any(|s| s.resource_id == input.resource_id && s.name == input.name)
        {
            return Err(StoreError::Conflict("sub-resource already exists".into()));
        }
        let sub = SubResource {
            id: state.next_id(),
            resource_id: input.resource_id,
            name: input.name.clone(),
            description: input.description.clone(),
            allow_anonymous: input.allow_anonymous,
            created_at: Utc::now(),
        };
        state.sub_resources.push(sub.clone());
        Ok(sub)
    }

    async fn get_or_create_sub_resource(
        &self,
        input: &NewSubResource,
    ) -> StoreResult<SubResource> {
        {
            let state = self.state.read().await;
            if let Some(existing) = state
                .sub_resources
                .iter()
                .find(|s| s.resource_id == input.resource_id && s.name == input.name)
            {
                return Ok(existing.clone());
            }
        }
        self.create_sub_resource(input).await
    }

    async fn list_sub_resources(&self) -> StoreResult<Vec<SubResource>> {
        let mut subs = self.state.read().await.sub_resources.clone();
        subs.sort_by(|a, b| (a.resource_id, &a.name).cmp(&(b.resource_id, &b.name)));
        Ok(subs)
    }

    async fn find_sub_resource(
        &self,
        resource_name: &str,
        sub_resource_name: &str,
    ) -> StoreResult<Option<SubResource>> {
        let state = self.state.read().await;
        let Some(resource) = state.resources.iter().find(|r| r.name == resource_name) else {
            return Ok(None);
        };
        Ok(state
            .sub_resources
            .iter()
            .find(|s| s.resource_id == resource.id && s.name == sub_resource_name)
            .cloned())
    }

    async fn upsert_application_grant(
        &self,
        application_id: DbId,
        resource_id: DbId,
        levels: &[PermissionLevel],
    ) -> StoreResult<ApplicationGrant> {
        let mut state = self.state.write().await;
        if !state.applications.iter().any(|a| a.id == application_id) {
            return Err(StoreError::NotFound(format!("application {application_id}")));
        }
        let resource_name = state.resource_by_id(resource_id)?.name.clone();
        let now = Utc::now();

        if let Some(grant) = state
            .application_grants
            .iter_mut()
            .find(|g| g.application_id == application_id && g.resource_id == resource_id)
        {
            grant.permissions = level_names(levels);
            grant.updated_at = now;
            return Ok(grant.clone());
        }

        let grant = ApplicationGrant {
            id: state.next_id(),
            application_id,
            resource_id,
            resource_name,
            permissions: level_names(levels),
            created_at: now,
            updated_at: now,
        };
        state.application_grants.push(grant.clone());
        Ok(grant)
    }

    async fn find_application_grant(
        &self,
        application_id: DbId,
        resource_name: &str,
    ) -> StoreResult<Option<ApplicationGrant>> {
        let state = self.state.read().await;
        Ok(state
            .application_grants
            .iter()
            .find(|g| g.application_id == application_id && g.resource_name == resource_name)
            .cloned())
    }

    async fn list_application_grants(
        &self,
        application_id: DbId,
    ) -> StoreResult<Vec<ApplicationGrant>> {
        let state = self.state.read().await;
        let mut grants: Vec<ApplicationGrant> = state
            .application_grants
            .iter()
            .filter(|g| g.application_id == application_id)
            .cloned()
            .collect();
        grants.sort_by(|a, b| a.resource_name.cmp(&b.resource_name));
        Ok(grants)
    }

    async fn get_or_create_user_type(&self, input: &NewUserType) -> StoreResult<UserType> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.user_types.iter().find(|t| t.name == input.name) {
            return Ok(existing.clone());
        }
        let user_type = UserType {
            id: state.next_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            is_municipal_staff: input.is_municipal_staff,
            created_at: Utc::now(),
        };
        state.user_types.push(user_type.clone());
        Ok(user_type)
    }

    async fn list_user_types(&self) -> StoreResult<Vec<UserType>> {
        let mut types = self.state.read().await.user_types.clone();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn find_user_type(&self, name: &str) -> StoreResult<Option<UserType>> {
        let state = self.state.read().await;
        Ok(state.user_types.iter().find(|t| t.name == name).cloned())
    }

    async fn find_user_types(&self, names: &[String]) -> StoreResult<Vec<UserType>> {
        let state = self.state.read().await;
        let mut types: Vec<UserType> = state
            .user_types
            .iter()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn create_user(&self, input: NewUser, user_type_ids: &[DbId]) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == input.email) {
            return Err(StoreError::Conflict("user already exists".into()));
        }
        for id in user_type_ids {
            state.user_type_by_id(*id)?;
        }
        let now = Utc::now();
        let user = User {
            id: state.next_id(),
            email: input.email,
            password_hash: input.password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            is_active: true,
            is_admin: input.is_admin,
            is_municipal_staff: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let user_id = user.id;
        state.users.push(user);
        state.assign_types(user_id, user_type_ids)
    }

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn set_user_types(
        &self,
        user_id: DbId,
        user_type_ids: &[DbId],
    ) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;
        if !state.users.iter().any(|u| u.id == user_id) {
            return Ok(None);
        }
        for id in user_type_ids {
            state.user_type_by_id(*id)?;
        }
        state.user_user_types.retain(|(u, _)| *u != user_id);
        state.assign_types(user_id, user_type_ids).map(Some)
    }

    async fn set_user_active(&self, user_id: DbId, is_active: bool) -> StoreResult<Option<User>> {
        let mut state = self.state.write().await;
        Ok(state.users.iter_mut().find(|u| u.id == user_id).map(|user| {
            user.is_active = is_active;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn user_types_of(&self, user_id: DbId) -> StoreResult<Vec<UserType>> {
        Ok(self.state.read().await.types_of(user_id))
    }

    async fn record_login(&self, user_id: DbId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn upsert_user_type_grant(
        &self,
        user_type_id: DbId,
        sub_resource_id: DbId,
        levels: &[PermissionLevel],
    ) -> StoreResult<UserTypeGrant> {
        let mut state = self.state.write().await;
        let user_type_name = state.user_type_by_id(user_type_id)?.name.clone();
        let sub = state
            .sub_resources
            .iter()
            .find(|s| s.id == sub_resource_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("sub-resource {sub_resource_id}")))?;
        let resource_name = state.resource_by_id(sub.resource_id)?.name.clone();
        let now = Utc::now();

        if let Some(grant) = state
            .user_type_grants
            .iter_mut()
            .find(|g| g.user_type_id == user_type_id && g.sub_resource_id == sub_resource_id)
        {
            grant.permissions = level_names(levels);
            grant.updated_at = now;
            return Ok(grant.clone());
        }

        let grant = UserTypeGrant {
            id: state.next_id(),
            user_type_id,
            user_type_name,
            resource_id: sub.resource_id,
            resource_name,
            sub_resource_id,
            sub_resource_name: sub.name,
            permissions: level_names(levels),
            created_at: now,
            updated_at: now,
        };
        state.user_type_grants.push(grant.clone());
        Ok(grant)
    }

    async fn find_user_type_grant(
        &self,
        user_type_id: DbId,
        sub_resource_id: DbId,
    ) -> StoreResult<Option<UserTypeGrant>> {
        let state = self.state.read().await;
        Ok(state
            .user_type_grants
            .iter()
            .find(|g| g.user_type_id == user_type_id && g.sub_resource_id == sub_resource_id)
            .cloned())
    }

    async fn find_user_type_grants(
        &self,
        user_type_ids: &[DbId],
        resource_name: &str,
        sub_resource_name: &str,
    ) -> StoreResult<Vec<UserTypeGrant>> {
        let state = self.state.read().await;
        let mut grants: Vec<UserTypeGrant> = state
            .user_type_grants
            .iter()
            .filter(|g| {
                user_type_ids.contains(&g.user_type_id)
                    && g.resource_name == resource_name
                    && g.sub_resource_name == sub_resource_name
            })
            .cloned()
            .collect();
        grants.sort_by(|a, b| a.user_type_name.cmp(&b.user_type_name));
        Ok(grants)
    }

    async fn create_token(&self, input: NewUserToken) -> StoreResult<UserToken> {
        let mut state = self.state.write().await;
        if state.tokens.iter().any(|t| t.token_hash == input.token_hash) {
            return Err(StoreError::Conflict("token already exists".into()));
        }
        if !state.users.iter().any(|u| u.id == input.user_id) {
            return Err(StoreError::NotFound(format!("user {}", input.user_id)));
        }
        let token = UserToken {
            id: state.next_id(),
            user_id: input.user_id,
            token_key: input.token_key,
            token_hash: input.token_hash,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        state.tokens.push(token.clone());
        Ok(token)
    }

    async fn find_live_token(
        &self,
        token_hash: &str,
        now: Timestamp,
    ) -> StoreResult<Option<UserToken>> {
        let state = self.state.read().await;
        Ok(state
            .tokens
            .iter()
            .find(|t| t.token_hash == token_hash && t.expires_at > now)
            .cloned())
    }

    async fn delete_token(&self, token_hash: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.tokens.len();
        state.tokens.retain(|t| t.token_hash != token_hash);
        Ok(state.tokens.len() < before)
    }

    async fn delete_user_tokens(&self, user_id: DbId) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let before = state.tokens.len();
        state.tokens.retain(|t| t.user_id != user_id);
        Ok((before - state.tokens.len()) as u64)
    }

    async fn purge_expired_tokens(&self, now: Timestamp) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let before = state.tokens.len();
        state.tokens.retain(|t| t.expires_at > now);
        Ok((before - state.tokens.len()) as u64)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
