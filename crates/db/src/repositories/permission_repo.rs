//! Repository for `application_resource_permissions` and
//! `user_resource_permissions`.
//!
//! Grant rows are always returned joined with the names they refer to, since
//! every caller (policy checks, admin listings) wants names, not ids.

use civic_core::types::DbId;
use sqlx::PgPool;

use crate::models::permission::{ApplicationGrant, UserTypeGrant};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const APP_GRANT_COLUMNS: &str = "\
    g.id, g.application_id, g.resource_id, r.name AS resource_name, \
    g.permissions, g.created_at, g.updated_at";

const USER_GRANT_COLUMNS: &str = "\
    g.id, g.user_type_id, t.name AS user_type_name, \
    g.resource_id, r.name AS resource_name, \
    g.sub_resource_id, s.name AS sub_resource_name, \
    g.permissions, g.created_at, g.updated_at";

const USER_GRANT_JOINS: &str = "\
    JOIN user_types t ON t.id = g.user_type_id \
    JOIN resources r ON r.id = g.resource_id \
    JOIN sub_resources s ON s.id = g.sub_resource_id";

pub struct PermissionRepo;

impl PermissionRepo {
    // -----------------------------------------------------------------------
    // Application grants
    // -----------------------------------------------------------------------

    /// Create or replace the grant of an application on a resource.
    pub async fn upsert_application_grant(
        pool: &PgPool,
        application_id: DbId,
        resource_id: DbId,
        permissions: &[String],
    ) -> Result<ApplicationGrant, sqlx::Error> {
        let query = format!(
            "WITH g AS ( \
                 INSERT INTO application_resource_permissions \
                     (application_id, resource_id, permissions) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (application_id, resource_id) \
                 DO UPDATE SET permissions = EXCLUDED.permissions, updated_at = NOW() \
                 RETURNING * \
             ) \
             SELECT {APP_GRANT_COLUMNS} FROM g JOIN resources r ON r.id = g.resource_id"
        );
        sqlx::query_as::<_, ApplicationGrant>(&query)
            .bind(application_id)
            .bind(resource_id)
            .bind(permissions)
            .fetch_one(pool)
            .await
    }

    /// The grant of an application on the resource named `resource_name`.
    pub async fn find_application_grant(
        pool: &PgPool,
        application_id: DbId,
        resource_name: &str,
    ) -> Result<Option<ApplicationGrant>, sqlx::Error> {
        let query = format!(
            "SELECT {APP_GRANT_COLUMNS} \
             FROM application_resource_permissions g \
             JOIN resources r ON r.id = g.resource_id \
             WHERE g.application_id = $1 AND r.name = $2"
        );
        sqlx::query_as::<_, ApplicationGrant>(&query)
            .bind(application_id)
            .bind(resource_name)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_application_grants(
        pool: &PgPool,
        application_id: DbId,
    ) -> Result<Vec<ApplicationGrant>, sqlx::Error> {
        let query = format!(
            "SELECT {APP_GRANT_COLUMNS} \
             FROM application_resource_permissions g \
             JOIN resources r ON r.id = g.resource_id \
             WHERE g.application_id = $1 \
             ORDER BY r.name"
        );
        sqlx::query_as::<_, ApplicationGrant>(&query)
            .bind(application_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // User-type grants
    // -----------------------------------------------------------------------

    /// Create or replace the grant of a user type on a sub-resource.
    ///
    /// The resource id is taken from the sub-resource row.
    pub async fn upsert_user_type_grant(
        pool: &PgPool,
        user_type_id: DbId,
        sub_resource_id: DbId,
        permissions: &[String],
    ) -> Result<UserTypeGrant, sqlx::Error> {
        let query = format!(
            "WITH g AS ( \
                 INSERT INTO user_resource_permissions \
                     (user_type_id, resource_id, sub_resource_id, permissions) \
                 SELECT $1, s.resource_id, s.id, $3 FROM sub_resources s WHERE s.id = $2 \
                 ON CONFLICT (user_type_id, sub_resource_id) \
                 DO UPDATE SET permissions = EXCLUDED.permissions, updated_at = NOW() \
                 RETURNING * \
             ) \
             SELECT {USER_GRANT_COLUMNS} FROM g {USER_GRANT_JOINS}"
        );
        sqlx::query_as::<_, UserTypeGrant>(&query)
            .bind(user_type_id)
            .bind(sub_resource_id)
            .bind(permissions)
            .fetch_one(pool)
            .await
    }

    pub async fn find_user_type_grant(
        pool: &PgPool,
        user_type_id: DbId,
        sub_resource_id: DbId,
    ) -> Result<Option<UserTypeGrant>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_GRANT_COLUMNS} FROM user_resource_permissions g {USER_GRANT_JOINS} \
             WHERE g.user_type_id = $1 AND g.sub_resource_id = $2"
        );
        sqlx::query_as::<_, UserTypeGrant>(&query)
            .bind(user_type_id)
            .bind(sub_resource_id)
            .fetch_optional(pool)
            .await
    }

    /// Every grant held by any of `user_type_ids` on the named sub-resource.
    pub async fn find_user_type_grants(
        pool: &PgPool,
        user_type_ids: &[DbId],
        resource_name: &str,
        sub_resource_name: &str,
    ) -> Result<Vec<UserTypeGrant>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_GRANT_COLUMNS} FROM user_resource_permissions g {USER_GRANT_JOINS} \
             WHERE g.user_type_id = ANY($1) AND r.name = $2 AND s.name = $3 \
             ORDER BY t.name"
        );
        sqlx::query_as::<_, UserTypeGrant>(&query)
            .bind(user_type_ids)
            .bind(resource_name)
            .bind(sub_resource_name)
            .fetch_all(pool)
            .await
    }
}
