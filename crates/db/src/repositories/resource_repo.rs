//! Repository for the `resources` and `sub_resources` tables.

use sqlx::PgPool;

use crate::models::resource::{NewSubResource, Resource, SubResource};

const RESOURCE_COLUMNS: &str = "id, name, description, created_at";

const SUB_RESOURCE_COLUMNS: &str =
    "id, resource_id, name, description, allow_anonymous, created_at";

pub struct ResourceRepo;

impl ResourceRepo {
    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    /// Insert a resource; fails with a unique violation if the name exists.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        description: &str,
    ) -> Result<Resource, sqlx::Error> {
        let query = format!(
            "INSERT INTO resources (name, description) VALUES ($1, $2) \
             RETURNING {RESOURCE_COLUMNS}"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(name)
            .bind(description)
            .fetch_one(pool)
            .await
    }

    /// Return the resource named `name`, creating it if absent.
    ///
    /// An existing row keeps its description.
    pub async fn get_or_create(
        pool: &PgPool,
        name: &str,
        description: &str,
    ) -> Result<Resource, sqlx::Error> {
        let query = format!(
            "INSERT INTO resources (name, description) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING {RESOURCE_COLUMNS}"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(name)
            .bind(description)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Resource>, sqlx::Error> {
        let query = format!("SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY name");
        sqlx::query_as::<_, Resource>(&query).fetch_all(pool).await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE name = $1");
        sqlx::query_as::<_, Resource>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Sub-resources
    // -----------------------------------------------------------------------

    pub async fn create_sub_resource(
        pool: &PgPool,
        input: &NewSubResource,
    ) -> Result<SubResource, sqlx::Error> {
        let query = format!(
            "INSERT INTO sub_resources (resource_id, name, description, allow_anonymous) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SUB_RESOURCE_COLUMNS}"
        );
        sqlx::query_as::<_, SubResource>(&query)
            .bind(input.resource_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.allow_anonymous)
            .fetch_one(pool)
            .await
    }

    /// Return the sub-resource, creating it if absent. An existing row keeps
    /// its description and anonymous flag.
    pub async fn get_or_create_sub_resource(
        pool: &PgPool,
        input: &NewSubResource,
    ) -> Result<SubResource, sqlx::Error> {
        let query = format!(
            "INSERT INTO sub_resources (resource_id, name, description, allow_anonymous) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (resource_id, name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING {SUB_RESOURCE_COLUMNS}"
        );
        sqlx::query_as::<_, SubResource>(&query)
            .bind(input.resource_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.allow_anonymous)
            .fetch_one(pool)
            .await
    }

    pub async fn list_sub_resources(pool: &PgPool) -> Result<Vec<SubResource>, sqlx::Error> {
        let query = format!(
            "SELECT {SUB_RESOURCE_COLUMNS} FROM sub_resources ORDER BY resource_id, name"
        );
        sqlx::query_as::<_, SubResource>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find a sub-resource by its own name and its resource's name.
    pub async fn find_sub_resource(
        pool: &PgPool,
        resource_name: &str,
        sub_resource_name: &str,
    ) -> Result<Option<SubResource>, sqlx::Error> {
        let query = "\
            SELECT s.id, s.resource_id, s.name, s.description, s.allow_anonymous, s.created_at \
            FROM sub_resources s \
            JOIN resources r ON r.id = s.resource_id \
            WHERE r.name = $1 AND s.name = $2";
        sqlx::query_as::<_, SubResource>(query)
            .bind(resource_name)
            .bind(sub_resource_name)
            .fetch_optional(pool)
            .await
    }
}
