//! Repository for the `user_types` table.

use civic_core::types::DbId;
use sqlx::PgPool;

use crate::models::user_type::{NewUserType, UserType};

const COLUMNS: &str = "id, name, description, is_municipal_staff, created_at";

pub struct UserTypeRepo;

impl UserTypeRepo {
    /// Return the user type named `input.name`, creating it if absent.
    pub async fn get_or_create(pool: &PgPool, input: &NewUserType) -> Result<UserType, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_types (name, description, is_municipal_staff) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserType>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_municipal_staff)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<UserType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_types ORDER BY name");
        sqlx::query_as::<_, UserType>(&query).fetch_all(pool).await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<UserType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_types WHERE name = $1");
        sqlx::query_as::<_, UserType>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Find every user type whose name is in `names`. Unknown names are
    /// silently absent from the result.
    pub async fn find_by_names(pool: &PgPool, names: &[String]) -> Result<Vec<UserType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_types WHERE name = ANY($1) ORDER BY name");
        sqlx::query_as::<_, UserType>(&query)
            .bind(names)
            .fetch_all(pool)
            .await
    }

    /// The user types assigned to a user.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<UserType>, sqlx::Error> {
        let query = "\
            SELECT t.id, t.name, t.description, t.is_municipal_staff, t.created_at \
            FROM user_types t \
            JOIN user_user_types ut ON ut.user_type_id = t.id \
            WHERE ut.user_id = $1 \
            ORDER BY t.name";
        sqlx::query_as::<_, UserType>(query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
