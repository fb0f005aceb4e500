//! Repository for the `users` and `user_user_types` tables.

use civic_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::user::{NewUser, User};

const COLUMNS: &str = "\
    id, email, password_hash, first_name, last_name, is_active, is_admin, \
    is_municipal_staff, last_login_at, created_at, updated_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert a user and assign `user_type_ids` in one transaction.
    pub async fn create(
        pool: &PgPool,
        input: &NewUser,
        user_type_ids: &[DbId],
    ) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, is_admin) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.is_admin)
            .fetch_one(&mut *tx)
            .await?;

        let user = Self::assign_types(&mut tx, user.id, user_type_ids).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Replace a user's types. Returns `None` if the user does not exist.
    pub async fn set_types(
        pool: &PgPool,
        user_id: DbId,
        user_type_ids: &[DbId],
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<(DbId,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query("DELETE FROM user_user_types WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let user = Self::assign_types(&mut tx, user_id, user_type_ids).await?;
        tx.commit().await?;
        Ok(Some(user))
    }

    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Insert the type links and recompute `is_municipal_staff`.
    async fn assign_types(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
        user_type_ids: &[DbId],
    ) -> Result<User, sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_user_types (user_id, user_type_id) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(user_type_ids)
        .execute(&mut **tx)
        .await?;

        let query = format!(
            "UPDATE users SET \
                 is_municipal_staff = EXISTS ( \
                     SELECT 1 FROM user_user_types ut \
                     JOIN user_types t ON t.id = ut.user_type_id \
                     WHERE ut.user_id = $1 AND t.is_municipal_staff), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
    }
}
