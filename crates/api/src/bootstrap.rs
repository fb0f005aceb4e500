//! Startup wiring: choose a store backend, seed the catalogue and create the
//! first administrator.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use civic_db::models::user::NewUser;
use civic_db::seed;
use civic_db::store::{MemoryAuthStore, PgAuthStore};
use civic_db::AuthStore;

use crate::auth::password::hash_password;
use crate::config::{BootstrapAdmin, ServerConfig};

/// Connect to PostgreSQL when `DATABASE_URL` is set, otherwise fall back to
/// the in-memory store.
pub async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn AuthStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
        return Ok(Arc::new(MemoryAuthStore::new()));
    };

    let pool = civic_db::create_pool(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    civic_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    civic_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Arc::new(PgAuthStore::new(pool)))
}

/// Bring a fresh or existing store up to date before serving requests.
pub async fn prepare_store(store: &dyn AuthStore, config: &ServerConfig) -> anyhow::Result<()> {
    if config.seed_catalog {
        seed::apply_catalog(store)
            .await
            .context("Failed to seed the catalogue")?;
    }

    if let Some(admin) = &config.bootstrap_admin {
        ensure_admin(store, admin).await?;
    }

    let purged = store.purge_expired_tokens(Utc::now()).await?;
    if purged > 0 {
        tracing::info!(purged, "Expired tokens removed");
    }
    Ok(())
}

/// Create the bootstrap administrator unless a user with that email exists.
/// An existing account is never modified.
async fn ensure_admin(store: &dyn AuthStore, admin: &BootstrapAdmin) -> anyhow::Result<()> {
    let email = admin.email.trim().to_lowercase();
    if store.find_user_by_email(&email).await?.is_some() {
        tracing::debug!(%email, "Bootstrap admin already exists");
        return Ok(());
    }

    let password_hash =
        hash_password(&admin.password).context("Failed to hash bootstrap admin password")?;
    let user = store
        .create_user(
            NewUser {
                email,
                password_hash,
                first_name: String::new(),
                last_name: String::new(),
                is_admin: true,
            },
            &[],
        )
        .await?;
    tracing::info!(user_id = user.id, email = %user.email, "Bootstrap admin created");
    Ok(())
}
