use sqlx::PgPool;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::core::security;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Ensures the configured first superuser exists. Runs at startup; an
/// existing account with the configured username is left untouched.
pub(crate) async fn ensure_superuser(db: &PgPool, settings: &Settings) -> anyhow::Result<()> {
    let username = settings.admin().first_superuser_username.trim();
    if username.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_USERNAME is empty, skipping superuser bootstrap");
        return Ok(());
    }

    if repositories::users::find_by_username(db, username).await?.is_some() {
        return Ok(());
    }

    let password = settings.admin().first_superuser_password.as_str();
    if password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD is empty, skipping superuser bootstrap");
        return Ok(());
    }

    let now = primitive_now_utc();
    let hashed = security::hash_password(password)?;
    let created = repositories::users::create(
        db,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password: hashed,
            full_name: "Superuser",
            role: UserRole::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(user_id = %created.id, username, "bootstrapped first superuser");
    Ok(())
}
