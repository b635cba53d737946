use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::RoleName;
use crate::repositories;

/// Creates or repairs the configured superuser account and guarantees it
/// holds the ADMIN role. The role rows themselves are seeded by migration.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let email = &admin.first_superuser_email;
    let now = primitive_now_utc();

    let user = repositories::users::find_by_identifier(state.db(), email).await?;

    if let Some(user) = user {
        let verified = user
            .hashed_password
            .as_deref()
            .map(|hash| {
                security::verify_password(&admin.first_superuser_password, hash).unwrap_or(false)
            })
            .unwrap_or(false);

        if !verified || !user.is_active {
            let hashed_password = security::hash_password(&admin.first_superuser_password)?;
            repositories::users::update(
                state.db(),
                &user.id,
                repositories::users::UpdateUser {
                    first_name: None,
                    last_name: None,
                    phone: None,
                    is_active: Some(true),
                    email_verified: Some(true),
                    hashed_password: Some(hashed_password),
                    updated_at: now,
                },
            )
            .await?;
            tracing::info!("Updated default superuser {email}");
        } else {
            tracing::info!("Default superuser already up to date");
        }

        repositories::roles::assign(state.db(), &user.id, RoleName::Admin).await?;
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email,
            username: "superadmin",
            hashed_password: Some(hashed_password),
            first_name: "Super",
            last_name: "Admin",
            phone: None,
            is_active: true,
            email_verified: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    repositories::roles::assign(state.db(), &user.id, RoleName::Admin).await?;

    tracing::info!("Created default superuser {email}");
    Ok(())
}
