use axum::extract::FromRef;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::AuthResponse;
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::repo_types::User;
use crate::users::services::{create_user, load_view};
use crate::views::UserView;

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

/// Signs a token for `user` and bundles it with the user's view.
async fn issue(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let issued = keys.sign(user.id, user.role)?;
    let user = load_view(state, user).await?;
    Ok(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    })
}

pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<AuthResponse> {
    let user = match state.users.find_by_email(email).await? {
        Some(u) if u.is_active => u,
        Some(u) => {
            warn!(user_id = %u.id, "login for inactive user");
            return Err(invalid_credentials());
        }
        None => {
            warn!("login unknown email");
            return Err(invalid_credentials());
        }
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    info!(user_id = %user.id, "user logged in");
    issue(state, user).await
}

/// Creates a regular user and logs them straight in.
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> AppResult<AuthResponse> {
    let hash = hash_password(password)?;
    let user = create_user(state, name, email, hash).await?;
    info!(user_id = %user.id, "user registered");
    issue(state, user).await
}

pub async fn current_user(state: &AppState, user_id: Uuid) -> AppResult<Option<UserView>> {
    match state.users.find_by_id(user_id).await? {
        Some(user) => Ok(Some(load_view(state, user).await?)),
        None => Ok(None),
    }
}
