use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{NewUser, Role, User, UserChanges};
use crate::auth::password::hash_password;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::state::AppState;
use crate::views::UserView;

fn email_taken() -> AppError {
    AppError::Conflict("Email already exists".into())
}

/// Attaches the user's expenses (each with its category).
pub(crate) async fn load_view(state: &AppState, user: User) -> AppResult<UserView> {
    let expenses = state.expenses.list_for_users(&[user.id]).await?;
    Ok(UserView::project(user, expenses))
}

/// Inserts a regular, active user. The email must not already exist.
pub(crate) async fn create_user(
    state: &AppState,
    name: &str,
    email: &str,
    password_hash: String,
) -> AppResult<User> {
    if state.users.email_exists(email).await? {
        warn!("email already registered");
        return Err(email_taken());
    }

    let new = NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash,
        role: Role::User,
    };
    match state.users.create(new).await {
        Ok(user) => Ok(user),
        Err(e) if is_unique_violation(&e) => Err(email_taken()),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_all(state: &AppState) -> AppResult<Vec<UserView>> {
    let users = state.users.list_all().await?;
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let expenses = state.expenses.list_for_users(&ids).await?;
    Ok(UserView::project_all(users, expenses))
}

pub async fn get_by_id(state: &AppState, id: Uuid) -> AppResult<Option<UserView>> {
    match state.users.find_by_id(id).await? {
        Some(user) => Ok(Some(load_view(state, user).await?)),
        None => Ok(None),
    }
}

pub async fn create(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> AppResult<UserView> {
    let hash = hash_password(password)?;
    let user = create_user(state, name, email, hash).await?;
    info!(user_id = %user.id, "user created");
    load_view(state, user).await
}

/// Overwrites name and email; the password only when a non-empty one is given.
pub async fn update(
    state: &AppState,
    id: Uuid,
    name: &str,
    email: &str,
    password: Option<&str>,
) -> AppResult<UserView> {
    let Some(existing) = state.users.find_by_id(id).await? else {
        return Err(AppError::NotFound(format!("User with ID {id} not found")));
    };

    if existing.email != email && state.users.email_exists(email).await? {
        return Err(email_taken());
    }

    let password_hash = match password.filter(|p| !p.is_empty()) {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };
    let changes = UserChanges {
        name: name.to_string(),
        email: email.to_string(),
        password_hash,
    };

    let user = match state.users.update(id, changes).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::NotFound(format!("User with ID {id} not found"))),
        Err(e) if is_unique_violation(&e) => return Err(email_taken()),
        Err(e) => return Err(e.into()),
    };
    info!(user_id = %user.id, "user updated");
    load_view(state, user).await
}

pub async fn delete(state: &AppState, id: Uuid) -> AppResult<bool> {
    let deleted = state.users.delete(id).await?;
    if deleted {
        info!(user_id = %id, "user deleted");
    }
    Ok(deleted)
}
