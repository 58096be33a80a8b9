use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    entity::{
        Role,
        users::{ActiveModel, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    repositories::users,
    response::{ApiResponse, Meta},
    services::auth_service::hash_password,
    state::AppState,
    validation::{require_email, require_name, require_password},
};

pub async fn list_users(state: &AppState) -> AppResult<ApiResponse<UserList>> {
    let items: Vec<User> = users::find_all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn list_instructors(state: &AppState) -> AppResult<ApiResponse<UserList>> {
    let items: Vec<User> = users::find_by_role(&state.orm, Role::Instructor)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Instructors",
        UserList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_user(state: &AppState, id: Uuid) -> AppResult<ApiResponse<User>> {
    let user = users::find_by_id(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    Ok(ApiResponse::success("User", user_from_entity(user), None))
}

pub async fn create_user(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let name = require_name(&payload.name, "User")?;
    let email = require_email(&payload.email)?;
    require_password(&payload.password)?;

    if users::email_taken(&state.orm, &email, None).await? {
        return Err(AppError::bad_request("Email is already registered"));
    }

    tracing::info!(email = %email, role = ?payload.role, "creating user");
    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(payload.role),
        active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        actor.user_id,
        "user_create",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = users::find_by_id(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(require_name(&name, "User")?);
    }
    if let Some(email) = payload.email {
        let email = require_email(&email)?;
        if users::email_taken(&state.orm, &email, Some(id)).await? {
            return Err(AppError::bad_request(
                "Email is already registered to another user",
            ));
        }
        active.email = Set(email);
    }
    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        require_password(&password)?;
        active.password_hash = Set(hash_password(&password)?);
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(is_active) = payload.active {
        active.active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let user = active.update(&state.orm).await?;
    tracing::info!(user_id = %user.id, "user updated");

    audit::record(
        &state.pool,
        actor.user_id,
        "user_update",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn deactivate_user(state: &AppState, actor: &AuthUser, id: Uuid) -> AppResult<()> {
    let existing = users::find_by_id(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;

    let mut active: ActiveModel = existing.into();
    active.active = Set(false);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;
    tracing::info!(user_id = %id, "user deactivated");

    audit::record(
        &state.pool,
        actor.user_id,
        "user_deactivate",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(())
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        role: model.role,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
