use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse, MeResponse},
    entity::Role,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    repositories::users,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(user_id: Uuid, role: Role, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let expiration = Duration::try_hours(ttl_hours)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Resolves the user a token was issued for. Unknown and deactivated users
/// are treated as unauthenticated.
pub async fn load_principal<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<AuthUser> {
    let user = users::find_by_id(conn, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.active {
        tracing::info!(user_id = %user.id, "inactive user rejected");
        return Err(AppError::Unauthorized);
    }

    Ok(AuthUser {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    })
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = users::find_by_email(&state.orm, email.trim()).await?;

    let user = match user {
        Some(u) if u.active => u,
        _ => return Err(AppError::bad_request("Invalid email or password")),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::bad_request("Invalid email or password"));
    }

    let token = issue_token(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
    )?;

    tracing::info!(user_id = %user.id, role = ?user.role, "user logged in");
    audit::record(
        &state.pool,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

pub fn current_user(user: &AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::success(
        "Current user",
        MeResponse {
            id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            roles: vec![user.authority().to_string()],
            authenticated: true,
        },
        Some(Meta::empty()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("senha123").expect("hash");
        assert_ne!(hash, "senha123");
        assert!(verify_password("senha123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn out_of_range_ttl_is_an_internal_error() {
        let result = issue_token(Uuid::new_v4(), Role::Admin, "secret", i64::MAX);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn garbage_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn me_carries_a_single_authority() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            name: "Prof. Maria".into(),
            email: "maria.santos@escola.com".into(),
            role: Role::Instructor,
        };
        let resp = current_user(&user);
        let data = resp.data.expect("me data");
        assert_eq!(data.roles, vec!["ROLE_INSTRUCTOR".to_string()]);
        assert!(data.authenticated);
    }
}
