use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::Role,
    error::AppError,
    services::auth_service,
    state::AppState,
};

/// The authenticated principal of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn authority(&self) -> &'static str {
        self.role.authority()
    }
}

pub fn ensure_any_role(user: &AuthUser, roles: &[Role]) -> Result<(), AppError> {
    if !roles.contains(&user.role) {
        tracing::debug!(user_id = %user.user_id, role = ?user.role, "role not allowed");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Full access to user records.
pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_any_role(user, &[Role::Admin])
}

/// Students and courses are managed by admins and instructors.
pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    ensure_any_role(user, &[Role::Admin, Role::Instructor])
}

pub fn ensure_enrollment_access(user: &AuthUser) -> Result<(), AppError> {
    ensure_any_role(user, &[Role::Admin, Role::Instructor, Role::Student])
}

pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        AppError::Unauthorized
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = bearer_token(auth_str).ok_or(AppError::Unauthorized)?;
        let claims = decode_claims(token, &state.config.jwt_secret)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

        auth_service::load_principal(&state.orm, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            name: "Someone".into(),
            email: "someone@escola.com".into(),
            role,
        }
    }

    #[test]
    fn user_records_are_admin_only() {
        assert!(ensure_admin(&principal(Role::Admin)).is_ok());
        assert!(matches!(
            ensure_admin(&principal(Role::Instructor)),
            Err(AppError::Forbidden)
        ));
        assert!(ensure_admin(&principal(Role::Student)).is_err());
    }

    #[test]
    fn staff_manage_students_and_courses() {
        assert!(ensure_staff(&principal(Role::Admin)).is_ok());
        assert!(ensure_staff(&principal(Role::Instructor)).is_ok());
        assert!(ensure_staff(&principal(Role::Student)).is_err());
    }

    #[test]
    fn every_role_reaches_enrollments() {
        for role in [Role::Admin, Role::Instructor, Role::Student] {
            assert!(ensure_enrollment_access(&principal(role)).is_ok());
        }
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer   "), None);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = auth_service::issue_token(Uuid::new_v4(), Role::Student, "secret-a", 1)
            .expect("token");
        assert!(decode_claims(&token, "secret-a").is_ok());
        assert!(matches!(
            decode_claims(&token, "secret-b"),
            Err(AppError::Unauthorized)
        ));
    }
}
