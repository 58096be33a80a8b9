use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch},
};
use uuid::Uuid;

use crate::{
    dto::enrollments::{EnrollRequest, EnrollmentList, ProgressRequest},
    error::AppResult,
    extract::JsonBody,
    middleware::auth::{AuthUser, ensure_enrollment_access},
    models::Enrollment,
    response::ApiResponse,
    services::enrollment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enrollments).post(enroll))
        .route("/{id}", delete(cancel_enrollment))
        .route("/{id}/progress", patch(update_progress))
        .route("/student/{student_id}", get(list_by_student))
        .route("/course/{course_id}", get(list_by_course))
}

#[utoipa::path(
    get,
    path = "/api/enrollments",
    responses(
        (status = 200, description = "List enrollments", body = ApiResponse<EnrollmentList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<EnrollmentList>>> {
    ensure_enrollment_access(&user)?;
    let resp = enrollment_service::list_enrollments(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/enrollments/student/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Enrollments of a student", body = ApiResponse<EnrollmentList>),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
pub async fn list_by_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(student_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<EnrollmentList>>> {
    ensure_enrollment_access(&user)?;
    let resp = enrollment_service::list_by_student(&state, student_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/enrollments/course/{course_id}",
    params(("course_id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrollments of a course", body = ApiResponse<EnrollmentList>),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
pub async fn list_by_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<EnrollmentList>>> {
    ensure_enrollment_access(&user)?;
    let resp = enrollment_service::list_by_course(&state, course_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Student enrolled", body = ApiResponse<Enrollment>),
        (status = 400, description = "Inactive entity, no vacancy or already enrolled"),
        (status = 404, description = "Student or course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<EnrollRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Enrollment>>)> {
    ensure_enrollment_access(&user)?;
    let resp = enrollment_service::enroll(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/enrollments/{id}",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    responses(
        (status = 204, description = "Enrollment cancelled"),
        (status = 400, description = "Enrollment is not active"),
        (status = 404, description = "Enrollment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
pub async fn cancel_enrollment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_enrollment_access(&user)?;
    enrollment_service::cancel(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/enrollments/{id}/progress",
    params(("id" = Uuid, Path, description = "Enrollment ID")),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Progress updated", body = ApiResponse<Enrollment>),
        (status = 400, description = "Enrollment not active or progress out of range"),
        (status = 404, description = "Enrollment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
pub async fn update_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ProgressRequest>,
) -> AppResult<Json<ApiResponse<Enrollment>>> {
    ensure_enrollment_access(&user)?;
    let resp = enrollment_service::update_progress(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
