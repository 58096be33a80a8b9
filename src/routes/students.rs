use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::students::{StudentList, StudentRequest},
    error::AppResult,
    extract::{JsonBody, QueryParams},
    middleware::auth::{AuthUser, ensure_staff},
    models::Student,
    response::ApiResponse,
    routes::params::{Pagination, SearchQuery},
    services::student_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/search", get(search_students))
        .route(
            "/{id}",
            get(get_student).put(update_student).delete(deactivate_student),
        )
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(Pagination),
    responses(
        (status = 200, description = "List active students", body = ApiResponse<StudentList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn list_students(
    State(state): State<AppState>,
    _user: AuthUser,
    QueryParams(pagination): QueryParams<Pagination>,
) -> AppResult<Json<ApiResponse<StudentList>>> {
    let resp = student_service::list_students(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/students/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Students whose name contains the term", body = ApiResponse<StudentList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn search_students(
    State(state): State<AppState>,
    _user: AuthUser,
    QueryParams(query): QueryParams<SearchQuery>,
) -> AppResult<Json<ApiResponse<StudentList>>> {
    let resp = student_service::search_students(&state, &query.name).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Get student", body = ApiResponse<Student>),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn get_student(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Student>>> {
    let resp = student_service::get_student(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = StudentRequest,
    responses(
        (status = 201, description = "Create student", body = ApiResponse<Student>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn create_student(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<StudentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Student>>)> {
    ensure_staff(&user)?;
    let resp = student_service::create_student(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = StudentRequest,
    responses(
        (status = 200, description = "Updated student", body = ApiResponse<Student>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn update_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<StudentRequest>,
) -> AppResult<Json<ApiResponse<Student>>> {
    ensure_staff(&user)?;
    let resp = student_service::update_student(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deactivated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn deactivate_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_staff(&user)?;
    student_service::deactivate_student(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
