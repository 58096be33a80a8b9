use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::courses::{CourseList, CourseRequest},
    error::AppResult,
    extract::{JsonBody, QueryParams},
    middleware::auth::{AuthUser, ensure_staff},
    models::Course,
    response::ApiResponse,
    routes::params::{Pagination, SearchQuery},
    services::course_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/available", get(list_available_courses))
        .route("/search", get(search_courses))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(deactivate_course),
        )
}

#[utoipa::path(
    get,
    path = "/api/courses",
    params(Pagination),
    responses(
        (status = 200, description = "List active courses", body = ApiResponse<CourseList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn list_courses(
    State(state): State<AppState>,
    _user: AuthUser,
    QueryParams(pagination): QueryParams<Pagination>,
) -> AppResult<Json<ApiResponse<CourseList>>> {
    let resp = course_service::list_courses(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/courses/available",
    responses(
        (status = 200, description = "Active courses with free seats", body = ApiResponse<CourseList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn list_available_courses(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<CourseList>>> {
    let resp = course_service::list_available_courses(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/courses/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Courses whose name contains the term", body = ApiResponse<CourseList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn search_courses(
    State(state): State<AppState>,
    _user: AuthUser,
    QueryParams(query): QueryParams<SearchQuery>,
) -> AppResult<Json<ApiResponse<CourseList>>> {
    let resp = course_service::search_courses(&state, &query.name).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Get course", body = ApiResponse<Course>),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn get_course(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Course>>> {
    let resp = course_service::get_course(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CourseRequest,
    responses(
        (status = 201, description = "Create course", body = ApiResponse<Course>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(payload): JsonBody<CourseRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Course>>)> {
    ensure_staff(&user)?;
    let resp = course_service::create_course(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CourseRequest,
    responses(
        (status = 200, description = "Updated course", body = ApiResponse<Course>),
        (status = 400, description = "Validation failed or seats below occupancy"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn update_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CourseRequest>,
) -> AppResult<Json<ApiResponse<Course>>> {
    ensure_staff(&user)?;
    let resp = course_service::update_course(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deactivated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn deactivate_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_staff(&user)?;
    course_service::deactivate_course(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
