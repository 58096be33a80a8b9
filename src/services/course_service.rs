use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    dto::courses::{CourseList, CourseRequest},
    entity::courses::{ActiveModel, Model as CourseModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Course,
    repositories::{courses, enrollments, users},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation::{normalize_optional, require_name, require_positive, resize_seats},
};

struct ValidCourse {
    name: String,
    description: Option<String>,
    duration_hours: i32,
    total_seats: i32,
    instructor_id: Uuid,
}

fn validate_course(payload: CourseRequest) -> AppResult<ValidCourse> {
    Ok(ValidCourse {
        name: require_name(&payload.name, "Course")?,
        description: normalize_optional(payload.description),
        duration_hours: require_positive(
            payload.duration_hours,
            "Duration must be greater than zero",
        )?,
        total_seats: require_positive(
            payload.total_seats,
            "Number of seats must be greater than zero",
        )?,
        instructor_id: payload.instructor_id,
    })
}

async fn ensure_instructor<C: ConnectionTrait>(conn: &C, instructor_id: Uuid) -> AppResult<()> {
    let instructor = users::find_by_id(conn, instructor_id)
        .await?
        .ok_or_else(|| AppError::not_found("Instructor", instructor_id))?;
    if !instructor.role.can_teach() {
        return Err(AppError::bad_request(
            "Responsible user must be an instructor or admin",
        ));
    }
    if !instructor.active {
        return Err(AppError::bad_request("Responsible instructor is inactive"));
    }
    Ok(())
}

pub async fn list_courses(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CourseList>> {
    let (page, limit, offset) = pagination.normalize();
    let (rows, total) = courses::find_active(&state.orm, limit as u64, offset as u64).await?;
    let items = courses_from_entities(&state.orm, rows).await?;

    let meta = Meta::new(page, limit, total as i64);
    Ok(ApiResponse::success("Courses", CourseList { items }, Some(meta)))
}

pub async fn list_available_courses(state: &AppState) -> AppResult<ApiResponse<CourseList>> {
    let rows = courses::find_with_vacancy(&state.orm).await?;
    let items = courses_from_entities(&state.orm, rows).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Courses with available seats",
        CourseList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn search_courses(state: &AppState, name: &str) -> AppResult<ApiResponse<CourseList>> {
    tracing::debug!(name, "searching courses");
    let rows = courses::search_by_name(&state.orm, name).await?;
    let items = courses_from_entities(&state.orm, rows).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Courses",
        CourseList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_course(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Course>> {
    let course = courses::find_by_id(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Course", id))?;
    let course = course_with_details(&state.orm, course).await?;
    Ok(ApiResponse::success("Course", course, None))
}

pub async fn create_course(
    state: &AppState,
    actor: &AuthUser,
    payload: CourseRequest,
) -> AppResult<ApiResponse<Course>> {
    let valid = validate_course(payload)?;
    ensure_instructor(&state.orm, valid.instructor_id).await?;

    tracing::info!(name = %valid.name, seats = valid.total_seats, "creating course");
    let course = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(valid.name),
        description: Set(valid.description),
        duration_hours: Set(valid.duration_hours),
        total_seats: Set(valid.total_seats),
        available_seats: Set(valid.total_seats),
        instructor_id: Set(valid.instructor_id),
        active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        actor.user_id,
        "course_create",
        "courses",
        serde_json::json!({ "course_id": course.id }),
    )
    .await;

    let course = course_with_details(&state.orm, course).await?;
    Ok(ApiResponse::success("Course created", course, Some(Meta::empty())))
}

/// Seat changes are applied against the locked row so a concurrent
/// enrollment cannot slip between the occupancy check and the write.
pub async fn update_course(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: CourseRequest,
) -> AppResult<ApiResponse<Course>> {
    let txn = state.orm.begin().await?;

    let existing = courses::find_by_id_for_update(&txn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Course", id))?;

    let valid = validate_course(payload)?;
    if valid.instructor_id != existing.instructor_id {
        ensure_instructor(&txn, valid.instructor_id).await?;
    }

    let available = if valid.total_seats != existing.total_seats {
        resize_seats(
            existing.total_seats,
            existing.available_seats,
            valid.total_seats,
        )?
    } else {
        existing.available_seats
    };

    let mut active: ActiveModel = existing.into();
    active.name = Set(valid.name);
    active.description = Set(valid.description);
    active.duration_hours = Set(valid.duration_hours);
    active.total_seats = Set(valid.total_seats);
    active.available_seats = Set(available);
    active.instructor_id = Set(valid.instructor_id);
    active.updated_at = Set(Utc::now().into());
    let course = active.update(&txn).await?;

    txn.commit().await?;
    tracing::info!(
        course_id = %course.id,
        total_seats = course.total_seats,
        available_seats = course.available_seats,
        "course updated"
    );

    audit::record(
        &state.pool,
        actor.user_id,
        "course_update",
        "courses",
        serde_json::json!({
            "course_id": course.id,
            "total_seats": course.total_seats,
            "available_seats": course.available_seats,
        }),
    )
    .await;

    let course = course_with_details(&state.orm, course).await?;
    Ok(ApiResponse::success("Updated", course, Some(Meta::empty())))
}

pub async fn deactivate_course(state: &AppState, actor: &AuthUser, id: Uuid) -> AppResult<()> {
    let existing = courses::find_by_id(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Course", id))?;

    let mut active: ActiveModel = existing.into();
    active.active = Set(false);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;
    tracing::info!(course_id = %id, "course deactivated");

    audit::record(
        &state.pool,
        actor.user_id,
        "course_deactivate",
        "courses",
        serde_json::json!({ "course_id": id }),
    )
    .await;

    Ok(())
}

async fn course_with_details<C: ConnectionTrait>(
    conn: &C,
    course: CourseModel,
) -> AppResult<Course> {
    let id = course.id;
    courses_from_entities(conn, vec![course])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Course", id))
}

async fn courses_from_entities<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<CourseModel>,
) -> Result<Vec<Course>, DbErr> {
    let instructor_ids = rows.iter().map(|c| c.instructor_id).collect();
    let course_ids = rows.iter().map(|c| c.id).collect();
    let instructors = users::names_by_id(conn, instructor_ids).await?;
    let counts = enrollments::count_by_courses(conn, course_ids).await?;

    Ok(rows
        .into_iter()
        .map(|model| Course {
            instructor_name: instructors.get(&model.instructor_id).cloned(),
            enrollment_count: counts.get(&model.id).copied().unwrap_or(0),
            id: model.id,
            name: model.name,
            description: model.description,
            duration_hours: model.duration_hours,
            total_seats: model.total_seats,
            available_seats: model.available_seats,
            instructor_id: model.instructor_id,
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
        .collect())
}
