//! Enrollment lifecycle and seat accounting.
//!
//! Every mutation runs in one transaction that covers both the enrollment row
//! and the course's `available_seats` counter. Returning early with an error
//! drops the transaction, which rolls back whatever was already written.

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set, SqlErr, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit,
    dto::enrollments::{EnrollRequest, EnrollmentList, ProgressRequest},
    entity::enrollments::{ActiveModel, EnrollmentStatus, Model as EnrollmentModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Enrollment,
    repositories::{courses, enrollments, students},
    response::{ApiResponse, Meta},
    state::AppState,
    validation::{MAX_PROGRESS, check_progress},
};

pub const NO_VACANCY: &str = "Course has no available seats";
pub const ALREADY_ENROLLED: &str = "Student is already enrolled in this course";

pub async fn list_enrollments(state: &AppState) -> AppResult<ApiResponse<EnrollmentList>> {
    let rows = enrollments::find_all(&state.orm).await?;
    list_response(&state.orm, rows).await
}

pub async fn list_by_student(
    state: &AppState,
    student_id: Uuid,
) -> AppResult<ApiResponse<EnrollmentList>> {
    if students::find_by_id(&state.orm, student_id).await?.is_none() {
        return Err(AppError::not_found("Student", student_id));
    }
    let rows = enrollments::find_by_student(&state.orm, student_id).await?;
    list_response(&state.orm, rows).await
}

pub async fn list_by_course(
    state: &AppState,
    course_id: Uuid,
) -> AppResult<ApiResponse<EnrollmentList>> {
    if courses::find_by_id(&state.orm, course_id).await?.is_none() {
        return Err(AppError::not_found("Course", course_id));
    }
    let rows = enrollments::find_by_course(&state.orm, course_id).await?;
    list_response(&state.orm, rows).await
}

/// Enrolls a student and takes one seat of the course.
///
/// Checks run in a fixed order and the first failure wins: the student exists
/// and is active, the course exists and is active, the course has a free
/// seat, and the pair is not enrolled yet.
pub async fn enroll(
    state: &AppState,
    actor: &AuthUser,
    payload: EnrollRequest,
) -> AppResult<ApiResponse<Enrollment>> {
    let EnrollRequest {
        student_id,
        course_id,
    } = payload;
    tracing::info!(%student_id, %course_id, "enrolling student");

    let txn = state.orm.begin().await?;

    let student = students::find_by_id(&txn, student_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student", student_id))?;
    if !student.active {
        return Err(AppError::bad_request("Inactive student cannot enroll"));
    }

    let course = courses::find_by_id_for_update(&txn, course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;
    if !course.active {
        return Err(AppError::bad_request(
            "Inactive course does not accept new enrollments",
        ));
    }
    if !course.has_vacancy() {
        return Err(AppError::bad_request(NO_VACANCY));
    }
    if enrollments::exists_for_pair(&txn, student_id, course_id).await? {
        return Err(AppError::bad_request(ALREADY_ENROLLED));
    }

    let enrollment = ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(student_id),
        course_id: Set(course_id),
        status: Set(EnrollmentStatus::Active),
        progress: Set(0.0),
        enrolled_at: NotSet,
        completed_at: Set(None),
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(duplicate_pair)?;

    if !courses::take_seat(&txn, course_id).await? {
        return Err(AppError::bad_request(NO_VACANCY));
    }

    txn.commit().await?;
    tracing::info!(enrollment_id = %enrollment.id, "enrollment created");

    audit::record(
        &state.pool,
        actor.user_id,
        "enrollment_create",
        "enrollments",
        serde_json::json!({
            "enrollment_id": enrollment.id,
            "student_id": student_id,
            "course_id": course_id,
        }),
    )
    .await;

    let enrollment = Enrollment {
        student_name: Some(student.name),
        course_name: Some(course.name),
        ..enrollment_from_entity(enrollment)
    };
    Ok(ApiResponse::success(
        "Enrollment created",
        enrollment,
        Some(Meta::empty()),
    ))
}

/// Cancels an active enrollment and gives its seat back.
pub async fn cancel(state: &AppState, actor: &AuthUser, id: Uuid) -> AppResult<()> {
    tracing::info!(enrollment_id = %id, "cancelling enrollment");
    let txn = state.orm.begin().await?;

    let existing = enrollments::find_by_id_for_update(&txn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Enrollment", id))?;
    if !existing.is_active() {
        return Err(AppError::bad_request(
            "Enrollment is already cancelled or completed",
        ));
    }
    let course_id = existing.course_id;

    let mut active: ActiveModel = existing.into();
    active.status = Set(EnrollmentStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    if !courses::release_seat(&txn, course_id).await? {
        // Counter already equals capacity: clamp instead of overflowing.
        tracing::warn!(%course_id, "seat counter already at capacity, left unchanged");
    }

    txn.commit().await?;
    tracing::info!(enrollment_id = %id, "enrollment cancelled");

    audit::record(
        &state.pool,
        actor.user_id,
        "enrollment_cancel",
        "enrollments",
        serde_json::json!({ "enrollment_id": id, "course_id": course_id }),
    )
    .await;

    Ok(())
}

/// Records progress on an active enrollment. Reaching 100 completes it; a
/// completed enrollment never becomes active again.
pub async fn update_progress(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: ProgressRequest,
) -> AppResult<ApiResponse<Enrollment>> {
    tracing::info!(enrollment_id = %id, progress = payload.progress, "updating progress");
    let txn = state.orm.begin().await?;

    let existing = enrollments::find_by_id_for_update(&txn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Enrollment", id))?;
    if !existing.is_active() {
        return Err(AppError::bad_request(
            "Cannot update progress of an inactive enrollment",
        ));
    }
    let progress = check_progress(payload.progress)?;

    let now = Utc::now();
    let mut active: ActiveModel = existing.into();
    active.progress = Set(progress);
    active.updated_at = Set(now.into());
    if progress >= MAX_PROGRESS {
        active.status = Set(EnrollmentStatus::Completed);
        active.completed_at = Set(Some(now.into()));
    }
    let enrollment = active.update(&txn).await?;

    txn.commit().await?;
    if enrollment.status == EnrollmentStatus::Completed {
        tracing::info!(enrollment_id = %id, "enrollment completed");
    }

    audit::record(
        &state.pool,
        actor.user_id,
        "enrollment_progress",
        "enrollments",
        serde_json::json!({ "enrollment_id": id, "progress": progress }),
    )
    .await;

    let mut items = enrollments_from_entities(&state.orm, vec![enrollment]).await?;
    let enrollment = items
        .pop()
        .ok_or_else(|| AppError::not_found("Enrollment", id))?;
    Ok(ApiResponse::success(
        "Progress updated",
        enrollment,
        Some(Meta::empty()),
    ))
}

/// A racing request can pass the pair pre-check; the unique index still
/// rejects it and the caller sees the same message.
fn duplicate_pair(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::bad_request(ALREADY_ENROLLED),
        _ => err.into(),
    }
}

async fn list_response<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<EnrollmentModel>,
) -> AppResult<ApiResponse<EnrollmentList>> {
    let items = enrollments_from_entities(conn, rows).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Enrollments",
        EnrollmentList { items },
        Some(Meta::new(1, total, total)),
    ))
}

async fn enrollments_from_entities<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<EnrollmentModel>,
) -> Result<Vec<Enrollment>, DbErr> {
    let student_ids = rows.iter().map(|e| e.student_id).collect();
    let course_ids = rows.iter().map(|e| e.course_id).collect();
    let student_names = students::names_by_id(conn, student_ids).await?;
    let course_names = courses::names_by_id(conn, course_ids).await?;

    Ok(rows
        .into_iter()
        .map(|model| Enrollment {
            student_name: student_names.get(&model.student_id).cloned(),
            course_name: course_names.get(&model.course_id).cloned(),
            ..enrollment_from_entity(model)
        })
        .collect())
}

fn enrollment_from_entity(model: EnrollmentModel) -> Enrollment {
    Enrollment {
        id: model.id,
        student_id: model.student_id,
        student_name: None,
        course_id: model.course_id,
        course_name: None,
        status: model.status,
        progress: model.progress,
        enrolled_at: model.enrolled_at.with_timezone(&Utc),
        completed_at: model.completed_at.map(|dt| dt.with_timezone(&Utc)),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
