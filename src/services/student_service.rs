use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::students::{StudentList, StudentRequest},
    entity::students::{ActiveModel, Model as StudentModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Student,
    repositories::{enrollments, students},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation::{
        average_progress, normalize_optional, require_email, require_name, require_national_id,
    },
};

struct ValidStudent {
    name: String,
    email: String,
    national_id: String,
    phone: Option<String>,
}

fn validate_student(payload: StudentRequest) -> AppResult<ValidStudent> {
    Ok(ValidStudent {
        name: require_name(&payload.name, "Student")?,
        email: require_email(&payload.email)?,
        national_id: require_national_id(&payload.national_id)?,
        phone: normalize_optional(payload.phone),
    })
}

/// Email and national id must not belong to any student other than `own_id`.
async fn ensure_unique<C: ConnectionTrait>(
    conn: &C,
    student: &ValidStudent,
    own_id: Option<Uuid>,
) -> AppResult<()> {
    if students::email_taken(conn, &student.email, own_id).await? {
        return Err(AppError::bad_request("Email is already registered"));
    }
    if students::national_id_taken(conn, &student.national_id, own_id).await? {
        return Err(AppError::bad_request("National id is already registered"));
    }
    Ok(())
}

pub async fn list_students(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<StudentList>> {
    let (page, limit, offset) = pagination.normalize();
    let (rows, total) = students::find_active(&state.orm, limit as u64, offset as u64).await?;
    let items = students_from_entities(&state.orm, rows).await?;

    let meta = Meta::new(page, limit, total as i64);
    Ok(ApiResponse::success("Students", StudentList { items }, Some(meta)))
}

pub async fn search_students(
    state: &AppState,
    name: &str,
) -> AppResult<ApiResponse<StudentList>> {
    tracing::debug!(name, "searching students");
    let rows = students::search_by_name(&state.orm, name).await?;
    let items = students_from_entities(&state.orm, rows).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Students",
        StudentList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_student(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Student>> {
    let student = students::find_by_id(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Student", id))?;
    let mut items = students_from_entities(&state.orm, vec![student]).await?;
    let student = items
        .pop()
        .ok_or_else(|| AppError::not_found("Student", id))?;
    Ok(ApiResponse::success("Student", student, None))
}

pub async fn create_student(
    state: &AppState,
    actor: &AuthUser,
    payload: StudentRequest,
) -> AppResult<ApiResponse<Student>> {
    let valid = validate_student(payload)?;
    ensure_unique(&state.orm, &valid, None).await?;

    tracing::info!(email = %valid.email, "creating student");
    let student = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(valid.name),
        email: Set(valid.email),
        national_id: Set(valid.national_id),
        phone: Set(valid.phone),
        active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        actor.user_id,
        "student_create",
        "students",
        serde_json::json!({ "student_id": student.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Student created",
        student_from_entity(student, &[]),
        Some(Meta::empty()),
    ))
}

pub async fn update_student(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: StudentRequest,
) -> AppResult<ApiResponse<Student>> {
    let existing = students::find_by_id(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Student", id))?;

    let valid = validate_student(payload)?;
    ensure_unique(&state.orm, &valid, Some(id)).await?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(valid.name);
    active.email = Set(valid.email);
    active.national_id = Set(valid.national_id);
    active.phone = Set(valid.phone);
    active.updated_at = Set(Utc::now().into());
    let student = active.update(&state.orm).await?;
    tracing::info!(student_id = %student.id, "student updated");

    audit::record(
        &state.pool,
        actor.user_id,
        "student_update",
        "students",
        serde_json::json!({ "student_id": student.id }),
    )
    .await;

    let mut items = students_from_entities(&state.orm, vec![student]).await?;
    let student = items
        .pop()
        .ok_or_else(|| AppError::not_found("Student", id))?;
    Ok(ApiResponse::success("Updated", student, Some(Meta::empty())))
}

pub async fn deactivate_student(state: &AppState, actor: &AuthUser, id: Uuid) -> AppResult<()> {
    let existing = students::find_by_id(&state.orm, id)
        .await?
        .ok_or_else(|| AppError::not_found("Student", id))?;

    let mut active: ActiveModel = existing.into();
    active.active = Set(false);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;
    tracing::info!(student_id = %id, "student deactivated");

    audit::record(
        &state.pool,
        actor.user_id,
        "student_deactivate",
        "students",
        serde_json::json!({ "student_id": id }),
    )
    .await;

    Ok(())
}

async fn students_from_entities<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<StudentModel>,
) -> Result<Vec<Student>, DbErr> {
    let ids = rows.iter().map(|s| s.id).collect();
    let progress = enrollments::progress_by_students(conn, ids).await?;
    Ok(rows
        .into_iter()
        .map(|model| {
            let values = progress.get(&model.id).map(Vec::as_slice).unwrap_or(&[]);
            student_from_entity(model, values)
        })
        .collect())
}

fn student_from_entity(model: StudentModel, progress: &[f64]) -> Student {
    Student {
        id: model.id,
        name: model.name,
        email: model.email,
        national_id: model.national_id,
        phone: model.phone,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        total_courses: progress.len() as i64,
        average_progress: average_progress(progress),
    }
}
