use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::entity::enrollments::{Column, Entity as Enrollments, Model};

pub async fn find_by_id_for_update<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<Model>, DbErr> {
    Enrollments::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await
}

pub async fn find_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<Model>, DbErr> {
    Enrollments::find()
        .order_by_desc(Column::EnrolledAt)
        .all(conn)
        .await
}

pub async fn find_by_student<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
) -> Result<Vec<Model>, DbErr> {
    Enrollments::find()
        .filter(Column::StudentId.eq(student_id))
        .order_by_desc(Column::EnrolledAt)
        .all(conn)
        .await
}

pub async fn find_by_course<C: ConnectionTrait>(
    conn: &C,
    course_id: Uuid,
) -> Result<Vec<Model>, DbErr> {
    Enrollments::find()
        .filter(Column::CourseId.eq(course_id))
        .order_by_desc(Column::EnrolledAt)
        .all(conn)
        .await
}

pub async fn exists_for_pair<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<bool, DbErr> {
    let count = Enrollments::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::CourseId.eq(course_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

#[derive(Debug, FromQueryResult)]
struct CourseCountRow {
    course_id: Uuid,
    total: i64,
}

/// Number of enrollments (any status) per course.
pub async fn count_by_courses<C: ConnectionTrait>(
    conn: &C,
    course_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, i64>, DbErr> {
    if course_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Enrollments::find()
        .select_only()
        .column(Column::CourseId)
        .column_as(Expr::col(Column::Id).count(), "total")
        .filter(Column::CourseId.is_in(course_ids))
        .group_by(Column::CourseId)
        .into_model::<CourseCountRow>()
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| (row.course_id, row.total)).collect())
}

/// Progress values of every enrollment, grouped by student.
pub async fn progress_by_students<C: ConnectionTrait>(
    conn: &C,
    student_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<f64>>, DbErr> {
    if student_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Enrollments::find()
        .select_only()
        .columns([Column::StudentId, Column::Progress])
        .filter(Column::StudentId.is_in(student_ids))
        .into_tuple::<(Uuid, f64)>()
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<f64>> = HashMap::new();
    for (student_id, progress) in rows {
        grouped.entry(student_id).or_default().push(progress);
    }
    Ok(grouped)
}
