use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use super::contains_pattern;
use crate::entity::courses::{Column, Entity as Courses, Model};

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Option<Model>, DbErr> {
    Courses::find_by_id(id).one(conn).await
}

/// Loads the course and holds its row lock until the surrounding
/// transaction ends.
pub async fn find_by_id_for_update<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<Model>, DbErr> {
    Courses::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await
}

pub async fn find_active<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
    offset: u64,
) -> Result<(Vec<Model>, u64), DbErr> {
    let finder = Courses::find()
        .filter(Column::Active.eq(true))
        .order_by_asc(Column::Name);
    let total = finder.clone().count(conn).await?;
    let items = finder.limit(limit).offset(offset).all(conn).await?;
    Ok((items, total))
}

pub async fn find_with_vacancy<C: ConnectionTrait>(conn: &C) -> Result<Vec<Model>, DbErr> {
    Courses::find()
        .filter(Column::Active.eq(true))
        .filter(Column::AvailableSeats.gt(0))
        .order_by_asc(Column::Name)
        .all(conn)
        .await
}

pub async fn search_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Vec<Model>, DbErr> {
    Courses::find()
        .filter(Expr::col(Column::Name).ilike(contains_pattern(name)))
        .order_by_asc(Column::Name)
        .all(conn)
        .await
}

/// Takes one seat if any is left. Returns false when the course is full.
pub async fn take_seat<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
    let result = Courses::update_many()
        .col_expr(
            Column::AvailableSeats,
            Expr::col(Column::AvailableSeats).sub(1),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .filter(Column::AvailableSeats.gt(0))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Gives one seat back unless the course is already at capacity.
/// Returns false when the counter was left untouched.
pub async fn release_seat<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
    let result = Courses::update_many()
        .col_expr(
            Column::AvailableSeats,
            Expr::col(Column::AvailableSeats).add(1),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .filter(Expr::col(Column::AvailableSeats).lt(Expr::col(Column::TotalSeats)))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn names_by_id<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, String>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Courses::find()
        .select_only()
        .columns([Column::Id, Column::Name])
        .filter(Column::Id.is_in(ids))
        .into_tuple::<(Uuid, String)>()
        .all(conn)
        .await?;
    Ok(rows.into_iter().collect())
}
