use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use super::contains_pattern;
use crate::entity::students::{Column, Entity as Students, Model};

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Option<Model>, DbErr> {
    Students::find_by_id(id).one(conn).await
}

/// One page of active students ordered by name, plus the total count.
pub async fn find_active<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
    offset: u64,
) -> Result<(Vec<Model>, u64), DbErr> {
    let finder = Students::find()
        .filter(Column::Active.eq(true))
        .order_by_asc(Column::Name);
    let total = finder.clone().count(conn).await?;
    let items = finder.limit(limit).offset(offset).all(conn).await?;
    Ok((items, total))
}

pub async fn search_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Vec<Model>, DbErr> {
    Students::find()
        .filter(Expr::col(Column::Name).ilike(contains_pattern(name)))
        .order_by_asc(Column::Name)
        .all(conn)
        .await
}

pub async fn email_taken<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    exclude: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut finder = Students::find().filter(Column::Email.eq(email));
    if let Some(id) = exclude {
        finder = finder.filter(Column::Id.ne(id));
    }
    Ok(finder.count(conn).await? > 0)
}

pub async fn national_id_taken<C: ConnectionTrait>(
    conn: &C,
    national_id: &str,
    exclude: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut finder = Students::find().filter(Column::NationalId.eq(national_id));
    if let Some(id) = exclude {
        finder = finder.filter(Column::Id.ne(id));
    }
    Ok(finder.count(conn).await? > 0)
}

pub async fn names_by_id<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, String>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Students::find()
        .select_only()
        .columns([Column::Id, Column::Name])
        .filter(Column::Id.is_in(ids))
        .into_tuple::<(Uuid, String)>()
        .all(conn)
        .await?;
    Ok(rows.into_iter().collect())
}
