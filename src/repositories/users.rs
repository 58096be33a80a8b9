use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entity::users::{Column, Entity as Users, Model, Role};

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Option<Model>, DbErr> {
    Users::find_by_id(id).one(conn).await
}

pub async fn find_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<Model>, DbErr> {
    Users::find()
        .filter(Column::Email.eq(email))
        .one(conn)
        .await
}

pub async fn find_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<Model>, DbErr> {
    Users::find().order_by_asc(Column::Name).all(conn).await
}

pub async fn find_by_role<C: ConnectionTrait>(conn: &C, role: Role) -> Result<Vec<Model>, DbErr> {
    Users::find()
        .filter(Column::Role.eq(role))
        .order_by_asc(Column::Name)
        .all(conn)
        .await
}

/// True when another user (not `exclude`) already owns `email`.
pub async fn email_taken<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    exclude: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut finder = Users::find().filter(Column::Email.eq(email));
    if let Some(id) = exclude {
        finder = finder.filter(Column::Id.ne(id));
    }
    Ok(finder.count(conn).await? > 0)
}

pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    Users::find().count(conn).await
}

pub async fn names_by_id<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, String>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Users::find()
        .select_only()
        .columns([Column::Id, Column::Name])
        .filter(Column::Id.is_in(ids))
        .into_tuple::<(Uuid, String)>()
        .all(conn)
        .await?;
    Ok(rows.into_iter().collect())
}
