use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter};

use entities::user;
use entities::user_local_model::UserModel;

pub async fn find_user<C>(conn: &C, id: &str) -> Result<Option<user::Model>, DbErr>
where
    C: ConnectionTrait,
{
    user::Entity::find_by_id(id).one(conn).await
}

/// Emails are stored lower-cased, so the lookup lower-cases too.
pub async fn find_by_email<C>(conn: &C, email: &str) -> Result<Option<user::Model>, DbErr>
where
    C: ConnectionTrait,
{
    user::Entity::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(conn)
        .await
}

pub async fn find_by_username<C>(conn: &C, username: &str) -> Result<Option<user::Model>, DbErr>
where
    C: ConnectionTrait,
{
    user::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                .eq(username.to_lowercase()),
        )
        .one(conn)
        .await
}

pub async fn add_user<C>(conn: &C, user: UserModel) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    user::Entity::insert(user.into_active_model())
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
