use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use entities::{admin_alert, admin_task};

use crate::Page;

pub async fn list_tasks<C>(conn: &C, page: Page) -> Result<Vec<admin_task::Model>, DbErr>
where
    C: ConnectionTrait,
{
    admin_task::Entity::find()
        .order_by_desc(admin_task::Column::CreatedAt)
        .limit(page.limit)
        .offset(page.offset)
        .all(conn)
        .await
}

pub async fn count_tasks<C>(conn: &C, status: Option<&str>) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = admin_task::Entity::find();
    if let Some(status) = status {
        query = query.filter(admin_task::Column::Status.eq(status));
    }
    query.count(conn).await
}

pub async fn add_task<C>(
    conn: &C,
    task: admin_task::ActiveModel,
) -> Result<admin_task::Model, DbErr>
where
    C: ConnectionTrait,
{
    task.insert(conn).await
}

pub async fn add_alert<C>(
    conn: &C,
    alert: admin_alert::ActiveModel,
) -> Result<admin_alert::Model, DbErr>
where
    C: ConnectionTrait,
{
    alert.insert(conn).await
}

pub async fn list_alerts<C>(
    conn: &C,
    status: &str,
    limit: u64,
) -> Result<Vec<admin_alert::Model>, DbErr>
where
    C: ConnectionTrait,
{
    admin_alert::Entity::find()
        .filter(admin_alert::Column::Status.eq(status))
        .order_by_desc(admin_alert::Column::CreatedAt)
        .limit(limit)
        .all(conn)
        .await
}

pub async fn count_alerts<C>(
    conn: &C,
    status: Option<&str>,
    severity: Option<&str>,
) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = admin_alert::Entity::find();
    if let Some(status) = status {
        query = query.filter(admin_alert::Column::Status.eq(status));
    }
    if let Some(severity) = severity {
        query = query.filter(admin_alert::Column::Severity.eq(severity));
    }
    query.count(conn).await
}
