use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};

use entities::upload;

pub async fn add_upload<C>(conn: &C, upload: upload::ActiveModel) -> Result<upload::Model, DbErr>
where
    C: ConnectionTrait,
{
    upload.insert(conn).await
}

/// Uploads are only ever visible to the user who started them.
pub async fn find_owned_upload<C>(
    conn: &C,
    id: &str,
    user_id: &str,
) -> Result<Option<upload::Model>, DbErr>
where
    C: ConnectionTrait,
{
    upload::Entity::find_by_id(id)
        .filter(upload::Column::UserId.eq(user_id))
        .one(conn)
        .await
}

pub async fn record_chunk<C>(
    conn: &C,
    upload: upload::Model,
    uploaded_chunks: i32,
    progress: i32,
) -> Result<upload::Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut active = upload.into_active_model();
    active.uploaded_chunks = Set(uploaded_chunks);
    active.progress = Set(progress);
    active.updated_at = Set(Utc::now());
    active.update(conn).await
}

pub async fn finish_upload<C>(
    conn: &C,
    upload: upload::Model,
    path: String,
    url: String,
    checksum: String,
) -> Result<upload::Model, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut active = upload.into_active_model();
    active.path = Set(Some(path));
    active.url = Set(Some(url));
    active.checksum = Set(Some(checksum));
    active.status = Set("complete".to_string());
    active.progress = Set(100);
    active.completed_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(conn).await
}
