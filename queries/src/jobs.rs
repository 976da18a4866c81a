use chrono::{DateTime, Duration, Utc};
use log::debug;
use sea_orm::prelude::Json;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, Set,
};

use entities::upload_job;

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";

/// Wizard state as sent by the client. On an existing job only the fields
/// that are present are written.
#[derive(Clone, Debug, Default)]
pub struct JobDraft {
    pub id: String,
    pub user_id: String,
    pub song_title: String,
    pub song_type: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub upc: Option<String>,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub tracks: Option<Json>,
    pub copyright_acknowledged: Option<bool>,
    pub status: Option<String>,
    pub current_step: Option<String>,
    pub progress: Option<i32>,
}

pub async fn find_job<C>(conn: &C, id: &str) -> Result<Option<upload_job::Model>, DbErr>
where
    C: ConnectionTrait,
{
    upload_job::Entity::find_by_id(id).one(conn).await
}

/// A job the user can still resume: theirs, and not past its expiry.
pub async fn find_resumable_job<C>(
    conn: &C,
    id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<upload_job::Model>, DbErr>
where
    C: ConnectionTrait,
{
    upload_job::Entity::find_by_id(id)
        .filter(upload_job::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(upload_job::Column::ExpiresAt.is_null())
                .add(upload_job::Column::ExpiresAt.gt(now)),
        )
        .one(conn)
        .await
}

/// Inserts or updates the job keyed by `draft.id`. Returns `None` when the id
/// already belongs to another user.
pub async fn save_job<C>(
    conn: &C,
    draft: JobDraft,
    ttl: Duration,
) -> Result<Option<upload_job::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let job = match find_job(conn, &draft.id).await? {
        Some(job) if job.user_id != draft.user_id => return Ok(None),
        Some(job) => {
            debug!("Updating upload job {}", job.id);
            let mut active = job.into_active_model();
            active.song_title = Set(draft.song_title);
            if let Some(song_type) = draft.song_type {
                active.song_type = Set(Some(song_type));
            }
            if let Some(genre) = draft.genre {
                active.genre = Set(Some(genre));
            }
            if let Some(language) = draft.language {
                active.language = Set(Some(language));
            }
            if let Some(upc) = draft.upc {
                active.upc = Set(Some(upc));
            }
            if let Some(artist_id) = draft.artist_id {
                active.artist_id = Set(Some(artist_id));
            }
            if let Some(artist_name) = draft.artist_name {
                active.artist_name = Set(Some(artist_name));
            }
            if let Some(tracks) = draft.tracks {
                active.tracks = Set(Some(tracks));
            }
            if let Some(acknowledged) = draft.copyright_acknowledged {
                active.copyright_acknowledged = Set(acknowledged);
            }
            if let Some(status) = draft.status {
                active.status = Set(status);
            }
            if let Some(current_step) = draft.current_step {
                active.current_step = Set(Some(current_step));
            }
            if let Some(progress) = draft.progress {
                active.progress = Set(progress.clamp(0, 100));
            }
            active.updated_at = Set(now);
            active.update(conn).await?
        }
        None => {
            debug!("Creating upload job {}", draft.id);
            upload_job::ActiveModel {
                id: Set(draft.id),
                user_id: Set(draft.user_id),
                song_title: Set(draft.song_title),
                song_type: Set(draft.song_type),
                genre: Set(draft.genre),
                language: Set(draft.language),
                upc: Set(draft.upc),
                artist_id: Set(draft.artist_id),
                artist_name: Set(draft.artist_name),
                tracks: Set(draft.tracks),
                copyright_acknowledged: Set(draft.copyright_acknowledged.unwrap_or(false)),
                status: Set(draft
                    .status
                    .unwrap_or_else(|| STATUS_IN_PROGRESS.to_string())),
                current_step: Set(draft.current_step),
                progress: Set(draft.progress.unwrap_or(0).clamp(0, 100)),
                created_at: Set(now),
                updated_at: Set(now),
                completed_at: Set(None),
                expires_at: Set(Some(now + ttl)),
            }
            .insert(conn)
            .await?
        }
    };
    Ok(Some(job))
}

/// Returns whether a job with that id existed.
pub async fn complete_job<C>(conn: &C, id: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let result = upload_job::Entity::update_many()
        .col_expr(upload_job::Column::Status, Expr::value(STATUS_COMPLETED))
        .col_expr(upload_job::Column::Progress, Expr::value(100))
        .col_expr(upload_job::Column::CompletedAt, Expr::value(now))
        .col_expr(upload_job::Column::UpdatedAt, Expr::value(now))
        .filter(upload_job::Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Deletes unfinished jobs whose expiry has passed.
pub async fn purge_expired<C>(conn: &C, now: DateTime<Utc>) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = upload_job::Entity::delete_many()
        .filter(upload_job::Column::ExpiresAt.lt(now))
        .filter(upload_job::Column::Status.ne(STATUS_COMPLETED))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;
    use crate::users;
    use entities::user_local_model::UserModel;

    async fn seed_user(conn: &sea_orm::DatabaseConnection, id: &str) {
        let now = Utc::now();
        users::add_user(
            conn,
            UserModel {
                id: id.to_string(),
                email: format!("{id}@example.com"),
                username: None,
                name: None,
                first_name: None,
                last_name: None,
                password_hash: String::new(),
                email_verified: true,
                role: "artist".to_string(),
                tenant: None,
                ref_code: None,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();
    }

    fn draft(id: &str, user: &str, title: &str) -> JobDraft {
        JobDraft {
            id: id.to_string(),
            user_id: user.to_string(),
            song_title: title.to_string(),
            artist_id: Some(user.to_string()),
            current_step: Some("metadata".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn saving_twice_updates_the_same_job() {
        let conn = test_db::connect().await;
        seed_user(&conn, "u1").await;

        let first = save_job(&conn, draft("j1", "u1", "Draft"), Duration::days(30))
            .await
            .unwrap()
            .unwrap();
        let second = save_job(&conn, draft("j1", "u1", "Final"), Duration::days(30))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(second.song_title, "Final");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.expires_at, first.expires_at);
        assert_eq!(second.status, STATUS_IN_PROGRESS);
    }

    #[tokio::test]
    async fn partial_save_keeps_stored_fields() {
        let conn = test_db::connect().await;
        seed_user(&conn, "u1").await;
        let full = JobDraft {
            genre: Some("Jazz".to_string()),
            tracks: Some(serde_json::json!([{ "title": "One" }])),
            copyright_acknowledged: Some(true),
            progress: Some(20),
            ..draft("j1", "u1", "Notes")
        };
        save_job(&conn, full, Duration::days(30)).await.unwrap();

        let partial = JobDraft {
            id: "j1".to_string(),
            user_id: "u1".to_string(),
            song_title: "Notes".to_string(),
            progress: Some(40),
            ..Default::default()
        };
        let job = save_job(&conn, partial, Duration::days(30))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(job.progress, 40);
        assert_eq!(job.genre.as_deref(), Some("Jazz"));
        assert_eq!(job.current_step.as_deref(), Some("metadata"));
        assert_eq!(job.artist_id.as_deref(), Some("u1"));
        assert!(job.copyright_acknowledged);
        assert_eq!(job.tracks, Some(serde_json::json!([{ "title": "One" }])));
    }

    #[tokio::test]
    async fn another_users_job_is_not_overwritten() {
        let conn = test_db::connect().await;
        seed_user(&conn, "u1").await;
        seed_user(&conn, "u2").await;
        save_job(&conn, draft("j1", "u1", "Mine"), Duration::days(30))
            .await
            .unwrap();

        let result = save_job(&conn, draft("j1", "u2", "Theirs"), Duration::days(30))
            .await
            .unwrap();

        assert!(result.is_none());
        let job = find_job(&conn, "j1").await.unwrap().unwrap();
        assert_eq!(job.song_title, "Mine");
    }

    #[tokio::test]
    async fn purge_keeps_completed_and_unexpired_jobs() {
        let conn = test_db::connect().await;
        seed_user(&conn, "u1").await;
        save_job(&conn, draft("stale", "u1", "Stale"), Duration::days(-1))
            .await
            .unwrap();
        save_job(&conn, draft("done", "u1", "Done"), Duration::days(-1))
            .await
            .unwrap();
        save_job(&conn, draft("fresh", "u1", "Fresh"), Duration::days(30))
            .await
            .unwrap();
        assert!(complete_job(&conn, "done").await.unwrap());

        let purged = purge_expired(&conn, Utc::now()).await.unwrap();

        assert_eq!(purged, 1);
        assert!(find_job(&conn, "stale").await.unwrap().is_none());
        assert!(find_job(&conn, "done").await.unwrap().is_some());
        assert!(find_resumable_job(&conn, "fresh", "u1", Utc::now())
            .await
            .unwrap()
            .is_some());
        assert!(find_resumable_job(&conn, "fresh", "u2", Utc::now())
            .await
            .unwrap()
            .is_none());
    }
}
