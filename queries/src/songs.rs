use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};

use entities::song::{self, SongStatus, SongType};
use entities::song_local_model::SongModel;
use entities::track;
use entities::track_local_model::TrackModel;

use crate::Page;

/// Filters of the song listing. Soft-deleted rows are always excluded.
#[derive(Clone, Debug, Default)]
pub struct SongFilter {
    pub artist: Option<String>,
    pub status: Option<SongStatus>,
    pub genre: Option<String>,
    pub song_type: Option<SongType>,
    pub search: Option<String>,
    pub owner: Option<String>,
}

/// Metadata an owner may change on an existing release.
#[derive(Clone, Debug, Default)]
pub struct SongChanges {
    pub title: Option<String>,
    pub song_type: Option<SongType>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub upc: Option<String>,
    pub cover: Option<String>,
    pub producer: Option<String>,
    pub writer: Option<String>,
    pub record_label: Option<String>,
    pub featured: Option<String>,
}

fn filtered(filter: &SongFilter) -> Select<song::Entity> {
    let mut query = song::Entity::find().filter(song::Column::DeletedAt.is_null());
    if let Some(artist) = &filter.artist {
        query = query.filter(song::Column::ArtistName.contains(artist));
    }
    if let Some(status) = filter.status {
        query = query.filter(song::Column::Status.eq(status));
    }
    if let Some(genre) = &filter.genre {
        query = query.filter(song::Column::Genre.eq(genre.as_str()));
    }
    if let Some(song_type) = filter.song_type {
        query = query.filter(song::Column::Type.eq(song_type));
    }
    if let Some(search) = &filter.search {
        query = query.filter(
            Condition::any()
                .add(song::Column::Title.contains(search))
                .add(song::Column::ArtistName.contains(search)),
        );
    }
    if let Some(owner) = &filter.owner {
        query = query.filter(song::Column::ArtistId.eq(owner.as_str()));
    }
    query
}

pub async fn list_songs<C>(
    conn: &C,
    filter: &SongFilter,
    page: Page,
) -> Result<Vec<song::Model>, DbErr>
where
    C: ConnectionTrait,
{
    filtered(filter)
        .order_by_desc(song::Column::CreatedAt)
        .limit(page.limit)
        .offset(page.offset)
        .all(conn)
        .await
}

pub async fn count_songs<C>(conn: &C, filter: &SongFilter) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    filtered(filter).count(conn).await
}

/// A song that has not been soft-deleted.
pub async fn get_live_song<C>(conn: &C, id: &str) -> Result<Option<song::Model>, DbErr>
where
    C: ConnectionTrait,
{
    song::Entity::find_by_id(id)
        .filter(song::Column::DeletedAt.is_null())
        .one(conn)
        .await
}

pub async fn get_song<C>(conn: &C, id: &str) -> Result<Option<song::Model>, DbErr>
where
    C: ConnectionTrait,
{
    song::Entity::find_by_id(id).one(conn).await
}

pub async fn get_tracks<C>(conn: &C, song_id: &str) -> Result<Vec<track::Model>, DbErr>
where
    C: ConnectionTrait,
{
    track::Entity::find()
        .filter(track::Column::SongId.eq(song_id))
        .order_by_asc(track::Column::TrackNumber)
        .all(conn)
        .await
}

pub async fn songs_with_status<C>(conn: &C, status: SongStatus) -> Result<Vec<song::Model>, DbErr>
where
    C: ConnectionTrait,
{
    song::Entity::find()
        .filter(song::Column::Status.eq(status))
        .filter(song::Column::DeletedAt.is_null())
        .order_by_desc(song::Column::CreatedAt)
        .all(conn)
        .await
}

pub async fn count_with_status<C>(conn: &C, status: Option<SongStatus>) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = song::Entity::find().filter(song::Column::DeletedAt.is_null());
    if let Some(status) = status {
        query = query.filter(song::Column::Status.eq(status));
    }
    query.count(conn).await
}

/// Writes a release and all of its tracks atomically. The song goes first so
/// the track foreign keys resolve.
pub async fn add_song_with_tracks<C>(
    conn: &C,
    song: SongModel,
    tracks: Vec<TrackModel>,
) -> Result<(), DbErr>
where
    C: TransactionTrait,
{
    let txn = conn.begin().await?;
    debug!("Inserting song {} with {} tracks", song.id, tracks.len());
    song::Entity::insert(song.into_active_model())
        .exec_without_returning(&txn)
        .await?;
    if !tracks.is_empty() {
        track::Entity::insert_many(tracks.into_iter().map(IntoActiveModel::into_active_model))
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await
}

pub async fn update_song<C>(
    conn: &C,
    song: song::Model,
    changes: SongChanges,
) -> Result<song::Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut active = song.into_active_model();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(song_type) = changes.song_type {
        active.r#type = Set(song_type);
    }
    if let Some(genre) = changes.genre {
        active.genre = Set(Some(genre));
    }
    if let Some(language) = changes.language {
        active.language = Set(Some(language));
    }
    if let Some(upc) = changes.upc {
        active.upc = Set(Some(upc));
    }
    if let Some(cover) = changes.cover {
        active.cover = Set(Some(cover));
    }
    if let Some(producer) = changes.producer {
        active.producer = Set(Some(producer));
    }
    if let Some(writer) = changes.writer {
        active.writer = Set(Some(writer));
    }
    if let Some(record_label) = changes.record_label {
        active.record_label = Set(Some(record_label));
    }
    if let Some(featured) = changes.featured {
        active.featured = Set(Some(featured));
    }
    active.updated_at = Set(Utc::now());
    active.update(conn).await
}

pub async fn soft_delete_song<C>(conn: &C, song: song::Model) -> Result<song::Model, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut active = song.into_active_model();
    active.status = Set(SongStatus::Deleted);
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(conn).await
}

pub async fn review_song<C>(
    conn: &C,
    song: song::Model,
    status: SongStatus,
    reviewer: Option<String>,
) -> Result<song::Model, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut active = song.into_active_model();
    active.status = Set(status);
    active.approved_by = Set(reviewer);
    active.approved_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(conn).await
}

pub async fn flag_song<C>(
    conn: &C,
    song: song::Model,
    flag_type: String,
    reason: String,
    flagged_by: Option<String>,
) -> Result<song::Model, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut active = song.into_active_model();
    active.status = Set(SongStatus::Flagged);
    active.flag_type = Set(Some(flag_type));
    active.flag_reason = Set(Some(reason));
    active.flagged_by = Set(flagged_by);
    active.flagged_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(conn).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;
    use crate::users;
    use entities::user_local_model::UserModel;

    fn user(id: &str) -> UserModel {
        let now = Utc::now();
        UserModel {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            username: None,
            name: Some("Ada Lovelace".to_string()),
            first_name: None,
            last_name: None,
            password_hash: String::new(),
            email_verified: true,
            role: "artist".to_string(),
            tenant: None,
            ref_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn song(id: &str, artist: &str, title: &str) -> SongModel {
        let now = Utc::now();
        SongModel {
            id: id.to_string(),
            title: title.to_string(),
            user_id: artist.to_string(),
            artist_id: artist.to_string(),
            artist_name: "Ada Lovelace".to_string(),
            r#type: SongType::Album,
            genre: Some("Jazz".to_string()),
            language: None,
            upc: None,
            cover: None,
            number_of_tracks: 2,
            is_featured: false,
            plays: 0,
            duration: None,
            status: SongStatus::Checking,
            created_by: Some(artist.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn track(id: &str, song_id: &str, number: i32) -> TrackModel {
        let now = Utc::now();
        TrackModel {
            id: id.to_string(),
            song_id: song_id.to_string(),
            track_number: number,
            title: format!("Track {number}"),
            mp3: format!("/uploads/songs/{id}.mp3"),
            isrc: None,
            explicit: "no".to_string(),
            lyrics: None,
            lead_vocal: None,
            featured: None,
            producer: None,
            writer: None,
            duration: 60,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn tracks_come_back_in_track_number_order() {
        let conn = test_db::connect().await;
        users::add_user(&conn, user("u1")).await.unwrap();
        add_song_with_tracks(
            &conn,
            song("s1", "u1", "Engines"),
            vec![track("t2", "s1", 2), track("t1", "s1", 1)],
        )
        .await
        .unwrap();

        let tracks = get_tracks(&conn, "s1").await.unwrap();
        let numbers: Vec<i32> = tracks.iter().map(|t| t.track_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn tracks_with_different_optional_fields_insert_together() {
        let conn = test_db::connect().await;
        users::add_user(&conn, user("u1")).await.unwrap();
        let mut first = track("t1", "s1", 1);
        first.isrc = Some("USRC17607839".to_string());
        first.lyrics = Some("la la".to_string());
        let mut second = track("t2", "s1", 2);
        second.writer = Some("Ada".to_string());

        add_song_with_tracks(&conn, song("s1", "u1", "Engines"), vec![first, second])
            .await
            .unwrap();

        let tracks = get_tracks(&conn, "s1").await.unwrap();
        assert_eq!(tracks[0].isrc.as_deref(), Some("USRC17607839"));
        assert_eq!(tracks[0].writer, None);
        assert_eq!(tracks[1].isrc, None);
        assert_eq!(tracks[1].writer.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn failed_track_insert_leaves_no_song_behind() {
        let conn = test_db::connect().await;
        users::add_user(&conn, user("u1")).await.unwrap();
        // Duplicate track ids violate the primary key.
        let result = add_song_with_tracks(
            &conn,
            song("s1", "u1", "Engines"),
            vec![track("t1", "s1", 1), track("t1", "s1", 2)],
        )
        .await;

        assert!(result.is_err());
        assert!(get_song(&conn, "s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn soft_deleted_songs_drop_out_of_listings() {
        let conn = test_db::connect().await;
        users::add_user(&conn, user("u1")).await.unwrap();
        add_song_with_tracks(&conn, song("s1", "u1", "Engines"), vec![])
            .await
            .unwrap();
        add_song_with_tracks(&conn, song("s2", "u1", "Looms"), vec![])
            .await
            .unwrap();

        let doomed = get_live_song(&conn, "s1").await.unwrap().unwrap();
        let deleted = soft_delete_song(&conn, doomed).await.unwrap();
        assert_eq!(deleted.status, SongStatus::Deleted);
        assert!(deleted.deleted_at.is_some());

        let filter = SongFilter::default();
        assert_eq!(count_songs(&conn, &filter).await.unwrap(), 1);
        assert!(get_live_song(&conn, "s1").await.unwrap().is_none());

        let search = SongFilter {
            search: Some("Loo".to_string()),
            ..Default::default()
        };
        let found = list_songs(&conn, &search, Page::new(1, 20)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "s2");
    }
}
