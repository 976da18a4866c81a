use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sea_orm::ActiveEnum;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use entities::song::{self, SongStatus, SongType};
use entities::song_local_model::SongModel;
use entities::track_local_model::TrackModel;
use entities::user;
use queries::songs::{SongChanges, SongFilter};

use crate::dxl::context::Pagination;
use crate::dxl::error::DxlError;
use crate::dxl::{DxlRequest, Handler, Reply};
use crate::AppState;

pub struct SongsHandler;

#[derive(Deserialize, Default)]
struct CreateSongBody {
    #[serde(rename = "type")]
    song_type: Option<String>,
    title: Option<String>,
    artist_id: Option<String>,
    genre: Option<String>,
    language: Option<String>,
    upc: Option<String>,
    cover: Option<String>,
    tracks: Option<Value>,
}

#[derive(Deserialize, Default)]
struct CreateTrackBody {
    title: Option<String>,
    track_number: Option<i32>,
    isrc: Option<String>,
    mp3: Option<String>,
    explicit: Option<String>,
    lyrics: Option<String>,
    lead_vocal: Option<String>,
    featured: Option<String>,
    producer: Option<String>,
    writer: Option<String>,
    duration: Option<i32>,
}

#[derive(Deserialize, Default)]
struct UpdateSongBody {
    id: Option<String>,
    title: Option<String>,
    #[serde(rename = "type")]
    song_type: Option<String>,
    genre: Option<String>,
    language: Option<String>,
    upc: Option<String>,
    cover: Option<String>,
    producer: Option<String>,
    writer: Option<String>,
    record_label: Option<String>,
    featured: Option<String>,
}

pub(crate) fn parse_status(value: &str) -> Result<SongStatus, DxlError> {
    SongStatus::try_from_value(&value.to_lowercase()).map_err(|_| {
        DxlError::validation(
            format!("Unknown song status: {}", value),
            json!({ "field": "status" }),
        )
    })
}

fn parse_type(value: &str) -> Result<SongType, DxlError> {
    SongType::try_from_value(&value.to_lowercase()).map_err(|_| {
        DxlError::validation(
            format!("Unknown song type: {}", value),
            json!({ "field": "type", "allowed": ["single", "album", "medley"] }),
        )
    })
}

fn display_name(user: &user::Model) -> String {
    if let Some(name) = user.name.as_ref().filter(|n| !n.trim().is_empty()) {
        return name.to_owned();
    }
    let full = [user.first_name.as_deref(), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if full.is_empty() {
        user.email.to_owned()
    } else {
        full
    }
}

/// Loads a live song the caller may touch.
async fn owned_song(
    state: &AppState,
    request: &DxlRequest,
    id: &str,
    not_found_details: Option<Value>,
) -> Result<song::Model, DxlError> {
    let song = queries::songs::get_live_song(&state.connection, id)
        .await?
        .ok_or_else(|| match not_found_details {
            Some(details) => DxlError::not_found_with("Song not found", details),
            None => DxlError::not_found("Song not found"),
        })?;
    if !request.context.can_access(&song.artist_id) {
        return Err(DxlError::Forbidden("Access denied".to_string()));
    }
    Ok(song)
}

impl SongsHandler {
    async fn list(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let pagination = Pagination::from_query(&request.query);
        let mut filter = SongFilter {
            artist: request.param("artist").map(str::to_owned),
            status: request.param("status").map(parse_status).transpose()?,
            genre: request.param("genre").map(str::to_owned),
            song_type: request.param("type").map(parse_type).transpose()?,
            search: request.param("search").map(str::to_owned),
            owner: None,
        };
        if !request.context.is_admin() {
            filter.owner = request.context.user_id.to_owned();
        }

        let items =
            queries::songs::list_songs(&state.connection, &filter, pagination.window()).await?;
        let mut data = json!({
            "page": pagination.page,
            "limit": pagination.limit,
            "has_next": items.len() as u64 == pagination.limit,
            "items": items,
        });
        if request.context.check_permission(20) {
            let total = queries::songs::count_songs(&state.connection, &filter).await?;
            data["total"] = json!(total);
        }
        Ok(Reply::new(data, "Songs retrieved successfully"))
    }

    async fn get(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let id = request
            .param("id")
            .ok_or_else(|| DxlError::bad_request_with("Song ID is required", json!({ "field": "id" })))?;
        let song = owned_song(
            state,
            request,
            id,
            Some(json!({ "resource": "song", "id": id })),
        )
        .await?;
        let tracks = queries::songs::get_tracks(&state.connection, &song.id).await?;

        let mut data = json!(song);
        data["tracks"] = json!(tracks);
        Ok(Reply::new(data, "Song retrieved successfully"))
    }

    async fn create(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let user_id = request.user_id()?;
        let body: CreateSongBody = request.json()?;
        let required = ["type", "title", "artist_id", "tracks"];
        let (song_type, title, artist_id, tracks) = match (
            body.song_type.as_deref().filter(|v| !v.is_empty()),
            body.title.as_deref().filter(|v| !v.is_empty()),
            body.artist_id.as_deref().filter(|v| !v.is_empty()),
            body.tracks.as_ref().and_then(Value::as_array),
        ) {
            (Some(song_type), Some(title), Some(artist_id), Some(tracks)) => {
                (parse_type(song_type)?, title, artist_id, tracks)
            }
            _ => return Err(DxlError::missing_fields(&required)),
        };
        let tracks = tracks
            .iter()
            .map(|track| serde_json::from_value::<CreateTrackBody>(track.to_owned()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                DxlError::validation(
                    "Invalid track entry",
                    json!({ "field": "tracks", "reason": err.to_string() }),
                )
            })?;

        let artist = queries::users::find_user(&state.connection, artist_id)
            .await?
            .ok_or_else(|| DxlError::not_found_with("Artist not found", json!({ "field": "artist_id" })))?;

        let now = Utc::now();
        let song_id = Uuid::new_v4().to_string();
        let song = SongModel {
            id: song_id.to_owned(),
            title: title.to_owned(),
            user_id: user_id.to_owned(),
            artist_id: artist.id.to_owned(),
            artist_name: display_name(&artist),
            r#type: song_type,
            genre: body.genre.to_owned(),
            language: Some(body.language.to_owned().unwrap_or_else(|| "en".to_string())),
            upc: body.upc.to_owned(),
            cover: body.cover.to_owned(),
            number_of_tracks: tracks.len() as i32,
            is_featured: false,
            plays: 0,
            duration: None,
            status: SongStatus::New,
            created_by: Some(user_id.to_owned()),
            created_at: now,
            updated_at: now,
        };
        let track_models: Vec<TrackModel> = tracks
            .into_iter()
            .enumerate()
            .map(|(index, track)| TrackModel {
                id: Uuid::new_v4().to_string(),
                song_id: song_id.to_owned(),
                track_number: track.track_number.unwrap_or(index as i32 + 1),
                title: track
                    .title
                    .unwrap_or_else(|| format!("Track {}", index + 1)),
                mp3: track.mp3.unwrap_or_default(),
                isrc: track.isrc,
                explicit: track.explicit.unwrap_or_else(|| "no".to_string()),
                lyrics: track.lyrics,
                lead_vocal: track.lead_vocal,
                featured: track.featured,
                producer: track.producer,
                writer: track.writer,
                duration: track.duration.unwrap_or(0),
                created_at: now,
                updated_at: now,
            })
            .collect();
        let tracks_count = track_models.len();

        queries::songs::add_song_with_tracks(&state.connection, song, track_models).await?;
        info!("Created song {} with {} tracks", song_id, tracks_count);

        Ok(Reply::new(
            json!({
                "id": song_id,
                "title": title,
                "artist_id": artist.id,
                "type": song_type,
                "status": SongStatus::New,
                "created_at": now,
                "tracks_count": tracks_count,
            }),
            "Song created successfully",
        ))
    }

    async fn update(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        request.user_id()?;
        let body: UpdateSongBody = request.json()?;
        let id = body
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DxlError::bad_request("Song ID is required"))?;
        let song = owned_song(state, request, id, None).await?;

        let changes = SongChanges {
            title: body.title,
            song_type: body.song_type.as_deref().map(parse_type).transpose()?,
            genre: body.genre,
            language: body.language,
            upc: body.upc,
            cover: body.cover,
            producer: body.producer,
            writer: body.writer,
            record_label: body.record_label,
            featured: body.featured,
        };
        let updated = queries::songs::update_song(&state.connection, song, changes).await?;
        Ok(Reply::new(
            json!({
                "id": updated.id,
                "title": updated.title,
                "updated_at": updated.updated_at,
            }),
            "Song updated successfully",
        ))
    }

    async fn delete(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        request.user_id()?;
        let id = request
            .param("id")
            .ok_or_else(|| DxlError::bad_request("Song ID is required"))?;
        let song = owned_song(state, request, id, None).await?;
        let deleted = queries::songs::soft_delete_song(&state.connection, song).await?;
        info!("Soft deleted song {}", deleted.id);
        Ok(Reply::new(
            json!({
                "id": deleted.id,
                "status": deleted.status,
                "deleted_at": deleted.deleted_at,
            }),
            "Song deleted successfully",
        ))
    }
}

#[async_trait]
impl Handler for SongsHandler {
    fn module(&self) -> &'static str {
        "songs"
    }

    async fn process(
        &self,
        state: &AppState,
        request: &DxlRequest,
        operation: &str,
    ) -> Result<Reply, DxlError> {
        match operation {
            "list" => self.list(state, request).await,
            "get" => self.get(state, request).await,
            "create" => self.create(state, request).await,
            "update" => self.update(state, request).await,
            "delete" => self.delete(state, request).await,
            _ => Err(DxlError::invalid_operation()),
        }
    }
}
