use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use log::{debug, info, warn};
use sea_orm::{ActiveEnum, Set};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use entities::song::{SongStatus, SongType};
use entities::song_local_model::SongModel;
use entities::track_local_model::TrackModel;
use entities::upload;

use crate::error::ApiError;
use crate::responses::upload_response::PublishResponse;
use crate::AppState;

const PUBLISHED_MESSAGE: &str = "Music published successfully. Your song is now being processed.";

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PublishBody {
    id: Option<String>,
    user_id: Option<String>,
    title: Option<String>,
    song_title: Option<String>,
    #[serde(rename = "type")]
    song_type_field: Option<String>,
    song_type: Option<String>,
    genre: Option<String>,
    language: Option<String>,
    upc: Option<String>,
    artist_id: Option<String>,
    artist_name: Option<String>,
    cover: Option<String>,
    copyright_acknowledged: Option<Value>,
    tracks: Option<Vec<PublishTrack>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PublishTrack {
    title: Option<String>,
    duration: Option<f64>,
    isrc: Option<String>,
    explicit: Option<String>,
    lyrics: Option<String>,
    lead_vocal: Option<String>,
    featured: Option<String>,
    producer: Option<String>,
    writer: Option<String>,
    track_number: Option<i32>,
    file: Option<TrackFile>,
}

#[derive(Deserialize, Default)]
struct TrackFile {
    name: Option<String>,
}

/// Javascript-style truthiness, which is what the wizard sends.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Drops empty and whitespace-only values.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// An absent type is inferred from the track count.
fn song_type(value: Option<&str>, track_count: usize) -> Result<SongType, ApiError> {
    match value.map(str::to_lowercase).as_deref() {
        None | Some("") if track_count > 1 => Ok(SongType::Album),
        None | Some("") => Ok(SongType::Single),
        Some("single") => Ok(SongType::Single),
        Some("album") => Ok(SongType::Album),
        Some("medley") => Ok(SongType::Medley),
        Some(_) => Err(ApiError::BadRequest(
            "Type must be one of: single, album, medley".to_string(),
        )),
    }
}

pub async fn publish(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PublishResponse>, ApiError> {
    let started = Instant::now();
    let body: PublishBody = serde_json::from_slice(&body)
        .map_err(|err| ApiError::BadRequest(format!("Invalid JSON body: {}", err)))?;

    if !body.copyright_acknowledged.as_ref().map_or(false, truthy) {
        return Err(ApiError::BadRequest(
            "Copyright acknowledgement required".to_string(),
        ));
    }
    let title = non_blank(body.title).or(non_blank(body.song_title));
    let artist_id = non_blank(body.artist_id);
    let tracks = body.tracks.unwrap_or_default();
    let (title, artist_id) = match (title, artist_id) {
        (Some(title), Some(artist_id)) if !tracks.is_empty() => (title, artist_id),
        _ => return Err(ApiError::BadRequest("Missing required fields".to_string())),
    };
    let song_type = song_type(
        body.song_type_field.as_deref().or(body.song_type.as_deref()),
        tracks.len(),
    )?;
    let user_id = non_blank(body.user_id);
    debug!(
        "Publishing {} ({}) for artist {} with {} tracks",
        title,
        song_type.to_value(),
        artist_id,
        tracks.len()
    );

    let now = Utc::now();
    let song_id = Uuid::new_v4().to_string();
    let public_url = state.config.public_url.trim_end_matches('/');
    let total_duration: f64 = tracks.iter().filter_map(|track| track.duration).sum();

    let song = SongModel {
        id: song_id.to_owned(),
        title: title.to_owned(),
        user_id: user_id.to_owned().unwrap_or_else(|| artist_id.to_owned()),
        artist_id: artist_id.to_owned(),
        artist_name: non_blank(body.artist_name).unwrap_or_else(|| artist_id.to_owned()),
        r#type: song_type,
        genre: non_blank(body.genre),
        language: non_blank(body.language),
        upc: non_blank(body.upc),
        cover: non_blank(body.cover),
        number_of_tracks: tracks.len() as i32,
        is_featured: false,
        plays: 0,
        duration: Some(total_duration.round() as i32).filter(|total| *total > 0),
        status: SongStatus::Checking,
        created_by: user_id.to_owned(),
        created_at: now,
        updated_at: now,
    };

    let mut track_models = Vec::with_capacity(tracks.len());
    let mut bookkeeping = Vec::with_capacity(tracks.len());
    for (index, track) in tracks.into_iter().enumerate() {
        let track_id = Uuid::new_v4().to_string();
        let track_number = track.track_number.unwrap_or(index as i32 + 1);
        let mp3 = format!("{}/uploads/songs/{}.mp3", public_url, track_id);
        let isrc = non_blank(track.isrc);
        let title = non_blank(track.title);

        if let Some(user_id) = &user_id {
            let original_name = track
                .file
                .and_then(|file| non_blank(file.name))
                .unwrap_or_else(|| format!("track-{}.mp3", track_number));
            bookkeeping.push(upload::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                user_id: Set(user_id.to_owned()),
                filename: Set(format!("{}.mp3", track_id)),
                original_name: Set(original_name),
                mime_type: Set("audio/mpeg".to_string()),
                size: Set(0),
                path: Set(Some(format!("/uploads/songs/{}.mp3", track_id))),
                url: Set(Some(mp3.to_owned())),
                checksum: Set(None),
                status: Set("complete".to_string()),
                progress: Set(100),
                chunk_size: Set(None),
                total_chunks: Set(None),
                uploaded_chunks: Set(0),
                metadata: Set(Some(json!({
                    "trackNumber": track_number,
                    "title": title,
                    "isrc": isrc,
                }))),
                created_at: Set(now),
                updated_at: Set(now),
                completed_at: Set(Some(now)),
            });
        }

        track_models.push(TrackModel {
            id: track_id,
            song_id: song_id.to_owned(),
            track_number,
            title: title.unwrap_or_else(|| format!("Track {}", index + 1)),
            mp3,
            isrc,
            explicit: non_blank(track.explicit).unwrap_or_else(|| "no".to_string()),
            lyrics: non_blank(track.lyrics),
            lead_vocal: non_blank(track.lead_vocal),
            featured: non_blank(track.featured),
            producer: non_blank(track.producer),
            writer: non_blank(track.writer),
            duration: track.duration.map_or(0, |seconds| seconds.round() as i32),
            created_at: now,
            updated_at: now,
        });
    }
    let track_ids: Vec<String> = track_models.iter().map(|track| track.id.to_owned()).collect();

    queries::songs::add_song_with_tracks(&state.connection, song, track_models).await?;
    info!("Published song {} with {} tracks", song_id, track_ids.len());

    for record in bookkeeping {
        if let Err(err) = queries::uploads::add_upload(&state.connection, record).await {
            warn!("Skipped upload record for song {}: {}", song_id, err);
        }
    }

    if let Some(job_id) = non_blank(body.id) {
        match queries::jobs::complete_job(&state.connection, &job_id).await {
            Ok(true) => info!("Upload job {} completed", job_id),
            Ok(false) => warn!("Upload job {} not found", job_id),
            Err(err) => warn!("Skipped completing upload job {}: {}", job_id, err),
        }
    }

    Ok(Json(PublishResponse {
        success: true,
        song_id,
        track_ids,
        message: PUBLISHED_MESSAGE.to_string(),
        status: "checking".to_string(),
        processing_time: started.elapsed().as_millis(),
    }))
}
