use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use log::{error, info};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use uuid::Uuid;

use queries::jobs::JobDraft;

use crate::auth_middleware::CurrentUser;
use crate::error::ApiError;
use crate::responses::upload_response::{JobResponse, SaveJobResponse};
use crate::upload::publish::truthy;
use crate::AppState;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SaveJobBody {
    id: Option<String>,
    user_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "type")]
    song_type: Option<String>,
    genre: Option<String>,
    language: Option<String>,
    upc: Option<String>,
    artist_id: Option<String>,
    artist_name: Option<String>,
    tracks: Option<Value>,
    copyright_acknowledged: Option<Value>,
    status: Option<String>,
    current_step: Option<String>,
    progress: Option<f64>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn percent(progress: f64) -> i32 {
    if progress.is_finite() {
        progress.round().clamp(0.0, 100.0) as i32
    } else {
        0
    }
}

pub async fn save_job(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveJobResponse>, ApiError> {
    let started = Instant::now();
    let body: SaveJobBody = serde_json::from_slice(&body)
        .map_err(|err| ApiError::BadRequest(format!("Invalid JSON body: {}", err)))?;

    let (user_id, title, artist_id) = match (
        present(body.user_id),
        present(body.title),
        present(body.artist_id),
    ) {
        (Some(user_id), Some(title), Some(artist_id)) => (user_id, title, artist_id),
        _ => return Err(ApiError::BadRequest("Missing required fields".to_string())),
    };
    let job_id = present(body.id).unwrap_or_else(|| Uuid::new_v4().to_string());

    let draft = JobDraft {
        id: job_id.to_owned(),
        user_id,
        song_title: title,
        song_type: body.song_type,
        genre: body.genre,
        language: body.language,
        upc: body.upc,
        artist_id: Some(artist_id),
        artist_name: body.artist_name,
        tracks: body.tracks,
        copyright_acknowledged: body.copyright_acknowledged.as_ref().map(truthy),
        status: present(body.status),
        current_step: body.current_step,
        progress: body.progress.map(percent),
    };
    let ttl = chrono::Duration::days(state.config.job_ttl_days);
    match queries::jobs::save_job(&state.connection, draft, ttl).await? {
        Some(job) => info!("Saved upload job {} at step {:?}", job.id, job.current_step),
        None => return Err(ApiError::NotFound("Job not found".to_string())),
    }

    Ok(Json(SaveJobResponse {
        success: true,
        job_id,
        time: started.elapsed().as_millis(),
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = queries::jobs::find_resumable_job(&state.connection, &id, &user.id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;
    Ok(Json(JobResponse { success: true, job }))
}

/// Periodically deletes abandoned upload jobs.
pub fn spawn_purge(state: AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.job_purge_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match queries::jobs::purge_expired(&state.connection, Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => info!("Purged {} expired upload jobs", purged),
                Err(err) => error!("Error purging upload jobs: {}", err),
            }
        }
    })
}
