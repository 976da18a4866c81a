use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use entities::{upload, upload_job};

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadItem {
    pub id: String,
    pub url: Option<String>,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub path: Option<String>,
    pub checksum: Option<String>,
    pub metadata: Value,
    pub status: String,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Clone, Debug)]
pub struct FileUploadResponse {
    pub success: bool,
    pub upload: UploadItem,
}

impl FileUploadResponse {
    pub fn from_upload(upload: upload::Model) -> Self {
        FileUploadResponse {
            success: true,
            upload: UploadItem {
                id: upload.id,
                url: upload.url,
                filename: upload.filename,
                original_name: upload.original_name,
                mime_type: upload.mime_type,
                size: upload.size,
                path: upload.path,
                checksum: upload.checksum,
                metadata: upload.metadata.unwrap_or(Value::Null),
                status: upload.status,
                progress: upload.progress,
                created_at: upload.created_at,
            },
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    pub song_id: String,
    pub track_ids: Vec<String>,
    pub message: String,
    pub status: String,
    pub processing_time: u128,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub duration: u32,
    pub album: String,
    pub year: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct ExtractMetadataResponse {
    pub success: bool,
    pub metadata: TrackMetadata,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SaveJobResponse {
    pub success: bool,
    pub job_id: String,
    pub time: u128,
}

#[derive(Serialize, Clone, Debug)]
pub struct JobResponse {
    pub success: bool,
    pub job: upload_job::Model,
}
