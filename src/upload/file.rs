use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use chrono::Utc;
use log::{debug, info, warn};
use sea_orm::Set;
use serde_json::{json, Value};
use uuid::Uuid;

use entities::upload;

use crate::auth_middleware::CurrentUser;
use crate::error::ApiError;
use crate::responses::upload_response::FileUploadResponse;
use crate::upload::sniff::{sniff_audio, sniff_image};
use crate::upload::{storage, validate, FileKind};
use crate::AppState;

const FALLBACK_MIME: &str = "application/octet-stream";

struct FilePart {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Best-effort technical metadata; a file that can't be sniffed still uploads.
fn metadata_for(kind: FileKind, bytes: &[u8]) -> Value {
    match kind {
        FileKind::Audio => match sniff_audio(bytes) {
            Ok(info) => {
                let mut metadata = json!(info);
                metadata["type"] = json!("audio");
                metadata
            }
            Err(err) => {
                warn!("Could not read audio metadata: {}", err);
                json!({ "type": "audio" })
            }
        },
        FileKind::Cover => match sniff_image(bytes) {
            Ok(info) => {
                let mut metadata = json!(info);
                metadata["type"] = json!("image");
                metadata
            }
            Err(err) => {
                warn!("Could not read image metadata: {}", err);
                json!({ "type": "image" })
            }
        },
        FileKind::Document => json!({}),
    }
}

pub async fn upload_file(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<FileUploadResponse>, ApiError> {
    let mut file: Option<FilePart> = None;
    let mut file_type: Option<String> = None;
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or("file").to_owned();
                let mime_type = field
                    .content_type()
                    .filter(|mime| !mime.is_empty())
                    .unwrap_or(FALLBACK_MIME)
                    .to_owned();
                let bytes = field.bytes().await?.to_vec();
                file = Some(FilePart {
                    name,
                    mime_type,
                    bytes,
                });
            }
            Some("type") => file_type = Some(field.text().await?.trim().to_owned()),
            _ => {}
        }
    }

    let (file, file_type) = match (file, file_type.filter(|t| !t.is_empty())) {
        (Some(file), Some(file_type)) => (file, file_type),
        _ => return Err(ApiError::BadRequest("File and type are required".to_string())),
    };
    let kind = validate(
        &file_type,
        file.bytes.len() as u64,
        &file.name,
        &state.config.limits,
    )
    .map_err(|message| {
        warn!("Rejected {} from user {}: {}", file.name, user.id, message);
        ApiError::BadRequest(message)
    })?;
    debug!(
        "Validated {} as {} ({} bytes)",
        file.name,
        kind.as_str(),
        file.bytes.len()
    );

    let filename = crate::upload::stored_filename(&file.name);
    let dir = storage::user_dir(&state.config.upload_root, &user.id, kind.as_str());
    let path = storage::write_file(&dir, &filename, &file.bytes).await?;
    info!("Stored {} for user {} at {}", file.name, user.id, path.display());

    let metadata = metadata_for(kind, &file.bytes);
    debug!("Metadata of {}: {}", filename, metadata);
    let checksum = storage::md5_hex(&file.bytes);
    debug!("Checksum of {}: {}", filename, checksum);
    let now = Utc::now();
    let record = upload::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user.id.to_owned()),
        url: Set(Some(storage::public_path(&user.id, kind.as_str(), &filename))),
        filename: Set(filename),
        original_name: Set(file.name),
        mime_type: Set(file.mime_type),
        size: Set(file.bytes.len() as i64),
        path: Set(Some(path.to_string_lossy().into_owned())),
        checksum: Set(Some(checksum)),
        status: Set("complete".to_string()),
        progress: Set(100),
        chunk_size: Set(None),
        total_chunks: Set(None),
        uploaded_chunks: Set(0),
        metadata: Set(Some(metadata)),
        created_at: Set(now),
        updated_at: Set(now),
        completed_at: Set(Some(now)),
    };
    let record = queries::uploads::add_upload(&state.connection, record).await?;
    info!("Recorded upload {} for user {}", record.id, user.id);

    Ok(Json(FileUploadResponse::from_upload(record)))
}
