use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use entities::upload;

use crate::dxl::error::DxlError;
use crate::dxl::{DxlRequest, Handler, Reply};
use crate::upload::{sanitize_filename, storage};
use crate::AppState;

pub const CHUNK_SIZE: u64 = 1024 * 1024;
const CHUNKED_DIR: &str = "chunked";
const STATUS_LOADING: &str = "loading";
const STATUS_COMPLETE: &str = "complete";

pub struct UploadsHandler;

#[derive(Deserialize, Default)]
struct StartBody {
    filename: Option<String>,
    size: Option<u64>,
    mime_type: Option<String>,
}

#[derive(Deserialize, Default)]
struct CompleteBody {
    upload_id: Option<String>,
    checksum: Option<String>,
}

fn io_error(err: std::io::Error) -> DxlError {
    DxlError::Internal(err.to_string())
}

fn total_chunks(size: u64) -> u64 {
    size.div_ceil(CHUNK_SIZE)
}

/// Rejects sizes above the largest per-kind ceiling; returns the size and
/// chunk count as column types.
fn checked_size(size: u64, max_bytes: u64) -> Result<(i64, i32), DxlError> {
    let too_large = || {
        DxlError::validation(
            "File too large",
            json!({ "field": "size", "max_size": max_bytes }),
        )
    };
    if size > max_bytes {
        return Err(too_large());
    }
    let stored = i64::try_from(size).map_err(|_| too_large())?;
    let chunks = i32::try_from(total_chunks(size)).map_err(|_| too_large())?;
    Ok((stored, chunks))
}

fn chunk_progress(uploaded: i32, total: i32) -> i32 {
    if total <= 0 {
        return 0;
    }
    (i64::from(uploaded) * 100 / i64::from(total)).min(100) as i32
}

async fn owned_upload(
    state: &AppState,
    id: &str,
    user_id: &str,
) -> Result<upload::Model, DxlError> {
    queries::uploads::find_owned_upload(&state.connection, id, user_id)
        .await?
        .ok_or_else(|| DxlError::not_found("Upload not found"))
}

impl UploadsHandler {
    async fn start(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let user_id = request.user_id()?;
        let body: StartBody = request.json()?;
        let (original_name, size, mime_type) = match (
            body.filename.filter(|name| !name.is_empty()),
            body.size.filter(|size| *size > 0),
            body.mime_type.filter(|mime| !mime.is_empty()),
        ) {
            (Some(name), Some(size), Some(mime)) => (name, size, mime),
            _ => return Err(DxlError::missing_fields(&["filename", "size", "mime_type"])),
        };

        let (size, chunks) = checked_size(size, state.config.limits.largest_bytes())?;
        let now = Utc::now();
        let record = upload::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_owned()),
            filename: Set(format!(
                "{}_{}",
                now.timestamp_millis(),
                sanitize_filename(&original_name)
            )),
            original_name: Set(original_name),
            mime_type: Set(mime_type),
            size: Set(size),
            path: Set(None),
            url: Set(None),
            checksum: Set(None),
            status: Set(STATUS_LOADING.to_string()),
            progress: Set(0),
            chunk_size: Set(Some(CHUNK_SIZE as i32)),
            total_chunks: Set(Some(chunks)),
            uploaded_chunks: Set(0),
            metadata: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            completed_at: Set(None),
        };
        let upload = queries::uploads::add_upload(&state.connection, record).await?;
        info!("Started chunked upload {} of {} chunks", upload.id, chunks);

        Ok(Reply::new(
            json!({
                "upload_id": upload.id,
                "filename": upload.filename,
                "status": upload.status,
                "chunk_size": upload.chunk_size,
                "total_chunks": chunks,
            }),
            "Upload started",
        ))
    }

    async fn chunk(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let user_id = request.user_id()?;
        let upload_id = request.header("upload-id");
        let chunk_number = request
            .header("chunk-number")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|number| *number > 0);
        let (upload_id, chunk_number) = match (upload_id, chunk_number) {
            (Some(upload_id), Some(chunk_number)) => (upload_id, chunk_number),
            _ => return Err(DxlError::bad_request("Missing upload ID or chunk number")),
        };

        let upload = owned_upload(state, upload_id, user_id).await?;
        if upload.status == STATUS_COMPLETE {
            return Err(DxlError::bad_request("Upload already completed"));
        }
        let staging = storage::staging_path(&state.config.upload_root, user_id, &upload.id);
        let staged = storage::append_chunk(&staging, &request.body)
            .await
            .map_err(io_error)?;
        debug!("Upload {} chunk {} staged, {} bytes", upload.id, chunk_number, staged);

        let total = upload.total_chunks.unwrap_or(1);
        let uploaded = upload.uploaded_chunks + 1;
        let progress = chunk_progress(uploaded, total);
        let upload =
            queries::uploads::record_chunk(&state.connection, upload, uploaded, progress).await?;

        Ok(Reply::new(
            json!({
                "upload_id": upload.id,
                "chunk_number": chunk_number,
                "total_chunks": upload.total_chunks,
                "progress": upload.progress,
            }),
            "Chunk uploaded successfully",
        ))
    }

    async fn complete(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let user_id = request.user_id()?;
        let body: CompleteBody = request.json()?;
        let upload_id = body
            .upload_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DxlError::bad_request("Upload ID is required"))?;
        let upload = owned_upload(state, &upload_id, user_id).await?;

        let staging = storage::staging_path(&state.config.upload_root, user_id, &upload.id);
        if upload.uploaded_chunks == 0 || !staging.exists() {
            return Err(DxlError::bad_request("No chunks have been uploaded"));
        }
        let (checksum, _) = storage::md5_file(&staging).await.map_err(io_error)?;
        if let Some(expected) = body.checksum.filter(|sum| !sum.is_empty()) {
            if !expected.eq_ignore_ascii_case(&checksum) {
                return Err(DxlError::validation(
                    "Checksum mismatch",
                    json!({ "expected": expected, "actual": checksum }),
                ));
            }
        }

        let dir = storage::user_dir(&state.config.upload_root, user_id, CHUNKED_DIR);
        let path = storage::promote(&staging, &dir, &upload.filename)
            .await
            .map_err(io_error)?;
        let url = storage::public_path(user_id, CHUNKED_DIR, &upload.filename);
        let upload = queries::uploads::finish_upload(
            &state.connection,
            upload,
            path.to_string_lossy().into_owned(),
            url,
            checksum,
        )
        .await?;
        info!("Completed chunked upload {}", upload.id);

        Ok(Reply::new(
            json!({
                "upload_id": upload.id,
                "status": upload.status,
                "path": upload.path,
                "size": upload.size,
                "url": upload.url,
                "checksum": upload.checksum,
            }),
            "Upload completed successfully",
        ))
    }

    async fn status(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let user_id = request.user_id()?;
        let upload_id = request
            .param("id")
            .ok_or_else(|| DxlError::bad_request("Upload ID is required"))?;
        let upload = owned_upload(state, upload_id, user_id).await?;

        Ok(Reply::new(
            json!({
                "upload_id": upload.id,
                "filename": upload.original_name,
                "status": upload.status,
                "progress": upload.progress,
                "size": upload.size,
                "url": upload.url,
            }),
            "Upload status retrieved",
        ))
    }
}

#[async_trait]
impl Handler for UploadsHandler {
    fn module(&self) -> &'static str {
        "uploads"
    }

    async fn process(
        &self,
        state: &AppState,
        request: &DxlRequest,
        operation: &str,
    ) -> Result<Reply, DxlError> {
        match operation {
            "start" => self.start(state, request).await,
            "chunk" => self.chunk(state, request).await,
            "complete" => self.complete(state, request).await,
            "status" => self.status(state, request).await,
            _ => Err(DxlError::invalid_operation()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_rounds_up() {
        assert_eq!(total_chunks(1), 1);
        assert_eq!(total_chunks(CHUNK_SIZE), 1);
        assert_eq!(total_chunks(CHUNK_SIZE + 1), 2);
        assert_eq!(total_chunks(5 * CHUNK_SIZE - 3), 5);
        assert_eq!(total_chunks(u64::MAX), u64::MAX / CHUNK_SIZE + 1);
    }

    #[test]
    fn oversized_uploads_are_refused() {
        let max = 200 * CHUNK_SIZE;
        assert_eq!(checked_size(max, max).unwrap(), (max as i64, 200));
        assert_eq!(checked_size(3, max).unwrap(), (3, 1));

        let err = checked_size(max + 1, max).unwrap_err();
        assert_eq!(err.code(), 422);
        assert!(checked_size(u64::MAX, u64::MAX).is_err());
    }

    #[test]
    fn progress_is_floored_and_capped() {
        assert_eq!(chunk_progress(1, 3), 33);
        assert_eq!(chunk_progress(2, 3), 66);
        assert_eq!(chunk_progress(3, 3), 100);
        assert_eq!(chunk_progress(4, 3), 100);
        assert_eq!(chunk_progress(1, 0), 0);
    }
}
