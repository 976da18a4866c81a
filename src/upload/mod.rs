//! The REST upload surface: whole-file uploads, publishing a finished upload
//! as a song, and the resumable wizard jobs.

use chrono::Utc;
use uuid::Uuid;

use crate::config::Limits;

pub mod file;
pub mod jobs;
pub mod metadata;
pub mod publish;
pub mod sniff;
pub mod storage;

const MB: u64 = 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Audio,
    Cover,
    Document,
}

impl FileKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "audio" => Some(FileKind::Audio),
            "cover" => Some(FileKind::Cover),
            "document" => Some(FileKind::Document),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Audio => "audio",
            FileKind::Cover => "cover",
            FileKind::Document => "document",
        }
    }

    pub fn max_mb(self, limits: &Limits) -> u64 {
        match self {
            FileKind::Audio => limits.audio_mb,
            FileKind::Cover => limits.cover_mb,
            FileKind::Document => limits.document_mb,
        }
    }
}

/// Checks a file against its kind. The error is the message shown to the
/// client.
pub fn validate(kind: &str, size: u64, original_name: &str, limits: &Limits) -> Result<FileKind, String> {
    let kind = FileKind::parse(kind).ok_or_else(|| "Invalid file type".to_string())?;
    let max_mb = kind.max_mb(limits);
    if size > max_mb.saturating_mul(MB) {
        return Err(format!(
            "File too large. Max size for {}: {}MB",
            kind.as_str(),
            max_mb
        ));
    }
    let name = original_name.to_lowercase();
    match kind {
        FileKind::Audio if !name.ends_with(".mp3") => {
            Err("Only MP3 files are supported for audio".to_string())
        }
        FileKind::Cover
            if ![".jpg", ".jpeg", ".png"]
                .iter()
                .any(|ext| name.ends_with(ext)) =>
        {
            Err("Only JPG and PNG files are supported for cover images".to_string())
        }
        _ => Ok(kind),
    }
}

/// Lower-cased extension of a client file name, `bin` when there is none.
pub fn extension(original_name: &str) -> String {
    match original_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_lowercase()
        }
        _ => "bin".to_string(),
    }
}

/// Keeps the last path component and replaces anything outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.chars().take(200).collect()
    }
}

/// `<millis>_<uuid>.<ext>`, unique across concurrent uploads.
pub fn stored_filename(original_name: &str) -> String {
    format!(
        "{}_{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        extension(original_name)
    )
}
