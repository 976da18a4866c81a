use axum::extract::Multipart;
use axum::Json;
use log::{info, warn};

use crate::error::ApiError;
use crate::responses::upload_response::{ExtractMetadataResponse, TrackMetadata};
use crate::upload::sniff::{read_tags, sniff_audio};

/// `name` without its last extension, as long as that extension is non-empty.
fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    }
}

fn describe(name: &str, bytes: &[u8]) -> TrackMetadata {
    let tags = read_tags(bytes);
    let duration = match sniff_audio(bytes) {
        Ok(info) => info.duration,
        Err(err) => {
            warn!("Could not read duration of {}: {}", name, err);
            0
        }
    };
    TrackMetadata {
        title: tags.title.unwrap_or_else(|| file_stem(name).to_owned()),
        artist: tags.artist.unwrap_or_default(),
        duration,
        album: tags.album.unwrap_or_default(),
        year: tags.year.unwrap_or_default(),
    }
}

/// Pre-fills the upload wizard from an audio file without storing it.
pub async fn extract_metadata(
    mut multipart: Multipart,
) -> Result<Json<ExtractMetadataResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("file").to_owned();
            let bytes = field.bytes().await?.to_vec();
            file = Some((name, bytes));
        }
    }
    let (name, bytes) = file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    info!("Extracting metadata from {} ({} bytes)", name, bytes.len());

    let metadata = describe(&name, &bytes);
    info!(
        "Metadata of {}: title {:?}, {} s",
        name, metadata.title, metadata.duration
    );
    Ok(Json(ExtractMetadataResponse {
        success: true,
        metadata,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_drops_only_the_last_extension() {
        assert_eq!(file_stem("take.one.mp3"), "take.one");
        assert_eq!(file_stem("demo"), "demo");
        assert_eq!(file_stem("demo."), "demo.");
    }

    #[test]
    fn untagged_noise_falls_back_to_the_filename() {
        let metadata = describe("Late Night.mp3", &[0u8; 512]);
        assert_eq!(metadata.title, "Late Night");
        assert_eq!(metadata.artist, "");
        assert_eq!(metadata.duration, 0);
        assert_eq!(metadata.year, "");
    }
}
