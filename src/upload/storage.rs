use std::io;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const STAGING_DIR: &str = ".staging";
const READ_BUFFER: usize = 64 * 1024;

/// A single path segment derived from client or database input.
fn segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// `<root>/<user>/<kind>`
pub fn user_dir(root: &Path, user_id: &str, kind: &str) -> PathBuf {
    root.join(segment(user_id)).join(segment(kind))
}

/// Public path under the static `/uploads` mount.
pub fn public_path(user_id: &str, kind: &str, filename: &str) -> String {
    format!("/uploads/{}/{}/{}", segment(user_id), segment(kind), filename)
}

pub fn staging_path(root: &Path, user_id: &str, upload_id: &str) -> PathBuf {
    root.join(segment(user_id))
        .join(STAGING_DIR)
        .join(format!("{}.part", segment(upload_id)))
}

pub async fn write_file(dir: &Path, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    fs::write(&path, bytes).await?;
    Ok(path)
}

/// Appends a chunk and returns the staging file's new length.
pub async fn append_chunk(path: &Path, bytes: &[u8]) -> io::Result<u64> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(file.metadata().await?.len())
}

/// Moves a finished staging file into place.
pub async fn promote(staging: &Path, dir: &Path, filename: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let destination = dir.join(filename);
    fs::rename(staging, &destination).await?;
    Ok(destination)
}

pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

pub async fn md5_file(path: &Path) -> io::Result<(String, u64)> {
    let mut file = fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; READ_BUFFER];
    let mut size = 0u64;
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        size += read as u64;
    }
    Ok((format!("{:x}", hasher.finalize()), size))
}
