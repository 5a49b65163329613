//! Multipart bodies for image uploads.
//!
//! Size and type are checked from metadata and the file name; the bytes are
//! only read once both checks pass.
use std::path::Path;

use crate::error::{Error, Result};

pub const BOUNDARY: &str = "Tw3ePy";

pub const PROFILE_IMAGE_MAX_KB: u64 = 700;
pub const BACKGROUND_IMAGE_MAX_KB: u64 = 800;

const ACCEPTED: &[&str] = &["image/gif", "image/jpeg", "image/png"];

/// A packed body and the header overrides that describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Pack `path` as the single `image` part of a multipart body.
pub async fn pack_image(path: impl AsRef<Path>, max_size_kb: u64) -> Result<Multipart> {
    let path = path.as_ref();
    let unreadable = |e: std::io::Error| Error::FileUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let size = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
    if size > max_size_kb.saturating_mul(1024) {
        return Err(Error::FileTooLarge {
            size,
            max_kb: max_size_kb,
        });
    }

    let mime = mime_guess::from_path(path)
        .first()
        .ok_or_else(|| Error::UnknownType(path.to_path_buf()))?;
    let mime = mime.essence_str().to_string();
    if !ACCEPTED.contains(&mime.as_str()) {
        return Err(Error::UnsupportedType(mime));
    }

    let bytes = tokio::fs::read(path).await.map_err(unreadable)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
    body.extend_from_slice(&bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    tracing::debug!(
        file = %path.display(),
        mime = %mime,
        size,
        body_len = body.len(),
        "multipart.packed"
    );

    Ok(Multipart {
        headers: vec![
            (
                "Content-Type".to_string(),
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ),
            ("Content-Length".to_string(), body.len().to_string()),
        ],
        body,
    })
}
