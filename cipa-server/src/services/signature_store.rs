//! Signature artifact storage
//!
//! Files are named by the SHA-256 of their content, so storing the same image
//! twice yields the same reference. Only PNG and JPEG are accepted.

use base64::Engine;
use cipa_common::documents::ImageFormat;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// URL prefix under which stored signatures are served
pub const SIGNATURE_URL_PREFIX: &str = "/files/signatures";

/// Upper bound for one signature image
pub const MAX_SIGNATURE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Signature image is empty")]
    Empty,

    #[error("Signature image exceeds 2 MiB")]
    TooLarge,

    #[error("Signature must be a PNG or JPEG image")]
    UnsupportedFormat,

    #[error("Failed to store signature: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of storing one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSignature {
    /// File name, `<sha256>.<ext>`
    pub name: String,
    /// Durable reference stored on the candidate
    pub url: String,
    /// False when identical content was already on disk
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct SignatureStore {
    dir: PathBuf,
}

impl SignatureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode `data:image/png;base64,...`
    pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, SignatureError> {
        let rest = data_url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| SignatureError::InvalidDataUrl("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| SignatureError::InvalidDataUrl("missing payload".to_string()))?;
        if !header.ends_with(";base64") {
            return Err(SignatureError::InvalidDataUrl(
                "only base64 payloads are supported".to_string(),
            ));
        }

        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| SignatureError::InvalidDataUrl(e.to_string()))
    }

    /// Write `bytes` under its content hash
    pub async fn store(&self, bytes: &[u8]) -> Result<StoredSignature, SignatureError> {
        if bytes.is_empty() {
            return Err(SignatureError::Empty);
        }
        if bytes.len() > MAX_SIGNATURE_BYTES {
            return Err(SignatureError::TooLarge);
        }
        let format = ImageFormat::sniff(bytes).ok_or(SignatureError::UnsupportedFormat)?;

        let digest = Sha256::digest(bytes);
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        let name = format!("{}.{}", hex, format.extension());
        let path = self.dir.join(&name);

        tokio::fs::create_dir_all(&self.dir).await?;
        let created = if tokio::fs::try_exists(&path).await? {
            debug!("Signature {} already stored", name);
            false
        } else {
            // Write then rename so a reader never sees a partial file
            let tmp = self.dir.join(format!("{}.tmp", name));
            tokio::fs::write(&tmp, bytes).await?;
            tokio::fs::rename(&tmp, &path).await?;
            info!(file = %name, size = bytes.len(), "Stored signature");
            true
        };

        Ok(StoredSignature {
            url: format!("{}/{}", SIGNATURE_URL_PREFIX, name),
            name,
            created,
        })
    }

    pub async fn store_data_url(&self, data_url: &str) -> Result<StoredSignature, SignatureError> {
        let bytes = Self::decode_data_url(data_url)?;
        self.store(&bytes).await
    }

    /// Undo a store whose record insert failed; pre-existing files are kept
    pub async fn discard(&self, stored: &StoredSignature) {
        if !stored.created {
            return;
        }
        match tokio::fs::remove_file(self.dir.join(&stored.name)).await {
            Ok(()) => info!(file = %stored.name, "Removed orphaned signature"),
            Err(e) => warn!(file = %stored.name, "Failed to remove orphaned signature: {}", e),
        }
    }

    /// Path of a stored file; `None` for names this store never produces
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        let (stem, ext) = name.rsplit_once('.')?;
        let valid_stem = stem.len() == 64 && stem.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid_stem || !matches!(ext, "png" | "jpeg") {
            return None;
        }
        Some(self.dir.join(name))
    }

    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let name = url
            .strip_prefix(SIGNATURE_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))?;
        self.path_for(name)
    }

    /// Whether `url` is a reference this store issued and still holds
    pub async fn contains_url(&self, url: &str) -> bool {
        match self.path_for_url(url) {
            Some(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Delete the file behind a reference no record uses any more
    pub async fn remove_url(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(url, "Removed unreferenced signature"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(url, "Failed to remove signature: {}", e),
        }
    }

    /// Read a stored file with its MIME type
    pub async fn read(&self, name: &str) -> Result<Option<(Vec<u8>, &'static str)>, SignatureError> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let mime = match ImageFormat::sniff(&bytes) {
                    Some(ImageFormat::Jpeg) => "image/jpeg",
                    _ => "image/png",
                };
                Ok(Some((bytes, mime)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
