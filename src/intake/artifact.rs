// src/intake/artifact.rs
// Uploaded artifacts: suffix classification, filename sanitizing, and
// request-scoped on-disk staging

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::Result;

/// Closed set of upload classifications, decided solely by filename suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Pdf,
    Text,
    Unsupported,
}

impl ArtifactKind {
    /// Classify by case-insensitive filename suffix
    pub fn from_filename(name: &str) -> Self {
        let suffix = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return Self::Unsupported,
        };
        match suffix.as_str() {
            "png" | "jpg" | "jpeg" | "webp" | "gif" => Self::Image,
            "pdf" => Self::Pdf,
            "txt" | "md" => Self::Text,
            _ => Self::Unsupported,
        }
    }
}

/// Reduce a declared filename to a safe basename: strip any path
/// components, replace everything outside [A-Za-z0-9._-], drop leading dots
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// One received upload, staged on disk for the duration of a single
/// request. The backing file is removed when the value drops, so every
/// exit path reclaims it.
#[derive(Debug)]
pub struct StoredArtifact {
    path: PathBuf,
    filename: String,
    kind: ArtifactKind,
}

impl StoredArtifact {
    /// Write upload bytes under `dir`. The on-disk name is uuid-prefixed so
    /// concurrent uploads of the same filename cannot collide; the
    /// classification comes from the sanitized declared name.
    pub async fn stage(dir: &Path, declared_name: &str, bytes: &[u8]) -> Result<Self> {
        let filename = sanitize_filename(declared_name);
        let kind = ArtifactKind::from_filename(&filename);
        let path = dir.join(format!("{}-{}", Uuid::new_v4(), filename));
        tokio::fs::write(&path, bytes).await?;
        debug!(file = %filename, ?kind, "upload staged");
        Ok(Self {
            path,
            filename,
            kind,
        })
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoredArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %e, "staged upload already gone");
        }
    }
}
