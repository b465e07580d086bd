// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Uploaded file storage under the media root.
//!
//! Files are stored as `<area>/<uuid>.<ext>`; the original name lives in the
//! database.

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `content` and return its path relative to the root.
    pub async fn save(
        &self,
        area: &str,
        original_name: &str,
        content: &[u8],
    ) -> Result<String, AppError> {
        let relative = match extension(original_name) {
            Some(ext) => format!("{area}/{}.{ext}", Uuid::new_v4()),
            None => format!("{area}/{}", Uuid::new_v4()),
        };
        let path = self.resolve(&relative)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("create {:?}: {}", dir, e)))?;
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("write {:?}: {}", path, e)))?;

        tracing::debug!(path = %relative, bytes = content.len(), "Stored upload");
        Ok(relative)
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(relative)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("File {relative} not found")))
            }
            Err(e) => Err(AppError::Internal(anyhow::anyhow!("read {:?}: {}", path, e))),
        }
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, relative: &str) -> Result<(), AppError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!("delete {:?}: {}", path, e))),
        }
    }

    /// Pass `result` through, removing the stored file first when it is an error.
    pub async fn discard_on_error<T>(
        &self,
        relative: &str,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        if result.is_err() {
            if let Err(e) = self.delete(relative).await {
                tracing::warn!(path = %relative, error = %e, "Could not remove orphaned upload");
            }
        }
        result
    }

    /// Absolute path of a stored file.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, AppError> {
        let rel = Path::new(relative);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::BadRequest(format!("Invalid file path {relative}")));
        }
        Ok(self.root.join(rel))
    }
}

/// Extension of an uploaded file name, when it is plain alphanumerics.
fn extension(name: &str) -> Option<&str> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}
