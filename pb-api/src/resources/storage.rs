//! Storage (CDN) endpoints: upload, listing, deletion, and raw file serving.

use std::path::Path;

use reqwest::multipart;
use serde::Deserialize;
use tracing::debug;

use pb_core::constants::storage_directory;
use pb_core::error::{PbError, PbResult};
use pb_models::StorageFile;

use crate::client::ApiClient;

/// Response wrapper for the upload endpoint.
#[derive(Debug, Deserialize)]
struct UploadBody {
    #[serde(default)]
    url: String,
}

/// Response wrapper for the list endpoint.
#[derive(Debug, Deserialize)]
struct FilesBody {
    #[serde(default)]
    files: Vec<StorageFile>,
}

/// Response wrapper for the info endpoint.
#[derive(Debug, Deserialize)]
struct FileInfoBody {
    #[serde(default)]
    file_info: StorageFile,
}

/// Client for the `/storage` endpoint group.
///
/// Management operations (upload, list, delete, cleanup) are admin-or-owner
/// only; serving a file by path only needs a valid token.
#[derive(Clone)]
pub struct StorageClient {
    http: ApiClient,
}

impl StorageClient {
    /// Create a storage client over the given transport.
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    fn token(&self) -> &str {
        self.http.auth_token()
    }

    /// Upload a local file into the given storage directory, returning the
    /// served URL.
    ///
    /// The directory is validated against the accepted set before any IO.
    pub async fn upload_file(&self, file_path: &Path, directory: &str) -> PbResult<String> {
        if !storage_directory::ALL.contains(&directory) {
            return Err(PbError::InvalidDirectory(directory.to_string()));
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let bytes = std::fs::read(file_path)?;
        debug!("uploading {} ({} bytes) to {}", file_name, bytes.len(), directory);

        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new()
            .part("file", part)
            .text("auth_token", self.token().to_string())
            .text("directory", directory.to_string());

        let resp = self.http.post_multipart("/storage/upload", form).await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: UploadBody = ApiClient::json(resp).await?;
                Ok(body.url)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// List files in a storage directory ("all" for every directory).
    pub async fn list_files(&self, directory: &str) -> PbResult<Vec<StorageFile>> {
        let resp = self
            .http
            .get(
                "/storage/list",
                &[("auth_token", self.token()), ("directory", directory)],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: FilesBody = ApiClient::json(resp).await?;
                Ok(body.files)
            }
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Delete a stored file by its served URL.
    pub async fn delete_file(&self, file_url: &str) -> PbResult<()> {
        let resp = self
            .http
            .post_query(
                "/storage/delete",
                &[("auth_token", self.token()), ("file_url", file_url)],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            404 => Err(PbError::FileNotFound(file_url.to_string())),
            400 => Err(delete_file_error(ApiClient::detail(resp).await, file_url)),
            403 => Err(delete_forbidden_error(ApiClient::detail(resp).await)),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Get information about a stored file.
    pub async fn file_info(&self, file_url: &str) -> PbResult<StorageFile> {
        let resp = self
            .http
            .get(
                "/storage/info",
                &[("auth_token", self.token()), ("file_url", file_url)],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => {
                let body: FileInfoBody = ApiClient::json(resp).await?;
                Ok(body.file_info)
            }
            404 => Err(PbError::FileNotFound(file_url.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Clean up files no longer referenced by any record. An empty
    /// subdirectory cleans every supported directory.
    pub async fn cleanup_orphaned(&self, subdirectory: &str) -> PbResult<()> {
        let resp = self
            .http
            .post_query(
                "/storage/cleanup-orphaned",
                &[("auth_token", self.token()), ("subdirectory", subdirectory)],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }

    /// Serve a stored file's raw bytes by its relative path.
    pub async fn serve_file(&self, file_path: &str) -> PbResult<Vec<u8>> {
        let resp = self
            .http
            .get_extended(
                &format!("/storage/{file_path}"),
                &[("auth_token", self.token())],
            )
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => ApiClient::bytes(resp).await,
            404 => Err(PbError::FileNotFound(file_path.to_string())),
            _ => Err(ApiClient::default_error(resp).await),
        }
    }
}

/// Disambiguate a 400 from delete-file: a missing file and a bad token share
/// the status code.
fn delete_file_error(detail: String, file_url: &str) -> PbError {
    if detail.to_lowercase().contains("not found") {
        PbError::FileNotFound(file_url.to_string())
    } else {
        PbError::BadAuthToken(detail)
    }
}

/// Disambiguate a 403 from delete-file: missing privileges versus a
/// protected file (an avatar/banner still in use).
fn delete_forbidden_error(detail: String) -> PbError {
    if detail.to_lowercase().contains("forbidden") {
        PbError::NotAdminOrOwner(detail)
    } else {
        PbError::IpSecurity(format!("cannot delete protected file: {detail}"))
    }
}
