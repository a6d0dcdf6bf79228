//! Blob storage for upload mode: a small client trait, the Azure Blob REST
//! implementation, and the upload flow built on top of it.

mod azure;
mod connection;
mod error;
mod upload;

pub use azure::{API_VERSION, AzureBlobStore};
pub use connection::{ConnectionString, Credentials};
pub use error::{StorageError, StorageResult};
pub use upload::{IMAGE_CONTENT_TYPE, normalize_key, upload_image};

use async_trait::async_trait;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn container_exists(&self, container: &str) -> StorageResult<bool>;

    /// Create `container`, optionally with anonymous read access to its blobs.
    /// Creating a container that already exists is not an error.
    async fn create_container(&self, container: &str, public_blobs: bool) -> StorageResult<()>;

    /// Names of all blobs in `container` starting with `prefix`.
    async fn list_blobs(&self, container: &str, prefix: &str) -> StorageResult<Vec<String>>;

    async fn blob_exists(&self, container: &str, key: &str) -> StorageResult<bool> {
        let names = self.list_blobs(container, key).await?;
        Ok(names.iter().any(|name| name == key))
    }

    async fn delete_blob(&self, container: &str, key: &str) -> StorageResult<()>;

    /// Upload `bytes` as `key` and return the blob's URL.
    async fn upload_blob(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;
}
