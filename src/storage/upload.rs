use super::{BlobStore, StorageResult};
use crate::prompt::Prompter;
use percent_encoding::percent_decode_str;

pub const IMAGE_CONTENT_TYPE: &str = "image/png";

/// Blob key for an image path: forward slashes, no leading slash.
pub fn normalize_key(key: &str) -> String {
    key.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Upload a captured PNG and return its decoded URL.
///
/// The container is created with public blob access when missing. An existing blob
/// with the same key is only replaced after the user agrees; declining returns
/// `Ok(None)` and leaves the blob untouched.
pub async fn upload_image(
    store: &dyn BlobStore,
    prompter: &dyn Prompter,
    container: &str,
    key: &str,
    bytes: Vec<u8>,
) -> StorageResult<Option<String>> {
    let container = container.to_lowercase();
    let key = normalize_key(key);

    if !store.container_exists(&container).await? {
        store.create_container(&container, true).await?;
    }

    if store.blob_exists(&container, &key).await? {
        let message = format!("File {} already exists. Would you want to replace?", key);
        if !prompter.confirm(&message, "Replace").await {
            return Ok(None);
        }
        store.delete_blob(&container, &key).await?;
    }

    let url = store
        .upload_blob(&container, &key, bytes, IMAGE_CONTENT_TYPE)
        .await?;
    Ok(Some(percent_decode_str(&url).decode_utf8_lossy().into_owned()))
}
