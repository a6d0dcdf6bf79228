use super::{StorageError, StorageResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    SharedKey { account: String, key: Vec<u8> },
    /// Query string appended to every request, without the leading `?`.
    Sas(String),
}

// Keys never end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::SharedKey { account, .. } => f
                .debug_struct("SharedKey")
                .field("account", account)
                .finish_non_exhaustive(),
            Credentials::Sas(_) => f.write_str("Sas(..)"),
        }
    }
}

/// A parsed storage account connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub blob_endpoint: String,
    pub credentials: Credentials,
}

impl ConnectionString {
    pub fn parse(value: &str) -> StorageResult<Self> {
        let mut protocol = DEFAULT_PROTOCOL.to_string();
        let mut suffix = DEFAULT_ENDPOINT_SUFFIX.to_string();
        let mut account = None;
        let mut key = None;
        let mut sas = None;
        let mut blob_endpoint = None;

        for pair in value.split(';').filter(|p| !p.trim().is_empty()) {
            let (name, val) = pair.split_once('=').ok_or_else(|| {
                StorageError::InvalidConnectionString(format!("'{}' is not a key=value pair", pair))
            })?;
            let val = val.trim().to_string();

            match name.trim() {
                "DefaultEndpointsProtocol" => protocol = val,
                "EndpointSuffix" => suffix = val,
                "AccountName" => account = Some(val),
                "AccountKey" => key = Some(val),
                "SharedAccessSignature" => sas = Some(val.trim_start_matches('?').to_string()),
                "BlobEndpoint" => blob_endpoint = Some(val.trim_end_matches('/').to_string()),
                // Queue, table, and file endpoints are irrelevant here.
                _ => {}
            }
        }

        let blob_endpoint = match (blob_endpoint, &account) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!("{}://{}.blob.{}", protocol, account, suffix),
            (None, None) => {
                return Err(StorageError::InvalidConnectionString(
                    "either AccountName or BlobEndpoint is required".to_string(),
                ));
            }
        };

        let credentials = match (account, key, sas) {
            (Some(account), Some(key), _) => Credentials::SharedKey {
                account,
                key: STANDARD.decode(key)?,
            },
            (_, None, Some(sas)) => Credentials::Sas(sas),
            (None, Some(_), _) => {
                return Err(StorageError::InvalidConnectionString(
                    "AccountKey requires AccountName".to_string(),
                ));
            }
            (_, None, None) => {
                return Err(StorageError::InvalidConnectionString(
                    "either AccountKey or SharedAccessSignature is required".to_string(),
                ));
            }
        };

        Ok(Self {
            blob_endpoint,
            credentials,
        })
    }
}
