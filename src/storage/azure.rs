use super::{BlobStore, ConnectionString, Credentials, StorageError, StorageResult};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use sha2::Sha256;
use std::sync::OnceLock;
use std::time::Duration;

pub const API_VERSION: &str = "2021-08-06";

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

type HmacSha256 = Hmac<Sha256>;

/// Azure Blob Storage over its REST API, authorized with Shared Key or a SAS token.
pub struct AzureBlobStore {
    client: reqwest::Client,
    endpoint: String,
    /// Path component of the endpoint, e.g. `/devstoreaccount1` for the emulator.
    endpoint_path: String,
    credentials: Credentials,
}

struct BlobRequest<'a> {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    headers: Vec<(&'static str, String)>,
    content_type: Option<&'a str>,
    body: Vec<u8>,
}

impl<'a> BlobRequest<'a> {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            headers: Vec::new(),
            content_type: None,
            body: Vec::new(),
        }
    }

    fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn body(mut self, body: Vec<u8>, content_type: &'a str) -> Self {
        self.body = body;
        self.content_type = Some(content_type);
        self
    }
}

impl AzureBlobStore {
    pub fn new(connection: ConnectionString) -> StorageResult<Self> {
        let endpoint_path = reqwest::Url::parse(&connection.blob_endpoint)
            .map_err(|e| {
                StorageError::InvalidConnectionString(format!("invalid BlobEndpoint: {}", e))
            })?
            .path()
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::request("build HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: connection.blob_endpoint,
            endpoint_path,
            credentials: connection.credentials,
        })
    }

    pub fn from_connection_string(value: &str) -> StorageResult<Self> {
        Self::new(ConnectionString::parse(value)?)
    }

    /// Public URL of a blob, percent-encoded.
    pub fn blob_url(&self, container: &str, key: &str) -> String {
        format!("{}/{}", self.endpoint, blob_path(container, key))
    }

    async fn send(&self, operation: &str, request: BlobRequest<'_>) -> StorageResult<Response> {
        let mut headers = request.headers;
        headers.push((
            "x-ms-date",
            Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        ));
        headers.push(("x-ms-version", API_VERSION.to_string()));

        let mut query: Vec<String> = request
            .query
            .iter()
            .map(|(name, value)| format!("{}={}", name, utf8_percent_encode(value, UNRESERVED)))
            .collect();
        if let Credentials::Sas(sas) = &self.credentials {
            query.push(sas.clone());
        }

        let mut url = format!("{}/{}", self.endpoint, request.path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &headers {
            builder = builder.header(*name, value);
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }

        if let Credentials::SharedKey { account, key } = &self.credentials {
            let resource = canonical_resource(
                account,
                &format!("{}/{}", self.endpoint_path, request.path),
                &request.query,
            );
            let to_sign = string_to_sign(
                &request.method,
                request.body.len(),
                request.content_type.unwrap_or_default(),
                &headers,
                &resource,
            );
            builder = builder.header(
                AUTHORIZATION,
                format!("SharedKey {}:{}", account, sign(key, &to_sign)?),
            );
        }

        if request.method == Method::PUT {
            builder = builder.body(request.body);
        }

        builder
            .send()
            .await
            .map_err(|e| StorageError::request(operation, e))
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn container_exists(&self, container: &str) -> StorageResult<bool> {
        let operation = "check container";
        let request = BlobRequest::new(Method::HEAD, container_path(container))
            .query("restype", "container");
        let response = self.send(operation, request).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(status_error(operation, response).await),
        }
    }

    async fn create_container(&self, container: &str, public_blobs: bool) -> StorageResult<()> {
        let operation = "create container";
        let mut request = BlobRequest::new(Method::PUT, container_path(container))
            .query("restype", "container");
        if public_blobs {
            request = request.header("x-ms-blob-public-access", "blob");
        }
        let response = self.send(operation, request).await?;

        match response.status() {
            StatusCode::CONFLICT => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(status_error(operation, response).await),
        }
    }

    async fn list_blobs(&self, container: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let operation = "list blobs";
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = BlobRequest::new(Method::GET, container_path(container))
                .query("restype", "container")
                .query("comp", "list")
                .query("prefix", prefix);
            if let Some(marker) = marker.take() {
                request = request.query("marker", marker);
            }

            let response = self.send(operation, request).await?;
            if !response.status().is_success() {
                return Err(status_error(operation, response).await);
            }
            let body = response
                .text()
                .await
                .map_err(|e| StorageError::request(operation, e))?;

            names.extend(parse_blob_names(&body));
            marker = parse_next_marker(&body);
            if marker.is_none() {
                return Ok(names);
            }
        }
    }

    async fn delete_blob(&self, container: &str, key: &str) -> StorageResult<()> {
        let operation = "delete blob";
        let request = BlobRequest::new(Method::DELETE, blob_path(container, key));
        let response = self.send(operation, request).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(status_error(operation, response).await),
        }
    }

    async fn upload_blob(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        let operation = "upload blob";
        let request = BlobRequest::new(Method::PUT, blob_path(container, key))
            .header("x-ms-blob-type", "BlockBlob")
            .body(bytes, content_type);
        let response = self.send(operation, request).await?;

        if !response.status().is_success() {
            return Err(status_error(operation, response).await);
        }
        Ok(self.blob_url(container, key))
    }
}

fn container_path(container: &str) -> String {
    utf8_percent_encode(container, UNRESERVED).to_string()
}

fn blob_path(container: &str, key: &str) -> String {
    let key = key
        .split('/')
        .map(|segment| utf8_percent_encode(segment, UNRESERVED).to_string())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", container_path(container), key)
}

/// `/account/path` followed by the query parameters, lowercased and sorted by name.
fn canonical_resource(account: &str, path: &str, query: &[(&str, String)]) -> String {
    let mut params: Vec<(String, &str)> = query
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
        .collect();
    params.sort();

    let mut resource = format!("/{}{}", account, path);
    for (name, value) in params {
        resource.push('\n');
        resource.push_str(&name);
        resource.push(':');
        resource.push_str(value);
    }
    resource
}

fn string_to_sign(
    method: &Method,
    content_length: usize,
    content_type: &str,
    headers: &[(&str, String)],
    canonical_resource: &str,
) -> String {
    // A zero length is signed as an empty string.
    let content_length = match content_length {
        0 => String::new(),
        n => n.to_string(),
    };

    let mut ms_headers: Vec<(String, &str)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
        .filter(|(name, _)| name.starts_with("x-ms-"))
        .collect();
    ms_headers.sort();
    let canonical_headers: String = ms_headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();

    // Verb, Content-Encoding, Content-Language, Content-Length, Content-MD5,
    // Content-Type, Date, If-Modified-Since, If-Match, If-None-Match,
    // If-Unmodified-Since, Range.
    format!(
        "{}\n\n\n{}\n\n{}\n\n\n\n\n\n\n{}{}",
        method.as_str(),
        content_length,
        content_type,
        canonical_headers,
        canonical_resource
    )
}

fn sign(key: &[u8], payload: &str) -> StorageResult<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| StorageError::request("sign request", e))?;
    mac.update(payload.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

async fn status_error(operation: &str, response: Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = xml_element(&body, "Message")
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "unknown error".to_string());

    StorageError::Status {
        operation: operation.to_string(),
        status: status.as_u16(),
        message,
    }
}

fn name_regex() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"<Blob>\s*<Name>([^<]*)</Name>").expect("static regex"))
}

fn parse_blob_names(xml: &str) -> Vec<String> {
    name_regex()
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_xml(m.as_str()))
        .collect()
}

fn parse_next_marker(xml: &str) -> Option<String> {
    xml_element(xml, "NextMarker").filter(|marker| !marker.is_empty())
}

fn xml_element(xml: &str, element: &str) -> Option<String> {
    let open = format!("<{}>", element);
    let close = format!("</{}>", element);
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(unescape_xml(&xml[start..end]))
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[path = "azure_tests.rs"]
mod tests;
