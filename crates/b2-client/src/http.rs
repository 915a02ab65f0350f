//! Single-request execution and B2 wire constants

use crate::{B2Error, Result};
use bytes::Bytes;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

// ==================== Endpoints ====================

pub(crate) const AUTHORIZE_ACCOUNT: &str = "b2api/v1/b2_authorize_account";
pub(crate) const CREATE_BUCKET: &str = "b2api/v1/b2_create_bucket";
pub(crate) const LIST_BUCKETS: &str = "b2api/v2/b2_list_buckets";
pub(crate) const UPDATE_BUCKET: &str = "b2api/v1/b2_update_bucket";
pub(crate) const GET_UPLOAD_URL: &str = "b2api/v1/b2_get_upload_url";
pub(crate) const LIST_FILE_NAMES: &str = "b2api/v1/b2_list_file_names";
pub(crate) const LIST_FILE_VERSIONS: &str = "b2api/v1/b2_list_file_versions";
pub(crate) const GET_FILE_INFO: &str = "b2api/v1/b2_get_file_info";
pub(crate) const DELETE_FILE_VERSION: &str = "b2api/v1/b2_delete_file_version";
pub(crate) const HIDE_FILE: &str = "b2api/v1/b2_hide_file";
pub(crate) const DOWNLOAD_FILE_BY_ID: &str = "b2api/v1/b2_download_file_by_id";

// ==================== Headers ====================

pub const HEADER_FILE_NAME: &str = "X-Bz-File-Name";
pub const HEADER_FILE_ID: &str = "X-Bz-File-Id";
pub const HEADER_CONTENT_SHA1: &str = "X-Bz-Content-Sha1";

/// Content type that asks B2 to pick one from the file name
pub const AUTO_CONTENT_TYPE: &str = "b2/x-auto";

/// Longest file name B2 accepts, in UTF-8 bytes
const MAX_FILE_NAME_BYTES: usize = 1024;

/// Join a base URL returned by the server with an endpoint path
pub(crate) fn endpoint(base: &str, path: &str) -> Result<url::Url> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    url::Url::parse(&joined).map_err(|e| B2Error::UrlConstruction(format!("{}: {}", joined, e)))
}

/// Send one request and return the successful response
pub(crate) async fn execute_response(request: RequestBuilder) -> Result<Response> {
    let (client, request) = request.build_split();
    let request = request.map_err(|e| B2Error::MalformedRequest(e.to_string()))?;

    debug!("Sending {} request to {}", request.method(), request.url().path());
    let response = client.execute(request).await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(B2Error::from_api_body(&body, status.as_u16()));
    }

    Ok(response)
}

/// Send one request and return the raw body
pub(crate) async fn execute(request: RequestBuilder) -> Result<Bytes> {
    let response = execute_response(request).await?;
    Ok(response.bytes().await?)
}

/// Decode a JSON response body
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(B2Error::malformed)
}

/// Percent-encode a file name for the `X-Bz-File-Name` header.
///
/// `/` stays literal so folder-style names read naturally in logs.
pub fn encode_file_name(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(B2Error::UrlEncoding("file name is empty".to_string()));
    }
    if name.len() > MAX_FILE_NAME_BYTES {
        return Err(B2Error::UrlEncoding(format!(
            "file name is {} bytes, limit is {}",
            name.len(),
            MAX_FILE_NAME_BYTES
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(B2Error::UrlEncoding(
            "file name contains control characters".to_string(),
        ));
    }

    Ok(urlencoding::encode(name).replace("%2F", "/"))
}

/// Reverse of [`encode_file_name`]
pub fn decode_file_name(encoded: &str) -> Result<String> {
    urlencoding::decode(encoded)
        .map(|s| s.into_owned())
        .map_err(|e| B2Error::UrlEncoding(e.to_string()))
}
