//! Bucket handle: uploads, listings and bucket settings

use crate::{
    digest,
    http::{self, AUTO_CONTENT_TYPE, HEADER_CONTENT_SHA1, HEADER_FILE_NAME},
    session::Session,
    types::*,
    B2Error, Result,
};
use bytes::Bytes;
use reqwest::header;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// One named bucket, bound to the session that produced it
#[derive(Clone, Debug)]
pub struct Bucket {
    id: String,
    name: String,
    bucket_type: BucketType,
    session: Session,
}

impl Bucket {
    pub(crate) fn from_payload(payload: BucketPayload, session: Session) -> Self {
        Self {
            id: payload.bucket_id,
            name: payload.bucket_name,
            bucket_type: payload.bucket_type,
            session,
        }
    }

    /// Bucket id assigned by B2
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bucket name, unique across all of B2
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Access level as last reported by the server
    pub fn bucket_type(&self) -> BucketType {
        self.bucket_type
    }

    /// The session this bucket issues requests through
    pub fn session(&self) -> &Session {
        &self.session
    }

    // ==================== Uploads ====================

    /// Upload a buffer as `file_name`.
    ///
    /// `content_type` defaults to `b2/x-auto`. When `sha1` is `None` the digest
    /// is computed over `data`; a supplied digest is sent unchanged.
    #[instrument(skip(self, data, sha1), fields(bucket = %self.name))]
    pub async fn upload(
        &self,
        data: impl Into<Bytes>,
        file_name: &str,
        content_type: Option<&str>,
        sha1: Option<&str>,
    ) -> Result<UploadFileResponse> {
        let data = data.into();
        let target = self.prepare_upload().await?;

        let sha1 = match sha1 {
            Some(supplied) => {
                if !digest::is_sha1_hex(supplied) {
                    warn!(digest = supplied, "Caller-supplied SHA-1 is not 40 hex characters");
                }
                supplied.to_string()
            }
            None => digest::sha1_hex(&data),
        };

        let encoded_name = http::encode_file_name(file_name)?;
        let url = url::Url::parse(&target.upload_url)
            .map_err(|e| B2Error::UrlEncoding(format!("upload URL {}: {}", target.upload_url, e)))?;

        debug!(size = data.len(), sha1 = %sha1, "Uploading file");

        let request = self
            .session
            .http()
            .post(url)
            .header(header::AUTHORIZATION, target.authorization_token)
            .header(HEADER_FILE_NAME, encoded_name)
            .header(header::CONTENT_TYPE, content_type.unwrap_or(AUTO_CONTENT_TYPE))
            .header(HEADER_CONTENT_SHA1, sha1)
            .body(data);

        let body = http::execute(request).await?;
        let response: UploadFileResponse = http::decode(&body)?;

        info!(file_id = %response.file_id, "Uploaded file");
        Ok(response)
    }

    /// Upload a local file; the stored name defaults to the file's own name
    #[instrument(skip(self, path), fields(bucket = %self.name, path = %path.as_ref().display()))]
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        file_name: Option<&str>,
    ) -> Result<UploadFileResponse> {
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path).await?;
        if metadata.is_dir() {
            return Err(B2Error::UploadFailed(format!(
                "directory uploads are not supported: {}",
                path.display()
            )));
        }

        let name = match file_name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_string())
                .ok_or_else(|| {
                    B2Error::UploadFailed(format!("no usable file name in {}", path.display()))
                })?,
        };

        let data = tokio::fs::read(path).await?;
        self.upload(data, &name, None, None).await
    }

    /// Upload whatever a URL points at.
    ///
    /// `file://` URLs go through [`Bucket::upload_file`]; anything else is
    /// fetched and stored under the URL's last path segment.
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn upload_from_url(&self, url: &url::Url) -> Result<UploadFileResponse> {
        // Nothing is fetched without a session to upload through
        self.session.api_credentials()?;

        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| B2Error::UrlConstruction(format!("not a local path: {}", url)))?;
            return self.upload_file(path, None).await;
        }

        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(|segment| http::decode_file_name(segment))
            .transpose()?
            .ok_or_else(|| B2Error::UploadFailed(format!("no file name in {}", url)))?;

        let response = self.session.http().get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(B2Error::UploadFailed(format!("fetching {} returned {}", url, status)));
        }

        let data = response.bytes().await?;
        debug!(size = data.len(), "Fetched remote file");
        self.upload(data, &name, None, None).await
    }

    /// Fetch a fresh one-shot upload URL and token (`b2_get_upload_url`)
    async fn prepare_upload(&self) -> Result<UploadUrl> {
        let body = serde_json::json!({ "bucketId": self.id });
        self.session.post_json(http::GET_UPLOAD_URL, &body).await
    }

    // ==================== Settings ====================

    /// Change the bucket's access level.
    ///
    /// The stored type is taken from the server's reply, which is also returned.
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn set_type(&mut self, bucket_type: BucketType) -> Result<BucketType> {
        let body = serde_json::json!({
            "accountId": self.session.account_id(),
            "bucketId": self.id,
            "bucketType": bucket_type,
        });

        let payload: BucketPayload = self.session.post_json(http::UPDATE_BUCKET, &body).await?;
        if payload.bucket_type != bucket_type {
            warn!(requested = %bucket_type, stored = %payload.bucket_type, "Server kept a different bucket type");
        }

        self.bucket_type = payload.bucket_type;
        Ok(self.bucket_type)
    }

    // ==================== Listings ====================

    /// One page of file names (`b2_list_file_names`).
    ///
    /// Pass `next_file_name` back as `start_file_name` to continue. Each call is a
    /// class C transaction, billed per 1,000 files returned.
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn list_file_names(&self, request: &ListFileNamesRequest) -> Result<ListFileNamesResponse> {
        let body = WithBucket {
            bucket_id: &self.id,
            request,
        };

        let page: ListFileNamesResponse = self.session.post_json(http::LIST_FILE_NAMES, &body).await?;
        debug!(count = page.files.len(), next = ?page.next_file_name, "Listed file names");
        Ok(page)
    }

    /// One page of file versions, including hide markers (`b2_list_file_versions`)
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn list_file_versions(
        &self,
        request: &ListFileVersionsRequest,
    ) -> Result<ListFileVersionsResponse> {
        let body = WithBucket {
            bucket_id: &self.id,
            request,
        };

        self.session.post_json(http::LIST_FILE_VERSIONS, &body).await
    }

    /// Hide `file_name` in this bucket
    pub async fn hide_file(&self, file_name: &str) -> Result<HideFileResponse> {
        self.session.hide_file(file_name, self).await
    }
}

/// Listing request body: the bucket id plus the caller's options
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WithBucket<'a, R> {
    bucket_id: &'a str,
    #[serde(flatten)]
    request: &'a R,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(id: {}, type: {})", self.name, self.id, self.bucket_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(session: Session) -> Bucket {
        Bucket::from_payload(
            BucketPayload {
                bucket_id: "4a48fe8875c6214145260818".to_string(),
                bucket_name: "photos".to_string(),
                bucket_type: BucketType::AllPrivate,
            },
            session,
        )
    }

    #[test]
    fn test_display() {
        let bucket = bucket(Session::new("a", "k").unwrap());
        assert_eq!(
            bucket.to_string(),
            "photos(id: 4a48fe8875c6214145260818, type: allPrivate)"
        );
    }

    #[test]
    fn test_listing_body_includes_bucket_id() {
        let request = ListFileNamesRequest::new().with_max_file_count(10);
        let body = WithBucket {
            bucket_id: "b1",
            request: &request,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"bucketId": "b1", "maxFileCount": 10})
        );
    }

    #[tokio::test]
    async fn test_bucket_operations_fail_before_authorize() {
        let mut bucket = bucket(Session::new("a", "k").unwrap());

        assert!(matches!(
            bucket.upload(b"data".to_vec(), "x.txt", None, None).await,
            Err(B2Error::Unauthenticated)
        ));
        assert!(matches!(
            bucket.list_file_names(&ListFileNamesRequest::default()).await,
            Err(B2Error::Unauthenticated)
        ));
        assert!(matches!(
            bucket.set_type(BucketType::AllPublic).await,
            Err(B2Error::Unauthenticated)
        ));
        assert!(matches!(bucket.hide_file("x.txt").await, Err(B2Error::Unauthenticated)));
        assert_eq!(bucket.bucket_type(), BucketType::AllPrivate);
    }

    #[tokio::test]
    async fn test_directory_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = bucket(Session::new("a", "k").unwrap());

        let err = bucket.upload_file(dir.path(), None).await.unwrap_err();
        assert!(matches!(err, B2Error::UploadFailed(_)));
    }
}
