//! Account session: authorization state and account-level operations

use crate::{
    bucket::Bucket,
    http::{self, HEADER_CONTENT_SHA1, HEADER_FILE_ID, HEADER_FILE_NAME},
    types::*,
    B2Error, Config, Result,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use parking_lot::RwLock;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// `Authorization` header value for `b2_authorize_account`
pub fn basic_auth_header(account_id: &str, application_key: &str) -> String {
    let credentials = format!("{}:{}", account_id, application_key);
    format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
}

/// State produced by a successful `b2_authorize_account`
#[derive(Clone, Debug)]
struct Authorization {
    token: String,
    api_url: String,
    download_url: String,
    recommended_part_size: Option<u64>,
    absolute_minimum_part_size: Option<u64>,
    allowed: Option<Allowed>,
    authorized_at: Instant,
}

struct Inner {
    account_id: String,
    application_key: String,
    config: Config,
    http: Client,
    state: RwLock<Option<Authorization>>,
    // Held for the duration of a login so concurrent `authorize` calls share one round trip
    login: Mutex<()>,
}

/// A B2 account session.
///
/// Cloning is cheap and every clone shares the same authorization state, so
/// buckets obtained from a session keep it alive.
///
/// ```rust,ignore
/// use b2_client::Session;
///
/// let session = Session::new("accountId", "applicationKey")?;
/// session.authorize().await?;
///
/// let bucket = session.bucket_named("photos").await?.expect("bucket exists");
/// bucket.upload(b"hello".to_vec(), "hello.txt", None, None).await?;
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    /// Create a session against the public B2 authorization host
    pub fn new(account_id: impl Into<String>, application_key: impl Into<String>) -> Result<Self> {
        Self::with_config(account_id, application_key, Config::default())
    }

    /// Create a session with the given configuration
    pub fn with_config(
        account_id: impl Into<String>,
        application_key: impl Into<String>,
        config: Config,
    ) -> Result<Self> {
        url::Url::parse(&config.auth_url)
            .map_err(|e| B2Error::Config(format!("invalid auth_url {:?}: {}", config.auth_url, e)))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(B2Error::Http)?;

        Ok(Self {
            inner: Arc::new(Inner {
                account_id: account_id.into(),
                application_key: application_key.into(),
                config,
                http,
                state: RwLock::new(None),
                login: Mutex::new(()),
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Account id (or application key id) this session logs in with
    pub fn account_id(&self) -> &str {
        &self.inner.account_id
    }

    /// Whether an authorization token is cached
    pub fn is_authorized(&self) -> bool {
        self.inner.state.read().is_some()
    }

    /// Account-level token; valid for at most 24 hours
    pub fn authorization_token(&self) -> Option<String> {
        self.inner.state.read().as_ref().map(|s| s.token.clone())
    }

    /// Base URL for all API calls except uploads and downloads
    pub fn api_url(&self) -> Option<String> {
        self.inner.state.read().as_ref().map(|s| s.api_url.clone())
    }

    /// Base URL for downloads
    pub fn download_url(&self) -> Option<String> {
        self.inner.state.read().as_ref().map(|s| s.download_url.clone())
    }

    /// Part size B2 recommends for large files
    pub fn recommended_part_size(&self) -> Option<u64> {
        self.inner
            .state
            .read()
            .as_ref()
            .and_then(|s| s.recommended_part_size)
    }

    /// Smallest allowed part (except the last) of a large file
    pub fn absolute_minimum_part_size(&self) -> Option<u64> {
        self.inner
            .state
            .read()
            .as_ref()
            .and_then(|s| s.absolute_minimum_part_size)
    }

    /// Restrictions attached to the application key
    pub fn allowed(&self) -> Option<Allowed> {
        self.inner.state.read().as_ref().and_then(|s| s.allowed.clone())
    }

    // ==================== Authorization ====================

    /// Log in with the stored credentials (`b2_authorize_account`).
    ///
    /// A cached token younger than `Config::token_lifetime` is reused without a
    /// network call.
    #[instrument(skip(self), fields(account_id = %self.inner.account_id))]
    pub async fn authorize(&self) -> Result<()> {
        if self.has_fresh_token() {
            debug!("Reusing cached authorization");
            return Ok(());
        }

        let _login = self.inner.login.lock().await;
        // Another task may have finished logging in while we waited
        if self.has_fresh_token() {
            return Ok(());
        }

        self.login().await
    }

    /// Log in again even if the cached token is still fresh.
    ///
    /// The cached state is replaced only when the login succeeds.
    #[instrument(skip(self), fields(account_id = %self.inner.account_id))]
    pub async fn reauthorize(&self) -> Result<()> {
        let _login = self.inner.login.lock().await;
        self.login().await
    }

    /// Forget the cached token and URLs
    pub fn clear_authorization(&self) {
        *self.inner.state.write() = None;
    }

    fn has_fresh_token(&self) -> bool {
        self.inner
            .state
            .read()
            .as_ref()
            .is_some_and(|s| s.authorized_at.elapsed() < self.inner.config.token_lifetime)
    }

    async fn login(&self) -> Result<()> {
        let url = http::endpoint(&self.inner.config.auth_url, http::AUTHORIZE_ACCOUNT)?;
        let request = self.inner.http.get(url).header(
            header::AUTHORIZATION,
            basic_auth_header(&self.inner.account_id, &self.inner.application_key),
        );

        let body = http::execute(request).await?;
        let response: AuthorizeAccountResponse = http::decode(&body)?;

        for base in [&response.api_url, &response.download_url] {
            url::Url::parse(base)
                .map_err(|e| B2Error::MalformedResponse(format!("invalid base URL {}: {}", base, e)))?;
        }

        info!(api_url = %response.api_url, "Authorized B2 account");

        *self.inner.state.write() = Some(Authorization {
            token: response.authorization_token,
            api_url: response.api_url,
            download_url: response.download_url,
            recommended_part_size: response.recommended_part_size,
            absolute_minimum_part_size: response.absolute_minimum_part_size,
            allowed: response.allowed,
            authorized_at: Instant::now(),
        });

        Ok(())
    }

    // ==================== Bucket Operations ====================

    /// Create a private bucket
    pub async fn create_bucket(&self, name: &str) -> Result<Bucket> {
        self.create_bucket_with_type(name, BucketType::AllPrivate).await
    }

    /// Create a bucket with the given access level
    #[instrument(skip(self))]
    pub async fn create_bucket_with_type(&self, name: &str, bucket_type: BucketType) -> Result<Bucket> {
        let body = serde_json::json!({
            "accountId": self.inner.account_id,
            "bucketName": name,
            "bucketType": bucket_type,
        });

        let payload: BucketPayload = self.post_json(http::CREATE_BUCKET, &body).await?;
        info!(bucket_id = %payload.bucket_id, "Created bucket");
        Ok(Bucket::from_payload(payload, self.clone()))
    }

    /// List every bucket on the account
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        self.list_buckets_filtered(&ListBucketsRequest::default()).await
    }

    /// List buckets, letting the server filter by id or name
    #[instrument(skip(self))]
    pub async fn list_buckets_filtered(&self, filter: &ListBucketsRequest) -> Result<Vec<Bucket>> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            account_id: &'a str,
            #[serde(flatten)]
            filter: &'a ListBucketsRequest,
        }

        let body = Body {
            account_id: &self.inner.account_id,
            filter,
        };

        let list: BucketList = self.post_json(http::LIST_BUCKETS, &body).await?;
        debug!(count = list.buckets.len(), "Listed buckets");

        Ok(list
            .buckets
            .into_iter()
            .map(|payload| Bucket::from_payload(payload, self.clone()))
            .collect())
    }

    /// Find a bucket by exact name.
    ///
    /// Lists every bucket and scans the result; the first match wins.
    #[instrument(skip(self))]
    pub async fn bucket_named(&self, name: &str) -> Result<Option<Bucket>> {
        let buckets = self.list_buckets().await?;
        Ok(buckets.into_iter().find(|bucket| bucket.name() == name))
    }

    // ==================== File Operations ====================

    /// Download one file by id (`b2_download_file_by_id`)
    #[instrument(skip(self))]
    pub async fn download_file_by_id(&self, file_id: &str) -> Result<DownloadedFile> {
        let (token, download_url) = {
            let state = self.inner.state.read();
            let state = state.as_ref().ok_or(B2Error::Unauthenticated)?;
            (state.token.clone(), state.download_url.clone())
        };

        let url = http::endpoint(&download_url, http::DOWNLOAD_FILE_BY_ID)?;
        let request = self
            .inner
            .http
            .get(url)
            .query(&[("fileId", file_id)])
            .header(header::AUTHORIZATION, token);

        let response = http::execute_response(request).await?;

        let headers = response.headers();
        let text_header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };

        let file_id = text_header(HEADER_FILE_ID);
        let file_name = text_header(HEADER_FILE_NAME)
            .map(|encoded| http::decode_file_name(&encoded))
            .transpose()?;
        let content_type = text_header(header::CONTENT_TYPE.as_str());
        let content_sha1 = text_header(HEADER_CONTENT_SHA1);

        let data = response.bytes().await?;

        Ok(DownloadedFile {
            content_length: data.len() as u64,
            data,
            file_id,
            file_name,
            content_type,
            content_sha1,
        })
    }

    /// Hide a file so that name-based listings and downloads skip it.
    ///
    /// Earlier versions stay stored.
    #[instrument(skip(self, bucket), fields(bucket = %bucket.name()))]
    pub async fn hide_file(&self, file_name: &str, bucket: &Bucket) -> Result<HideFileResponse> {
        let body = serde_json::json!({
            "bucketId": bucket.id(),
            "fileName": file_name,
        });

        self.post_json(http::HIDE_FILE, &body).await
    }

    /// Fetch metadata for one file version
    #[instrument(skip(self))]
    pub async fn get_file_info(&self, file_id: &str) -> Result<FileInfo> {
        let body = serde_json::json!({ "fileId": file_id });
        self.post_json(http::GET_FILE_INFO, &body).await
    }

    /// Permanently delete one file version
    #[instrument(skip(self))]
    pub async fn delete_file_version(
        &self,
        file_name: &str,
        file_id: &str,
    ) -> Result<DeleteFileVersionResponse> {
        let body = serde_json::json!({
            "fileName": file_name,
            "fileId": file_id,
        });

        self.post_json(http::DELETE_FILE_VERSION, &body).await
    }

    // ==================== Helper Methods ====================

    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Token and API base URL, or `Unauthenticated` before `authorize`
    pub(crate) fn api_credentials(&self) -> Result<(String, String)> {
        let state = self.inner.state.read();
        let state = state.as_ref().ok_or(B2Error::Unauthenticated)?;
        Ok((state.token.clone(), state.api_url.clone()))
    }

    /// POST a JSON body to an API endpoint with the account token and decode the reply
    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (token, api_url) = self.api_credentials()?;
        let url = http::endpoint(&api_url, path)?;

        let request = self
            .inner
            .http
            .post(url)
            .header(header::AUTHORIZATION, token)
            .json(body);

        let body = http::execute(request).await?;
        http::decode(&body)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account_id", &self.inner.account_id)
            .field("authorized", &self.is_authorized())
            .finish_non_exhaustive()
    }
}
