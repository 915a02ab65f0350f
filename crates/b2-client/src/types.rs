//! Request and response shapes for the B2 JSON API

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ==================== Buckets ====================

/// Access level of a bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BucketType {
    AllPublic,
    AllPrivate,
    Share,
    Snapshot,
}

impl BucketType {
    /// The string B2 uses on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllPublic => "allPublic",
            Self::AllPrivate => "allPrivate",
            Self::Share => "share",
            Self::Snapshot => "snapshot",
        }
    }

    /// Interpret an API string; anything unrecognized is treated as `allPublic`
    pub fn interpret(value: &str) -> Self {
        value.parse().unwrap_or(Self::AllPublic)
    }
}

// Decoding is lenient; `FromStr` stays strict for user input
impl<'de> Deserialize<'de> for BucketType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::interpret(&value))
    }
}

impl FromStr for BucketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allPublic" => Ok(Self::AllPublic),
            "allPrivate" => Ok(Self::AllPrivate),
            "share" => Ok(Self::Share),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(format!("unknown bucket type: {}", other)),
        }
    }
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket record as returned by create/list/update bucket calls
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BucketPayload {
    pub bucket_id: String,
    pub bucket_name: String,
    pub bucket_type: BucketType,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BucketList {
    pub buckets: Vec<BucketPayload>,
}

/// Optional server-side filters for `list_buckets_filtered`
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBucketsRequest {
    /// Only return the bucket with this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<String>,
    /// Only return the bucket with this name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
}

// ==================== Authorization ====================

/// A capability granted to the application key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum KeyCapability {
    ListKeys,
    WriteKeys,
    DeleteKeys,
    ListBuckets,
    WriteBuckets,
    DeleteBuckets,
    ListFiles,
    ReadFiles,
    ShareFiles,
    WriteFiles,
    DeleteFiles,
    /// A capability this client does not know about
    Unknown,
}

impl From<String> for KeyCapability {
    fn from(value: String) -> Self {
        match value.as_str() {
            "listKeys" => Self::ListKeys,
            "writeKeys" => Self::WriteKeys,
            "deleteKeys" => Self::DeleteKeys,
            "listBuckets" => Self::ListBuckets,
            "writeBuckets" => Self::WriteBuckets,
            "deleteBuckets" => Self::DeleteBuckets,
            "listFiles" => Self::ListFiles,
            "readFiles" => Self::ReadFiles,
            "shareFiles" => Self::ShareFiles,
            "writeFiles" => Self::WriteFiles,
            "deleteFiles" => Self::DeleteFiles,
            _ => Self::Unknown,
        }
    }
}

/// What the application key is allowed to do
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allowed {
    #[serde(default)]
    pub capabilities: Vec<KeyCapability>,
    /// Set when the key is restricted to one bucket
    pub bucket_id: Option<String>,
    pub bucket_name: Option<String>,
    /// Set when the key is restricted to names starting with this prefix
    pub name_prefix: Option<String>,
}

impl Allowed {
    /// Check whether a capability was granted
    pub fn has(&self, capability: KeyCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthorizeAccountResponse {
    pub authorization_token: String,
    pub api_url: String,
    pub download_url: String,
    pub recommended_part_size: Option<u64>,
    pub absolute_minimum_part_size: Option<u64>,
    pub allowed: Option<Allowed>,
}

// ==================== Files ====================

/// Kind of a stored file version
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum FileAction {
    /// A large file was started but not finished or canceled
    Start,
    /// A file uploaded to B2
    Upload,
    /// A marker hiding the file from name listings
    Hide,
    /// A virtual folder produced by a delimiter listing
    Folder,
    Unknown,
}

impl From<String> for FileAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "start" => Self::Start,
            "upload" => Self::Upload,
            "hide" => Self::Hide,
            "folder" => Self::Folder,
            _ => Self::Unknown,
        }
    }
}

/// One stored file version, as returned by listings and `b2_get_file_info`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// The account that owns the file
    pub account_id: Option<String>,
    pub action: FileAction,
    /// The bucket that the file is in
    pub bucket_id: Option<String>,
    /// Bytes stored; always 0 for `start`, `hide` and `folder`
    #[serde(default)]
    pub content_length: u64,
    /// 40-digit hex SHA-1; `none` for large files, absent for `hide` and `folder`
    pub content_sha1: Option<String>,
    pub content_md5: Option<String>,
    /// `application/x-bz-hide-marker` for hide markers, absent for folders
    pub content_type: Option<String>,
    /// Absent for folders
    pub file_id: Option<String>,
    #[serde(default)]
    pub file_info: HashMap<String, String>,
    pub file_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub upload_timestamp: DateTime<Utc>,
}

/// Options for `b2_list_file_names`; absent fields are left to server defaults
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileNamesRequest {
    /// First file name to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_file_name: Option<String>,
    /// Server default is 100, maximum 10,000 (billed per 1,000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Character used to break file names into folders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

impl ListFileNamesRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from a previous page's `next_file_name`
    pub fn starting_at(mut self, file_name: impl Into<String>) -> Self {
        self.start_file_name = Some(file_name.into());
        self
    }

    /// Limit the page size
    pub fn with_max_file_count(mut self, count: u32) -> Self {
        self.max_file_count = Some(count);
        self
    }

    /// Filter by prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Group names into folders
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }
}

/// One page of `b2_list_file_names`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileNamesResponse {
    pub files: Vec<FileInfo>,
    /// Pass as `start_file_name` to fetch the next page; `None` when done.
    /// It may not name an actual file.
    pub next_file_name: Option<String>,
}

/// Options for `b2_list_file_versions`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileVersionsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_file_name: Option<String>,
    /// Only valid together with `start_file_name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

/// One page of `b2_list_file_versions`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileVersionsResponse {
    pub files: Vec<FileInfo>,
    pub next_file_name: Option<String>,
    pub next_file_id: Option<String>,
}

/// Result of `b2_upload_file`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    pub file_id: String,
    pub file_name: String,
    pub account_id: String,
    pub bucket_id: String,
    #[serde(default)]
    pub content_length: u64,
    pub content_sha1: String,
    pub content_md5: Option<String>,
    pub content_type: String,
    #[serde(default)]
    pub file_info: HashMap<String, String>,
    pub action: FileAction,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub upload_timestamp: DateTime<Utc>,
}

/// Result of `b2_hide_file`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideFileResponse {
    pub file_id: String,
    pub file_name: String,
    pub action: FileAction,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub upload_timestamp: DateTime<Utc>,
}

/// Result of `b2_delete_file_version`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileVersionResponse {
    pub file_id: String,
    pub file_name: String,
}

/// A downloaded file body with the metadata B2 sends in headers
#[derive(Clone, Debug)]
pub struct DownloadedFile {
    /// File contents
    pub data: Bytes,
    pub file_id: Option<String>,
    /// Decoded from `X-Bz-File-Name`
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content_sha1: Option<String>,
    pub content_length: u64,
}

/// One-shot upload target returned by `b2_get_upload_url`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadUrl {
    pub upload_url: String,
    pub authorization_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bucket_type_is_public() {
        let payload: BucketPayload = serde_json::from_str(
            r#"{"bucketId": "b1", "bucketName": "photos", "bucketType": "restricted"}"#,
        )
        .unwrap();
        assert_eq!(payload.bucket_type, BucketType::AllPublic);
        assert_eq!(BucketType::interpret("allPrivate"), BucketType::AllPrivate);
    }

    #[test]
    fn test_bucket_type_wire_names() {
        assert_eq!(serde_json::to_string(&BucketType::AllPrivate).unwrap(), "\"allPrivate\"");
        assert_eq!(serde_json::to_string(&BucketType::Snapshot).unwrap(), "\"snapshot\"");
        assert!("public".parse::<BucketType>().is_err());
    }

    #[test]
    fn test_bucket_type_parse_is_strict() {
        assert_eq!("share".parse::<BucketType>().unwrap(), BucketType::Share);
        assert!("allPrivat".parse::<BucketType>().is_err());
        assert!("AllPrivate".parse::<BucketType>().is_err());

        let decoded: BucketType = serde_json::from_str("\"allPrivat\"").unwrap();
        assert_eq!(decoded, BucketType::AllPublic);
    }

    #[test]
    fn test_empty_list_file_names_request() {
        let json = serde_json::to_value(ListFileNamesRequest::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));

        let json = serde_json::to_value(
            ListFileNamesRequest::new().with_prefix("photos/").with_delimiter("/"),
        )
        .unwrap();
        assert_eq!(json, serde_json::json!({"prefix": "photos/", "delimiter": "/"}));
    }

    #[test]
    fn test_decode_list_file_names() {
        let body = r#"{
            "files": [
                {
                    "action": "upload",
                    "contentLength": 6,
                    "contentSha1": "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3",
                    "contentType": "text/plain",
                    "fileId": "4_z27c88f1d182b150646ff0b16_f1004ba650fe24e6b_d20150809_m012853_c100_v0009990_t0000",
                    "fileInfo": {"src_last_modified_millis": "1439083933000"},
                    "fileName": "files/hello.txt",
                    "uploadTimestamp": 1439083733000
                },
                {
                    "action": "folder",
                    "contentLength": 0,
                    "fileName": "files/nested/",
                    "uploadTimestamp": 0
                }
            ]
        }"#;

        let page: ListFileNamesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.files.len(), 2);
        assert!(page.next_file_name.is_none());

        let first = &page.files[0];
        assert_eq!(first.action, FileAction::Upload);
        assert_eq!(first.content_length, 6);
        assert_eq!(first.upload_timestamp.timestamp_millis(), 1_439_083_733_000);
        assert_eq!(first.file_info.len(), 1);

        let folder = &page.files[1];
        assert_eq!(folder.action, FileAction::Folder);
        assert!(folder.file_id.is_none());
        assert!(folder.content_sha1.is_none());
    }

    #[test]
    fn test_decode_capabilities() {
        let allowed: Allowed = serde_json::from_str(
            r#"{"capabilities": ["listBuckets", "writeFiles", "readBucketEncryption"], "bucketId": null}"#,
        )
        .unwrap();

        assert!(allowed.has(KeyCapability::ListBuckets));
        assert!(allowed.has(KeyCapability::WriteFiles));
        assert!(allowed.has(KeyCapability::Unknown));
        assert!(!allowed.has(KeyCapability::DeleteFiles));
    }
}
