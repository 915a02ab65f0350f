//! Shared mock-server fixtures for the integration tests

#![allow(dead_code)]

use b2_client::{Bucket, Config, Session};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCOUNT_ID: &str = "a";
pub const APPLICATION_KEY: &str = "k";
pub const TOKEN: &str = "tok";
pub const BUCKET_ID: &str = "4a48fe8875c6214145260818";

pub const AUTHORIZE_PATH: &str = "/b2api/v1/b2_authorize_account";
pub const CREATE_BUCKET_PATH: &str = "/b2api/v1/b2_create_bucket";
pub const LIST_BUCKETS_PATH: &str = "/b2api/v2/b2_list_buckets";
pub const UPDATE_BUCKET_PATH: &str = "/b2api/v1/b2_update_bucket";
pub const GET_UPLOAD_URL_PATH: &str = "/b2api/v1/b2_get_upload_url";
pub const LIST_FILE_NAMES_PATH: &str = "/b2api/v1/b2_list_file_names";
pub const LIST_FILE_VERSIONS_PATH: &str = "/b2api/v1/b2_list_file_versions";
pub const HIDE_FILE_PATH: &str = "/b2api/v1/b2_hide_file";
pub const GET_FILE_INFO_PATH: &str = "/b2api/v1/b2_get_file_info";
pub const DELETE_FILE_VERSION_PATH: &str = "/b2api/v1/b2_delete_file_version";
pub const DOWNLOAD_BY_ID_PATH: &str = "/b2api/v1/b2_download_file_by_id";
pub const UPLOAD_PATH: &str = "/b2api/v1/b2_upload_file/4a48fe8875c6214145260818/c001_v0001007_t0042";

/// `b2_authorize_account` reply whose API and download URLs point at `base`
pub fn authorize_body(base: &str) -> Value {
    json!({
        "accountId": ACCOUNT_ID,
        "authorizationToken": TOKEN,
        "apiUrl": base,
        "downloadUrl": base,
        "recommendedPartSize": 100000000,
        "absoluteMinimumPartSize": 5000000,
        "allowed": {
            "capabilities": ["listBuckets", "writeBuckets", "listFiles", "readFiles", "writeFiles"],
            "bucketId": null,
            "bucketName": null,
            "namePrefix": null
        }
    })
}

pub fn bucket_body(id: &str, name: &str, bucket_type: &str) -> Value {
    json!({
        "accountId": ACCOUNT_ID,
        "bucketId": id,
        "bucketName": name,
        "bucketType": bucket_type,
        "bucketInfo": {},
        "revision": 1
    })
}

pub fn session_for(server: &MockServer) -> Session {
    Session::with_config(ACCOUNT_ID, APPLICATION_KEY, Config::new(server.uri())).unwrap()
}

/// Mount the authorization stub and return an authorized session
pub async fn authorized_session(server: &MockServer) -> Session {
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(authorize_body(&server.uri())))
        .mount(server)
        .await;

    let session = session_for(server);
    session.authorize().await.unwrap();
    session
}

/// Authorized session plus a bucket obtained through `b2_create_bucket`
pub async fn bucket_on(server: &MockServer) -> Bucket {
    let session = authorized_session(server).await;

    Mock::given(method("POST"))
        .and(path(CREATE_BUCKET_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(bucket_body(BUCKET_ID, "photos", "allPrivate")),
        )
        .mount(server)
        .await;

    session.create_bucket("photos").await.unwrap()
}
