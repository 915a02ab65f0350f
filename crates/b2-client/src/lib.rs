//! # B2 Client
//!
//! An async client for the Backblaze B2 cloud storage REST API.
//!
//! ## Features
//!
//! - **Session lifecycle**: log in once, reuse the cached token and base URLs
//! - **Buckets**: create, list, look up by name, change access level
//! - **Files**: upload with SHA-1 verification, download, list names and versions, hide, delete
//!
//! ## Example
//!
//! ```rust,ignore
//! use b2_client::{ListFileNamesRequest, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = Session::new("accountId", "applicationKey")?;
//!     session.authorize().await?;
//!
//!     // Create a bucket
//!     let bucket = session.create_bucket("my-bucket").await?;
//!
//!     // Upload a file
//!     let uploaded = bucket.upload(b"Hello, World!".to_vec(), "hello.txt", Some("text/plain"), None).await?;
//!
//!     // List it back
//!     let page = bucket.list_file_names(&ListFileNamesRequest::new().with_prefix("hello")).await?;
//!     println!("{} files", page.files.len());
//!
//!     // Download it
//!     let file = session.download_file_by_id(&uploaded.file_id).await?;
//!     println!("Content: {}", String::from_utf8_lossy(&file.data));
//!
//!     Ok(())
//! }
//! ```

mod bucket;
mod config;
pub mod digest;
mod error;
pub mod http;
mod session;
mod types;

pub use bucket::Bucket;
pub use config::{Config, DEFAULT_AUTH_URL};
pub use error::{B2Error, Result};
pub use session::{basic_auth_header, Session};
pub use types::*;
