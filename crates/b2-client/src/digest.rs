//! Content digests for the upload pipeline
//!
//! B2 verifies every upload against the `X-Bz-Content-Sha1` header, so the
//! digest is computed over the whole buffer before the request is sent.

use sha1::{Digest, Sha1};

/// Length of a hex-encoded SHA-1 digest
pub const SHA1_HEX_LEN: usize = 40;

/// SHA-1 of `data` as 40 lowercase hex characters
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Check that a caller-supplied digest looks like a hex SHA-1
pub fn is_sha1_hex(s: &str) -> bool {
    s.len() == SHA1_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
