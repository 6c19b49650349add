//! Content fingerprint - SHA-256 of the raw UTF-8 bytes / 内容指纹
//!
//! Used as the external id and dedup key. Uniqueness is enforced by storage.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex length of a SHA-256 digest / SHA-256 十六进制长度
pub const FINGERPRINT_LEN: usize = 64;

/// Lowercase hex SHA-256 digest / 小写十六进制摘要
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Accept a stored digest if it is 64 lowercase hex characters / 校验已存储的摘要
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == FINGERPRINT_LEN
            && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the fingerprint of a string / 计算字符串指纹
pub fn fingerprint(value: &str) -> Fingerprint {
    Fingerprint(hex::encode(Sha256::digest(value.as_bytes())))
}
