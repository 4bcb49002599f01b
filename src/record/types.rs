//! RECORD file types and hashing for Python wheels

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::Digest;
use sha2::Sha256;

use crate::config::DigestEncoding;
use crate::error::RecordError;

/// Single entry in RECORD file
#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub path: String,
    pub hash: Option<String>,
    pub size: Option<u64>,
}

/// Complete RECORD file
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub entries: Vec<RecordEntry>,
}

impl Record {
    /// Parse RECORD from CSV content
    pub fn parse(content: &str) -> Result<Self, RecordError> {
        let mut entries = Vec::new();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        for result in reader.records() {
            let record = result.map_err(|e| RecordError::InvalidCsv(e.to_string()))?;

            let path = record.get(0).unwrap_or("").to_string();
            if path.is_empty() {
                continue;
            }

            let hash = record
                .get(1)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());

            let size = record
                .get(2)
                .filter(|s| !s.is_empty())
                .and_then(|s| s.parse().ok());

            entries.push(RecordEntry { path, hash, size });
        }

        Ok(Record { entries })
    }

    /// Find entry by path
    pub fn find(&self, path: &str) -> Option<&RecordEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}

/// Compute SHA256 hash in RECORD format: sha256=<base64>
pub fn hash_content(content: &[u8], encoding: DigestEncoding) -> String {
    let digest = Sha256::digest(content);
    let encoded = match encoding {
        DigestEncoding::Standard => STANDARD.encode(digest),
        DigestEncoding::UrlSafeNoPad => URL_SAFE_NO_PAD.encode(digest),
    };
    format!("sha256={}", encoded)
}

/// Check a `sha256=` digest against content.
///
/// Both base64 alphabets are accepted, with or without padding, so RECORDs
/// written by the fork and by ordinary wheel builders validate the same way.
pub fn verify_digest(hash: &str, content: &[u8]) -> Result<bool, RecordError> {
    let encoded = hash
        .strip_prefix("sha256=")
        .ok_or_else(|| RecordError::InvalidDigest(hash.to_string()))?
        .trim_end_matches('=');

    let expected = STANDARD_NO_PAD
        .decode(encoded)
        .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
        .map_err(|e| RecordError::InvalidDigest(format!("{}: {}", hash, e)))?;

    Ok(expected.as_slice() == Sha256::digest(content).as_slice())
}
