//! content
//!
//! Staged file content and its blob wire encoding.
//!
//! Text content travels to the object store as-is with a `utf-8` encoding
//! marker. Binary content is base64-encoded and marked `base64`; the store
//! decodes it back to the original bytes when materializing the blob.
//!
//! # Example
//!
//! ```
//! use gitmason::content::{BlobEncoding, FileContent};
//!
//! let text = FileContent::from("hello\n");
//! assert_eq!(text.payload().encoding, BlobEncoding::Utf8);
//!
//! let binary = FileContent::from(vec![0u8, 159, 146, 150]);
//! let payload = binary.payload();
//! assert_eq!(payload.encoding, BlobEncoding::Base64);
//! assert_eq!(payload.content, "AJ+Slg==");
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Content staged for a single file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Textual content, submitted verbatim.
    Text(String),
    /// Binary content, base64-encoded on the wire.
    Binary(Vec<u8>),
}

impl FileContent {
    /// Encode the content into its blob creation payload.
    pub fn payload(&self) -> BlobPayload {
        match self {
            FileContent::Text(text) => BlobPayload {
                content: text.clone(),
                encoding: BlobEncoding::Utf8,
            },
            FileContent::Binary(bytes) => BlobPayload {
                content: BASE64.encode(bytes),
                encoding: BlobEncoding::Base64,
            },
        }
    }
}

impl Default for FileContent {
    /// Empty text content, for staging a file with no body.
    fn default() -> Self {
        FileContent::Text(String::new())
    }
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        FileContent::Text(text.to_string())
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        FileContent::Text(text)
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(bytes: Vec<u8>) -> Self {
        FileContent::Binary(bytes)
    }
}

impl From<&[u8]> for FileContent {
    fn from(bytes: &[u8]) -> Self {
        FileContent::Binary(bytes.to_vec())
    }
}

/// Wire payload for a blob creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPayload {
    /// Content string, base64-encoded for binary blobs.
    pub content: String,
    /// Encoding marker the store uses to interpret `content`.
    pub encoding: BlobEncoding,
}

/// Blob content encoding marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobEncoding {
    /// Plain UTF-8 text.
    Utf8,
    /// Base64-encoded bytes.
    Base64,
}

impl BlobEncoding {
    /// The marker string the object store expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobEncoding::Utf8 => "utf-8",
            BlobEncoding::Base64 => "base64",
        }
    }
}
