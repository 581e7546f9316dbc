//! types
//!
//! Strong types for remote object-store identifiers.
//!
//! # Types
//!
//! - [`RepoId`] - Repository coordinates parsed once from `owner/name`
//! - [`Oid`] - Git object identifier (SHA)
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so every later layer can assume well-formed
//! identifiers.
//!
//! # Examples
//!
//! ```
//! use gitmason::types::{Oid, RepoId};
//!
//! let repo = RepoId::parse("octocat/hello-world").unwrap();
//! assert_eq!(repo.owner(), "octocat");
//! assert_eq!(repo.name(), "hello-world");
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(oid.as_str().len(), 40);
//!
//! assert!(RepoId::parse("no-slash").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository identifier: {0}")]
    InvalidRepoId(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// Repository coordinates: owner and name.
///
/// Derived once from a combined `owner/name` identifier and never mutated;
/// both halves prefix every remote call.
///
/// # Example
///
/// ```
/// use gitmason::types::RepoId;
///
/// let repo = RepoId::parse("octocat/hello-world").unwrap();
/// assert_eq!(repo.to_string(), "octocat/hello-world");
///
/// // Exactly one separator, both halves non-empty
/// assert!(RepoId::parse("octocat").is_err());
/// assert!(RepoId::parse("octocat/").is_err());
/// assert!(RepoId::parse("a/b/c").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Parse an `owner/name` identifier.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepoId` unless the input is exactly
    /// `owner/name` with both halves non-empty and free of whitespace.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let mut parts = input.splitn(2, '/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().ok_or_else(|| {
            TypeError::InvalidRepoId(format!("expected owner/name, got '{input}'"))
        })?;

        if owner.is_empty() || name.is_empty() {
            return Err(TypeError::InvalidRepoId(format!(
                "expected owner/name, got '{input}'"
            )));
        }
        if name.contains('/') {
            return Err(TypeError::InvalidRepoId(format!(
                "expected a single separator, got '{input}'"
            )));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidRepoId(format!(
                "identifier cannot contain whitespace: '{input}'"
            )));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Repository owner (user or organization).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A validated Git object identifier.
///
/// Accepts 40-hex (SHA-1) or 64-hex (SHA-256) ids, normalized to lowercase.
///
/// # Example
///
/// ```
/// use gitmason::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890abc123def4567890abc12345").unwrap();
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id, normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40- or
    /// 64-character hex id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters of the id (the full id if shorter).
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repo_id {
        use super::*;

        #[test]
        fn parses_owner_and_name() {
            let repo = RepoId::parse("octocat/hello-world").unwrap();
            assert_eq!(repo.owner(), "octocat");
            assert_eq!(repo.name(), "hello-world");
        }

        #[test]
        fn display_round_trips() {
            let repo = RepoId::parse("my-org/my.repo").unwrap();
            assert_eq!(repo.to_string(), "my-org/my.repo");
        }

        #[test]
        fn rejects_missing_separator() {
            assert!(RepoId::parse("octocat").is_err());
            assert!(RepoId::parse("").is_err());
        }

        #[test]
        fn rejects_empty_halves() {
            assert!(RepoId::parse("/repo").is_err());
            assert!(RepoId::parse("owner/").is_err());
            assert!(RepoId::parse("/").is_err());
        }

        #[test]
        fn rejects_extra_segments() {
            assert!(RepoId::parse("a/b/c").is_err());
        }

        #[test]
        fn rejects_whitespace() {
            assert!(RepoId::parse("owner /repo").is_err());
            assert!(RepoId::parse("owner/re po").is_err());
        }
    }

    mod oid {
        use super::*;

        const SHA1: &str = "abc123def4567890abc123def4567890abc12345";

        #[test]
        fn accepts_sha1_length() {
            let oid = Oid::new(SHA1).unwrap();
            assert_eq!(oid.as_str(), SHA1);
        }

        #[test]
        fn accepts_sha256_length() {
            let sha256 = "a".repeat(64);
            assert!(Oid::new(sha256).is_ok());
        }

        #[test]
        fn normalizes_to_lowercase() {
            let oid = Oid::new(SHA1.to_ascii_uppercase()).unwrap();
            assert_eq!(oid.as_str(), SHA1);
        }

        #[test]
        fn rejects_wrong_length() {
            assert!(Oid::new("abc123").is_err());
            assert!(Oid::new("a".repeat(41)).is_err());
        }

        #[test]
        fn rejects_non_hex() {
            assert!(Oid::new("z".repeat(40)).is_err());
        }

        #[test]
        fn short_truncates() {
            let oid = Oid::new(SHA1).unwrap();
            assert_eq!(oid.short(7), "abc123d");
            assert_eq!(oid.short(100), SHA1);
        }

        #[test]
        fn serde_round_trip() {
            let oid = Oid::new(SHA1).unwrap();
            let json = serde_json::to_string(&oid).unwrap();
            assert_eq!(json, format!("\"{SHA1}\""));
            let back: Oid = serde_json::from_str(&json).unwrap();
            assert_eq!(back, oid);
        }
    }
}
