//! store::traits
//!
//! Object-store capability trait for remote git-data operations.
//!
//! # Design
//!
//! The `ObjectStore` trait is async because every operation involves
//! network I/O. It covers exactly the mutations the commit builder needs:
//! repository metadata, reference reads, and blob/tree/commit/reference
//! creation. Transport policy (retries, timeouts, rate-limit handling)
//! is deliberately out of scope; failures surface as [`StoreError`] and
//! bubble unrecovered to whoever observes the builder's queue.
//!
//! Errors are `Clone` so the queue can hold its first failure as a sticky
//! terminal state and hand a copy to every completion observer.

use async_trait::async_trait;
use thiserror::Error;

use crate::content::BlobPayload;
use crate::types::Oid;

/// Errors from object-store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Repository metadata relevant to branch resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Name of the repository's default branch.
    pub default_branch: String,
}

/// One new entry in a tree creation call.
///
/// Mode (`100644`, regular file) and type (`blob`) are fixed at the wire
/// layer; the builder only ever writes plain files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// File path relative to the repository root.
    pub path: String,
    /// Blob object id backing the path.
    pub sha: Oid,
}

/// The object-store capability the commit builder runs against.
///
/// Implementations must be `Send + Sync` so the builder's driver task can
/// hold them across await points.
///
/// # Reference paths
///
/// `get_reference` and `update_reference` take the short form
/// (`heads/<branch>`); `create_reference` takes the full form
/// (`refs/heads/<branch>`), mirroring the remote API's asymmetry.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store name (e.g., "github", "mock").
    fn name(&self) -> &'static str;

    /// Fetch repository metadata (default branch).
    async fn get_repository(&self) -> Result<RepositoryInfo, StoreError>;

    /// Read the object id a reference currently points at.
    async fn get_reference(&self, ref_path: &str) -> Result<Oid, StoreError>;

    /// Create a blob from an encoded payload, returning its object id.
    async fn create_blob(&self, payload: BlobPayload) -> Result<Oid, StoreError>;

    /// Create a tree layering `entries` over `base` (a commit or tree id).
    ///
    /// Paths not named in `entries` are inherited unchanged from the base.
    async fn create_tree(&self, entries: Vec<TreeEntry>, base: &Oid) -> Result<Oid, StoreError>;

    /// Create a commit object wrapping `tree` with the given parents.
    async fn create_commit(
        &self,
        tree: &Oid,
        parents: &[Oid],
        message: &str,
    ) -> Result<Oid, StoreError>;

    /// Create a new reference at `full_ref` (e.g. `refs/heads/feat`).
    async fn create_reference(&self, full_ref: &str, sha: &Oid) -> Result<(), StoreError>;

    /// Point an existing reference at `sha` (non-forced update).
    async fn update_reference(&self, ref_path: &str, sha: &Oid) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        assert_eq!(
            format!("{}", StoreError::AuthFailed("expired token".into())),
            "authentication failed: expired token"
        );
        assert_eq!(
            format!("{}", StoreError::NotFound("heads/missing".into())),
            "not found: heads/missing"
        );
        assert_eq!(format!("{}", StoreError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                StoreError::ApiError {
                    status: 422,
                    message: "Reference already exists".into()
                }
            ),
            "API error: 422 - Reference already exists"
        );
        assert_eq!(
            format!("{}", StoreError::NetworkError("connection refused".into())),
            "network error: connection refused"
        );
    }
}
