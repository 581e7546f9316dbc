//! store::mock
//!
//! Mock object store for deterministic testing.
//!
//! # Design
//!
//! The mock store keeps references and created objects in memory, derives
//! object ids from content hashes, records every operation for later
//! verification, and allows configuring one failure scenario via [`FailOn`].
//!
//! # Example
//!
//! ```
//! use gitmason::content::FileContent;
//! use gitmason::store::mock::MockStore;
//! use gitmason::store::ObjectStore;
//!
//! # tokio_test::block_on(async {
//! let store = MockStore::new();
//!
//! let info = store.get_repository().await.unwrap();
//! assert_eq!(info.default_branch, "main");
//!
//! let head = store.get_reference("heads/main").await.unwrap();
//! let blob = store
//!     .create_blob(FileContent::from("hello").payload())
//!     .await
//!     .unwrap();
//! assert_ne!(blob, head);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::traits::{ObjectStore, RepositoryInfo, StoreError, TreeEntry};
use crate::content::{BlobEncoding, BlobPayload};
use crate::types::Oid;

/// Mock object store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockStoreInner {
    /// Default branch reported by repository metadata.
    default_branch: String,
    /// References by short path (`heads/<branch>`).
    refs: HashMap<String, Oid>,
    /// Sequence counter so derived ids never collide.
    seq: u64,
    /// Operation to fail (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<StoreOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail get_repository with the given error.
    GetRepository(StoreError),
    /// Fail get_reference with the given error.
    GetReference(StoreError),
    /// Fail create_blob with the given error.
    CreateBlob(StoreError),
    /// Fail create_tree with the given error.
    CreateTree(StoreError),
    /// Fail create_commit with the given error.
    CreateCommit(StoreError),
    /// Fail create_reference with the given error.
    CreateReference(StoreError),
    /// Fail update_reference with the given error.
    UpdateReference(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    GetRepository,
    GetReference {
        ref_path: String,
    },
    CreateBlob {
        content: String,
        encoding: BlobEncoding,
    },
    CreateTree {
        entries: Vec<TreeEntry>,
        base: Oid,
    },
    CreateCommit {
        tree: Oid,
        parents: Vec<Oid>,
        message: String,
    },
    CreateReference {
        full_ref: String,
        sha: Oid,
    },
    UpdateReference {
        ref_path: String,
        sha: Oid,
    },
}

impl MockStore {
    /// Create a mock store with default branch `main` pointing at a
    /// deterministic head commit.
    pub fn new() -> Self {
        Self::with_default_branch("main")
    }

    /// Create a mock store with the given default branch.
    pub fn with_default_branch(branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let head = derive_oid(&format!("head:{}", branch));
        let mut refs = HashMap::new();
        refs.insert(format!("heads/{}", branch), head);

        Self {
            inner: Arc::new(Mutex::new(MockStoreInner {
                default_branch: branch,
                refs,
                seq: 0,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Configure one operation to fail.
    pub fn fail_on(&self, fail: FailOn) {
        self.inner.lock().unwrap().fail_on = Some(fail);
    }

    /// Point a reference at an object id (seeding test fixtures).
    pub fn set_ref(&self, ref_path: impl Into<String>, sha: Oid) {
        self.inner.lock().unwrap().refs.insert(ref_path.into(), sha);
    }

    /// Current target of a reference, if it exists.
    pub fn ref_sha(&self, ref_path: &str) -> Option<Oid> {
        self.inner.lock().unwrap().refs.get(ref_path).cloned()
    }

    /// Snapshot of all recorded operations, in call order.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Recorded operations filtered by a predicate.
    pub fn operations_matching(
        &self,
        pred: impl Fn(&StoreOperation) -> bool,
    ) -> Vec<StoreOperation> {
        self.operations().into_iter().filter(|op| pred(op)).collect()
    }

    /// Derive a fresh object id from `input`, unique per call.
    fn next_oid(inner: &mut MockStoreInner, input: &str) -> Oid {
        inner.seq += 1;
        derive_oid(&format!("{}:{}", inner.seq, input))
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash `input` into a 40-hex object id.
fn derive_oid(input: &str) -> Oid {
    let digest = Sha256::digest(input.as_bytes());
    let hex = hex::encode(digest);
    Oid::new(&hex[..40]).expect("sha256 hex prefix is a valid oid")
}

#[async_trait]
impl ObjectStore for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_repository(&self) -> Result<RepositoryInfo, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::GetRepository);

        if let Some(FailOn::GetRepository(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        Ok(RepositoryInfo {
            default_branch: inner.default_branch.clone(),
        })
    }

    async fn get_reference(&self, ref_path: &str) -> Result<Oid, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::GetReference {
            ref_path: ref_path.to_string(),
        });

        if let Some(FailOn::GetReference(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        inner
            .refs
            .get(ref_path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(ref_path.to_string()))
    }

    async fn create_blob(&self, payload: BlobPayload) -> Result<Oid, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::CreateBlob {
            content: payload.content.clone(),
            encoding: payload.encoding,
        });

        if let Some(FailOn::CreateBlob(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        Ok(Self::next_oid(&mut inner, &payload.content))
    }

    async fn create_tree(&self, entries: Vec<TreeEntry>, base: &Oid) -> Result<Oid, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::CreateTree {
            entries: entries.clone(),
            base: base.clone(),
        });

        if let Some(FailOn::CreateTree(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        let summary = format!("tree:{}:{}", base, entries.len());
        Ok(Self::next_oid(&mut inner, &summary))
    }

    async fn create_commit(
        &self,
        tree: &Oid,
        parents: &[Oid],
        message: &str,
    ) -> Result<Oid, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::CreateCommit {
            tree: tree.clone(),
            parents: parents.to_vec(),
            message: message.to_string(),
        });

        if let Some(FailOn::CreateCommit(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        let summary = format!("commit:{}:{}", tree, message);
        Ok(Self::next_oid(&mut inner, &summary))
    }

    async fn create_reference(&self, full_ref: &str, sha: &Oid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::CreateReference {
            full_ref: full_ref.to_string(),
            sha: sha.clone(),
        });

        if let Some(FailOn::CreateReference(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        // Stored under the short path so later reads and updates see it
        let short = full_ref.strip_prefix("refs/").unwrap_or(full_ref);
        if inner.refs.contains_key(short) {
            return Err(StoreError::ApiError {
                status: 422,
                message: "Reference already exists".into(),
            });
        }
        inner.refs.insert(short.to_string(), sha.clone());
        Ok(())
    }

    async fn update_reference(&self, ref_path: &str, sha: &Oid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::UpdateReference {
            ref_path: ref_path.to_string(),
            sha: sha.clone(),
        });

        if let Some(FailOn::UpdateReference(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        if !inner.refs.contains_key(ref_path) {
            return Err(StoreError::ApiError {
                status: 422,
                message: format!("Reference does not exist: {}", ref_path),
            });
        }
        inner.refs.insert(ref_path.to_string(), sha.clone());
        Ok(())
    }
}
