//! builder::state
//!
//! Single-writer builder state: branch/head resolution, tree assembly,
//! commit chaining, and reference publishing.
//!
//! Exactly one driver task owns a `BuilderState`, so no locks guard the
//! fields; serialization comes from the operation queue.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::content::FileContent;
use crate::store::{ObjectStore, TreeEntry};
use crate::types::Oid;

use super::BuildError;

/// The branch a builder publishes to.
///
/// `New` is entered only through an explicit branch selection; at publish
/// time it means the reference does not exist yet and must be created
/// rather than updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BranchTarget {
    /// No branch known yet; resolve the repository default on first use.
    Unresolved,
    /// A branch assumed to already exist remotely.
    Existing(String),
    /// A branch to be created at publish time.
    New(String),
}

impl BranchTarget {
    fn name(&self) -> Option<&str> {
        match self {
            BranchTarget::Unresolved => None,
            BranchTarget::Existing(name) | BranchTarget::New(name) => Some(name),
        }
    }

    fn is_new(&self) -> bool {
        matches!(self, BranchTarget::New(_))
    }
}

/// Mutable state owned by the queue's driver task.
pub(crate) struct BuilderState {
    store: Arc<dyn ObjectStore>,
    branch: BranchTarget,
    /// Path -> staged content; entry set matters, not insertion order.
    pending: BTreeMap<String, FileContent>,
    /// Local view of ancestry; last element is the current head.
    history: Vec<Oid>,
}

impl BuilderState {
    pub(crate) fn new(store: Arc<dyn ObjectStore>, branch: Option<String>) -> Self {
        let branch = match branch {
            Some(name) => BranchTarget::Existing(name),
            None => BranchTarget::Unresolved,
        };
        Self {
            store,
            branch,
            pending: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Resolve the working branch name, fetching the repository default
    /// at most once.
    async fn resolve_branch(&mut self) -> Result<String, BuildError> {
        if let Some(name) = self.branch.name() {
            return Ok(name.to_string());
        }
        let info = self.store.get_repository().await?;
        tracing::debug!(branch = %info.default_branch, "resolved default branch");
        self.branch = BranchTarget::Existing(info.default_branch.clone());
        Ok(info.default_branch)
    }

    /// Resolve the current head commit id.
    ///
    /// Local history is authoritative once non-empty; otherwise the branch
    /// reference is read once and cached as the sole history entry.
    async fn resolve_head(&mut self) -> Result<Oid, BuildError> {
        if let Some(head) = self.history.last() {
            return Ok(head.clone());
        }
        let branch = self.resolve_branch().await?;
        let sha = self
            .store
            .get_reference(&format!("heads/{}", branch))
            .await?;
        tracing::debug!(branch = %branch, head = sha.short(7), "resolved head");
        self.history.push(sha.clone());
        Ok(sha)
    }

    /// Retarget the builder at a new branch.
    ///
    /// If no commit has been produced yet, the current head is resolved
    /// first so the first commit on the new branch still has the parent
    /// from the branch being left. With history already populated, the new
    /// branch simply carries the existing head.
    pub(crate) async fn select_branch(&mut self, name: String) -> Result<(), BuildError> {
        if self.history.is_empty() {
            self.resolve_head().await?;
        }
        self.branch = BranchTarget::New(name);
        Ok(())
    }

    /// Stage content for a path, overwriting any prior staging of it.
    pub(crate) fn stage(&mut self, path: String, content: FileContent) {
        self.pending.insert(path, content);
    }

    /// Materialize pending changes as blobs plus one tree layered on `base`.
    ///
    /// Only staged paths become entries; every other path is inherited from
    /// the base by the remote store. An empty pending set yields a tree
    /// that mirrors the base.
    async fn build_tree(&mut self, base: &Oid) -> Result<Oid, BuildError> {
        let mut entries = Vec::with_capacity(self.pending.len());
        for (path, content) in &self.pending {
            let sha = self.store.create_blob(content.payload()).await?;
            entries.push(TreeEntry {
                path: path.clone(),
                sha,
            });
        }
        let tree = self.store.create_tree(entries, base).await?;
        Ok(tree)
    }

    /// Wrap pending changes into a commit parented on the current head.
    ///
    /// Pending changes are cleared only on success, so a failed commit
    /// leaves the staged content intact.
    pub(crate) async fn commit(&mut self, message: &str) -> Result<(), BuildError> {
        let head = self.resolve_head().await?;
        let tree = self.build_tree(&head).await?;
        let sha = self
            .store
            .create_commit(&tree, std::slice::from_ref(&head), message)
            .await?;
        tracing::debug!(commit = sha.short(7), parent = head.short(7), "created commit");
        self.pending.clear();
        self.history.push(sha);
        Ok(())
    }

    /// Point the branch reference at the current head.
    ///
    /// A new branch gets a created `refs/heads/<name>` reference; an
    /// existing one gets an in-place `heads/<name>` update.
    pub(crate) async fn push(&mut self, ref_name: Option<&str>) -> Result<(), BuildError> {
        let branch = match ref_name {
            Some(name) => name.to_string(),
            None => self.resolve_branch().await?,
        };
        let sha = self
            .history
            .last()
            .cloned()
            .ok_or(BuildError::NothingToPublish)?;

        if self.branch.is_new() {
            self.store
                .create_reference(&format!("refs/heads/{}", branch), &sha)
                .await?;
        } else {
            self.store
                .update_reference(&format!("heads/{}", branch), &sha)
                .await?;
        }
        tracing::debug!(branch = %branch, sha = sha.short(7), "published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{MockStore, StoreOperation};
    use crate::store::StoreError;

    fn state_with(store: &MockStore, branch: Option<&str>) -> BuilderState {
        BuilderState::new(Arc::new(store.clone()), branch.map(str::to_string))
    }

    #[tokio::test]
    async fn explicit_branch_skips_metadata_lookup() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        let branch = state.resolve_branch().await.unwrap();
        assert_eq!(branch, "main");
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn default_branch_resolved_exactly_once() {
        let store = MockStore::with_default_branch("trunk");
        let mut state = state_with(&store, None);

        assert_eq!(state.resolve_branch().await.unwrap(), "trunk");
        assert_eq!(state.resolve_branch().await.unwrap(), "trunk");

        let lookups = store.operations_matching(|op| *op == StoreOperation::GetRepository);
        assert_eq!(lookups.len(), 1);
    }

    #[tokio::test]
    async fn head_resolved_once_then_local() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        let first = state.resolve_head().await.unwrap();
        let second = state.resolve_head().await.unwrap();
        assert_eq!(first, second);

        let reads =
            store.operations_matching(|op| matches!(op, StoreOperation::GetReference { .. }));
        assert_eq!(reads.len(), 1);
    }

    #[tokio::test]
    async fn select_branch_captures_parent_head() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        state.select_branch("feat".into()).await.unwrap();

        // Head of the branch being left was fetched and kept
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.branch, BranchTarget::New("feat".into()));
        let reads =
            store.operations_matching(|op| matches!(op, StoreOperation::GetReference { .. }));
        assert_eq!(reads.len(), 1);
    }

    #[tokio::test]
    async fn select_branch_after_commit_skips_resolution() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        state.commit("first").await.unwrap();
        let head = state.history.last().cloned().unwrap();

        state.select_branch("feat".into()).await.unwrap();

        // Only the commit's own head read happened; the carried-over
        // commit stays the head for the new branch.
        let reads =
            store.operations_matching(|op| matches!(op, StoreOperation::GetReference { .. }));
        assert_eq!(reads.len(), 1);
        assert_eq!(state.history.last(), Some(&head));
    }

    #[tokio::test]
    async fn commit_builds_tree_from_staged_paths() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        state.stage("b.txt".into(), FileContent::from("bee"));
        state.stage("a.txt".into(), FileContent::from("ay"));
        state.commit("add files").await.unwrap();

        let trees: Vec<_> = store
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                StoreOperation::CreateTree { entries, .. } => Some(entries),
                _ => None,
            })
            .collect();
        assert_eq!(trees.len(), 1);
        let paths: Vec<_> = trees[0].iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);

        // Pending cleared, history grew
        assert!(state.pending.is_empty());
        assert_eq!(state.history.len(), 2);
    }

    #[tokio::test]
    async fn empty_commit_mirrors_base_tree() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        state.commit("empty").await.unwrap();

        let ops = store.operations();
        let tree = ops
            .iter()
            .find_map(|op| match op {
                StoreOperation::CreateTree { entries, base } => Some((entries, base)),
                _ => None,
            })
            .unwrap();
        assert!(tree.0.is_empty());
        assert_eq!(*tree.1, store.ref_sha("heads/main").unwrap());
    }

    #[tokio::test]
    async fn commit_parents_on_prior_head() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        state.commit("one").await.unwrap();
        let first = state.history.last().cloned().unwrap();
        state.commit("two").await.unwrap();

        let commits: Vec<_> = store
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                StoreOperation::CreateCommit { parents, .. } => Some(parents),
                _ => None,
            })
            .collect();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[1], vec![first]);
    }

    #[tokio::test]
    async fn failed_commit_keeps_pending_changes() {
        let store = MockStore::new();
        store.fail_on(crate::store::mock::FailOn::CreateCommit(
            StoreError::RateLimited,
        ));
        let mut state = state_with(&store, Some("main"));

        state.stage("a.txt".into(), FileContent::from("ay"));
        assert!(state.commit("will fail").await.is_err());

        assert_eq!(state.pending.len(), 1);
        assert_eq!(state.history.len(), 1); // only the resolved head
    }

    #[tokio::test]
    async fn push_without_history_is_rejected() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        let result = state.push(None).await;
        assert!(matches!(result, Err(BuildError::NothingToPublish)));
    }

    #[tokio::test]
    async fn push_new_branch_creates_reference() {
        let store = MockStore::new();
        let mut state = state_with(&store, None);

        state.select_branch("feat".into()).await.unwrap();
        state.commit("work").await.unwrap();
        state.push(None).await.unwrap();

        let ops = store.operations();
        assert!(ops.iter().any(|op| matches!(
            op,
            StoreOperation::CreateReference { full_ref, .. } if full_ref == "refs/heads/feat"
        )));
        assert!(!ops
            .iter()
            .any(|op| matches!(op, StoreOperation::UpdateReference { .. })));
    }

    #[tokio::test]
    async fn push_existing_branch_updates_reference() {
        let store = MockStore::new();
        let mut state = state_with(&store, Some("main"));

        state.commit("work").await.unwrap();
        state.push(None).await.unwrap();

        let ops = store.operations();
        assert!(ops.iter().any(|op| matches!(
            op,
            StoreOperation::UpdateReference { ref_path, .. } if ref_path == "heads/main"
        )));
        assert!(!ops
            .iter()
            .any(|op| matches!(op, StoreOperation::CreateReference { .. })));
        assert_eq!(
            store.ref_sha("heads/main"),
            state.history.last().cloned()
        );
    }

    #[tokio::test]
    async fn push_honors_explicit_ref_name() {
        let store = MockStore::new();
        let head = store.ref_sha("heads/main").unwrap();
        store.set_ref("heads/release", head);
        let mut state = state_with(&store, Some("main"));

        state.commit("work").await.unwrap();
        state.push(Some("release")).await.unwrap();

        assert_eq!(
            store.ref_sha("heads/release"),
            state.history.last().cloned()
        );
    }
}
