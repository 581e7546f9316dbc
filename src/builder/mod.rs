//! builder
//!
//! Chainable, queue-serialized builder for GitHub commits.
//!
//! # Design
//!
//! Every mutating call ([`select_branch`], [`stage`], [`commit`],
//! [`push`]) appends one unit of work to an internal queue and returns
//! immediately, so calls can be chained textually before any network
//! result exists. A spawned driver task executes the queue strictly in
//! order against single-writer state.
//!
//! The builder is a command object, not a future: callers learn the
//! outcome through [`await_completion`], which settles once every
//! previously queued operation has run (or been skipped after a failure).
//! Always terminate a chain with `await_completion` — dropping the
//! builder without it silently discards any failure.
//!
//! # Example
//!
//! ```no_run
//! use gitmason::builder::CommitBuilder;
//!
//! # async fn example() -> Result<(), gitmason::builder::BuildError> {
//! let mut builder = CommitBuilder::new("octocat/hello-world", "ghp_xxx", None)?;
//! builder
//!     .select_branch("feat/docs")
//!     .stage("README.md", "# Hello\n")
//!     .stage("logo.png", std::fs::read("logo.png").unwrap())
//!     .commit("Add docs and logo")
//!     .push();
//! builder.await_completion().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`select_branch`]: CommitBuilder::select_branch
//! [`stage`]: CommitBuilder::stage
//! [`commit`]: CommitBuilder::commit
//! [`push`]: CommitBuilder::push
//! [`await_completion`]: CommitBuilder::await_completion

mod queue;
mod state;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::content::FileContent;
use crate::store::{GitHubStore, ObjectStore, StoreError};
use crate::types::{RepoId, TypeError};

use queue::Op;
use state::BuilderState;

/// Errors from the commit builder.
///
/// Precondition errors surface synchronously from [`CommitBuilder::new`];
/// everything else arrives through [`CommitBuilder::await_completion`].
/// The type is `Clone` because the queue's first failure is observed by
/// every completion probe.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// Repository identifier missing at construction.
    #[error("repository identifier is required")]
    MissingRepository,

    /// Token missing at construction.
    #[error("token is required")]
    MissingToken,

    /// Identifier failed validation at construction.
    #[error(transparent)]
    Invalid(#[from] TypeError),

    /// Publish requested with no commit produced and no head resolved.
    #[error("nothing to publish: no commit has been created or resolved")]
    NothingToPublish,

    /// A remote object-store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The driver task is gone; queued work can no longer settle.
    #[error("operation queue terminated")]
    QueueClosed,
}

/// Queued builder for a linear chain of object-store mutations.
///
/// Created with [`new`] against GitHub, or [`with_store`] against any
/// [`ObjectStore`]. Must be constructed inside a Tokio runtime: the
/// driver task is spawned at construction.
///
/// A builder instance targets one repository and one branch chain; it is
/// not a coordination point between concurrent writers.
///
/// [`new`]: CommitBuilder::new
/// [`with_store`]: CommitBuilder::with_store
#[derive(Debug)]
pub struct CommitBuilder {
    ops: mpsc::UnboundedSender<Op>,
}

impl CommitBuilder {
    /// Create a builder against the GitHub API.
    ///
    /// `repo` is a combined `owner/name` identifier; `branch` selects an
    /// existing branch explicitly, or `None` to use the repository's
    /// default branch, resolved lazily on first need.
    ///
    /// # Errors
    ///
    /// Fails eagerly (nothing is queued) when `repo` or `token` is empty
    /// or `repo` is not a valid `owner/name` pair.
    pub fn new(repo: &str, token: &str, branch: Option<&str>) -> Result<Self, BuildError> {
        if repo.trim().is_empty() {
            return Err(BuildError::MissingRepository);
        }
        if token.trim().is_empty() {
            return Err(BuildError::MissingToken);
        }
        let repo = RepoId::parse(repo)?;
        let store: Arc<dyn ObjectStore> = Arc::new(GitHubStore::new(token, repo));
        Ok(Self::with_store(store, branch))
    }

    /// Create a builder over an arbitrary object store.
    ///
    /// Used by tests (with the mock store) and by callers bringing their
    /// own transport, e.g. a GitHub Enterprise store with a custom API
    /// base.
    pub fn with_store(store: Arc<dyn ObjectStore>, branch: Option<&str>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = BuilderState::new(store, branch.map(str::to_string));
        tokio::spawn(queue::drive(state, rx));
        Self { ops: tx }
    }

    fn enqueue(&mut self, op: Op) -> &mut Self {
        // Send can only fail if the driver died; await_completion reports
        // that as QueueClosed.
        let _ = self.ops.send(op);
        self
    }

    /// Retarget the chain at a new branch, to be created at push time.
    ///
    /// When queued before any commit, the head of the branch being left
    /// is captured first so the next commit has a valid parent.
    pub fn select_branch(&mut self, name: impl Into<String>) -> &mut Self {
        self.enqueue(Op::SelectBranch { name: name.into() })
    }

    /// Stage content for a path. Staging the same path again overwrites
    /// the earlier content.
    pub fn stage(
        &mut self,
        path: impl Into<String>,
        content: impl Into<FileContent>,
    ) -> &mut Self {
        self.enqueue(Op::Stage {
            path: path.into(),
            content: content.into(),
        })
    }

    /// Commit everything staged so far. With nothing staged this still
    /// produces a valid commit mirroring the parent's tree.
    pub fn commit(&mut self, message: impl Into<String>) -> &mut Self {
        self.enqueue(Op::Commit {
            message: message.into(),
        })
    }

    /// Publish the current head to the working branch.
    pub fn push(&mut self) -> &mut Self {
        self.enqueue(Op::Push { ref_name: None })
    }

    /// Publish the current head to an explicitly named branch.
    pub fn push_to(&mut self, ref_name: impl Into<String>) -> &mut Self {
        self.enqueue(Op::Push {
            ref_name: Some(ref_name.into()),
        })
    }

    /// Wait until every operation queued so far has settled.
    ///
    /// Returns `Ok(())` if all of them succeeded, or the first failure
    /// (operations queued after it were skipped). May be called more than
    /// once; a failed queue keeps reporting the same first error.
    pub async fn await_completion(&mut self) -> Result<(), BuildError> {
        let (done, settled) = oneshot::channel();
        self.ops
            .send(Op::Flush { done })
            .map_err(|_| BuildError::QueueClosed)?;
        settled.await.map_err(|_| BuildError::QueueClosed)?
    }
}
