//! gitmason - queued builder for GitHub git-data commits
//!
//! Gitmason composes multi-step chains of mutating calls against a remote
//! version-control object store (blobs → tree → commit → branch reference)
//! and guarantees they run in the order issued, even though every call
//! returns before its remote effect is known.
//!
//! # Architecture
//!
//! - [`builder`] - Chainable [`CommitBuilder`](builder::CommitBuilder),
//!   its operation queue, and the single-writer build state
//! - [`store`] - Object-store capability trait with GitHub and mock
//!   implementations
//! - [`content`] - Staged file content and blob wire encoding
//! - [`types`] - Validated identifiers (`RepoId`, `Oid`)
//!
//! # Correctness invariants
//!
//! 1. Every mutating call funnels through one ordered queue; no shared
//!    state is touched outside it
//! 2. Branch and head are resolved lazily, at most once each, unless a
//!    branch selection explicitly retargets the chain
//! 3. The first queue failure is terminal: later operations are skipped
//!    and the error is what completion observers see
//!
//! # Example
//!
//! ```no_run
//! use gitmason::builder::CommitBuilder;
//!
//! # async fn example() -> Result<(), gitmason::builder::BuildError> {
//! let mut builder = CommitBuilder::new("octocat/hello-world", "ghp_xxx", Some("main"))?;
//! builder
//!     .stage("notes.md", "remember the milk\n")
//!     .commit("Add notes")
//!     .push();
//! builder.await_completion().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod content;
pub mod store;
pub mod types;
