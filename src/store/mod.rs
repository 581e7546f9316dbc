//! store
//!
//! Abstraction over the remote version-control object store.
//!
//! # Modules
//!
//! - `traits`: Core [`ObjectStore`] trait and request/response types
//! - [`github`]: GitHub implementation using the git-data REST API
//! - [`mock`]: In-memory implementation for deterministic testing
//!
//! The builder depends only on the trait; which implementation backs it
//! is the caller's choice at construction time.

pub mod github;
pub mod mock;
mod traits;

pub use github::GitHubStore;
pub use traits::*;
