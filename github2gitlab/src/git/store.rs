//! Ref access to the local mirror clone.

use super::GitError;
use crate::model::{Commit, Ref, RefLookup};
use async_trait::async_trait;

/// Read and write access to the refs of the local mirror clone.
///
/// [`GitRepository`](super::GitRepository) implements it on top of the `git`
/// binary; tests use an in-memory store.
#[async_trait]
pub trait RefStore: Send + Sync {
    /// Lists refs whose name starts with `prefix`.
    async fn list_refs(&self, prefix: &str) -> Result<Vec<Ref>, GitError>;

    /// Reads the parents of a commit.
    async fn read_commit(&self, revision: &str) -> Result<Commit, GitError>;

    /// Resolves a revision to a commit.
    ///
    /// An unknown revision is [`RefLookup::Missing`], not an error.
    async fn resolve(&self, revision: &str) -> Result<RefLookup, GitError>;

    /// Writes all refs in a single transaction: either every ref is
    /// updated or none is.
    async fn write_refs(&self, refs: &[Ref]) -> Result<(), GitError>;
}
