#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod cache;
pub mod config;
pub mod git;
pub mod github;
pub mod gitlab;
pub mod identity;
pub mod model;
pub mod promotion;
pub mod reconcile;
pub mod runner;
pub mod summary;
pub mod sync;
mod tls;

#[cfg(test)]
mod testing;

pub use cache::{CacheError, ResponseCache};
pub use config::{ConfigError, ConfigLayer, SyncConfig};
pub use git::{mirror_repository, GitError, GitRepository, MirrorPlan, RefStore};
pub use github::{GitHubClient, GitHubError, ProposalSource};
pub use gitlab::{push_url, GitLabClient, GitLabError, RecordTarget};
pub use identity::IdentityMap;
pub use model::{MirroredRecord, Proposal, RecordState, StateEvent, MARKER_TAG};
pub use promotion::{promote_merge_refs, Promotion, PromotionKind};
pub use reconcile::{creation_request, reconcile, NewRecord, RecordUpdate};
pub use runner::{Runner, RunnerError};
pub use summary::RunSummary;
pub use sync::{SyncAction, SyncDriver, SyncError};
