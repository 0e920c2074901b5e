//! Pull request listing from GitHub.
//!
//! [`GitHubClient`] lists every pull request of the mirrored repository,
//! optionally through the [`ResponseCache`].

mod error;

pub use error::GitHubError;

use crate::cache::ResponseCache;
use crate::model::{Proposal, ProposalState};
use async_trait::async_trait;
use octocrab::{Octocrab, Page};
use std::collections::BTreeMap;
use tracing::{debug, info, info_span, Instrument};
use url::Url;

/// Pull requests per listing page.
const PER_PAGE: &str = "100";

/// Source of the pull requests to mirror.
#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Lists pull requests keyed by number.
    async fn list_proposals(&self) -> Result<BTreeMap<String, Proposal>, GitHubError>;
}

/// GitHub pull request listing for one repository.
pub struct GitHubClient {
    octocrab: Octocrab,
    api_url: String,
    repo: String,
    cache: Option<ResponseCache>,
    ignore_closed: bool,
}

impl GitHubClient {
    /// Builds a client for `repo` (`owner/name`) against `api_url`.
    ///
    /// Without a token, requests are anonymous and subject to the lower
    /// unauthenticated rate limit.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] if `api_url` is invalid or the client cannot
    /// be built.
    pub fn new(api_url: &str, repo: &str, token: Option<&str>) -> Result<Self, GitHubError> {
        crate::tls::install_crypto_provider();

        let mut builder = Octocrab::builder().base_uri(api_url)?;
        if let Some(token) = token {
            builder = builder.personal_token(token.to_string());
        }

        Ok(Self {
            octocrab: builder.build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            cache: None,
            ignore_closed: false,
        })
    }

    /// Serves the listing from `cache` when it holds a fresh copy.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Drops pull requests that were closed without being merged.
    pub fn with_ignore_closed(mut self, ignore_closed: bool) -> Self {
        self.ignore_closed = ignore_closed;
        self
    }

    /// Fetches every page of the pull request listing.
    async fn fetch_all(&self) -> Result<Vec<Proposal>, GitHubError> {
        let route = format!("/repos/{}/pulls", self.repo);
        let query = [("state", "all"), ("per_page", PER_PAGE)];

        let mut page: Page<Proposal> = self.octocrab.get(&route, Some(&query)).await?;
        let mut proposals = std::mem::take(&mut page.items);
        let mut next = page.next.take();

        while let Some(link) = next {
            let url = with_original_query(&link.to_string(), &query)?;
            debug!(url = %url, "Fetching next page of pull requests");
            let mut page: Page<Proposal> = self.octocrab.get(url, None::<&()>).await?;
            proposals.append(&mut page.items);
            next = page.next;
        }

        Ok(proposals)
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/repos/{}/pulls?state=all&per_page={PER_PAGE}",
            self.api_url, self.repo
        )
    }
}

#[async_trait]
impl ProposalSource for GitHubClient {
    async fn list_proposals(&self) -> Result<BTreeMap<String, Proposal>, GitHubError> {
        let span = info_span!("list_pull_requests", repo = %self.repo);

        async {
            let url = self.listing_url();
            let cached = match &self.cache {
                Some(cache) => cache.load::<Vec<Proposal>>(&url)?,
                None => None,
            };

            let proposals = match cached {
                Some(proposals) => proposals,
                None => {
                    let proposals = self.fetch_all().await?;
                    if let Some(cache) = &self.cache {
                        cache.store(&url, &proposals)?;
                    }
                    proposals
                }
            };

            let keyed = key_proposals(proposals, self.ignore_closed);
            info!(count = keyed.len(), "Listed pull requests");
            Ok(keyed)
        }
        .instrument(span)
        .await
    }
}

/// Keys pull requests by number, dropping closed-unmerged ones when asked.
fn key_proposals(proposals: Vec<Proposal>, ignore_closed: bool) -> BTreeMap<String, Proposal> {
    proposals
        .into_iter()
        .filter(|p| !ignore_closed || p.state == ProposalState::Open || p.is_merged())
        .map(|p| (p.key(), p))
        .collect()
}

/// Adds back the original query parameters a continuation link dropped.
///
/// Parameters already present on the link win.
fn with_original_query(link: &str, query: &[(&str, &str)]) -> Result<String, GitHubError> {
    let mut url = Url::parse(link).map_err(|e| GitHubError::InvalidLink {
        link: link.to_string(),
        source: e,
    })?;

    let present: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    let missing: Vec<_> = query
        .iter()
        .filter(|(k, _)| !present.iter().any(|p| p == k))
        .collect();

    if !missing.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in missing {
            pairs.append_pair(k, v);
        }
    }

    Ok(url.into())
}
