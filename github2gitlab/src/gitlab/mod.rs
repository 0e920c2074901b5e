//! GitLab project access.
//!
//! [`GitLabClient`] implements [`RecordTarget`] over the GitLab v4 REST API
//! and provisions the project before mirroring (SSH key, project creation,
//! branch unprotection).

mod error;
mod link;
mod provision;
mod target;

pub use error::GitLabError;
pub use target::RecordTarget;

use crate::model::MirroredRecord;
use crate::reconcile::{NewRecord, RecordUpdate};
use async_trait::async_trait;
use link::next_link;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Items per listing page.
const PER_PAGE: u32 = 100;

/// GitLab REST client scoped to one project.
#[derive(Clone)]
pub struct GitLabClient {
    http: Client,
    host: String,
    api: String,
    repo: String,
    token: String,
}

impl GitLabClient {
    /// Builds a client for project `repo` (`namespace/name`) on the GitLab
    /// instance at `host`.
    ///
    /// # Errors
    ///
    /// Returns [`GitLabError::Client`] if the HTTP client cannot be built.
    pub fn new(host: &str, repo: &str, token: &str) -> Result<Self, GitLabError> {
        crate::tls::install_crypto_provider();

        let host = host.trim_end_matches('/').to_string();
        let http = Client::builder()
            .user_agent(concat!("github2gitlab/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api: format!("{host}/api/v4"),
            host,
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    /// API URL of the project.
    fn project_url(&self) -> String {
        format!("{}/projects/{}", self.api, encode_segment(&self.repo))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("PRIVATE-TOKEN", &self.token)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, GitLabError> {
        request.send().await.map_err(|e| GitLabError::Transport {
            url: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl RecordTarget for GitLabClient {
    async fn list_records(&self) -> Result<BTreeMap<u64, MirroredRecord>, GitLabError> {
        let mut records = BTreeMap::new();
        let mut next = Some(format!(
            "{}/merge_requests?state=all&per_page={PER_PAGE}",
            self.project_url()
        ));

        while let Some(url) = next.take() {
            debug!(url = %url, "Listing merge requests");
            let response = self.send(self.request(Method::GET, &url), &url).await?;
            next = next_link(response.headers());
            let page: Vec<MirroredRecord> = read_json(&url, response, None).await?;
            records.extend(page.into_iter().map(|record| (record.id, record)));
        }

        info!(count = records.len(), "Listed merge requests");
        Ok(records)
    }

    async fn create_record(&self, record: &NewRecord) -> Result<MirroredRecord, GitLabError> {
        let url = format!("{}/merge_requests", self.project_url());
        info!(
            url = %url,
            title = %record.title,
            source_branch = %record.source_branch,
            target_branch = %record.target_branch,
            "Creating merge request"
        );
        let response = self
            .send(self.request(Method::POST, &url).json(record), &url)
            .await?;
        read_json(&url, response, Some(StatusCode::CREATED)).await
    }

    async fn update_record(
        &self,
        iid: u64,
        update: &RecordUpdate,
    ) -> Result<MirroredRecord, GitLabError> {
        let url = format!("{}/merge_requests/{iid}", self.project_url());
        info!(url = %url, update = ?update, "Updating merge request");
        let response = self
            .send(self.request(Method::PUT, &url).json(update), &url)
            .await?;
        read_json(&url, response, None).await
    }

    fn record_url(&self, iid: u64) -> String {
        format!("{}/{}/merge_requests/{iid}", self.host, self.repo)
    }
}

/// Derives the git push URL of project `repo` from the GitLab URL.
///
/// `http://host` becomes the SSH form `git@host:<repo>.git`; `https://host`
/// keeps HTTPS and authenticates with the token.
#[must_use]
pub fn push_url(gitlab_url: &str, repo: &str, token: &str) -> String {
    let gitlab_url = gitlab_url.trim_end_matches('/');
    if let Some(host) = gitlab_url.strip_prefix("https://") {
        // GitLab ignores the user name when the password is a token.
        format!("https://user:{token}@{host}/{repo}.git")
    } else {
        let host = gitlab_url.strip_prefix("http://").unwrap_or(gitlab_url);
        format!("git@{host}:{repo}.git")
    }
}

/// Percent-encodes a path segment, including `/`.
pub(crate) fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

/// Reads a JSON response body.
///
/// `expected` pins the accepted status; any 2xx is accepted otherwise.
async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: Response,
    expected: Option<StatusCode>,
) -> Result<T, GitLabError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| GitLabError::Transport {
        url: url.to_string(),
        source: e,
    })?;

    let accepted = match expected {
        Some(expected) => status == expected,
        None => status.is_success(),
    };
    if !accepted {
        return Err(GitLabError::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        error!(url, body = %body, "Unable to parse response");
        GitLabError::Json {
            url: url.to_string(),
            source: e,
        }
    })
}

/// Fails unless the response status is 2xx.
async fn ensure_success(url: &str, response: Response) -> Result<(), GitLabError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(GitLabError::UnexpectedStatus {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}
