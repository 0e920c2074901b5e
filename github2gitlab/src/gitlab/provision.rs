//! Project provisioning performed before the first push.

use super::{
    encode_segment, ensure_success, next_link, read_json, GitLabClient, GitLabError, PER_PAGE,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, info_span, warn, Instrument};

/// Title of the SSH key registered for pushing.
const KEY_TITLE: &str = "github2gitlab";

#[derive(Debug, Deserialize)]
struct SshKey {
    key: String,
}

#[derive(Debug, Serialize)]
struct NewSshKey<'a> {
    title: &'a str,
    key: &'a str,
}

#[derive(Debug, Deserialize)]
struct Namespace {
    id: u64,
}

#[derive(Debug, Serialize)]
struct NewProject<'a> {
    name: &'a str,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace_id: Option<u64>,
    visibility: &'a str,
}

#[derive(Debug, Deserialize)]
struct Branch {
    name: String,
    protected: bool,
}

impl GitLabClient {
    /// Registers the SSH public key at `path` with the GitLab user.
    ///
    /// A missing key file is not an error. A key GitLab refuses (e.g. one
    /// registered by another user) is logged and ignored.
    ///
    /// # Returns
    ///
    /// The key when it was submitted, `None` when there was nothing to do.
    ///
    /// # Errors
    ///
    /// Returns [`GitLabError`] if the existing keys cannot be listed.
    pub async fn add_ssh_key(&self, path: &Path) -> Result<Option<String>, GitLabError> {
        let public_key = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents.trim().to_string(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No SSH public key found");
                return Ok(None);
            }
        };

        let url = format!("{}/user/keys", self.api);
        let response = self.send(self.request(Method::GET, &url), &url).await?;
        let keys: Vec<SshKey> = read_json(&url, response, None).await?;
        if keys.iter().any(|k| k.key.trim() == public_key) {
            debug!(path = %path.display(), "SSH public key already registered");
            return Ok(None);
        }

        info!(path = %path.display(), title = KEY_TITLE, "Adding SSH public key");
        let body = NewSshKey {
            title: KEY_TITLE,
            key: &public_key,
        };
        let response = self
            .send(self.request(Method::POST, &url).json(&body), &url)
            .await?;
        if response.status() != StatusCode::CREATED {
            warn!(
                path = %path.display(),
                status = response.status().as_u16(),
                "SSH public key refused, possibly registered by another user; skipping"
            );
        }
        Ok(Some(public_key))
    }

    /// Creates the project unless it exists.
    ///
    /// # Returns
    ///
    /// `true` when the project was created by this call.
    ///
    /// # Errors
    ///
    /// Returns [`GitLabError`] if the project cannot be looked up or created.
    pub async fn ensure_project(&self) -> Result<bool, GitLabError> {
        let span = info_span!("ensure_project", repo = %self.repo);

        async {
            let url = self.project_url();
            let response = self.send(self.request(Method::GET, &url), &url).await?;
            if response.status() == StatusCode::OK {
                debug!(url = %url, "Project already exists");
                return Ok(false);
            }

            let (namespace, name) = match self.repo.rsplit_once('/') {
                Some((namespace, name)) => (Some(namespace), name),
                None => (None, self.repo.as_str()),
            };
            let namespace_id = match namespace {
                Some(namespace) => self.namespace_id(namespace).await?,
                None => None,
            };

            info!(namespace_id = ?namespace_id, "Creating project");
            let create_url = format!("{}/projects", self.api);
            let body = NewProject {
                name,
                path: name,
                namespace_id,
                visibility: "public",
            };
            let response = self
                .send(self.request(Method::POST, &create_url).json(&body), &create_url)
                .await?;
            let _: serde_json::Value =
                read_json(&create_url, response, Some(StatusCode::CREATED)).await?;
            Ok(true)
        }
        .instrument(span)
        .await
    }

    /// Looks up a namespace id; `None` when GitLab does not know it.
    async fn namespace_id(&self, namespace: &str) -> Result<Option<u64>, GitLabError> {
        let url = format!("{}/namespaces/{}", self.api, encode_segment(namespace));
        let response = self.send(self.request(Method::GET, &url), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!(namespace, "Unknown namespace, creating project in the user namespace");
            return Ok(None);
        }
        let namespace: Namespace = read_json(&url, response, None).await?;
        Ok(Some(namespace.id))
    }

    /// Removes branch protection so mirrored branches can be force-pushed.
    ///
    /// # Returns
    ///
    /// The number of branches unprotected.
    ///
    /// # Errors
    ///
    /// Returns [`GitLabError`] if listing or unprotecting fails.
    pub async fn unprotect_branches(&self) -> Result<usize, GitLabError> {
        let mut branches: Vec<Branch> = Vec::new();
        let mut next = Some(format!(
            "{}/repository/branches?per_page={PER_PAGE}",
            self.project_url()
        ));
        while let Some(url) = next.take() {
            let response = self.send(self.request(Method::GET, &url), &url).await?;
            next = next_link(response.headers());
            let page: Vec<Branch> = read_json(&url, response, None).await?;
            branches.extend(page);
        }

        let mut unprotected = 0;
        for branch in branches.iter().filter(|b| b.protected) {
            let url = format!(
                "{}/protected_branches/{}",
                self.project_url(),
                encode_segment(&branch.name)
            );
            info!(branch = %branch.name, "Unprotecting branch");
            let response = self.send(self.request(Method::DELETE, &url), &url).await?;
            ensure_success(&url, response).await?;
            unprotected += 1;
        }

        Ok(unprotected)
    }
}
