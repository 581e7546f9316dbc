//! store::github
//!
//! GitHub implementation of the object store using the git-data REST API.
//!
//! # Design
//!
//! All operations map onto `/repos/{owner}/{repo}/git/*` endpoints plus
//! the repository-metadata read. The store holds a static bearer token
//! handed in at construction; token acquisition and refresh are the
//! caller's concern.
//!
//! # Rate limiting
//!
//! GitHub has rate limits. This implementation returns
//! `StoreError::RateLimited` when limits are hit and does not retry;
//! retry policy belongs to the caller.
//!
//! # Example
//!
//! ```ignore
//! use gitmason::store::{GitHubStore, ObjectStore};
//! use gitmason::types::RepoId;
//!
//! let repo = RepoId::parse("octocat/hello-world")?;
//! let store = GitHubStore::new("ghp_xxx", repo);
//! let info = store.get_repository().await?;
//! println!("default branch: {}", info.default_branch);
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{ObjectStore, RepositoryInfo, StoreError, TreeEntry};
use crate::content::BlobPayload;
use crate::types::{Oid, RepoId};

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "gitmason";

/// Tree entry mode for a regular file.
const FILE_MODE: &str = "100644";

/// GitHub object store.
///
/// # Example
///
/// ```
/// use gitmason::store::GitHubStore;
/// use gitmason::types::RepoId;
///
/// let repo = RepoId::parse("octocat/hello-world").unwrap();
/// let store = GitHubStore::new("token", repo);
/// ```
pub struct GitHubStore {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token for API authentication
    token: String,
    /// Repository coordinates
    repo: RepoId,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubStore")
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubStore {
    /// Create a new GitHub store targeting api.github.com.
    pub fn new(token: impl Into<String>, repo: RepoId) -> Self {
        Self::with_api_base(token, repo, DEFAULT_API_BASE)
    }

    /// Create a GitHub store with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise installations
    /// (e.g. `https://github.example.com/api/v3`) or to point the store
    /// at a local test server.
    pub fn with_api_base(
        token: impl Into<String>,
        repo: RepoId,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            repo,
            api_base: api_base.into(),
        }
    }

    /// Repository coordinates this store targets.
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| StoreError::AuthFailed("token is not a valid header value".into()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base,
            self.repo.owner(),
            self.repo.name(),
            path
        )
    }

    /// URL of the repository-metadata endpoint itself.
    fn repo_root_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base,
            self.repo.owner(),
            self.repo.name()
        )
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| StoreError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, StoreError> {
        // Try to get error message from body
        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => StoreError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => StoreError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => StoreError::RateLimited,
            _ if status.is_server_error() => StoreError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => StoreError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Parse an object id out of a response body.
    fn parse_oid(sha: String) -> Result<Oid, StoreError> {
        Oid::new(sha).map_err(|e| StoreError::ApiError {
            status: 200,
            message: format!("malformed object id in response: {}", e),
        })
    }
}

#[async_trait]
impl ObjectStore for GitHubStore {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn get_repository(&self) -> Result<RepositoryInfo, StoreError> {
        let url = self.repo_root_url();
        tracing::debug!(repo = %self.repo, "get_repository");

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let body: GitHubRepository = self.handle_response(response).await?;
        Ok(RepositoryInfo {
            default_branch: body.default_branch,
        })
    }

    async fn get_reference(&self, ref_path: &str) -> Result<Oid, StoreError> {
        let url = self.repo_url(&format!("git/ref/{}", ref_path));
        tracing::debug!(repo = %self.repo, ref_path, "get_reference");

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let body: GitHubReference = self.handle_response(response).await?;
        Self::parse_oid(body.object.sha)
    }

    async fn create_blob(&self, payload: BlobPayload) -> Result<Oid, StoreError> {
        let url = self.repo_url("git/blobs");
        tracing::debug!(
            repo = %self.repo,
            encoding = payload.encoding.as_str(),
            bytes = payload.content.len(),
            "create_blob"
        );

        let body = CreateBlobBody {
            content: &payload.content,
            encoding: payload.encoding.as_str(),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let created: GitHubSha = self.handle_response(response).await?;
        Self::parse_oid(created.sha)
    }

    async fn create_tree(&self, entries: Vec<TreeEntry>, base: &Oid) -> Result<Oid, StoreError> {
        let url = self.repo_url("git/trees");
        tracing::debug!(
            repo = %self.repo,
            entries = entries.len(),
            base = base.short(7),
            "create_tree"
        );

        let tree: Vec<TreeEntryBody<'_>> = entries
            .iter()
            .map(|entry| TreeEntryBody {
                path: &entry.path,
                mode: FILE_MODE,
                kind: "blob",
                sha: entry.sha.as_str(),
            })
            .collect();
        let body = CreateTreeBody {
            tree,
            base_tree: base.as_str(),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let created: GitHubSha = self.handle_response(response).await?;
        Self::parse_oid(created.sha)
    }

    async fn create_commit(
        &self,
        tree: &Oid,
        parents: &[Oid],
        message: &str,
    ) -> Result<Oid, StoreError> {
        let url = self.repo_url("git/commits");
        tracing::debug!(
            repo = %self.repo,
            tree = tree.short(7),
            parents = parents.len(),
            "create_commit"
        );

        let body = CreateCommitBody {
            message,
            tree: tree.as_str(),
            parents: parents.iter().map(Oid::as_str).collect(),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let created: GitHubSha = self.handle_response(response).await?;
        Self::parse_oid(created.sha)
    }

    async fn create_reference(&self, full_ref: &str, sha: &Oid) -> Result<(), StoreError> {
        let url = self.repo_url("git/refs");
        tracing::debug!(repo = %self.repo, full_ref, sha = sha.short(7), "create_reference");

        let body = CreateRefBody {
            ref_name: full_ref,
            sha: sha.as_str(),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, status).await
        }
    }

    async fn update_reference(&self, ref_path: &str, sha: &Oid) -> Result<(), StoreError> {
        let url = self.repo_url(&format!("git/refs/{}", ref_path));
        tracing::debug!(repo = %self.repo, ref_path, sha = sha.short(7), "update_reference");

        let body = UpdateRefBody {
            sha: sha.as_str(),
        };

        let response = self
            .client
            .patch(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, status).await
        }
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a blob.
#[derive(Serialize)]
struct CreateBlobBody<'a> {
    content: &'a str,
    encoding: &'a str,
}

/// One entry in a tree creation request.
#[derive(Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    sha: &'a str,
}

/// Request body for creating a tree.
#[derive(Serialize)]
struct CreateTreeBody<'a> {
    tree: Vec<TreeEntryBody<'a>>,
    base_tree: &'a str,
}

/// Request body for creating a commit.
#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

/// Request body for creating a reference.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

/// Request body for updating a reference.
#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Repository metadata response (subset).
#[derive(Deserialize)]
struct GitHubRepository {
    default_branch: String,
}

/// Reference read response.
#[derive(Deserialize)]
struct GitHubReference {
    object: GitHubRefObject,
}

/// Object a reference points at.
#[derive(Deserialize)]
struct GitHubRefObject {
    sha: String,
}

/// Response carrying just a created object's sha.
#[derive(Deserialize)]
struct GitHubSha {
    sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> RepoId {
        RepoId::parse("octocat/hello-world").unwrap()
    }

    #[test]
    fn new_targets_default_api_base() {
        let store = GitHubStore::new("token", test_repo());
        assert_eq!(store.api_base, DEFAULT_API_BASE);
        assert_eq!(store.name(), "github");
        assert_eq!(store.repo().owner(), "octocat");
    }

    #[test]
    fn with_api_base_overrides() {
        let store =
            GitHubStore::with_api_base("token", test_repo(), "https://github.example.com/api/v3");
        assert_eq!(store.api_base, "https://github.example.com/api/v3");
    }

    #[test]
    fn repo_url_format() {
        let store = GitHubStore::new("token", test_repo());
        assert_eq!(
            store.repo_url("git/blobs"),
            "https://api.github.com/repos/octocat/hello-world/git/blobs"
        );
        assert_eq!(
            store.repo_root_url(),
            "https://api.github.com/repos/octocat/hello-world"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let store = GitHubStore::new("secret_token_abc123", test_repo());
        let debug_output = format!("{:?}", store);
        assert!(!debug_output.contains("secret_token_abc123"));
        assert!(debug_output.contains("octocat"));
    }

    #[test]
    fn headers_carry_bearer_token() {
        let store = GitHubStore::new("tok123", test_repo());
        let headers = store.headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer tok123");
        assert_eq!(headers[ACCEPT], "application/vnd.github+json");
        assert_eq!(headers[USER_AGENT], USER_AGENT_VALUE);
    }

    #[test]
    fn headers_reject_control_characters_in_token() {
        let store = GitHubStore::new("bad\ntoken", test_repo());
        assert!(matches!(
            store.headers(),
            Err(StoreError::AuthFailed(_))
        ));
    }

    #[test]
    fn tree_entry_body_serialization() {
        let body = TreeEntryBody {
            path: "src/main.rs",
            mode: FILE_MODE,
            kind: "blob",
            sha: "abc123def4567890abc123def4567890abc12345",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mode"], "100644");
        assert_eq!(json["type"], "blob");
        assert_eq!(json["path"], "src/main.rs");
    }

    #[test]
    fn create_ref_body_uses_ref_key() {
        let sha = "abc123def4567890abc123def4567890abc12345";
        let body = CreateRefBody {
            ref_name: "refs/heads/feat",
            sha,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ref"], "refs/heads/feat");
        assert_eq!(json["sha"], sha);
    }

    #[test]
    fn parse_oid_rejects_malformed_sha() {
        let result = GitHubStore::parse_oid("not-a-sha".into());
        assert!(matches!(result, Err(StoreError::ApiError { .. })));
    }
}
