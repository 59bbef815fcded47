//! reqwest adapters for the remote collaborators.
//!
//! | Port | Request |
//! |------|---------|
//! | [`RepositoryValidator`](onboard_application::RepositoryValidator) | `POST {endpoint}/validate` `{"source_url": ...}` |
//! | [`DeploymentGateway`](onboard_application::DeploymentGateway) | `POST {endpoint}/deployments` with `Idempotency-Key: <record id>` |
//! | [`ToolDiscoveryClient`](onboard_application::ToolDiscoveryClient) | `GET {endpoint}/services/{name}/operations` |
//!
//! Each client carries its own per-request timeout. The engine applies its
//! step timeout on top.

mod deployment;
mod discovery;
mod validator;

pub use deployment::HttpDeploymentGateway;
pub use discovery::HttpToolDiscoveryClient;
pub use validator::HttpRepositoryValidator;

use std::time::Duration;

const USER_AGENT: &str = concat!("tool-onboard/", env!("CARGO_PKG_VERSION"));

fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// First part of a response body, for error messages.
async fn body_excerpt(response: reqwest::Response) -> String {
    const MAX: usize = 512;
    let text = response.text().await.unwrap_or_default();
    let text = text.trim();
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
