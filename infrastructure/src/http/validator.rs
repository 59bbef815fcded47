//! HTTP repository validator.

use super::{body_excerpt, build_client};
use async_trait::async_trait;
use onboard_application::{RepositoryValidator, ValidatorError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct ValidateRequest<'a> {
    source_url: &'a str,
}

#[derive(Deserialize)]
struct ValidateResponse {
    valid: bool,
    #[serde(default)]
    reason: Option<String>,
}

pub struct HttpRepositoryValidator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRepositoryValidator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RepositoryValidator for HttpRepositoryValidator {
    async fn validate(&self, source_url: &str) -> Result<(), ValidatorError> {
        let url = format!("{}/validate", self.endpoint);
        debug!(%url, source_url, "Validating source");

        let response = self
            .client
            .post(&url)
            .json(&ValidateRequest { source_url })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ValidatorError::Timeout
                } else {
                    ValidatorError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(ValidatorError::Rejected(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body_excerpt(response).await
            )));
        }
        if !status.is_success() {
            return Err(ValidatorError::Unreachable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body_excerpt(response).await
            )));
        }

        let body: ValidateResponse = response
            .json()
            .await
            .map_err(|e| ValidatorError::InvalidResponse(e.to_string()))?;
        if body.valid {
            Ok(())
        } else {
            Err(ValidatorError::Rejected(
                body.reason.unwrap_or_else(|| "no reason given".to_string()),
            ))
        }
    }
}
