//! HTTP deployment gateway.

use super::{body_excerpt, build_client};
use async_trait::async_trait;
use onboard_application::{DeploymentGateway, DeploymentReceipt, DeploymentRequest, GatewayError};
use std::time::Duration;
use tracing::debug;

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Posts the deployment spec as the request body. The gateway must answer
/// with a [`DeploymentReceipt`] JSON document; a repeated request with the
/// same idempotency key must return the receipt of the original deployment.
pub struct HttpDeploymentGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDeploymentGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl DeploymentGateway for HttpDeploymentGateway {
    async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentReceipt, GatewayError> {
        let url = format!("{}/deployments", self.endpoint);
        debug!(%url, key = %request.idempotency_key, "Requesting deployment");

        let response = self
            .client
            .post(&url)
            .header(IDEMPOTENCY_HEADER, request.idempotency_key.as_str())
            .json(&request.spec)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::ConnectionError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body_excerpt(response).await
            )));
        }

        response
            .json::<DeploymentReceipt>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboard_application::DeploymentStatus;
    use onboard_domain::ToolId;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> DeploymentRequest {
        DeploymentRequest::new(ToolId::new("t1"), json!({"image": "acme/tool:1"}))
    }

    #[tokio::test]
    async fn test_sends_idempotency_key_and_spec() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/deployments"))
            .and(header("Idempotency-Key", "t1"))
            .and(body_json(json!({"image": "acme/tool:1"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"status": "succeeded", "service_name": "svc-1"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let gateway = HttpDeploymentGateway::new(server.uri(), Duration::from_secs(5)).unwrap();
        let first = gateway.deploy(&request()).await.unwrap();
        let second = gateway.deploy(&request()).await.unwrap();
        assert_eq!(first, DeploymentReceipt::succeeded("svc-1"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unrecognized_status_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(json!({"status": "queued", "message": "in line"})),
            )
            .mount(&server)
            .await;

        let gateway = HttpDeploymentGateway::new(server.uri(), Duration::from_secs(5)).unwrap();
        let receipt = gateway.deploy(&request()).await.unwrap();
        assert_eq!(receipt.status, DeploymentStatus::Unknown);
        assert_eq!(receipt.message.as_deref(), Some("in line"));
    }

    #[tokio::test]
    async fn test_http_error_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("spec.image missing"))
            .mount(&server)
            .await;

        let gateway = HttpDeploymentGateway::new(server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            gateway.deploy(&request()).await.unwrap_err(),
            GatewayError::RequestFailed("HTTP 422: spec.image missing".into())
        );
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"status": "succeeded", "service_name": "svc-1"})),
            )
            .mount(&server)
            .await;

        let gateway = HttpDeploymentGateway::new(server.uri(), Duration::from_millis(50)).unwrap();
        assert_eq!(gateway.deploy(&request()).await.unwrap_err(), GatewayError::Timeout);
    }
}
