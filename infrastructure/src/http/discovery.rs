//! HTTP tool discovery client.

use super::{body_excerpt, build_client};
use async_trait::async_trait;
use onboard_application::{DiscoveryError, ToolDiscoveryClient};
use onboard_domain::OperationDescriptor;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize)]
struct OperationsResponse {
    operations: Vec<OperationDescriptor>,
}

pub struct HttpToolDiscoveryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpToolDiscoveryClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    /// `{endpoint}/services/{name}/operations`, with the name as a single
    /// percent-encoded path segment.
    fn operations_url(&self, service_name: &str) -> Result<reqwest::Url, DiscoveryError> {
        let mut url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            DiscoveryError::RequestFailed(format!("invalid endpoint {}: {}", self.endpoint, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                DiscoveryError::RequestFailed(format!("endpoint cannot carry a path: {}", self.endpoint))
            })?
            .pop_if_empty()
            .extend(["services", service_name, "operations"]);
        Ok(url)
    }
}

#[async_trait]
impl ToolDiscoveryClient for HttpToolDiscoveryClient {
    async fn list_operations(&self, service_name: &str) -> Result<Vec<OperationDescriptor>, DiscoveryError> {
        let url = self.operations_url(service_name)?;
        debug!(%url, "Listing operations");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DiscoveryError::Timeout
            } else {
                DiscoveryError::ServiceUnreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::NOT_FOUND | StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE
        ) {
            return Err(DiscoveryError::ServiceUnreachable(format!(
                "HTTP {} for service {}",
                status.as_u16(),
                service_name
            )));
        }
        if !status.is_success() {
            return Err(DiscoveryError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body_excerpt(response).await
            )));
        }

        let body: OperationsResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::InvalidResponse(e.to_string()))?;
        Ok(body.operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(body: ResponseTemplate) -> (MockServer, HttpToolDiscoveryClient) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/svc-1/operations"))
            .respond_with(body)
            .mount(&server)
            .await;
        let client = HttpToolDiscoveryClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn test_operations_in_reported_order() {
        let (_server, client) = client_for(ResponseTemplate::new(200).set_body_json(json!({
            "operations": [
                {"name": "op1", "description": "first", "input_schema": {"type": "object"}},
                {"name": "op2"}
            ]
        })))
        .await;

        let ops = client.list_operations("svc-1").await.unwrap();
        assert_eq!(ops.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(), vec!["op1", "op2"]);
        assert!(ops[0].input_schema.is_some());
    }

    #[tokio::test]
    async fn test_empty_list_is_success_at_this_layer() {
        let (_server, client) =
            client_for(ResponseTemplate::new(200).set_body_json(json!({"operations": []}))).await;
        assert!(client.list_operations("svc-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_service_is_unreachable() {
        let (_server, client) = client_for(ResponseTemplate::new(200)).await;
        let err = client.list_operations("svc-2").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::ServiceUnreachable(_)));
    }

    #[tokio::test]
    async fn test_service_name_is_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/team%2Fsvc/operations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"operations": [{"name": "right"}]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/services/team/svc/operations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"operations": [{"name": "other"}]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/services/svc%3Fx=1/operations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"operations": [{"name": "query"}]})))
            .mount(&server)
            .await;
        let client = HttpToolDiscoveryClient::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();

        let ops = client.list_operations("team/svc").await.unwrap();
        assert_eq!(ops.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(), vec!["right"]);

        let ops = client.list_operations("svc?x=1").await.unwrap();
        assert_eq!(ops[0].name, "query");
    }

    #[tokio::test]
    async fn test_endpoint_path_prefix_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/services/svc-1/operations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"operations": [{"name": "op1"}]})))
            .mount(&server)
            .await;
        let client =
            HttpToolDiscoveryClient::new(format!("{}/api/v1", server.uri()), Duration::from_secs(5)).unwrap();
        assert_eq!(client.list_operations("svc-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_endpoint_fails_request() {
        let client = HttpToolDiscoveryClient::new("not a url", Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.list_operations("svc-1").await,
            Err(DiscoveryError::RequestFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_operations_field_is_invalid() {
        let (_server, client) =
            client_for(ResponseTemplate::new(200).set_body_json(json!({"ops": []}))).await;
        assert!(matches!(
            client.list_operations("svc-1").await,
            Err(DiscoveryError::InvalidResponse(_))
        ));
    }
}
