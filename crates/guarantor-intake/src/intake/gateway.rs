//! Boundary to the remote processing endpoint.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::payload::SubmissionPayload;
use super::zip::ZipCandidate;
use crate::config::GatewayConfig;

/// Answer to a ZIP lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZipLookupResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ZipCandidate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// JSON body returned for a submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// HTTP status plus the decoded body, when the body was JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReply {
    pub status: u16,
    pub body: Option<SubmissionResponse>,
}

impl SubmissionReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.body.as_ref().is_some_and(|body| body.success)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.as_ref().and_then(|body| body.message.as_deref())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("unable to build HTTP client: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("endpoint answered HTTP {0}")]
    Status(u16),
    #[error("unable to decode response: {0}")]
    Decode(String),
}

/// Transport for ZIP lookups and submissions.
pub trait IntakeGateway {
    fn lookup_zip(
        &self,
        zip: &str,
    ) -> impl Future<Output = Result<ZipLookupResponse, GatewayError>> + Send;

    fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<SubmissionReply, GatewayError>> + Send;
}

/// reqwest-backed gateway talking JSON to the configured endpoints.
#[derive(Debug, Clone)]
pub struct HttpIntakeGateway {
    client: Client,
    submit_url: String,
    zip_lookup_url: String,
}

impl HttpIntakeGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| GatewayError::Client(err.to_string()))?;

        Ok(Self {
            client,
            submit_url: config.submit_url.clone(),
            zip_lookup_url: config.zip_lookup_url.clone(),
        })
    }
}

impl IntakeGateway for HttpIntakeGateway {
    async fn lookup_zip(&self, zip: &str) -> Result<ZipLookupResponse, GatewayError> {
        let response = self
            .client
            .get(&self.zip_lookup_url)
            .query(&[("zip", zip)])
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(zip, status = status.as_u16(), "ZIP lookup rejected");
            return Err(GatewayError::Status(status.as_u16()));
        }

        response
            .json::<ZipLookupResponse>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReply, GatewayError> {
        let response = self
            .client
            .post(&self.submit_url)
            .json(payload)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        // Non-JSON bodies are tolerated; the caller falls back to a fixed message.
        let body = response.json::<SubmissionResponse>().await.ok();

        info!(
            status,
            guarantors = payload.guarantors.len(),
            "submission answered"
        );
        Ok(SubmissionReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::time::Duration;

    async fn spawn_endpoint(router: Router) -> GatewayConfig {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub endpoint runs");
        });

        GatewayConfig {
            submit_url: format!("http://{addr}/pg"),
            zip_lookup_url: format!("http://{addr}/zip"),
            timeout: Duration::from_secs(5),
        }
    }

    async fn zip_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        match params.get("zip").map(String::as_str) {
            Some("50309") => Json(json!({
                "success": true,
                "results": [{ "city": "Des Moines", "state": "IA", "county": "Polk" }]
            })),
            _ => Json(json!({ "success": true, "results": [] })),
        }
    }

    #[tokio::test]
    async fn lookup_decodes_candidates() {
        let config = spawn_endpoint(Router::new().route("/zip", get(zip_handler))).await;
        let gateway = HttpIntakeGateway::new(&config).expect("client builds");

        let response = gateway.lookup_zip("50309").await.expect("lookup succeeds");
        let results = response.results.expect("results present");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].county.as_deref(), Some("Polk"));
    }

    #[tokio::test]
    async fn submit_keeps_status_when_body_is_not_json() {
        let router = Router::new().route(
            "/pg",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let config = spawn_endpoint(router).await;
        let gateway = HttpIntakeGateway::new(&config).expect("client builds");

        let reply = gateway
            .submit(&SubmissionPayload {
                token: "tok".to_string(),
                guarantors: Vec::new(),
            })
            .await
            .expect("transport succeeds");

        assert_eq!(reply.status, 502);
        assert!(reply.body.is_none());
        assert!(!reply.is_success());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let config = GatewayConfig {
            submit_url: "http://127.0.0.1:9/pg".to_string(),
            zip_lookup_url: "http://127.0.0.1:9/zip".to_string(),
            timeout: Duration::from_secs(2),
        };
        let gateway = HttpIntakeGateway::new(&config).expect("client builds");

        let err = gateway.lookup_zip("50309").await.expect_err("nothing listens");
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[test]
    fn reply_needs_ok_status_and_success_flag() {
        let ok = SubmissionReply {
            status: 200,
            body: Some(SubmissionResponse {
                success: true,
                message: None,
            }),
        };
        assert!(ok.is_success());

        let rejected = SubmissionReply {
            status: 200,
            body: Some(SubmissionResponse {
                success: false,
                message: Some("Token expired".to_string()),
            }),
        };
        assert!(!rejected.is_success());
        assert_eq!(rejected.message(), Some("Token expired"));
    }
}
