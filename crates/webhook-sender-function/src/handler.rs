//! Gateway-style request handler.
//!
//! A cloud function receives an HTTP event from an API gateway and answers
//! with a response object. Each invocation sends one freshly signed webhook
//! and reports the outcome as the response body. The content of the incoming
//! event never influences what is sent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};
use webhook_sender_core::{outcome_message, PayloadTemplate, WebhookDispatcher};

/// HTTP event delivered by the gateway.
///
/// Every field is optional; an empty JSON object is a valid invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayRequest {
    pub version: Option<String>,
    pub route_key: Option<String>,
    pub raw_path: Option<String>,
    pub raw_query_string: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
    pub request_context: Option<serde_json::Value>,
}

/// Response returned to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl GatewayResponse {
    fn text(status_code: u16, body: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain; charset=utf-8".to_string());

        Self {
            status_code,
            headers,
            body,
        }
    }

    /// `200` with `message` as the body.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::text(200, message.into())
    }

    /// `500` with `message` as the body.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::text(500, message.into())
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Send one webhook built from `template` and describe the outcome.
///
/// Never fails: delivery errors become a `500` response carrying the error
/// message, success becomes a `200` carrying `Webhook sent to <endpoint>`.
#[instrument(skip_all, fields(route = request.route_key.as_deref().unwrap_or("-")))]
pub async fn handle(
    request: &GatewayRequest,
    dispatcher: &WebhookDispatcher,
    template: &PayloadTemplate,
) -> GatewayResponse {
    debug!(
        raw_path = request.raw_path.as_deref().unwrap_or(""),
        has_body = request.body.is_some(),
        "Invocation received"
    );

    let result = dispatcher.create_and_send(template).await;
    let message = outcome_message(&result);

    match result {
        Ok(_) => GatewayResponse::ok(message),
        Err(_) => GatewayResponse::internal_error(message),
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
