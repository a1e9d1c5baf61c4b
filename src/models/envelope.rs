use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inbound call as delivered by the API gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// Matched resource pattern, e.g. `/guests/{id}`
    #[serde(alias = "resource")]
    pub resource_path: String,
    pub http_method: String,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub authorizer: Option<Authorizer>,
}

/// Claims attached by the upstream authorizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authorizer {
    #[serde(default)]
    pub claims: HashMap<String, String>,
}

impl RequestEnvelope {
    pub fn new(http_method: impl Into<String>, resource_path: impl Into<String>) -> Self {
        Self {
            resource_path: resource_path.into(),
            http_method: http_method.into(),
            ..Default::default()
        }
    }

    pub fn with_path_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.into());
        self
    }

    pub fn with_query_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_context.request_id = Some(request_id.into());
        self
    }

    pub fn with_claim(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request_context
            .authorizer
            .get_or_insert_with(Authorizer::default)
            .claims
            .insert(name.to_string(), value.into());
        self
    }

    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    pub fn claims(&self) -> Option<&HashMap<String, String>> {
        self.request_context
            .authorizer
            .as_ref()
            .map(|authorizer| &authorizer.claims)
    }
}

/// Outbound result handed back to the API gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ResponseEnvelope {
    pub const JSON: &'static str = "application/json";
    pub const TEXT: &'static str = "text/plain; charset=utf-8";

    /// Serialize `payload` as the JSON body
    pub fn json<T: Serialize>(status_code: u16, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self::with_content_type(status_code, Self::JSON, body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response payload");
                Self::message(500, "Internal server error")
            }
        }
    }

    /// Plain-text message body, used for every error response
    pub fn message(status_code: u16, message: impl Into<String>) -> Self {
        Self::with_content_type(status_code, Self::TEXT, message.into())
    }

    fn with_content_type(status_code: u16, content_type: &str, body: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_from_gateway_json() {
        let json = r#"{
            "resource": "/guests/{id}",
            "httpMethod": "GET",
            "pathParameters": {"id": "abc"},
            "queryStringParameters": null,
            "body": null,
            "requestContext": {
                "requestId": "req-1",
                "authorizer": {"claims": {"scope": "customer/web"}}
            }
        }"#;

        let envelope: RequestEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.resource_path, "/guests/{id}");
        assert_eq!(envelope.http_method, "GET");
        assert_eq!(envelope.path_parameter("id"), Some("abc"));
        assert_eq!(envelope.query_parameter("isCleaned"), None);
        assert_eq!(envelope.request_context.request_id.as_deref(), Some("req-1"));
        assert_eq!(
            envelope.claims().and_then(|c| c.get("scope")).map(String::as_str),
            Some("customer/web")
        );
    }

    #[test]
    fn test_response_envelope_serializes_status_code() {
        let response = ResponseEnvelope::message(404, "Guest not found");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["body"], "Guest not found");
        assert!(!response.is_success());
    }

    #[test]
    fn test_json_response_sets_content_type() {
        let response = ResponseEnvelope::json(201, &vec!["a", "b"]);
        assert_eq!(response.body, r#"["a","b"]"#);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some(ResponseEnvelope::JSON)
        );
        assert!(response.is_success());
    }
}
