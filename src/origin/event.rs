//! JSON event adapter
//!
//! Accepts API-gateway style HTTP events and renders responses in the same
//! family: binary bodies are base64 encoded and flagged with
//! `isBase64Encoded`.

use std::collections::BTreeMap;
use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::{OriginRequest, OriginResponse};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginEvent {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestContext {
    pub http: HttpContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpContext {
    pub method: String,
    pub path: String,
}

impl OriginEvent {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// The path comes from `requestContext.http.path`
    pub fn into_request(self) -> OriginRequest {
        let mut request =
            OriginRequest::new(self.request_context.http.method, self.request_context.http.path);
        for (name, value) in self.headers {
            request.insert_header(name, value);
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginEventResponse {
    pub status_code: u16,
    pub body: String,
    pub is_base64_encoded: bool,
    pub headers: BTreeMap<String, String>,
}

impl From<OriginResponse> for OriginEventResponse {
    fn from(response: OriginResponse) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), response.content_type.to_string());

        let (body, is_base64_encoded) = if response.is_image {
            (STANDARD.encode(&response.body), true)
        } else {
            (String::from_utf8_lossy(&response.body).into_owned(), false)
        };

        Self {
            status_code: response.status,
            body,
            is_base64_encoded,
            headers,
        }
    }
}
