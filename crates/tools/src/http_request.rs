//! HTTP request tool — make outbound HTTP calls with `reqwest`.
//!
//! GET requests run without confirmation. Any other method may change remote
//! state and asks for approval first.

use async_trait::async_trait;
use arka_core::error::ToolError;
use arka_core::schema::Schema;
use arka_core::tool::{Approval, Tool, ToolContext};
use reqwest::Method;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::args::{self, Args};

const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

fn is_mutating(args: &Map<String, Value>) -> bool {
    args.get("method")
        .and_then(Value::as_str)
        .is_some_and(|m| !m.eq_ignore_ascii_case("GET"))
}

pub struct HttpRequestTool {
    client: reqwest::Client,
}

impl HttpRequestTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { client }
    }

    #[cfg(test)]
    fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpRequestTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn name(&self) -> &str {
        "http_request"
    }

    fn description(&self) -> &str {
        "Make an HTTP request to a URL. Supports GET, POST, PUT and DELETE. \
         Returns the response status code and body."
    }

    fn schema(&self) -> Schema {
        Schema::object()
            .field("url", Schema::string().describe("The URL to send the request to"))
            .optional(
                "method",
                Schema::enumeration(METHODS).describe("HTTP method. Defaults to GET."),
            )
            .optional(
                "headers",
                Schema::any().describe("HTTP headers as key-value pairs"),
            )
            .optional(
                "body",
                Schema::any().describe("Request body. Objects are sent as JSON."),
            )
    }

    fn approval(&self) -> Approval {
        Approval::When(is_mutating)
    }

    async fn execute(&self, args: Args, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let url = args::required_str(&args, self.name(), "url")?;
        let method_name = args::optional_str(&args, "method").unwrap_or("GET");

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments {
                tool: self.name().into(),
                reason: "URL must start with http:// or https://".into(),
            });
        }
        let method = Method::from_bytes(method_name.to_ascii_uppercase().as_bytes()).map_err(
            |_| ToolError::InvalidArguments {
                tool: self.name().into(),
                reason: format!("invalid HTTP method '{method_name}'"),
            },
        )?;

        debug!(method = %method, url = %url, "Sending HTTP request");

        let mut request = self.client.request(method, url);
        if let Some(headers) = args.get("headers").and_then(Value::as_object) {
            for (name, value) in headers {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                request = request.header(name.as_str(), value);
            }
        }
        request = match args.get("body") {
            None | Some(Value::Null) => request,
            Some(Value::String(text)) => request.body(text.clone()),
            Some(other) => request.json(other),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Request failed: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to read response: {e}")))?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        Ok(json!({ "status": status, "body": body }))
    }
}
