//! Web search tool — Tavily search API.

use async_trait::async_trait;
use arka_core::error::ToolError;
use arka_core::schema::Schema;
use arka_core::tool::{Tool, ToolContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::args::{self, Args};

const TAVILY_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: u32 = 5;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

pub struct WebSearchTool {
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build search HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            endpoint: TAVILY_URL.into(),
            client,
        }
    }

    /// Point the tool at a different search endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns a list of relevant results with titles, URLs, and content snippets."
    }

    fn schema(&self) -> Schema {
        Schema::object().field("query", Schema::string().describe("The search query"))
    }

    async fn execute(&self, args: Args, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let query = args::required_str(&args, self.name(), "query")?;
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ToolError::failed(
                self.name(),
                "No search API key configured. Run `arka configure --search-api-key <key>` or set TAVILY_API_KEY.",
            ));
        };

        debug!(query = %query, "Searching the web");

        let body = SearchRequest {
            api_key,
            query,
            max_results: MAX_RESULTS,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::failed(
                self.name(),
                format!("Search API error: {} - {text}", status.as_u16()),
            ));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::failed(self.name(), format!("Invalid search response: {e}")))?;

        serde_json::to_value(&parsed.results)
            .map_err(|e| ToolError::failed(self.name(), format!("Failed to encode results: {e}")))
    }
}
