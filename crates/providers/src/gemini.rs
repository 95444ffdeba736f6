//! Google Gemini provider (Generative Language API, `v1beta`).
//!
//! Differences from the other vendors:
//! - no system role: the system prompt is sent as a user turn followed by a
//!   canned model acknowledgement
//! - `assistant` is called `model`
//! - tool results are `functionResponse` parts on a user turn
//! - function calls carry no id, so one is synthesised per call

use async_trait::async_trait;
use arka_core::error::ProviderError;
use arka_core::message::{Message, Role, ToolCall};
use arka_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;
use crate::sse;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const SYSTEM_ACK: &str = "Understood.";
const PROVIDER: &str = "Gemini";

/// Gemini generateContent provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: http::client(120),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/models/{}:{method}", self.base_url, self.model)
    }

    /// Convert our Message types to Gemini `contents`.
    fn to_contents(messages: &[Message]) -> Vec<Content> {
        let mut contents: Vec<Content> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => {
                    contents.push(Content::new("user", vec![Part::text(&msg.content)]));
                    contents.push(Content::new("model", vec![Part::text(SYSTEM_ACK)]));
                }
                Role::User => {
                    contents.push(Content::new("user", vec![Part::text(&msg.content)]));
                }
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !msg.content.is_empty() || msg.tool_calls.is_empty() {
                        parts.push(Part::text(&msg.content));
                    }
                    parts.extend(msg.tool_calls.iter().map(|tc| Part {
                        function_call: Some(FunctionCall {
                            name: tc.name.clone(),
                            args: serde_json::Value::Object(tc.args.clone()),
                        }),
                        ..Part::default()
                    }));
                    contents.push(Content::new("model", parts));
                }
                Role::Tool => {
                    let part = Part {
                        function_response: Some(FunctionResponse {
                            name: msg.tool_name.clone().unwrap_or_default(),
                            response: serde_json::json!({ "result": msg.content }),
                        }),
                        ..Part::default()
                    };
                    // Responses to one model turn travel together in one user turn.
                    match contents.last_mut() {
                        Some(last)
                            if last.role == "user"
                                && last.parts.iter().all(|p| p.function_response.is_some()) =>
                        {
                            last.parts.push(part)
                        }
                        _ => contents.push(Content::new("user", vec![part])),
                    }
                }
            }
        }

        contents
    }

    fn request_body(&self, messages: &[Message], options: &InvokeOptions) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": Self::to_contents(messages),
        });

        if !options.tools.is_empty() {
            body["tools"] = serde_json::json!(options.tools);
            let mode = match options.tool_choice {
                ToolChoice::Auto => "AUTO",
            };
            body["toolConfig"] = serde_json::json!({
                "functionCallingConfig": { "mode": mode }
            });
        }

        body
    }

    fn parse_response(resp: GenerateResponse) -> Result<ProviderResponse, ProviderError> {
        let parts = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .ok_or_else(|| http::decode("No candidates in response"))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();

        for part in parts {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(call) = part.function_call {
                let args = match call.args {
                    serde_json::Value::Object(map) => map,
                    _ => serde_json::Map::new(),
                };
                tool_calls.push(ToolCall {
                    id: synthesize_call_id(),
                    name: call.name,
                    args,
                });
            }
        }

        Ok(ProviderResponse {
            content,
            tool_calls,
        })
    }

    fn extract_delta(data: &str) -> Result<Option<String>, serde_json::Error> {
        let resp: GenerateResponse = serde_json::from_str(data)?;
        let text: String = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        Ok((!text.is_empty()).then_some(text))
    }
}

/// `call_{unix millis}_{random suffix}`.
fn synthesize_call_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "call_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        &suffix[..9]
    )
}

#[async_trait]
impl arka_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn invoke(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let body = self.request_body(messages, options);

        debug!(
            provider = "gemini",
            model = %self.model,
            messages = messages.len(),
            tools = options.tools.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.url("generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::network)?;

        let response = http::ensure_success(PROVIDER, response).await?;
        let resp: GenerateResponse = response.json().await.map_err(http::decode)?;
        Self::parse_response(resp)
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &InvokeOptions,
    ) -> std::result::Result<StreamReceiver, ProviderError> {
        let body = self.request_body(messages, options);

        debug!(provider = "gemini", model = %self.model, "Sending streaming request");

        let response = self
            .client
            .post(self.url("streamGenerateContent"))
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::network)?;

        let response = http::ensure_success(PROVIDER, response).await?;
        Ok(sse::spawn_text_stream("gemini", response, Self::extract_delta))
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, parts: Vec<Part>) -> Self {
        Self {
            role: role.into(),
            parts,
        }
    }
}

/// One part of a turn. Exactly one field is set.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use arka_core::Provider;
    use serde_json::json;

    fn provider() -> GeminiProvider {
        GeminiProvider::new("AIza-test", "gemini-1.5-pro")
    }

    #[test]
    fn urls_embed_model_and_method() {
        let p = provider();
        assert_eq!(p.name(), "gemini");
        assert_eq!(
            p.url("generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
        let p = p.with_base_url("http://localhost:1234/");
        assert_eq!(
            p.url("streamGenerateContent"),
            "http://localhost:1234/models/gemini-1.5-pro:streamGenerateContent"
        );
    }

    #[test]
    fn system_prompt_becomes_acknowledged_user_turn() {
        let contents =
            GeminiProvider::to_contents(&[Message::system("Be brief"), Message::user("Hi")]);
        let json = serde_json::to_value(&contents).unwrap();
        assert_eq!(json[0]["role"], "user");
        assert_eq!(json[0]["parts"][0]["text"], "Be brief");
        assert_eq!(json[1]["role"], "model");
        assert_eq!(json[1]["parts"][0]["text"], "Understood.");
        assert_eq!(json[2]["parts"][0]["text"], "Hi");
    }

    #[test]
    fn tool_round_trip_encoding() {
        let args = json!({"path": "a.txt"}).as_object().cloned().unwrap();
        let messages = vec![
            Message::user("read two files"),
            Message::assistant_with_tools(
                "",
                vec![
                    ToolCall::new("call_1", "read_file", args.clone()),
                    ToolCall::new("call_2", "read_file", args),
                ],
            ),
            Message::tool_result("call_1", "read_file", "one"),
            Message::tool_result("call_2", "read_file", "two"),
        ];
        let json = serde_json::to_value(GeminiProvider::to_contents(&messages)).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);

        assert_eq!(json[1]["role"], "model");
        assert_eq!(json[1]["parts"].as_array().unwrap().len(), 2);
        assert_eq!(json[1]["parts"][0]["functionCall"]["name"], "read_file");
        assert_eq!(json[1]["parts"][0]["functionCall"]["args"]["path"], "a.txt");

        assert_eq!(json[2]["role"], "user");
        assert_eq!(json[2]["parts"][0]["functionResponse"]["name"], "read_file");
        assert_eq!(
            json[2]["parts"][1]["functionResponse"]["response"]["result"],
            "two"
        );
    }

    #[test]
    fn request_body_with_tools() {
        let tools = vec![json!({"function_declarations": [{"name": "web_search"}]})];
        let body = provider().request_body(&[Message::user("hi")], &InvokeOptions::with_tools(tools));
        assert_eq!(body["tools"][0]["function_declarations"][0]["name"], "web_search");
        assert_eq!(body["toolConfig"]["functionCallingConfig"]["mode"], "AUTO");

        let body = provider().request_body(&[Message::user("hi")], &InvokeOptions::default());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn parse_text_response() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"4"}]},"finishReason":"STOP"}]}"#;
        let resp: GenerateResponse = serde_json::from_str(data).unwrap();
        let parsed = GeminiProvider::parse_response(resp).unwrap();
        assert_eq!(parsed.content, "4");
        assert!(!parsed.has_tool_calls());
    }

    #[test]
    fn parse_function_calls_synthesizes_unique_ids() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[
            {"functionCall":{"name":"web_search","args":{"query":"rust"}}},
            {"functionCall":{"name":"current_loc","args":{}}}
        ]}}]}"#;
        let resp: GenerateResponse = serde_json::from_str(data).unwrap();
        let parsed = GeminiProvider::parse_response(resp).unwrap();
        assert_eq!(parsed.tool_calls.len(), 2);
        assert_eq!(parsed.tool_calls[0].args["query"], "rust");
        assert!(parsed.tool_calls[0].id.starts_with("call_"));
        assert_ne!(parsed.tool_calls[0].id, parsed.tool_calls[1].id);
    }

    #[test]
    fn empty_candidates_is_decode_error() {
        let resp: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            GeminiProvider::parse_response(resp),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn stream_extracts_candidate_text() {
        let out = sse::collect_text(
            &[
                b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\r\n\r\n",
                b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]},",
                b"\"finishReason\":\"STOP\"}]}\r\n\r\n",
            ],
            GeminiProvider::extract_delta,
        );
        assert_eq!(out, vec!["Hel", "lo"]);
    }
}
