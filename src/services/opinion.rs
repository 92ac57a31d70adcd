//! Directional outlook retrieval from a chat-completions LLM endpoint,
//! plus raw-response persistence for per-run audit.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Name of the function the model is forced to call with its outlook.
const OUTLOOK_TOOL: &str = "record_outlook";

#[derive(Debug, Error)]
pub enum OpinionError {
    #[error("opinion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("opinion response unusable: {0}")]
    Malformed(String),
    #[error("failed to persist opinion response: {0}")]
    Persist(#[from] std::io::Error),
}

/// A directional opinion with its reasoning and the raw API response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outlook {
    /// Free-form directional string; normalized downstream.
    pub interpretation: String,
    pub reasoning: String,
    /// Raw response body as returned by the API, kept for audit.
    #[serde(default)]
    pub raw: Value,
}

/// Produces the primary directional opinion for one cycle.
#[async_trait]
pub trait OpinionSource: Send + Sync {
    async fn request_outlook(&self, prompt: &str, topic: &str) -> Result<Outlook, OpinionError>;

    /// Persist the outlook under the run's audit trail. Best-effort at call
    /// sites: a persistence failure never aborts the cycle.
    async fn save_response(&self, outlook: &Outlook, run_name: &str) -> Result<(), OpinionError>;
}

pub struct OpinionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    responses_dir: PathBuf,
}

impl OpinionClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(
            DEFAULT_CHAT_COMPLETIONS_URL,
            api_key,
            reqwest::Client::new(),
        )
    }

    /// Build against a custom endpoint, used by tests to point at a mock
    /// server.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            responses_dir: PathBuf::from("responses"),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Redirect the audit trail away from the default `responses/` directory.
    pub fn with_responses_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.responses_dir = dir.into();
        self
    }

    fn request_body(&self, prompt: &str, topic: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "tools": [{
                "type": "function",
                "function": {
                    "name": OUTLOOK_TOOL,
                    "description": format!("Record the 24h outlook for {topic}"),
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "outlook": {
                                "type": "string",
                                "enum": ["Bullish", "Bearish", "Neutral"]
                            },
                            "reasoning": { "type": "string" }
                        },
                        "required": ["outlook", "reasoning"]
                    }
                }
            }],
            "tool_choice": {
                "type": "function",
                "function": { "name": OUTLOOK_TOOL }
            }
        })
    }
}

/// Arguments the model supplies through the forced tool call.
#[derive(Debug, Deserialize)]
struct OutlookArguments {
    outlook: String,
    reasoning: String,
}

#[async_trait]
impl OpinionSource for OpinionClient {
    async fn request_outlook(&self, prompt: &str, topic: &str) -> Result<Outlook, OpinionError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, topic))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        let arguments_raw = body
            .pointer("/choices/0/message/tool_calls/0/function/arguments")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                OpinionError::Malformed("response carries no outlook tool call".to_string())
            })?;
        let arguments: OutlookArguments = serde_json::from_str(arguments_raw)
            .map_err(|e| OpinionError::Malformed(format!("bad tool call arguments: {e}")))?;

        Ok(Outlook {
            interpretation: arguments.outlook,
            reasoning: arguments.reasoning,
            raw: body,
        })
    }

    async fn save_response(&self, outlook: &Outlook, run_name: &str) -> Result<(), OpinionError> {
        tokio::fs::create_dir_all(&self.responses_dir).await?;
        let path = self.responses_dir.join(format!("{run_name}.jsonl"));
        let record = json!({
            "recorded_at": Utc::now().to_rfc3339(),
            "run": run_name,
            "outlook": outlook,
        });
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(format!("{record}\n").as_bytes()).await?;
        Ok(())
    }
}
