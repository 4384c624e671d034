use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

/// One chat-completions call. `temperature` overrides the provider default when set.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ChatRequest {
	pub messages: Vec<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub temperature: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_tokens: Option<u32>,
}
impl ChatRequest {
	pub fn user(prompt: impl Into<String>) -> Self {
		Self {
			messages: vec![serde_json::json!({ "role": "user", "content": prompt.into() })],
			..Default::default()
		}
	}

	pub fn with_temperature(mut self, temperature: f32) -> Self {
		self.temperature = Some(temperature);

		self
	}

	pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
		self.max_tokens = Some(max_tokens);

		self
	}
}

pub async fn complete(
	cfg: &sift_config::LlmProviderConfig,
	request: &ChatRequest,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base.trim_end_matches('/'), cfg.path);
	let body = build_body(cfg, request);
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_chat_response(&json)
}

fn build_body(cfg: &sift_config::LlmProviderConfig, request: &ChatRequest) -> Value {
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": request.temperature.unwrap_or(cfg.temperature),
		"messages": request.messages,
	});

	if let Some(max_tokens) = request.max_tokens {
		body["max_tokens"] = Value::from(max_tokens);
	}

	body
}

fn parse_chat_response(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(|content| content.trim().to_string())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing choices[0].message.content.".to_string(),
		})
}
