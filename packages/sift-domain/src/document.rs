use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fingerprint;

/// A retrieved passage plus the ranking signals attached while it moves through the pipeline.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Document {
	/// Stable upstream identifier. Preferred over the content fingerprint when present.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default)]
	pub content: Option<String>,
	#[serde(default, alias = "source_file")]
	pub source: String,
	/// Similarity reported by the vector search service.
	#[serde(default)]
	pub score: Option<f32>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vector_rank: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lexical_rank: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fused_score: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub keyword_score: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relevance_score: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub keyword_boost: Option<f32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub boosted_score: Option<f32>,
}
impl Document {
	pub fn new(content: impl Into<String>, source: impl Into<String>, score: Option<f32>) -> Self {
		let content = content.into();
		let mut metadata = Map::new();

		metadata.insert("content".to_string(), Value::String(content.clone()));

		Self { content: Some(content), source: source.into(), score, metadata, ..Default::default() }
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());

		self
	}

	/// Canonical content: `metadata.content` when it is a non-empty string, else `content`.
	pub fn content(&self) -> Option<&str> {
		if let Some(Value::String(text)) = self.metadata.get("content")
			&& !text.is_empty()
		{
			return Some(text.as_str());
		}

		self.content.as_deref().filter(|text| !text.is_empty())
	}

	/// Replaces the canonical content, keeping the top-level field in sync.
	pub fn set_content(&mut self, content: String) {
		self.metadata.insert("content".to_string(), Value::String(content.clone()));
		self.content = Some(content);
	}

	pub fn score_or_zero(&self) -> f32 {
		self.score.unwrap_or(0.0)
	}

	/// Identity used when merging ranked lists. `None` means the document cannot be matched
	/// against any other document.
	pub fn identity_key(&self) -> Option<String> {
		if let Some(id) = self.id.as_deref().map(str::trim)
			&& !id.is_empty()
		{
			return Some(format!("id:{id}"));
		}

		self.content().map(|content| format!("fp:{}", fingerprint::content_fingerprint(content)))
	}
}
