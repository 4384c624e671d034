use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub providers: Providers,
	#[serde(default)]
	pub fusion: Fusion,
	#[serde(default)]
	pub lexical: Lexical,
	#[serde(default)]
	pub dedup: Dedup,
	#[serde(default)]
	pub context: ContextWindow,
	#[serde(default)]
	pub enhancer: Enhancer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Providers {
	/// Optional. Absence disables every generative step and selects the deterministic fallbacks.
	pub llm: Option<LlmProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Fusion {
	/// Smoothing constant added to every rank before taking the reciprocal.
	pub rrf_k: f32,
	pub vector_weight: f32,
	pub bm25_weight: f32,
}
impl Default for Fusion {
	fn default() -> Self {
		Self { rrf_k: 60.0, vector_weight: 0.5, bm25_weight: 0.5 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Lexical {
	/// One of "bm25" or "keyword_overlap".
	pub backend: String,
	pub k1: f32,
	pub b: f32,
	/// Floor applied to negative IDF values, as a fraction of the average IDF.
	pub epsilon: f32,
	/// Share of the keyword-overlap score in the fallback searcher's hybrid score.
	pub keyword_weight: f32,
}
impl Default for Lexical {
	fn default() -> Self {
		Self {
			backend: "bm25".to_string(),
			k1: 1.5,
			b: 0.75,
			epsilon: 0.25,
			keyword_weight: 0.3,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Dedup {
	pub similarity_threshold: f32,
}
impl Default for Dedup {
	fn default() -> Self {
		Self { similarity_threshold: 0.85 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextWindow {
	pub max_docs: u32,
	/// One of "best_first", "best_last", or "lost_in_middle".
	pub reorder_strategy: String,
	pub keyword_boost: f32,
	/// Length of the truncated excerpt used when relevant-sentence extraction is unavailable.
	pub fallback_chars: u32,
	pub extract_input_chars: u32,
	pub max_sentences: u32,
}
impl Default for ContextWindow {
	fn default() -> Self {
		Self {
			max_docs: 10,
			reorder_strategy: "lost_in_middle".to_string(),
			keyword_boost: 0.1,
			fallback_chars: 1_000,
			extract_input_chars: 2_000,
			max_sentences: 5,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Enhancer {
	pub num_variations: u32,
	pub max_keywords: u32,
	pub domain: String,
}
impl Default for Enhancer {
	fn default() -> Self {
		Self { num_variations: 3, max_keywords: 5, domain: "general".to_string() }
	}
}
