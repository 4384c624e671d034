use serde::Deserialize;
use serde_json::Value;

use sift_config::ContextWindow;
use sift_domain::Document;
use sift_providers::chat::ChatRequest;

use crate::{
	SiftService, dedup, relevance,
	reorder::{self, ReorderStrategy},
};

/// Replies containing one of these markers mean the generator found nothing relevant.
const NO_RELEVANT_CONTENT_MARKERS: [&str; 2] = ["NO_RELEVANT_CONTENT", "관련 내용 없음"];
const NO_RELEVANT_CONTENT_CHARS: usize = 500;
const EXTRACT_TEMPERATURE: f32 = 0.1;
const EXTRACT_MAX_TOKENS: u32 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct OptimizeOptions {
	pub dedupe: bool,
	pub extract_relevant: bool,
	pub reorder: bool,
	pub max_docs: usize,
}
impl OptimizeOptions {
	pub fn from_config(cfg: &ContextWindow) -> Self {
		Self {
			dedupe: true,
			extract_relevant: false,
			reorder: true,
			max_docs: cfg.max_docs as usize,
		}
	}
}

impl SiftService {
	/// Deduplicate, cap, optionally condense, score, and optionally reorder `docs`.
	pub async fn optimize(
		&self,
		query: &str,
		docs: Vec<Document>,
		options: OptimizeOptions,
	) -> Vec<Document> {
		if docs.is_empty() {
			return Vec::new();
		}

		let input = docs.len();
		let mut docs = if options.dedupe {
			dedup::deduplicate(docs, self.cfg.dedup.similarity_threshold)
		} else {
			docs
		};
		let deduplicated = docs.len();

		docs.truncate(options.max_docs);

		if options.extract_relevant {
			self.extract_relevant(query, &mut docs).await;
		}

		relevance::score_relevance(query, &mut docs);

		if options.reorder {
			docs = reorder::reorder(docs, ReorderStrategy::LostInMiddle);
		}

		tracing::info!(input, deduplicated, output = docs.len(), "Context optimized.");

		docs
	}

	/// Replaces each document's content with the sentences most relevant to `query`.
	///
	/// Skipped when no generator is configured. The previous content is kept under
	/// `metadata.original_content`.
	pub(crate) async fn extract_relevant(&self, query: &str, docs: &mut [Document]) {
		if self.cfg.providers.llm.is_none() {
			tracing::debug!("No LLM provider configured. Skipping relevant-sentence extraction.");

			return;
		}

		for doc in docs.iter_mut() {
			let Some(content) = doc.content().map(str::to_string) else {
				continue;
			};
			let extracted = self.extract_relevant_sentences(query, &content).await;

			doc.metadata.insert("original_content".to_string(), Value::String(content));
			doc.set_content(extracted);
		}
	}

	/// Falls back to a truncated excerpt whenever the generator fails.
	pub async fn extract_relevant_sentences(&self, query: &str, content: &str) -> String {
		let cfg = &self.cfg.context;
		let request = build_extract_request(
			query,
			truncate_chars(content, cfg.extract_input_chars as usize),
			cfg.max_sentences,
		);

		match self.generate_text(&request, "extract_relevant").await {
			Some(extracted)
				if NO_RELEVANT_CONTENT_MARKERS.iter().any(|marker| extracted.contains(marker)) =>
				truncate_chars(content, NO_RELEVANT_CONTENT_CHARS).to_string(),
			Some(extracted) => extracted,
			None => truncate_chars(content, cfg.fallback_chars as usize).to_string(),
		}
	}
}

pub fn build_extract_request(query: &str, content: &str, max_sentences: u32) -> ChatRequest {
	let prompt = format!(
		"Extract only the sentences from the document below that are most relevant to the question.\n\n\
Question: {query}\n\n\
Document:\n{content}\n\n\
Rules:\n\
1. Extract at most {max_sentences} sentences.\n\
2. Order them from most to least relevant.\n\
3. Return only the extracted sentences, without explanations.\n\
4. If nothing is relevant, return exactly {marker}.\n\n\
Relevant sentences:",
		marker = NO_RELEVANT_CONTENT_MARKERS[0],
	);

	ChatRequest::user(prompt)
		.with_temperature(EXTRACT_TEMPERATURE)
		.with_max_tokens(EXTRACT_MAX_TOKENS)
}

/// Prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}
