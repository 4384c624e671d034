use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sift_domain::Document;

use crate::{
	SiftService, dedup, relevance,
	reorder::{self, ReorderStrategy},
};

#[derive(Clone, Debug, Deserialize)]
pub struct PrepareRequest {
	pub query: String,
	pub documents: Vec<Document>,
	/// Caller-supplied boost keywords.
	#[serde(default)]
	pub keywords: Vec<String>,
	/// Ask the enhancer for extra keywords before searching.
	#[serde(default)]
	pub extract_keywords: bool,
	#[serde(default = "default_true")]
	pub dedupe: bool,
	#[serde(default)]
	pub extract_relevant: bool,
	/// Overrides `context.max_docs`.
	#[serde(default)]
	pub max_docs: Option<u32>,
	/// Overrides `context.reorder_strategy`.
	#[serde(default)]
	pub reorder_strategy: Option<ReorderStrategy>,
}
impl PrepareRequest {
	pub fn new(query: impl Into<String>, documents: Vec<Document>) -> Self {
		Self {
			query: query.into(),
			documents,
			keywords: Vec::new(),
			extract_keywords: false,
			dedupe: true,
			extract_relevant: false,
			max_docs: None,
			reorder_strategy: None,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
	pub input: usize,
	pub deduplicated: usize,
	pub truncated: usize,
	pub ranked: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct PrepareResponse {
	pub trace_id: Uuid,
	pub query: String,
	pub searcher: String,
	pub reorder_strategy: ReorderStrategy,
	/// Keywords that were applied as boosts.
	pub keywords: Vec<String>,
	pub stages: StageCounts,
	pub documents: Vec<Document>,
}

impl SiftService {
	/// Full context preparation: dedup, cap, condense, hybrid rank, score, reorder.
	pub async fn prepare(&self, req: PrepareRequest) -> PrepareResponse {
		let trace_id = Uuid::new_v4();
		let context = &self.cfg.context;
		let max_docs = req.max_docs.unwrap_or(context.max_docs) as usize;
		let strategy = req
			.reorder_strategy
			.unwrap_or_else(|| reorder::resolve_reorder_strategy(&context.reorder_strategy));
		let mut stages = StageCounts { input: req.documents.len(), ..Default::default() };
		let mut docs = if req.dedupe {
			dedup::deduplicate(req.documents, self.cfg.dedup.similarity_threshold)
		} else {
			req.documents
		};

		stages.deduplicated = docs.len();

		docs.truncate(max_docs);

		stages.truncated = docs.len();

		if req.extract_relevant {
			self.extract_relevant(&req.query, &mut docs).await;
		}

		let mut keywords = normalize_keywords(req.keywords);

		if req.extract_keywords {
			let extracted = self.extract_keywords(&req.query, self.cfg.enhancer.max_keywords).await;

			merge_keywords(&mut keywords, extracted);
		}

		let top_k = docs.len();
		let mut docs = self.search(&req.query, docs, &keywords, top_k);

		stages.ranked = docs.len();

		relevance::score_relevance(&req.query, &mut docs);

		let docs = reorder::reorder(docs, strategy);

		tracing::info!(
			%trace_id,
			searcher = self.searcher.name(),
			input = stages.input,
			deduplicated = stages.deduplicated,
			truncated = stages.truncated,
			ranked = stages.ranked,
			keywords = keywords.len(),
			"Context prepared."
		);

		PrepareResponse {
			trace_id,
			query: req.query,
			searcher: self.searcher.name().to_string(),
			reorder_strategy: strategy,
			keywords,
			stages,
			documents: docs,
		}
	}
}

fn default_true() -> bool {
	true
}

fn normalize_keywords(raw: Vec<String>) -> Vec<String> {
	let mut out = Vec::new();

	merge_keywords(&mut out, raw);

	out
}

/// Appends trimmed, non-empty keywords that are not already present (case-insensitive).
fn merge_keywords(keywords: &mut Vec<String>, extra: Vec<String>) {
	for keyword in extra {
		let keyword = keyword.trim();

		if keyword.is_empty() || keywords.iter().any(|seen| seen.eq_ignore_ascii_case(keyword)) {
			continue;
		}

		keywords.push(keyword.to_string());
	}
}
