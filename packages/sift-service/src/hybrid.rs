use std::sync::Arc;

use sift_config::Config;
use sift_domain::{Document, similarity, tokenizer};

use crate::{
	fusion::{self, RankedEntry, RrfParams},
	lexical::{Bm25Index, Bm25Params},
	relevance,
};

/// Combines the upstream vector ranking with a lexical signal.
pub trait HybridSearcher
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	fn search(&self, query: &str, vector_results: Vec<Document>, top_k: usize) -> Vec<Document>;

	fn search_with_keyword_boost(
		&self,
		query: &str,
		vector_results: Vec<Document>,
		keywords: &[String],
		top_k: usize,
		keyword_boost: f32,
	) -> Vec<Document> {
		let results = self.search(query, vector_results, top_k);

		if keywords.is_empty() {
			return results;
		}

		apply_keyword_boost(results, keywords, keyword_boost, top_k)
	}
}

/// BM25 over the candidate pool, fused with the vector ranking by RRF.
#[derive(Clone, Debug, Default)]
pub struct Bm25Searcher {
	pub bm25: Bm25Params,
	pub rrf: RrfParams,
}
impl Bm25Searcher {
	pub fn new(bm25: Bm25Params, rrf: RrfParams) -> Self {
		Self { bm25, rrf }
	}
}

impl HybridSearcher for Bm25Searcher {
	fn name(&self) -> &'static str {
		"bm25"
	}

	fn search(&self, query: &str, vector_results: Vec<Document>, top_k: usize) -> Vec<Document> {
		if vector_results.is_empty() {
			return Vec::new();
		}

		let mut corpus = Vec::new();
		let mut corpus_docs = Vec::new();

		for (idx, doc) in vector_results.iter().enumerate() {
			if let Some(content) = doc.content() {
				corpus.push(tokenizer::tokenize(content));
				corpus_docs.push(idx);
			}
		}

		let index = Bm25Index::build(&corpus, self.bm25);
		let hits = index.search(&tokenizer::tokenize(query), vector_results.len());

		tracing::debug!(
			candidates = vector_results.len(),
			indexed = index.len(),
			lexical_hits = hits.len(),
			"Built call-scoped BM25 index."
		);

		if hits.is_empty() {
			return vector_only(vector_results, top_k);
		}

		let keys: Vec<String> = vector_results
			.iter()
			.enumerate()
			.map(|(idx, doc)| doc.identity_key().unwrap_or_else(|| format!("pos:{idx}")))
			.collect();
		let vector_list: Vec<RankedEntry> = keys
			.iter()
			.enumerate()
			.map(|(doc_index, key)| RankedEntry { key: key.clone(), doc_index })
			.collect();
		let lexical_list: Vec<RankedEntry> = hits
			.iter()
			.map(|(corpus_idx, _)| {
				let doc_index = corpus_docs[*corpus_idx];

				RankedEntry { key: keys[doc_index].clone(), doc_index }
			})
			.collect();
		let fused = fusion::reciprocal_rank_fusion(&vector_list, &lexical_list, self.rrf);
		let mut pool: Vec<Option<Document>> = vector_results.into_iter().map(Some).collect();
		let mut out = Vec::with_capacity(fused.len().min(top_k));

		for candidate in fused.into_iter().take(top_k) {
			let Some(mut doc) = pool.get_mut(candidate.doc_index).and_then(Option::take) else {
				continue;
			};

			doc.vector_rank = candidate.vector_rank;
			doc.lexical_rank = candidate.lexical_rank;
			doc.fused_score = Some(candidate.fused_score);

			out.push(doc);
		}

		out
	}
}

/// Fallback that blends the vector score with query word overlap.
#[derive(Clone, Debug)]
pub struct KeywordOverlapSearcher {
	pub keyword_weight: f32,
}
impl Default for KeywordOverlapSearcher {
	fn default() -> Self {
		Self { keyword_weight: 0.3 }
	}
}

impl HybridSearcher for KeywordOverlapSearcher {
	fn name(&self) -> &'static str {
		"keyword_overlap"
	}

	fn search(&self, query: &str, vector_results: Vec<Document>, top_k: usize) -> Vec<Document> {
		if vector_results.is_empty() {
			return Vec::new();
		}

		let query_words = similarity::word_set(query);
		let weight = self.keyword_weight;
		let mut docs = vector_results;

		for (idx, doc) in docs.iter_mut().enumerate() {
			let keyword_score = relevance::relevance_score(&query_words, doc.content());

			doc.vector_rank = Some(idx as u32 + 1);
			doc.keyword_score = Some(keyword_score);
			doc.fused_score = Some((1.0 - weight) * doc.score_or_zero() + weight * keyword_score);
		}

		docs.sort_by(|a, b| {
			crate::cmp_f32_desc(a.fused_score.unwrap_or(0.0), b.fused_score.unwrap_or(0.0))
		});
		docs.truncate(top_k);

		docs
	}
}

/// Adds `keyword_boost` per keyword found in the content and again when the content starts with
/// it, then re-sorts by the boosted score.
pub fn apply_keyword_boost(
	mut docs: Vec<Document>,
	keywords: &[String],
	keyword_boost: f32,
	top_k: usize,
) -> Vec<Document> {
	let keywords: Vec<String> = keywords
		.iter()
		.map(|keyword| keyword.trim().to_lowercase())
		.filter(|keyword| !keyword.is_empty())
		.collect();

	for doc in &mut docs {
		let content = doc.content().map(str::to_lowercase).unwrap_or_default();
		let mut boost = 0.0;

		for keyword in &keywords {
			if content.contains(keyword.as_str()) {
				boost += keyword_boost;

				if content.starts_with(keyword.as_str()) {
					boost += keyword_boost;
				}
			}
		}

		doc.keyword_boost = Some(boost);
		doc.boosted_score = Some(doc.fused_score.unwrap_or(0.0) + boost);
	}

	docs.sort_by(|a, b| {
		crate::cmp_f32_desc(a.boosted_score.unwrap_or(0.0), b.boosted_score.unwrap_or(0.0))
	});
	docs.truncate(top_k);

	docs
}

pub fn searcher_from_config(cfg: &Config) -> Arc<dyn HybridSearcher> {
	let keyword_overlap = || -> Arc<dyn HybridSearcher> {
		Arc::new(KeywordOverlapSearcher { keyword_weight: cfg.lexical.keyword_weight })
	};

	match cfg.lexical.backend.as_str() {
		"bm25" => Arc::new(Bm25Searcher::new(
			Bm25Params::from(&cfg.lexical),
			RrfParams::from(&cfg.fusion),
		)),
		"keyword_overlap" => {
			tracing::info!("Using keyword-overlap hybrid search.");

			keyword_overlap()
		},
		other => {
			tracing::warn!(
				backend = other,
				"Lexical backend is unavailable. Using keyword-overlap hybrid search."
			);

			keyword_overlap()
		},
	}
}

fn vector_only(mut docs: Vec<Document>, top_k: usize) -> Vec<Document> {
	for (idx, doc) in docs.iter_mut().enumerate() {
		doc.fused_score = Some(doc.score_or_zero());
		doc.vector_rank = Some(idx as u32 + 1);
		doc.lexical_rank = None;
	}

	docs.truncate(top_k);

	docs
}
