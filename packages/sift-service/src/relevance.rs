use std::collections::HashSet;

use sift_domain::{Document, similarity};

/// Share of query words present in `content`. Missing content or an empty query scores 0.
pub fn relevance_score(query_words: &HashSet<String>, content: Option<&str>) -> f32 {
	let Some(content) = content else {
		return 0.0;
	};

	if query_words.is_empty() {
		return 0.0;
	}

	let content_words = similarity::word_set(content);
	let overlap = query_words.intersection(&content_words).count();

	overlap as f32 / query_words.len() as f32
}

pub fn score_relevance(query: &str, docs: &mut [Document]) {
	let query_words = similarity::word_set(query);

	for doc in docs {
		doc.relevance_score = Some(relevance_score(&query_words, doc.content()));
	}
}
