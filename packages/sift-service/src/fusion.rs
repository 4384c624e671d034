//! Reciprocal rank fusion of the vector ranking and the lexical ranking.

use std::collections::HashMap;

use sift_config::Fusion;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RrfParams {
	pub k: f32,
	pub vector_weight: f32,
	pub lexical_weight: f32,
}
impl Default for RrfParams {
	fn default() -> Self {
		Self { k: 60.0, vector_weight: 0.5, lexical_weight: 0.5 }
	}
}
impl From<&Fusion> for RrfParams {
	fn from(cfg: &Fusion) -> Self {
		Self { k: cfg.rrf_k, vector_weight: cfg.vector_weight, lexical_weight: cfg.bm25_weight }
	}
}

/// One entry of an input ranking. Rank is implied by position (1-based).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedEntry {
	/// Identity key. Entries with the same key are the same document.
	pub key: String,
	/// Position of the document in the caller's pool.
	pub doc_index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FusedCandidate {
	pub key: String,
	/// Pool index of the first occurrence of this identity.
	pub doc_index: usize,
	pub vector_rank: Option<u32>,
	pub lexical_rank: Option<u32>,
	pub fused_score: f32,
}

pub fn rrf_contribution(weight: f32, k: f32, rank: u32) -> f32 {
	weight / (k + rank as f32)
}

/// Merges both rankings. Each list contributes at most once per identity (its best rank), the
/// result is sorted by fused score descending, and ties keep first-seen order with the vector
/// list seen first.
pub fn reciprocal_rank_fusion(
	vector: &[RankedEntry],
	lexical: &[RankedEntry],
	params: RrfParams,
) -> Vec<FusedCandidate> {
	let mut candidates: Vec<FusedCandidate> = Vec::new();
	let mut by_key: HashMap<String, usize> = HashMap::new();

	for (source, list) in [(Source::Vector, vector), (Source::Lexical, lexical)] {
		for (idx, entry) in list.iter().enumerate() {
			let rank = idx as u32 + 1;
			let slot = *by_key.entry(entry.key.clone()).or_insert_with(|| {
				candidates.push(FusedCandidate {
					key: entry.key.clone(),
					doc_index: entry.doc_index,
					vector_rank: None,
					lexical_rank: None,
					fused_score: 0.0,
				});

				candidates.len() - 1
			});
			let candidate = &mut candidates[slot];
			let (rank_slot, weight) = match source {
				Source::Vector => (&mut candidate.vector_rank, params.vector_weight),
				Source::Lexical => (&mut candidate.lexical_rank, params.lexical_weight),
			};

			if rank_slot.is_some() {
				continue;
			}

			*rank_slot = Some(rank);
			candidate.fused_score += rrf_contribution(weight, params.k, rank);
		}
	}

	candidates.sort_by(|a, b| crate::cmp_f32_desc(a.fused_score, b.fused_score));

	candidates
}

#[derive(Clone, Copy)]
enum Source {
	Vector,
	Lexical,
}
