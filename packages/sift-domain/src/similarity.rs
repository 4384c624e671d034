use std::collections::HashSet;

/// Lowercased whitespace-split word set.
pub fn word_set(text: &str) -> HashSet<String> {
	text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Overlapping character n-grams of the lowercased text, whitespace included.
pub fn char_ngrams(text: &str, n: usize) -> HashSet<String> {
	let chars: Vec<char> = text.to_lowercase().chars().collect();

	if n == 0 || chars.len() < n {
		return HashSet::new();
	}

	chars.windows(n).map(|window| window.iter().collect()).collect()
}

/// Jaccard index of two sets. Either side being empty yields 0.
pub fn jaccard(left: &HashSet<String>, right: &HashSet<String>) -> f32 {
	if left.is_empty() || right.is_empty() {
		return 0.0;
	}

	let intersection = left.intersection(right).count();
	let union = left.len() + right.len() - intersection;

	intersection as f32 / union as f32
}

/// Precomputed word and trigram sets for repeated pairwise comparison.
#[derive(Clone, Debug)]
pub struct TextSignature {
	words: HashSet<String>,
	trigrams: HashSet<String>,
}
impl TextSignature {
	pub fn new(text: &str) -> Self {
		Self { words: word_set(text), trigrams: char_ngrams(text, 3) }
	}

	/// Mean of word-level and trigram-level Jaccard similarity, in `0.0..=1.0`.
	pub fn similarity(&self, other: &Self) -> f32 {
		(jaccard(&self.words, &other.words) + jaccard(&self.trigrams, &other.trigrams)) / 2.0
	}
}
