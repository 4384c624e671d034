use std::collections::HashMap;

use sift_config::Lexical;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bm25Params {
	pub k1: f32,
	pub b: f32,
	/// Negative IDF values are replaced by `epsilon * average_idf`.
	pub epsilon: f32,
}
impl Default for Bm25Params {
	fn default() -> Self {
		Self { k1: 1.5, b: 0.75, epsilon: 0.25 }
	}
}
impl From<&Lexical> for Bm25Params {
	fn from(cfg: &Lexical) -> Self {
		Self { k1: cfg.k1, b: cfg.b, epsilon: cfg.epsilon }
	}
}

/// BM25 Okapi index over a small, call-scoped corpus of pre-tokenized documents.
#[derive(Clone, Debug)]
pub struct Bm25Index {
	params: Bm25Params,
	term_freqs: Vec<HashMap<String, u32>>,
	doc_lens: Vec<u32>,
	avgdl: f32,
	idf: HashMap<String, f32>,
}
impl Bm25Index {
	pub fn build(corpus: &[Vec<String>], params: Bm25Params) -> Self {
		let mut term_freqs = Vec::with_capacity(corpus.len());
		let mut doc_lens = Vec::with_capacity(corpus.len());
		let mut doc_freqs: HashMap<String, u32> = HashMap::new();

		for tokens in corpus {
			let mut freqs: HashMap<String, u32> = HashMap::new();

			for token in tokens {
				*freqs.entry(token.clone()).or_insert(0) += 1;
			}
			for term in freqs.keys() {
				*doc_freqs.entry(term.clone()).or_insert(0) += 1;
			}

			doc_lens.push(tokens.len() as u32);
			term_freqs.push(freqs);
		}

		let total_len: u64 = doc_lens.iter().map(|len| u64::from(*len)).sum();
		let avgdl = if corpus.is_empty() { 0.0 } else { total_len as f32 / corpus.len() as f32 };
		let idf = compute_idf(&doc_freqs, corpus.len(), params.epsilon);

		Self { params, term_freqs, doc_lens, avgdl, idf }
	}

	pub fn len(&self) -> usize {
		self.doc_lens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.doc_lens.is_empty()
	}

	/// IDF of `term`, after the epsilon floor. Unknown terms have an IDF of zero.
	pub fn idf(&self, term: &str) -> f32 {
		self.idf.get(term).copied().unwrap_or(0.0)
	}

	/// One score per document, in corpus order. Repeated query tokens contribute once per
	/// occurrence.
	pub fn scores(&self, query: &[String]) -> Vec<f32> {
		let Bm25Params { k1, b, .. } = self.params;

		self.term_freqs
			.iter()
			.zip(&self.doc_lens)
			.map(|(freqs, doc_len)| {
				let norm = k1 * (1.0 - b + b * *doc_len as f32 / self.avgdl);

				query
					.iter()
					.filter_map(|term| {
						let tf = *freqs.get(term)? as f32;

						Some(self.idf(term) * (tf * (k1 + 1.0)) / (tf + norm))
					})
					.sum::<f32>()
			})
			.collect()
	}

	/// Top `top_k` `(doc_index, score)` pairs by descending score. Ties keep corpus order.
	pub fn search(&self, query: &[String], top_k: usize) -> Vec<(usize, f32)> {
		let mut ranked: Vec<(usize, f32)> = self.scores(query).into_iter().enumerate().collect();

		ranked.sort_by(|a, b| crate::cmp_f32_desc(a.1, b.1));
		ranked.truncate(top_k);

		ranked
	}
}

fn compute_idf(
	doc_freqs: &HashMap<String, u32>,
	doc_count: usize,
	epsilon: f32,
) -> HashMap<String, f32> {
	let n = doc_count as f32;
	let mut idf: HashMap<String, f32> = doc_freqs
		.iter()
		.map(|(term, df)| {
			let df = *df as f32;

			(term.clone(), (n - df + 0.5).ln() - (df + 0.5).ln())
		})
		.collect();

	if idf.is_empty() {
		return idf;
	}

	let average_idf = idf.values().sum::<f32>() / idf.len() as f32;
	let floor = epsilon * average_idf;

	for value in idf.values_mut() {
		if *value < 0.0 {
			*value = floor;
		}
	}

	idf
}
