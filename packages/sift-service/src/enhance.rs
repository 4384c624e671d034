use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use sift_providers::chat::ChatRequest;

use crate::SiftService;

const MULTI_QUERY_MAX_TOKENS: u32 = 500;
const HYDE_MAX_TOKENS: u32 = 400;
const HYDE_TEMPERATURE: f32 = 0.7;
const KEYWORDS_MAX_TOKENS: u32 = 100;
const KEYWORDS_TEMPERATURE: f32 = 0.1;

static LEADING_NUMBERING: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"^\d+[.)\-]\s*").ok());

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct EnhanceOptions {
	pub multi_query: bool,
	pub hyde: bool,
	pub keywords: bool,
}
impl Default for EnhanceOptions {
	fn default() -> Self {
		Self { multi_query: true, hyde: true, keywords: true }
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnhancedQuery {
	pub original: String,
	/// Always starts with the original query.
	pub variations: Vec<String>,
	pub hyde_doc: Option<String>,
	pub keywords: Vec<String>,
}

impl SiftService {
	/// Rewrites `query` into up to `num_variations` alternatives.
	pub async fn multi_query(&self, query: &str, num_variations: u32) -> Vec<String> {
		let request = build_multi_query_request(query, num_variations);

		match self.generate_text(&request, "multi_query").await {
			Some(raw) => parse_variations(query, &raw, num_variations as usize),
			None => vec![query.to_string()],
		}
	}

	/// Writes a hypothetical passage that would answer `query`.
	pub async fn hyde(&self, query: &str, domain: &str) -> String {
		let request = build_hyde_request(query, domain);

		self.generate_text(&request, "hyde").await.unwrap_or_else(|| query.to_string())
	}

	pub async fn extract_keywords(&self, query: &str, max_keywords: u32) -> Vec<String> {
		let request = build_keywords_request(query, max_keywords);

		match self.generate_text(&request, "keywords").await {
			Some(raw) => parse_keywords(&raw, max_keywords as usize),
			None => fallback_keywords(query, max_keywords as usize),
		}
	}

	pub async fn enhance(
		&self,
		query: &str,
		domain: Option<&str>,
		options: EnhanceOptions,
	) -> EnhancedQuery {
		let cfg = &self.cfg.enhancer;
		let domain = domain.unwrap_or(cfg.domain.as_str());
		let mut enhanced = EnhancedQuery {
			original: query.to_string(),
			variations: vec![query.to_string()],
			hyde_doc: None,
			keywords: Vec::new(),
		};

		if options.multi_query {
			enhanced.variations = self.multi_query(query, cfg.num_variations).await;
		}
		if options.hyde {
			enhanced.hyde_doc = Some(self.hyde(query, domain).await);
		}
		if options.keywords {
			enhanced.keywords = self.extract_keywords(query, cfg.max_keywords).await;
		}

		tracing::debug!(
			variations = enhanced.variations.len(),
			keywords = enhanced.keywords.len(),
			hyde = enhanced.hyde_doc.is_some(),
			"Query enhanced."
		);

		enhanced
	}
}

pub fn domain_context(domain: &str) -> &'static str {
	match domain.trim().to_ascii_lowercase().as_str() {
		"semiconductor" => "semiconductor technology and fabrication processes",
		"laborlaw" => "Korean labor and employment law",
		_ => "technical documentation",
	}
}

pub fn build_multi_query_request(query: &str, num_variations: u32) -> ChatRequest {
	let prompt = format!(
		"Rewrite the question below in {num_variations} different ways.\n\
Each rewrite must look for the same information using different wording or a different angle.\n\n\
Original question: {query}\n\n\
Rules:\n\
1. Write each rewrite on its own line.\n\
2. Do not add numbers, bullets, or commentary.\n\
3. Preserve the original meaning.\n\
4. For technical terms, include both the Korean and the English form.\n\n\
Rewritten questions:"
	);

	ChatRequest::user(prompt).with_max_tokens(MULTI_QUERY_MAX_TOKENS)
}

pub fn build_hyde_request(query: &str, domain: &str) -> ChatRequest {
	let context = domain_context(domain);
	let prompt = format!(
		"Write an excerpt from a document about {context} that answers the question below.\n\
The excerpt must read like a real document and be technically accurate and detailed.\n\n\
Question: {query}\n\n\
Hypothetical document excerpt (200-300 characters):"
	);

	ChatRequest::user(prompt).with_temperature(HYDE_TEMPERATURE).with_max_tokens(HYDE_MAX_TOKENS)
}

pub fn build_keywords_request(query: &str, max_keywords: u32) -> ChatRequest {
	let prompt = format!(
		"Extract the key terms from the question below.\n\
Prefer technical terms, proper nouns, and core concepts.\n\n\
Question: {query}\n\n\
Rules:\n\
1. List only the keywords, separated by commas.\n\
2. At most {max_keywords} keywords.\n\
3. Keep English technical terms as they are.\n\
4. Leave out Korean particles and stop words.\n\n\
Keywords:"
	);

	ChatRequest::user(prompt)
		.with_temperature(KEYWORDS_TEMPERATURE)
		.with_max_tokens(KEYWORDS_MAX_TOKENS)
}

/// Original query first, then at most `num_variations` cleaned lines that differ from it.
pub fn parse_variations(query: &str, raw: &str, num_variations: usize) -> Vec<String> {
	let mut out = vec![query.to_string()];

	for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()).take(num_variations) {
		let cleaned = strip_numbering(line);

		if !cleaned.is_empty() && cleaned != query {
			out.push(cleaned.to_string());
		}
	}

	out.truncate(num_variations + 1);

	out
}

pub fn parse_keywords(raw: &str, max_keywords: usize) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|keyword| !keyword.is_empty())
		.take(max_keywords)
		.map(str::to_string)
		.collect()
}

/// Whitespace-separated words longer than one character.
pub fn fallback_keywords(query: &str, max_keywords: usize) -> Vec<String> {
	query
		.split_whitespace()
		.filter(|word| word.chars().count() > 1)
		.take(max_keywords)
		.map(str::to_string)
		.collect()
}

fn strip_numbering(line: &str) -> &str {
	let Some(re) = LEADING_NUMBERING.as_ref() else {
		return line;
	};

	match re.find(line) {
		Some(found) => &line[found.end()..],
		None => line,
	}
}
