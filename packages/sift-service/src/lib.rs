pub mod dedup;
pub mod enhance;
pub mod fusion;
pub mod hybrid;
pub mod lexical;
pub mod optimize;
pub mod pipeline;
pub mod relevance;
pub mod reorder;

mod error;

use std::{cmp::Ordering, future::Future, pin::Pin, sync::Arc, time::Duration};

pub use enhance::{EnhanceOptions, EnhancedQuery};
pub use error::{Error, Result};
pub use hybrid::{Bm25Searcher, HybridSearcher, KeywordOverlapSearcher, searcher_from_config};
pub use optimize::OptimizeOptions;
pub use pipeline::{PrepareRequest, PrepareResponse, StageCounts};
pub use reorder::ReorderStrategy;

use sift_config::{Config, LlmProviderConfig};
use sift_domain::Document;
use sift_providers::chat::{self, ChatRequest};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait TextGenerator
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a ChatRequest,
	) -> BoxFuture<'a, sift_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub generator: Arc<dyn TextGenerator>,
}

pub struct SiftService {
	pub cfg: Config,
	pub providers: Providers,
	pub searcher: Arc<dyn HybridSearcher>,
}

struct DefaultProviders;

impl TextGenerator for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a ChatRequest,
	) -> BoxFuture<'a, sift_providers::Result<String>> {
		Box::pin(chat::complete(cfg, request))
	}
}

impl Providers {
	pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
		Self { generator }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { generator: Arc::new(DefaultProviders) }
	}
}

impl SiftService {
	pub fn new(cfg: Config) -> Self {
		Self::with_providers(cfg, Providers::default())
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let searcher = searcher_from_config(&cfg);

		Self { cfg, providers, searcher }
	}

	/// Hybrid search over `documents`, boosting any `keywords` found in the content.
	pub fn search(
		&self,
		query: &str,
		documents: Vec<Document>,
		keywords: &[String],
		top_k: usize,
	) -> Vec<Document> {
		self.searcher.search_with_keyword_boost(
			query,
			documents,
			keywords,
			top_k,
			self.cfg.context.keyword_boost,
		)
	}

	/// Runs one generative call. Every failure mode resolves to `None` so callers can fall back.
	async fn generate_text(&self, request: &ChatRequest, purpose: &'static str) -> Option<String> {
		let Some(llm) = self.cfg.providers.llm.as_ref() else {
			tracing::debug!(purpose, "No LLM provider configured.");

			return None;
		};
		let timeout = Duration::from_millis(llm.timeout_ms);

		match tokio::time::timeout(timeout, self.providers.generator.generate(llm, request)).await
		{
			Ok(Ok(text)) => {
				let text = text.trim();

				if text.is_empty() {
					tracing::warn!(purpose, "Generator returned empty output. Using fallback.");

					return None;
				}

				Some(text.to_string())
			},
			Ok(Err(err)) => {
				tracing::warn!(error = %err, purpose, "Generation failed. Using fallback.");

				None
			},
			Err(_) => {
				tracing::warn!(
					purpose,
					timeout_ms = llm.timeout_ms,
					"Generation timed out. Using fallback."
				);

				None
			},
		}
	}
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
