use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::{Map, Value};

use sift_config::{Config, LlmProviderConfig};
use sift_domain::Document;
use sift_providers::{Error as ProviderError, Result as ProviderResult, chat::ChatRequest};
use sift_service::{
	BoxFuture, Bm25Searcher, EnhanceOptions, HybridSearcher, OptimizeOptions, PrepareRequest,
	Providers, ReorderStrategy, SiftService, TextGenerator,
};

type Reply = Box<dyn Fn(&ChatRequest) -> String + Send + Sync>;

struct ScriptedGenerator {
	calls: Arc<AtomicUsize>,
	reply: Reply,
}
impl ScriptedGenerator {
	fn new(reply: impl Fn(&ChatRequest) -> String + Send + Sync + 'static) -> Self {
		Self { calls: Arc::new(AtomicUsize::new(0)), reply: Box::new(reply) }
	}
}
impl TextGenerator for ScriptedGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		request: &'a ChatRequest,
	) -> BoxFuture<'a, ProviderResult<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let text = (self.reply)(request);

		Box::pin(async move { Ok(text) })
	}
}

struct FailingGenerator;
impl TextGenerator for FailingGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_request: &'a ChatRequest,
	) -> BoxFuture<'a, ProviderResult<String>> {
		Box::pin(async move {
			Err(ProviderError::InvalidResponse { message: "upstream unavailable".to_string() })
		})
	}
}

struct SlowGenerator;
impl TextGenerator for SlowGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_request: &'a ChatRequest,
	) -> BoxFuture<'a, ProviderResult<String>> {
		Box::pin(async move {
			tokio::time::sleep(Duration::from_secs(5)).await;

			Ok("too late".to_string())
		})
	}
}

fn llm(timeout_ms: u64) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://localhost".to_string(),
		api_key: "key".to_string(),
		path: "/v1/chat/completions".to_string(),
		model: "m".to_string(),
		temperature: 0.3,
		timeout_ms,
		default_headers: Map::new(),
	}
}

fn config_with_llm() -> Config {
	let mut cfg = Config::default();

	cfg.providers.llm = Some(llm(1_000));

	cfg
}

fn service_with(cfg: Config, generator: Arc<dyn TextGenerator>) -> SiftService {
	SiftService::with_providers(cfg, Providers::new(generator))
}

fn corpus() -> Vec<Document> {
	vec![
		Document::new("CVD는 화학 기상 증착 공정입니다.", "doc1", Some(0.9)),
		Document::new("PVD는 물리 기상 증착 공정입니다.", "doc2", Some(0.85)),
		Document::new("반도체 제조에서 CVD가 널리 사용됩니다.", "doc3", Some(0.8)),
		Document::new("CVD 공정의 장점은 균일한 박막 형성입니다.", "doc4", Some(0.75)),
		Document::new("PECVD는 플라즈마 enhanced CVD입니다.", "doc5", Some(0.7)),
	]
}

#[tokio::test]
async fn multi_query_keeps_original_first() {
	let generator = Arc::new(ScriptedGenerator::new(|_| {
		"1. 화학 기상 증착이란?\n2. CVD 공정이란?\n3) Chemical vapor deposition?".to_string()
	}));
	let service = service_with(config_with_llm(), generator.clone());
	let variations = service.multi_query("CVD 공정이란?", 3).await;

	assert_eq!(
		variations,
		vec!["CVD 공정이란?", "화학 기상 증착이란?", "Chemical vapor deposition?"]
	);
	assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_provider_uses_fallbacks_without_calling_generator() {
	let generator = Arc::new(ScriptedGenerator::new(|_| "unused".to_string()));
	let service = service_with(Config::default(), generator.clone());

	assert_eq!(service.multi_query("CVD 공정", 3).await, vec!["CVD 공정"]);
	assert_eq!(service.hyde("CVD 공정", "semiconductor").await, "CVD 공정");
	assert_eq!(service.extract_keywords("CVD 공정 a", 5).await, vec!["CVD", "공정"]);
	assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generator_errors_fall_back() {
	let service = service_with(config_with_llm(), Arc::new(FailingGenerator));

	assert_eq!(service.multi_query("q1 q2", 3).await, vec!["q1 q2"]);
	assert_eq!(service.hyde("q1 q2", "laborlaw").await, "q1 q2");
	assert_eq!(service.extract_keywords("q1 q2", 1).await, vec!["q1"]);
}

#[tokio::test]
async fn slow_generator_times_out() {
	let mut cfg = Config::default();

	cfg.providers.llm = Some(llm(20));

	let service = service_with(cfg, Arc::new(SlowGenerator));

	assert_eq!(service.multi_query("etch rate", 3).await, vec!["etch rate"]);
}

#[tokio::test]
async fn blank_generator_output_falls_back() {
	let service =
		service_with(config_with_llm(), Arc::new(ScriptedGenerator::new(|_| "  \n".to_string())));

	assert_eq!(service.hyde("wafer", "general").await, "wafer");
}

#[tokio::test]
async fn enhance_collects_every_component() {
	let generator = Arc::new(ScriptedGenerator::new(|request| match request.max_tokens {
		Some(400) => "CVD is a deposition process.".to_string(),
		Some(100) => "CVD, 증착, 박막".to_string(),
		_ => "화학 기상 증착".to_string(),
	}));
	let service = service_with(config_with_llm(), generator.clone());
	let enhanced =
		service.enhance("CVD 공정이란?", Some("semiconductor"), EnhanceOptions::default()).await;

	assert_eq!(enhanced.original, "CVD 공정이란?");
	assert_eq!(enhanced.variations, vec!["CVD 공정이란?", "화학 기상 증착"]);
	assert_eq!(enhanced.hyde_doc.as_deref(), Some("CVD is a deposition process."));
	assert_eq!(enhanced.keywords, vec!["CVD", "증착", "박막"]);
	assert_eq!(generator.calls.load(Ordering::SeqCst), 3);

	let skipped = service
		.enhance(
			"CVD 공정이란?",
			None,
			EnhanceOptions { multi_query: false, hyde: false, keywords: false },
		)
		.await;

	assert_eq!(skipped.variations, vec!["CVD 공정이란?"]);
	assert_eq!(skipped.hyde_doc, None);
	assert!(skipped.keywords.is_empty());
	assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn optimize_with_all_steps_disabled_only_truncates() {
	let service = SiftService::new(Config::default());
	let options =
		OptimizeOptions { dedupe: false, extract_relevant: false, reorder: false, max_docs: 3 };
	let out = service.optimize("CVD", corpus(), options).await;
	let sources: Vec<&str> = out.iter().map(|d| d.source.as_str()).collect();

	assert_eq!(sources, vec!["doc1", "doc2", "doc3"]);
	assert!(out.iter().all(|d| d.relevance_score.is_some()));
}

#[tokio::test]
async fn optimize_dedupes_and_reorders() {
	let service = SiftService::new(Config::default());
	let mut docs = corpus();

	docs.push(Document::new("CVD는 화학 기상 증착 공정입니다.", "dup", Some(0.1)));

	let out = service
		.optimize("CVD 공정", docs, OptimizeOptions::from_config(&service.cfg.context))
		.await;
	let sources: Vec<&str> = out.iter().map(|d| d.source.as_str()).collect();

	assert_eq!(sources, vec!["doc1", "doc3", "doc5", "doc4", "doc2"]);
}

#[tokio::test]
async fn optimize_replaces_content_with_extracted_sentences() {
	let generator = Arc::new(ScriptedGenerator::new(|_| "extracted sentence".to_string()));
	let service = service_with(config_with_llm(), generator.clone());
	let options =
		OptimizeOptions { dedupe: false, extract_relevant: true, reorder: false, max_docs: 2 };
	let out = service.optimize("CVD", corpus(), options).await;

	assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
	assert_eq!(out[0].content(), Some("extracted sentence"));
	assert_eq!(
		out[0].metadata.get("original_content"),
		Some(&Value::String("CVD는 화학 기상 증착 공정입니다.".to_string()))
	);
}

#[tokio::test]
async fn extraction_is_skipped_without_provider() {
	let service = SiftService::new(Config::default());
	let options =
		OptimizeOptions { dedupe: false, extract_relevant: true, reorder: false, max_docs: 1 };
	let out = service.optimize("CVD", corpus(), options).await;

	assert_eq!(out[0].content(), Some("CVD는 화학 기상 증착 공정입니다."));
	assert!(out[0].metadata.get("original_content").is_none());
}

#[tokio::test]
async fn extraction_failure_truncates_content() {
	let mut cfg = config_with_llm();

	cfg.context.fallback_chars = 3;

	let service = service_with(cfg, Arc::new(FailingGenerator));

	assert_eq!(service.extract_relevant_sentences("q", "반도체공정").await, "반도체");
}

#[tokio::test]
async fn no_relevant_content_marker_truncates_content() {
	let service = service_with(
		config_with_llm(),
		Arc::new(ScriptedGenerator::new(|_| "NO_RELEVANT_CONTENT".to_string())),
	);
	let long = "가".repeat(800);
	let extracted = service.extract_relevant_sentences("q", &long).await;

	assert_eq!(extracted.chars().count(), 500);
}

#[test]
fn bm25_fusion_scores_match_ranks() {
	let searcher = Bm25Searcher::default();
	let out = searcher.search("CVD 공정이란?", corpus(), 5);

	assert_eq!(out.len(), 5);

	for doc in &out {
		let vector_rank = doc.vector_rank.expect("vector rank") as f32;
		let lexical = doc.lexical_rank.map(|rank| 0.5 / (60.0 + rank as f32)).unwrap_or(0.0);
		let expected = 0.5 / (60.0 + vector_rank) + lexical;
		let fused = doc.fused_score.expect("fused score");

		assert!((fused - expected).abs() < 1e-6, "{} != {expected}", fused);
	}

	for pair in out.windows(2) {
		assert!(pair[0].fused_score >= pair[1].fused_score);
	}
}

#[test]
fn bm25_search_truncates_to_top_k() {
	let out = Bm25Searcher::default().search("CVD", corpus(), 2);

	assert_eq!(out.len(), 2);
}

#[test]
fn service_search_applies_keyword_boost() {
	let service = SiftService::new(Config::default());
	let out = service.search("증착", corpus(), &["pecvd".to_string()], 5);

	assert_eq!(out[0].source, "doc5");
	assert!((out[0].keyword_boost.unwrap_or_default() - 0.2).abs() < 1e-6);
	assert!(out.iter().all(|d| d.boosted_score.is_some()));
}

#[tokio::test]
async fn prepare_runs_the_full_pipeline() {
	let generator = Arc::new(ScriptedGenerator::new(|_| "CVD, 공정".to_string()));
	let service = service_with(config_with_llm(), generator.clone());
	let mut docs = corpus();

	docs.push(Document::new("CVD는 화학 기상 증착 공정입니다.", "dup", Some(0.95)));

	let mut req = PrepareRequest::new("CVD 공정이란?", docs);

	req.keywords = vec!["cvd".to_string()];
	req.extract_keywords = true;
	req.max_docs = Some(4);
	req.reorder_strategy = Some(ReorderStrategy::BestFirst);

	let report = service.prepare(req).await;

	assert!(!report.trace_id.is_nil());
	assert_eq!(report.searcher, "bm25");
	assert_eq!(report.keywords, vec!["cvd", "공정"]);
	assert_eq!(report.stages.input, 6);
	assert_eq!(report.stages.deduplicated, 5);
	assert_eq!(report.stages.truncated, 4);
	assert_eq!(report.stages.ranked, 4);
	assert_eq!(report.documents.len(), 4);
	assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
	assert!(report.documents.iter().all(|d| d.source != "doc1"));

	for pair in report.documents.windows(2) {
		assert!(pair[0].boosted_score >= pair[1].boosted_score);
	}
	for doc in &report.documents {
		assert!(doc.fused_score.is_some());
		assert!(doc.relevance_score.is_some());
	}
}

#[tokio::test]
async fn prepare_on_empty_input_is_empty() {
	let service = SiftService::new(Config::default());
	let report = service.prepare(PrepareRequest::new("q", Vec::new())).await;

	assert!(report.documents.is_empty());
	assert_eq!(report.stages.input, 0);
	assert_eq!(report.reorder_strategy, ReorderStrategy::LostInMiddle);
}
