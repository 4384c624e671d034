mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, ContextWindow, Dedup, Enhancer, Fusion, Lexical, LlmProviderConfig, Providers, Service,
};

use std::{fs, path::Path};

pub const LEXICAL_BACKENDS: [&str; 2] = ["bm25", "keyword_overlap"];
pub const REORDER_STRATEGIES: [&str; 3] = ["best_first", "best_last", "lost_in_middle"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	for (label, value) in [
		("fusion.rrf_k", cfg.fusion.rrf_k),
		("fusion.vector_weight", cfg.fusion.vector_weight),
		("fusion.bm25_weight", cfg.fusion.bm25_weight),
		("lexical.k1", cfg.lexical.k1),
		("lexical.b", cfg.lexical.b),
		("lexical.epsilon", cfg.lexical.epsilon),
		("lexical.keyword_weight", cfg.lexical.keyword_weight),
		("dedup.similarity_threshold", cfg.dedup.similarity_threshold),
		("context.keyword_boost", cfg.context.keyword_boost),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if value < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if cfg.fusion.rrf_k <= 0.0 {
		return Err(Error::Validation {
			message: "fusion.rrf_k must be greater than zero.".to_string(),
		});
	}
	if cfg.fusion.vector_weight == 0.0 && cfg.fusion.bm25_weight == 0.0 {
		return Err(Error::Validation {
			message: "fusion.vector_weight and fusion.bm25_weight must not both be zero."
				.to_string(),
		});
	}
	if !LEXICAL_BACKENDS.contains(&cfg.lexical.backend.as_str()) {
		return Err(Error::Validation {
			message: "lexical.backend must be one of bm25 or keyword_overlap.".to_string(),
		});
	}

	for (label, value) in [
		("lexical.b", cfg.lexical.b),
		("lexical.keyword_weight", cfg.lexical.keyword_weight),
		("dedup.similarity_threshold", cfg.dedup.similarity_threshold),
	] {
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.context.max_docs == 0 {
		return Err(Error::Validation {
			message: "context.max_docs must be greater than zero.".to_string(),
		});
	}
	if !REORDER_STRATEGIES.contains(&cfg.context.reorder_strategy.as_str()) {
		return Err(Error::Validation {
			message:
				"context.reorder_strategy must be one of best_first, best_last, or lost_in_middle."
					.to_string(),
		});
	}
	if cfg.context.fallback_chars == 0 {
		return Err(Error::Validation {
			message: "context.fallback_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.context.extract_input_chars == 0 {
		return Err(Error::Validation {
			message: "context.extract_input_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.context.max_sentences == 0 {
		return Err(Error::Validation {
			message: "context.max_sentences must be greater than zero.".to_string(),
		});
	}
	if cfg.enhancer.num_variations == 0 {
		return Err(Error::Validation {
			message: "enhancer.num_variations must be greater than zero.".to_string(),
		});
	}
	if cfg.enhancer.max_keywords == 0 {
		return Err(Error::Validation {
			message: "enhancer.max_keywords must be greater than zero.".to_string(),
		});
	}

	if let Some(llm) = cfg.providers.llm.as_ref() {
		for (label, value) in [
			("providers.llm.api_base", &llm.api_base),
			("providers.llm.api_key", &llm.api_key),
			("providers.llm.model", &llm.model),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation { message: format!("{label} must be non-empty.") });
			}
		}

		if llm.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.llm.timeout_ms must be greater than zero.".to_string(),
			});
		}
		if !llm.temperature.is_finite() || !(0.0..=2.0).contains(&llm.temperature) {
			return Err(Error::Validation {
				message: "providers.llm.temperature must be in the range 0.0-2.0.".to_string(),
			});
		}

		for value in llm.default_headers.values() {
			if !value.is_string() {
				return Err(Error::Validation {
					message: "providers.llm.default_headers values must be strings.".to_string(),
				});
			}
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.lexical.backend = cfg.lexical.backend.trim().to_ascii_lowercase();
	cfg.context.reorder_strategy = cfg.context.reorder_strategy.trim().to_ascii_lowercase();

	if cfg.enhancer.domain.trim().is_empty() {
		cfg.enhancer.domain = "general".to_string();
	}
	if let Some(llm) = cfg.providers.llm.as_mut()
		&& llm.path.trim().is_empty()
	{
		llm.path = "/v1/chat/completions".to_string();
	}
}
