use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use sift_domain::Document;
use sift_service::{EnhanceOptions, OptimizeOptions, PrepareRequest, ReorderStrategy, SiftService};

#[derive(Debug, Parser)]
#[command(
	version = sift_cli::VERSION,
	rename_all = "kebab",
	styles = sift_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Fuse the vector ranking with a lexical ranking.
	Search {
		#[command(flatten)]
		input: QueryInput,
		/// Boost documents containing this keyword. Repeatable.
		#[arg(long = "keyword", value_name = "WORD")]
		keywords: Vec<String>,
		#[arg(long, value_name = "N")]
		top_k: Option<usize>,
	},
	/// Deduplicate, cap, score, and reorder documents.
	Optimize {
		#[command(flatten)]
		input: QueryInput,
		#[arg(long)]
		no_dedupe: bool,
		/// Condense each document to its most relevant sentences.
		#[arg(long)]
		extract: bool,
		#[arg(long)]
		no_reorder: bool,
		#[arg(long, value_name = "N")]
		max_docs: Option<u32>,
	},
	/// Run the full preparation pipeline.
	Prepare {
		#[command(flatten)]
		input: QueryInput,
		#[arg(long = "keyword", value_name = "WORD")]
		keywords: Vec<String>,
		/// Ask the generator for additional boost keywords.
		#[arg(long)]
		enhance_keywords: bool,
		#[arg(long)]
		no_dedupe: bool,
		#[arg(long)]
		extract: bool,
		#[arg(long, value_name = "N")]
		max_docs: Option<u32>,
		/// One of best_first, best_last, or lost_in_middle.
		#[arg(long, value_name = "NAME")]
		strategy: Option<String>,
	},
	/// Generate query variations, a hypothetical passage, and keywords.
	Enhance {
		#[arg(long, short = 'q')]
		query: String,
		#[arg(long)]
		domain: Option<String>,
		#[arg(long)]
		no_multi_query: bool,
		#[arg(long)]
		no_hyde: bool,
		#[arg(long)]
		no_keywords: bool,
	},
}

#[derive(Debug, clap::Args)]
pub struct QueryInput {
	#[arg(long, short = 'q')]
	pub query: String,
	/// JSON array of documents, or an object with a `documents` array.
	#[arg(long, short = 'd', value_name = "FILE")]
	pub documents: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DocumentsFile {
	List(Vec<Document>),
	Wrapped { documents: Vec<Document> },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let service = SiftService::new(config);
	let output = execute(&service, args.command).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

async fn execute(service: &SiftService, command: Command) -> color_eyre::Result<Value> {
	let output = match command {
		Command::Search { input, keywords, top_k } => {
			let documents = load_documents(&input.documents)?;
			let top_k = top_k.unwrap_or(service.cfg.context.max_docs as usize);

			serde_json::to_value(service.search(&input.query, documents, &keywords, top_k))?
		},
		Command::Optimize { input, no_dedupe, extract, no_reorder, max_docs } => {
			let documents = load_documents(&input.documents)?;
			let mut options = OptimizeOptions::from_config(&service.cfg.context);

			options.dedupe = !no_dedupe;
			options.extract_relevant = extract;
			options.reorder = !no_reorder;

			if let Some(max_docs) = max_docs {
				options.max_docs = max_docs as usize;
			}

			serde_json::to_value(service.optimize(&input.query, documents, options).await)?
		},
		Command::Prepare {
			input,
			keywords,
			enhance_keywords,
			no_dedupe,
			extract,
			max_docs,
			strategy,
		} => {
			let documents = load_documents(&input.documents)?;
			let mut req = PrepareRequest::new(input.query, documents);

			req.keywords = keywords;
			req.extract_keywords = enhance_keywords;
			req.dedupe = !no_dedupe;
			req.extract_relevant = extract;
			req.max_docs = max_docs;
			req.reorder_strategy =
				strategy.as_deref().map(str::parse::<ReorderStrategy>).transpose()?;

			serde_json::to_value(service.prepare(req).await)?
		},
		Command::Enhance { query, domain, no_multi_query, no_hyde, no_keywords } => {
			let options = EnhanceOptions {
				multi_query: !no_multi_query,
				hyde: !no_hyde,
				keywords: !no_keywords,
			};

			serde_json::to_value(service.enhance(&query, domain.as_deref(), options).await)?
		},
	};

	Ok(output)
}

fn load_documents(path: &Path) -> color_eyre::Result<Vec<Document>> {
	let raw = fs::read_to_string(path)?;
	let documents = parse_documents(&raw)?;

	tracing::debug!(path = %path.display(), documents = documents.len(), "Loaded documents.");

	Ok(documents)
}

fn parse_documents(raw: &str) -> serde_json::Result<Vec<Document>> {
	Ok(match serde_json::from_str(raw)? {
		DocumentsFile::List(documents) | DocumentsFile::Wrapped { documents } => documents,
	})
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_valid() {
		Args::command().debug_assert();
	}

	#[test]
	fn parses_plain_and_wrapped_document_files() {
		let plain = parse_documents(r#"[{ "content": "a", "score": 0.5 }]"#).expect("plain");
		let wrapped = parse_documents(r#"{ "documents": [{ "metadata": { "content": "b" } }] }"#)
			.expect("wrapped");

		assert_eq!(plain[0].content(), Some("a"));
		assert_eq!(wrapped[0].content(), Some("b"));
		assert!(parse_documents(r#"{ "items": [] }"#).is_err());
	}

	#[test]
	fn parses_prepare_flags() {
		let args = Args::try_parse_from([
			"sift",
			"--config",
			"sift.toml",
			"prepare",
			"--query",
			"CVD 공정",
			"--documents",
			"docs.json",
			"--keyword",
			"cvd",
			"--keyword",
			"증착",
			"--strategy",
			"best_last",
		])
		.expect("Failed to parse args.");

		let Command::Prepare { keywords, strategy, enhance_keywords, .. } = args.command else {
			panic!("Expected prepare command.");
		};

		assert_eq!(keywords, vec!["cvd", "증착"]);
		assert_eq!(strategy.as_deref(), Some("best_last"));
		assert!(!enhance_keywords);
	}
}
