use sift_domain::{Document, similarity::TextSignature};

/// Drops near-duplicate documents, keeping the higher-scored copy.
///
/// Documents are visited in descending score order (stable). A candidate whose combined
/// word/trigram similarity to any accepted document reaches `threshold` is discarded.
/// Documents without content pass through at their sorted position and are never compared.
pub fn deduplicate(mut docs: Vec<Document>, threshold: f32) -> Vec<Document> {
	docs.sort_by(|a, b| crate::cmp_f32_desc(a.score_or_zero(), b.score_or_zero()));

	let mut accepted: Vec<TextSignature> = Vec::new();
	let mut out = Vec::with_capacity(docs.len());

	for doc in docs {
		let Some(content) = doc.content() else {
			out.push(doc);

			continue;
		};
		let signature = TextSignature::new(content);

		if accepted.iter().any(|seen| seen.similarity(&signature) >= threshold) {
			tracing::debug!(source = %doc.source, "Dropped near-duplicate document.");

			continue;
		}

		accepted.push(signature);
		out.push(doc);
	}

	out
}
