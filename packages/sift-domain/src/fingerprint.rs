/// Number of leading characters that participate in a content fingerprint.
pub const FINGERPRINT_PREFIX_CHARS: usize = 200;

/// Hex-encoded blake3 digest of the first [`FINGERPRINT_PREFIX_CHARS`] characters of `content`.
pub fn content_fingerprint(content: &str) -> String {
	let end = content
		.char_indices()
		.nth(FINGERPRINT_PREFIX_CHARS)
		.map(|(idx, _)| idx)
		.unwrap_or(content.len());

	blake3::hash(content[..end].as_bytes()).to_hex().to_string()
}
