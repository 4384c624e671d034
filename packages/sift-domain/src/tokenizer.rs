use unicode_normalization::UnicodeNormalization;

/// Korean postpositions removed from the end of a Hangul run, longest first.
const PARTICLES: [&str; 20] = [
	"에서", "으로", "까지", "부터", "에게", "한테", "은", "는", "이", "가", "을", "를", "의",
	"에", "로", "와", "과", "도", "만", "께",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharClass {
	Hangul,
	Latin,
	Digit,
}

/// Splits mixed Korean/English text into index terms.
///
/// Terms are maximal runs of Hangul syllables, ASCII letters (lowercased), or ASCII digits. A
/// trailing particle is stripped from each run and terms of one character or less are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
	let normalized: String = text.nfc().collect();
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut current_class = None;

	for ch in normalized.chars() {
		let class = classify(ch);

		if class != current_class {
			flush(&mut current, &mut tokens);

			current_class = class;
		}
		if class.is_some() {
			current.push(ch.to_ascii_lowercase());
		}
	}

	flush(&mut current, &mut tokens);

	tokens
}

fn classify(ch: char) -> Option<CharClass> {
	match ch {
		'\u{AC00}'..='\u{D7A3}' => Some(CharClass::Hangul),
		'a'..='z' | 'A'..='Z' => Some(CharClass::Latin),
		'0'..='9' => Some(CharClass::Digit),
		_ => None,
	}
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
	if current.is_empty() {
		return;
	}

	let run = std::mem::take(current);
	let stem = strip_particle(&run);

	if stem.chars().count() > 1 {
		tokens.push(stem.to_string());
	}
}

fn strip_particle(token: &str) -> &str {
	PARTICLES
		.iter()
		.find_map(|particle| token.strip_suffix(particle))
		.unwrap_or(token)
}
