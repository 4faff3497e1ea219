// ---------------------------------------------------------------------------
// Tokenization -- shared by index build and query scoring
// ---------------------------------------------------------------------------
//
// Both sides of the vector space must tokenize identically: lowercase,
// split on non-alphanumeric boundaries, drop single-character tokens and
// common English stopwords. Anything fancier (stemming, n-grams) would
// have to be applied on both sides at once.
// ---------------------------------------------------------------------------

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Non-discriminating English terms excluded from the vocabulary.
const STOPWORDS: &[&str] = &[
	"a", "about", "above", "after", "again", "all", "also", "am", "an", "and",
	"any", "are", "as", "at", "be", "because", "been", "before", "being",
	"below", "between", "both", "but", "by", "can", "did", "do", "does",
	"doing", "down", "during", "each", "few", "for", "from", "further", "had",
	"has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
	"if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my",
	"no", "nor", "not", "now", "of", "off", "on", "once", "only", "or",
	"other", "our", "out", "over", "own", "same", "she", "should", "so",
	"some", "such", "than", "that", "the", "their", "them", "then", "there",
	"these", "they", "this", "those", "through", "to", "too", "under",
	"until", "up", "very", "was", "we", "were", "what", "when", "where",
	"which", "while", "who", "whom", "why", "will", "with", "you", "your",
	"yours",
];

fn token_pattern() -> &'static Regex {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	// Two or more word characters, underscore excluded; single-character
	// tokens carry no signal for this corpus.
	PATTERN.get_or_init(|| Regex::new(r"[^\W_]{2,}").expect("valid token pattern"))
}

fn stopword_set() -> &'static HashSet<&'static str> {
	static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
	SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Split text into lowercased word tokens, dropping stopwords and tokens
/// of length <= 1. Returns an empty `Vec` for text with no usable tokens.
pub fn tokenize(text: &str) -> Vec<String> {
	let lower = text.to_lowercase();
	token_pattern()
		.find_iter(&lower)
		.map(|m| m.as_str().to_string())
		.filter(|t| !stopword_set().contains(t.as_str()))
		.collect()
}
