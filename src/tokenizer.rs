use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{BTreeMap, HashMap};

lazy_static::lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Turns raw text into normalized terms.
///
/// Indexing and querying must go through the same tokenizer, otherwise terms
/// never line up with the stored postings. Stems come from the Snowball
/// English stemmer and can differ from those of a Lancaster-based index.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Split lowercased text into maximal runs of word characters
    fn split(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !is_word_char(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Apply stemming
    fn stemmer_filter(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .map(|t| STEMMER.stem(&t).into_owned())
            .collect()
    }

    /// Full analysis pipeline: lowercase, split, stem.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens = self.split(&lowered);
        self.stemmer_filter(tokens)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Fraction of `tokens` taken by each distinct term.
///
/// Returns an empty map for an empty token list.
pub fn term_frequencies(tokens: &[String]) -> BTreeMap<String, f64> {
    if tokens.is_empty() {
        return BTreeMap::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let total = tokens.len() as f64;
    counts
        .into_iter()
        .map(|(term, n)| (term.to_string(), n as f64 / total))
        .collect()
}
