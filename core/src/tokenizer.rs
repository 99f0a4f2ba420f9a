use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "d","did","do","does","doing","don","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "ll","m","me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "re","s","same","she","should","so","some","such",
            "t","than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","won","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// One indexed word: the stem used for lookup and the normalized word it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub surface: String,
}

/// Query-side analysis. `prefix` is the trailing word still being typed, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    pub terms: Vec<Token>,
    pub prefix: Option<String>,
}

impl QueryTerms {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.prefix.is_none()
    }
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Compatibility decomposition, combining marks dropped, lower-cased.
pub fn normalize(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

pub fn stem(word: &str) -> String {
    STEMMER.stem(word).into_owned()
}

fn words(normalized: &str) -> impl Iterator<Item = &str> {
    RE.find_iter(normalized).map(|m| m.as_str())
}

fn analyze_word(word: &str) -> Option<Token> {
    if is_stopword(word) {
        return None;
    }
    Some(Token { term: stem(word), surface: word.to_string() })
}

/// Tokenize field text for indexing: normalize, split on non-alphanumerics, drop stopwords, stem.
pub fn tokenize(text: &str) -> Vec<Token> {
    let normalized = normalize(text);
    words(&normalized).filter_map(analyze_word).collect()
}

/// Tokenize a query with the same pipeline as [`tokenize`]. When the text does not end on a
/// separator its last word is also reported as a prefix, unstemmed and unfiltered.
pub fn analyze_query(text: &str) -> QueryTerms {
    let normalized = normalize(text);
    let all: Vec<&str> = words(&normalized).collect();
    let open_ended = normalized.chars().last().is_some_and(char::is_alphanumeric);
    let prefix = if open_ended { all.last().map(|w| (*w).to_string()) } else { None };
    let terms = all.into_iter().filter_map(analyze_word).collect();
    QueryTerms { terms, prefix }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|t| t.term).collect()
    }

    #[test]
    fn basic_tokenize() {
        let t = terms("Running, runner's run!");
        assert!(t.iter().any(|w| w == "run"));
        assert!(!t.iter().any(|w| w == "s"));
    }

    #[test]
    fn splits_on_punctuation_and_keeps_digits() {
        assert_eq!(terms("covid-19 budget/2024"), vec!["covid", "19", "budget", "2024"]);
    }

    #[test]
    fn query_prefix_only_when_open_ended() {
        let q = analyze_query("senate budg");
        assert_eq!(q.prefix.as_deref(), Some("budg"));
        assert_eq!(q.terms.len(), 2);

        let q = analyze_query("senate budget ");
        assert_eq!(q.prefix, None);
    }

    #[test]
    fn stopword_prefix_is_kept_for_expansion() {
        let q = analyze_query("the");
        assert!(q.terms.is_empty());
        assert_eq!(q.prefix.as_deref(), Some("the"));
    }

    #[test]
    fn query_and_index_share_pipeline() {
        let indexed = terms("Elections Loom");
        let queried: Vec<String> = analyze_query("elections loom").terms.into_iter().map(|t| t.term).collect();
        assert_eq!(indexed, queried);
    }
}
