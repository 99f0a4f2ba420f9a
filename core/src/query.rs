use crate::article::{Field, FieldBoosts, RankedResult};
use crate::index::{Posting, Snapshot};
use crate::tokenizer::analyze_query;
use std::collections::BTreeMap;

/// Weight of a stem reached only through expansion of the trailing partial word.
pub const PREFIX_DISCOUNT: f64 = 0.5;

/// Rank documents of `snapshot` against `text`.
///
/// Score is the sum over query terms and fields of `tf * boost`. A trailing partial word with no
/// exact match adds its best expansion per document at [`PREFIX_DISCOUNT`]. Results are sorted by
/// descending score, ties by snapshot position. Documents scoring zero are not returned.
/// Callers gate on minimum query length; the engine accepts any input.
pub fn query(snapshot: &Snapshot, text: &str, boosts: &FieldBoosts) -> Vec<RankedResult> {
    if snapshot.is_empty() {
        return Vec::new();
    }
    let weights = term_weights(snapshot, text);
    if weights.is_empty() {
        return Vec::new();
    }

    let boosts = boosts.as_array();
    let mut scores = vec![0.0f64; snapshot.len()];
    for (term, q_weight) in &weights.exact {
        for posting in snapshot.postings(term) {
            scores[posting.doc_id as usize] += field_score(posting, &boosts) * q_weight;
        }
    }

    if !weights.expansions.is_empty() {
        let mut best = vec![0.0f64; snapshot.len()];
        for stem in &weights.expansions {
            for posting in snapshot.postings(stem) {
                let slot = &mut best[posting.doc_id as usize];
                *slot = slot.max(field_score(posting, &boosts));
            }
        }
        for (score, b) in scores.iter_mut().zip(best) {
            *score += b * PREFIX_DISCOUNT;
        }
    }

    let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().filter(|(_, s)| *s > 0.0).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .map(|(doc_id, score)| {
            let article = snapshot.docs[doc_id].clone();
            RankedResult { key: article.key.clone(), score, article }
        })
        .collect()
}

/// [`query`] truncated to the best `limit` results.
pub fn query_top(snapshot: &Snapshot, text: &str, boosts: &FieldBoosts, limit: usize) -> Vec<RankedResult> {
    let mut results = query(snapshot, text, boosts);
    results.truncate(limit);
    results
}

fn field_score(posting: &Posting, boosts: &[f64; Field::COUNT]) -> f64 {
    Field::ALL
        .iter()
        .map(|field| field.slot())
        .filter(|&slot| posting.tf[slot] > 0)
        .map(|slot| posting.tf[slot] as f64 * boosts[slot])
        .sum()
}

#[derive(Debug, Default)]
struct TermWeights {
    /// stem -> occurrences among the complete query words
    exact: BTreeMap<String, f64>,
    /// stems the trailing partial word expands to
    expansions: Vec<String>,
}

impl TermWeights {
    fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.expansions.is_empty()
    }
}

/// Complete words add 1 per occurrence. The trailing partial word expands by prefix only when
/// its own stem is not indexed.
fn term_weights(snapshot: &Snapshot, text: &str) -> TermWeights {
    let analyzed = analyze_query(text);
    let mut weights = TermWeights::default();
    let mut trailing_matched = false;
    for token in analyzed.terms {
        if snapshot.postings.contains_key(&token.term) {
            if analyzed.prefix.as_deref() == Some(token.surface.as_str()) {
                trailing_matched = true;
            }
            *weights.exact.entry(token.term).or_insert(0.0) += 1.0;
        }
    }
    if let Some(prefix) = analyzed.prefix.filter(|_| !trailing_matched) {
        weights.expansions = snapshot
            .expand_prefix(&prefix)
            .into_iter()
            .filter(|stem| !weights.exact.contains_key(*stem))
            .map(str::to_string)
            .collect();
    }
    weights
}

impl Snapshot {
    pub fn search(&self, text: &str, boosts: &FieldBoosts) -> Vec<RankedResult> {
        query(self, text, boosts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticleSummary;
    use crate::index::build_index;

    fn keys(results: &[RankedResult]) -> Vec<&str> {
        results.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn partial_word_matches_by_prefix() {
        let s = build_index(vec![
            ArticleSummary::new("a", "Championship parade"),
            ArticleSummary::new("b", "Council meeting"),
        ]);
        assert_eq!(keys(&query(&s, "champ", &FieldBoosts::default())), vec!["a"]);
        assert!(query(&s, "champ ", &FieldBoosts::default()).is_empty());
    }

    #[test]
    fn indexed_trailing_word_is_not_expanded() {
        let s = build_index(vec![
            ArticleSummary::new("long", "Budgetary review"),
            ArticleSummary::new("exact", "Budget review"),
        ]);
        let r = query(&s, "budget", &FieldBoosts::default());
        assert_eq!(keys(&r), vec!["exact"]);
        assert_eq!(r[0].score, 2.0);
    }

    #[test]
    fn expansions_count_once_per_document() {
        let s = build_index(vec![
            ArticleSummary::new("many", "Teammates teamsters teamwork"),
            ArticleSummary::new("one", "Teamwork pays"),
        ]);
        let r = query(&s, "tea", &FieldBoosts::default());
        assert_eq!(keys(&r), vec!["many", "one"]);
        assert_eq!(r[0].score, 2.0 * PREFIX_DISCOUNT);
        assert_eq!(r[1].score, 2.0 * PREFIX_DISCOUNT);
    }

    #[test]
    fn infinite_boost_on_unmatched_field_keeps_match() {
        let s = build_index(vec![ArticleSummary::new("a", "Weather").with_excerpt("Flood warning issued")]);
        let boosts = FieldBoosts { title: f64::INFINITY, ..FieldBoosts::default() };
        let r = query(&s, "flood ", &boosts);
        assert_eq!(keys(&r), vec!["a"]);
        assert_eq!(r[0].score, 1.0);
    }

    #[test]
    fn zero_boost_fields_do_not_match() {
        let s = build_index(vec![ArticleSummary::new("a", "Match report").with_category("Sports")]);
        assert!(query(&s, "sports ", &FieldBoosts::default()).is_empty());

        let boosts = FieldBoosts { category: 1.0, ..FieldBoosts::default() };
        let r = query(&s, "sports ", &boosts);
        assert_eq!(keys(&r), vec!["a"]);
        assert_eq!(r[0].article.category.as_deref(), Some("Sports"));
    }

    #[test]
    fn query_top_truncates() {
        let s = build_index((0..5).map(|i| ArticleSummary::new(format!("k{i}"), "Weather update")));
        assert_eq!(query_top(&s, "weather", &FieldBoosts::default(), 2).len(), 2);
    }

    #[test]
    fn stopword_only_query_is_empty() {
        let s = build_index(vec![ArticleSummary::new("a", "The Senate")]);
        assert!(query(&s, "the and ", &FieldBoosts::default()).is_empty());
    }
}
