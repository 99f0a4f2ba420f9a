use crate::article::{ArticleSummary, Field};
use crate::tokenizer::tokenize;
use std::collections::{BTreeMap, HashMap};

/// Position of a document in its snapshot; also the tie-breaking rank.
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    /// Term frequency per field, indexed by [`Field::slot`].
    pub tf: [u32; Field::COUNT],
}

/// Immutable inverted index over one fetched collection of articles.
///
/// Every document key in the index maps to exactly one article of the collection it was built
/// from. A snapshot is never patched; a new fetch builds a new one.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub(crate) docs: Vec<ArticleSummary>,
    pub(crate) by_key: HashMap<String, DocId>,
    /// term -> postings sorted by doc_id
    pub(crate) postings: BTreeMap<String, Vec<Posting>>,
    /// normalized word -> stem, ordered for prefix scans
    pub(crate) surfaces: BTreeMap<String, String>,
}

/// Build a snapshot from `articles`. Duplicate keys: the last record wins and keeps the
/// position of the key's first appearance. An empty input gives an empty, queryable snapshot.
pub fn build_index<I>(articles: I) -> Snapshot
where
    I: IntoIterator<Item = ArticleSummary>,
{
    let mut docs: Vec<ArticleSummary> = Vec::new();
    let mut by_key: HashMap<String, DocId> = HashMap::new();
    for article in articles {
        match by_key.get(&article.key) {
            Some(&doc_id) => docs[doc_id as usize] = article,
            None => {
                by_key.insert(article.key.clone(), docs.len() as DocId);
                docs.push(article);
            }
        }
    }

    let mut postings: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
    let mut surfaces: BTreeMap<String, String> = BTreeMap::new();
    for (doc_id, article) in docs.iter().enumerate() {
        let doc_id = doc_id as DocId;
        for field in Field::ALL {
            let Some(text) = article.field(field) else { continue };
            for token in tokenize(text) {
                let plist = postings.entry(token.term.clone()).or_default();
                match plist.last_mut() {
                    Some(p) if p.doc_id == doc_id => p.tf[field.slot()] += 1,
                    _ => {
                        let mut tf = [0; Field::COUNT];
                        tf[field.slot()] = 1;
                        plist.push(Posting { doc_id, tf });
                    }
                }
                surfaces.entry(token.surface).or_insert(token.term);
            }
        }
    }

    tracing::debug!(num_docs = docs.len(), num_terms = postings.len(), "built snapshot");
    Snapshot { docs, by_key, postings, surfaces }
}

impl Snapshot {
    pub fn build<I>(articles: I) -> Self
    where
        I: IntoIterator<Item = ArticleSummary>,
    {
        build_index(articles)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ArticleSummary> {
        self.by_key.get(key).map(|&id| &self.docs[id as usize])
    }

    /// Documents in rank-tiebreak order.
    pub fn documents(&self) -> &[ArticleSummary] {
        &self.docs
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stems of every indexed word starting with `prefix`, deduplicated and ordered.
    pub(crate) fn expand_prefix(&self, prefix: &str) -> Vec<&str> {
        let mut stems: Vec<&str> = self
            .surfaces
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(|(surface, _)| surface.starts_with(prefix))
            .map(|(_, stem)| stem.as_str())
            .collect();
        stems.sort_unstable();
        stems.dedup();
        stems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(key: &str, title: &str, excerpt: &str) -> ArticleSummary {
        ArticleSummary::new(key, title).with_excerpt(excerpt)
    }

    #[test]
    fn empty_input_builds_empty_snapshot() {
        let s = build_index(Vec::new());
        assert!(s.is_empty());
        assert_eq!(s.term_count(), 0);
        assert!(s.postings("anything").is_empty());
    }

    #[test]
    fn counts_frequency_per_field() {
        let s = build_index(vec![article("a", "Budget budget", "the budget vote")]);
        let p = s.postings("budget");
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].tf[Field::Title.slot()], 2);
        assert_eq!(p[0].tf[Field::Excerpt.slot()], 1);
    }

    #[test]
    fn duplicate_keys_last_wins_first_position() {
        let s = build_index(vec![
            article("a", "Old headline", ""),
            article("b", "Other", ""),
            article("a", "New headline", ""),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.documents()[0].title, "New headline");
        assert!(s.postings("old").is_empty());
        assert_eq!(s.postings("new")[0].doc_id, 0);
    }

    #[test]
    fn category_and_author_are_indexed() {
        let s = build_index(vec![ArticleSummary::new("a", "Title").with_category("Sports").with_author("Maria")]);
        assert_eq!(s.postings("sport")[0].tf[Field::Category.slot()], 1);
        assert_eq!(s.postings("maria")[0].tf[Field::Author.slot()], 1);
    }

    #[test]
    fn prefix_expansion_maps_surfaces_to_stems() {
        let s = build_index(vec![article("a", "Running budgets", "budgeted by a runner")]);
        assert_eq!(s.expand_prefix("budget"), vec!["budget"]);
        assert_eq!(s.expand_prefix("runn"), vec!["run", "runner"]);
        assert!(s.expand_prefix("zzz").is_empty());
    }
}
