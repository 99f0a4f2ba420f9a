use newsroom_core::ArticleSummary;
use serde::Deserialize;
use std::fmt;

/// Primary key of an article row; uuid text or serial integer depending on the schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorRef {
    pub username: Option<String>,
}

/// One article row as returned by the content store:
/// `{ id, title, slug, excerpt, category: { name }, author: { username } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleRecord {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    /// Only present in exports; the REST query filters server-side.
    #[serde(default)]
    pub status: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ArticleRecord {
    pub fn is_published(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s.eq_ignore_ascii_case("published"))
    }

    /// Narrow the row to the indexed shape. The key is the slug, or the id when the slug is blank.
    pub fn into_summary(self) -> ArticleSummary {
        let id = self.id.to_string();
        let key = non_blank(self.slug).unwrap_or_else(|| id.clone());
        ArticleSummary {
            key,
            id,
            title: self.title,
            excerpt: non_blank(self.excerpt),
            category: non_blank(self.category.and_then(|c| c.name)),
            author: non_blank(self.author.and_then(|a| a.username)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_record() {
        let json = r#"{
            "id": "7b0c1c9e-1b7e-4c55-9d0e-3f1a2b3c4d5e",
            "title": "Senate Passes Budget Bill",
            "slug": "senate-passes-budget-bill",
            "excerpt": "Lawmakers approved the plan.",
            "category": { "name": "Politics" },
            "author": { "username": "jdoe" }
        }"#;
        let summary = serde_json::from_str::<ArticleRecord>(json).unwrap().into_summary();
        assert_eq!(summary.key, "senate-passes-budget-bill");
        assert_eq!(summary.id, "7b0c1c9e-1b7e-4c55-9d0e-3f1a2b3c4d5e");
        assert_eq!(summary.category.as_deref(), Some("Politics"));
        assert_eq!(summary.author.as_deref(), Some("jdoe"));
    }

    #[test]
    fn tolerates_nulls_and_numeric_ids() {
        let json = r#"{ "id": 42, "title": "Untitled", "slug": "", "excerpt": null, "category": null, "author": { "username": null } }"#;
        let summary = serde_json::from_str::<ArticleRecord>(json).unwrap().into_summary();
        assert_eq!(summary.key, "42");
        assert_eq!(summary.excerpt, None);
        assert_eq!(summary.category, None);
        assert_eq!(summary.author, None);
    }

    #[test]
    fn status_filter() {
        let draft: ArticleRecord = serde_json::from_str(r#"{ "id": 1, "title": "t", "status": "draft" }"#).unwrap();
        let published: ArticleRecord = serde_json::from_str(r#"{ "id": 2, "title": "t", "status": "Published" }"#).unwrap();
        let unknown: ArticleRecord = serde_json::from_str(r#"{ "id": 3, "title": "t" }"#).unwrap();
        assert!(!draft.is_published());
        assert!(published.is_published());
        assert!(unknown.is_published());
    }
}
