use serde::{Deserialize, Serialize};

/// Minimal projection of a published article, as indexed and displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// Stable lookup key (the slug).
    pub key: String,
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    /// Category display name.
    pub category: Option<String>,
    /// Author display name.
    pub author: Option<String>,
}

impl ArticleSummary {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        let key = key.into();
        Self { id: key.clone(), key, title: title.into(), excerpt: None, category: None, author: None }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => Some(self.title.as_str()),
            Field::Excerpt => self.excerpt.as_deref(),
            Field::Category => self.category.as_deref(),
            Field::Author => self.author.as_deref(),
        }
    }
}

/// Tokenized fields of an article. The discriminant is the slot in per-field arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title = 0,
    Excerpt = 1,
    Category = 2,
    Author = 3,
}

impl Field {
    pub const COUNT: usize = 4;
    pub const ALL: [Field; Field::COUNT] = [Field::Title, Field::Excerpt, Field::Category, Field::Author];

    pub fn slot(self) -> usize {
        self as usize
    }
}

/// Per-field score multipliers. A field with a zero boost is carried but not searchable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBoosts {
    pub title: f64,
    pub excerpt: f64,
    pub category: f64,
    pub author: f64,
}

impl Default for FieldBoosts {
    fn default() -> Self {
        Self { title: 2.0, excerpt: 1.0, category: 0.0, author: 0.0 }
    }
}

impl FieldBoosts {
    /// Effective boost; negative, NaN and infinite weights count as zero.
    pub fn get(&self, field: Field) -> f64 {
        let raw = match field {
            Field::Title => self.title,
            Field::Excerpt => self.excerpt,
            Field::Category => self.category,
            Field::Author => self.author,
        };
        if raw.is_finite() && raw > 0.0 { raw } else { 0.0 }
    }

    pub(crate) fn as_array(&self) -> [f64; Field::COUNT] {
        Field::ALL.map(|f| self.get(f))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub key: String,
    pub score: f64,
    pub article: ArticleSummary,
}
