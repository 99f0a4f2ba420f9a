//! Content-store adapters: everything that turns backend article rows into [`ArticleSummary`]s.
//!
//! [`ArticleSummary`]: newsroom_core::ArticleSummary

pub mod file;
pub mod record;
pub mod rest;

pub use file::{load_articles, FileContentStore};
pub use record::{ArticleRecord, RecordId};
pub use rest::{RestConfig, RestContentStore};

use async_trait::async_trait;
use newsroom_core::{ArticleSummary, ContentStore, FetchError};

/// A fixed article list, useful for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticContentStore {
    articles: Vec<ArticleSummary>,
}

impl StaticContentStore {
    pub fn new(articles: Vec<ArticleSummary>) -> Self {
        Self { articles }
    }
}

#[async_trait]
impl ContentStore for StaticContentStore {
    async fn fetch_published(&self) -> Result<Vec<ArticleSummary>, FetchError> {
        Ok(self.articles.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
