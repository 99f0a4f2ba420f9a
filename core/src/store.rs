use crate::article::ArticleSummary;
use crate::error::FetchError;
use async_trait::async_trait;
use std::sync::Arc;

/// Read side of the content backend: the published articles, already narrowed to summaries.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_published(&self) -> Result<Vec<ArticleSummary>, FetchError>;

    fn name(&self) -> &str {
        "content-store"
    }
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn fetch_published(&self) -> Result<Vec<ArticleSummary>, FetchError> {
        (**self).fetch_published().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
