pub mod article;
pub mod error;
pub mod index;
pub mod query;
pub mod refresh;
pub mod service;
pub mod store;
pub mod tokenizer;

pub use article::{ArticleSummary, Field, FieldBoosts, RankedResult};
pub use error::FetchError;
pub use index::{build_index, DocId, Posting, Snapshot};
pub use query::{query, query_top};
pub use refresh::{Generation, InstallOutcome, RefreshPolicy, SnapshotCell};
pub use service::{passes_min_length, RefreshOutcome, RefreshStatus, SearchService, MIN_QUERY_CHARS, MIN_SCHEDULE_PERIOD};
pub use store::ContentStore;
