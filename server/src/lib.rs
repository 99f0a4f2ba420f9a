use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use newsroom_core::{ArticleSummary, ContentStore, RankedResult, RefreshOutcome, RefreshStatus, SearchService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub type SharedService = Arc<SearchService<Arc<dyn ContentStore>>>;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    /// Snapshot generation that answered the query.
    pub generation: u64,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub key: String,
    pub score: f64,
    pub title: String,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    /// HTML-escaped excerpt with query words wrapped in `<em>`.
    pub snippet: Option<String>,
}

impl SearchHit {
    fn from_result(result: RankedResult, raw_terms: &[String]) -> Self {
        let a = result.article;
        let snippet = a.excerpt.as_deref().map(|e| highlight_terms(e, raw_terms));
        Self { key: result.key, score: result.score, title: a.title, excerpt: a.excerpt, category: a.category, author: a.author, snippet }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: SharedService,
    pub admin_token: Option<String>,
}

pub fn build_app(service: SharedService, admin_token: Option<String>) -> Router {
    let app_state = AppState { service, admin_token };

    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/articles/:key", get(article_handler))
        .route("/status", get(status_handler))
        .route("/index/refresh", post(refresh_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Comma-separated allow-list of origins; unset or unparsable means any origin.
fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> =
        allow_origin.into_iter().flat_map(|v| v.split(',')).filter_map(|o| o.trim().parse().ok()).collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    // Sub-minimum queries come back empty from the service without a fetch
    let (generation, results) = state.service.search_with_generation(&params.q).await;
    let total_hits = results.len();
    let k = params.k.clamp(1, 100);

    // Capture raw query terms for highlighting
    let raw_terms: Vec<String> = params
        .q
        .split_whitespace()
        .map(|s| s.to_string())
        .collect();
    let results = results
        .into_iter()
        .take(k)
        .map(|r| SearchHit::from_result(r, &raw_terms))
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, generation, "search");
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, generation, results })
}

pub async fn article_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ArticleSummary>, (StatusCode, Json<serde_json::Value>)> {
    state
        .service
        .snapshot()
        .get(&key)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))))
}

pub async fn status_handler(State(state): State<AppState>) -> Json<RefreshStatus> {
    Json(state.service.status())
}

async fn refresh_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<RefreshOutcome>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    match state.service.refresh().await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => Err((StatusCode::BAD_GATEWAY, format!("refresh failed, previous snapshot kept: {e}"))),
    }
}

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err((StatusCode::UNAUTHORIZED, "refresh disabled: no admin token configured".into()));
    };
    match headers.get(ADMIN_TOKEN_HEADER).map(HeaderValue::as_bytes) {
        Some(given) if given == expected.as_bytes() => Ok(()),
        Some(_) => Err((StatusCode::UNAUTHORIZED, "admin token mismatch".into())),
        None => Err((StatusCode::UNAUTHORIZED, format!("missing {ADMIN_TOKEN_HEADER} header"))),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML-escape `excerpt`, wrapping case-insensitive occurrences of `terms` in `<em>`.
/// Matching runs once over the raw text so markup and entities are never matched.
fn highlight_terms(excerpt: &str, terms: &[String]) -> String {
    let mut words: Vec<&str> = terms
        .iter()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();
    if words.is_empty() {
        return escape_html(excerpt);
    }
    // longest alternative first
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.dedup();
    let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
    let Ok(pat) = regex::RegexBuilder::new(&alternation).case_insensitive(true).build() else {
        return escape_html(excerpt);
    };

    let mut out = String::with_capacity(excerpt.len() + 16);
    let mut last = 0;
    for m in pat.find_iter(excerpt) {
        out.push_str(&escape_html(&excerpt[last..m.start()]));
        out.push_str("<em>");
        out.push_str(&escape_html(m.as_str()));
        out.push_str("</em>");
        last = m.end();
    }
    out.push_str(&escape_html(&excerpt[last..]));
    out
}
