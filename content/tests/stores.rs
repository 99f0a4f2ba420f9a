use axum::extract::RawQuery;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use newsroom_content::{load_articles, FileContentStore, RestConfig, RestContentStore, StaticContentStore};
use newsroom_core::{ArticleSummary, ContentStore, FetchError};
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn articles(headers: HeaderMap, RawQuery(query): RawQuery) -> Result<Json<Value>, StatusCode> {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("anon-key") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if !query.unwrap_or_default().contains("status=eq.published") {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!([
        { "id": "a1", "title": "Senate Passes Budget Bill", "slug": "senate-budget",
          "excerpt": "Late vote.", "category": { "name": "Politics" }, "author": { "username": "jdoe" } },
        { "id": 2, "title": "Local Team Wins Championship", "slug": null,
          "excerpt": null, "category": null, "author": null }
    ])))
}

#[tokio::test]
async fn rest_store_fetches_and_narrows_records() {
    let base = serve(Router::new().route("/rest/v1/articles", get(articles))).await;
    let store = RestContentStore::new(RestConfig::new(base, "anon-key")).unwrap();

    let got = store.fetch_published().await.unwrap();
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].key, "senate-budget");
    assert_eq!(got[0].author.as_deref(), Some("jdoe"));
    assert_eq!(got[1].key, "2");
    assert_eq!(got[1].category, None);
}

#[tokio::test]
async fn rest_store_reports_status_errors() {
    let base = serve(Router::new().route("/rest/v1/articles", get(articles))).await;
    let store = RestContentStore::new(RestConfig::new(base, "wrong-key")).unwrap();

    match store.fetch_published().await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn rest_store_reports_malformed_payload() {
    let app = Router::new().route("/rest/v1/articles", get(|| async { Json(json!({ "message": "not a list" })) }));
    let store = RestContentStore::new(RestConfig::new(serve(app).await, "k")).unwrap();
    assert!(matches!(store.fetch_published().await, Err(FetchError::Decode(_))));
}

#[tokio::test]
async fn rest_store_times_out() {
    let app = Router::new().route(
        "/rest/v1/articles",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([]))
        }),
    );
    let config = RestConfig { timeout: Duration::from_millis(100), ..RestConfig::new(serve(app).await, "k") };
    let store = RestContentStore::new(config).unwrap();
    assert!(matches!(store.fetch_published().await, Err(FetchError::Timeout(_))));
}

#[tokio::test]
async fn file_store_reads_json_and_jsonl_directory() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested")).unwrap();
    fs::write(
        dir.path().join("a.json"),
        r#"[{ "id": 1, "title": "Budget Cuts Loom", "slug": "budget-cuts", "status": "published" },
            { "id": 2, "title": "Draft piece", "slug": "draft", "status": "draft" }]"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("nested/b.jsonl"),
        "{\"id\": 3, \"title\": \"Storm Warning\", \"slug\": \"storm\"}\n\n{\"id\": 4, \"title\": \"Transit Vote\"}\n",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let store = FileContentStore::new(dir.path());
    let got = store.fetch_published().await.unwrap();
    let keys: Vec<&str> = got.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(keys, vec!["budget-cuts", "storm", "4"]);
}

#[test]
fn file_store_reports_bad_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.jsonl");
    fs::write(&path, "{\"id\": 1, \"title\": \"ok\"}\n{not json}\n").unwrap();
    match load_articles(&path) {
        Err(FetchError::Decode(msg)) => assert!(msg.contains(":2:"), "{msg}"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn missing_path_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(load_articles(&dir.path().join("nope")), Err(FetchError::Io(_))));
}

#[tokio::test]
async fn static_store_returns_its_list() {
    let store = StaticContentStore::new(vec![ArticleSummary::new("k", "Title")]);
    assert_eq!(store.fetch_published().await.unwrap().len(), 1);
    assert_eq!(store.name(), "static");
}
