use crate::record::ArticleRecord;
use async_trait::async_trait;
use newsroom_core::{ArticleSummary, ContentStore, FetchError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Articles exported as `.json` (array or single object) or `.jsonl` files. A directory is
/// walked recursively in file-name order.
#[derive(Debug, Clone)]
pub struct FileContentStore {
    path: PathBuf,
}

impl FileContentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ContentStore for FileContentStore {
    async fn fetch_published(&self) -> Result<Vec<ArticleSummary>, FetchError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_articles(&path))
            .await
            .map_err(|e| FetchError::Io(std::io::Error::other(e)))?
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Load published articles from a file or directory.
pub fn load_articles(input: &Path) -> Result<Vec<ArticleSummary>, FetchError> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        return Err(FetchError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", input.display()),
        )));
    }

    let mut records: Vec<ArticleRecord> = Vec::new();
    for file in &files {
        if extension(file) == Some("jsonl") {
            read_jsonl(file, &mut records)?;
        } else {
            read_json(file, &mut records)?;
        }
    }
    let total = records.len();
    let articles: Vec<ArticleSummary> =
        records.into_iter().filter(ArticleRecord::is_published).map(ArticleRecord::into_summary).collect();
    tracing::info!(files = files.len(), total, published = articles.len(), "loaded article export");
    Ok(articles)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, out: &mut Vec<ArticleRecord>) -> Result<(), FetchError> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| FetchError::Decode(format!("{}:{}: {e}", file.display(), n + 1)))?;
        out.push(record);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<ArticleRecord>) -> Result<(), FetchError> {
    let reader = BufReader::new(File::open(file)?);
    let decode = |e: serde_json::Error| FetchError::Decode(format!("{}: {e}", file.display()));
    let json: serde_json::Value = serde_json::from_reader(reader).map_err(decode)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v).map_err(decode)?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json).map_err(decode)?),
        _ => {}
    }
    Ok(())
}
