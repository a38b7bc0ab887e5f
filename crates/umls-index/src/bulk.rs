//! Elasticsearch bulk file sink
//!
//! Writes the NDJSON body of the `_bulk` API: an action line naming the
//! target index followed by the document, for every document. The file
//! can be posted as-is with `curl --data-binary @file`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use umls_core::{IndexDocument, IndexSink, Result, UmlsError};

/// Index sink writing an NDJSON bulk file
pub struct BulkFileSink {
    path: PathBuf,
    action: String,
    writer: Mutex<BufWriter<File>>,
    written: AtomicU64,
}

impl BulkFileSink {
    /// Create (or truncate) the bulk file
    pub async fn create(path: impl AsRef<Path>, index_name: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| UmlsError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let file = File::create(&path).await.map_err(|e| UmlsError::Io {
            path: path.clone(),
            source: e,
        })?;

        let action = json!({ "index": { "_index": index_name } }).to_string();

        Ok(Self {
            path,
            action,
            writer: Mutex::new(BufWriter::new(file)),
            written: AtomicU64::new(0),
        })
    }

    /// Documents written so far
    pub fn documents_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> UmlsError {
        UmlsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl IndexSink for BulkFileSink {
    async fn index_batch(&self, documents: &[IndexDocument]) -> Result<()> {
        let mut body = String::new();
        for document in documents {
            let line = serde_json::to_string(document)
                .map_err(|e| UmlsError::Sink(format!("Failed to encode document: {e}")))?;
            body.push_str(&self.action);
            body.push('\n');
            body.push_str(&line);
            body.push('\n');
        }

        let mut writer = self.writer.lock().await;
        writer
            .write_all(body.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;

        self.written
            .fetch_add(documents.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.flush().await.map_err(|e| self.io_error(e))
    }

    fn name(&self) -> &str {
        "bulk-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn document(term: &str) -> IndexDocument {
        IndexDocument {
            cui: "C0001".to_string(),
            pref: "Headache".to_string(),
            str: term.to_string(),
            exact: term.to_lowercase(),
            lang: "ENG".to_string(),
            source: "SNOMEDCT_US".to_string(),
            types: vec!["DISO".to_string()],
            votes: 10,
        }
    }

    #[tokio::test]
    async fn test_bulk_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bulk").join("autocomplete.ndjson");

        let sink = BulkFileSink::create(&path, "autocomplete").await.unwrap();
        sink.index_batch(&[document("Headache"), document("Cephalgia")])
            .await
            .unwrap();
        sink.flush().await.unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = body
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["index"]["_index"], "autocomplete");
        assert_eq!(lines[1]["str"], "Headache");
        assert_eq!(lines[1]["types"][0], "DISO");
        assert_eq!(lines[2], lines[0]);
        assert_eq!(lines[3]["exact"], "cephalgia");
        assert!(body.ends_with('\n'));
        assert_eq!(sink.documents_written(), 2);
    }
}
