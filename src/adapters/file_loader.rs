use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncReadExt;

use crate::{core::error::LoadError, ports::document_loader::DocumentLoader};

/// Reads route and rule documents from the local filesystem.
///
/// Files are re-read on every call so edits take effect without a restart.
#[derive(Debug, Clone, Default)]
pub struct FileDocumentLoader;

impl FileDocumentLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for FileDocumentLoader {
    async fn load(&self, path: &str) -> Result<Value, LoadError> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| LoadError::io(path, "open", &e))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .await
            .map_err(|e| LoadError::io(path, "read", &e))?;

        serde_json::from_slice(&bytes).map_err(|e| LoadError::parse(path, e))
    }
}
