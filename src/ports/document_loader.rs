use async_trait::async_trait;
use serde_json::Value;

use crate::core::error::LoadError;

/// DocumentLoader defines the port for fetching route and rule documents.
///
/// Implementations read the named resource and parse it as JSON. They do not
/// cache: every call reflects the current content of the resource.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load and parse the document at `path`.
    ///
    /// # Returns
    /// The parsed JSON, [`LoadError::Io`] when the resource cannot be read,
    /// or [`LoadError::Parse`] when it is not valid JSON.
    async fn load(&self, path: &str) -> Result<Value, LoadError>;
}
