//! The editor document persisted by the snapshot store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, ErrorKind};

/// Complete serializable state of one editing session.
///
/// The store treats the document as opaque: pages, styles, component tree
/// and layout metadata are whatever the editor put there. Structural checks
/// live in the blob codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

impl Document {
    /// The document of a brand-new project: `{}`.
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Wrap a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Convert any serde value into a document.
    ///
    /// Fails with [`ErrorKind::Encoding`] when the value falls outside the
    /// JSON value model, e.g. a map with non-string keys.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, AppError> {
        serde_json::to_value(value).map(Self).map_err(|e| {
            AppError::with_source(
                ErrorKind::Encoding,
                format!("Document is not representable as JSON: {e}"),
                e,
            )
        })
    }

    /// Borrow the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Mutably borrow the underlying JSON value.
    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    /// Consume the document, returning the JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Whether this is the empty project document.
    pub fn is_empty(&self) -> bool {
        matches!(&self.0, Value::Object(map) if map.is_empty())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
