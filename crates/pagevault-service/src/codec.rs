//! Blob codec: turns editor documents into snapshot bytes and back.
//!
//! Snapshots are stored as a small JSON envelope so the format can evolve:
//!
//! ```json
//! {"format":"pagevault.snapshot","version":1,"document":{...}}
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagevault_core::error::{AppError, ErrorKind};
use pagevault_core::result::AppResult;
use pagevault_core::types::Document;

/// Format tag written into every envelope.
pub const SNAPSHOT_FORMAT: &str = "pagevault.snapshot";

/// Envelope schema version this codec reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Deepest document nesting accepted by `encode`.
///
/// serde_json refuses to parse past 128 levels; the envelope itself uses
/// one, so anything encoded under this limit is guaranteed to decode.
pub const MAX_DOCUMENT_DEPTH: usize = 100;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    document: &'a Document,
}

#[derive(Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    document: Document,
}

/// Stateless encoder/decoder for snapshot payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobCodec;

impl BlobCodec {
    /// Create a codec.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a document into its persisted byte form.
    pub fn encode(&self, document: &Document) -> AppResult<Bytes> {
        check_structure(document.as_value()).map_err(AppError::encoding)?;

        let envelope = EnvelopeRef {
            format: SNAPSHOT_FORMAT,
            version: SCHEMA_VERSION,
            document,
        };
        serde_json::to_vec(&envelope).map(Bytes::from).map_err(|e| {
            AppError::with_source(
                ErrorKind::Encoding,
                format!("Failed to serialize document: {e}"),
                e,
            )
        })
    }

    /// Deserialize persisted bytes back into a document.
    pub fn decode(&self, bytes: &[u8]) -> AppResult<Document> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(|e| {
            AppError::with_source(
                ErrorKind::Decoding,
                format!("Snapshot payload is not a valid envelope: {e}"),
                e,
            )
        })?;

        if envelope.format != SNAPSHOT_FORMAT {
            return Err(AppError::decoding(format!(
                "Unexpected snapshot format '{}'",
                envelope.format
            )));
        }
        if envelope.version != SCHEMA_VERSION {
            return Err(AppError::decoding(format!(
                "Unsupported snapshot schema version {} (expected {SCHEMA_VERSION})",
                envelope.version
            )));
        }
        check_structure(envelope.document.as_value()).map_err(AppError::decoding)?;

        Ok(envelope.document)
    }

    /// Parse a raw document sent by the editor (no envelope).
    ///
    /// Applies the same structural rules as [`BlobCodec::encode`] but reports
    /// failures as `Validation`, since the caller sent bad input.
    pub fn decode_request_body(&self, bytes: &[u8]) -> AppResult<Document> {
        let document: Document = serde_json::from_slice(bytes).map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                format!("Document body is not valid JSON: {e}"),
                e,
            )
        })?;
        check_structure(document.as_value()).map_err(AppError::validation)?;
        Ok(document)
    }
}

/// Checks the rules every stored document obeys: an object root and bounded
/// nesting. Iterative so hostile depth cannot overflow the stack.
fn check_structure(value: &Value) -> Result<(), String> {
    if !value.is_object() {
        return Err(format!(
            "Document root must be a JSON object, got {}",
            kind_of(value)
        ));
    }

    let mut stack: Vec<(&Value, usize)> = vec![(value, 1)];
    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_DOCUMENT_DEPTH {
            return Err(format!(
                "Document nesting exceeds {MAX_DOCUMENT_DEPTH} levels"
            ));
        }
        match node {
            Value::Object(map) => stack.extend(
                map.values()
                    .filter(|v| v.is_object() || v.is_array())
                    .map(|v| (v, depth + 1)),
            ),
            Value::Array(items) => stack.extend(
                items
                    .iter()
                    .filter(|v| v.is_object() || v.is_array())
                    .map(|v| (v, depth + 1)),
            ),
            _ => {}
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn nested(depth: usize) -> Value {
        let mut value = json!({});
        for _ in 1..depth {
            value = json!({ "child": value });
        }
        value
    }

    #[test]
    fn test_round_trip_preserves_document() {
        let codec = BlobCodec::new();
        let doc = Document::new(json!({
            "pages": [{"id": "home", "frames": [{"component": {"type": "wrapper"}}]}],
            "styles": [{"selectors": ["#hero"], "style": {"color": "red"}}],
            "assets": ["8c3a0f52-8f7e-4d0e-9f6c-2a1b7e9d4c11"],
            "dataSources": [],
            "symbols": null,
            "ratio": 1.5
        }));

        let bytes = codec.encode(&doc).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_envelope_shape() {
        let bytes = BlobCodec::new().encode(&Document::empty()).unwrap();
        let raw: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(raw["format"], SNAPSHOT_FORMAT);
        assert_eq!(raw["version"], SCHEMA_VERSION);
        assert_eq!(raw["document"], json!({}));
    }

    #[test]
    fn test_encode_rejects_non_object_root() {
        let err = BlobCodec::new()
            .encode(&Document::new(json!(["A", "B"])))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Encoding);
    }

    #[test]
    fn test_depth_limit_keeps_round_trip_law() {
        let codec = BlobCodec::new();

        let deepest = Document::new(nested(MAX_DOCUMENT_DEPTH));
        let bytes = codec.encode(&deepest).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), deepest);

        let too_deep = Document::new(nested(MAX_DOCUMENT_DEPTH + 1));
        assert_eq!(codec.encode(&too_deep).unwrap_err().kind, ErrorKind::Encoding);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = BlobCodec::new().decode(b"{\"pages\": [").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decoding);
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let raw = json!({"format": SNAPSHOT_FORMAT, "version": 2, "document": {}});
        let err = BlobCodec::new()
            .decode(&serde_json::to_vec(&raw).unwrap())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decoding);
        assert!(err.message.contains("version 2"));
    }

    #[test]
    fn test_decode_rejects_foreign_format() {
        let raw = json!({"format": "other", "version": 1, "document": {}});
        let err = BlobCodec::new()
            .decode(&serde_json::to_vec(&raw).unwrap())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decoding);
    }

    #[test]
    fn test_request_body_errors_are_validation() {
        let codec = BlobCodec::new();
        assert_eq!(
            codec.decode_request_body(br#"{"pages":["A"]}"#).unwrap(),
            Document::new(json!({"pages": ["A"]}))
        );
        assert_eq!(
            codec.decode_request_body(b"not json").unwrap_err().kind,
            ErrorKind::Validation
        );
        assert_eq!(
            codec.decode_request_body(b"[1,2]").unwrap_err().kind,
            ErrorKind::Validation
        );
    }
}
