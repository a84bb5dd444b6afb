//! Response compression layer.

use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};

/// Builds a gzip compression layer.
///
/// Documents are JSON and shrink well. Served assets are mostly images and
/// video that are already compressed, so those content types are skipped.
pub fn build_compression_layer() -> CompressionLayer<impl Predicate> {
    let predicate = DefaultPredicate::new()
        .and(NotForContentType::const_new("video/"))
        .and(NotForContentType::const_new("audio/"));

    CompressionLayer::new().gzip(true).compress_when(predicate)
}
