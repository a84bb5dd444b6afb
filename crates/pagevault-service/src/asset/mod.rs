//! Binary assets referenced by id from editor documents.

pub mod model;
pub mod store;

pub use model::{Asset, AssetMeta, AssetUpload, DeleteOutcome};
pub use store::AssetStore;
