pub mod assets;

pub use assets::{AssetService, DeleteOutcome, RequestNumber};
