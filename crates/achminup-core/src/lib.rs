//! Achminup Core Library
//!
//! This crate provides the asset model, error types and configuration shared by
//! every Achminup component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, DeleteMismatchPolicy, LogFormat, StageRoots};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{AssetFormat, AssetId, AssetKey, Identity};
