//! Achminup API
//!
//! HTTP surface of the media ingestion service: authenticated upload and
//! delete of videos and thumbnails, with background processing of uploads.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
