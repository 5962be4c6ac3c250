//! Achminup Storage Library
//!
//! This crate owns every filesystem mutation the service performs.
//!
//! # Stage layout
//!
//! A payload lives in exactly one of four stage roots at a time, and only ever
//! moves between them by rename:
//!
//! - **download**: `{download}/{format}/{id}{ext}` while the request body is received
//! - **src**: `{process}/src/{format}/{id}{ext}` while a processor reads it
//! - **dst**: `{process}/dst/{format}/{id}{ext}` while a processor writes it
//! - **serve**: `{serve}/{format}/{id}{ext}`, publicly reachable
//!
//! The owner record `{id}.owner.txt` is created in the download stage and then
//! published to the serve stage, where its existence is the single source of
//! truth for whether the asset is still claimed. Every check of that existence
//! that is followed by a mutation goes through [`OwnershipRegistry`].

pub mod error;
pub mod ownership;
pub mod stager;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use ownership::OwnershipRegistry;
pub use stager::{discard_all, move_file, remove_if_exists, Stage, StagedPaths, Stager};
