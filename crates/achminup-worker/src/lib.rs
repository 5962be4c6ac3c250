pub mod runner;

pub use runner::{JobHandle, JobId, JobRunner};
