//! Achminup Processing Library
//!
//! Background transformation of staged uploads. Every format has one
//! [`Processor`]; videos are probed for rotation and transcoded in two passes,
//! thumbnails are published unchanged. Processors never touch the serve stage
//! except through the ownership registry, so a delete that wins the race leaves
//! nothing behind.

pub mod error;
pub mod job;
pub mod log;
pub mod processor;
pub mod thumbnail;
pub mod tool;
pub mod video;

#[cfg(test)]
mod testing;

pub use error::{ProcessingError, ProcessingResult};
pub use job::ProcessingJob;
pub use log::JobLog;
pub use processor::{Processor, ProcessorSet, ToolPaths};
pub use thumbnail::ThumbnailProcessor;
pub use tool::{command_line, ProcessRunner, ToolOutput, ToolRunner};
pub use video::{Quality, RotationProbe, Transcoder, VideoProcessor};
