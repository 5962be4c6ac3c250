//! Video processing: rotation probe, transcoder contract and the two-pass processor.

pub mod processor;
pub mod rotation;
pub mod transcoder;

pub use processor::VideoProcessor;
pub use rotation::{compensation_args, parse_rotation, RotationProbe};
pub use transcoder::{Quality, Transcoder};
