//! Pluggable animation encoders.
//!
//! The orchestrator only talks to [`EncoderBackend`] / [`EncoderSession`], so
//! backends with different trade-offs can be swapped without touching
//! extraction.

pub mod gif_backend;
mod worker;

pub use gif_backend::GifBackend;

use crate::error::EncodeError;
use image::RgbaImage;

/// Parameters a session is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub quality_hint: u32,
    pub parallelism: usize,
}

/// Factory for encoder sessions.
pub trait EncoderBackend {
    type Session: EncoderSession;

    fn initialize(&self, settings: &EncoderSettings) -> Result<Self::Session, EncodeError>;

    /// MIME type of the finished payload.
    fn mime_type(&self) -> &'static str;
}

/// Accumulates frames and produces the encoded animation.
///
/// Frames must appear in the output in the order they were appended.
pub trait EncoderSession: Send + 'static {
    /// Submit one frame. `pixels` is only borrowed for the duration of the call.
    fn append_frame(&mut self, pixels: &RgbaImage, duration_ms: u32) -> Result<(), EncodeError>;

    /// Finish the animation. May block; callers run it off the async executor.
    fn finalize(self) -> Result<Vec<u8>, EncodeError>;
}
