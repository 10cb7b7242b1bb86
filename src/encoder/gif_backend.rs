use super::worker::QuantizePool;
use super::{EncoderBackend, EncoderSession, EncoderSettings};
use crate::error::EncodeError;
use image::RgbaImage;

pub const GIF_MIME: &str = "image/gif";

const MIN_SPEED: u32 = 1;
const MAX_SPEED: u32 = 30;

/// Looping GIF encoder.
///
/// `quality_hint` maps to the NeuQuant sampling speed (1 = best, 30 =
/// fastest); `parallelism` is the number of quantize threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifBackend;

impl GifBackend {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderBackend for GifBackend {
    type Session = GifSession;

    fn initialize(&self, settings: &EncoderSettings) -> Result<GifSession, EncodeError> {
        GifSession::new(settings)
    }

    fn mime_type(&self) -> &'static str {
        GIF_MIME
    }
}

pub struct GifSession {
    width: u32,
    height: u32,
    pool: QuantizePool,
}

impl GifSession {
    fn new(settings: &EncoderSettings) -> Result<Self, EncodeError> {
        if settings.width == 0 || settings.height == 0 {
            return Err(EncodeError::new(format!(
                "frame size {}x{} is empty; the sheet is smaller than the grid",
                settings.width, settings.height
            )));
        }

        let width = u16::try_from(settings.width).map_err(|_| {
            EncodeError::new(format!("frame width {} exceeds the GIF limit", settings.width))
        })?;
        let height = u16::try_from(settings.height).map_err(|_| {
            EncodeError::new(format!("frame height {} exceeds the GIF limit", settings.height))
        })?;

        let speed = settings.quality_hint.clamp(MIN_SPEED, MAX_SPEED);
        if speed != settings.quality_hint {
            log::warn!(
                "GIF quality hint {} out of range, using {}",
                settings.quality_hint,
                speed
            );
        }

        let pool = QuantizePool::spawn(width, height, speed as i32, settings.parallelism)?;

        Ok(Self {
            width: settings.width,
            height: settings.height,
            pool,
        })
    }
}

impl EncoderSession for GifSession {
    fn append_frame(&mut self, pixels: &RgbaImage, duration_ms: u32) -> Result<(), EncodeError> {
        if pixels.dimensions() != (self.width, self.height) {
            return Err(EncodeError::new(format!(
                "frame is {}x{}, session expects {}x{}",
                pixels.width(),
                pixels.height(),
                self.width,
                self.height
            )));
        }

        // The surface is reused by the caller, so the encoder keeps its own copy.
        self.pool.submit(pixels.as_raw().clone(), delay_centis(duration_ms))
    }

    fn finalize(self) -> Result<Vec<u8>, EncodeError> {
        self.pool.finish()
    }
}

/// GIF delays are in hundredths of a second; round to the nearest one.
fn delay_centis(duration_ms: u32) -> u16 {
    (duration_ms.saturating_add(5) / 10).min(u16::MAX as u32) as u16
}
