//! Sprite sheet → animation orchestration.

use crate::blob::{Blob, BlobStore, BlobUrl};
use crate::config::{GridConfig, PartialGridConfig};
use crate::decoder::{ImageLoader, ImageSource, SourceImage};
use crate::encoder::{EncoderBackend, EncoderSession, EncoderSettings, GifBackend};
use crate::error::{ConvertError, EncodeError};
use crate::extract::{FrameExtractor, FrameGeometry, ScratchSurface};
use crate::progress::{NoProgress, ProgressEvent, ProgressSink};
use std::time::Instant;

/// Lifecycle of one conversion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    Loading,
    Extracting,
    Encoding,
    Finished,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Finished | Stage::Failed)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (Finished | Failed, _) => false,
            (_, Failed) => self != Idle,
            (Idle, Validating)
            | (Validating, Loading)
            | (Loading, Extracting)
            | (Extracting, Encoding)
            | (Encoding, Finished) => true,
            _ => false,
        }
    }
}

/// Tracks the stage of a single call and logs every transition.
#[derive(Debug)]
struct Pipeline {
    stage: Stage,
    started: Instant,
}

impl Pipeline {
    fn new() -> Self {
        Self {
            stage: Stage::Idle,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.stage,
            next
        );
        log::debug!("{:?} -> {:?} after {:?}", self.stage, next, self.started.elapsed());
        self.stage = next;
    }

    fn fail(&mut self, err: ConvertError) -> ConvertError {
        log::warn!("Conversion failed during {:?}: {}", self.stage, err);
        self.advance(Stage::Failed);
        err
    }
}

/// The encoded animation and its frame metadata.
///
/// The payload stays registered under [`url`](Self::url) until released with
/// [`SpriteConverter::release`].
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub blob: Blob,
    pub url: BlobUrl,
    pub frame_count: usize,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl ConversionResult {
    pub fn bytes(&self) -> &[u8] {
        self.blob.bytes()
    }
}

/// Converts sprite sheets into looping animations.
///
/// Calls are independent: each owns its scratch surface and encoder session,
/// so one converter can serve concurrent conversions. Only the blob store is
/// shared.
#[derive(Debug, Clone, Default)]
pub struct SpriteConverter<B = GifBackend> {
    backend: B,
    blobs: BlobStore,
}

impl SpriteConverter<GifBackend> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: EncoderBackend> SpriteConverter<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            blobs: BlobStore::new(),
        }
    }

    pub fn with_blob_store(mut self, blobs: BlobStore) -> Self {
        self.blobs = blobs;
        self
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Release the handle of a previous result. Returns `false` if it was
    /// already released.
    pub fn release(&self, result: &ConversionResult) -> bool {
        self.blobs.revoke(&result.url)
    }

    pub async fn convert(
        &self,
        source: impl Into<ImageSource>,
        config: PartialGridConfig,
    ) -> Result<ConversionResult, ConvertError> {
        self.convert_with_progress(source, config, NoProgress).await
    }

    /// Run the full pipeline, reporting `extracting`, `encoding` and
    /// `finished` to `progress`.
    ///
    /// Validation happens before any I/O. Every failure is terminal and no
    /// partial result is returned.
    pub async fn convert_with_progress<P: ProgressSink>(
        &self,
        source: impl Into<ImageSource>,
        config: PartialGridConfig,
        mut progress: P,
    ) -> Result<ConversionResult, ConvertError> {
        let mut pipeline = Pipeline::new();

        pipeline.advance(Stage::Validating);
        let config = config
            .resolve()
            .map_err(|e| pipeline.fail(e.into()))?;

        pipeline.advance(Stage::Loading);
        let loader = ImageLoader::new(self.blobs.clone());
        let image = loader
            .load(source.into())
            .await
            .map_err(|e| pipeline.fail(e.into()))?;

        let geometry = FrameGeometry::for_image(&image, &config);
        log::info!(
            "Slicing {}x{} sheet into {}x{} grid of {}x{} frames",
            image.width(),
            image.height(),
            config.rows,
            config.cols,
            geometry.frame_width,
            geometry.frame_height
        );

        pipeline.advance(Stage::Extracting);
        progress
            .on_progress(ProgressEvent::Extracting { progress: None })
            .await;

        let mut session = self
            .backend
            .initialize(&EncoderSettings {
                width: geometry.frame_width,
                height: geometry.frame_height,
                quality_hint: config.quality_hint,
                parallelism: config.parallelism,
            })
            .map_err(|e| pipeline.fail(e.into()))?;

        // Frame submission can block on the encoder queue.
        let session = smol::unblock(move || {
            append_frames(&mut session, &image, &config, geometry)?;
            Ok::<_, EncodeError>(session)
        })
        .await
        .map_err(|e| pipeline.fail(e.into()))?;

        pipeline.advance(Stage::Encoding);
        progress
            .on_progress(ProgressEvent::Encoding { progress: None })
            .await;

        let bytes = smol::unblock(move || session.finalize())
            .await
            .map_err(|e| pipeline.fail(e.into()))?;

        let blob = Blob::new(bytes, Some(self.backend.mime_type()));
        let url = self.blobs.insert(blob.clone());

        pipeline.advance(Stage::Finished);
        progress
            .on_progress(ProgressEvent::Finished { progress: Some(1.0) })
            .await;

        log::info!(
            "Encoded {} frames into {} bytes in {:?}",
            geometry.frame_count(),
            blob.len(),
            pipeline.started.elapsed()
        );

        Ok(ConversionResult {
            blob,
            url,
            frame_count: geometry.frame_count(),
            frame_width: geometry.frame_width,
            frame_height: geometry.frame_height,
        })
    }
}

/// Feed every frame of `image` to `session` in row-major order. The scratch
/// surface lives only for this call.
fn append_frames<S: EncoderSession>(
    session: &mut S,
    image: &SourceImage,
    config: &GridConfig,
    geometry: FrameGeometry,
) -> Result<(), EncodeError> {
    let mut scratch = ScratchSurface::new(&geometry);
    let extractor = FrameExtractor::new(image, geometry, config.frame_duration_ms);
    extractor.for_each_frame(&mut scratch, |frame| {
        log::debug!("Frame {} at row {}, col {}", frame.index, frame.row, frame.col);
        session.append_frame(frame.pixels, frame.duration_ms)
    })
}
