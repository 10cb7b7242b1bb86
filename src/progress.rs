//! Progress notifications for a conversion.
//!
//! A successful conversion emits exactly three events, in order:
//! `extracting`, `encoding`, `finished`. Configuration and load failures emit
//! none; the caller learns about them from the returned error.

use std::future::Future;

/// A single lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// Frames are being cut out of the sheet.
    Extracting {
        /// Completed fraction in `[0, 1]`, if known.
        progress: Option<f32>,
    },

    /// All frames were submitted; the encoder is assembling the animation.
    Encoding {
        /// Completed fraction in `[0, 1]`, if known.
        progress: Option<f32>,
    },

    /// The animation is ready.
    Finished {
        /// Completed fraction in `[0, 1]`, if known.
        progress: Option<f32>,
    },
}

impl ProgressEvent {
    /// External tag of the event (`extracting`, `encoding`, `finished`).
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::Extracting { .. } => "extracting",
            ProgressEvent::Encoding { .. } => "encoding",
            ProgressEvent::Finished { .. } => "finished",
        }
    }

    pub fn progress(&self) -> Option<f32> {
        match *self {
            ProgressEvent::Extracting { progress }
            | ProgressEvent::Encoding { progress }
            | ProgressEvent::Finished { progress } => progress,
        }
    }
}

/// Receiver of [`ProgressEvent`]s.
///
/// The conversion awaits the returned future before moving on, so a sink may
/// apply backpressure (e.g. a bounded channel) without losing events.
pub trait ProgressSink {
    fn on_progress(&mut self, event: ProgressEvent) -> impl Future<Output = ()>;
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent),
{
    fn on_progress(&mut self, event: ProgressEvent) -> impl Future<Output = ()> {
        self(event);
        std::future::ready(())
    }
}

/// Forward events to a channel, waiting for capacity. Only a closed channel
/// drops the event.
impl ProgressSink for smol::channel::Sender<ProgressEvent> {
    fn on_progress(&mut self, event: ProgressEvent) -> impl Future<Output = ()> {
        let sender = self.clone();
        async move {
            if let Err(e) = sender.send(event).await {
                log::debug!("Dropped progress event {}: {}", event.kind(), e);
            }
        }
    }
}

/// Sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _event: ProgressEvent) -> impl Future<Output = ()> {
        std::future::ready(())
    }
}
