//! Sprite sheet to animated GIF conversion.
//!
//! A sheet is cut into a uniform `rows × cols` grid; the tiles are emitted in
//! row-major order (frame `i` is cell `(i / cols, i % cols)`) and encoded as a
//! looping animation.
//!
//! ```no_run
//! use sprite_gif::{PartialGridConfig, SpriteConverter};
//!
//! let converter = SpriteConverter::new();
//! let config = PartialGridConfig {
//!     rows: Some(4),
//!     cols: Some(8),
//!     duration: Some(80),
//!     ..Default::default()
//! };
//! let result = smol::block_on(converter.convert("walk.png", config))?;
//! std::fs::write("walk.gif", result.bytes())?;
//! converter.release(&result);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod blob;
pub mod config;
pub mod convert;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod progress;
pub mod util;

pub use blob::{Blob, BlobStore, BlobUrl};
pub use config::{default_config, validate_config, GridConfig, PartialGridConfig};
pub use convert::{ConversionResult, SpriteConverter, Stage};
pub use decoder::{ImageLoader, ImageSource, SourceImage};
pub use encoder::{EncoderBackend, EncoderSession, EncoderSettings, GifBackend};
pub use error::{ConfigError, ConvertError, EncodeError, LoadError};
pub use extract::{Frame, FrameGeometry};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
