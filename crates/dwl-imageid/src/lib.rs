//! Addressable image identifiers.
//!
//! Every displayable frame in the cache gets an [`ImageId`](dwl_types::ImageId)
//! string the rendering layer can hand back to a loader. Identifiers are a
//! pure function of the instance address, the frame number and the
//! configured rendering scheme, so recomputing one always gives the same
//! string.

pub mod config;
pub mod error;
pub mod frames;
pub mod synthesizer;

pub use config::{ImageIdConfig, ImageRendering};
pub use error::{ImageIdError, ImageIdResult};
pub use frames::{FrameRange, FrameRangeMapper};
pub use synthesizer::{frame_count, ImageIdSynthesizer};
