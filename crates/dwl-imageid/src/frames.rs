use dwl_types::SeriesUid;

use crate::error::{ImageIdError, ImageIdResult};

/// Inclusive, one-based frame range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
}

impl FrameRange {
    /// Inclusive range `start..=end`, unchecked. See [`FrameRange::validated`].
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Every frame of an instance with `frames` frames.
    pub fn all(frames: u32) -> Self {
        Self::new(1, frames)
    }

    /// Reject empty, inverted and zero-based ranges.
    pub fn validated(self) -> ImageIdResult<Self> {
        if self.start == 0 || self.start > self.end {
            return Err(ImageIdError::InvalidFrameRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(self)
    }

    /// Number of frames covered. Zero for an inverted range.
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frame numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// Chooses which frames of a multi-frame instance get identifiers.
pub trait FrameRangeMapper: Send + Sync {
    fn frame_range(&self, series: &SeriesUid, frames: u32) -> FrameRange;
}

impl<F> FrameRangeMapper for F
where
    F: Fn(&SeriesUid, u32) -> FrameRange + Send + Sync,
{
    fn frame_range(&self, series: &SeriesUid, frames: u32) -> FrameRange {
        self(series, frames)
    }
}
