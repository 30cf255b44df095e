use dwl_types::tags::keywords;
use dwl_types::{ImageId, InstanceKey, NaturalDataset};

use crate::config::{ImageIdConfig, ImageRendering};
use crate::error::{ImageIdError, ImageIdResult};
use crate::frames::{FrameRange, FrameRangeMapper};

/// Builds image identifiers for cached instances.
#[derive(Clone, Debug)]
pub struct ImageIdSynthesizer {
    config: ImageIdConfig,
}

impl ImageIdSynthesizer {
    /// Create a synthesizer. Trailing slashes on the roots are dropped.
    pub fn new(mut config: ImageIdConfig) -> Self {
        let trim = |root: &mut String| {
            while root.ends_with('/') {
                root.pop();
            }
        };
        trim(&mut config.wado_root);
        trim(&mut config.wado_uri_root);
        Self { config }
    }

    /// The normalized configuration.
    pub fn config(&self) -> &ImageIdConfig {
        &self.config
    }

    /// Identifier of one instance, or of one of its frames.
    pub fn image_id(&self, key: &InstanceKey, frame: Option<u32>) -> ImageIdResult<ImageId> {
        for (value, name) in [
            (key.study.as_str(), "StudyInstanceUID"),
            (key.series.as_str(), "SeriesInstanceUID"),
            (key.sop.as_str(), "SOPInstanceUID"),
        ] {
            if value.is_empty() {
                return Err(ImageIdError::MissingIdentifier(name));
            }
        }

        let id = match self.config.rendering {
            ImageRendering::Wadors => {
                let mut id = format!(
                    "wadors:{}/studies/{}/series/{}/instances/{}",
                    self.config.wado_root, key.study, key.series, key.sop
                );
                if let Some(frame) = frame {
                    id.push_str(&format!("/frames/{frame}"));
                }
                id
            }
            ImageRendering::Wadouri => {
                let mut id = format!(
                    "wadouri:{}?requestType=WADO&studyUID={}&seriesUID={}&objectUID={}&contentType=application%2Fdicom",
                    self.config.wado_uri_root, key.study, key.series, key.sop
                );
                if let Some(frame) = frame {
                    id.push_str(&format!("&frame={frame}"));
                }
                id
            }
        };
        Ok(ImageId::new(id))
    }

    /// Identifiers for an instance with `frames` frames.
    ///
    /// A single-frame instance (or one without a frame count) gets exactly
    /// one unqualified identifier. A multi-frame instance gets one per frame
    /// in `[1, frames]`, or in the range the mapper picks for its series.
    pub fn image_ids(
        &self,
        key: &InstanceKey,
        frames: Option<u32>,
        mapper: Option<&dyn FrameRangeMapper>,
    ) -> ImageIdResult<Vec<ImageId>> {
        let frames = frames.unwrap_or(1);
        if frames <= 1 {
            return Ok(vec![self.image_id(key, None)?]);
        }
        let range = mapper
            .map(|m| m.frame_range(&key.series, frames))
            .unwrap_or_else(|| FrameRange::all(frames))
            .validated()?;
        range.iter().map(|frame| self.image_id(key, Some(frame))).collect()
    }

    /// Identifiers for a naturalized instance, reading its frame count.
    pub fn image_ids_for(
        &self,
        key: &InstanceKey,
        attributes: &NaturalDataset,
        mapper: Option<&dyn FrameRangeMapper>,
    ) -> ImageIdResult<Vec<ImageId>> {
        self.image_ids(key, frame_count(attributes), mapper)
    }
}

/// `NumberOfFrames` of an instance, if present and numeric.
pub fn frame_count(attributes: &NaturalDataset) -> Option<u32> {
    attributes.get_u32(keywords::NUMBER_OF_FRAMES).or_else(|| {
        attributes
            .get_str(keywords::NUMBER_OF_FRAMES)
            .and_then(|s| s.trim().parse().ok())
    })
}
