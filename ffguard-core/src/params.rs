//! Target transcoding parameters
//!
//! The same structure is accepted by the validation engine and by the command
//! builders. Every field is optional here; which ones are required depends on
//! the consumer (a transcode validation needs a container, a video codec and
//! a resolution).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FfguardError, Result};
use crate::frame_rate::FrameRate;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
}

impl VideoParams {
    pub fn is_empty(&self) -> bool {
        self.codec.is_none() && self.bitrate.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
}

impl AudioParams {
    pub fn is_empty(&self) -> bool {
        self.codec.is_none() && self.bitrate.is_none()
    }
}

/// Requested output parameters.
///
/// In JSON the frame rate may be written as `"30000/1001"`, `25` or `[25, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "VideoParams::is_empty")]
    pub video: VideoParams,
    #[serde(skip_serializing_if = "AudioParams::is_empty")]
    pub audio: AudioParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<FrameRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling_alg: Option<String>,
}

impl TranscodingParams {
    /// Parameters with the three values a transcode always needs.
    pub fn new(container: &str, resolution: [u32; 2], video_codec: &str) -> Self {
        TranscodingParams {
            container: Some(container.to_string()),
            resolution: Some(resolution),
            video: VideoParams {
                codec: Some(video_codec.to_string()),
                bitrate: None,
            },
            ..Default::default()
        }
    }

    /// Decodes parameters from JSON.
    ///
    /// An explicit frame rate that cannot be decoded fails with
    /// `InvalidFrameRate`; the source rate is not known here and is reported
    /// as `unknown`.
    pub fn from_value(value: &Value) -> Result<Self> {
        if let Some(raw) = value.get("frame_rate").filter(|raw| !raw.is_null()) {
            if FrameRate::decode(raw).is_err() {
                return Err(FfguardError::InvalidFrameRate {
                    src: "unknown".to_string(),
                    dst: raw.as_str().map_or_else(|| raw.to_string(), str::to_string),
                });
            }
        }
        Ok(Self::deserialize(value)?)
    }

    #[must_use]
    pub fn with_container(mut self, container: &str) -> Self {
        self.container = Some(container.to_string());
        self
    }

    #[must_use]
    pub fn with_video_codec(mut self, codec: &str) -> Self {
        self.video.codec = Some(codec.to_string());
        self
    }

    #[must_use]
    pub fn with_video_bitrate(mut self, bitrate: &str) -> Self {
        self.video.bitrate = Some(bitrate.to_string());
        self
    }

    #[must_use]
    pub fn with_audio_codec(mut self, codec: &str) -> Self {
        self.audio.codec = Some(codec.to_string());
        self
    }

    #[must_use]
    pub fn with_audio_bitrate(mut self, bitrate: &str) -> Self {
        self.audio.bitrate = Some(bitrate.to_string());
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, resolution: [u32; 2]) -> Self {
        self.resolution = Some(resolution);
        self
    }

    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    #[must_use]
    pub fn with_scaling_alg(mut self, scaling_alg: &str) -> Self {
        self.scaling_alg = Some(scaling_alg.to_string());
        self
    }

    /// True when anything that changes the video stream is set.
    pub fn has_video_params(&self) -> bool {
        !self.video.is_empty()
            || self.resolution.is_some()
            || self.frame_rate.is_some()
            || self.scaling_alg.is_some()
    }

    pub fn has_audio_params(&self) -> bool {
        !self.audio.is_empty()
    }
}

/// Builds a full parameter set in one call.
#[allow(clippy::too_many_arguments)]
pub fn create_params(
    container: &str,
    resolution: [u32; 2],
    video_codec: &str,
    audio_codec: Option<&str>,
    frame_rate: Option<FrameRate>,
    video_bitrate: Option<&str>,
    audio_bitrate: Option<&str>,
    scaling_alg: Option<&str>,
) -> TranscodingParams {
    TranscodingParams {
        container: Some(container.to_string()),
        video: VideoParams {
            codec: Some(video_codec.to_string()),
            bitrate: video_bitrate.map(str::to_string),
        },
        audio: AudioParams {
            codec: audio_codec.map(str::to_string),
            bitrate: audio_bitrate.map(str::to_string),
        },
        resolution: Some(resolution),
        frame_rate,
        scaling_alg: scaling_alg.map(str::to_string),
    }
}
