//! Core library for checking ffmpeg conversions before running them.
//!
//! The crate knows which codecs each container can hold, which codec
//! conversions are allowed, and which frame rates, sample rates and
//! resolutions are acceptable targets. From probed metadata and requested
//! parameters it decides whether a conversion is valid, and it builds the
//! ffmpeg/ffprobe argument vectors to carry it out.
//!
//! ## Usage Example
//!
//! ```rust
//! use ffguard_core::{validate_transcoding_params, TranscodingContext, TranscodingParams};
//! use serde_json::json;
//!
//! let metadata = json!({
//!     "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "10.0"},
//!     "streams": [{
//!         "index": 0, "codec_type": "video", "codec_name": "h264",
//!         "width": 1920, "height": 1080, "r_frame_rate": "25/1"
//!     }]
//! });
//! let params = TranscodingParams::new("matroska", [1280, 720], "vp8");
//!
//! validate_transcoding_params(&params, &metadata, TranscodingContext::default()).unwrap();
//!
//! let argv = ffguard_core::transcode_video_command("in.mp4", "out.mkv", &params).unwrap();
//! assert_eq!(argv[..4], ["ffmpeg", "-nostdin", "-i", "in.mp4"]);
//! ```

pub mod codecs;
pub mod commands;
pub mod config;
pub mod error;
pub mod formats;
pub mod frame_rate;
pub mod logging;
pub mod meta;
pub mod params;
pub mod registry;
pub mod tools;
pub mod utils;
pub mod validation;

// Re-exports for public API
pub use codecs::{AudioCodec, SubtitleCodec, VideoCodec};
pub use commands::{
    replace_streams_command, transcode_video_command, CommandBuilder, EncoderInfo, MuxerInfo,
    StreamReplacement,
};
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{FfguardError, Result};
pub use formats::Container;
pub use frame_rate::{FrameRate, FrameRateError};
pub use params::{create_params, AudioParams, TranscodingParams, VideoParams};
pub use registry::Registry;
pub use tools::{ReplaceOptions, Toolkit};
pub use utils::{CommandOutput, ProcessRunner, SystemRunner};
pub use validation::{validate_transcoding_params, validate_video, TranscodingContext, Validator};
