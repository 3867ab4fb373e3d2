// ============================================================================
// ffguard-core/src/validation.rs
// ============================================================================
//
// VALIDATION: Checking Requested Conversions Against the Rule Tables
//
// The validation engine answers one question: can the file described by this
// probed metadata be converted with these target parameters? It runs a fixed
// pipeline of checks and stops at the first violation, returning an error that
// names the offending values. Later checks rely on earlier ones having passed
// (the frame-rate check needs a confirmed target video codec, for example).
//
// Pipeline of `validate_transcoding_params`:
// 1. Source format is a known container and the file has a video stream
// 2. Target container is a known muxer (not an exclusive demuxer)
// 3. Target and source video codecs are supported by their containers
// 4. Every source video codec can be converted to the target codec
// 5. Audio codecs, channel layouts and sample rates (only with audio streams)
// 6. Aspect ratio is preserved for every source resolution
// 7. Frame rate, derived from the source when not given explicitly
// 8. Data and subtitle streams can be carried over or are being stripped
//
// All checks are methods on `Validator`, which borrows a `Registry`. Free
// functions with the same names use `Registry::standard()`.

// ---- External crate imports ----
use log::{debug, trace};
use serde_json::Value;

// ---- Internal crate imports ----
use crate::codecs::{AudioCodec, VideoCodec};
use crate::commands::{get_lists_of_unsupported_stream_numbers_in, EncoderInfo, MuxerInfo};
use crate::error::{FfguardError, Result};
use crate::formats::{get_effective_aspect_ratio_in, Container};
use crate::frame_rate::FrameRate;
use crate::meta;
use crate::params::TranscodingParams;
use crate::registry::Registry;

/// Shows a metadata value the way it appears in error messages.
fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}

fn display_resolution(resolution: Option<[u32; 2]>) -> String {
    match resolution {
        Some([width, height]) => format!("[{width}, {height}]"),
        None => "unknown".to_string(),
    }
}

/// Options for [`Validator::validate_transcoding_params`] beyond the target
/// parameters and the source metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscodingContext<'a> {
    /// Introspected target muxer. When present and no audio codec is given,
    /// its default audio codec becomes the target audio codec.
    pub muxer_info: Option<&'a MuxerInfo>,
    /// Introspected target audio encoder, consulted for sample rates.
    pub audio_encoder_info: Option<&'a EncoderInfo>,
    pub strip_unsupported_data: bool,
    pub strip_unsupported_subtitles: bool,
}

/// Runs validation checks against one set of rule tables.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r Registry,
}

impl Default for Validator<'static> {
    fn default() -> Self {
        Validator::new(Registry::standard())
    }
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Validator { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    // ========================================================================
    // SINGLE-FILE VALIDATION
    // ========================================================================

    /// Checks that a probed file is something the tables know how to handle:
    /// a supported format with at least one video stream, and only video and
    /// audio codecs that the format supports.
    pub fn validate_video(&self, metadata: &Value) -> Result<()> {
        self.validate_format_metadata(metadata)?;

        let Some(streams) = metadata.get("streams").and_then(Value::as_array) else {
            return Err(FfguardError::InvalidVideo(
                "Video with invalid metadata".to_string(),
            ));
        };

        let format = meta::get_format(metadata).unwrap_or_default();
        self.validate_format(format)?;
        self.validate_video_stream_existence(metadata)?;

        for stream in streams {
            let codec_type = stream
                .get("codec_type")
                .and_then(Value::as_str)
                .map(str::to_lowercase);
            let codec = stream.get("codec_name").and_then(Value::as_str);

            match (codec_type.as_deref(), codec) {
                (Some("video"), Some(codec)) => self.validate_video_codec(format, codec)?,
                (Some("audio"), Some(codec)) => self.validate_audio_codec(format, codec)?,
                (Some("video"), None) => {
                    return Err(FfguardError::InvalidVideo(
                        "Video stream without specified codec".to_string(),
                    ));
                }
                (Some("audio"), None) => {
                    return Err(FfguardError::InvalidVideo(
                        "Audio stream without specified codec".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    pub fn validate_format_metadata(&self, metadata: &Value) -> Result<()> {
        if metadata.get("format").and_then(Value::as_object).is_none() {
            return Err(FfguardError::InvalidFormatMetadata(
                "Invalid format metadata".to_string(),
            ));
        }

        match meta::get_format(metadata) {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(FfguardError::InvalidFormatMetadata(
                "No format names".to_string(),
            )),
        }
    }

    pub fn validate_video_stream_existence(&self, metadata: &Value) -> Result<()> {
        let Some(streams) = metadata.get("streams").and_then(Value::as_array) else {
            return Err(FfguardError::InvalidVideo("Invalid stream metadata".to_string()));
        };

        let mut has_video = false;
        for stream in streams {
            let Some(codec_type) = stream.get("codec_type").and_then(Value::as_str) else {
                return Err(FfguardError::InvalidVideo("Invalid stream metadata".to_string()));
            };
            has_video |= codec_type.eq_ignore_ascii_case("video");
        }

        if has_video {
            Ok(())
        } else {
            Err(FfguardError::MissingVideoStream)
        }
    }

    // ========================================================================
    // INDIVIDUAL CHECKS
    // ========================================================================

    pub fn validate_format(&self, format: &str) -> Result<Container> {
        Container::from_name(format)
    }

    /// Like [`Self::validate_format`], but also rejects exclusive demuxers,
    /// which cannot be written.
    pub fn validate_target_format(&self, format: &str) -> Result<Container> {
        let container = self.validate_format(format)?;
        if container.is_exclusive_demuxer() {
            return Err(FfguardError::UnsupportedTargetVideoFormat(format.to_string()));
        }
        Ok(container)
    }

    pub fn validate_video_codec(&self, format: &str, codec: &str) -> Result<()> {
        let supported = Container::from_name(format)
            .is_ok_and(|c| c.is_supported_video_codec_in(codec, self.registry));
        if !supported {
            return Err(FfguardError::UnsupportedVideoCodec {
                codec: codec.to_string(),
                container: format.to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_audio_codec(&self, format: &str, codec: &str) -> Result<()> {
        let supported = Container::from_name(format)
            .is_ok_and(|c| c.is_supported_audio_codec_in(codec, self.registry));
        if !supported {
            return Err(FfguardError::UnsupportedAudioCodec {
                codec: codec.to_string(),
                container: format.to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_video_codec_conversion(&self, src_codec: &str, dst_codec: &str) -> Result<()> {
        if !VideoCodec::from_name(src_codec)?.can_convert_in(dst_codec, self.registry) {
            return Err(FfguardError::UnsupportedVideoCodecConversion {
                src: src_codec.to_string(),
                dst: dst_codec.to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_audio_codec_conversion(&self, src_codec: &str, dst_codec: &str) -> Result<()> {
        if !AudioCodec::from_name(src_codec)?.can_convert_in(dst_codec, self.registry) {
            return Err(FfguardError::UnsupportedAudioCodecConversion {
                src: src_codec.to_string(),
                dst: dst_codec.to_string(),
            });
        }
        Ok(())
    }

    /// Accepts only resolutions with exactly the same effective aspect ratio.
    pub fn validate_resolution(&self, src: [u32; 2], dst: [u32; 2]) -> Result<()> {
        let src_ratio = get_effective_aspect_ratio_in(src, self.registry);
        let dst_ratio = get_effective_aspect_ratio_in(dst, self.registry);
        if src_ratio != dst_ratio {
            return Err(FfguardError::InvalidResolution {
                src: display_resolution(Some(src)),
                dst: display_resolution(Some(dst)),
            });
        }
        Ok(())
    }

    /// Resolves and checks the frame rate the output will have.
    ///
    /// An explicit target is used as given. Otherwise the source rate is
    /// capped to the codec's maximum, or replaced according to the codec's
    /// substitution table, or kept. The result must be one of the supported
    /// frame rates once normalized. Returns the resolved rate.
    pub fn validate_frame_rate(
        &self,
        src_frame_rate: Option<&Value>,
        dst_frame_rate: Option<FrameRate>,
        dst_video_codec: &str,
    ) -> Result<FrameRate> {
        let invalid = |dst: String| FfguardError::InvalidFrameRate {
            src: display_value(src_frame_rate),
            dst,
        };

        let target = match dst_frame_rate {
            Some(explicit) => explicit,
            None => {
                let src = src_frame_rate
                    .ok_or_else(|| invalid("unknown".to_string()))
                    .and_then(|raw| {
                        FrameRate::decode(raw).map_err(|_| invalid("unknown".to_string()))
                    })?;
                self.adjust_frame_rate(src, dst_video_codec)
            }
        };

        if !self.registry.frame_rates.contains(&target.normalized()) {
            return Err(invalid(target.to_string()));
        }

        trace!("Frame rate {} accepted for {}", target, dst_video_codec);
        Ok(target)
    }

    fn adjust_frame_rate(&self, src: FrameRate, codec: &str) -> FrameRate {
        if let Some(max) = self.registry.max_frame_rates.get(codec) {
            let exceeds = u128::from(src.dividend()) * u128::from(max.divisor())
                > u128::from(max.dividend()) * u128::from(src.divisor());
            if exceeds {
                debug!("Capping frame rate {} to {} for {}", src, max, codec);
                return *max;
            }
        }

        let normalized = src.normalized();
        let substitute = self
            .registry
            .frame_rate_substitutions
            .get(codec)
            .and_then(|subs| subs.iter().find(|s| s.from.normalized() == normalized));
        if let Some(substitution) = substitute {
            debug!("Substituting frame rate {} with {} for {}", src, substitution.to, codec);
            return substitution.to;
        }

        src
    }

    /// Fails when the file has data or subtitle streams that cannot be
    /// carried into `container` and the matching strip flag is not set.
    pub fn validate_unsupported_streams(
        &self,
        metadata: &Value,
        container: Option<&str>,
        strip_unsupported_data: bool,
        strip_unsupported_subtitles: bool,
    ) -> Result<()> {
        let container = match container {
            Some(name) if Container::is_supported(name) => name,
            _ => {
                return Err(FfguardError::InvalidVideo(
                    "Target container is required to validate subtitle streams".to_string(),
                ));
            }
        };

        let (data, subtitles) =
            get_lists_of_unsupported_stream_numbers_in(metadata, Some(container), self.registry);

        if !strip_unsupported_data && !data.is_empty() {
            return Err(FfguardError::UnsupportedStream {
                stream_type: "data".to_string(),
                indexes: data,
            });
        }

        if !strip_unsupported_subtitles && !subtitles.is_empty() {
            return Err(FfguardError::UnsupportedSubtitleCodecConversion {
                container: container.to_string(),
                indexes: subtitles,
            });
        }

        Ok(())
    }

    // ========================================================================
    // FULL PIPELINE
    // ========================================================================

    /// Checks whether the file described by `src_metadata` can be transcoded
    /// with `dst_params`. Stops at the first failing check.
    pub fn validate_transcoding_params(
        &self,
        dst_params: &TranscodingParams,
        src_metadata: &Value,
        context: TranscodingContext<'_>,
    ) -> Result<()> {
        // 1. Source format
        let src_format = meta::get_format(src_metadata).ok_or_else(|| {
            FfguardError::InvalidFormatMetadata("Missing format name".to_string())
        })?;
        self.validate_format(src_format)?;
        self.validate_video_stream_existence(src_metadata)?;

        // 2. Target format
        let dst_format = dst_params.container.as_deref().ok_or_else(|| {
            FfguardError::InvalidArgument("Missing target container".to_string())
        })?;
        self.validate_target_format(dst_format)?;

        // 3. Video codecs supported by their containers
        let dst_video_codec = dst_params
            .video
            .codec
            .as_deref()
            .ok_or(FfguardError::MissingVideoCodec)?;
        self.validate_video_codec(dst_format, dst_video_codec)?;

        let src_video_codecs: Vec<String> =
            meta::get_attribute_from_all_streams(src_metadata, "codec_name", Some("video"))
                .into_iter()
                .map(display_value)
                .collect();
        for codec in &src_video_codecs {
            self.validate_video_codec(src_format, codec)?;
        }

        // 4. Video conversion paths
        for codec in &src_video_codecs {
            self.validate_video_codec_conversion(codec, dst_video_codec)?;
        }

        // 5. Audio
        if meta::count_streams(src_metadata, Some("audio")) > 0 {
            self.validate_audio(dst_params, src_metadata, src_format, dst_format, &context)?;
        }

        // 6. Aspect ratio
        let dst_resolution = dst_params.resolution.ok_or_else(|| {
            FfguardError::InvalidArgument("Missing target resolution".to_string())
        })?;
        for src_resolution in meta::get_resolutions(src_metadata) {
            let Some(src_resolution) = src_resolution else {
                return Err(FfguardError::InvalidResolution {
                    src: display_resolution(None),
                    dst: display_resolution(Some(dst_resolution)),
                });
            };
            self.validate_resolution(src_resolution, dst_resolution)?;
        }

        // 7. Frame rate
        for src_frame_rate in meta::get_frame_rates(src_metadata) {
            self.validate_frame_rate(src_frame_rate, dst_params.frame_rate, dst_video_codec)?;
        }

        // 8. Data and subtitle streams
        self.validate_unsupported_streams(
            src_metadata,
            Some(dst_format),
            context.strip_unsupported_data,
            context.strip_unsupported_subtitles,
        )?;

        debug!("Transcoding to {} with {} is valid", dst_format, dst_video_codec);
        Ok(())
    }

    /// Decodes target parameters for a file. An explicit frame rate that
    /// cannot be decoded is reported against the file's frame rate.
    pub fn decode_transcoding_params(
        &self,
        dst_params: &Value,
        src_metadata: &Value,
    ) -> Result<TranscodingParams> {
        TranscodingParams::from_value(dst_params).map_err(|e| match e {
            FfguardError::InvalidFrameRate { dst, .. } => FfguardError::InvalidFrameRate {
                src: display_value(meta::get_frame_rate(src_metadata)),
                dst,
            },
            other => other,
        })
    }

    /// [`Self::decode_transcoding_params`] followed by
    /// [`Self::validate_transcoding_params`]. Returns the decoded parameters.
    pub fn validate_transcoding_params_json(
        &self,
        dst_params: &Value,
        src_metadata: &Value,
        context: TranscodingContext<'_>,
    ) -> Result<TranscodingParams> {
        let params = self.decode_transcoding_params(dst_params, src_metadata)?;
        self.validate_transcoding_params(&params, src_metadata, context)?;
        Ok(params)
    }

    fn validate_audio(
        &self,
        dst_params: &TranscodingParams,
        src_metadata: &Value,
        src_format: &str,
        dst_format: &str,
        context: &TranscodingContext<'_>,
    ) -> Result<()> {
        let src_codecs: Vec<String> =
            meta::get_attribute_from_all_streams(src_metadata, "codec_name", Some("audio"))
                .into_iter()
                .map(display_value)
                .collect();
        for codec in &src_codecs {
            self.validate_audio_codec(src_format, codec)?;
        }

        let dst_codec = dst_params.audio.codec.as_deref().or_else(|| {
            context
                .muxer_info
                .and_then(|info| info.default_audio_codec.as_deref())
        });

        let Some(dst_codec) = dst_codec else {
            if context.muxer_info.is_some() {
                return Err(FfguardError::UnsupportedAudioCodecConversion {
                    src: src_codecs.join(", "),
                    dst: "unknown".to_string(),
                });
            }
            debug!("No target audio codec known; skipping audio checks");
            return Ok(());
        };

        self.validate_audio_codec(dst_format, dst_codec)?;

        let channels = meta::get_attribute_from_all_streams(src_metadata, "channels", Some("audio"));
        for (codec, channels) in src_codecs.iter().zip(channels) {
            self.validate_audio_codec_conversion(codec, dst_codec)?;

            let channels = channels.and_then(Value::as_u64).unwrap_or(0);
            if codec != dst_codec && channels > 2 {
                return Err(FfguardError::UnsupportedAudioChannelLayout(channels));
            }
        }

        let dst_audio = AudioCodec::from_name(dst_codec)?;
        for sample_rate in meta::get_sample_rates(src_metadata) {
            let supported = sample_rate.as_ref().and_then(Value::as_i64).is_some_and(|rate| {
                dst_audio.is_supported_sample_rate_in(rate, context.audio_encoder_info, self.registry)
            });
            if !supported {
                return Err(FfguardError::UnsupportedSampleRate {
                    sample_rate: display_value(sample_rate.as_ref()),
                    codec: dst_codec.to_string(),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// STANDARD-REGISTRY SHORTCUTS
// ============================================================================

pub fn validate_video(metadata: &Value) -> Result<()> {
    Validator::default().validate_video(metadata)
}

pub fn validate_transcoding_params(
    dst_params: &TranscodingParams,
    src_metadata: &Value,
    context: TranscodingContext<'_>,
) -> Result<()> {
    Validator::default().validate_transcoding_params(dst_params, src_metadata, context)
}

pub fn validate_transcoding_params_json(
    dst_params: &Value,
    src_metadata: &Value,
    context: TranscodingContext<'_>,
) -> Result<TranscodingParams> {
    Validator::default().validate_transcoding_params_json(dst_params, src_metadata, context)
}

pub fn validate_format(format: &str) -> Result<Container> {
    Validator::default().validate_format(format)
}

pub fn validate_target_format(format: &str) -> Result<Container> {
    Validator::default().validate_target_format(format)
}

pub fn validate_resolution(src: [u32; 2], dst: [u32; 2]) -> Result<()> {
    Validator::default().validate_resolution(src, dst)
}

pub fn validate_frame_rate(
    src_frame_rate: Option<&Value>,
    dst_frame_rate: Option<FrameRate>,
    dst_video_codec: &str,
) -> Result<FrameRate> {
    Validator::default().validate_frame_rate(src_frame_rate, dst_frame_rate, dst_video_codec)
}

pub fn validate_video_codec_conversion(src_codec: &str, dst_codec: &str) -> Result<()> {
    Validator::default().validate_video_codec_conversion(src_codec, dst_codec)
}

pub fn validate_audio_codec_conversion(src_codec: &str, dst_codec: &str) -> Result<()> {
    Validator::default().validate_audio_codec_conversion(src_codec, dst_codec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(format: &str, streams: Value) -> Value {
        json!({"format": {"format_name": format, "duration": "10.0"}, "streams": streams})
    }

    fn h264_stream() -> Value {
        json!({"index": 0, "codec_type": "video", "codec_name": "h264",
               "width": 1920, "height": 1080, "r_frame_rate": "25/1"})
    }

    fn aac_stream(index: u64, channels: u64, sample_rate: &str) -> Value {
        json!({"index": index, "codec_type": "audio", "codec_name": "aac",
               "channels": channels, "sample_rate": sample_rate})
    }

    #[test]
    fn test_validate_video() {
        let valid = metadata("mov,mp4,m4a,3gp,3g2,mj2", json!([h264_stream(), aac_stream(1, 2, "48000")]));
        validate_video(&valid).unwrap();

        let no_video = metadata("matroska,webm", json!([aac_stream(0, 2, "48000")]));
        assert!(matches!(validate_video(&no_video), Err(FfguardError::MissingVideoStream)));

        let bad_format = metadata("bla", json!([h264_stream()]));
        assert!(matches!(
            validate_video(&bad_format),
            Err(FfguardError::UnsupportedVideoFormat(_))
        ));

        let no_format = json!({"streams": [h264_stream()]});
        assert!(matches!(
            validate_video(&no_format),
            Err(FfguardError::InvalidFormatMetadata(_))
        ));

        let empty_format = metadata("", json!([h264_stream()]));
        assert!(matches!(
            validate_video(&empty_format),
            Err(FfguardError::InvalidFormatMetadata(_))
        ));

        let no_streams = json!({"format": {"format_name": "avi"}});
        assert!(matches!(validate_video(&no_streams), Err(FfguardError::InvalidVideo(_))));

        let bad_codec = metadata("webm", json!([h264_stream()]));
        assert!(matches!(
            validate_video(&bad_codec),
            Err(FfguardError::UnsupportedVideoCodec { .. })
        ));

        let no_codec = metadata("avi", json!([{"codec_type": "video"}]));
        assert!(matches!(validate_video(&no_codec), Err(FfguardError::InvalidVideo(_))));
    }

    #[test]
    fn test_validate_target_format() {
        assert_eq!(validate_target_format("mp4").unwrap(), Container::Mp4);
        assert!(matches!(
            validate_target_format("matroska,webm"),
            Err(FfguardError::UnsupportedTargetVideoFormat(_))
        ));
        assert!(matches!(
            validate_target_format("bla"),
            Err(FfguardError::UnsupportedVideoFormat(_))
        ));
    }

    #[test]
    fn test_validate_resolution() {
        validate_resolution([1920, 1080], [1280, 720]).unwrap();
        validate_resolution([1366, 768], [1920, 1080]).unwrap();
        assert!(matches!(
            validate_resolution([1920, 1080], [1280, 1024]),
            Err(FfguardError::InvalidResolution { .. })
        ));
        // Near-equal ratios are still rejected
        assert!(validate_resolution([1920, 1080], [1920, 1081]).is_err());
    }

    #[test]
    fn test_validate_frame_rate() {
        assert_eq!(
            validate_frame_rate(Some(&json!("30000/1001")), None, "h264").unwrap(),
            FrameRate::new(30000, 1001).unwrap()
        );
        assert_eq!(
            validate_frame_rate(Some(&json!("122")), None, "mpeg1video").unwrap(),
            FrameRate::whole(60)
        );
        assert_eq!(
            validate_frame_rate(Some(&json!("25/2")), None, "mpeg2video").unwrap(),
            FrameRate::whole(12)
        );
        assert_eq!(
            validate_frame_rate(Some(&json!("50/2")), Some(FrameRate::whole(30)), "h264").unwrap(),
            FrameRate::whole(30)
        );
        // Normalization happens before the membership check
        validate_frame_rate(Some(&json!("60/2")), None, "h264").unwrap();

        assert!(matches!(
            validate_frame_rate(Some(&json!("122")), None, "h264"),
            Err(FfguardError::InvalidFrameRate { .. })
        ));
        assert!(matches!(
            validate_frame_rate(Some(&json!("30")), Some(FrameRate::new(25, 2).unwrap()), "mpeg2video"),
            Err(FfguardError::InvalidFrameRate { .. })
        ));
        assert!(matches!(
            validate_frame_rate(Some(&json!("bla")), None, "h264"),
            Err(FfguardError::InvalidFrameRate { .. })
        ));
        assert!(validate_frame_rate(None, None, "h264").is_err());
    }

    #[test]
    fn test_codec_conversions() {
        validate_video_codec_conversion("h264", "vp8").unwrap();
        validate_audio_codec_conversion("aac", "mp3").unwrap();
        assert!(matches!(
            validate_video_codec_conversion("h264", "av1"),
            Err(FfguardError::UnsupportedVideoCodecConversion { .. })
        ));
        assert!(matches!(
            validate_audio_codec_conversion("aac", "wmav2"),
            Err(FfguardError::UnsupportedAudioCodecConversion { .. })
        ));
        assert!(matches!(
            validate_video_codec_conversion("bla", "h264"),
            Err(FfguardError::UnsupportedVideoCodec { .. })
        ));
    }

    #[test]
    fn test_unsupported_streams_require_container() {
        let src = metadata("matroska,webm", json!([h264_stream()]));
        assert!(matches!(
            Validator::default().validate_unsupported_streams(&src, None, false, false),
            Err(FfguardError::InvalidVideo(_))
        ));
    }

    #[test]
    fn test_validator_uses_injected_registry() {
        let mut registry = Registry::default();
        registry
            .video_conversions
            .get_mut("h264")
            .unwrap()
            .insert("av1".to_string());
        let validator = Validator::new(&registry);
        validator.validate_video_codec_conversion("h264", "av1").unwrap();
        assert!(validate_video_codec_conversion("h264", "av1").is_err());
    }
}
