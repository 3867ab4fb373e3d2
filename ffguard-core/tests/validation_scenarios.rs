// ffguard-core/tests/validation_scenarios.rs
//
// End-to-end checks of `validate_transcoding_params` on realistic ffprobe
// metadata: one scenario per rule family.

use ffguard_core::validation::validate_transcoding_params_json;
use ffguard_core::{
    validate_transcoding_params, Container, EncoderInfo, FfguardError, FrameRate, MuxerInfo,
    TranscodingContext, TranscodingParams, Validator,
};
use serde_json::{json, Value};

const QUICK_TIME: &str = "mov,mp4,m4a,3gp,3g2,mj2";

fn metadata(format: &str, streams: Vec<Value>) -> Value {
    json!({
        "format": {"format_name": format, "duration": "46.665", "nb_streams": streams.len()},
        "streams": streams
    })
}

fn video(index: u64, codec: &str, resolution: [u32; 2], frame_rate: &str) -> Value {
    json!({
        "index": index, "codec_type": "video", "codec_name": codec,
        "width": resolution[0], "height": resolution[1], "r_frame_rate": frame_rate
    })
}

fn audio(index: u64, codec: &str, channels: u64, sample_rate: &str) -> Value {
    json!({
        "index": index, "codec_type": "audio", "codec_name": codec,
        "channels": channels, "sample_rate": sample_rate
    })
}

fn typed(index: u64, codec_type: &str, codec: &str) -> Value {
    json!({"index": index, "codec_type": codec_type, "codec_name": codec})
}

fn h264_mp4() -> Value {
    metadata(
        QUICK_TIME,
        vec![
            video(0, "h264", [1280, 720], "24/1"),
            audio(1, "aac", 2, "44100"),
        ],
    )
}

#[test]
fn test_valid_vp8_matroska_transcode() {
    let params = TranscodingParams::new("matroska", [640, 360], "vp8")
        .with_frame_rate(FrameRate::whole(25))
        .with_audio_codec("vorbis");

    validate_transcoding_params(&params, &h264_mp4(), TranscodingContext::default()).unwrap();
}

#[test]
fn test_container_names_ignore_case() {
    assert_eq!(
        Validator::default().validate_target_format("MP4").unwrap(),
        Container::Mp4
    );

    let params = TranscodingParams::new("MP4", [640, 360], "h264");
    let source = metadata("Matroska,WebM", vec![video(0, "h264", [1280, 720], "24/1")]);
    validate_transcoding_params(&params, &source, TranscodingContext::default()).unwrap();
}

#[test]
fn test_missing_target_values() {
    let context = TranscodingContext::default();

    let mut params = TranscodingParams::new("matroska", [640, 360], "vp8");
    params.container = None;
    assert!(matches!(
        validate_transcoding_params(&params, &h264_mp4(), context),
        Err(FfguardError::InvalidArgument(_))
    ));

    let mut params = TranscodingParams::new("matroska", [640, 360], "vp8");
    params.video.codec = None;
    assert!(matches!(
        validate_transcoding_params(&params, &h264_mp4(), context),
        Err(FfguardError::MissingVideoCodec)
    ));

    let mut params = TranscodingParams::new("matroska", [640, 360], "vp8");
    params.resolution = None;
    assert!(matches!(
        validate_transcoding_params(&params, &h264_mp4(), context),
        Err(FfguardError::InvalidArgument(_))
    ));
}

#[test]
fn test_source_without_video_is_rejected() {
    let params = TranscodingParams::new("mp4", [1920, 1080], "h264");

    let no_streams = json!({"format": {"format_name": QUICK_TIME}});
    assert!(matches!(
        validate_transcoding_params(&params, &no_streams, TranscodingContext::default()),
        Err(FfguardError::InvalidVideo(_))
    ));

    let audio_only = metadata(QUICK_TIME, vec![audio(0, "aac", 2, "44100")]);
    assert!(matches!(
        validate_transcoding_params(&params, &audio_only, TranscodingContext::default()),
        Err(FfguardError::MissingVideoStream)
    ));
}

#[test]
fn test_target_must_be_a_muxer() {
    let params = TranscodingParams::new(QUICK_TIME, [640, 360], "h264");
    assert!(matches!(
        validate_transcoding_params(&params, &h264_mp4(), TranscodingContext::default()),
        Err(FfguardError::UnsupportedTargetVideoFormat(_))
    ));
}

#[test]
fn test_target_codec_must_fit_container() {
    let params = TranscodingParams::new("webm", [640, 360], "h264");
    let error =
        validate_transcoding_params(&params, &h264_mp4(), TranscodingContext::default()).unwrap_err();

    assert!(matches!(error, FfguardError::UnsupportedVideoCodec { .. }));
    assert!(error.is_invalid_video());
}

#[test]
fn test_aspect_ratio_must_be_preserved() {
    let params = TranscodingParams::new("matroska", [800, 600], "vp8");
    assert!(matches!(
        validate_transcoding_params(&params, &h264_mp4(), TranscodingContext::default()),
        Err(FfguardError::InvalidResolution { .. })
    ));
}

#[test]
fn test_frame_rate_capped_for_mpeg1() {
    let source = metadata(QUICK_TIME, vec![video(0, "h264", [1920, 1080], "122")]);
    let params = TranscodingParams::new("mov", [1280, 720], "mpeg1video");

    validate_transcoding_params(&params, &source, TranscodingContext::default()).unwrap();
    assert_eq!(
        Validator::default()
            .validate_frame_rate(Some(&json!("122")), None, "mpeg1video")
            .unwrap(),
        FrameRate::whole(60)
    );
}

#[test]
fn test_frame_rate_substitution_for_mpeg2() {
    let source = metadata(QUICK_TIME, vec![video(0, "h264", [1920, 1080], "25/2")]);

    let derived = TranscodingParams::new("matroska", [1280, 720], "mpeg2video");
    validate_transcoding_params(&derived, &source, TranscodingContext::default()).unwrap();

    let explicit = derived.with_frame_rate(FrameRate::new(25, 2).unwrap());
    assert!(matches!(
        validate_transcoding_params(&explicit, &source, TranscodingContext::default()),
        Err(FfguardError::InvalidFrameRate { .. })
    ));
}

#[test]
fn test_undecodable_frame_rate_in_json_params() {
    let source = metadata(QUICK_TIME, vec![video(0, "h264", [1920, 1080], "24/1")]);
    let params = json!({"container": "matroska", "video": {"codec": "vp9"},
                        "resolution": [1280, 720], "frame_rate": "30.5"});

    assert!(matches!(
        validate_transcoding_params_json(&params, &source, TranscodingContext::default()),
        Err(FfguardError::InvalidFrameRate { src, dst }) if src == "24/1" && dst == "30.5"
    ));

    let params = json!({"container": "matroska", "video": {"codec": "vp9"},
                        "resolution": [1280, 720], "frame_rate": [30, 1]});
    let decoded =
        validate_transcoding_params_json(&params, &source, TranscodingContext::default()).unwrap();
    assert_eq!(decoded.frame_rate, Some(FrameRate::whole(30)));
}

#[test]
fn test_unusual_source_frame_rate_needs_explicit_target() {
    let source = metadata(QUICK_TIME, vec![video(0, "h264", [1920, 1080], "17/1")]);

    let derived = TranscodingParams::new("matroska", [1920, 1080], "vp9");
    assert!(matches!(
        validate_transcoding_params(&derived, &source, TranscodingContext::default()),
        Err(FfguardError::InvalidFrameRate { .. })
    ));

    let explicit = derived.with_frame_rate(FrameRate::whole(30));
    validate_transcoding_params(&explicit, &source, TranscodingContext::default()).unwrap();
}

#[test]
fn test_muxer_default_audio_codec_is_used() {
    let params = TranscodingParams::new("matroska", [640, 360], "vp8");
    let vorbis = MuxerInfo {
        default_audio_codec: Some("vorbis".to_string()),
    };
    let context = TranscodingContext {
        muxer_info: Some(&vorbis),
        ..Default::default()
    };
    validate_transcoding_params(&params, &h264_mp4(), context).unwrap();

    // A default the container cannot hold is reported as such
    let amr_nb = MuxerInfo {
        default_audio_codec: Some("amr_nb".to_string()),
    };
    let context = TranscodingContext {
        muxer_info: Some(&amr_nb),
        ..Default::default()
    };
    assert!(matches!(
        validate_transcoding_params(&params, &h264_mp4(), context),
        Err(FfguardError::UnsupportedAudioCodec { .. })
    ));

    let unknown = MuxerInfo::default();
    let context = TranscodingContext {
        muxer_info: Some(&unknown),
        ..Default::default()
    };
    assert!(matches!(
        validate_transcoding_params(&params, &h264_mp4(), context),
        Err(FfguardError::UnsupportedAudioCodecConversion { dst, .. }) if dst == "unknown"
    ));
}

#[test]
fn test_multichannel_audio_cannot_change_codec() {
    let source = metadata(
        QUICK_TIME,
        vec![video(0, "h264", [1280, 720], "24/1"), audio(1, "aac", 6, "48000")],
    );

    let reencode = TranscodingParams::new("matroska", [640, 360], "vp8").with_audio_codec("mp3");
    assert!(matches!(
        validate_transcoding_params(&reencode, &source, TranscodingContext::default()),
        Err(FfguardError::UnsupportedAudioChannelLayout(6))
    ));

    let keep = TranscodingParams::new("matroska", [640, 360], "vp8").with_audio_codec("aac");
    validate_transcoding_params(&keep, &source, TranscodingContext::default()).unwrap();
}

#[test]
fn test_sample_rates() {
    let source = metadata(
        QUICK_TIME,
        vec![video(0, "h264", [1280, 720], "24/1"), audio(1, "aac", 2, "96000")],
    );
    let params = TranscodingParams::new("matroska", [640, 360], "vp8").with_audio_codec("mp3");

    assert!(matches!(
        validate_transcoding_params(&params, &source, TranscodingContext::default()),
        Err(FfguardError::UnsupportedSampleRate { sample_rate, codec })
            if sample_rate == "96000" && codec == "mp3"
    ));

    // Introspected encoder capabilities take precedence over the tables
    let info = EncoderInfo {
        sample_rates: Some(vec![96000]),
    };
    let context = TranscodingContext {
        audio_encoder_info: Some(&info),
        ..Default::default()
    };
    validate_transcoding_params(&params, &source, context).unwrap();
}

#[test]
fn test_unsupported_streams_and_strip_flags() {
    let source = metadata(
        QUICK_TIME,
        vec![
            video(0, "h264", [1280, 720], "24/1"),
            typed(1, "data", "tmcd"),
            typed(2, "subtitle", "dvd_subtitle"),
        ],
    );
    let params = TranscodingParams::new("mp4", [640, 360], "h264");

    assert!(matches!(
        validate_transcoding_params(&params, &source, TranscodingContext::default()),
        Err(FfguardError::UnsupportedStream { indexes, .. }) if indexes == vec![1]
    ));

    let strip_data = TranscodingContext {
        strip_unsupported_data: true,
        ..Default::default()
    };
    assert!(matches!(
        validate_transcoding_params(&params, &source, strip_data),
        Err(FfguardError::UnsupportedSubtitleCodecConversion { indexes, .. }) if indexes == vec![2]
    ));

    let strip_both = TranscodingContext {
        strip_unsupported_data: true,
        strip_unsupported_subtitles: true,
        ..Default::default()
    };
    validate_transcoding_params(&params, &source, strip_both).unwrap();
}
