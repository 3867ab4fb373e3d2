use ffguard_core::{meta, AudioCodec, EncoderInfo, MuxerInfo, TranscodingContext};
use log::{debug, info};
use serde_json::Value;

use super::{load_metadata, load_params_json, Session};
use crate::cli::{CheckArgs, ProbeArgs, ValidateArgs};
use crate::error::{CliErrorContext, CliResult};
use crate::output::{print_heading, print_info, print_section, print_success};

/// One-line description of a stream for the probe summary.
fn describe_stream(stream: &Value) -> String {
    let text = |key: &str| stream.get(key).and_then(Value::as_str);
    let codec = text("codec_name").unwrap_or("unknown codec");

    let mut details = vec![codec.to_string()];
    match text("codec_type") {
        Some("video") => {
            if let (Some(w), Some(h)) = (
                stream.get("width").and_then(Value::as_u64),
                stream.get("height").and_then(Value::as_u64),
            ) {
                details.push(format!("{w}x{h}"));
            }
            if let Some(rate) = text("r_frame_rate") {
                details.push(format!("{rate} fps"));
            }
        }
        Some("audio") => {
            if let Some(channels) = stream.get("channels").and_then(Value::as_u64) {
                details.push(format!("{channels} channels"));
            }
            if let Some(rate) = text("sample_rate") {
                details.push(format!("{rate} Hz"));
            }
        }
        _ => {}
    }
    details.join(", ")
}

/// Execute the `probe` command
pub fn run_probe(session: &Session, args: &ProbeArgs) -> CliResult<()> {
    let metadata = session
        .toolkit()
        .probe(&args.file)
        .cli_with_context(|| format!("Failed to probe {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    print_heading(&args.file.display().to_string());
    print_info("Format", meta::get_format(&metadata).unwrap_or("unknown"));
    match meta::get_duration(&metadata) {
        Ok(duration) => print_info("Duration", format!("{duration:.3} s")),
        Err(e) => debug!("No duration: {e}"),
    }

    print_section("Streams");
    for stream in meta::get_streams(&metadata, None) {
        let index = stream.get("index").and_then(Value::as_u64);
        let codec_type = stream.get("codec_type").and_then(Value::as_str).unwrap_or("unknown");
        let label = match index {
            Some(index) => format!("#{index} {codec_type}"),
            None => codec_type.to_string(),
        };
        print_info(&label, describe_stream(stream));
    }
    Ok(())
}

/// Execute the `validate` command
pub fn run_validate(session: &Session, args: &ValidateArgs) -> CliResult<()> {
    let metadata = load_metadata(session, args.file.as_deref(), args.metadata.as_deref())?;
    session.validator().validate_video(&metadata)?;
    print_success("Video is supported");
    Ok(())
}

/// Execute the `check` command
pub fn run_check(session: &Session, args: &CheckArgs) -> CliResult<()> {
    let metadata = load_metadata(session, args.file.as_deref(), args.metadata.as_deref())?;
    let params = session
        .validator()
        .decode_transcoding_params(&load_params_json(&args.params)?, &metadata)?;
    let toolkit = session.toolkit();

    let muxer_info: Option<MuxerInfo> = if args.muxer_info {
        let container = params
            .container
            .as_deref()
            .cli_context("--muxer-info needs a target container")?;
        let muxer_info = toolkit
            .query_muxer_info(container)
            .cli_with_context(|| format!("Failed to query muxer {container}"))?;
        info!(
            "Default audio codec of {container}: {}",
            muxer_info.default_audio_codec.as_deref().unwrap_or("none")
        );
        Some(muxer_info)
    } else {
        None
    };

    let encoder_info: Option<EncoderInfo> = if args.encoder_info {
        let codec = params
            .audio
            .codec
            .as_deref()
            .or_else(|| muxer_info.as_ref().and_then(|m| m.default_audio_codec.as_deref()))
            .cli_context("--encoder-info needs a target audio codec")?;
        match AudioCodec::from_name(codec)?.encoder_in(&session.registry) {
            Some(encoder) => Some(
                toolkit
                    .query_encoder_info(encoder)
                    .cli_with_context(|| format!("Failed to query encoder {encoder}"))?,
            ),
            None => None,
        }
    } else {
        None
    };

    let context = TranscodingContext {
        muxer_info: muxer_info.as_ref(),
        audio_encoder_info: encoder_info.as_ref(),
        strip_unsupported_data: args.strip_data,
        strip_unsupported_subtitles: args.strip_subtitles,
    };
    session
        .validator()
        .validate_transcoding_params(&params, &metadata, context)?;

    print_success("Transcoding parameters are valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_stream() {
        let video = json!({"codec_type": "video", "codec_name": "h264",
                           "width": 1280, "height": 720, "r_frame_rate": "24/1"});
        assert_eq!(describe_stream(&video), "h264, 1280x720, 24/1 fps");

        let audio = json!({"codec_type": "audio", "codec_name": "aac",
                           "channels": 2, "sample_rate": "48000"});
        assert_eq!(describe_stream(&audio), "aac, 2 channels, 48000 Hz");

        assert_eq!(describe_stream(&json!({"codec_type": "data"})), "unknown codec");
    }
}
