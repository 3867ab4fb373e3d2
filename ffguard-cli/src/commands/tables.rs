use ffguard_core::{AudioCodec, Container, SubtitleCodec, VideoCodec};
use std::collections::BTreeSet;

use super::Session;
use crate::cli::{CodecKind, CodecsArgs, ConversionsArgs};
use crate::error::{CliErrorContext, CliResult};
use crate::output::{print_heading, print_info, print_list, print_section};

/// Execute the `formats` command
pub fn run_formats(session: &Session) -> CliResult<()> {
    print_heading("Supported Formats");
    for container in Container::ALL {
        if container.is_exclusive_demuxer() {
            print_info(
                container.as_str(),
                format!(
                    "demuxer only, intermediate muxer {}",
                    container.intermediate_muxer_in(&session.registry)
                ),
            );
        } else {
            print_info(
                container.as_str(),
                format!("read back as {}", container.demuxer_in(&session.registry)),
            );
        }
    }
    Ok(())
}

/// Execute the `codecs` command
pub fn run_codecs(session: &Session, args: &CodecsArgs) -> CliResult<()> {
    let container = Container::from_name(&args.container)?;
    let registry = &session.registry;

    print_heading(&format!("Codecs for {container}"));
    print_list("Video", container.supported_video_codecs_in(registry));
    print_list("Audio", container.supported_audio_codecs_in(registry));
    print_list("Subtitle", container.supported_subtitle_codecs_in(registry));
    Ok(())
}

fn conversions_for(session: &Session, codec: &str, kind: CodecKind) -> CliResult<BTreeSet<String>> {
    let registry = &session.registry;
    let targets: BTreeSet<&str> = match kind {
        CodecKind::Video => VideoCodec::from_name(codec)?.supported_conversions_in(registry),
        CodecKind::Audio => AudioCodec::from_name(codec)?.supported_conversions_in(registry),
        CodecKind::Subtitle => SubtitleCodec::from_name(codec)?.supported_conversions_in(registry),
    };
    Ok(targets.into_iter().map(str::to_string).collect())
}

/// Execute the `conversions` command
pub fn run_conversions(session: &Session, args: &ConversionsArgs) -> CliResult<()> {
    let kinds = match args.kind {
        Some(kind) => vec![kind],
        None => vec![CodecKind::Video, CodecKind::Audio, CodecKind::Subtitle],
    };

    let mut found = Vec::new();
    for kind in kinds {
        match conversions_for(session, &args.codec, kind) {
            Ok(targets) => found.push((kind, targets)),
            // An explicit kind reports the codec-specific error
            Err(e) if args.kind.is_some() => return Err(e),
            Err(_) => {}
        }
    }

    let found = (!found.is_empty())
        .then_some(found)
        .cli_with_context(|| format!("Unknown codec: {}", args.codec))?;

    print_heading(&format!("Conversions from {}", args.codec));
    for (kind, targets) in found {
        print_section(match kind {
            CodecKind::Video => "Video",
            CodecKind::Audio => "Audio",
            CodecKind::Subtitle => "Subtitle",
        });
        print_list("Targets", targets);
    }
    Ok(())
}

/// Execute the `tables` command
pub fn run_tables(session: &Session) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&session.registry)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffguard_core::CoreConfig;

    fn session() -> Session {
        Session::new(CoreConfig::default()).unwrap()
    }

    #[test]
    fn test_conversions_for_each_kind() {
        let session = session();

        let video = conversions_for(&session, "h264", CodecKind::Video).unwrap();
        assert!(video.contains("h264"));

        let subtitle = conversions_for(&session, "subrip", CodecKind::Subtitle).unwrap();
        assert!(subtitle.contains("mov_text"));

        assert!(conversions_for(&session, "subrip", CodecKind::Video).is_err());
    }

    #[test]
    fn test_unknown_codec_is_reported() {
        let args = ConversionsArgs {
            codec: "bla".to_string(),
            kind: None,
        };
        let err = run_conversions(&session(), &args).unwrap_err();
        assert_eq!(err.to_string(), "Unknown codec: bla");
    }
}
