// ============================================================================
// ffguard-core/src/commands/builder.rs
// ============================================================================
//
// COMMAND BUILDER: Extraction, Transcoding, Merging and Stream Replacement
//
// The simple commands (extract, merge, metadata, quality metrics, duration)
// only depend on their arguments and are free functions. Transcoding and
// stream replacement look up encoder names, quality flags and container
// capabilities, so they go through a `CommandBuilder` that borrows a
// `Registry`. The free `transcode_video_command` and `replace_streams_command`
// use the standard registry.

// ---- External crate imports ----
use log::trace;
use serde_json::Value;

// ---- Standard library imports ----
use std::collections::BTreeMap;
use std::path::Path;

// ---- Internal crate imports ----
use super::streams::{
    adjust_stream_indexes_for_removals, get_lists_of_unsupported_stream_numbers_in,
    shift_stream_indexes,
};
use super::{container_arg, ffmpeg, push_args, FFPROBE_COMMAND};
use crate::codecs::{AudioCodec, SubtitleCodec, VideoCodec};
use crate::error::{FfguardError, Result};
use crate::formats::Container;
use crate::meta;
use crate::params::TranscodingParams;
use crate::registry::Registry;
use crate::utils::path_arg;

// ============================================================================
// PLAIN COMMANDS
// ============================================================================

/// Copies the selected streams of `input` into `output`.
///
/// Each selector is appended to `0:`, so `"v"` picks every video stream and
/// `"a:1"` the second audio stream.
pub fn extract_streams_command<P1, P2, S>(
    input: P1,
    output: P2,
    selectors: &[S],
    container: Option<&str>,
) -> Vec<String>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
    S: AsRef<str>,
{
    let mut argv = ffmpeg();
    push_args(&mut argv, ["-i".to_string(), path_arg(input.as_ref())]);
    for selector in selectors {
        push_args(&mut argv, ["-map".to_string(), format!("0:{}", selector.as_ref())]);
    }
    push_args(&mut argv, ["-codec", "copy"]);
    push_format(&mut argv, container);
    argv.push(path_arg(output.as_ref()));
    argv
}

/// Concatenates the files named in `list_file` (concat demuxer syntax).
pub fn merge_videos_command<P1, P2>(list_file: P1, output: P2, container: Option<&str>) -> Vec<String>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let mut argv = ffmpeg();
    push_args(&mut argv, ["-f", "concat", "-safe", "0", "-i"]);
    argv.push(path_arg(list_file.as_ref()));
    push_args(&mut argv, ["-c", "copy"]);
    push_format(&mut argv, container);
    argv.push(path_arg(output.as_ref()));
    argv
}

pub fn get_metadata_command<P: AsRef<Path>>(video: P) -> Vec<String> {
    let mut argv = vec![FFPROBE_COMMAND.to_string()];
    push_args(
        &mut argv,
        ["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"],
    );
    argv.push(path_arg(video.as_ref()));
    argv
}

/// Duration of the first video stream, printed as a bare number.
pub fn get_video_len_command<P: AsRef<Path>>(video: P) -> Vec<String> {
    let mut argv = vec![FFPROBE_COMMAND.to_string()];
    push_args(
        &mut argv,
        [
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ],
    );
    argv.push(path_arg(video.as_ref()));
    argv
}

fn metric_command(filter: &str, video: &Path, reference: &Path, frames_file: &Path) -> Vec<String> {
    let mut argv = ffmpeg();
    push_args(
        &mut argv,
        [
            "-i".to_string(),
            path_arg(video),
            "-i".to_string(),
            path_arg(reference),
            "-lavfi".to_string(),
            format!("{filter}={}", path_arg(frames_file)),
        ],
    );
    push_args(&mut argv, ["-f", "null", "-"]);
    argv
}

/// Per-frame PSNR of `video` against `reference`, written to `frames_file`.
pub fn compute_psnr_command<P1, P2, P3>(video: P1, reference: P2, frames_file: P3) -> Vec<String>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
    P3: AsRef<Path>,
{
    metric_command("psnr", video.as_ref(), reference.as_ref(), frames_file.as_ref())
}

/// Per-frame SSIM of `video` against `reference`, written to `frames_file`.
pub fn compute_ssim_command<P1, P2, P3>(video: P1, reference: P2, frames_file: P3) -> Vec<String>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
    P3: AsRef<Path>,
{
    metric_command("ssim", video.as_ref(), reference.as_ref(), frames_file.as_ref())
}

fn push_format(argv: &mut Vec<String>, container: Option<&str>) {
    if let Some(container) = container {
        push_args(argv, ["-f", container_arg(container)]);
    }
}

// ============================================================================
// REGISTRY-DEPENDENT COMMANDS
// ============================================================================

/// Inputs of a stream replacement.
///
/// Every stream of `stream_type` in `input` is replaced by the streams of the
/// same type from `replacement_source`. The metadata arguments are the ffprobe
/// output for the two files.
#[derive(Debug, Clone, Copy)]
pub struct StreamReplacement<'a> {
    pub input: &'a Path,
    pub replacement_source: &'a Path,
    pub output: &'a Path,
    /// `v`, `V` (video without attached pictures) or `a`.
    pub stream_type: &'a str,
    pub input_metadata: &'a Value,
    pub replacement_metadata: &'a Value,
    pub strip_unsupported_data: bool,
    pub strip_unsupported_subtitles: bool,
}

/// Builds commands that need the compatibility tables.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'r> {
    registry: &'r Registry,
}

impl Default for CommandBuilder<'static> {
    fn default() -> Self {
        Self::new(Registry::standard())
    }
}

impl<'r> CommandBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Transcodes the video of `input` according to `params`.
    ///
    /// Only video parameters are accepted; audio is changed with
    /// [`CommandBuilder::replace_streams_command`].
    pub fn transcode_video_command<P1, P2>(
        &self,
        input: P1,
        output: P2,
        params: &TranscodingParams,
    ) -> Result<Vec<String>>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        if params.has_audio_params() {
            return Err(FfguardError::InvalidArgument(
                "Audio parameters are not accepted by the transcode command".to_string(),
            ));
        }

        let mut argv = ffmpeg();
        push_args(&mut argv, ["-i".to_string(), path_arg(input.as_ref())]);
        push_format(&mut argv, params.container.as_deref());

        if let Some(codec) = params.video.codec.as_deref() {
            let codec = VideoCodec::from_name(codec)?;
            let encoder = codec.encoder_in(self.registry).ok_or_else(|| {
                FfguardError::NoMatchingEncoder(format!("No encoder for video codec '{codec}'"))
            })?;
            push_args(&mut argv, ["-c:v", encoder]);
            if let Some(flags) = self.registry.quality_flags.get(codec.as_str()) {
                push_args(&mut argv, flags.iter().cloned());
            }
        }
        if let Some(frame_rate) = params.frame_rate {
            push_args(&mut argv, ["-r".to_string(), frame_rate.to_string()]);
        }
        if let Some(bitrate) = params.video.bitrate.as_deref() {
            push_args(&mut argv, ["-b:v", bitrate]);
        }
        if let Some([width, height]) = params.resolution {
            push_args(&mut argv, ["-vf".to_string(), format!("scale={width}:{height}")]);
        }
        if let Some(scaling_alg) = params.scaling_alg.as_deref() {
            push_args(&mut argv, ["-sws_flags", scaling_alg]);
        }

        argv.push(path_arg(output.as_ref()));
        trace!("Transcode command: {argv:?}");
        Ok(argv)
    }

    /// Replaces streams of one type and optionally re-encodes the audio.
    ///
    /// Streams the target container cannot hold are dropped when the matching
    /// strip flag is set. Subtitles the container does not accept as-is are
    /// converted to a codec it does accept.
    pub fn replace_streams_command(
        &self,
        replacement: &StreamReplacement<'_>,
        params: &TranscodingParams,
    ) -> Result<Vec<String>> {
        let stream_type = replacement.stream_type;
        let codec_type = match stream_type {
            "v" | "V" => "video",
            "a" => "audio",
            other => {
                return Err(FfguardError::InvalidArgument(format!(
                    "Cannot replace streams of type '{other}', expected 'v', 'V' or 'a'"
                )));
            }
        };
        if params.has_video_params() {
            return Err(FfguardError::InvalidArgument(
                "Video parameters are not accepted by the replace command".to_string(),
            ));
        }

        let container = params.container.as_deref();
        let (unsupported_data, unsupported_subtitles) = if replacement.strip_unsupported_data
            || replacement.strip_unsupported_subtitles
        {
            get_lists_of_unsupported_stream_numbers_in(
                replacement.input_metadata,
                container,
                self.registry,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let mut stripped = Vec::new();
        if replacement.strip_unsupported_data {
            stripped.extend(unsupported_data);
        }
        if replacement.strip_unsupported_subtitles {
            stripped.extend(unsupported_subtitles);
        }
        stripped.sort_unstable();
        stripped.dedup();

        let mut argv = ffmpeg();
        push_args(
            &mut argv,
            [
                "-i".to_string(),
                path_arg(replacement.input),
                "-i".to_string(),
                path_arg(replacement.replacement_source),
                "-map".to_string(),
                format!("1:{stream_type}"),
                "-map".to_string(),
                "0".to_string(),
                "-map".to_string(),
                format!("-0:{stream_type}"),
            ],
        );
        for index in &stripped {
            push_args(&mut argv, ["-map".to_string(), format!("-0:{index}")]);
        }

        let conversions = self.subtitle_conversions(replacement, container, codec_type, &stripped)?;
        for (output_index, codec) in conversions {
            push_args(&mut argv, [format!("-codec:{output_index}"), codec.to_string()]);
        }

        push_args(&mut argv, ["-copy_unknown", "-c:v", "copy", "-c:d", "copy"]);
        push_format(&mut argv, container);

        if let Some(codec) = params.audio.codec.as_deref() {
            let codec = AudioCodec::from_name(codec)?;
            let encoder = codec.encoder_in(self.registry).ok_or_else(|| {
                FfguardError::NoMatchingEncoder(format!("No encoder for audio codec '{codec}'"))
            })?;
            push_args(&mut argv, ["-c:a", encoder]);
        }
        if let Some(bitrate) = params.audio.bitrate.as_deref() {
            push_args(&mut argv, ["-b:a", bitrate]);
        }

        argv.push(path_arg(replacement.output));
        trace!("Replace command: {argv:?}");
        Ok(argv)
    }

    /// Output stream index and target codec of every kept subtitle stream
    /// that has to be converted.
    fn subtitle_conversions(
        &self,
        replacement: &StreamReplacement<'_>,
        container: Option<&str>,
        replaced_codec_type: &str,
        stripped: &[u64],
    ) -> Result<BTreeMap<u64, &'r str>> {
        // Without an explicit target the output keeps the input's container
        let target = container.or_else(|| meta::get_format(replacement.input_metadata));
        let Some(container) = target.and_then(|name| Container::from_name(name).ok()) else {
            return Ok(BTreeMap::new());
        };
        let accepted = container.supported_subtitle_codecs_in(self.registry);

        let mut conversions = BTreeMap::new();
        for stream in meta::get_streams(replacement.input_metadata, Some("subtitle")) {
            let Some(index) = stream.get("index").and_then(Value::as_u64) else {
                continue;
            };
            let Some(codec) = stream.get("codec_name").and_then(Value::as_str) else {
                continue;
            };
            if stripped.contains(&index) || accepted.contains(codec) {
                continue;
            }
            let target = SubtitleCodec::from_name(codec)
                .ok()
                .and_then(|c| c.select_conversion_for_container_in(container.as_str(), self.registry));
            if let Some(target) = target {
                conversions.insert(index, target);
            }
        }

        let stream_type = replacement.stream_type;
        let mut dropped: Vec<u64> =
            mapped_streams(replacement.input_metadata, stream_type, replaced_codec_type)
                .into_iter()
                .filter_map(|stream| stream.get("index").and_then(Value::as_u64))
                .collect();
        dropped.extend_from_slice(stripped);
        let added =
            mapped_streams(replacement.replacement_metadata, stream_type, replaced_codec_type).len();

        let adjusted = adjust_stream_indexes_for_removals(conversions, &dropped)?;
        shift_stream_indexes(adjusted, i64::try_from(added).unwrap_or(i64::MAX))
    }
}

/// Streams of `codec_type` matched by the `-map` specifier `stream_type`.
/// `V` skips attached pictures such as cover art.
fn mapped_streams<'a>(
    metadata: &'a Value,
    stream_type: &str,
    codec_type: &str,
) -> Vec<&'a Value> {
    meta::get_streams(metadata, Some(codec_type))
        .into_iter()
        .filter(|stream| stream_type != "V" || !is_attached_picture(stream))
        .collect()
}

fn is_attached_picture(stream: &Value) -> bool {
    stream
        .get("disposition")
        .and_then(|disposition| disposition.get("attached_pic"))
        .and_then(Value::as_u64)
        == Some(1)
}

pub fn transcode_video_command<P1, P2>(
    input: P1,
    output: P2,
    params: &TranscodingParams,
) -> Result<Vec<String>>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    CommandBuilder::default().transcode_video_command(input, output, params)
}

pub fn replace_streams_command(
    replacement: &StreamReplacement<'_>,
    params: &TranscodingParams,
) -> Result<Vec<String>> {
    CommandBuilder::default().replace_streams_command(replacement, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_rate::FrameRate;
    use serde_json::json;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    fn replacement<'a>(
        stream_type: &'a str,
        input_metadata: &'a Value,
        replacement_metadata: &'a Value,
    ) -> StreamReplacement<'a> {
        StreamReplacement {
            input: Path::new("in.mkv"),
            replacement_source: Path::new("repl.mkv"),
            output: Path::new("out.mkv"),
            stream_type,
            input_metadata,
            replacement_metadata,
            strip_unsupported_data: false,
            strip_unsupported_subtitles: false,
        }
    }

    fn video_and_audio() -> Value {
        json!({
            "format": {"format_name": "matroska,webm"},
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "h264"},
                {"index": 1, "codec_type": "audio", "codec_name": "aac"}
            ]
        })
    }

    #[test]
    fn test_extract_streams_command() {
        assert_eq!(
            extract_streams_command("in.mp4", "out.mp4", &["v", "a:1"], Some("mp4")),
            argv(&[
                "ffmpeg", "-nostdin", "-i", "in.mp4", "-map", "0:v", "-map", "0:a:1", "-codec",
                "copy", "-f", "mp4", "out.mp4",
            ])
        );
    }

    #[test]
    fn test_merge_videos_command() {
        assert_eq!(
            merge_videos_command("list.txt", "merged.mkv", None),
            argv(&[
                "ffmpeg", "-nostdin", "-f", "concat", "-safe", "0", "-i", "list.txt", "-c",
                "copy", "merged.mkv",
            ])
        );
    }

    #[test]
    fn test_query_commands() {
        assert_eq!(
            get_metadata_command("a.mp4"),
            argv(&[
                "ffprobe", "-v", "quiet", "-print_format", "json", "-show_format",
                "-show_streams", "a.mp4",
            ])
        );
        assert_eq!(
            get_video_len_command("a.mp4").last().map(String::as_str),
            Some("a.mp4")
        );
        assert_eq!(
            compute_ssim_command("a.mp4", "b.mp4", "ssim.txt"),
            argv(&[
                "ffmpeg", "-nostdin", "-i", "a.mp4", "-i", "b.mp4", "-lavfi", "ssim=ssim.txt",
                "-f", "null", "-",
            ])
        );
        assert!(compute_psnr_command("a", "b", "p.txt").contains(&"psnr=p.txt".to_string()));
    }

    #[test]
    fn test_transcode_video_command() {
        let params = TranscodingParams::new("matroska", [200, 100], "h264")
            .with_frame_rate(FrameRate::whole(25))
            .with_video_bitrate("1M")
            .with_scaling_alg("bicubic");

        assert_eq!(
            transcode_video_command("in.mp4", "out.mkv", &params).unwrap(),
            argv(&[
                "ffmpeg", "-nostdin", "-i", "in.mp4", "-f", "matroska", "-c:v", "libx264",
                "-crf", "22", "-r", "25/1", "-b:v", "1M", "-vf", "scale=200:100", "-sws_flags",
                "bicubic", "out.mkv",
            ])
        );
    }

    #[test]
    fn test_container_names_are_written_in_ffmpeg_spelling() {
        assert_eq!(
            extract_streams_command("in.mp4", "out.mp4", &["v"], Some("MP4"))[8..],
            argv(&["-f", "mp4", "out.mp4"])
        );
        // Names outside the tables are left to ffmpeg
        let merge = merge_videos_command("list.txt", "out.nut", Some("NUT"));
        assert!(merge.ends_with(&argv(&["-f", "NUT", "out.nut"])));

        let params = TranscodingParams::new("Matroska", [200, 100], "vp8");
        let command = transcode_video_command("in.mp4", "out.mkv", &params).unwrap();
        assert_eq!(command[4..6], argv(&["-f", "matroska"]));
    }

    #[test]
    fn test_transcode_video_command_errors() {
        let with_audio = TranscodingParams::new("mp4", [1, 1], "h264").with_audio_codec("mp3");
        assert!(matches!(
            transcode_video_command("a", "b", &with_audio),
            Err(FfguardError::InvalidArgument(_))
        ));

        let no_encoder = TranscodingParams::new("matroska", [1, 1], "wmv3");
        assert!(matches!(
            transcode_video_command("a", "b", &no_encoder),
            Err(FfguardError::NoMatchingEncoder(_))
        ));
    }

    #[test]
    fn test_replace_streams_command_minimal() {
        let input = video_and_audio();
        let source = video_and_audio();

        assert_eq!(
            replace_streams_command(
                &replacement("v", &input, &source),
                &TranscodingParams::default()
            )
            .unwrap(),
            argv(&[
                "ffmpeg", "-nostdin", "-i", "in.mkv", "-i", "repl.mkv", "-map", "1:v", "-map",
                "0", "-map", "-0:v", "-copy_unknown", "-c:v", "copy", "-c:d", "copy", "out.mkv",
            ])
        );
    }

    #[test]
    fn test_replace_streams_command_with_audio_params() {
        let input = video_and_audio();
        let source = video_and_audio();
        let params = TranscodingParams::default()
            .with_container("matroska")
            .with_audio_codec("mp3")
            .with_audio_bitrate("128k");

        let command = replace_streams_command(&replacement("a", &input, &source), &params).unwrap();
        assert_eq!(
            command[command.len() - 8..],
            argv(&["copy", "-f", "matroska", "-c:a", "libmp3lame", "-b:a", "128k", "out.mkv"])
        );
    }

    #[test]
    fn test_replace_streams_command_strips_and_converts() {
        let input = json!({
            "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2"},
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "h264"},
                {"index": 1, "codec_type": "audio", "codec_name": "aac"},
                {"index": 2, "codec_type": "data", "codec_name": "tmcd"},
                {"index": 3, "codec_type": "subtitle", "codec_name": "subrip"}
            ]
        });
        let source = json!({"streams": [
            {"index": 0, "codec_type": "audio", "codec_name": "mp3"}
        ]});
        let mut request = replacement("a", &input, &source);
        request.strip_unsupported_data = true;
        let params = TranscodingParams::default().with_container("mp4");

        let command = replace_streams_command(&request, &params).unwrap();

        assert_eq!(
            command,
            argv(&[
                "ffmpeg", "-nostdin", "-i", "in.mkv", "-i", "repl.mkv", "-map", "1:a", "-map",
                "0", "-map", "-0:a", "-map", "-0:2", "-codec:2", "mov_text", "-copy_unknown",
                "-c:v", "copy", "-c:d", "copy", "-f", "mp4", "out.mkv",
            ])
        );
    }

    #[test]
    fn test_replace_video_keeps_cover_art_out_of_renumbering() {
        let input = json!({
            "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2"},
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "h264"},
                {"index": 1, "codec_type": "video", "codec_name": "mjpeg",
                 "disposition": {"attached_pic": 1}},
                {"index": 2, "codec_type": "subtitle", "codec_name": "subrip"}
            ]
        });
        let source = json!({"streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264",
             "disposition": {"attached_pic": 0}}
        ]});
        let params = TranscodingParams::default().with_container("mp4");

        // Output order: 1:V, cover art 0:1, subtitle 0:2
        let without_pictures =
            replace_streams_command(&replacement("V", &input, &source), &params).unwrap();
        assert!(without_pictures.windows(2).any(|w| w == ["-codec:2", "mov_text"]));
        assert!(without_pictures.windows(2).any(|w| w == ["-map", "-0:V"]));

        // `v` replaces the cover art as well
        let all_video =
            replace_streams_command(&replacement("v", &input, &source), &params).unwrap();
        assert!(all_video.windows(2).any(|w| w == ["-codec:1", "mov_text"]));
    }

    #[test]
    fn test_replace_streams_command_errors() {
        let input = video_and_audio();
        let source = video_and_audio();

        assert!(matches!(
            replace_streams_command(
                &replacement("s", &input, &source),
                &TranscodingParams::default()
            ),
            Err(FfguardError::InvalidArgument(_))
        ));
        assert!(matches!(
            replace_streams_command(
                &replacement("a", &input, &source),
                &TranscodingParams::default().with_video_codec("vp8")
            ),
            Err(FfguardError::InvalidArgument(_))
        ));
        assert!(matches!(
            replace_streams_command(
                &replacement("a", &input, &source),
                &TranscodingParams::default().with_audio_codec("wmapro")
            ),
            Err(FfguardError::NoMatchingEncoder(_))
        ));
    }
}
