// ============================================================================
// ffguard-core/src/commands/mod.rs
// ============================================================================
//
// COMMAND BUILDERS: Argument Vectors for ffmpeg and ffprobe
//
// Every function in this module is pure: it turns parameters into the exact
// argument vector to run and never starts a process itself. Running the
// vectors is the job of a `ProcessRunner` (see `utils::command`) and of the
// `Toolkit` façade, which also performs the few post-processing steps that
// touch the file system.
//
// Conventions shared by every builder:
// - argv[0] is literally `ffmpeg` or `ffprobe`
// - `-nostdin` is always the first flag passed to ffmpeg
// - `-f <container>` is only emitted when a container is requested, spelled
//   the way ffmpeg names it (container names are matched ignoring case)
//
// KEY COMPONENTS:
// - builder: extraction, transcoding, merging, stream replacement, queries
// - split: the segment muxer command and its file-name post-processing
// - streams: stream-index renumbering and unsupported-stream detection
// - introspection: `-h muxer=` / `-h encoder=` commands and output parsers

pub mod builder;
pub mod introspection;
pub mod split;
pub mod streams;

pub use builder::{
    compute_psnr_command, compute_ssim_command, extract_streams_command, get_metadata_command,
    get_video_len_command, merge_videos_command, replace_streams_command, transcode_video_command,
    CommandBuilder, StreamReplacement,
};
pub use introspection::{
    encoder_info_command, muxer_info_command, parse_encoder_info, parse_muxer_info, EncoderInfo,
    MuxerInfo,
};
pub use split::{fix_segment_names, split_video_command, SEGMENT_SUFFIX};
pub use streams::{
    adjust_stream_indexes_for_removals, get_lists_of_unsupported_stream_numbers,
    get_lists_of_unsupported_stream_numbers_in, shift_stream_indexes,
};

use crate::formats::Container;

/// Program name used as argv[0] for ffmpeg commands.
pub const FFMPEG_COMMAND: &str = "ffmpeg";

/// Program name used as argv[0] for ffprobe commands.
pub const FFPROBE_COMMAND: &str = "ffprobe";

/// Starts an ffmpeg argument vector.
pub(crate) fn ffmpeg() -> Vec<String> {
    vec![FFMPEG_COMMAND.to_string(), "-nostdin".to_string()]
}

/// ffmpeg's spelling of a known container name. Other names pass through.
pub(crate) fn container_arg(name: &str) -> &str {
    Container::from_name(name).map_or(name, |container| container.as_str())
}

/// Appends string-like arguments to an argument vector.
pub(crate) fn push_args<I, S>(argv: &mut Vec<String>, args: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    argv.extend(args.into_iter().map(Into::into));
}
