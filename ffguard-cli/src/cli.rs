// ffguard-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ffguard_core::config::{DEFAULT_FFMPEG_PROGRAM, DEFAULT_FFPROBE_PROGRAM};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "ffguard: check ffmpeg conversions before running them",
    long_about = "Validates transcoding parameters against container and codec rule tables, \
                  and builds or runs the matching ffmpeg commands."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// JSON file with rule tables replacing the built-in ones
    #[arg(long, global = true, value_name = "FILE", env = "FFGUARD_TABLES")]
    pub tables: Option<PathBuf>,

    /// ffmpeg program to run
    #[arg(long, global = true, value_name = "PROGRAM", env = "FFGUARD_FFMPEG",
          default_value = DEFAULT_FFMPEG_PROGRAM)]
    pub ffmpeg: PathBuf,

    /// ffprobe program to run
    #[arg(long, global = true, value_name = "PROGRAM", env = "FFGUARD_FFPROBE",
          default_value = DEFAULT_FFPROBE_PROGRAM)]
    pub ffprobe: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the supported container formats
    Formats,
    /// List the codecs a container can hold
    Codecs(CodecsArgs),
    /// List the codecs a codec may be converted to
    Conversions(ConversionsArgs),
    /// Print a summary of a file's streams
    Probe(ProbeArgs),
    /// Check that a file is a usable video
    Validate(ValidateArgs),
    /// Check transcoding parameters against a file
    Check(CheckArgs),
    /// Copy selected streams into a new file
    Extract(ExtractArgs),
    /// Split a video into segments without re-encoding
    Split(SplitArgs),
    /// Transcode the video stream of a file
    Transcode(TranscodeArgs),
    /// Concatenate files that share codecs and parameters
    Merge(MergeArgs),
    /// Replace the video or audio streams of a file with another file's
    Replace(ReplaceArgs),
    /// Compare a video against a reference with PSNR or SSIM
    Compare(CompareArgs),
    /// Dump the active rule tables as JSON
    Tables,
}

/// Codec families understood by `conversions`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecKind {
    Video,
    Audio,
    Subtitle,
}

/// Quality metrics understood by `compare`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Psnr,
    Ssim,
}

#[derive(Args, Debug)]
pub struct CodecsArgs {
    /// Muxer or demuxer name (e.g. mp4, "matroska,webm")
    #[arg(value_name = "CONTAINER")]
    pub container: String,
}

#[derive(Args, Debug)]
pub struct ConversionsArgs {
    #[arg(value_name = "CODEC")]
    pub codec: String,

    /// Codec family; every family knowing the codec is listed when omitted
    #[arg(long, value_enum)]
    pub kind: Option<CodecKind>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the raw ffprobe JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// File to probe
    #[arg(value_name = "FILE", required_unless_present = "metadata")]
    pub file: Option<PathBuf>,

    /// Read ffprobe JSON from this file instead of probing
    #[arg(long, value_name = "JSON", conflicts_with = "file")]
    pub metadata: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Target parameters: inline JSON object or path to a JSON file
    #[arg(long, value_name = "JSON")]
    pub params: String,

    /// File to probe
    #[arg(value_name = "FILE", required_unless_present = "metadata")]
    pub file: Option<PathBuf>,

    /// Read ffprobe JSON from this file instead of probing
    #[arg(long, value_name = "JSON", conflicts_with = "file")]
    pub metadata: Option<PathBuf>,

    /// Drop data streams with unknown codecs instead of failing
    #[arg(long)]
    pub strip_data: bool,

    /// Drop subtitle streams that cannot be converted instead of failing
    #[arg(long)]
    pub strip_subtitles: bool,

    /// Ask ffmpeg for the target muxer's default audio codec
    #[arg(long)]
    pub muxer_info: bool,

    /// Ask ffmpeg for the sample rates of the target audio encoder
    #[arg(long)]
    pub encoder_info: bool,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Stream selectors to keep (e.g. v, a:1), comma-separated
    #[arg(short = 's', long = "select", value_delimiter = ',', required = true, value_name = "SELECTORS")]
    pub selectors: Vec<String>,

    /// Output container
    #[arg(short = 'f', long = "format", value_name = "CONTAINER")]
    pub container: Option<String>,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Segment length in seconds
    #[arg(long, value_name = "SECONDS", required_unless_present = "parts", conflicts_with = "parts")]
    pub segment_length: Option<f64>,

    /// Number of segments of equal length
    #[arg(long, value_name = "COUNT")]
    pub parts: Option<usize>,

    /// Segment container
    #[arg(short = 'f', long = "format", value_name = "CONTAINER")]
    pub container: Option<String>,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct TranscodeArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Target parameters: inline JSON object or path to a JSON file
    #[arg(long, value_name = "JSON")]
    pub params: String,

    /// Build the command without checking the parameters against the input
    #[arg(long)]
    pub skip_validation: bool,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Files to concatenate, in order
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output container
    #[arg(short = 'f', long = "format", value_name = "CONTAINER")]
    pub container: Option<String>,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ReplaceArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// File providing the new streams
    #[arg(value_name = "REPLACEMENT")]
    pub replacement: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Stream type to replace: v, V (video without cover art) or a
    #[arg(short = 't', long, default_value = "a", value_parser = ["v", "V", "a"])]
    pub stream_type: String,

    /// Audio parameters and container: inline JSON object or path to a JSON file
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,

    /// Drop data streams with unknown codecs
    #[arg(long)]
    pub strip_data: bool,

    /// Drop subtitle streams that cannot be converted
    #[arg(long)]
    pub strip_subtitles: bool,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[arg(value_name = "VIDEO")]
    pub video: PathBuf,

    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,

    #[arg(long, value_enum, default_value_t = Metric::Psnr)]
    pub metric: Metric,

    /// Per-frame statistics file
    #[arg(long, value_name = "FILE")]
    pub frames: PathBuf,

    /// Summary log file
    #[arg(long, value_name = "FILE")]
    pub log: PathBuf,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}
