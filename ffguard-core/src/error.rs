// ============================================================================
// ffguard-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for ffguard-core
//
// Every fallible operation in the library returns `Result<T>`, an alias over
// `FfguardError`. Variants fall into five families:
//
// - Unsupported values: a codec or container name that is not in the tables
// - Conversions not allowed: valid names, but no permitted path between them
// - Malformed input: missing metadata, builder misuse, unexpected tool output
// - Process execution: a subprocess that could not start or exited non-zero
// - Caller context: an error wrapped with what the caller was doing
//
// Errors always carry the offending values so callers can build user-facing
// messages without re-deriving context.

use std::path::PathBuf;

use thiserror::Error;

use crate::frame_rate::FrameRateError;

/// Joins stream indexes for error messages.
fn join_indexes(indexes: &[u64]) -> String {
    indexes
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Custom error types for ffguard
#[derive(Error, Debug)]
pub enum FfguardError {
    // ---- Unsupported values ----
    #[error("Unsupported video format: {0}")]
    UnsupportedVideoFormat(String),

    #[error("Muxing not supported for video format: {0}")]
    UnsupportedTargetVideoFormat(String),

    #[error("Unsupported video codec: {codec} for video format: {container}")]
    UnsupportedVideoCodec { codec: String, container: String },

    #[error("Unsupported audio codec: {codec} for video format: {container}")]
    UnsupportedAudioCodec { codec: String, container: String },

    #[error("Unsupported subtitle codec: {codec} for video format: {container}")]
    UnsupportedSubtitleCodec { codec: String, container: String },

    #[error("Missing video codec in target parameters")]
    MissingVideoCodec,

    // ---- Conversions not allowed ----
    #[error("Unsupported video codec conversion from {src} to {dst}")]
    UnsupportedVideoCodecConversion { src: String, dst: String },

    #[error("Unsupported audio codec conversion from {src} to {dst}")]
    UnsupportedAudioCodecConversion { src: String, dst: String },

    #[error(
        "Unsupported subtitle codec conversion for video format: {container}. Stream index: {}.",
        join_indexes(.indexes)
    )]
    UnsupportedSubtitleCodecConversion { container: String, indexes: Vec<u64> },

    #[error(
        "Unsupported audio channel layout conversion. Unable to reliably preserve the \
         {0}-channel audio found in the input file in combination with other target parameters."
    )]
    UnsupportedAudioChannelLayout(u64),

    #[error("Unsupported sample rate: {sample_rate} for audio codec: {codec}")]
    UnsupportedSampleRate { sample_rate: String, codec: String },

    #[error("Unsupported resolution conversion from {src} to {dst}.")]
    InvalidResolution { src: String, dst: String },

    #[error("Unsupported frame rate conversion from {src} to {dst}.")]
    InvalidFrameRate { src: String, dst: String },

    #[error("Unsupported {stream_type} stream. Stream index: {}.", join_indexes(.indexes))]
    UnsupportedStream { stream_type: String, indexes: Vec<u64> },

    // ---- Malformed input ----
    #[error("Invalid format metadata: {0}")]
    InvalidFormatMetadata(String),

    #[error("Missing video stream")]
    MissingVideoStream,

    #[error("Invalid video: {0}")]
    InvalidVideo(String),

    #[error("Invalid frame rate: {0}")]
    FrameRate(#[from] FrameRateError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File already exists: {}", .0.display())]
    FileAlreadyExists(PathBuf),

    #[error("Invalid command output: {0}")]
    InvalidCommandOutput(String),

    #[error("Invalid sample rate info: {0}")]
    InvalidSampleRateInfo(String),

    #[error("No matching encoder: {0}")]
    NoMatchingEncoder(String),

    #[error("Failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    // ---- Process execution ----
    #[error("Command failed with exit code {}: {}", .exit_code.map_or("unknown".to_string(), |c| c.to_string()), .command.join(" "))]
    CommandFailed {
        command: Vec<String>,
        exit_code: Option<i32>,
    },

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Required external command not found: {0}")]
    DependencyNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ---- Caller context ----
    /// A failure with no underlying error, described by the caller
    #[error("{0}")]
    OperationFailed(String),

    /// An error wrapped with a description of what the caller was doing
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FfguardError>,
    },
}

impl FfguardError {
    /// Returns true for errors describing an input that cannot be converted as
    /// requested, as opposed to caller misuse or tool failures.
    pub fn is_invalid_video(&self) -> bool {
        matches!(
            self.root_cause(),
            FfguardError::UnsupportedVideoFormat(_)
                | FfguardError::UnsupportedTargetVideoFormat(_)
                | FfguardError::UnsupportedVideoCodec { .. }
                | FfguardError::UnsupportedAudioCodec { .. }
                | FfguardError::UnsupportedSubtitleCodec { .. }
                | FfguardError::MissingVideoCodec
                | FfguardError::UnsupportedVideoCodecConversion { .. }
                | FfguardError::UnsupportedAudioCodecConversion { .. }
                | FfguardError::UnsupportedSubtitleCodecConversion { .. }
                | FfguardError::UnsupportedAudioChannelLayout(_)
                | FfguardError::UnsupportedSampleRate { .. }
                | FfguardError::InvalidResolution { .. }
                | FfguardError::InvalidFrameRate { .. }
                | FfguardError::UnsupportedStream { .. }
                | FfguardError::InvalidFormatMetadata(_)
                | FfguardError::MissingVideoStream
                | FfguardError::InvalidVideo(_)
        )
    }

    /// Wraps `self` with a description of the failed operation.
    pub fn context(self, context: impl Into<String>) -> Self {
        FfguardError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error below any added context.
    pub fn root_cause(&self) -> &FfguardError {
        match self {
            FfguardError::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for ffguard operations
pub type Result<T> = std::result::Result<T, FfguardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = FfguardError::UnsupportedVideoCodec {
            codec: "bla".to_string(),
            container: "mp4".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported video codec: bla for video format: mp4");

        let err = FfguardError::UnsupportedStream {
            stream_type: "data".to_string(),
            indexes: vec![2, 5],
        };
        assert_eq!(err.to_string(), "Unsupported data stream. Stream index: 2, 5.");

        let err = FfguardError::CommandFailed {
            command: vec!["ffprobe".to_string(), "bla".to_string()],
            exit_code: Some(1),
        };
        assert_eq!(err.to_string(), "Command failed with exit code 1: ffprobe bla");
    }

    #[test]
    fn test_context_keeps_the_source() {
        let err = FfguardError::MissingVideoStream
            .context("Failed to validate a.mkv")
            .context("Check failed");

        assert_eq!(
            err.to_string(),
            "Check failed: Failed to validate a.mkv: Missing video stream"
        );
        assert!(matches!(err.root_cause(), FfguardError::MissingVideoStream));
        assert!(err.is_invalid_video());
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().starts_with("Failed to validate a.mkv"));
    }

    #[test]
    fn test_invalid_video_family() {
        assert!(FfguardError::MissingVideoStream.is_invalid_video());
        assert!(FfguardError::UnsupportedAudioChannelLayout(6).is_invalid_video());
        assert!(!FfguardError::InvalidArgument("x".to_string()).is_invalid_video());
        assert!(!FfguardError::NoMatchingEncoder("x".to_string()).is_invalid_video());
    }
}
