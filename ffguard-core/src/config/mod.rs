//! Configuration structures and constants for the ffguard-core library.
//!
//! A [`CoreConfig`] says where ffmpeg and ffprobe live, whether streams that
//! cannot be carried over should be stripped instead of rejected, and which
//! rule tables to use. The tables default to the built-in ones; a JSON file
//! can replace them.

mod builder;

use std::fs;
use std::path::PathBuf;

use log::debug;

pub use builder::CoreConfigBuilder;

use crate::error::Result;
use crate::registry::Registry;
use crate::utils::SystemRunner;
use crate::validation::TranscodingContext;

// Default constants

/// Default ffmpeg program, looked up in `PATH`.
pub const DEFAULT_FFMPEG_PROGRAM: &str = "ffmpeg";

/// Default ffprobe program, looked up in `PATH`.
pub const DEFAULT_FFPROBE_PROGRAM: &str = "ffprobe";

/// Data streams with unknown codecs are rejected unless stripping is enabled.
pub const DEFAULT_STRIP_UNSUPPORTED_DATA: bool = false;

/// Subtitle streams that cannot be converted are rejected unless stripping is
/// enabled.
pub const DEFAULT_STRIP_UNSUPPORTED_SUBTITLES: bool = false;

/// Main configuration structure for the ffguard-core library.
///
/// # Examples
///
/// ```rust
/// use ffguard_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .ffmpeg_program("/opt/ffmpeg/bin/ffmpeg")
///     .strip_unsupported_subtitles(true)
///     .build();
///
/// assert!(config.strip_unsupported_subtitles);
/// assert!(!config.strip_unsupported_data);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Program run for `ffmpeg` commands
    pub ffmpeg_program: PathBuf,

    /// Program run for `ffprobe` commands
    pub ffprobe_program: PathBuf,

    /// JSON file with rule tables replacing the built-in ones
    pub tables_path: Option<PathBuf>,

    pub strip_unsupported_data: bool,
    pub strip_unsupported_subtitles: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ffmpeg_program: PathBuf::from(DEFAULT_FFMPEG_PROGRAM),
            ffprobe_program: PathBuf::from(DEFAULT_FFPROBE_PROGRAM),
            tables_path: None,
            strip_unsupported_data: DEFAULT_STRIP_UNSUPPORTED_DATA,
            strip_unsupported_subtitles: DEFAULT_STRIP_UNSUPPORTED_SUBTITLES,
        }
    }
}

impl CoreConfig {
    /// Returns the rule tables to use.
    ///
    /// Without `tables_path` this is a copy of the built-in tables. A tables
    /// file may omit sections; omitted sections keep their built-in content.
    /// The result is checked for internal consistency either way.
    pub fn load_registry(&self) -> Result<Registry> {
        let registry = match &self.tables_path {
            Some(path) => {
                debug!("Loading rule tables from {}", path.display());
                let text = fs::read_to_string(path)?;
                serde_json::from_str::<Registry>(&text)?
            }
            None => Registry::standard().clone(),
        };
        registry.check_invariants()?;
        Ok(registry)
    }

    /// A runner for the configured ffmpeg and ffprobe programs.
    pub fn system_runner(&self) -> SystemRunner {
        SystemRunner::new(&self.ffmpeg_program, &self.ffprobe_program)
    }

    /// Validation options with the configured strip flags and no
    /// introspection results.
    pub fn transcoding_context<'a>(&self) -> TranscodingContext<'a> {
        TranscodingContext {
            strip_unsupported_data: self.strip_unsupported_data,
            strip_unsupported_subtitles: self.strip_unsupported_subtitles,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FfguardError;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = CoreConfig::default();
        assert_eq!(config.ffmpeg_program, Path::new("ffmpeg"));
        assert_eq!(config.tables_path, None);
        assert_eq!(&config.load_registry().unwrap(), Registry::standard());

        let runner = config.system_runner();
        assert_eq!(runner.ffprobe, Path::new("ffprobe"));
    }

    #[test]
    fn test_load_registry_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tables.json");
        fs::write(&path, r#"{"data_codecs": ["bin_data", "tmcd"]}"#).unwrap();

        let config = CoreConfigBuilder::new().tables_path(&path).build();
        let registry = config.load_registry().unwrap();

        assert!(registry.data_codecs.contains("tmcd"));
        assert_eq!(registry.containers, Registry::standard().containers);
    }

    #[test]
    fn test_load_registry_errors() {
        let dir = tempdir().unwrap();

        let missing = CoreConfigBuilder::new().tables_path(dir.path().join("nope.json")).build();
        assert!(matches!(missing.load_registry(), Err(FfguardError::Io(_))));

        let path = dir.path().join("broken.json");
        fs::write(&path, "{").unwrap();
        let broken = CoreConfigBuilder::new().tables_path(&path).build();
        assert!(matches!(broken.load_registry(), Err(FfguardError::Json(_))));

        let path = dir.path().join("inconsistent.json");
        fs::write(&path, r#"{"intermediate_muxers": {}}"#).unwrap();
        let inconsistent = CoreConfigBuilder::new().tables_path(&path).build();
        assert!(inconsistent.load_registry().is_err());
    }

    #[test]
    fn test_transcoding_context() {
        let config = CoreConfigBuilder::new().strip_unsupported_data(true).build();
        let context = config.transcoding_context();
        assert!(context.strip_unsupported_data);
        assert!(!context.strip_unsupported_subtitles);
        assert!(context.muxer_info.is_none());
    }
}
