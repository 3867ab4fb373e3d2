// ============================================================================
// ffguard-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of `CoreConfig`. Every field starts at its `DEFAULT_*`
// value, so callers only name what they change. The CLI maps its flags onto
// these setters.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use ffguard_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .ffprobe_program("/usr/local/bin/ffprobe")
///     .tables_path("/etc/ffguard/tables.json")
///     .strip_unsupported_data(true)
///     .build();
///
/// assert!(config.tables_path.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ffmpeg_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.config.ffmpeg_program = program.into();
        self
    }

    #[must_use]
    pub fn ffprobe_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.config.ffprobe_program = program.into();
        self
    }

    /// Sets the JSON file holding replacement rule tables.
    #[must_use]
    pub fn tables_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.tables_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn strip_unsupported_data(mut self, strip: bool) -> Self {
        self.config.strip_unsupported_data = strip;
        self
    }

    #[must_use]
    pub fn strip_unsupported_subtitles(mut self, strip: bool) -> Self {
        self.config.strip_unsupported_subtitles = strip;
        self
    }

    /// Builds the CoreConfig instance.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
