// ============================================================================
// ffguard-core/src/formats.rs
// ============================================================================
//
// CONTAINERS: Muxers, Demuxers and Their Codec Support
//
// Most values of `Container` are ffmpeg muxer names, usable with `-f`. ffprobe
// cannot report the muxer that produced a file, only the demuxer that reads it,
// and two demuxer names have no muxer of the same name. These two exclusive
// demuxers are members of the enum so that probed formats can be validated,
// but they are never valid output targets.
//
// Codec support for concrete muxers comes straight from the registry tables.
// Codec support for an exclusive demuxer is always derived as the union over
// the muxers it reads; it is never stored.
//
// The module also holds the aspect-ratio helpers used by resolution checks.

// ---- External crate imports ----
use serde::{Deserialize, Serialize};

// ---- Standard library imports ----
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ---- Internal crate imports ----
use crate::error::{FfguardError, Result};
use crate::frame_rate::{gcd, FrameRate};
use crate::registry::{ContainerCodecs, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Container {
    ThreeG2,
    ThreeGp,
    Avi,
    F4v,
    Matroska,
    Mp4,
    Mpeg,
    Mov,
    Webm,
    /// Demuxer for every QuickTime-family file (mov, mp4, 3gp, 3g2, f4v)
    QuickTimeDemuxer,
    /// Demuxer for Matroska and WebM files
    MatroskaWebmDemuxer,
}

impl Container {
    /// Every container in declared order.
    pub const ALL: [Container; 11] = [
        Container::ThreeG2,
        Container::ThreeGp,
        Container::Avi,
        Container::F4v,
        Container::Matroska,
        Container::Mp4,
        Container::Mpeg,
        Container::Mov,
        Container::Webm,
        Container::QuickTimeDemuxer,
        Container::MatroskaWebmDemuxer,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Container::ThreeG2 => "3g2",
            Container::ThreeGp => "3gp",
            Container::Avi => "avi",
            Container::F4v => "f4v",
            Container::Matroska => "matroska",
            Container::Mp4 => "mp4",
            Container::Mpeg => "mpeg",
            Container::Mov => "mov",
            Container::Webm => "webm",
            Container::QuickTimeDemuxer => "mov,mp4,m4a,3gp,3g2,mj2",
            Container::MatroskaWebmDemuxer => "matroska,webm",
        }
    }

    /// Parses a muxer or demuxer name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self> {
        let lowered = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|container| container.as_str() == lowered)
            .ok_or_else(|| FfguardError::UnsupportedVideoFormat(name.to_string()))
    }

    pub fn is_supported(name: &str) -> bool {
        Self::from_name(name).is_ok()
    }

    pub const fn is_exclusive_demuxer(self) -> bool {
        matches!(self, Container::QuickTimeDemuxer | Container::MatroskaWebmDemuxer)
    }

    /// Name of the demuxer ffprobe reports for files written by this muxer.
    pub fn demuxer(self) -> &'static str {
        self.demuxer_in(Registry::standard())
    }

    pub fn demuxer_in(self, registry: &Registry) -> &str {
        registry
            .demuxers
            .get(self.as_str())
            .map(String::as_str)
            .unwrap_or(self.as_str())
    }

    /// Muxers whose output this container's demuxer reads, including the
    /// container itself unless it is an exclusive demuxer.
    pub fn matching_muxers(self) -> BTreeSet<Container> {
        self.matching_muxers_in(Registry::standard())
    }

    pub fn matching_muxers_in(self, registry: &Registry) -> BTreeSet<Container> {
        let mut muxers: BTreeSet<Container> = registry
            .demuxers
            .iter()
            .filter(|(_, demuxer)| demuxer.as_str() == self.as_str())
            .filter_map(|(muxer, _)| Container::from_name(muxer).ok())
            .collect();

        if !self.is_exclusive_demuxer() {
            muxers.insert(self);
        }
        muxers
    }

    /// Muxer to use when re-muxing a file identified only by this demuxer.
    pub fn intermediate_muxer(self) -> &'static str {
        self.intermediate_muxer_in(Registry::standard())
    }

    pub fn intermediate_muxer_in(self, registry: &Registry) -> &str {
        registry
            .intermediate_muxers
            .get(self.as_str())
            .map(String::as_str)
            .unwrap_or(self.as_str())
    }

    pub fn supported_video_codecs(self) -> BTreeSet<&'static str> {
        self.supported_video_codecs_in(Registry::standard())
    }

    pub fn supported_video_codecs_in(self, registry: &Registry) -> BTreeSet<&str> {
        self.supported_codecs_in(registry, |codecs| &codecs.video)
    }

    pub fn supported_audio_codecs(self) -> BTreeSet<&'static str> {
        self.supported_audio_codecs_in(Registry::standard())
    }

    pub fn supported_audio_codecs_in(self, registry: &Registry) -> BTreeSet<&str> {
        self.supported_codecs_in(registry, |codecs| &codecs.audio)
    }

    pub fn supported_subtitle_codecs(self) -> BTreeSet<&'static str> {
        self.supported_subtitle_codecs_in(Registry::standard())
    }

    pub fn supported_subtitle_codecs_in(self, registry: &Registry) -> BTreeSet<&str> {
        self.supported_codecs_in(registry, |codecs| &codecs.subtitle)
    }

    fn supported_codecs_in<'r, F>(self, registry: &'r Registry, select: F) -> BTreeSet<&'r str>
    where
        F: Fn(&'r ContainerCodecs) -> &'r BTreeSet<String>,
    {
        if self.is_exclusive_demuxer() {
            return self.derived_codecs_in(registry, select);
        }

        registry
            .containers
            .get(self.as_str())
            .map(|codecs| select(codecs).iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn derived_codecs_in<'r, F>(self, registry: &'r Registry, select: F) -> BTreeSet<&'r str>
    where
        F: Fn(&'r ContainerCodecs) -> &'r BTreeSet<String>,
    {
        self.matching_muxers_in(registry)
            .into_iter()
            .filter_map(|muxer| registry.containers.get(muxer.as_str()))
            .flat_map(|codecs| select(codecs).iter().map(String::as_str))
            .collect()
    }

    pub fn is_supported_video_codec(self, codec: impl AsRef<str>) -> bool {
        self.is_supported_video_codec_in(codec, Registry::standard())
    }

    pub fn is_supported_video_codec_in(self, codec: impl AsRef<str>, registry: &Registry) -> bool {
        self.supported_video_codecs_in(registry).contains(codec.as_ref())
    }

    pub fn is_supported_audio_codec(self, codec: impl AsRef<str>) -> bool {
        self.is_supported_audio_codec_in(codec, Registry::standard())
    }

    pub fn is_supported_audio_codec_in(self, codec: impl AsRef<str>, registry: &Registry) -> bool {
        self.supported_audio_codecs_in(registry).contains(codec.as_ref())
    }

    pub fn is_supported_subtitle_codec(self, codec: impl AsRef<str>) -> bool {
        self.is_supported_subtitle_codec_in(codec, Registry::standard())
    }

    pub fn is_supported_subtitle_codec_in(self, codec: impl AsRef<str>, registry: &Registry) -> bool {
        self.supported_subtitle_codecs_in(registry).contains(codec.as_ref())
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Container {
    type Err = FfguardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl TryFrom<String> for Container {
    type Error = FfguardError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_name(&value)
    }
}

impl From<Container> for String {
    fn from(container: Container) -> Self {
        container.as_str().to_string()
    }
}

// ============================================================================
// MODULE-LEVEL HELPERS
// ============================================================================

/// All container names in declared order.
pub fn list_supported_formats() -> Vec<&'static str> {
    Container::ALL.iter().map(|c| c.as_str()).collect()
}

pub fn is_supported(format: &str) -> bool {
    Container::is_supported(format)
}

/// Video codecs for a container name; empty for unknown names.
pub fn list_supported_video_codecs(format: &str) -> Vec<&'static str> {
    Container::from_name(format)
        .map(|c| c.supported_video_codecs().into_iter().collect())
        .unwrap_or_default()
}

/// Audio codecs for a container name; empty for unknown names.
pub fn list_supported_audio_codecs(format: &str) -> Vec<&'static str> {
    Container::from_name(format)
        .map(|c| c.supported_audio_codecs().into_iter().collect())
        .unwrap_or_default()
}

/// Subtitle codecs for a container name; empty for unknown names.
pub fn list_supported_subtitle_codecs(format: &str) -> Vec<&'static str> {
    Container::from_name(format)
        .map(|c| c.supported_subtitle_codecs().into_iter().collect())
        .unwrap_or_default()
}

pub fn is_supported_video_codec(format: &str, codec: &str) -> bool {
    Container::from_name(format).is_ok_and(|c| c.is_supported_video_codec(codec))
}

pub fn is_supported_audio_codec(format: &str, codec: &str) -> bool {
    Container::from_name(format).is_ok_and(|c| c.is_supported_audio_codec(codec))
}

pub fn get_safe_intermediate_format_for_demuxer(demuxer: &str) -> Result<&'static str> {
    Ok(Container::from_name(demuxer)?.intermediate_muxer())
}

/// Frame rates accepted as transcoding targets, in ascending order.
pub fn list_supported_frame_rates() -> Vec<FrameRate> {
    list_supported_frame_rates_in(Registry::standard())
}

pub fn list_supported_frame_rates_in(registry: &Registry) -> Vec<FrameRate> {
    let mut rates: Vec<FrameRate> = registry.frame_rates.iter().copied().collect();
    rates.sort_by(|a, b| a.to_float().total_cmp(&b.to_float()));
    rates
}

// ============================================================================
// ASPECT RATIO
// ============================================================================

/// Reduces `width:height` by their greatest common divisor.
pub fn calculate_aspect_ratio(resolution: [u32; 2]) -> String {
    let [width, height] = resolution;
    let common = gcd(u64::from(width), u64::from(height));
    if common == 0 {
        return "0:0".to_string();
    }
    format!("{}:{}", u64::from(width) / common, u64::from(height) / common)
}

pub fn get_effective_aspect_ratio(resolution: [u32; 2]) -> String {
    get_effective_aspect_ratio_in(resolution, Registry::standard())
}

/// Aspect ratio for comparison purposes. Resolutions listed as overrides
/// report the ratio they are marketed as rather than their reduced ratio.
pub fn get_effective_aspect_ratio_in(resolution: [u32; 2], registry: &Registry) -> String {
    registry
        .aspect_ratio_overrides
        .iter()
        .find(|o| o.resolution == resolution)
        .map(|o| o.aspect_ratio.clone())
        .unwrap_or_else(|| calculate_aspect_ratio(resolution))
}

pub fn list_matching_resolutions(resolution: [u32; 2]) -> Vec<[u32; 2]> {
    list_matching_resolutions_in(resolution, Registry::standard())
}

/// Well-known resolutions in the same aspect-ratio group as `resolution`,
/// or just `resolution` itself when it belongs to no group.
pub fn list_matching_resolutions_in(resolution: [u32; 2], registry: &Registry) -> Vec<[u32; 2]> {
    registry
        .resolution_groups
        .values()
        .find(|group| group.contains(&resolution))
        .cloned()
        .unwrap_or_else(|| vec![resolution])
}
