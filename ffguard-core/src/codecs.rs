// ============================================================================
// ffguard-core/src/codecs.rs
// ============================================================================
//
// CODECS: Video, Audio and Subtitle Codec Identifiers
//
// Closed enumerations of the codec names ffprobe reports and ffmpeg accepts.
// The enums hold no data; encoder names, allowed conversions and sample-rate
// support are looked up in a `Registry`. Every lookup has two forms: a plain
// method that uses `Registry::standard()` and an `_in` method that takes the
// registry explicitly.
//
// Parsing an unknown name fails with the kind-specific "unsupported codec"
// error carrying the offending value.

// ---- External crate imports ----
use serde::{Deserialize, Serialize};

// ---- Standard library imports ----
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ---- Internal crate imports ----
use crate::commands::EncoderInfo;
use crate::error::{FfguardError, Result};
use crate::formats::Container;
use crate::registry::Registry;

fn conversions_in<'r>(table: &'r BTreeMap<String, BTreeSet<String>>, codec: &str) -> BTreeSet<&'r str> {
    table
        .get(codec)
        .map(|targets| targets.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

// ============================================================================
// VIDEO
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VideoCodec {
    Av1,
    Flv1,
    H263,
    H264,
    H265,
    Hevc,
    Mjpeg,
    Mpeg1Video,
    Mpeg2Video,
    Mpeg4,
    MsMpeg4V2,
    Theora,
    Vp8,
    Vp9,
    Wmv1,
    Wmv2,
    Wmv3,
}

impl VideoCodec {
    pub const ALL: [VideoCodec; 17] = [
        VideoCodec::Av1,
        VideoCodec::Flv1,
        VideoCodec::H263,
        VideoCodec::H264,
        VideoCodec::H265,
        VideoCodec::Hevc,
        VideoCodec::Mjpeg,
        VideoCodec::Mpeg1Video,
        VideoCodec::Mpeg2Video,
        VideoCodec::Mpeg4,
        VideoCodec::MsMpeg4V2,
        VideoCodec::Theora,
        VideoCodec::Vp8,
        VideoCodec::Vp9,
        VideoCodec::Wmv1,
        VideoCodec::Wmv2,
        VideoCodec::Wmv3,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            VideoCodec::Av1 => "av1",
            VideoCodec::Flv1 => "flv1",
            VideoCodec::H263 => "h263",
            VideoCodec::H264 => "h264",
            VideoCodec::H265 => "h265",
            VideoCodec::Hevc => "hevc",
            VideoCodec::Mjpeg => "mjpeg",
            VideoCodec::Mpeg1Video => "mpeg1video",
            VideoCodec::Mpeg2Video => "mpeg2video",
            VideoCodec::Mpeg4 => "mpeg4",
            VideoCodec::MsMpeg4V2 => "msmpeg4v2",
            VideoCodec::Theora => "theora",
            VideoCodec::Vp8 => "vp8",
            VideoCodec::Vp9 => "vp9",
            VideoCodec::Wmv1 => "wmv1",
            VideoCodec::Wmv2 => "wmv2",
            VideoCodec::Wmv3 => "wmv3",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|codec| codec.as_str() == name)
            .ok_or_else(|| FfguardError::UnsupportedVideoCodec {
                codec: name.to_string(),
                container: String::new(),
            })
    }

    /// Name of the ffmpeg encoder for this codec, or `None` when there is no
    /// usable one.
    pub fn encoder(self) -> Option<&'static str> {
        self.encoder_in(Registry::standard())
    }

    pub fn encoder_in(self, registry: &Registry) -> Option<&str> {
        match registry.video_encoders.get(self.as_str()) {
            Some(encoder) => encoder.as_deref(),
            None => Some(self.as_str()),
        }
    }

    pub fn supported_conversions(self) -> BTreeSet<&'static str> {
        self.supported_conversions_in(Registry::standard())
    }

    pub fn supported_conversions_in(self, registry: &Registry) -> BTreeSet<&str> {
        conversions_in(&registry.video_conversions, self.as_str())
    }

    pub fn can_convert(self, target: &str) -> bool {
        self.can_convert_in(target, Registry::standard())
    }

    pub fn can_convert_in(self, target: &str, registry: &Registry) -> bool {
        self.supported_conversions_in(registry).contains(target)
    }
}

// ============================================================================
// AUDIO
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AudioCodec {
    Aac,
    Ac3,
    AmrNb,
    Mp2,
    Mp3,
    Opus,
    PcmU8,
    Wmav2,
    Wmapro,
    Vorbis,
}

impl AudioCodec {
    pub const ALL: [AudioCodec; 10] = [
        AudioCodec::Aac,
        AudioCodec::Ac3,
        AudioCodec::AmrNb,
        AudioCodec::Mp2,
        AudioCodec::Mp3,
        AudioCodec::Opus,
        AudioCodec::PcmU8,
        AudioCodec::Wmav2,
        AudioCodec::Wmapro,
        AudioCodec::Vorbis,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Ac3 => "ac3",
            AudioCodec::AmrNb => "amr_nb",
            AudioCodec::Mp2 => "mp2",
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Opus => "opus",
            AudioCodec::PcmU8 => "pcm_u8",
            AudioCodec::Wmav2 => "wmav2",
            AudioCodec::Wmapro => "wmapro",
            AudioCodec::Vorbis => "vorbis",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|codec| codec.as_str() == name)
            .ok_or_else(|| FfguardError::UnsupportedAudioCodec {
                codec: name.to_string(),
                container: String::new(),
            })
    }

    pub fn encoder(self) -> Option<&'static str> {
        self.encoder_in(Registry::standard())
    }

    pub fn encoder_in(self, registry: &Registry) -> Option<&str> {
        match registry.audio_encoders.get(self.as_str()) {
            Some(encoder) => encoder.as_deref(),
            None => Some(self.as_str()),
        }
    }

    pub fn supported_conversions(self) -> BTreeSet<&'static str> {
        self.supported_conversions_in(Registry::standard())
    }

    pub fn supported_conversions_in(self, registry: &Registry) -> BTreeSet<&str> {
        conversions_in(&registry.audio_conversions, self.as_str())
    }

    pub fn can_convert(self, target: &str) -> bool {
        self.can_convert_in(target, Registry::standard())
    }

    pub fn can_convert_in(self, target: &str, registry: &Registry) -> bool {
        self.supported_conversions_in(registry).contains(target)
    }

    pub fn is_supported_sample_rate(self, sample_rate: i64, encoder_info: Option<&EncoderInfo>) -> bool {
        self.is_supported_sample_rate_in(sample_rate, encoder_info, Registry::standard())
    }

    /// Checks a sample rate against the encoder for this codec.
    ///
    /// A sample-rate list reported by the encoder itself is authoritative and
    /// replaces the fallback table entirely. Without one, the fallback table
    /// entry for the encoder name decides; a codec without an encoder or an
    /// encoder without an entry supports nothing.
    pub fn is_supported_sample_rate_in(
        self,
        sample_rate: i64,
        encoder_info: Option<&EncoderInfo>,
        registry: &Registry,
    ) -> bool {
        let Some(encoder) = self.encoder_in(registry) else {
            return false;
        };

        if let Some(rates) = encoder_info.and_then(|info| info.sample_rates.as_ref()) {
            return rates.iter().any(|&rate| i64::from(rate) == sample_rate);
        }

        registry
            .sample_rates
            .get(encoder)
            .is_some_and(|range| range.contains(sample_rate))
    }
}

// ============================================================================
// SUBTITLES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubtitleCodec {
    Ass,
    DvdSubtitle,
    HdmvPgsSubtitle,
    MovText,
    Subrip,
    Webvtt,
}

impl SubtitleCodec {
    pub const ALL: [SubtitleCodec; 6] = [
        SubtitleCodec::Ass,
        SubtitleCodec::DvdSubtitle,
        SubtitleCodec::HdmvPgsSubtitle,
        SubtitleCodec::MovText,
        SubtitleCodec::Subrip,
        SubtitleCodec::Webvtt,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SubtitleCodec::Ass => "ass",
            SubtitleCodec::DvdSubtitle => "dvd_subtitle",
            SubtitleCodec::HdmvPgsSubtitle => "hdmv_pgs_subtitle",
            SubtitleCodec::MovText => "mov_text",
            SubtitleCodec::Subrip => "subrip",
            SubtitleCodec::Webvtt => "webvtt",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|codec| codec.as_str() == name)
            .ok_or_else(|| FfguardError::UnsupportedSubtitleCodec {
                codec: name.to_string(),
                container: String::new(),
            })
    }

    pub fn supported_conversions(self) -> BTreeSet<&'static str> {
        self.supported_conversions_in(Registry::standard())
    }

    pub fn supported_conversions_in(self, registry: &Registry) -> BTreeSet<&str> {
        conversions_in(&registry.subtitle_conversions, self.as_str())
    }

    pub fn can_convert(self, target: &str) -> bool {
        self.can_convert_in(target, Registry::standard())
    }

    pub fn can_convert_in(self, target: &str, registry: &Registry) -> bool {
        self.supported_conversions_in(registry).contains(target)
    }

    pub fn select_conversion_for_container(self, container: &str) -> Option<&'static str> {
        self.select_conversion_for_container_in(container, Registry::standard())
    }

    /// Picks the subtitle codec to use when this codec has to end up in
    /// `container`: the alphabetically first codec that this one converts to
    /// and the container accepts. `None` for unknown containers or when there
    /// is no such codec.
    pub fn select_conversion_for_container_in<'r>(
        self,
        container: &str,
        registry: &'r Registry,
    ) -> Option<&'r str> {
        let container = Container::from_name(container).ok()?;
        let accepted = container.supported_subtitle_codecs_in(registry);

        self.supported_conversions_in(registry)
            .intersection(&accepted)
            .next()
            .copied()
    }
}

// ============================================================================
// SHARED TRAIT IMPLEMENTATIONS
// ============================================================================

macro_rules! impl_codec_traits {
    ($($codec:ty),*) => {$(
        impl fmt::Display for $codec {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $codec {
            type Err = FfguardError;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_name(s)
            }
        }

        impl TryFrom<String> for $codec {
            type Error = FfguardError;

            fn try_from(value: String) -> Result<Self> {
                Self::from_name(&value)
            }
        }

        impl From<$codec> for String {
            fn from(codec: $codec) -> Self {
                codec.as_str().to_string()
            }
        }

        impl AsRef<str> for $codec {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    )*};
}

impl_codec_traits!(VideoCodec, AudioCodec, SubtitleCodec);

// ============================================================================
// MODULE-LEVEL HELPERS
// ============================================================================

/// Encoder name for a video codec name. Fails for unknown codecs.
pub fn get_video_encoder(codec: &str) -> Result<Option<&'static str>> {
    Ok(VideoCodec::from_name(codec)?.encoder())
}

/// Encoder name for an audio codec name. Fails for unknown codecs.
pub fn get_audio_encoder(codec: &str) -> Result<Option<&'static str>> {
    Ok(AudioCodec::from_name(codec)?.encoder())
}

pub fn list_supported_video_conversions(codec: &str) -> Vec<&'static str> {
    VideoCodec::from_name(codec)
        .map(|c| c.supported_conversions().into_iter().collect())
        .unwrap_or_default()
}

pub fn list_supported_audio_conversions(codec: &str) -> Vec<&'static str> {
    AudioCodec::from_name(codec)
        .map(|c| c.supported_conversions().into_iter().collect())
        .unwrap_or_default()
}

pub fn list_supported_subtitle_conversions(codec: &str) -> Vec<&'static str> {
    SubtitleCodec::from_name(codec)
        .map(|c| c.supported_conversions().into_iter().collect())
        .unwrap_or_default()
}

/// Sample-rate check by codec name; false for unknown codecs.
pub fn is_supported_sample_rate(codec: &str, sample_rate: i64, encoder_info: Option<&EncoderInfo>) -> bool {
    AudioCodec::from_name(codec)
        .is_ok_and(|c| c.is_supported_sample_rate(sample_rate, encoder_info))
}
