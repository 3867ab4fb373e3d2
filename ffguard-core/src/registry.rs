// ============================================================================
// ffguard-core/src/registry.rs
// ============================================================================
//
// RULE TABLES: The Compatibility Matrix Behind Every Check
//
// Codec and container enumerations carry no data of their own. Everything they
// know (encoder names, allowed conversions, sample rates, per-container codec
// lists, frame-rate rules) lives in a `Registry` value. The built-in tables are
// constructed once per process and exposed through `Registry::standard()`;
// callers that need different rules build or deserialize their own `Registry`
// and pass it by reference.
//
// KEY COMPONENTS:
// - Registry: all tables, serializable to and from JSON
// - ContainerCodecs: video/audio/subtitle codec lists of one concrete muxer
// - FrameRateSubstitution / AspectRatioOverride: small rule records
// - check_invariants(): structural checks applied to loaded tables

// ---- External crate imports ----
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ---- Standard library imports ----
use std::collections::{BTreeMap, BTreeSet};

// ---- Internal crate imports ----
use crate::codecs::{AudioCodec, SubtitleCodec, VideoCodec};
use crate::error::{FfguardError, Result};
use crate::formats::Container;
use crate::frame_rate::FrameRate;
use crate::utils::SparseRange;

static STANDARD: Lazy<Registry> = Lazy::new(Registry::builtin);

/// Codecs a concrete muxer accepts, per stream kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerCodecs {
    pub video: BTreeSet<String>,
    pub audio: BTreeSet<String>,
    pub subtitle: BTreeSet<String>,
}

/// Replaces one source frame rate with another for a given target codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRateSubstitution {
    pub from: FrameRate,
    pub to: FrameRate,
}

/// Aspect ratio to report for a resolution whose reduced ratio is misleading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatioOverride {
    pub resolution: [u32; 2],
    pub aspect_ratio: String,
}

/// The complete set of compatibility tables.
///
/// Deserialization starts from the built-in tables, so a JSON document only
/// needs to contain the tables it replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    /// Video codec to encoder. A missing key means the codec name is also the
    /// encoder name; a `null` value means there is no usable encoder.
    pub video_encoders: BTreeMap<String, Option<String>>,
    pub audio_encoders: BTreeMap<String, Option<String>>,

    /// Codec to the codecs it may be converted to. A missing key means no
    /// conversion at all, not even to itself.
    pub video_conversions: BTreeMap<String, BTreeSet<String>>,
    pub audio_conversions: BTreeMap<String, BTreeSet<String>>,
    pub subtitle_conversions: BTreeMap<String, BTreeSet<String>>,

    /// Fallback sample-rate support keyed by encoder name.
    pub sample_rates: BTreeMap<String, SparseRange>,

    /// Codec lists for concrete muxers. Exclusive demuxers never appear here.
    pub containers: BTreeMap<String, ContainerCodecs>,

    /// Muxer to the demuxer that reads its output back.
    pub demuxers: BTreeMap<String, String>,

    /// Exclusive demuxer to the muxer able to hold anything it reads.
    pub intermediate_muxers: BTreeMap<String, String>,

    /// Frame rates accepted as transcoding targets, normalized.
    pub frame_rates: BTreeSet<FrameRate>,
    pub max_frame_rates: BTreeMap<String, FrameRate>,
    pub frame_rate_substitutions: BTreeMap<String, Vec<FrameRateSubstitution>>,

    /// Extra ffmpeg flags added after `-c:v` to keep quality stable.
    pub quality_flags: BTreeMap<String, Vec<String>>,

    /// Data stream codecs that can be carried over.
    pub data_codecs: BTreeSet<String>,

    pub aspect_ratio_overrides: Vec<AspectRatioOverride>,
    pub resolution_groups: BTreeMap<String, Vec<[u32; 2]>>,
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn container(video: &[&str], audio: &[&str], subtitle: &[&str]) -> ContainerCodecs {
    ContainerCodecs {
        video: names(video),
        audio: names(audio),
        subtitle: names(subtitle),
    }
}

fn encoders(entries: &[(&str, Option<&str>)]) -> BTreeMap<String, Option<String>> {
    entries
        .iter()
        .map(|(codec, encoder)| (codec.to_string(), encoder.map(str::to_string)))
        .collect()
}

/// Every codec in `all` may be converted to `targets` and to itself.
fn open_conversions<'a, I>(all: I, targets: &[&str]) -> BTreeMap<String, BTreeSet<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    all.into_iter()
        .map(|codec| {
            let mut allowed = names(targets);
            allowed.insert(codec.to_string());
            (codec.to_string(), allowed)
        })
        .collect()
}

impl Registry {
    /// The built-in tables, shared for the lifetime of the process.
    pub fn standard() -> &'static Registry {
        &STANDARD
    }

    fn builtin() -> Registry {
        let video_encoders = encoders(&[
            ("av1", None),
            ("flv1", Some("flv")),
            ("h264", Some("libx264")),
            ("h265", Some("libx265")),
            ("hevc", Some("libx265")),
            ("mpeg4", Some("libxvid")),
            ("theora", Some("libtheora")),
            ("vp8", Some("libvpx")),
            ("vp9", Some("libvpx-vp9")),
            ("wmv3", None),
        ]);

        let audio_encoders = encoders(&[
            ("aac", Some("aac")),
            ("amr_nb", Some("libopencore_amrnb")),
            ("mp3", Some("libmp3lame")),
            ("opus", Some("libopus")),
            ("vorbis", Some("libvorbis")),
            ("wmapro", None),
        ]);

        let video_conversions = open_conversions(
            VideoCodec::ALL.iter().map(|c| c.as_str()),
            &[
                "h264",
                "h265",
                "hevc",
                "mpeg1video",
                "mpeg2video",
                "mpeg4",
                "theora",
                "vp8",
                "vp9",
            ],
        );

        let audio_conversions = open_conversions(
            AudioCodec::ALL.iter().map(|c| c.as_str()),
            &["aac", "ac3", "mp2", "mp3", "opus", "vorbis"],
        );

        let text_subtitles = ["ass", "mov_text", "subrip", "webvtt"];
        let mut subtitle_conversions: BTreeMap<String, BTreeSet<String>> = text_subtitles
            .iter()
            .map(|codec| (codec.to_string(), names(&text_subtitles)))
            .collect();
        // Bitmap subtitles can only be copied
        for bitmap in [SubtitleCodec::DvdSubtitle, SubtitleCodec::HdmvPgsSubtitle] {
            subtitle_conversions.insert(bitmap.as_str().to_string(), names(&[bitmap.as_str()]));
        }

        let sample_rates = BTreeMap::from([
            (
                "aac".to_string(),
                SparseRange::points([
                    7350, 8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000, 64000,
                    88200, 96000,
                ]),
            ),
            ("ac3".to_string(), SparseRange::points([32000, 44100, 48000])),
            (
                "libmp3lame".to_string(),
                SparseRange::points([8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000]),
            ),
            ("libopencore_amrnb".to_string(), SparseRange::points([8000])),
            (
                "libopus".to_string(),
                SparseRange::points([8000, 12000, 16000, 24000, 48000]),
            ),
            (
                "libvorbis".to_string(),
                SparseRange::points([
                    8000, 11025, 16000, 22050, 32000, 44100, 48000, 64000, 88200, 96000, 176400,
                    192000,
                ]),
            ),
            (
                "mp2".to_string(),
                SparseRange::points([16000, 22050, 24000, 32000, 44100, 48000]),
            ),
            ("pcm_u8".to_string(), SparseRange::unbounded()),
            ("wmav2".to_string(), SparseRange::at_least(1)),
        ]);

        let three_gp = container(&["h263", "h264", "mpeg4"], &["aac", "amr_nb"], &["mov_text"]);
        let containers = BTreeMap::from([
            ("3g2".to_string(), three_gp.clone()),
            ("3gp".to_string(), three_gp),
            (
                "avi".to_string(),
                container(
                    &[
                        "h264",
                        "h265",
                        "hevc",
                        "mjpeg",
                        "mpeg1video",
                        "mpeg2video",
                        "mpeg4",
                        "msmpeg4v2",
                        "wmv1",
                        "wmv2",
                    ],
                    &["aac", "ac3", "mp2", "mp3", "opus", "pcm_u8"],
                    &[],
                ),
            ),
            ("f4v".to_string(), container(&["h264"], &["aac", "mp3"], &[])),
            (
                "matroska".to_string(),
                container(
                    &[
                        "av1",
                        "h264",
                        "h265",
                        "hevc",
                        "mjpeg",
                        "mpeg1video",
                        "mpeg2video",
                        "mpeg4",
                        "msmpeg4v2",
                        "theora",
                        "vp8",
                        "vp9",
                        "wmv1",
                        "wmv2",
                        "wmv3",
                    ],
                    &[
                        "aac", "ac3", "mp2", "mp3", "opus", "pcm_u8", "vorbis", "wmapro", "wmav2",
                    ],
                    &["ass", "dvd_subtitle", "hdmv_pgs_subtitle", "subrip", "webvtt"],
                ),
            ),
            (
                "mov".to_string(),
                container(
                    &["h264", "h265", "hevc", "mjpeg", "mpeg1video", "mpeg2video", "mpeg4"],
                    &["aac", "ac3", "mp3", "pcm_u8"],
                    &["mov_text"],
                ),
            ),
            (
                "mp4".to_string(),
                container(
                    &["av1", "h264", "h265", "hevc", "mpeg1video", "mpeg2video", "mpeg4", "vp9"],
                    &["aac", "ac3", "mp2", "mp3", "opus"],
                    &["mov_text"],
                ),
            ),
            (
                "mpeg".to_string(),
                container(&["mpeg1video", "mpeg2video"], &["ac3", "mp2", "mp3"], &["dvd_subtitle"]),
            ),
            (
                "webm".to_string(),
                container(&["av1", "vp8", "vp9"], &["opus", "vorbis"], &["webvtt"]),
            ),
        ]);

        let quick_time = Container::QuickTimeDemuxer.as_str();
        let matroska_webm = Container::MatroskaWebmDemuxer.as_str();
        let demuxers = [
            ("3g2", quick_time),
            ("3gp", quick_time),
            ("f4v", quick_time),
            ("matroska", matroska_webm),
            ("mov", quick_time),
            ("mp4", quick_time),
            ("webm", matroska_webm),
        ]
        .into_iter()
        .map(|(muxer, demuxer)| (muxer.to_string(), demuxer.to_string()))
        .collect();

        let intermediate_muxers = BTreeMap::from([
            (matroska_webm.to_string(), "matroska".to_string()),
            (quick_time.to_string(), "mp4".to_string()),
        ]);

        let frame_rates = [1, 5, 10, 12, 15, 20, 24, 25, 30, 48, 50, 60]
            .into_iter()
            .map(FrameRate::whole)
            .chain([
                FrameRate::ratio(24000, 1001),
                FrameRate::ratio(30000, 1001),
                FrameRate::ratio(60000, 1001),
            ])
            .collect();

        let max_frame_rates = BTreeMap::from([
            ("mpeg1video".to_string(), FrameRate::whole(60)),
            ("mpeg2video".to_string(), FrameRate::whole(60)),
        ]);

        // ffmpeg's mpeg-1/2 encoders reject 12.5 fps
        let twelve_and_a_half = vec![FrameRateSubstitution {
            from: FrameRate::ratio(25, 2),
            to: FrameRate::whole(12),
        }];
        let frame_rate_substitutions = BTreeMap::from([
            ("mpeg1video".to_string(), twelve_and_a_half.clone()),
            ("mpeg2video".to_string(), twelve_and_a_half),
        ]);

        let quality_flags = BTreeMap::from([(
            "h264".to_string(),
            vec!["-crf".to_string(), "22".to_string()],
        )]);

        let aspect_ratio_overrides = [
            ([1366, 768], "16:9"),
            ([1360, 768], "16:9"),
            ([2560, 1080], "21:9"),
            ([3440, 1440], "21:9"),
        ]
        .into_iter()
        .map(|(resolution, ratio)| AspectRatioOverride {
            resolution,
            aspect_ratio: ratio.to_string(),
        })
        .collect();

        let resolution_groups = BTreeMap::from([
            (
                "16:9".to_string(),
                vec![
                    [640, 360],
                    [1280, 720],
                    [1536, 864],
                    [1920, 1080],
                    [2048, 1152],
                    [2560, 1440],
                    [3840, 2160],
                    [1366, 768],
                    [1360, 768],
                ],
            ),
            ("4:3".to_string(), vec![[800, 600], [1024, 768]]),
            (
                "16:10".to_string(),
                vec![[1280, 800], [1440, 900], [1680, 1050], [1920, 1200]],
            ),
            ("5:4".to_string(), vec![[1280, 1024]]),
            ("21:9".to_string(), vec![[2560, 1080], [3440, 1440]]),
        ]);

        Registry {
            video_encoders,
            audio_encoders,
            video_conversions,
            audio_conversions,
            subtitle_conversions,
            sample_rates,
            containers,
            demuxers,
            intermediate_muxers,
            frame_rates,
            max_frame_rates,
            frame_rate_substitutions,
            quality_flags,
            data_codecs: names(&["bin_data"]),
            aspect_ratio_overrides,
            resolution_groups,
        }
    }

    /// Checks the structural rules the container lookups rely on.
    ///
    /// Built-in tables always pass. Tables loaded from a file are checked
    /// before use so that a broken file fails early with a clear message.
    pub fn check_invariants(&self) -> Result<()> {
        let invalid = |message: String| Err(FfguardError::InvalidArgument(message));

        for (muxer, demuxer) in &self.demuxers {
            let muxer_container = Container::from_name(muxer)?;
            Container::from_name(demuxer)?;
            if muxer_container.is_exclusive_demuxer() {
                return invalid(format!("Exclusive demuxer '{muxer}' used as a muxer"));
            }
        }

        for demuxer in Container::ALL.iter().filter(|c| c.is_exclusive_demuxer()) {
            let Some(muxer) = self.intermediate_muxers.get(demuxer.as_str()) else {
                return invalid(format!("No intermediate muxer for demuxer '{demuxer}'"));
            };
            if Container::from_name(muxer)?.is_exclusive_demuxer() {
                return invalid(format!("Intermediate muxer '{muxer}' is not a muxer"));
            }
            if self.containers.contains_key(demuxer.as_str()) {
                return invalid(format!(
                    "Codecs for exclusive demuxer '{demuxer}' are derived and must not be listed"
                ));
            }
        }

        for name in self.containers.keys() {
            Container::from_name(name)?;
        }

        if let Some(rate) = self.frame_rates.iter().find(|r| r.normalized() != **r) {
            return invalid(format!("Supported frame rate {rate} is not normalized"));
        }

        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables_pass_invariants() {
        Registry::standard().check_invariants().unwrap();
    }

    #[test]
    fn test_default_equals_standard() {
        assert_eq!(&Registry::default(), Registry::standard());
    }

    #[test]
    fn test_demuxer_map_never_keys_exclusive_demuxers() {
        let registry = Registry::standard();
        for key in registry.demuxers.keys() {
            assert!(!Container::from_name(key).unwrap().is_exclusive_demuxer());
        }
    }

    #[test]
    fn test_check_invariants_rejects_listed_demuxer_codecs() {
        let mut registry = Registry::default();
        registry
            .containers
            .insert("matroska,webm".to_string(), ContainerCodecs::default());
        assert!(matches!(
            registry.check_invariants(),
            Err(FfguardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_check_invariants_rejects_missing_intermediate_muxer() {
        let mut registry = Registry::default();
        registry.intermediate_muxers.remove("matroska,webm");
        assert!(registry.check_invariants().is_err());
    }

    #[test]
    fn test_check_invariants_rejects_unknown_containers() {
        let mut registry = Registry::default();
        registry
            .demuxers
            .insert("bla".to_string(), "matroska,webm".to_string());
        assert!(matches!(
            registry.check_invariants(),
            Err(FfguardError::UnsupportedVideoFormat(_))
        ));
    }

    #[test]
    fn test_partial_json_keeps_other_tables() {
        let registry: Registry =
            serde_json::from_str(r#"{"data_codecs": ["bin_data", "tmcd"]}"#).unwrap();
        assert!(registry.data_codecs.contains("tmcd"));
        assert_eq!(registry.containers, Registry::standard().containers);
    }

    #[test]
    fn test_json_round_trip() {
        let text = serde_json::to_string(Registry::standard()).unwrap();
        let parsed: Registry = serde_json::from_str(&text).unwrap();
        assert_eq!(&parsed, Registry::standard());
    }
}
