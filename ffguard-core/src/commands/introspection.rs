//! Muxer and encoder introspection
//!
//! `ffmpeg -h muxer=<name>` and `ffmpeg -h encoder=<name>` print human-readable
//! descriptions. Two lines from them matter here: the muxer's default audio
//! codec and the encoder's list of supported sample rates.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ffmpeg;
use crate::error::{FfguardError, Result};

const DEFAULT_AUDIO_CODEC_PATTERN: &str = r"(?m)^\s*Default audio codec:\s*([^\s.]+)\.?\s*$";
const SAMPLE_RATES_PATTERN: &str = r"(?m)^\s*Supported sample rates:(.*)$";

/// What a muxer reports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxerInfo {
    pub default_audio_codec: Option<String>,
}

/// What an encoder reports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderInfo {
    pub sample_rates: Option<Vec<u32>>,
}

pub fn muxer_info_command(muxer: &str) -> Vec<String> {
    let mut argv = ffmpeg();
    argv.extend(["-hide_banner".to_string(), "-h".to_string(), format!("muxer={muxer}")]);
    argv
}

pub fn encoder_info_command(encoder: &str) -> Vec<String> {
    let mut argv = ffmpeg();
    argv.extend(["-hide_banner".to_string(), "-h".to_string(), format!("encoder={encoder}")]);
    argv
}

/// Returns the single capture of `pattern` in `output`.
fn single_match<'a>(pattern: &str, output: &'a str, what: &str) -> Result<&'a str> {
    let regex = Regex::new(pattern)?;
    let mut captures = regex
        .captures_iter(output)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));

    match (captures.next(), captures.next()) {
        (Some(value), None) => Ok(value),
        (None, _) => Err(FfguardError::NoMatchingEncoder(format!(
            "No '{what}' line in ffmpeg output"
        ))),
        (Some(_), Some(_)) => Err(FfguardError::NoMatchingEncoder(format!(
            "More than one '{what}' line in ffmpeg output"
        ))),
    }
}

/// Extracts the default audio codec from `ffmpeg -h muxer=...` output.
pub fn parse_muxer_info(output: &str) -> Result<MuxerInfo> {
    let codec = single_match(DEFAULT_AUDIO_CODEC_PATTERN, output, "Default audio codec")?;
    Ok(MuxerInfo {
        default_audio_codec: Some(codec.to_string()),
    })
}

/// Extracts the supported sample rates from `ffmpeg -h encoder=...` output.
pub fn parse_encoder_info(output: &str) -> Result<EncoderInfo> {
    let rates = single_match(SAMPLE_RATES_PATTERN, output, "Supported sample rates")?;

    let sample_rates = rates
        .split_whitespace()
        .map(|token| {
            token
                .parse::<u32>()
                .map_err(|_| FfguardError::InvalidSampleRateInfo(token.to_string()))
        })
        .collect::<Result<Vec<u32>>>()?;

    Ok(EncoderInfo {
        sample_rates: Some(sample_rates),
    })
}
