//! Accessors over probed metadata
//!
//! ffprobe's JSON is kept as a `serde_json::Value` and read through the
//! functions here. None of them fail on missing keys, wrong types or `null`
//! values: they return `None` or an empty collection instead. Only
//! [`get_duration`] returns an error, because callers that need a duration
//! cannot continue without one.
//!
//! Stream filters compare `codec_type` exactly (`"video"`, `"audio"`,
//! `"subtitle"`, `"data"`); passing `None` selects every stream.

use serde_json::Value;

use crate::error::{FfguardError, Result};

/// Parses ffprobe's JSON output.
pub fn decode(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// The `format.format_name` value, which is a demuxer name.
pub fn get_format(metadata: &Value) -> Option<&str> {
    metadata.get("format")?.get("format_name")?.as_str()
}

/// The `format.duration` value in seconds. ffprobe reports it as a string;
/// plain numbers are accepted too.
pub fn get_duration(metadata: &Value) -> Result<f64> {
    let raw = metadata
        .get("format")
        .and_then(|format| format.get("duration"))
        .ok_or_else(|| FfguardError::InvalidFormatMetadata("Missing duration".to_string()))?;

    let parsed = match raw {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    parsed.ok_or_else(|| FfguardError::InvalidFormatMetadata(format!("Invalid duration: {raw}")))
}

/// Streams, optionally restricted to one `codec_type`.
pub fn get_streams<'a>(metadata: &'a Value, codec_type: Option<&str>) -> Vec<&'a Value> {
    let Some(streams) = metadata.get("streams").and_then(Value::as_array) else {
        return Vec::new();
    };

    streams
        .iter()
        .filter(|stream| match codec_type {
            None => true,
            Some(wanted) => stream.get("codec_type").and_then(Value::as_str) == Some(wanted),
        })
        .collect()
}

pub fn count_streams(metadata: &Value, codec_type: Option<&str>) -> usize {
    get_streams(metadata, codec_type).len()
}

/// One entry per selected stream; `None` where the attribute is missing or
/// `null`.
pub fn get_attribute_from_all_streams<'a>(
    metadata: &'a Value,
    attribute: &str,
    codec_type: Option<&str>,
) -> Vec<Option<&'a Value>> {
    get_streams(metadata, codec_type)
        .into_iter()
        .map(|stream| stream.get(attribute).filter(|value| !value.is_null()))
        .collect()
}

/// `codec_name` of every selected stream; `None` where it is missing or not
/// a string.
pub fn get_codecs<'a>(metadata: &'a Value, codec_type: Option<&str>) -> Vec<Option<&'a str>> {
    get_attribute_from_all_streams(metadata, "codec_name", codec_type)
        .into_iter()
        .map(|value| value.and_then(Value::as_str))
        .collect()
}

/// `index` of every selected stream that has a valid one.
pub fn find_stream_indexes(metadata: &Value, codec_type: Option<&str>) -> Vec<u64> {
    get_attribute_from_all_streams(metadata, "index", codec_type)
        .into_iter()
        .filter_map(|value| value.and_then(Value::as_u64))
        .collect()
}

fn dimension(stream: &Value, key: &str) -> Option<u32> {
    stream.get(key)?.as_u64()?.try_into().ok()
}

/// `[width, height]` of every video stream; `None` where either is missing.
pub fn get_resolutions(metadata: &Value) -> Vec<Option<[u32; 2]>> {
    get_streams(metadata, Some("video"))
        .into_iter()
        .map(|stream| Some([dimension(stream, "width")?, dimension(stream, "height")?]))
        .collect()
}

pub fn get_resolution(metadata: &Value) -> Option<[u32; 2]> {
    get_resolutions(metadata).into_iter().next().flatten()
}

/// Raw `r_frame_rate` of every video stream.
pub fn get_frame_rates(metadata: &Value) -> Vec<Option<&Value>> {
    get_attribute_from_all_streams(metadata, "r_frame_rate", Some("video"))
}

pub fn get_frame_rate(metadata: &Value) -> Option<&Value> {
    get_frame_rates(metadata).into_iter().next().flatten()
}

/// `sample_rate` of every audio stream.
///
/// ffprobe reports sample rates as strings. Strings holding a whole number
/// are converted to integers; anything else is returned unchanged so that
/// validation can reject it with the original value.
pub fn get_sample_rates(metadata: &Value) -> Vec<Option<Value>> {
    get_attribute_from_all_streams(metadata, "sample_rate", Some("audio"))
        .into_iter()
        .map(|value| {
            value.map(|raw| match raw.as_str().map(|s| s.parse::<i64>()) {
                Some(Ok(rate)) => Value::from(rate),
                _ => raw.clone(),
            })
        })
        .collect()
}

/// Codec of the first video stream.
pub fn get_video_codec(metadata: &Value) -> Option<&str> {
    get_codecs(metadata, Some("video")).into_iter().next().flatten()
}

/// Codec of the first audio stream.
pub fn get_audio_codec(metadata: &Value) -> Option<&str> {
    get_codecs(metadata, Some("audio")).into_iter().next().flatten()
}

/// The first audio stream.
pub fn get_audio_stream(metadata: &Value) -> Option<&Value> {
    get_streams(metadata, Some("audio")).into_iter().next()
}
