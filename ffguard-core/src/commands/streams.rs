//! Stream-index arithmetic and unsupported-stream detection
//!
//! ffmpeg numbers output streams in the order they are mapped. When streams
//! are removed or inserted in front of others, per-stream options such as
//! `-codec:N` must use the new numbers. The helpers here compute them.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::codecs::SubtitleCodec;
use crate::error::{FfguardError, Result};
use crate::formats::Container;
use crate::meta;
use crate::registry::Registry;

/// Renumbers retained streams after the streams in `removed` are dropped.
///
/// Each retained index is decreased by the number of removed indexes below
/// it. Duplicates in `removed` count once. A retained index that is also
/// listed as removed is a caller error.
///
/// ```
/// use std::collections::BTreeMap;
/// use ffguard_core::commands::adjust_stream_indexes_for_removals;
///
/// let streams = BTreeMap::from([(4, 'A'), (7, 'B'), (9, 'C')]);
/// let adjusted = adjust_stream_indexes_for_removals(streams, &[10, 1, 0, 5, 8]).unwrap();
/// assert_eq!(adjusted, BTreeMap::from([(2, 'A'), (4, 'B'), (5, 'C')]));
/// ```
pub fn adjust_stream_indexes_for_removals<T>(
    streams: BTreeMap<u64, T>,
    removed: &[u64],
) -> Result<BTreeMap<u64, T>> {
    let mut removed = removed.to_vec();
    removed.sort_unstable();
    removed.dedup();

    let mut pending = removed.iter().copied().peekable();
    let mut removed_below: u64 = 0;
    let mut adjusted = BTreeMap::new();

    // Both sequences are sorted, so one pass accumulates the prefix count
    for (index, value) in streams {
        while let Some(removed_index) = pending.next_if(|&r| r < index) {
            debug_assert!(removed_index < index);
            removed_below += 1;
        }

        if pending.peek() == Some(&index) {
            return Err(FfguardError::InvalidArgument(format!(
                "Stream {index} is both retained and removed"
            )));
        }

        adjusted.insert(index - removed_below, value);
    }

    Ok(adjusted)
}

/// Adds `delta` to every index. Fails if any index would become negative.
pub fn shift_stream_indexes<T>(streams: BTreeMap<u64, T>, delta: i64) -> Result<BTreeMap<u64, T>> {
    streams
        .into_iter()
        .map(|(index, value)| {
            let shifted = i128::from(index) + i128::from(delta);
            u64::try_from(shifted)
                .map(|shifted| (shifted, value))
                .map_err(|_| {
                    FfguardError::InvalidArgument(format!(
                        "Shifting stream {index} by {delta} gives a negative index"
                    ))
                })
        })
        .collect()
}

fn stream_index(stream: &Value) -> Option<u64> {
    stream.get("index").and_then(Value::as_u64)
}

fn codec_name(stream: &Value) -> Option<&str> {
    stream.get("codec_name").and_then(Value::as_str)
}

pub fn get_lists_of_unsupported_stream_numbers(
    metadata: &Value,
    container: Option<&str>,
) -> (Vec<u64>, Vec<u64>) {
    get_lists_of_unsupported_stream_numbers_in(metadata, container, Registry::standard())
}

/// Indexes of data streams and subtitle streams that cannot be carried over.
///
/// A data stream is unsupported when its codec is not whitelisted. A subtitle
/// stream is unsupported when its codec is unknown, or when `container` is a
/// known container and nothing the codec converts to fits in it. With no
/// container, or an unknown one, only the codec itself is checked.
pub fn get_lists_of_unsupported_stream_numbers_in(
    metadata: &Value,
    container: Option<&str>,
    registry: &Registry,
) -> (Vec<u64>, Vec<u64>) {
    let container = container.filter(|name| Container::is_supported(name));

    let data = meta::get_streams(metadata, Some("data"))
        .into_iter()
        .filter(|stream| !codec_name(stream).is_some_and(|c| registry.data_codecs.contains(c)))
        .filter_map(stream_index)
        .collect();

    let subtitles = meta::get_streams(metadata, Some("subtitle"))
        .into_iter()
        .filter(|stream| {
            let codec = codec_name(stream).and_then(|c| SubtitleCodec::from_name(c).ok());
            match (codec, container) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(codec), Some(container)) => codec
                    .select_conversion_for_container_in(container, registry)
                    .is_none(),
            }
        })
        .filter_map(stream_index)
        .collect();

    (data, subtitles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::{btree_set, vec};
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_adjust_stream_indexes_for_removals() {
        let streams = BTreeMap::from([(4, "A"), (7, "B"), (9, "C")]);
        assert_eq!(
            adjust_stream_indexes_for_removals(streams, &[10, 1, 0, 5, 8]).unwrap(),
            BTreeMap::from([(2, "A"), (4, "B"), (5, "C")])
        );
    }

    #[test]
    fn test_adjust_stream_indexes_edge_cases() {
        let empty: BTreeMap<u64, ()> = BTreeMap::new();
        assert!(adjust_stream_indexes_for_removals(empty, &[1, 2]).unwrap().is_empty());

        let streams = BTreeMap::from([(0, 'a'), (3, 'b')]);
        assert_eq!(
            adjust_stream_indexes_for_removals(streams.clone(), &[]).unwrap(),
            streams
        );
        assert_eq!(
            adjust_stream_indexes_for_removals(streams.clone(), &[1, 1, 2, 2]).unwrap(),
            BTreeMap::from([(0, 'a'), (1, 'b')])
        );
        assert!(matches!(
            adjust_stream_indexes_for_removals(streams, &[3]),
            Err(FfguardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_shift_stream_indexes() {
        let streams = BTreeMap::from([(1, 'a'), (4, 'b')]);
        assert_eq!(
            shift_stream_indexes(streams.clone(), 2).unwrap(),
            BTreeMap::from([(3, 'a'), (6, 'b')])
        );
        assert_eq!(
            shift_stream_indexes(streams.clone(), -1).unwrap(),
            BTreeMap::from([(0, 'a'), (3, 'b')])
        );
        assert!(matches!(
            shift_stream_indexes(streams, -2),
            Err(FfguardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unsupported_stream_numbers() {
        let metadata = json!({"streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264"},
            {"index": 1, "codec_type": "data", "codec_name": "bin_data"},
            {"index": 2, "codec_type": "data", "codec_name": "tmcd"},
            {"index": 3, "codec_type": "subtitle", "codec_name": "subrip"},
            {"index": 4, "codec_type": "subtitle", "codec_name": "dvd_subtitle"},
            {"index": 5, "codec_type": "subtitle", "codec_name": "eia_608"},
            {"index": 6, "codec_type": "data"}
        ]});

        assert_eq!(
            get_lists_of_unsupported_stream_numbers(&metadata, Some("mp4")),
            (vec![2, 6], vec![4, 5])
        );
        assert_eq!(
            get_lists_of_unsupported_stream_numbers(&metadata, Some("matroska")),
            (vec![2, 6], vec![5])
        );
        assert_eq!(
            get_lists_of_unsupported_stream_numbers(&metadata, Some("avi")),
            (vec![2, 6], vec![3, 4, 5])
        );
        // Unknown or missing container: only the codec itself is checked
        assert_eq!(
            get_lists_of_unsupported_stream_numbers(&metadata, None),
            (vec![2, 6], vec![5])
        );
        assert_eq!(
            get_lists_of_unsupported_stream_numbers(&metadata, Some("bla")),
            (vec![2, 6], vec![5])
        );
    }

    proptest! {
        #[test]
        fn prop_adjusted_indexes_are_monotonic_and_bounded(
            retained in btree_set(0u64..200, 0..30),
            removed in vec(0u64..200, 0..30),
        ) {
            let removed: Vec<u64> = removed.into_iter().filter(|r| !retained.contains(r)).collect();
            let streams: BTreeMap<u64, u64> = retained.iter().map(|&i| (i, i)).collect();

            let adjusted = adjust_stream_indexes_for_removals(streams, &removed).unwrap();

            // No collisions
            prop_assert_eq!(adjusted.len(), retained.len());

            let mut previous: Option<u64> = None;
            for (&new_index, &original) in &adjusted {
                prop_assert!(new_index <= original);
                let below = removed
                    .iter()
                    .filter(|&&r| r < original)
                    .collect::<std::collections::BTreeSet<_>>()
                    .len() as u64;
                prop_assert_eq!(new_index, original - below);
                if let Some(previous) = previous {
                    prop_assert!(new_index > previous);
                }
                previous = Some(new_index);
            }
        }

        #[test]
        fn prop_shift_round_trips(
            retained in btree_set(0u64..1000, 0..20),
            delta in 0i64..1000,
        ) {
            let streams: BTreeMap<u64, ()> = retained.iter().map(|&i| (i, ())).collect();
            let shifted = shift_stream_indexes(streams.clone(), delta).unwrap();
            prop_assert_eq!(shift_stream_indexes(shifted, -delta).unwrap(), streams);
        }
    }
}
