// ffguard-core/tests/pipeline_tests.rs
//
// Full extract -> split -> transcode -> merge -> replace run against the real
// ffmpeg. Ignored by default; run with `cargo test -- --ignored` on a machine
// with ffmpeg, ffprobe and the libx264, libvpx and libmp3lame encoders.

use std::path::Path;
use std::process::Command;

use ffguard_core::formats::get_safe_intermediate_format_for_demuxer;
use ffguard_core::meta;
use ffguard_core::tools::{read_segment_list, write_concat_list};
use ffguard_core::{
    validate_transcoding_params, FrameRate, ReplaceOptions, SystemRunner, Toolkit,
    TranscodingContext, TranscodingParams,
};
use tempfile::tempdir;

const NUM_SEGMENTS: usize = 3;

fn ffmpeg_has_encoders(encoders: &[&str]) -> bool {
    let output = match Command::new("ffmpeg").args(["-hide_banner", "-encoders"]).output() {
        Ok(output) if output.status.success() => output,
        _ => return false,
    };
    let listing = String::from_utf8_lossy(&output.stdout);
    encoders.iter().all(|encoder| listing.contains(encoder))
        && Command::new("ffprobe").arg("-version").output().is_ok()
}

// Helper function to create a test video with one video and one audio stream
fn create_test_video(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-f", "lavfi",
            "-i", "testsrc=duration=6:size=400x200:rate=30",
            "-f", "lavfi",
            "-i", "sine=frequency=440:duration=6",
            "-c:v", "libx264",
            "-pix_fmt", "yuv420p",
            "-c:a", "aac",
            "-shortest",
        ])
        .arg(path)
        .status()?;

    if !status.success() {
        return Err("Failed to create test video".into());
    }
    Ok(())
}

#[test]
#[ignore = "needs ffmpeg and ffprobe with libx264, libvpx and libmp3lame"]
fn test_full_pipeline() -> Result<(), Box<dyn std::error::Error>> {
    if !ffmpeg_has_encoders(&["libx264", "libvpx", "libmp3lame"]) {
        return Err("ffmpeg with libx264, libvpx and libmp3lame not found".into());
    }

    let work = tempdir()?;
    let input = work.path().join("input.mp4");
    create_test_video(&input)?;

    let toolkit = Toolkit::new(SystemRunner::default());
    let input_metadata = toolkit.probe(&input)?;

    // EXTRACT
    let extracted = work.path().join("extract/input[video-only].mp4");
    toolkit.extract_streams(&input, &extracted, &["v"], Some("mp4"))?;
    let extracted_metadata = toolkit.probe(&extracted)?;
    assert_eq!(meta::count_streams(&extracted_metadata, Some("audio")), 0);

    // SPLIT
    let duration = meta::get_duration(&extracted_metadata)?;
    let demuxer = meta::get_format(&extracted_metadata).ok_or("missing format")?;
    let muxer = get_safe_intermediate_format_for_demuxer(demuxer)?;
    let split_dir = work.path().join("split");
    let segment_list = toolkit.split_video(
        &extracted,
        &split_dir,
        duration / NUM_SEGMENTS as f64,
        Some(muxer),
    )?;
    let segments = read_segment_list(&segment_list)?;
    assert!(!segments.is_empty());
    for (i, segment) in segments.iter().enumerate() {
        assert!(segment.is_file());
        assert_eq!(
            segment.file_name().and_then(|n| n.to_str()),
            Some(format!("input[video-only]_{i}.mp4").as_str())
        );
    }

    // TRANSCODE
    let params = TranscodingParams::new("matroska", [200, 100], "vp8")
        .with_frame_rate(FrameRate::whole(25));
    validate_transcoding_params(&params, &extracted_metadata, TranscodingContext::default())?;

    let transcode_dir = work.path().join("transcode");
    let mut transcoded = Vec::new();
    for segment in &segments {
        let stem = segment.file_stem().ok_or("segment without name")?;
        let output = transcode_dir.join(stem).with_extension("mkv");
        toolkit.transcode_video(segment, &output, &params)?;
        assert!(output.is_file());
        transcoded.push(output);
    }

    // MERGE
    let merge_list = work.path().join("merge/segments.txt");
    write_concat_list(&merge_list, &transcoded)?;
    let merged = work.path().join("merge/merged.mkv");
    toolkit.merge_videos(&merge_list, &merged, Some("matroska"))?;

    // REPLACE: the original keeps its audio, re-encoded, and gets the new video
    let final_output = work.path().join("replace/final.mkv");
    let audio_params = TranscodingParams::default()
        .with_container("matroska")
        .with_audio_codec("mp3")
        .with_audio_bitrate("128k");
    toolkit.replace_streams(
        &input,
        &merged,
        &final_output,
        &audio_params,
        ReplaceOptions {
            stream_type: "v",
            strip_unsupported_data: true,
            strip_unsupported_subtitles: true,
        },
    )?;

    let final_metadata = toolkit.probe(&final_output)?;
    assert_eq!(meta::get_format(&final_metadata), Some("matroska,webm"));
    assert_eq!(meta::get_video_codec(&final_metadata), Some("vp8"));
    assert_eq!(meta::get_resolution(&final_metadata), Some([200, 100]));
    assert_eq!(
        meta::get_frame_rate(&final_metadata).and_then(|v| v.as_str()),
        Some("25/1")
    );
    assert_eq!(meta::get_audio_codec(&final_metadata), Some("mp3"));
    assert_eq!(
        meta::get_duration(&final_metadata)?.round(),
        meta::get_duration(&input_metadata)?.round()
    );

    Ok(())
}
