//! Splitting a video into segments
//!
//! The segment muxer writes `<stem>_<i><ext>` files next to a flat list of
//! their basenames. When the segments use a container other than the one the
//! extension implies, every segment name first gets [`SEGMENT_SUFFIX`]
//! appended so ffmpeg does not guess the format from it, and
//! [`fix_segment_names`] removes the suffix once ffmpeg is done.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::{container_arg, ffmpeg, push_args};
use crate::error::{FfguardError, Result};
use crate::utils::{path_arg, split_file_name};

/// Temporary suffix given to segment names while ffmpeg writes them.
pub const SEGMENT_SUFFIX: &str = ".ffguard-segment";

/// Builds the segment muxer command.
///
/// Returns the argument vector and the path of the segment list it will
/// write.
pub fn split_video_command<P1, P2>(
    input: P1,
    output_dir: P2,
    segment_length: f64,
    container: Option<&str>,
) -> (Vec<String>, PathBuf)
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();
    let (stem, extension) = split_file_name(input);

    let segment_list = output_dir.join(format!("{stem}_segments.txt"));
    let suffix = if container.is_some() { SEGMENT_SUFFIX } else { "" };
    let pattern = output_dir.join(format!("{stem}_%d{extension}{suffix}"));

    let mut argv = ffmpeg();
    push_args(&mut argv, ["-i".to_string(), path_arg(input)]);
    push_args(
        &mut argv,
        [
            "-map",
            "0",
            "-codec",
            "copy",
            "-f",
            "segment",
            "-reset_timestamps",
            "1",
        ],
    );
    push_args(&mut argv, ["-segment_time".to_string(), segment_length.to_string()]);
    push_args(&mut argv, ["-segment_list_type", "flat"]);
    push_args(&mut argv, ["-segment_list".to_string(), path_arg(&segment_list)]);
    if let Some(container) = container {
        push_args(&mut argv, ["-segment_format", container_arg(container)]);
    }
    argv.push(path_arg(&pattern));

    (argv, segment_list)
}

/// Strips [`SEGMENT_SUFFIX`] from every segment in `segment_list`.
///
/// The segment files are renamed and the list is rewritten with the new
/// basenames. Returns the renamed paths in list order.
pub fn fix_segment_names<P: AsRef<Path>>(segment_list: P) -> Result<Vec<PathBuf>> {
    let segment_list = segment_list.as_ref();
    let segment_dir = segment_list.parent().unwrap_or_else(|| Path::new(""));

    let contents = fs::read_to_string(segment_list)?;
    let mut renames = Vec::new();

    for line in contents.lines().filter(|line| !line.trim().is_empty()) {
        let fixed = line.strip_suffix(SEGMENT_SUFFIX).ok_or_else(|| {
            FfguardError::InvalidCommandOutput(format!(
                "Segment '{line}' in {} lacks the '{SEGMENT_SUFFIX}' suffix",
                segment_list.display()
            ))
        })?;

        let target = segment_dir.join(fixed);
        if target.exists() {
            return Err(FfguardError::FileAlreadyExists(target));
        }
        renames.push((segment_dir.join(line), target, fixed.to_string()));
    }

    let mut fixed_names = Vec::with_capacity(renames.len());
    let mut fixed_paths = Vec::with_capacity(renames.len());
    for (from, to, name) in renames {
        debug!("Renaming segment {} to {}", from.display(), to.display());
        fs::rename(&from, &to)?;
        fixed_names.push(name);
        fixed_paths.push(to);
    }

    let mut rewritten = fixed_names.join("\n");
    if !rewritten.is_empty() {
        rewritten.push('\n');
    }
    fs::write(segment_list, rewritten)?;

    Ok(fixed_paths)
}
