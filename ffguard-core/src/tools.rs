// ============================================================================
// ffguard-core/src/tools.rs
// ============================================================================
//
// TOOLKIT: Running the Command Builders
//
// `Toolkit` pairs a `ProcessRunner` with a `Registry` and offers one method
// per pipeline step: probe, extract, split, transcode, merge, replace, and the
// PSNR/SSIM quality metrics. Each method builds its argument vector with the
// functions in `commands`, runs it, and does whatever file-system work the
// step needs afterwards (segment renames, concat lists, metric logs).
//
// Output directories are created before ffmpeg is asked to write into them.

// ---- External crate imports ----
use log::{debug, info, warn};
use serde_json::Value;

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

// ---- Internal crate imports ----
use crate::commands::{
    self, encoder_info_command, fix_segment_names, muxer_info_command, parse_encoder_info,
    parse_muxer_info, split_video_command, CommandBuilder, EncoderInfo, MuxerInfo,
    StreamReplacement,
};
use crate::error::{FfguardError, Result};
use crate::meta;
use crate::params::TranscodingParams;
use crate::registry::Registry;
use crate::utils::ProcessRunner;

/// What to replace in [`Toolkit::replace_streams`].
#[derive(Debug, Clone, Copy)]
pub struct ReplaceOptions<'a> {
    /// `v`, `V` or `a`
    pub stream_type: &'a str,
    pub strip_unsupported_data: bool,
    pub strip_unsupported_subtitles: bool,
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Runs ffmpeg and ffprobe commands through a [`ProcessRunner`].
#[derive(Debug, Clone)]
pub struct Toolkit<'r, R: ProcessRunner> {
    runner: R,
    registry: &'r Registry,
}

impl<R: ProcessRunner> Toolkit<'static, R> {
    /// A toolkit using the built-in rule tables.
    pub fn new(runner: R) -> Self {
        Self::with_registry(runner, Registry::standard())
    }
}

impl<'r, R: ProcessRunner> Toolkit<'r, R> {
    pub fn with_registry(runner: R, registry: &'r Registry) -> Self {
        Self { runner, registry }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    fn builder(&self) -> CommandBuilder<'r> {
        CommandBuilder::new(self.registry)
    }

    // ========================================================================
    // PROBING
    // ========================================================================

    /// Probes `video` and decodes the ffprobe JSON.
    pub fn probe<P: AsRef<Path>>(&self, video: P) -> Result<Value> {
        let output = self.runner.run(&commands::get_metadata_command(video))?;
        meta::decode(&output.stdout)
    }

    /// Like [`Toolkit::probe`], but returns an empty object when probing fails.
    pub fn get_metadata_json<P: AsRef<Path>>(&self, video: P) -> Value {
        let video = video.as_ref();
        self.probe(video).unwrap_or_else(|e| {
            warn!("Could not read metadata of {}: {e}", video.display());
            Value::Object(Default::default())
        })
    }

    /// Writes the ffprobe output for `video` to `output`.
    pub fn get_metadata_to_file<P1, P2>(&self, video: P1, output: P2) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        self.runner
            .run_to_file(&commands::get_metadata_command(video), output.as_ref())?;
        Ok(())
    }

    /// Duration in seconds of the first video stream.
    pub fn get_video_len<P: AsRef<Path>>(&self, video: P) -> Result<f64> {
        let output = self.runner.run(&commands::get_video_len_command(video))?;
        let text = output.stdout.trim();
        text.parse::<f64>().map_err(|_| {
            FfguardError::InvalidCommandOutput(format!("Expected a duration, got '{text}'"))
        })
    }

    pub fn query_muxer_info(&self, muxer: &str) -> Result<MuxerInfo> {
        let output = self.runner.run(&muxer_info_command(muxer))?;
        parse_muxer_info(&output.combined())
    }

    pub fn query_encoder_info(&self, encoder: &str) -> Result<EncoderInfo> {
        let output = self.runner.run(&encoder_info_command(encoder))?;
        parse_encoder_info(&output.combined())
    }

    // ========================================================================
    // PIPELINE STEPS
    // ========================================================================

    pub fn extract_streams<P1, P2, S>(
        &self,
        input: P1,
        output: P2,
        selectors: &[S],
        container: Option<&str>,
    ) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        S: AsRef<str>,
    {
        create_parent_dir(output.as_ref())?;
        self.runner.run(&commands::extract_streams_command(
            input, output, selectors, container,
        ))?;
        Ok(())
    }

    /// Splits `input` into segments of `segment_length` seconds inside
    /// `output_dir` and returns the path of the segment list.
    pub fn split_video<P1, P2>(
        &self,
        input: P1,
        output_dir: P2,
        segment_length: f64,
        container: Option<&str>,
    ) -> Result<PathBuf>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        if !(segment_length.is_finite() && segment_length > 0.0) {
            return Err(FfguardError::InvalidArgument(format!(
                "Segment length must be positive, got {segment_length}"
            )));
        }
        fs::create_dir_all(output_dir.as_ref())?;

        let (argv, segment_list) =
            split_video_command(input, output_dir, segment_length, container);
        self.runner.run(&argv)?;

        if container.is_some() {
            let segments = fix_segment_names(&segment_list)?;
            debug!("Renamed {} segments", segments.len());
        }
        Ok(segment_list)
    }

    /// Splits `input` into `parts` segments of equal length.
    pub fn split_video_into<P1, P2>(
        &self,
        input: P1,
        output_dir: P2,
        parts: usize,
        container: Option<&str>,
    ) -> Result<PathBuf>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        if parts == 0 {
            return Err(FfguardError::InvalidArgument(
                "Cannot split a video into zero parts".to_string(),
            ));
        }
        let duration = meta::get_duration(&self.probe(input.as_ref())?)?;
        self.split_video(input, output_dir, duration / parts as f64, container)
    }

    pub fn transcode_video<P1, P2>(
        &self,
        input: P1,
        output: P2,
        params: &TranscodingParams,
    ) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        create_parent_dir(output.as_ref())?;
        let argv = self.builder().transcode_video_command(input, output, params)?;
        self.runner.run(&argv)?;
        Ok(())
    }

    /// Concatenates the files listed in `list_file` into `output`.
    pub fn merge_videos<P1, P2>(&self, list_file: P1, output: P2, container: Option<&str>) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        create_parent_dir(output.as_ref())?;
        self.runner
            .run(&commands::merge_videos_command(list_file, output, container))?;
        Ok(())
    }

    /// Replaces the streams selected by `options.stream_type` in `input` with
    /// the ones from `replacement_source`.
    pub fn replace_streams<P1, P2, P3>(
        &self,
        input: P1,
        replacement_source: P2,
        output: P3,
        params: &TranscodingParams,
        options: ReplaceOptions<'_>,
    ) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let input_metadata = self.probe(input.as_ref())?;
        let replacement_metadata = self.probe(replacement_source.as_ref())?;
        create_parent_dir(output.as_ref())?;

        let replacement = StreamReplacement {
            input: input.as_ref(),
            replacement_source: replacement_source.as_ref(),
            output: output.as_ref(),
            stream_type: options.stream_type,
            input_metadata: &input_metadata,
            replacement_metadata: &replacement_metadata,
            strip_unsupported_data: options.strip_unsupported_data,
            strip_unsupported_subtitles: options.strip_unsupported_subtitles,
        };
        let argv = self.builder().replace_streams_command(&replacement, params)?;
        self.runner.run(&argv)?;
        Ok(())
    }

    // ========================================================================
    // QUALITY METRICS
    // ========================================================================

    fn filter_metric(&self, argv: &[String], marker: &str, log_file: &Path) -> Result<Vec<String>> {
        let output = self.runner.run(argv)?;
        let lines: Vec<String> = output
            .combined()
            .lines()
            .filter(|line| line.contains(marker))
            .map(str::to_string)
            .collect();

        create_parent_dir(log_file)?;
        let mut contents = lines.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        fs::write(log_file, contents)?;

        info!("{marker}: {}", lines.last().map_or("no summary", String::as_str));
        Ok(lines)
    }

    /// Computes PSNR against `reference`. Per-frame values go to
    /// `frames_file`; the summary lines are written to `log_file` and returned.
    pub fn compute_psnr<P1, P2, P3, P4>(
        &self,
        video: P1,
        reference: P2,
        frames_file: P3,
        log_file: P4,
    ) -> Result<Vec<String>>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
        P4: AsRef<Path>,
    {
        create_parent_dir(frames_file.as_ref())?;
        let argv = commands::compute_psnr_command(video, reference, frames_file);
        self.filter_metric(&argv, "PSNR", log_file.as_ref())
    }

    /// Computes SSIM against `reference`, like [`Toolkit::compute_psnr`].
    pub fn compute_ssim<P1, P2, P3, P4>(
        &self,
        video: P1,
        reference: P2,
        frames_file: P3,
        log_file: P4,
    ) -> Result<Vec<String>>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
        P4: AsRef<Path>,
    {
        create_parent_dir(frames_file.as_ref())?;
        let argv = commands::compute_ssim_command(video, reference, frames_file);
        self.filter_metric(&argv, "SSIM", log_file.as_ref())
    }
}

/// Writes a concat demuxer list naming `files`, one `file '<path>'` line each.
pub fn write_concat_list<P, I>(list_file: P, files: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    let mut contents = String::new();
    for file in files {
        let path = file.as_ref().to_string_lossy().replace('\'', r"'\''");
        contents.push_str(&format!("file '{path}'\n"));
    }
    create_parent_dir(list_file.as_ref())?;
    fs::write(list_file, contents)?;
    Ok(())
}

/// Reads a flat segment list and returns the segment paths, resolved against
/// the list's directory.
pub fn read_segment_list<P: AsRef<Path>>(segment_list: P) -> Result<Vec<PathBuf>> {
    let segment_list = segment_list.as_ref();
    let dir = segment_list.parent().unwrap_or_else(|| Path::new(""));
    Ok(fs::read_to_string(segment_list)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| dir.join(line))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_concat_list() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("lists/merge.txt");

        write_concat_list(&list, ["/a/seg_0.mkv", "/a/it's.mkv"]).unwrap();

        assert_eq!(
            fs::read_to_string(&list).unwrap(),
            "file '/a/seg_0.mkv'\nfile '/a/it'\\''s.mkv'\n"
        );
    }

    #[test]
    fn test_read_segment_list() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("clip_segments.txt");
        fs::write(&list, "clip_0.mp4\nclip_1.mp4\n\n").unwrap();

        assert_eq!(
            read_segment_list(&list).unwrap(),
            vec![dir.path().join("clip_0.mp4"), dir.path().join("clip_1.mp4")]
        );
    }
}
