// ============================================================================
// ffguard-cli/src/commands/pipeline.rs
// ============================================================================
//
// PIPELINE COMMANDS: extract, split, transcode, merge, replace, compare
//
// Each command either runs its step through the core `Toolkit` or, with
// `--dry-run`, prints the ffmpeg command line it would run. Dry runs still
// probe inputs when the command line depends on their streams.

// ---- External crate imports ----
use ffguard_core::commands::{
    compute_psnr_command, compute_ssim_command, extract_streams_command, merge_videos_command,
    split_video_command, StreamReplacement,
};
use ffguard_core::tools::{read_segment_list, write_concat_list};
use ffguard_core::{meta, ReplaceOptions, TranscodingParams};
use log::{debug, info};

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};

// ---- Internal crate imports ----
use super::{load_params, load_params_json, Session};
use crate::cli::{CompareArgs, ExtractArgs, MergeArgs, Metric, ReplaceArgs, SplitArgs, TranscodeArgs};
use crate::error::{CliErrorContext, CliResult};
use crate::output::{print_command, print_info, print_success};

// ============================================================================
// EXTRACT / SPLIT
// ============================================================================

/// Execute the `extract` command
pub fn run_extract(session: &Session, args: &ExtractArgs) -> CliResult<()> {
    if args.dry_run {
        print_command(&extract_streams_command(
            &args.input,
            &args.output,
            &args.selectors,
            args.container.as_deref(),
        ));
        return Ok(());
    }

    session.toolkit().extract_streams(
        &args.input,
        &args.output,
        &args.selectors,
        args.container.as_deref(),
    )?;
    print_success(&format!("Extracted streams to {}", args.output.display()));
    Ok(())
}

fn probed_duration(session: &Session, input: &Path) -> CliResult<f64> {
    let metadata = session
        .toolkit()
        .probe(input)
        .cli_with_context(|| format!("Failed to probe {}", input.display()))?;
    Ok(meta::get_duration(&metadata)?)
}

/// Execute the `split` command
pub fn run_split(session: &Session, args: &SplitArgs) -> CliResult<()> {
    let toolkit = session.toolkit();
    let container = args.container.as_deref();

    if args.dry_run {
        let segment_length = match (args.segment_length, args.parts) {
            (Some(length), _) => length,
            (None, Some(parts)) if parts > 0 => probed_duration(session, &args.input)? / parts as f64,
            _ => return Err(crate::cli_error!("A positive --segment-length or --parts is required")),
        };
        let (argv, _) = split_video_command(&args.input, &args.output_dir, segment_length, container);
        print_command(&argv);
        return Ok(());
    }

    let segment_list = match (args.segment_length, args.parts) {
        (Some(length), _) => toolkit.split_video(&args.input, &args.output_dir, length, container)?,
        (None, Some(parts)) => toolkit.split_video_into(&args.input, &args.output_dir, parts, container)?,
        (None, None) => return Err(crate::cli_error!("Either --segment-length or --parts is required")),
    };

    let segments = read_segment_list(&segment_list)?;
    for segment in &segments {
        println!("{}", segment.display());
    }
    print_success(&format!(
        "Wrote {} segments, listed in {}",
        segments.len(),
        segment_list.display()
    ));
    Ok(())
}

// ============================================================================
// TRANSCODE / MERGE / REPLACE
// ============================================================================

/// Execute the `transcode` command
pub fn run_transcode(session: &Session, args: &TranscodeArgs) -> CliResult<()> {
    let toolkit = session.toolkit();

    let params = if args.skip_validation {
        debug!("Skipping validation of {}", args.input.display());
        load_params(&args.params)?
    } else {
        let metadata = toolkit
            .probe(&args.input)
            .cli_with_context(|| format!("Failed to probe {}", args.input.display()))?;
        session.validator().validate_transcoding_params_json(
            &load_params_json(&args.params)?,
            &metadata,
            session.config.transcoding_context(),
        )?
    };

    if args.dry_run {
        print_command(&session.builder().transcode_video_command(&args.input, &args.output, &params)?);
        return Ok(());
    }

    toolkit.transcode_video(&args.input, &args.output, &params)?;
    print_success(&format!("Transcoded to {}", args.output.display()));
    Ok(())
}

/// Concat list written next to the merge output.
fn concat_list_path(output: &Path) -> PathBuf {
    output.with_extension("concat.txt")
}

/// Execute the `merge` command
pub fn run_merge(session: &Session, args: &MergeArgs) -> CliResult<()> {
    let list = concat_list_path(&args.output);
    let container = args.container.as_deref();

    if args.dry_run {
        print_command(&merge_videos_command(&list, &args.output, container));
        return Ok(());
    }

    // The concat demuxer resolves relative entries against the list's directory
    let inputs = args
        .inputs
        .iter()
        .map(|input| {
            std::path::absolute(input)
                .cli_with_context(|| format!("Invalid input path {}", input.display()))
        })
        .collect::<CliResult<Vec<_>>>()?;

    write_concat_list(&list, &inputs)?;
    let result = session.toolkit().merge_videos(&list, &args.output, container);
    if let Err(e) = fs::remove_file(&list) {
        debug!("Could not remove {}: {e}", list.display());
    }
    result?;

    print_success(&format!("Merged {} files into {}", inputs.len(), args.output.display()));
    Ok(())
}

/// Execute the `replace` command
pub fn run_replace(session: &Session, args: &ReplaceArgs) -> CliResult<()> {
    let params: TranscodingParams = args
        .params
        .as_deref()
        .map(load_params)
        .transpose()?
        .unwrap_or_default();
    let toolkit = session.toolkit();

    if args.dry_run {
        let input_metadata = toolkit.probe(&args.input)?;
        let replacement_metadata = toolkit.probe(&args.replacement)?;
        let replacement = StreamReplacement {
            input: &args.input,
            replacement_source: &args.replacement,
            output: &args.output,
            stream_type: &args.stream_type,
            input_metadata: &input_metadata,
            replacement_metadata: &replacement_metadata,
            strip_unsupported_data: args.strip_data,
            strip_unsupported_subtitles: args.strip_subtitles,
        };
        print_command(&session.builder().replace_streams_command(&replacement, &params)?);
        return Ok(());
    }

    let options = ReplaceOptions {
        stream_type: &args.stream_type,
        strip_unsupported_data: args.strip_data,
        strip_unsupported_subtitles: args.strip_subtitles,
    };
    toolkit.replace_streams(&args.input, &args.replacement, &args.output, &params, options)?;
    print_success(&format!("Wrote {}", args.output.display()));
    Ok(())
}

// ============================================================================
// COMPARE
// ============================================================================

/// Execute the `compare` command
pub fn run_compare(session: &Session, args: &CompareArgs) -> CliResult<()> {
    if args.dry_run {
        let argv = match args.metric {
            Metric::Psnr => compute_psnr_command(&args.video, &args.reference, &args.frames),
            Metric::Ssim => compute_ssim_command(&args.video, &args.reference, &args.frames),
        };
        print_command(&argv);
        return Ok(());
    }

    let toolkit = session.toolkit();
    let lines = match args.metric {
        Metric::Psnr => toolkit.compute_psnr(&args.video, &args.reference, &args.frames, &args.log)?,
        Metric::Ssim => toolkit.compute_ssim(&args.video, &args.reference, &args.frames, &args.log)?,
    };

    match lines.last() {
        Some(summary) => print_info("Summary", summary),
        None => info!("ffmpeg reported no summary line"),
    }
    print_success(&format!("Wrote {}", args.log.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_list_path() {
        assert_eq!(
            concat_list_path(Path::new("out/merged.mkv")),
            PathBuf::from("out/merged.concat.txt")
        );
    }
}
