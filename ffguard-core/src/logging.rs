//! Logging helpers for ffguard
//!
//! The library only emits records through the `log` facade; installing a
//! logger is left to the binary. Commands are logged at debug level before
//! they run, in a form that can be pasted into a shell.

use log::debug;

/// Quotes one argument for display when it contains shell-special characters.
fn quote_arg(arg: &str) -> String {
    let is_plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+%@".contains(c));
    if is_plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Renders an argument vector as a single shell-style line.
#[must_use]
pub fn format_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| quote_arg(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Log a command before executing it
pub fn log_command(argv: &[String]) {
    debug!("Executing command: {}", format_command(argv));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_command() {
        let argv: Vec<String> = ["ffmpeg", "-nostdin", "-i", "my clip.mp4", "-vf", "scale=2:1", "it's.mkv", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            format_command(&argv),
            r"ffmpeg -nostdin -i 'my clip.mp4' -vf scale=2:1 'it'\''s.mkv' ''"
        );
    }
}
