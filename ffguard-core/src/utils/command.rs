//! Running ffmpeg and ffprobe
//!
//! Command builders produce argument vectors whose first element is the
//! literal program name (`ffmpeg` or `ffprobe`). A [`ProcessRunner`] executes
//! them. [`SystemRunner`] spawns real processes and substitutes the
//! configured program paths for those names; tests use their own runners.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, error, warn};

use crate::commands::{FFMPEG_COMMAND, FFPROBE_COMMAND};
use crate::error::{FfguardError, Result};
use crate::logging;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len());
        combined.push_str(&self.stdout);
        combined.push_str(&self.stderr);
        combined
    }
}

/// Executes argument vectors.
pub trait ProcessRunner {
    /// Runs `argv` to completion. A non-zero exit is an error.
    fn run(&self, argv: &[String]) -> Result<CommandOutput>;

    /// Runs `argv` and writes its combined output to `path`, creating the
    /// parent directories first.
    fn run_to_file(&self, argv: &[String], path: &Path) -> Result<CommandOutput> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let output = self.run(argv)?;
        fs::write(path, output.combined())?;
        Ok(output)
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        (**self).run(argv)
    }
}

/// Runs commands as child processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemRunner {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from(FFMPEG_COMMAND),
            ffprobe: PathBuf::from(FFPROBE_COMMAND),
        }
    }
}

impl SystemRunner {
    pub fn new<P1: Into<PathBuf>, P2: Into<PathBuf>>(ffmpeg: P1, ffprobe: P2) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn program<'a>(&'a self, name: &'a str) -> &'a Path {
        match name {
            FFMPEG_COMMAND => &self.ffmpeg,
            FFPROBE_COMMAND => &self.ffprobe,
            other => Path::new(other),
        }
    }

    /// Checks that ffmpeg and ffprobe can be started.
    pub fn check_dependencies(&self) -> Result<()> {
        check_dependency(&self.ffmpeg)?;
        check_dependency(&self.ffprobe)
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        let Some((program, args)) = argv.split_first() else {
            return Err(FfguardError::InvalidArgument("Empty command".to_string()));
        };
        logging::log_command(argv);

        let output = Command::new(self.program(program))
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                error!("Failed to execute command {program}: {e}");
                if e.kind() == io::ErrorKind::NotFound {
                    FfguardError::DependencyNotFound(self.program(program).display().to_string())
                } else {
                    FfguardError::CommandExecution(format!("Failed to execute {program}: {e}"))
                }
            })?;

        let output = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.success() {
            error!(
                "Command failed with exit code {}: {}",
                output.status.map_or("unknown".to_string(), |c| c.to_string()),
                output.stderr.trim_end()
            );
            return Err(FfguardError::CommandFailed {
                command: argv.to_vec(),
                exit_code: output.status,
            });
        }

        Ok(output)
    }
}

/// Verifies that `program -version` can be started.
pub fn check_dependency<P: AsRef<Path>>(program: P) -> Result<()> {
    let program = program.as_ref();
    match Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => {
            debug!("Found dependency: {}", program.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Dependency '{}' not found.", program.display());
            Err(FfguardError::DependencyNotFound(program.display().to_string()))
        }
        Err(e) => Err(FfguardError::CommandExecution(format!(
            "Failed to start {}: {e}",
            program.display()
        ))),
    }
}
