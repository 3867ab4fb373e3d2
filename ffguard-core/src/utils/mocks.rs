// ffguard-core/src/utils/mocks.rs

// --- Mocking Infrastructure (for testing) ---

//! A scripted [`ProcessRunner`] for exercising [`Toolkit`](crate::Toolkit)
//! and other runner consumers without ffmpeg installed.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use log::{info, warn};

use super::command::{CommandOutput, ProcessRunner};
use crate::error::{FfguardError, Result};

/// Represents an expected command and its scripted result.
pub struct MockExpectation {
    /// Substring looked for in any argument of the received command
    pub arg_pattern: String,
    pub result: Result<CommandOutput>,
    /// Create an empty file at the last argument before returning
    pub create_dummy_output: bool,
}

/// Runner that answers commands from a list of expectations.
///
/// Each expectation is consumed by the first command that has an argument
/// containing its pattern. A command no expectation matches fails with
/// `CommandExecution`. Clones share expectations and received calls.
#[derive(Clone, Default)]
pub struct MockRunner {
    expectations: Rc<RefCell<Vec<MockExpectation>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(
        &self,
        arg_pattern: &str,
        result: Result<CommandOutput>,
        create_dummy_output: bool,
    ) {
        self.expectations.borrow_mut().push(MockExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
            create_dummy_output,
        });
    }

    /// Expects a successful command printing `stdout`.
    pub fn add_success_expectation(&self, arg_pattern: &str, stdout: &str, create_dummy_output: bool) {
        let output = CommandOutput {
            status: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        self.add_expectation(arg_pattern, Ok(output), create_dummy_output);
    }

    /// Expects a successful command printing `stderr` (where ffmpeg reports).
    pub fn add_stderr_expectation(&self, arg_pattern: &str, stderr: &str) {
        let output = CommandOutput {
            status: Some(0),
            stdout: String::new(),
            stderr: stderr.to_string(),
        };
        self.add_expectation(arg_pattern, Ok(output), false);
    }

    /// Expects a command that exits with `exit_code`.
    pub fn add_exit_error_expectation(&self, arg_pattern: &str, exit_code: i32) {
        self.add_expectation(
            arg_pattern,
            Err(FfguardError::CommandFailed {
                command: vec![arg_pattern.to_string()],
                exit_code: Some(exit_code),
            }),
            false,
        );
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }

    pub fn remaining_expectations(&self) -> usize {
        self.expectations.borrow().len()
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        self.received_calls.borrow_mut().push(argv.to_vec());

        let mut expectations = self.expectations.borrow_mut();
        let found_index = expectations
            .iter()
            .position(|exp| argv.iter().any(|arg| arg.contains(&exp.arg_pattern)));

        let Some(index) = found_index else {
            warn!("MockRunner: No expectation found for command args: {argv:?}");
            return Err(FfguardError::CommandExecution(format!(
                "MockRunner: unexpected command {argv:?}"
            )));
        };

        let expectation = expectations.remove(index);
        info!("MockRunner: Matched expectation with pattern '{}'", expectation.arg_pattern);

        if expectation.create_dummy_output && expectation.result.is_ok() {
            if let Some(output) = argv.last().map(PathBuf::from) {
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::File::create(&output)?;
            }
        }

        expectation.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expectations_are_consumed_in_order() {
        let runner = MockRunner::new();
        runner.add_success_expectation("-show_streams", "{}", false);
        runner.add_exit_error_expectation("-lavfi", 1);

        let probe = vec!["ffprobe".to_string(), "-show_streams".to_string()];
        assert_eq!(runner.run(&probe).unwrap().stdout, "{}");
        assert!(matches!(
            runner.run(&probe),
            Err(FfguardError::CommandExecution(_))
        ));

        let metric = vec!["ffmpeg".to_string(), "-lavfi".to_string()];
        assert!(matches!(
            runner.run(&metric),
            Err(FfguardError::CommandFailed { exit_code: Some(1), .. })
        ));

        assert_eq!(runner.get_received_calls().len(), 3);
        assert_eq!(runner.remaining_expectations(), 0);
    }
}
