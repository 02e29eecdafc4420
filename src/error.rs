#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the task runner."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.

use std::path::{Path, PathBuf};

/// Unified error type returned by every task and by the CLI.
///
/// Failures of external programs are reported through [`Error::Spawn`] and
/// [`Error::CommandFailed`]; the remaining variants describe problems detected
/// by the runner itself.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors raised while touching generated artifacts.
    #[error("I/O failure at {path:?}: {source}")]
    Io {
        /// Location that triggered the failure.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// The operating system refused to start an external program.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Program that could not be started.
        program: String,
        /// Underlying I/O error reported by the spawn call.
        source:  std::io::Error
    },
    /// An external program ran but did not exit successfully.
    #[error("command `{program}` failed: {status}")]
    CommandFailed {
        /// Full command line of the failing invocation.
        program: String,
        /// Exit code, absent when the process was terminated by a signal.
        code:    Option<i32>,
        /// Human readable exit status.
        status:  String
    },
    /// Wraps YAML decoding errors raised while loading the settings file.
    #[error("failed to parse configuration: {source}")]
    Config {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps YAML encoding errors raised while rendering front matter.
    #[error("failed to render front matter: {source}")]
    FrontMatter {
        /// Source encoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when user input violates an invariant.
    #[error("invalid input: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// The requested task is not declared in the task graph.
    #[error("don't know how to build task '{name}'")]
    UnknownTask {
        /// Name supplied by the caller.
        name: String
    },
    /// The declared task graph is not acyclic.
    #[error("circular dependency detected at task '{task}'")]
    DependencyCycle {
        /// Task participating in the cycle.
        task: String
    },
    /// One or more JSON files in the built site failed to parse.
    #[error("JSONLint found {errors} errors!")]
    JsonLint {
        /// Number of files that failed validation.
        errors: usize
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Process exit status that should be reported for this error.
    ///
    /// Failing external programs propagate their own exit code so wrappers
    /// observe the same status they would get from invoking the tool directly.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Config {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("something went wrong");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "something went wrong");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/_data/analytics");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::io_error(path, io_error);

        match error {
            Error::Io {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}")
        }
    }

    #[test]
    fn serde_yaml_conversion_maps_to_config_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::Config { .. }));
    }

    #[test]
    fn json_lint_message_reports_count() {
        let error = Error::JsonLint {
            errors: 3
        };
        assert_eq!(error.to_string(), "JSONLint found 3 errors!");
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn command_failure_propagates_exit_code() {
        let error = Error::CommandFailed {
            program: "brew formula-analytics".to_owned(),
            code:    Some(7),
            status:  "exit status: 7".to_owned()
        };
        assert_eq!(error.exit_code(), 7);

        let signalled = Error::CommandFailed {
            program: "brew formula-analytics".to_owned(),
            code:    None,
            status:  "signal: 9".to_owned()
        };
        assert_eq!(signalled.exit_code(), 1);
    }
}
