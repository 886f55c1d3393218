//! Worker configuration, read once from the environment at startup.
//!
//! | Variable                   | Default      | Meaning                              |
//! |----------------------------|--------------|--------------------------------------|
//! | `DATESIFT_INPUT_FD`        | `3`          | descriptor requests arrive on        |
//! | `DATESIFT_OUTPUT_FD`       | `4`          | descriptor responses are written to  |
//! | `DATESIFT_MAX_FRAME_BYTES` | `4294967295` | largest accepted/emitted payload     |
//! | `DATESIFT_SUPPRESS_LINE`   | unset        | stderr line to drop (exact match)    |
//! | `DATESIFT_LOG`             | `info`       | log level (`RUST_LOG` overrides)     |
//! | `LOG_FORMAT`               | text         | `json` for JSON log lines            |

use crate::bridge::codec::MAX_WIRE_FRAME_BYTES;
use crate::worker::LoopOptions;

pub const DEFAULT_INPUT_FD: i32 = 3;
pub const DEFAULT_OUTPUT_FD: i32 = 4;

/// Diagnostic stream; never usable as a protocol slot.
const STDERR_FD: i32 = 2;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an integer, got '{value}'")]
    NotAnInteger { var: &'static str, value: String },

    #[error("{var} must not be {fd}: {reason}")]
    ReservedFd {
        var: &'static str,
        fd: i32,
        reason: &'static str,
    },

    #[error("DATESIFT_INPUT_FD and DATESIFT_OUTPUT_FD must differ (both are {0})")]
    SameFd(i32),

    #[error("DATESIFT_MAX_FRAME_BYTES must be between 1 and {max}, got {value}")]
    FrameLimit { value: u64, max: usize },

    #[error("unknown DATESIFT_LOG level '{0}' (expected debug, info, warn or error)")]
    LogLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Base level for this workspace's crates, e.g. `"info"`.
    pub level: &'static str,
    /// Full `RUST_LOG` directive; replaces `level` when present.
    pub rust_log: Option<String>,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info",
            rust_log: None,
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub input_fd: i32,
    pub output_fd: i32,
    pub max_frame_length: usize,
    /// Lines dropped from stderr when they match exactly.
    pub suppressed_lines: Vec<String>,
    pub log: LogConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            input_fd: DEFAULT_INPUT_FD,
            output_fd: DEFAULT_OUTPUT_FD,
            max_frame_length: MAX_WIRE_FRAME_BYTES,
            suppressed_lines: Vec::new(),
            log: LogConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input_fd = fd_var(&lookup, "DATESIFT_INPUT_FD", DEFAULT_INPUT_FD)?;
        let output_fd = fd_var(&lookup, "DATESIFT_OUTPUT_FD", DEFAULT_OUTPUT_FD)?;
        if input_fd == output_fd {
            return Err(ConfigError::SameFd(input_fd));
        }

        let max_frame_length = match lookup("DATESIFT_MAX_FRAME_BYTES") {
            None => MAX_WIRE_FRAME_BYTES,
            Some(raw) => {
                let value: u64 = raw.trim().parse().map_err(|_| ConfigError::NotAnInteger {
                    var: "DATESIFT_MAX_FRAME_BYTES",
                    value: raw.clone(),
                })?;
                if value == 0 || value > MAX_WIRE_FRAME_BYTES as u64 {
                    return Err(ConfigError::FrameLimit {
                        value,
                        max: MAX_WIRE_FRAME_BYTES,
                    });
                }
                value as usize
            }
        };

        let suppressed_lines = lookup("DATESIFT_SUPPRESS_LINE")
            .filter(|line| !line.is_empty())
            .into_iter()
            .collect();

        let level = match lookup("DATESIFT_LOG").as_deref() {
            None | Some("") | Some("info") => "info",
            Some("debug") => "debug",
            Some("trace") => "trace",
            Some("warn") | Some("warning") => "warn",
            Some("error") => "error",
            Some(other) => return Err(ConfigError::LogLevel(other.to_string())),
        };

        let format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            input_fd,
            output_fd,
            max_frame_length,
            suppressed_lines,
            log: LogConfig {
                level,
                rust_log: lookup("RUST_LOG").filter(|v| !v.is_empty()),
                format,
            },
        })
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            max_frame_length: self.max_frame_length,
        }
    }
}

fn fd_var<F>(lookup: &F, var: &'static str, default: i32) -> Result<i32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    let fd: i32 = raw.trim().parse().map_err(|_| ConfigError::NotAnInteger {
        var,
        value: raw.clone(),
    })?;
    if fd < 0 {
        return Err(ConfigError::ReservedFd {
            var,
            fd,
            reason: "descriptors are non-negative",
        });
    }
    if fd == STDERR_FD {
        return Err(ConfigError::ReservedFd {
            var,
            fd,
            reason: "stderr carries diagnostics",
        });
    }
    Ok(fd)
}
