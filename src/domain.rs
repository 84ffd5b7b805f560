use polars::error::PolarsError;
use std::io::Error;

use crate::breakpoint::BreakpointThresholds;

#[derive(Debug)]
pub enum RtabError {
    IoError(Error),
    PolarsError(PolarsError),
    ConfigError(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl From<Error> for RtabError {
    fn from(err: Error) -> Self {
        RtabError::IoError(err)
    }
}

impl From<PolarsError> for RtabError {
    fn from(err: PolarsError) -> Self {
        RtabError::PolarsError(err)
    }
}

impl From<serde_json::Error> for RtabError {
    fn from(err: serde_json::Error) -> Self {
        RtabError::ConfigError(err)
    }
}

// Messages produced by the controller and consumed by the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    Resize(usize, usize),
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveLeft,
    MoveRight,
    MoveBeginning,
    MoveEnd,
    CycleBreakpoint,
    ResetBreakpoint,
}

#[derive(Debug, Clone)]
pub struct RtabConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub quiet_structure_warnings: bool,
    pub thresholds: BreakpointThresholds,
}

impl Default for RtabConfig {
    fn default() -> Self {
        RtabConfig {
            event_poll_time: 100,
            max_column_width: 40,
            quiet_structure_warnings: false,
            thresholds: BreakpointThresholds::default(),
        }
    }
}
