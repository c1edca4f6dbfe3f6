//! Error types for trace loading, navigation and rendering
//!
//! [`VisualizerError`] covers every failure the library reports:
//!
//! - Construction failures ([`MalformedTrace`], [`InvalidOption`],
//!   [`UncaughtExecutionFailure`]) are fatal and returned synchronously.
//! - [`DanglingReference`] is raised while resolving a step whose heap does
//!   not contain a referenced object.
//! - Navigation failures ([`OutOfRange`]) are recoverable: the current step
//!   is left unchanged.
//! - [`BackendUnavailable`] is surfaced to the host as a notice.
//!
//! [`MalformedTrace`]: VisualizerError::MalformedTrace
//! [`InvalidOption`]: VisualizerError::InvalidOption
//! [`UncaughtExecutionFailure`]: VisualizerError::UncaughtExecutionFailure
//! [`DanglingReference`]: VisualizerError::DanglingReference
//! [`OutOfRange`]: VisualizerError::OutOfRange
//! [`BackendUnavailable`]: VisualizerError::BackendUnavailable

use crate::memory::value::HeapId;
use thiserror::Error;

/// Errors reported by the visualizer and its collaborators
#[derive(Debug, Error)]
pub enum VisualizerError {
    /// The trace is empty or structurally invalid
    #[error("malformed trace: {reason}")]
    MalformedTrace { reason: String },

    /// A reference names a heap object missing from the same step
    #[error("step {step}: reference to heap object {id} has no matching object")]
    DanglingReference { step: usize, id: HeapId },

    /// Navigation outside `[0, len - 1]`
    #[error("step {requested} is out of range (trace has {len} steps)")]
    OutOfRange { requested: i64, len: usize },

    /// Unrecognized or conflicting configuration
    #[error("invalid option: {reason}")]
    InvalidOption { reason: String },

    /// The execution service could not produce a trace
    #[error("execution backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    /// The trace records a run that failed before producing any state
    #[error("{message}")]
    UncaughtExecutionFailure { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VisualizerError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        VisualizerError::MalformedTrace {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_option(reason: impl Into<String>) -> Self {
        VisualizerError::InvalidOption {
            reason: reason.into(),
        }
    }

    pub(crate) fn backend(reason: impl Into<String>) -> Self {
        VisualizerError::BackendUnavailable {
            reason: reason.into(),
        }
    }

    /// Whether the caller can keep using the visualizer after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VisualizerError::OutOfRange { .. } | VisualizerError::BackendUnavailable { .. }
        )
    }
}

pub type Result<T, E = VisualizerError> = std::result::Result<T, E>;
