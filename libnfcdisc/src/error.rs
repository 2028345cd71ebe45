// libnfcdisc/src/error.rs

use thiserror::Error;

/// Common error type for the discovery engine and its collaborators.
///
/// "Busy" is not represented here: multi-tick operations return
/// `std::task::Poll::Pending` while they are still in progress.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument is out of range
    #[error("invalid parameter: {0}")]
    Param(&'static str),

    /// Not callable in the current engine state
    #[error("operation not allowed in the current state")]
    WrongState,

    /// The feature or technology is not compiled in
    #[error("feature disabled: {0}")]
    Disabled(&'static str),

    /// No answer within the frame waiting time
    #[error("operation timed out")]
    Timeout,

    /// Frame delay time exceeded
    #[error("frame delay time overrun")]
    Overrun,

    /// Malformed or unexpected frame
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// The remote field or device disappeared
    #[error("remote field lost")]
    LinkLoss,

    /// A buffer is too small for the data
    #[error("buffer too small: capacity {capacity}, required {required}")]
    NoMemory {
        /// Available bytes
        capacity: usize,
        /// Bytes needed
        required: usize,
    },

    /// The remote poller put us to sleep. A control signal, not a failure.
    #[error("sleep requested by remote poller")]
    SleepRequested,

    /// Nothing to act on
    #[error("no device activated")]
    Request,

    /// Broken engine invariant
    #[error("internal error: {0}")]
    Internal(String),

    /// Error passed up from the radio driver
    #[error("radio driver error: {0}")]
    Driver(String),
}

impl Error {
    /// Control signals are reported through the error channel but do not
    /// indicate a failure of the operation.
    pub fn is_control_signal(&self) -> bool {
        matches!(self, Error::SleepRequested)
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
