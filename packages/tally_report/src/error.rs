use std::error::Error as StdError;

use thiserror::Error;

/// Why a chunk of data points did not reach the backend.
///
/// Transmission errors are never fatal to a reporter: the failed chunk is logged and
/// skipped, and the remaining chunks of the cycle are still sent.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransmitError {
    /// The backend received the request but refused it.
    #[error("backend rejected the data points: {reason}")]
    Rejected {
        /// The explanation given by the backend.
        reason: String,
    },

    /// The request could not be delivered.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl TransmitError {
    /// Creates a [`TransmitError::Rejected`] with the given reason.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Wraps an error of the underlying transport.
    #[must_use]
    pub fn transport(error: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Transport(error.into())
    }
}
