use thiserror::Error;

use crate::QueueClass;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "out of device memory while allocating `{label}` \
         ({requested} bytes requested, {available} available)"
    )]
    OutOfDeviceMemory {
        label: String,
        requested: u64,
        available: u64,
    },

    #[error("device lost: {reason}")]
    DeviceLost { reason: String },

    #[error(
        "pass `{pass}` accessed image `{image}` without a barrier after \
         `{previous}`"
    )]
    MissingBarrier {
        pass: String,
        image: String,
        previous: String,
    },

    #[error(
        "{queue:?} submission accessed image `{image}` while {previous} \
         might still be using it"
    )]
    UnorderedSubmission {
        image: String,
        queue: QueueClass,
        previous: String,
    },
}

/// Coarse classification of [`Error`]s; none of them is recoverable at the
/// denoiser's level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Components were driven in a way that breaks their contract; most of
    /// these are caught by assertions instead.
    PreconditionViolation,

    /// Allocating GPU resources failed during construction or resize.
    ResourceExhausted,

    DeviceLost,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OutOfDeviceMemory { .. } => ErrorKind::ResourceExhausted,
            Error::DeviceLost { .. } => ErrorKind::DeviceLost,
            Error::MissingBarrier { .. } => ErrorKind::PreconditionViolation,
            Error::UnorderedSubmission { .. } => {
                ErrorKind::PreconditionViolation
            }
        }
    }

    pub(crate) fn device_lost(reason: impl ToString) -> Self {
        Error::DeviceLost {
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let err = Error::OutOfDeviceMemory {
            label: "strata_final".into(),
            requested: 1024,
            available: 512,
        };

        assert_eq!(ErrorKind::ResourceExhausted, err.kind());

        assert_eq!(
            "out of device memory while allocating `strata_final` (1024 \
             bytes requested, 512 available)",
            err.to_string(),
        );

        assert_eq!(ErrorKind::DeviceLost, Error::device_lost("boom").kind());
    }
}
