//! Failure classification for remote calls.

use tonic::Code;

/// Status codes for which retrying cannot change the outcome.
pub const NON_RETRYABLE_CODES: [Code; 8] = [
    Code::InvalidArgument,
    Code::PermissionDenied,
    Code::Unauthenticated,
    Code::NotFound,
    Code::AlreadyExists,
    Code::FailedPrecondition,
    Code::OutOfRange,
    Code::Unimplemented,
];

/// An error that may carry a transport status code.
pub trait StatusCarrier {
    /// Returns the status code, or `None` when the error has no recognizable one.
    fn status_code(&self) -> Option<Code>;
}

impl StatusCarrier for tonic::Status {
    fn status_code(&self) -> Option<Code> {
        Some(self.code())
    }
}

impl StatusCarrier for tonic::transport::Error {
    fn status_code(&self) -> Option<Code> {
        None
    }
}

/// Classifies a status code. Errors without a code are assumed transient.
#[must_use]
pub fn is_retryable_code(code: Option<Code>) -> bool {
    code.map_or(true, |code| !NON_RETRYABLE_CODES.contains(&code))
}

/// Returns whether retrying the call that produced `error` is likely to help.
#[must_use]
pub fn is_retryable<E: StatusCarrier + ?Sized>(error: &E) -> bool {
    is_retryable_code(error.status_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Status;

    struct Opaque;

    impl StatusCarrier for Opaque {
        fn status_code(&self) -> Option<Code> {
            None
        }
    }

    #[test]
    fn test_denylisted_codes_are_not_retryable() {
        for code in NON_RETRYABLE_CODES {
            assert!(
                !is_retryable(&Status::new(code, "nope")),
                "{:?} should not be retried",
                code
            );
        }
    }

    #[test]
    fn test_transient_codes_are_retryable() {
        for code in [
            Code::Unavailable,
            Code::DeadlineExceeded,
            Code::Internal,
            Code::Unknown,
            Code::ResourceExhausted,
            Code::Aborted,
            Code::Cancelled,
            Code::DataLoss,
        ] {
            assert!(is_retryable(&Status::new(code, "flaky")), "{:?} should be retried", code);
        }
    }

    #[test]
    fn test_codeless_errors_are_retryable() {
        assert!(is_retryable(&Opaque));
        assert!(is_retryable_code(None));
    }
}
