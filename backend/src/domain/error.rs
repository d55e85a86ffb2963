//! Domain-level error type.
//!
//! Transport agnostic: the GraphQL adapter maps these onto wire errors so the
//! domain never learns about response envelopes.

use std::fmt;

/// Stable machine-readable code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// No viewer could be resolved from the request credentials.
    Unauthenticated,
    /// The requested record does not exist.
    NotFound,
    /// The request payload fails validation.
    InvalidInput,
    /// The viewer may not perform this action on this record.
    InvalidOperation,
    /// The host has not finished payment onboarding.
    PaymentSetupRequired,
    /// The payment gateway did not capture the charge.
    PaymentFailed,
    /// A store rejected or lost a write.
    Persistence,
    /// Unexpected failure inside an adapter.
    Internal,
}

impl ErrorCode {
    /// Wire identifier exposed to clients alongside the message.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InvalidOperation => "INVALID_OPERATION",
            Self::PaymentSetupRequired => "PAYMENT_SETUP_REQUIRED",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::Persistence => "PERSISTENCE",
            Self::Internal => "INTERNAL",
        }
    }
}

/// Domain failure carrying a code and a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    code: ErrorCode,
    message: String,
}

impl DomainError {
    /// Create an error with an explicit code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Convenience constructor for [`ErrorCode::Unauthenticated`].
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidOperation`].
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOperation, message)
    }

    /// Convenience constructor for [`ErrorCode::PaymentSetupRequired`].
    pub fn payment_setup_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PaymentSetupRequired, message)
    }

    /// Convenience constructor for [`ErrorCode::PaymentFailed`].
    pub fn payment_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PaymentFailed, message)
    }

    /// Convenience constructor for [`ErrorCode::Persistence`].
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Persistence, message)
    }

    /// Convenience constructor for [`ErrorCode::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DomainError {}

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_matching_codes() {
        assert_eq!(
            DomainError::unauthenticated("no viewer").code(),
            ErrorCode::Unauthenticated
        );
        assert_eq!(
            DomainError::payment_setup_required("no wallet").code(),
            ErrorCode::PaymentSetupRequired
        );
        assert_eq!(DomainError::persistence("lost").code(), ErrorCode::Persistence);
    }

    #[test]
    fn display_uses_message() {
        let err = DomainError::not_found("listing cannot be found");
        assert_eq!(err.to_string(), "listing cannot be found");
    }
}
