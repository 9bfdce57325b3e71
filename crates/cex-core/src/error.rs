use thiserror::Error;

/// Stable, opaque error classification shared by every capability in the
/// crate (§7 of the specification). Callers match on `kind()`, never on the
/// `Display` text, which is implementation-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoErrorKind {
    InvalidParam,
    InvalidKey,
    InvalidSize,
    InvalidSalt,
    InvalidNonce,
    NotInitialized,
    IllegalOperation,
    AuthenticationFailure,
    Unsupported,
    InternalError,
}

/// A fallible crypto operation's error: a stable `kind`, the module that
/// raised it, and a human-readable (non-normative) message.
#[derive(Debug, Error, Clone)]
#[error("{kind:?} in {location}: {message}")]
pub struct CryptoError {
    pub kind: CryptoErrorKind,
    pub location: &'static str,
    pub message: String,
}

impl CryptoError {
    pub fn new(kind: CryptoErrorKind, location: &'static str, message: impl Into<String>) -> Self {
        CryptoError { kind, location, message: message.into() }
    }

    pub fn invalid_param(location: &'static str, message: impl Into<String>) -> Self {
        Self::new(CryptoErrorKind::InvalidParam, location, message)
    }

    pub fn invalid_key(location: &'static str, message: impl Into<String>) -> Self {
        Self::new(CryptoErrorKind::InvalidKey, location, message)
    }

    pub fn invalid_size(location: &'static str, message: impl Into<String>) -> Self {
        Self::new(CryptoErrorKind::InvalidSize, location, message)
    }

    pub fn invalid_salt(location: &'static str, message: impl Into<String>) -> Self {
        Self::new(CryptoErrorKind::InvalidSalt, location, message)
    }

    pub fn invalid_nonce(location: &'static str, message: impl Into<String>) -> Self {
        Self::new(CryptoErrorKind::InvalidNonce, location, message)
    }

    pub fn not_initialized(location: &'static str) -> Self {
        Self::new(CryptoErrorKind::NotInitialized, location, "operation requires initialize() first")
    }

    pub fn illegal_operation(location: &'static str, message: impl Into<String>) -> Self {
        Self::new(CryptoErrorKind::IllegalOperation, location, message)
    }

    pub fn authentication_failure(location: &'static str) -> Self {
        Self::new(CryptoErrorKind::AuthenticationFailure, location, "tag verification failed")
    }

    pub fn unsupported(location: &'static str, message: impl Into<String>) -> Self {
        Self::new(CryptoErrorKind::Unsupported, location, message)
    }

    pub fn internal(location: &'static str, message: impl Into<String>) -> Self {
        Self::new(CryptoErrorKind::InternalError, location, message)
    }

    pub fn kind(&self) -> CryptoErrorKind {
        self.kind
    }
}

pub type Result<T> = core::result::Result<T, CryptoError>;
