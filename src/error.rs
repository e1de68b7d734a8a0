//! use pkitrust::error::PkiError;

use thiserror::Error;

/// Represents errors that can occur in the pkitrust library.
///
/// Signature mismatches are not errors: verification reports them as `Ok(false)`.
/// A missing trust path is not an error either: chain verification returns `None`.
#[derive(Debug, Error, Clone)]
pub enum PkiError {
    /// Input could not be imported: unreadable, oversized, malformed, or no
    /// candidate object kind decoded it.
    #[error("Import failed: {0}")]
    ImportError(String),

    /// Malformed PEM framing.
    #[error("Invalid PEM format: {0}")]
    FormatError(String),

    /// The operation is not defined for this kind of key or algorithm.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error reported by the crypto provider while signing, encrypting or decrypting.
    #[error("Crypto error: {0}")]
    CryptoError(String),

    /// Error while writing an object to disk.
    #[error("Unable to export: {0}")]
    ExportError(String),
}

pub type Result<T> = std::result::Result<T, PkiError>;

impl From<der::Error> for PkiError {
    /// Converts a `der::Error` into a `PkiError`.
    fn from(err: der::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for PkiError {
    fn from(err: rsa::Error) -> Self {
        PkiError::CryptoError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for PkiError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for PkiError {
    fn from(err: pkcs8::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for PkiError {
    fn from(err: pkcs8::spki::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

impl From<ecdsa::Error> for PkiError {
    fn from(err: ecdsa::Error) -> Self {
        PkiError::CryptoError(err.to_string())
    }
}

impl From<ecdsa::elliptic_curve::Error> for PkiError {
    fn from(err: ecdsa::elliptic_curve::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}
