use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the crypto framework.
///
/// Configuration errors (`BadEnctype`, `BadCksumtype`, `BadKeySize`,
/// `InvalidParameter`) are never retried. `BadMessageSize` is raised before
/// any buffer is mutated, so a failed call leaves no partial state.
/// `Integrity` is kept distinct from format errors so callers can decide
/// what to leak about a failed decryption.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown or unsupported enctype {0}")]
    BadEnctype(i32),

    #[error("unknown or unsupported checksum type {0}")]
    BadCksumtype(i32),

    #[error("wrong key length for this enctype or checksum type")]
    BadKeySize,

    #[error("message size or buffer layout is invalid")]
    BadMessageSize,

    #[error("integrity check on decrypted data failed")]
    Integrity,

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("crypto backend failure: {0}")]
    Internal(&'static str),

    #[error("random number generation failed")]
    Random,
}
