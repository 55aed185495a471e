use thiserror::Error;

/// Everything that can make a single decode call fail.
///
/// All variants are fatal to the call that produced them. They are a
/// deterministic function of the input bytes and the cached metadata, so
/// retrying the same call reproduces the same error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CprDecodeError {
    #[error("truncated input: ran out of bytes at offset {offset}")]
    Truncated { offset: usize },

    #[error("bad value block magic: expected \"cprval\", found {found:?}")]
    BadMagic { found: Vec<u8> },

    #[error("malformed metadata: family {family} declares unknown metric type {type_value}")]
    MalformedMetadata { family: u64, type_value: u64 },

    #[error("metadata version mismatch: cached {expected:?}, value block declares {found}")]
    VersionMismatch { expected: Option<u64>, found: u64 },

    #[error("unknown metric family index {0}")]
    UnknownFamily(u64),

    #[error("unknown label index {label} in metric family {family}")]
    UnknownLabel { family: u64, label: u64 },

    #[error("unsupported metric type {0}")]
    UnsupportedMetricType(u64),

    #[error("invalid UTF-8 in string field at offset {offset}")]
    InvalidUtf8 { offset: usize },
}
