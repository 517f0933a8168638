// src/error.rs
use thiserror::Error;

/// Reasons a record could not be framed, decoded or built.
///
/// Decoding never surfaces these to callers (a failed sub-parse degrades to a
/// generic record), they only end up in the log. Encoding constructors and
/// the command-line tool return them.
#[derive(Debug, Error)]
pub enum NdefError {
    #[error("truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("declared payload length {0} is out of range")]
    LengthOverflow(u64),
    #[error("record type is longer than 255 bytes")]
    TypeTooLong,
    #[error("record id is longer than 255 bytes")]
    IdTooLong,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("invalid UTF-16")]
    InvalidUtf16,
    #[error("unknown URI prefix code 0x{0:02x}")]
    UnknownUriPrefix(u8),
    #[error("language tag is longer than 63 bytes")]
    LanguageTooLong,
    #[error("invalid media type {0:?}")]
    InvalidMediaType(String),
    #[error("smart poster: {0}")]
    SmartPoster(&'static str),
    #[error("encoded bytes did not decode as a {0} record")]
    WrongType(&'static str),
    #[error("message is too large for a TLV container")]
    PayloadTooLarge,
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, NdefError>;
