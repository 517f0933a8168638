// src/uri.rs
//! URI record type definition ("U").
//!
//! The payload is one prefix code followed by the rest of the URI. Codes
//! index [`PREFIXES`]; encoding picks the first entry in table order that
//! matches, so the order below must not change.

use log::debug;
use serde::Serialize;

use crate::error::{NdefError, Result};
use crate::record::Record;
use crate::types::Rtd;

/// URI identifier codes, NFC Forum URI RTD 1.0.
pub const PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UriRecord {
    pub uri: String,
}

/// Payload for `uri`: prefix code plus whatever the prefix doesn't cover.
pub fn encode_payload(uri: &str) -> Vec<u8> {
    let (code, rest) = PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(code, prefix)| uri.strip_prefix(prefix).map(|rest| (code, rest)))
        .unwrap_or((0, uri));

    let mut payload = Vec::with_capacity(1 + rest.len());
    payload.push(code as u8);
    payload.extend_from_slice(rest.as_bytes());
    payload
}

pub fn decode_payload(payload: &[u8]) -> Result<UriRecord> {
    let (&code, rest) = payload.split_first().ok_or(NdefError::Truncated {
        needed: 1,
        available: 0,
    })?;
    let prefix = PREFIXES
        .get(code as usize)
        .ok_or(NdefError::UnknownUriPrefix(code))?;
    let rest = std::str::from_utf8(rest).map_err(|_| NdefError::InvalidUtf8)?;
    debug!("URI prefix 0x{:02x} {:?}", code, prefix);
    Ok(UriRecord {
        uri: format!("{}{}", prefix, rest),
    })
}

impl Record {
    /// A well-known URI record with the shortest table prefix applied.
    pub fn new_uri(uri: &str) -> Result<Record> {
        Record::new_typed(Rtd::URI_TYPE, &encode_payload(uri), Rtd::Uri, "URI")
    }
}
