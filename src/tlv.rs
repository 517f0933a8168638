// src/tlv.rs
//! TLV framing used to locate NDEF messages in tag memory.
//!
//! A TLV block is a type byte, a 1-byte length (or `0xFF` followed by a
//! 2-byte big-endian length) and that many value bytes. `NULL` blocks have
//! neither length nor value; `TERMINATOR` ends the area.

use log::{debug, warn};

use crate::error::{NdefError, Result};

pub const TLV_NULL: u8 = 0x00;
pub const TLV_LOCK_CONTROL: u8 = 0x01;
pub const TLV_MEMORY_CONTROL: u8 = 0x02;
pub const TLV_NDEF_MESSAGE: u8 = 0x03;
pub const TLV_PROPRIETARY: u8 = 0xFD;
pub const TLV_TERMINATOR: u8 = 0xFE;

const EXTENDED_LENGTH: u8 = 0xFF;
const MAX_EXTENDED_LENGTH: usize = 0xFFFE;

/// One TLV block. The value borrows the scanned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub t: u8,
    pub value: &'a [u8],
}

/// Pulls the next TLV block off the front of `buf`.
///
/// `NULL` blocks are skipped. Returns `None` (after consuming the terminator
/// byte) on `TERMINATOR`, and `None` without consuming anything when the
/// block at the front is malformed or does not fit into `buf`.
pub fn next<'a>(buf: &mut &'a [u8]) -> Option<Tlv<'a>> {
    scan(buf).ok().flatten()
}

/// True if `buf` is a well-formed TLV sequence ending in an explicit terminator.
pub fn check(buf: &[u8]) -> bool {
    let mut rest = buf;
    loop {
        match scan(&mut rest) {
            Ok(Some(_)) => continue,
            Ok(None) => return true,
            Err(_) => return false,
        }
    }
}

/// Iterates the TLV blocks of a buffer.
pub struct TlvIter<'a> {
    rest: &'a [u8],
}

impl<'a> TlvIter<'a> {
    pub fn new(buf: &'a [u8]) -> TlvIter<'a> {
        TlvIter { rest: buf }
    }

    /// The bytes not consumed yet.
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Tlv<'a>;

    fn next(&mut self) -> Option<Tlv<'a>> {
        next(&mut self.rest)
    }
}

/// Values of all `NDEF_MESSAGE` blocks, in encounter order.
pub fn ndef_messages(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    TlvIter::new(buf).filter_map(|tlv| {
        if tlv.t == TLV_NDEF_MESSAGE {
            Some(tlv.value)
        } else {
            debug!("Skipping TLV type 0x{:02x} ({} bytes)", tlv.t, tlv.value.len());
            None
        }
    })
}

// Ok(None) means the terminator was consumed, Err means malformed input
// (an empty buffer counts as malformed since no terminator was seen).
fn scan<'a>(buf: &mut &'a [u8]) -> Result<Option<Tlv<'a>>> {
    loop {
        let data = *buf;
        let Some(&t) = data.first() else {
            return Err(NdefError::Truncated {
                needed: 1,
                available: 0,
            });
        };

        match t {
            TLV_NULL => {
                *buf = &data[1..];
            }
            TLV_TERMINATOR => {
                *buf = &data[1..];
                return Ok(None);
            }
            _ => {
                let (len, header) = match data.get(1) {
                    Some(&EXTENDED_LENGTH) => {
                        if data.len() < 4 {
                            warn!("Truncated extended TLV length");
                            return Err(NdefError::Truncated {
                                needed: 4,
                                available: data.len(),
                            });
                        }
                        (((data[2] as usize) << 8) | data[3] as usize, 4)
                    }
                    Some(&len) => (len as usize, 2),
                    None => {
                        return Err(NdefError::Truncated {
                            needed: 2,
                            available: data.len(),
                        });
                    }
                };

                let total = header + len;
                if total > data.len() {
                    warn!(
                        "TLV 0x{:02x} length {} exceeds remaining {} bytes",
                        t,
                        len,
                        data.len() - header
                    );
                    return Err(NdefError::Truncated {
                        needed: total,
                        available: data.len(),
                    });
                }

                *buf = &data[total..];
                return Ok(Some(Tlv {
                    t,
                    value: &data[header..total],
                }));
            }
        }
    }
}

/// Wraps an NDEF message into an `NDEF_MESSAGE` block followed by a terminator.
pub fn wrap_ndef(message: &[u8]) -> Result<Vec<u8>> {
    let len = message.len();
    if len > MAX_EXTENDED_LENGTH {
        return Err(NdefError::PayloadTooLarge);
    }

    let mut tlv = Vec::with_capacity(len + 5);
    tlv.push(TLV_NDEF_MESSAGE);
    if len < EXTENDED_LENGTH as usize {
        tlv.push(len as u8);
    } else {
        tlv.push(EXTENDED_LENGTH);
        tlv.extend_from_slice(&(len as u16).to_be_bytes());
    }
    tlv.extend_from_slice(message);
    tlv.push(TLV_TERMINATOR);
    Ok(tlv)
}
