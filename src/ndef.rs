// src/ndef.rs
//! NDEF message framing: splitting a buffer into records, dispatching each
//! record to the codec for its type, and building records from typed values.

use std::ops::Range;

use log::{debug, warn};

use crate::error::{NdefError, Result};
use crate::mediatype;
use crate::record::{Record, RecordKind};
use crate::types::{HDR_CF, HDR_IL, HDR_MB, HDR_ME, HDR_SR, Language, RecordFlags, Rtd, Tnf};
use crate::{smartposter, text, tlv, uri};

const MIN_HEADER_LEN: usize = 3;
const MAX_PAYLOAD_LEN: u64 = 0x7FFF_FFFF;

/// One framed record inside a larger buffer. Ranges are relative to `bytes`.
#[derive(Debug, Clone)]
pub(crate) struct RawRecord<'a> {
    pub header: u8,
    pub bytes: &'a [u8],
    pub type_: Range<usize>,
    pub id: Option<Range<usize>>,
    pub payload: Range<usize>,
}

impl<'a> RawRecord<'a> {
    pub fn tnf(&self) -> Tnf {
        Tnf::from_header(self.header)
    }

    pub fn type_bytes(&self) -> &'a [u8] {
        &self.bytes[self.type_.clone()]
    }

    pub fn payload_bytes(&self) -> &'a [u8] {
        &self.bytes[self.payload.clone()]
    }
}

/// Parameters threaded through a (possibly nested) decode.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DecodeContext<'a> {
    /// Used to rank smart poster titles.
    pub language: Option<&'a Language>,
    /// Set while decoding the payload of a smart poster. Smart posters are
    /// not interpreted inside one another.
    pub nested: bool,
}

/// Frames the record at the front of `buf`.
pub(crate) fn frame(buf: &[u8]) -> Result<RawRecord<'_>> {
    if buf.len() < MIN_HEADER_LEN {
        return Err(NdefError::Truncated {
            needed: MIN_HEADER_LEN,
            available: buf.len(),
        });
    }

    // 1. Header and type length
    let header = buf[0];
    let type_len = buf[1] as usize;
    let mut pos = 2;

    // 2. Payload length (1 byte for short records, 4 bytes big-endian otherwise)
    let payload_len = if header & HDR_SR != 0 {
        pos += 1;
        buf[2] as u64
    } else {
        let bytes = buf.get(pos..pos + 4).ok_or(NdefError::Truncated {
            needed: pos + 4,
            available: buf.len(),
        })?;
        pos += 4;
        let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64;
        if len > MAX_PAYLOAD_LEN {
            return Err(NdefError::LengthOverflow(len));
        }
        len
    };

    // 3. ID length, only with IL
    let id_len = if header & HDR_IL != 0 {
        let len = *buf.get(pos).ok_or(NdefError::Truncated {
            needed: pos + 1,
            available: buf.len(),
        })? as usize;
        pos += 1;
        Some(len)
    } else {
        None
    };

    // 4. Everything must fit into what's left
    let total = pos as u64 + type_len as u64 + id_len.unwrap_or(0) as u64 + payload_len;
    if total > buf.len() as u64 {
        return Err(NdefError::Truncated {
            needed: usize::try_from(total).unwrap_or(usize::MAX),
            available: buf.len(),
        });
    }

    let type_ = pos..pos + type_len;
    let id = id_len.map(|len| type_.end..type_.end + len);
    let payload_start = id.as_ref().map_or(type_.end, |id| id.end);
    let payload = payload_start..payload_start + payload_len as usize;

    Ok(RawRecord {
        header,
        bytes: &buf[..payload.end],
        type_,
        id,
        payload,
    })
}

/// Decodes zero or more concatenated NDEF records.
///
/// An empty buffer is a message holding one empty record. Parsing stops at
/// the first record that can't be framed; the records before it are kept.
/// Returns `None` when not a single record could be decoded.
pub fn decode(bytes: &[u8]) -> Option<Record> {
    decode_with_language(bytes, None)
}

/// Same as [`decode`], ranking smart poster titles against `language`.
pub fn decode_with_language(bytes: &[u8], language: Option<&Language>) -> Option<Record> {
    let ctx = DecodeContext {
        language,
        nested: false,
    };
    decode_in(bytes, ctx)
}

pub(crate) fn decode_in(bytes: &[u8], ctx: DecodeContext<'_>) -> Option<Record> {
    if bytes.is_empty() {
        return Some(Record::empty());
    }
    Record::from_records(parse(bytes, ctx))
}

/// Decodes every `NDEF_MESSAGE` block of a TLV area into one chain.
pub fn decode_tlv(tlv_bytes: &[u8]) -> Option<Record> {
    decode_tlv_with_language(tlv_bytes, None)
}

pub fn decode_tlv_with_language(tlv_bytes: &[u8], language: Option<&Language>) -> Option<Record> {
    let mut records = Vec::new();
    for message in tlv::ndef_messages(tlv_bytes) {
        if let Some(chain) = decode_with_language(message, language) {
            records.extend(chain.into_records());
        }
    }
    Record::from_records(records)
}

fn parse(bytes: &[u8], ctx: DecodeContext<'_>) -> Vec<Record> {
    let mut records = Vec::new();
    let mut rest = bytes;

    while !rest.is_empty() {
        let raw = match frame(rest) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Dropping {} trailing bytes of NDEF data: {}", rest.len(), e);
                break;
            }
        };
        rest = &rest[raw.bytes.len()..];

        if raw.header & HDR_CF != 0 {
            warn!("Chunked records are not supported, skipping");
            continue;
        }
        records.push(dispatch(&raw, ctx));
    }

    records
}

/// Turns a framed record into a specialized record, or a generic one when
/// the type is unknown or its payload doesn't parse.
pub(crate) fn dispatch(raw: &RawRecord<'_>, ctx: DecodeContext<'_>) -> Record {
    if raw.tnf() == Tnf::WellKnown {
        let payload = raw.payload_bytes();
        let rtd = Rtd::from_type(raw.type_bytes());
        let kind = match rtd {
            Rtd::Uri => uri::decode_payload(payload).map(RecordKind::Uri),
            Rtd::Text => text::decode_payload(payload).map(RecordKind::Text),
            Rtd::SmartPoster if !ctx.nested => {
                smartposter::decode_payload(payload, ctx).map(RecordKind::SmartPoster)
            }
            Rtd::SmartPoster | Rtd::Unknown => Ok(RecordKind::Generic),
        };
        match kind {
            Ok(RecordKind::Generic) => {}
            Ok(kind) => return Record::from_raw(raw, rtd, kind),
            Err(e) => debug!("Treating {:?} record as generic: {}", rtd, e),
        }
    }
    Record::from_raw(raw, Rtd::Unknown, RecordKind::Generic)
}

/// Builds the wire bytes of a single record.
pub(crate) fn encode_record(
    tnf: Tnf,
    flags: RecordFlags,
    type_: &[u8],
    id: Option<&[u8]>,
    payload: &[u8],
) -> Result<Vec<u8>> {
    if type_.len() > u8::MAX as usize {
        return Err(NdefError::TypeTooLong);
    }
    if id.is_some_and(|id| id.len() > u8::MAX as usize) {
        return Err(NdefError::IdTooLong);
    }
    if payload.len() as u64 > MAX_PAYLOAD_LEN {
        return Err(NdefError::LengthOverflow(payload.len() as u64));
    }

    // Short record form whenever the payload length fits into one byte
    let short = payload.len() <= u8::MAX as usize;
    let mut header = tnf.bits() | flags.header_bits();
    if short {
        header |= HDR_SR;
    }
    if id.is_some() {
        header |= HDR_IL;
    }

    let id_len = id.map_or(0, <[u8]>::len);
    let mut record = Vec::with_capacity(7 + type_.len() + id_len + payload.len());
    record.push(header);
    record.push(type_.len() as u8);
    if short {
        record.push(payload.len() as u8);
    } else {
        record.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    }
    if let Some(id) = id {
        record.push(id.len() as u8);
    }
    record.extend_from_slice(type_);
    record.extend_from_slice(id.unwrap_or_default());
    record.extend_from_slice(payload);
    Ok(record)
}

/// Concatenates records into one message, MB on the first and ME on the
/// last whatever the individual headers said. Empty records carry no bytes.
pub fn encode_message<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<u8> {
    let records: Vec<&Record> = records.into_iter().filter(|rec| !rec.raw().is_empty()).collect();
    let mut message = Vec::with_capacity(records.iter().map(|rec| rec.raw().len()).sum());
    for (i, rec) in records.iter().enumerate() {
        let start = message.len();
        message.extend_from_slice(rec.raw());
        message[start] &= !(HDR_MB | HDR_ME);
        if i == 0 {
            message[start] |= HDR_MB;
        }
        if i == records.len() - 1 {
            message[start] |= HDR_ME;
        }
    }
    message
}

impl Record {
    /// Builds a record from its parts and runs it through type dispatch,
    /// so a well-known `U`, `T` or `Sp` record comes back specialized.
    /// IL is set whenever `id` is present, even if it is empty.
    pub fn new(tnf: Tnf, type_: &[u8], id: Option<&[u8]>, payload: &[u8]) -> Result<Record> {
        let bytes = encode_record(tnf, RecordFlags::FIRST | RecordFlags::LAST, type_, id, payload)?;
        let raw = frame(&bytes)?;
        Ok(dispatch(&raw, DecodeContext::default()))
    }

    /// An empty `id` means no id field.
    pub fn new_well_known(type_: &[u8], id: &[u8], payload: &[u8]) -> Result<Record> {
        Record::new(Tnf::WellKnown, type_, Some(id).filter(|id| !id.is_empty()), payload)
    }

    /// A media-type record, e.g. a smart poster icon. Wildcards are rejected.
    pub fn new_mediatype(media_type: &str, payload: &[u8]) -> Result<Record> {
        if !mediatype::is_valid(media_type, false) {
            return Err(NdefError::InvalidMediaType(media_type.to_string()));
        }
        let bytes = encode_record(
            Tnf::MediaType,
            RecordFlags::FIRST | RecordFlags::LAST,
            media_type.as_bytes(),
            None,
            payload,
        )?;
        let raw = frame(&bytes)?;
        Ok(Record::from_raw(&raw, Rtd::Unknown, RecordKind::Generic))
    }

    // Builds a well-known record that must come back as `rtd`.
    pub(crate) fn new_typed(type_: &[u8], payload: &[u8], rtd: Rtd, name: &'static str) -> Result<Record> {
        let rec = Record::new_well_known(type_, &[], payload)?;
        if rec.rtd() != rtd {
            return Err(NdefError::WrongType(name));
        }
        Ok(rec)
    }
}
