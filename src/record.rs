// src/record.rs
//! Decoded NDEF records and the chains they form.
//!
//! A [`Record`] owns exactly one buffer, a copy of its wire bytes. Type, id
//! and payload are ranges into that buffer. Records link into a chain through
//! an owned `next` pointer; wrap the head in an `Arc` to share a decoded
//! chain between subsystems.

use std::fmt;
use std::ops::Range;

use crate::ndef::{self, RawRecord};
use crate::smartposter::SmartPosterRecord;
use crate::text::TextRecord;
use crate::types::{Rtd, RecordFlags, Tnf};
use crate::uri::UriRecord;

/// What a record turned out to be after type dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    Generic,
    Uri(UriRecord),
    Text(TextRecord),
    SmartPoster(SmartPosterRecord),
}

pub struct Record {
    tnf: Tnf,
    rtd: Rtd,
    flags: RecordFlags,
    raw: Vec<u8>,
    type_span: Range<usize>,
    id_span: Option<Range<usize>>,
    payload_span: Range<usize>,
    kind: RecordKind,
    next: Option<Box<Record>>,
}

impl Record {
    /// The record produced for a zero-length NDEF message.
    pub fn empty() -> Record {
        Record {
            tnf: Tnf::Empty,
            rtd: Rtd::Unknown,
            flags: RecordFlags::empty(),
            raw: Vec::new(),
            type_span: 0..0,
            id_span: None,
            payload_span: 0..0,
            kind: RecordKind::Generic,
            next: None,
        }
    }

    // Copies the framed bytes once; the spans are already relative to them.
    pub(crate) fn from_raw(raw: &RawRecord<'_>, rtd: Rtd, kind: RecordKind) -> Record {
        Record {
            tnf: raw.tnf(),
            rtd,
            flags: RecordFlags::from_header(raw.header),
            raw: raw.bytes.to_vec(),
            type_span: raw.type_.clone(),
            id_span: raw.id.clone(),
            payload_span: raw.payload.clone(),
            kind,
            next: None,
        }
    }

    /// Links records into a chain, preserving their order. Header bytes are left untouched.
    pub fn from_records(records: Vec<Record>) -> Option<Record> {
        let mut head: Option<Record> = None;
        for mut rec in records.into_iter().rev() {
            rec.next = head.map(Box::new);
            head = Some(rec);
        }
        head
    }

    /// Breaks the chain up into individually owned records.
    pub fn into_records(self) -> Vec<Record> {
        let mut out = Vec::new();
        let mut cur = Some(self);
        while let Some(mut rec) = cur {
            cur = rec.take_next();
            out.push(rec);
        }
        out
    }

    pub fn tnf(&self) -> Tnf {
        self.tnf
    }

    pub fn rtd(&self) -> Rtd {
        self.rtd
    }

    pub fn flags(&self) -> RecordFlags {
        self.flags
    }

    /// The complete wire bytes of this record alone.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn type_bytes(&self) -> &[u8] {
        &self.raw[self.type_span.clone()]
    }

    /// The id field, present only when the IL header bit is set.
    pub fn id(&self) -> Option<&[u8]> {
        self.id_span.clone().map(|span| &self.raw[span])
    }

    pub fn payload(&self) -> &[u8] {
        &self.raw[self.payload_span.clone()]
    }

    pub fn kind(&self) -> &RecordKind {
        &self.kind
    }

    pub fn uri(&self) -> Option<&UriRecord> {
        match &self.kind {
            RecordKind::Uri(uri) => Some(uri),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&TextRecord> {
        match &self.kind {
            RecordKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn smart_poster(&self) -> Option<&SmartPosterRecord> {
        match &self.kind {
            RecordKind::SmartPoster(sp) => Some(sp),
            _ => None,
        }
    }

    /// True for a well-known record whose type field equals `type_`.
    pub fn is_well_known(&self, type_: &[u8]) -> bool {
        self.tnf == Tnf::WellKnown && self.type_bytes() == type_
    }

    pub fn next(&self) -> Option<&Record> {
        self.next.as_deref()
    }

    pub fn take_next(&mut self) -> Option<Record> {
        self.next.take().map(|rec| *rec)
    }

    /// Appends `rec` (and whatever follows it) at the end of this chain.
    pub fn append(&mut self, rec: Record) {
        let mut tail = &mut self.next;
        while let Some(node) = tail {
            tail = &mut node.next;
        }
        *tail = Some(Box::new(rec));
    }

    pub fn iter(&self) -> RecordIter<'_> {
        RecordIter { next: Some(self) }
    }

    /// Number of records in the chain starting here.
    pub fn chain_len(&self) -> usize {
        self.iter().count()
    }

    /// A copy of this record alone, without the rest of the chain.
    pub fn detached(&self) -> Record {
        Record {
            tnf: self.tnf,
            rtd: self.rtd,
            flags: self.flags,
            raw: self.raw.clone(),
            type_span: self.type_span.clone(),
            id_span: self.id_span.clone(),
            payload_span: self.payload_span.clone(),
            kind: self.kind.clone(),
            next: None,
        }
    }

    // Everything but the link to the next record.
    fn same_node(&self, other: &Record) -> bool {
        self.tnf == other.tnf
            && self.rtd == other.rtd
            && self.flags == other.flags
            && self.raw == other.raw
            && self.type_span == other.type_span
            && self.id_span == other.id_span
            && self.payload_span == other.payload_span
            && self.kind == other.kind
    }

    // Only called on records nobody else can see yet.
    pub(crate) fn clear_flags(&mut self, flags: RecordFlags) {
        self.flags.remove(flags);
        if let Some(header) = self.raw.first_mut() {
            *header &= !flags.header_bits();
        }
    }

    /// Serializes the chain as one NDEF message, see [`ndef::encode_message`].
    pub fn to_message_bytes(&self) -> Vec<u8> {
        ndef::encode_message(self)
    }
}

// Unlinks the chain iteratively so long chains don't recurse on drop.
impl Drop for Record {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut rec) = next {
            next = rec.next.take();
        }
    }
}

// Clone, PartialEq and Debug walk the chain instead of recursing through
// `next`, a single tag can hold tens of thousands of records.
impl Clone for Record {
    fn clone(&self) -> Record {
        let mut head = self.detached();
        let tail: Vec<Record> = self.iter().skip(1).map(Record::detached).collect();
        head.next = Record::from_records(tail).map(Box::new);
        head
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Record) -> bool {
        let mut a = self.iter();
        let mut b = other.iter();
        loop {
            match (a.next(), b.next()) {
                (Some(x), Some(y)) if x.same_node(y) => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("tnf", &self.tnf)
            .field("rtd", &self.rtd)
            .field("flags", &self.flags)
            .field("type", &String::from_utf8_lossy(self.type_bytes()))
            .field("id", &self.id().map(hex::encode_upper))
            .field("payload", &hex::encode_upper(self.payload()))
            .field("kind", &self.kind)
            .field("following", &self.next().map_or(0, Record::chain_len))
            .finish()
    }
}

pub struct RecordIter<'a> {
    next: Option<&'a Record>,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<&'a Record> {
        let rec = self.next?;
        self.next = rec.next.as_deref();
        Some(rec)
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Record;
    type IntoIter = RecordIter<'a>;

    fn into_iter(self) -> RecordIter<'a> {
        self.iter()
    }
}
