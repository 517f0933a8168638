//! NDEF record codec and TLV framing for the NFC daemon.
//!
//! Decoding turns bytes read from a tag (or received from a peer) into a
//! chain of typed [`Record`]s; encoding builds records from typed values and
//! exposes their wire bytes ready to be written or sent.
//!
//! ```
//! let bytes = hex::decode("D1010A55026A6F6C6C612E636F6D").unwrap();
//! let rec = nfc_ndef::decode(&bytes).unwrap();
//! assert_eq!(rec.uri().unwrap().uri, "https://www.jolla.com");
//! ```

pub mod error;
pub mod mediatype;
pub mod ndef;
pub mod record;
pub mod smartposter;
pub mod text;
pub mod tlv;
pub mod types;
pub mod uri;

pub use error::{NdefError, Result};
pub use ndef::{decode, decode_tlv, decode_tlv_with_language, decode_with_language, encode_message};
pub use record::{Record, RecordIter, RecordKind};
pub use smartposter::{SmartPosterContent, SmartPosterRecord};
pub use text::TextRecord;
pub use types::{Action, Language, LanguageMatch, RecordFlags, Rtd, TextEncoding, Tnf};
pub use uri::UriRecord;
