// src/text.rs
//! Text record type definition ("T").
//!
//! Payload layout: status byte (bit 7 = UTF-16, bits 5-0 = language length),
//! the language tag, then the text. UTF-16 text may start with a byte order
//! mark; without one it is big-endian.

use serde::Serialize;

use crate::error::{NdefError, Result};
use crate::record::Record;
use crate::types::{Language, LanguageMatch, Rtd, TextEncoding};

const STATUS_UTF16: u8 = 0x80;
const STATUS_LANG_LEN_MASK: u8 = 0x3F;
const MAX_LANG_LEN: usize = STATUS_LANG_LEN_MASK as usize;

const BOM_BE: [u8; 2] = [0xFE, 0xFF];
const BOM_LE: [u8; 2] = [0xFF, 0xFE];

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRecord {
    pub lang: String,
    pub text: String,
    pub encoding: TextEncoding,
}

impl TextRecord {
    /// Compares the record language with `target`, ignoring case.
    pub fn lang_match(&self, target: &Language) -> LanguageMatch {
        let Some(lang) = Language::parse(&self.lang) else {
            return LanguageMatch::None;
        };
        if !lang.language.eq_ignore_ascii_case(&target.language) {
            return LanguageMatch::None;
        }
        match (&lang.territory, &target.territory) {
            (Some(ours), Some(theirs)) if ours.eq_ignore_ascii_case(theirs) => {
                LanguageMatch::LanguageTerritory
            }
            _ => LanguageMatch::Language,
        }
    }
}

/// Language tag used when the caller doesn't name one.
pub fn default_language(current: Option<&Language>) -> String {
    current.map_or_else(|| DEFAULT_LANGUAGE.to_string(), Language::tag)
}

pub fn encode_payload(text: &str, lang: &str, encoding: TextEncoding) -> Result<Vec<u8>> {
    if lang.len() > MAX_LANG_LEN {
        return Err(NdefError::LanguageTooLong);
    }

    let mut status = lang.len() as u8;
    if encoding != TextEncoding::Utf8 {
        status |= STATUS_UTF16;
    }

    let mut payload = Vec::with_capacity(1 + lang.len() + 2 * text.len() + 2);
    payload.push(status);
    payload.extend_from_slice(lang.as_bytes());
    match encoding {
        TextEncoding::Utf8 => payload.extend_from_slice(text.as_bytes()),
        TextEncoding::Utf16Be => {
            for unit in text.encode_utf16() {
                payload.extend_from_slice(&unit.to_be_bytes());
            }
        }
        TextEncoding::Utf16Le => {
            // No BOM means big-endian, so little-endian text always gets one
            payload.extend_from_slice(&BOM_LE);
            for unit in text.encode_utf16() {
                payload.extend_from_slice(&unit.to_le_bytes());
            }
        }
    }
    Ok(payload)
}

pub fn decode_payload(payload: &[u8]) -> Result<TextRecord> {
    let (&status, rest) = payload.split_first().ok_or(NdefError::Truncated {
        needed: 1,
        available: 0,
    })?;

    let lang_len = (status & STATUS_LANG_LEN_MASK) as usize;
    if lang_len >= payload.len() {
        return Err(NdefError::Truncated {
            needed: lang_len + 1,
            available: payload.len(),
        });
    }
    let (lang, body) = rest.split_at(lang_len);
    let lang = std::str::from_utf8(lang).map_err(|_| NdefError::InvalidUtf8)?;

    let (text, encoding) = if status & STATUS_UTF16 != 0 {
        decode_utf16(body)?
    } else {
        let text = std::str::from_utf8(body).map_err(|_| NdefError::InvalidUtf8)?;
        (text.to_string(), TextEncoding::Utf8)
    };

    Ok(TextRecord {
        lang: lang.to_string(),
        text,
        encoding,
    })
}

fn decode_utf16(body: &[u8]) -> Result<(String, TextEncoding)> {
    let (body, encoding) = match body.get(..2) {
        Some(bom) if bom == BOM_LE => (&body[2..], TextEncoding::Utf16Le),
        Some(bom) if bom == BOM_BE => (&body[2..], TextEncoding::Utf16Be),
        _ => (body, TextEncoding::Utf16Be),
    };
    if body.len() % 2 != 0 {
        return Err(NdefError::InvalidUtf16);
    }

    let units = body.chunks_exact(2).map(|pair| match encoding {
        TextEncoding::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
        _ => u16::from_be_bytes([pair[0], pair[1]]),
    });
    let text = char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|_| NdefError::InvalidUtf16)?;
    Ok((text, encoding))
}

impl Record {
    pub fn new_text(text: &str, lang: &str, encoding: TextEncoding) -> Result<Record> {
        let payload = encode_payload(text, lang, encoding)?;
        Record::new_typed(Rtd::TEXT_TYPE, &payload, Rtd::Text, "text")
    }

    /// Like [`Record::new_text`], filling in an empty text and the current
    /// (or else the default) language.
    pub fn new_text_or_default(
        text: Option<&str>,
        lang: Option<&str>,
        encoding: TextEncoding,
        current: Option<&Language>,
    ) -> Result<Record> {
        let lang = match lang {
            Some(lang) => lang.to_string(),
            None => default_language(current),
        };
        Record::new_text(text.unwrap_or_default(), &lang, encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndef;

    fn bytes(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn utf8() {
        let rec = decode_payload(&bytes("02656E48656C6C6F")).unwrap();
        assert_eq!(rec.lang, "en");
        assert_eq!(rec.text, "Hello");
        assert_eq!(rec.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn utf16_variants_agree() {
        let be = decode_payload(&bytes("82656E00480069")).unwrap();
        let be_bom = decode_payload(&bytes("82656EFEFF00480069")).unwrap();
        let le_bom = decode_payload(&bytes("82656EFFFE48006900")).unwrap();
        for rec in [&be, &be_bom, &le_bom] {
            assert_eq!(rec.lang, "en");
            assert_eq!(rec.text, "Hi");
        }
        assert_eq!(be.encoding, TextEncoding::Utf16Be);
        assert_eq!(be_bom.encoding, TextEncoding::Utf16Be);
        assert_eq!(le_bom.encoding, TextEncoding::Utf16Le);
    }

    #[test]
    fn encode_byte_layout() {
        assert_eq!(encode_payload("Hi", "en", TextEncoding::Utf8).unwrap(), bytes("02656E4869"));
        assert_eq!(encode_payload("Hi", "en", TextEncoding::Utf16Be).unwrap(), bytes("82656E00480069"));
        assert_eq!(encode_payload("Hi", "en", TextEncoding::Utf16Le).unwrap(), bytes("82656EFFFE48006900"));
        assert!(matches!(
            encode_payload("x", &"a".repeat(64), TextEncoding::Utf8),
            Err(NdefError::LanguageTooLong)
        ));
    }

    #[test]
    fn empty_parts() {
        let rec = decode_payload(&[0x00]).unwrap();
        assert_eq!(rec.lang, "");
        assert_eq!(rec.text, "");

        let rec = decode_payload(&bytes("02656E")).unwrap();
        assert_eq!(rec.text, "");

        let rec = decode_payload(&bytes("82656E")).unwrap();
        assert_eq!(rec.text, "");
        assert_eq!(rec.encoding, TextEncoding::Utf16Be);
    }

    #[test]
    fn malformed_payloads() {
        assert!(decode_payload(&[]).is_err());
        // language length >= payload size
        assert!(decode_payload(&bytes("03656E")).is_err());
        assert!(decode_payload(&bytes("3F")).is_err());
        // invalid UTF-8 text and language
        assert!(matches!(decode_payload(&bytes("02656EC328")), Err(NdefError::InvalidUtf8)));
        assert!(matches!(decode_payload(&bytes("02FF6E41")), Err(NdefError::InvalidUtf8)));
        // truncated UTF-16 after a BOM
        assert!(matches!(decode_payload(&bytes("82656EFFFE480069")), Err(NdefError::InvalidUtf16)));
        // unpaired surrogate
        assert!(matches!(decode_payload(&bytes("80D800")), Err(NdefError::InvalidUtf16)));
    }

    #[test]
    fn record_round_trip_all_encodings() {
        for encoding in [TextEncoding::Utf8, TextEncoding::Utf16Be, TextEncoding::Utf16Le] {
            let rec = Record::new_text("Привет, мир", "ru-RU", encoding).unwrap();
            let decoded = ndef::decode(rec.raw()).unwrap();
            let text = decoded.text().unwrap();
            assert_eq!(text.text, "Привет, мир");
            assert_eq!(text.lang, "ru-RU");
            assert_eq!(text.encoding, encoding);

            let again = Record::new_text(&text.text, &text.lang, text.encoding).unwrap();
            assert_eq!(again.raw(), decoded.raw());
        }
    }

    #[test]
    fn broken_text_record_is_generic() {
        let rec = ndef::decode(&bytes("D10102540365")).unwrap();
        assert_eq!(rec.rtd(), Rtd::Unknown);
        assert!(rec.text().is_none());
    }

    #[test]
    fn defaults() {
        let rec = Record::new_text_or_default(None, None, TextEncoding::Utf8, None).unwrap();
        let text = rec.text().unwrap();
        assert_eq!(text.lang, "en");
        assert_eq!(text.text, "");

        let fi = Language::new("fi", Some("FI"));
        let rec = Record::new_text_or_default(Some("Moi"), None, TextEncoding::Utf8, Some(&fi)).unwrap();
        assert_eq!(rec.text().unwrap().lang, "fi-FI");

        let rec = Record::new_text_or_default(Some("Hi"), Some("de"), TextEncoding::Utf8, Some(&fi)).unwrap();
        assert_eq!(rec.text().unwrap().lang, "de");
    }

    #[test]
    fn language_matching() {
        let rec = |lang: &str| TextRecord {
            lang: lang.to_string(),
            text: String::new(),
            encoding: TextEncoding::Utf8,
        };
        let ru_ru = Language::new("ru", Some("RU"));
        let ru = Language::new("ru", None);

        assert_eq!(rec("ru-RU").lang_match(&ru_ru), LanguageMatch::LanguageTerritory);
        assert_eq!(rec("RU-ru").lang_match(&ru_ru), LanguageMatch::LanguageTerritory);
        assert_eq!(rec("ru_RU").lang_match(&ru_ru), LanguageMatch::LanguageTerritory);
        assert_eq!(rec("ru").lang_match(&ru_ru), LanguageMatch::Language);
        assert_eq!(rec("ru-UA").lang_match(&ru_ru), LanguageMatch::Language);
        assert_eq!(rec("ru-RU").lang_match(&ru), LanguageMatch::Language);
        assert_eq!(rec("en").lang_match(&ru_ru), LanguageMatch::None);
        assert_eq!(rec("").lang_match(&ru_ru), LanguageMatch::None);
    }
}
