// src/smartposter.rs
//! Smart poster record type definition ("Sp").
//!
//! The payload is itself an NDEF message: exactly one URI record, plus
//! optional title (Text) records, action ("act"), size ("s"), type ("t")
//! and an icon (media-type record).

use log::{debug, warn};

use crate::error::{NdefError, Result};
use crate::mediatype;
use crate::ndef::{self, DecodeContext};
use crate::record::{Record, RecordKind};
use crate::text::TextRecord;
use crate::types::{Action, Language, RecordFlags, Rtd, TextEncoding, Tnf};

pub const ACTION_TYPE: &[u8] = b"act";
pub const SIZE_TYPE: &[u8] = b"s";
pub const TYPE_TYPE: &[u8] = b"t";

const ICON_TYPES: [&str; 2] = ["image", "video"];

/// A decoded smart poster. All values are detached copies; nothing borrows
/// the nested message they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartPosterRecord {
    pub uri: String,
    pub title: Option<String>,
    pub lang: Option<String>,
    pub media_type: Option<String>,
    pub size: Option<u32>,
    pub action: Action,
    pub icon: Option<Box<Record>>,
}

/// Input for [`Record::new_smart_poster`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartPosterContent<'a> {
    pub uri: &'a str,
    pub title: Option<&'a str>,
    /// Title language. When absent the title is tagged with `current`,
    /// else "en".
    pub lang: Option<&'a str>,
    /// The caller's display language.
    pub current: Option<&'a Language>,
    pub media_type: Option<&'a str>,
    pub size: Option<u32>,
    pub action: Action,
    pub icon: Option<&'a Record>,
}

pub(crate) fn decode_payload(payload: &[u8], ctx: DecodeContext<'_>) -> Result<SmartPosterRecord> {
    let nested = DecodeContext {
        nested: true,
        ..ctx
    };
    let chain = ndef::decode_in(payload, nested).ok_or(NdefError::SmartPoster("no records"))?;

    let mut uri = None;
    let mut titles: Vec<&TextRecord> = Vec::new();
    let mut act: Option<&Record> = None;
    let mut size: Option<&Record> = None;
    let mut type_: Option<&Record> = None;
    let mut icon: Option<&Record> = None;

    for rec in chain.iter() {
        match rec.kind() {
            RecordKind::Uri(u) => {
                if uri.is_some() {
                    return Err(NdefError::SmartPoster("more than one URI record"));
                }
                uri = Some(u);
            }
            RecordKind::Text(t) => titles.push(t),
            _ if rec.is_well_known(ACTION_TYPE) && rec.payload().len() == 1 => {
                act.get_or_insert(rec);
            }
            _ if rec.is_well_known(SIZE_TYPE) && rec.payload().len() == 4 => {
                size.get_or_insert(rec);
            }
            _ if rec.is_well_known(TYPE_TYPE) => {
                type_.get_or_insert(rec);
            }
            _ if icon.is_none() && is_icon(rec) => icon = Some(rec),
            _ => debug!(
                "Ignoring smart poster sub-record {:?} {:?}",
                rec.tnf(),
                String::from_utf8_lossy(rec.type_bytes())
            ),
        }
    }

    let uri = uri.ok_or(NdefError::SmartPoster("missing URI record"))?;
    let title = pick_title(&titles, ctx.language);

    let action = match act.map(|rec| rec.payload()[0]) {
        Some(code) => Action::from_code(code).unwrap_or_else(|| {
            warn!("Unsupported smart poster action {}", code);
            Action::Default
        }),
        None => Action::Default,
    };

    let size = size.map(|rec| {
        let p = rec.payload();
        u32::from_be_bytes([p[0], p[1], p[2], p[3]])
    });

    let media_type = type_.and_then(|rec| match std::str::from_utf8(rec.payload()) {
        Ok(t) if mediatype::is_valid(t, false) => Some(t.to_string()),
        _ => {
            warn!("Invalid smart poster type {:?}", String::from_utf8_lossy(rec.payload()));
            None
        }
    });

    Ok(SmartPosterRecord {
        uri: uri.uri.clone(),
        title: title.map(|t| t.text.clone()),
        lang: title.map(|t| t.lang.clone()),
        media_type,
        size,
        action,
        icon: icon.map(|rec| Box::new(rec.detached())),
    })
}

fn is_icon(rec: &Record) -> bool {
    if rec.tnf() != Tnf::MediaType || rec.payload().is_empty() {
        return false;
    }
    std::str::from_utf8(rec.type_bytes())
        .is_ok_and(|t| ICON_TYPES.iter().any(|icon_type| mediatype::has_type(t, icon_type)))
}

// Best language match wins, ties go to the first one seen.
fn pick_title<'a>(titles: &[&'a TextRecord], language: Option<&Language>) -> Option<&'a TextRecord> {
    let (&first, rest) = titles.split_first()?;
    let Some(language) = language else {
        return Some(first);
    };

    let mut best = first;
    let mut best_match = first.lang_match(language);
    for &title in rest {
        let m = title.lang_match(language);
        if m > best_match {
            best = title;
            best_match = m;
        }
    }
    Some(best)
}

// Links a freshly built sub-record after the current tail so that only the
// first record keeps MB and only the last keeps ME.
fn push_part(parts: &mut Vec<Record>, mut rec: Record) {
    if let Some(tail) = parts.last_mut() {
        tail.clear_flags(RecordFlags::LAST);
        rec.clear_flags(RecordFlags::FIRST);
    }
    parts.push(rec);
}

impl Record {
    pub fn new_smart_poster(content: &SmartPosterContent<'_>) -> Result<Record> {
        let mut parts = Vec::new();

        push_part(&mut parts, Record::new_uri(content.uri)?);
        if let Some(title) = content.title {
            let rec = Record::new_text_or_default(Some(title), content.lang, TextEncoding::Utf8, content.current)?;
            push_part(&mut parts, rec);
        }
        if let Some(code) = content.action.code() {
            push_part(&mut parts, Record::new_well_known(ACTION_TYPE, &[], &[code])?);
        }
        if let Some(size) = content.size {
            push_part(&mut parts, Record::new_well_known(SIZE_TYPE, &[], &size.to_be_bytes())?);
        }
        if let Some(media_type) = content.media_type {
            if !mediatype::is_valid(media_type, false) {
                return Err(NdefError::InvalidMediaType(media_type.to_string()));
            }
            push_part(&mut parts, Record::new_well_known(TYPE_TYPE, &[], media_type.as_bytes())?);
        }
        if let Some(icon) = content.icon {
            // Rebuilt so it starts out with its own MB/ME like every other part
            let rec = Record::new(icon.tnf(), icon.type_bytes(), icon.id(), icon.payload())?;
            push_part(&mut parts, rec);
        }

        let payload: Vec<u8> = parts.iter().flat_map(|rec| rec.raw().iter().copied()).collect();
        Record::new_typed(Rtd::SMART_POSTER_TYPE, &payload, Rtd::SmartPoster, "smart poster")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndef::{decode, decode_with_language, encode_message};

    fn poster(parts: &[Record]) -> Vec<u8> {
        let payload = encode_message(parts);
        Record::new_well_known(b"Sp", b"", &payload).unwrap().raw().to_vec()
    }

    fn title(text: &str, lang: &str) -> Record {
        Record::new_text(text, lang, TextEncoding::Utf8).unwrap()
    }

    #[test]
    fn uri_only() {
        let rec = Record::new_smart_poster(&SmartPosterContent {
            uri: "https://www.jolla.com",
            ..Default::default()
        })
        .unwrap();
        // Sp wrapping a single MB|ME URI record.
        assert_eq!(
            rec.raw(),
            &hex::decode("D1020E5370D1010A55026A6F6C6C612E636F6D").unwrap()[..]
        );
        let sp = rec.smart_poster().unwrap();
        assert_eq!(sp.uri, "https://www.jolla.com");
        assert_eq!(sp.title, None);
        assert_eq!(sp.action, Action::Default);
        assert_eq!(sp.size, None);
        assert!(sp.icon.is_none());
    }

    #[test]
    fn full_round_trip() {
        let icon = Record::new_mediatype("image/png", &[0x89, 0x50, 0x4E, 0x47]).unwrap();
        let content = SmartPosterContent {
            uri: "https://www.jolla.com",
            title: Some("Jolla"),
            lang: Some("en"),
            current: None,
            media_type: Some("text/html"),
            size: Some(1234),
            action: Action::Save,
            icon: Some(&icon),
        };
        let rec = Record::new_smart_poster(&content).unwrap();
        assert_eq!(rec.rtd(), Rtd::SmartPoster);

        let decoded = decode(rec.raw()).unwrap();
        let sp = decoded.smart_poster().unwrap();
        assert_eq!(sp.uri, "https://www.jolla.com");
        assert_eq!(sp.title.as_deref(), Some("Jolla"));
        assert_eq!(sp.lang.as_deref(), Some("en"));
        assert_eq!(sp.media_type.as_deref(), Some("text/html"));
        assert_eq!(sp.size, Some(1234));
        assert_eq!(sp.action, Action::Save);
        let decoded_icon = sp.icon.as_deref().unwrap();
        assert_eq!(decoded_icon.type_bytes(), b"image/png");
        assert_eq!(decoded_icon.payload(), icon.payload());
        assert!(decoded_icon.next().is_none());

        let again = Record::new_smart_poster(&SmartPosterContent {
            uri: &sp.uri,
            title: sp.title.as_deref(),
            lang: sp.lang.as_deref(),
            current: None,
            media_type: sp.media_type.as_deref(),
            size: sp.size,
            action: sp.action,
            icon: sp.icon.as_deref(),
        })
        .unwrap();
        assert_eq!(again.raw(), decoded.raw());
    }

    #[test]
    fn sub_record_flags() {
        let rec = Record::new_smart_poster(&SmartPosterContent {
            uri: "tel:+358",
            title: Some("Call"),
            action: Action::Open,
            ..Default::default()
        })
        .unwrap();
        let parts = decode(rec.payload()).unwrap();
        let flags: Vec<RecordFlags> = parts.iter().map(|r| r.flags()).collect();
        assert_eq!(flags.len(), 3);
        assert_eq!(flags[0], RecordFlags::FIRST);
        assert_eq!(flags[1], RecordFlags::empty());
        assert_eq!(flags[2], RecordFlags::LAST);
    }

    #[test]
    fn default_title_language() {
        let rec = Record::new_smart_poster(&SmartPosterContent {
            uri: "https://a",
            title: Some("A"),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(rec.smart_poster().unwrap().lang.as_deref(), Some("en"));

        let finnish = Language::new("fi", Some("FI"));
        let rec = Record::new_smart_poster(&SmartPosterContent {
            uri: "https://a",
            title: Some("A"),
            current: Some(&finnish),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(rec.smart_poster().unwrap().lang.as_deref(), Some("fi-FI"));

        // An explicit language beats the display language.
        let rec = Record::new_smart_poster(&SmartPosterContent {
            uri: "https://a",
            title: Some("A"),
            lang: Some("de"),
            current: Some(&finnish),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(rec.smart_poster().unwrap().lang.as_deref(), Some("de"));
    }

    #[test]
    fn two_uris_fail() {
        let uri = Record::new_uri("https://a").unwrap();
        let other = Record::new_uri("https://b").unwrap();
        let rec = decode(&poster(&[uri, title("x", "en"), other])).unwrap();
        assert_eq!(rec.rtd(), Rtd::Unknown);
        assert!(rec.smart_poster().is_none());
        assert_eq!(rec.type_bytes(), b"Sp");
    }

    #[test]
    fn missing_uri_fails() {
        let rec = decode(&poster(&[title("x", "en")])).unwrap();
        assert!(rec.smart_poster().is_none());

        // Empty payload decodes to an empty record, no URI either.
        let rec = decode(&poster(&[])).unwrap();
        assert!(rec.smart_poster().is_none());
    }

    #[test]
    fn title_follows_language() {
        let uri = || Record::new_uri("https://a").unwrap();
        let bytes = poster(&[uri(), title("Hello", "en"), title("Привет", "ru_RU")]);
        let ru = Language::new("ru", Some("RU"));

        let rec = decode_with_language(&bytes, Some(&ru)).unwrap();
        let sp = rec.smart_poster().unwrap();
        assert_eq!(sp.title.as_deref(), Some("Привет"));
        assert_eq!(sp.lang.as_deref(), Some("ru_RU"));

        // Without a language the first title wins.
        let rec = decode(&bytes).unwrap();
        assert_eq!(rec.smart_poster().unwrap().title.as_deref(), Some("Hello"));

        // Territory beats language only, ties keep the first.
        let bytes = poster(&[uri(), title("a", "ru"), title("b", "ru-RU"), title("c", "ru-RU")]);
        let rec = decode_with_language(&bytes, Some(&ru)).unwrap();
        assert_eq!(rec.smart_poster().unwrap().title.as_deref(), Some("b"));

        let fi = Language::new("fi", None);
        let rec = decode_with_language(&bytes, Some(&fi)).unwrap();
        assert_eq!(rec.smart_poster().unwrap().title.as_deref(), Some("a"));
    }

    #[test]
    fn icon_must_be_image_or_video() {
        let uri = || Record::new_uri("https://a").unwrap();
        let text_plain = Record::new_mediatype("text/plain", b"hello").unwrap();
        let png = Record::new_mediatype("image/png", &[1, 2]).unwrap();
        let empty_png = Record::new_mediatype("image/png", &[]).unwrap();
        let mp4 = Record::new_mediatype("video/mp4", &[3]).unwrap();

        let rec = decode(&poster(&[uri(), text_plain.clone()])).unwrap();
        assert!(rec.smart_poster().unwrap().icon.is_none());

        let rec = decode(&poster(&[uri(), text_plain, empty_png, png.clone(), mp4.clone()])).unwrap();
        let icon = rec.smart_poster().unwrap().icon.as_deref().unwrap();
        assert_eq!(icon.type_bytes(), b"image/png");
        assert_eq!(icon.payload(), &[1, 2]);

        let rec = decode(&poster(&[mp4, uri(), png])).unwrap();
        let icon = rec.smart_poster().unwrap().icon.as_deref().unwrap();
        assert_eq!(icon.type_bytes(), b"video/mp4");
    }

    #[test]
    fn first_action_size_and_type_win() {
        let uri = Record::new_uri("https://a").unwrap();
        let act = |code: u8| Record::new_well_known(ACTION_TYPE, b"", &[code]).unwrap();
        let size = |s: u32| Record::new_well_known(SIZE_TYPE, b"", &s.to_be_bytes()).unwrap();
        let t = |mt: &str| Record::new_well_known(TYPE_TYPE, b"", mt.as_bytes()).unwrap();
        let bad_size = Record::new_well_known(SIZE_TYPE, b"", &[1, 2]).unwrap();

        let bytes = poster(&[
            uri,
            act(2),
            act(0),
            bad_size,
            size(7),
            size(8),
            t("text/html"),
            t("image/png"),
        ]);
        let rec = decode(&bytes).unwrap();
        let sp = rec.smart_poster().unwrap();
        assert_eq!(sp.action, Action::Edit);
        assert_eq!(sp.size, Some(7));
        assert_eq!(sp.media_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn bad_action_and_type_are_ignored() {
        let uri = Record::new_uri("https://a").unwrap();
        let act = Record::new_well_known(ACTION_TYPE, b"", &[9]).unwrap();
        let t = Record::new_well_known(TYPE_TYPE, b"", b"image/*").unwrap();
        let rec = decode(&poster(&[uri, act, t])).unwrap();
        let sp = rec.smart_poster().unwrap();
        assert_eq!(sp.action, Action::Default);
        assert_eq!(sp.media_type, None);
    }

    #[test]
    fn nested_smart_poster_is_not_interpreted() {
        let inner = Record::new_smart_poster(&SmartPosterContent {
            uri: "https://inner",
            ..Default::default()
        })
        .unwrap();
        let uri = Record::new_uri("https://outer").unwrap();
        let rec = decode(&poster(&[uri, inner])).unwrap();
        assert_eq!(rec.smart_poster().unwrap().uri, "https://outer");
    }

    #[test]
    fn invalid_type_is_rejected_on_encode() {
        let res = Record::new_smart_poster(&SmartPosterContent {
            uri: "https://a",
            media_type: Some("text"),
            ..Default::default()
        });
        assert!(matches!(res, Err(NdefError::InvalidMediaType(_))));
    }
}
