// src/types.rs
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

// NDEF header byte: MB | ME | CF | SR | IL | TNF(3 bits)
pub const HDR_MB: u8 = 0x80;
pub const HDR_ME: u8 = 0x40;
pub const HDR_CF: u8 = 0x20;
pub const HDR_SR: u8 = 0x10;
pub const HDR_IL: u8 = 0x08;
pub const HDR_TNF_MASK: u8 = 0x07;

/// Type Name Format, the namespace the record type lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tnf {
    Empty = 0,
    WellKnown = 1,
    MediaType = 2,
    AbsoluteUri = 3,
    External = 4,
    Unknown = 5,
    Unchanged = 6,
    Reserved = 7,
}

impl Tnf {
    pub fn from_header(header: u8) -> Tnf {
        match header & HDR_TNF_MASK {
            0 => Tnf::Empty,
            1 => Tnf::WellKnown,
            2 => Tnf::MediaType,
            3 => Tnf::AbsoluteUri,
            4 => Tnf::External,
            5 => Tnf::Unknown,
            6 => Tnf::Unchanged,
            _ => Tnf::Reserved,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Well-known record type the codec knows how to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rtd {
    Unknown,
    Uri,
    Text,
    SmartPoster,
}

impl Rtd {
    pub const URI_TYPE: &'static [u8] = b"U";
    pub const TEXT_TYPE: &'static [u8] = b"T";
    pub const SMART_POSTER_TYPE: &'static [u8] = b"Sp";

    /// Maps a well-known type field onto the RTD it names.
    pub fn from_type(type_bytes: &[u8]) -> Rtd {
        match type_bytes {
            Self::URI_TYPE => Rtd::Uri,
            Self::TEXT_TYPE => Rtd::Text,
            Self::SMART_POSTER_TYPE => Rtd::SmartPoster,
            _ => Rtd::Unknown,
        }
    }
}

/// Position of a record inside its message (the MB and ME header bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecordFlags(u8);

impl RecordFlags {
    pub const FIRST: RecordFlags = RecordFlags(0x01);
    pub const LAST: RecordFlags = RecordFlags(0x02);

    pub const fn empty() -> RecordFlags {
        RecordFlags(0)
    }

    pub fn from_header(header: u8) -> RecordFlags {
        let mut flags = RecordFlags::empty();
        if header & HDR_MB != 0 {
            flags |= RecordFlags::FIRST;
        }
        if header & HDR_ME != 0 {
            flags |= RecordFlags::LAST;
        }
        flags
    }

    /// Header bits (MB/ME) corresponding to these flags.
    pub fn header_bits(self) -> u8 {
        let mut bits = 0;
        if self.contains(RecordFlags::FIRST) {
            bits |= HDR_MB;
        }
        if self.contains(RecordFlags::LAST) {
            bits |= HDR_ME;
        }
        bits
    }

    pub fn contains(self, other: RecordFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn remove(&mut self, other: RecordFlags) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for RecordFlags {
    type Output = RecordFlags;

    fn bitor(self, rhs: RecordFlags) -> RecordFlags {
        RecordFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for RecordFlags {
    fn bitor_assign(&mut self, rhs: RecordFlags) {
        self.0 |= rhs.0;
    }
}

/// Character encoding of a Text record body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Be,
    Utf16Le,
}

impl TextEncoding {
    pub fn parse(name: &str) -> Option<TextEncoding> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "utf8" => Some(TextEncoding::Utf8),
            "utf16" | "utf16be" => Some(TextEncoding::Utf16Be),
            "utf16le" => Some(TextEncoding::Utf16Le),
            _ => None,
        }
    }
}

/// Smart poster "act" record value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// No action record present.
    #[default]
    Default,
    Open,
    Save,
    Edit,
}

impl Action {
    pub fn from_code(code: u8) -> Option<Action> {
        match code {
            0 => Some(Action::Open),
            1 => Some(Action::Save),
            2 => Some(Action::Edit),
            _ => None,
        }
    }

    pub fn code(self) -> Option<u8> {
        match self {
            Action::Default => None,
            Action::Open => Some(0),
            Action::Save => Some(1),
            Action::Edit => Some(2),
        }
    }
}

/// A language tag split into its primary subtag and optional territory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    pub language: String,
    pub territory: Option<String>,
}

impl Language {
    pub fn new(language: &str, territory: Option<&str>) -> Language {
        Language {
            language: language.to_string(),
            territory: territory.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }

    /// Splits `en-US`, `en_US` or plain `en`. Returns `None` for an empty primary subtag.
    pub fn parse(tag: &str) -> Option<Language> {
        let mut parts = tag.splitn(2, ['-', '_']);
        let language = parts.next().filter(|l| !l.is_empty())?;
        Some(Language::new(language, parts.next()))
    }

    /// The IETF form used in Text records, `ru-RU`.
    pub fn tag(&self) -> String {
        match &self.territory {
            Some(territory) => format!("{}-{}", self.language, territory),
            None => self.language.clone(),
        }
    }

    /// Parses a POSIX locale name such as `ru_RU.UTF-8@euro`.
    /// `C` and `POSIX` carry no language.
    pub fn from_locale(locale: &str) -> Option<Language> {
        let name = locale.split(['.', '@']).next().unwrap_or_default();
        if name.is_empty() || name == "C" || name == "POSIX" {
            return None;
        }
        Language::parse(name)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.territory {
            Some(territory) => write!(f, "{}_{}", self.language, territory),
            None => f.write_str(&self.language),
        }
    }
}

/// How well a record language matches a wanted language. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageMatch {
    None,
    Language,
    LanguageTerritory,
}
