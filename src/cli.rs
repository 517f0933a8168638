// src/cli.rs
use std::io::Read;

use log::{info, warn};
use nfc_ndef::{
    Action, Language, NdefError, Record, RecordKind, Result, SmartPosterContent, TextEncoding, tlv,
};
use serde::Serialize;

use crate::config::{Config, Container};

pub const USAGE: &str = "\
usage: nfc-ndef [--tlv | --ndef] [--lang TAG] COMMAND [ARGS]

commands:
  decode HEX|-                      print each record as a JSON line
  check HEX|-                       test that a TLV area ends in a terminator
  encode-uri URI
  encode-text TEXT [LANG] [utf8|utf16be|utf16le]
  encode-sp URI [TITLE] [open|save|edit]
  encode-mime TYPE HEX";

// One decoded record, as printed by `decode`.
#[derive(Serialize, Debug)]
struct RecordReport {
    tnf: nfc_ndef::Tnf,
    first: bool,
    last: bool,
    #[serde(rename = "type")]
    type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    payload: String,
    #[serde(flatten)]
    content: Content,
}

#[derive(Serialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Content {
    Generic,
    Uri {
        uri: String,
    },
    Text {
        lang: String,
        text: String,
        encoding: TextEncoding,
    },
    SmartPoster {
        uri: String,
        title: Option<String>,
        lang: Option<String>,
        media_type: Option<String>,
        size: Option<u32>,
        action: Action,
        icon: Option<Box<RecordReport>>,
    },
}

impl RecordReport {
    fn new(rec: &Record) -> RecordReport {
        let content = match rec.kind() {
            RecordKind::Generic => Content::Generic,
            RecordKind::Uri(u) => Content::Uri { uri: u.uri.clone() },
            RecordKind::Text(t) => Content::Text {
                lang: t.lang.clone(),
                text: t.text.clone(),
                encoding: t.encoding,
            },
            RecordKind::SmartPoster(sp) => Content::SmartPoster {
                uri: sp.uri.clone(),
                title: sp.title.clone(),
                lang: sp.lang.clone(),
                media_type: sp.media_type.clone(),
                size: sp.size,
                action: sp.action,
                icon: sp.icon.as_deref().map(|icon| Box::new(RecordReport::new(icon))),
            },
        };
        RecordReport {
            tnf: rec.tnf(),
            first: rec.flags().contains(nfc_ndef::RecordFlags::FIRST),
            last: rec.flags().contains(nfc_ndef::RecordFlags::LAST),
            type_: String::from_utf8_lossy(rec.type_bytes()).into_owned(),
            id: rec.id().map(hex::encode_upper),
            payload: hex::encode_upper(rec.payload()),
            content,
        }
    }
}

struct Options {
    container: Container,
    language: Option<Language>,
}

/// Runs one command and returns what should be printed.
pub fn run(args: &[String], cfg: &Config) -> Result<String> {
    let mut opts = Options {
        container: cfg.container,
        language: cfg.language(),
    };

    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tlv" => opts.container = Container::Tlv,
            "--ndef" => opts.container = Container::Ndef,
            "--lang" => {
                let tag = iter.next().ok_or_else(|| usage("--lang needs a value"))?;
                opts.language = Some(Language::parse(tag).ok_or_else(|| usage("bad --lang value"))?);
            }
            "-h" | "--help" => return Ok(USAGE.to_string()),
            _ => rest.push(arg.as_str()),
        }
    }

    let Some((&command, params)) = rest.split_first() else {
        return Err(usage("missing command"));
    };
    info!("Running {} with {:?}", command, opts.container);

    match (command, params) {
        ("decode", [input]) => decode(&read_hex(input)?, &opts),
        ("check", [input]) => Ok(tlv::check(&read_hex(input)?).to_string()),
        ("encode-uri", [uri]) => output(&Record::new_uri(uri)?, &opts),
        ("encode-text", [text, more @ ..]) if more.len() <= 2 => {
            let encoding = match more.get(1) {
                Some(name) => TextEncoding::parse(name).ok_or_else(|| usage("unknown encoding"))?,
                None => TextEncoding::Utf8,
            };
            let rec = Record::new_text_or_default(
                Some(*text),
                more.first().copied(),
                encoding,
                opts.language.as_ref(),
            )?;
            output(&rec, &opts)
        }
        ("encode-sp", [uri, more @ ..]) if more.len() <= 2 => {
            let action = match more.get(1).copied() {
                Some("open") => Action::Open,
                Some("save") => Action::Save,
                Some("edit") => Action::Edit,
                Some(_) => return Err(usage("unknown action")),
                None => Action::Default,
            };
            let rec = Record::new_smart_poster(&SmartPosterContent {
                uri: *uri,
                title: more.first().copied(),
                current: opts.language.as_ref(),
                action,
                ..Default::default()
            })?;
            output(&rec, &opts)
        }
        ("encode-mime", [media_type, payload]) => {
            output(&Record::new_mediatype(media_type, &hex::decode(payload)?)?, &opts)
        }
        _ => Err(usage(&format!("bad arguments for {:?}", command))),
    }
}

fn usage(msg: &str) -> NdefError {
    NdefError::Usage(format!("{}\n{}", msg, USAGE))
}

// A hex string, or `-` for hex on stdin. Whitespace is ignored.
fn read_hex(input: &str) -> Result<Vec<u8>> {
    let text = if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        input.to_string()
    };
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(hex::decode(digits)?)
}

fn decode(data: &[u8], opts: &Options) -> Result<String> {
    let chain = match opts.container {
        Container::Tlv => nfc_ndef::decode_tlv_with_language(data, opts.language.as_ref()),
        Container::Ndef => nfc_ndef::decode_with_language(data, opts.language.as_ref()),
    };
    let Some(chain) = chain else {
        warn!("No NDEF records found");
        return Ok(String::new());
    };

    let lines = chain
        .iter()
        .map(|rec| serde_json::to_string(&RecordReport::new(rec)))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

fn output(rec: &Record, opts: &Options) -> Result<String> {
    let message = rec.to_message_bytes();
    let bytes = match opts.container {
        Container::Tlv => tlv::wrap_ndef(&message)?,
        Container::Ndef => message,
    };
    Ok(hex::encode_upper(bytes))
}
