// src/config.rs
//! Tool configuration: defaults, then a TOML file, then environment.
//!
//! File: ~/.config/nfc-ndef/config.toml or /etc/nfc-ndef/config.toml.
//! Env overrides: NFC_NDEF_LANGUAGE, NFC_NDEF_CONTAINER.

use std::path::PathBuf;

use log::warn;
use nfc_ndef::Language;
use serde::Deserialize;

/// How tag images are framed on input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// NDEF message inside TLV blocks, as stored in tag memory.
    #[default]
    Tlv,
    /// Bare NDEF message.
    Ndef,
}

impl Container {
    pub fn parse(s: &str) -> Option<Container> {
        match s.to_ascii_lowercase().as_str() {
            "tlv" => Some(Container::Tlv),
            "ndef" => Some(Container::Ndef),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Display language used to pick smart poster titles and as the default
    /// Text record language. Falls back to the POSIX locale.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub container: Container,
}

impl Config {
    /// The configured language, else the one from the locale environment.
    pub fn language(&self) -> Option<Language> {
        self.resolve_language(|key| std::env::var(key).ok())
    }

    fn resolve_language(&self, var: impl Fn(&str) -> Option<String>) -> Option<Language> {
        if let Some(lang) = self.language.as_deref() {
            return Language::parse(lang);
        }
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .into_iter()
            .filter_map(|key| var(key))
            .find(|value| !value.is_empty())
            .and_then(|locale| Language::from_locale(&locale))
    }
}

/// Load config: defaults, then config file (if present), then env vars.
pub fn load() -> Config {
    let c = load_file().unwrap_or_default();
    apply_env(c, |key| std::env::var(key).ok())
}

fn apply_env(mut c: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(lang) = var("NFC_NDEF_LANGUAGE").filter(|l| !l.is_empty()) {
        c.language = Some(lang);
    }
    if let Some(s) = var("NFC_NDEF_CONTAINER") {
        match Container::parse(&s) {
            Some(container) => c.container = container,
            None => warn!("Ignoring NFC_NDEF_CONTAINER={:?}", s),
        }
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        out.push(home.join(".config/nfc-ndef/config.toml"));
    }
    out.push(PathBuf::from("/etc/nfc-ndef/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    let path = config_paths().into_iter().find(|p| p.exists())?;
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Can't read {}: {}", path.display(), e);
            return None;
        }
    };
    match toml::from_str::<Config>(&text) {
        Ok(c) => Some(c),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}
