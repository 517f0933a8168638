// src/mediatype.rs
//! RFC 2045 media type checks (`type/subtype`, no parameters).

const TSPECIALS: &[u8] = b"()<>@,;:\\\"/[]?=";

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_graphic() && !TSPECIALS.contains(&b))
}

/// True if `media_type` is `type/subtype` made of RFC 2045 tokens.
///
/// With `wildcard`, `*/*` and `type/*` are accepted as well. A wildcard type
/// with a concrete subtype (`*/png`) never is.
pub fn is_valid(media_type: &str, wildcard: bool) -> bool {
    let Some((type_, subtype)) = media_type.split_once('/') else {
        return false;
    };
    match (type_, subtype) {
        ("*", "*") => wildcard,
        ("*", _) => false,
        (_, "*") => wildcard && is_token(type_),
        _ => is_token(type_) && is_token(subtype),
    }
}

/// True for a valid, non-wildcard media type with the given top-level type.
pub fn has_type(media_type: &str, type_: &str) -> bool {
    is_valid(media_type, false)
        && media_type
            .split_once('/')
            .is_some_and(|(t, _)| t.eq_ignore_ascii_case(type_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_types() {
        assert!(is_valid("image/png", false));
        assert!(is_valid("text/plain", false));
        assert!(is_valid("application/vnd.bluetooth.ep.oob", false));
        assert!(is_valid("video/mp4", true));
    }

    #[test]
    fn rejects_malformed() {
        assert!(!is_valid("", false));
        assert!(!is_valid("image", false));
        assert!(!is_valid("image/", false));
        assert!(!is_valid("/png", false));
        assert!(!is_valid("image/png/x", false));
        assert!(!is_valid("image/p ng", false));
        assert!(!is_valid("image/png;q=1", false));
        assert!(!is_valid("imäge/png", false));
    }

    #[test]
    fn wildcards() {
        assert!(!is_valid("*/*", false));
        assert!(is_valid("*/*", true));
        assert!(!is_valid("image/*", false));
        assert!(is_valid("image/*", true));
        assert!(!is_valid("*/png", true));
    }

    #[test]
    fn top_level_type() {
        assert!(has_type("image/png", "image"));
        assert!(has_type("IMAGE/png", "image"));
        assert!(has_type("video/mp4", "video"));
        assert!(!has_type("text/plain", "image"));
        assert!(!has_type("image/*", "image"));
    }
}
