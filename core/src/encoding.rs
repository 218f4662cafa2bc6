//! MIME type parsing and the built-in encoder registry.
//!
//! Encodings declared by a design must name well-formed media types
//! (`type/subtype` followed by optional `; key=value` parameters). When no
//! implementation package is given, each MIME type must be handled by one
//! of the built-in encoders.
//!
//! # Examples
//!
//! ```
//! use api_design_core::parse_media_type;
//!
//! let parsed = parse_media_type("Application/JSON; charset=utf-8").unwrap();
//! assert_eq!(parsed.essence, "application/json");
//! assert_eq!(parsed.params["charset"], "utf-8");
//! assert!(parse_media_type("json").is_err());
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

/// MIME types handled without an implementation package.
pub const KNOWN_ENCODERS: &[&str] = &[
    "application/gob",
    "application/json",
    "application/x-gob",
    "application/xml",
];

/// A parsed media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMediaType {
    /// Lowercased `type/subtype`.
    pub essence: String,
    /// Parameters with lowercased names.
    pub params: BTreeMap<String, String>,
}

/// Reasons a media type string fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    #[error("no media type")]
    Empty,
    #[error("expected slash after first token")]
    MissingSlash,
    #[error("expected token after slash")]
    MissingSubtype,
    #[error("unexpected content after media subtype")]
    TrailingContent,
    #[error("invalid media parameter")]
    InvalidParameter,
    #[error("duplicate parameter name {0:?}")]
    DuplicateParameter(String),
}

fn is_token_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control() && !" ()<>@,;:\\\"/[]?=".contains(c)
}

fn split_token(s: &str) -> (&str, &str) {
    let end = s.find(|c| !is_token_char(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// Parses a media type string such as `text/html; charset=utf-8`.
pub fn parse_media_type(value: &str) -> Result<ParsedMediaType, MediaTypeError> {
    let (base, rest) = match value.find(';') {
        Some(i) => (&value[..i], &value[i..]),
        None => (value, ""),
    };
    let base = base.trim();
    if base.is_empty() {
        return Err(MediaTypeError::Empty);
    }

    let (main, after) = split_token(base);
    if main.is_empty() || !after.starts_with('/') {
        return Err(MediaTypeError::MissingSlash);
    }
    let (sub, after) = split_token(&after[1..]);
    if sub.is_empty() {
        return Err(MediaTypeError::MissingSubtype);
    }
    if !after.is_empty() {
        return Err(MediaTypeError::TrailingContent);
    }

    let mut params = BTreeMap::new();
    let mut rest = rest;
    while let Some(after) = rest.trim_start().strip_prefix(';') {
        let after = after.trim_start();
        if after.is_empty() || after.starts_with(';') {
            rest = after;
            continue;
        }
        let (key, after) = split_token(after);
        if key.is_empty() {
            return Err(MediaTypeError::InvalidParameter);
        }
        let after = after
            .trim_start()
            .strip_prefix('=')
            .ok_or(MediaTypeError::InvalidParameter)?;
        let (val, after) = consume_param_value(after.trim_start())?;
        let key = key.to_ascii_lowercase();
        if params.contains_key(&key) {
            return Err(MediaTypeError::DuplicateParameter(key));
        }
        params.insert(key, val);
        rest = after;
    }
    if !rest.trim().is_empty() {
        return Err(MediaTypeError::InvalidParameter);
    }

    Ok(ParsedMediaType {
        essence: format!("{}/{}", main, sub).to_ascii_lowercase(),
        params,
    })
}

/// Reads a token or quoted-string value and returns it with the remaining
/// input. Backslash escapes inside quotes are resolved.
fn consume_param_value(input: &str) -> Result<(String, &str), MediaTypeError> {
    let Some(quoted) = input.strip_prefix('"') else {
        let (token, rest) = split_token(input);
        if token.is_empty() {
            return Err(MediaTypeError::InvalidParameter);
        }
        return Ok((token.to_string(), rest));
    };
    let mut value = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &quoted[i + 1..])),
            '\\' => {
                let (_, escaped) = chars.next().ok_or(MediaTypeError::InvalidParameter)?;
                value.push(escaped);
            }
            c => value.push(c),
        }
    }
    Err(MediaTypeError::InvalidParameter)
}
