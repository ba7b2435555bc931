//! Directive recognition
//!
//! Classifies a single input line against the directive grammar. Directives live
//! in `//` line comments and must occupy the whole line:
//!
//! ```text
//! // #include "lib/util.js"
//! //#ifdef DEBUG
//! //#ifndef RELEASE
//! // #endif
//! ```
//!
//! Matching is byte-oriented with ASCII character classes, so a line terminator
//! (`\n` or `\r\n`) is absorbed by the trailing whitespace of each pattern.

use once_cell::sync::Lazy;
use regex::bytes::Regex;

static INCLUDE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?-u)^\s*//\s*#include\s+"(.+)"\s*$"#).expect("include regex pattern is valid")
});

static IFDEF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)^\s*//\s*#ifdef\s+(\w+)\s*$").expect("ifdef regex pattern is valid")
});

static IFNDEF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)^\s*//\s*#ifndef\s+(\w+)\s*$").expect("ifndef regex pattern is valid")
});

static ENDIF_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)^\s*//\s*#endif\s*$").expect("endif regex pattern is valid"));

/// A classified input line. Borrows from the line it was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `#include "path"` with the raw, unresolved path bytes
    Include(&'a [u8]),
    /// `#ifdef SYMBOL`
    IfDef(&'a str),
    /// `#ifndef SYMBOL`
    IfNdef(&'a str),
    /// `#endif`
    EndIf,
    /// Anything else; passed through verbatim
    Plain,
}

impl Directive<'_> {
    /// Directive keyword as written in source, or `None` for plain lines
    #[must_use]
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::Include(_) => Some("#include"),
            Self::IfDef(_) => Some("#ifdef"),
            Self::IfNdef(_) => Some("#ifndef"),
            Self::EndIf => Some("#endif"),
            Self::Plain => None,
        }
    }
}

/// Classify one line (terminator included or not).
#[must_use]
pub fn classify(line: &[u8]) -> Directive<'_> {
    if let Some(caps) = INCLUDE_REGEX.captures(line)
        && let Some(path) = caps.get(1)
    {
        return Directive::Include(path.as_bytes());
    }

    if let Some(symbol) = capture_symbol(&IFDEF_REGEX, line) {
        return Directive::IfDef(symbol);
    }

    if let Some(symbol) = capture_symbol(&IFNDEF_REGEX, line) {
        return Directive::IfNdef(symbol);
    }

    if ENDIF_REGEX.is_match(line) {
        return Directive::EndIf;
    }

    Directive::Plain
}

/// Symbols are ASCII word characters, so the capture is always valid UTF-8.
fn capture_symbol<'a>(regex: &Regex, line: &'a [u8]) -> Option<&'a str> {
    let caps = regex.captures(line)?;
    std::str::from_utf8(caps.get(1)?.as_bytes()).ok()
}
