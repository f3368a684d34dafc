//! Pattern library: per-century regular expressions for locating codes
//!
//! Text patterns carry exactly one capture group holding the code and are
//! ordered most-specific first. Every list ends with the generic
//! alphanumeric-code pattern, so unknown centuries still get a best effort.
//!
//! Binary patterns run over raw file bytes and are deliberately narrower:
//! literal manuscript prefixes followed by digits, then one generic fallback.

use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;

use crate::century::Century;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid text pattern {p}: {e}")))
        .collect()
}

fn compile_bytes(patterns: &[&str]) -> Vec<BytesRegex> {
    patterns
        .iter()
        .map(|p| BytesRegex::new(p).unwrap_or_else(|e| panic!("invalid binary pattern {p}: {e}")))
        .collect()
}

/// Labelled patterns followed by the universal alphanumeric-code pattern.
///
/// Word boundaries, letters and digits are ASCII-only: a code never contains
/// non-ASCII digits, and an accented letter still delimits a code.
const GENERIC_TEXT: &[&str] = &[
    r"(?i)c[óo]digo\s*[:=]?\s*((?-u:[A-Z0-9]){5,})",
    r"(?i-u)\bcode\s*[:=]?\s*([A-Z0-9]{5,})",
    r"(?i-u)\bclave\s*[:=]?\s*([A-Z0-9]{5,})",
    r"(?i-u)\bpassword\s*[:=]?\s*([A-Z0-9]{5,})",
    r"(?i-u)\b([A-Z]{5,}[0-9]{3,})\b",
];

const GENERIC_BINARY: &str = r"(?-u)[A-Z]{5,}[0-9]{3,}";

fn specific_text(century: Century) -> &'static [&'static str] {
    match century {
        Century::XIV => &[r"(?i-u)\b(AUREUS[0-9]{4})\b"],
        Century::XV => &[r"(?i-u)\b(DIAZEPAM[0-9]{3})\b"],
        Century::XVI => &[r"(?i-u)\b(SERAPH[0-9]{4})\b"],
        Century::XVII => &[
            r"(?i-u)\b(NECRONOMICON[0-9]{4})\b",
            r"(?i-u)\b(NECRO[0-9]{4})\b",
        ],
        Century::XVIII => &[r"(?i-u)\b(MALLEUS[0-9]{4})\b"],
    }
}

fn specific_binary(century: Century) -> &'static [&'static str] {
    match century {
        Century::XIV => &[r"(?i-u)AUREUS[0-9]{4}"],
        Century::XV => &[r"(?i-u)DIAZEPAM[0-9]{3}", r"(?i-u)ALPRAZOLAM[0-9]{3}"],
        Century::XVI => &[r"(?i-u)SERAPH[0-9]{4}"],
        Century::XVII => &[r"(?i-u)NECRONOMICON[0-9]{4}", r"(?i-u)NECRO[0-9]{4}"],
        Century::XVIII => &[r"(?i-u)MALLEUS[0-9]{4}"],
    }
}

struct TextTable {
    generic: Vec<Regex>,
    by_century: Vec<(Century, Vec<Regex>)>,
}

struct BinaryTable {
    generic: Vec<BytesRegex>,
    by_century: Vec<(Century, Vec<BytesRegex>)>,
}

static TEXT_TABLE: Lazy<TextTable> = Lazy::new(|| TextTable {
    generic: compile(GENERIC_TEXT),
    by_century: Century::ALL
        .iter()
        .map(|&c| {
            let mut all: Vec<&str> = specific_text(c).to_vec();
            all.extend_from_slice(GENERIC_TEXT);
            (c, compile(&all))
        })
        .collect(),
});

static BINARY_TABLE: Lazy<BinaryTable> = Lazy::new(|| BinaryTable {
    generic: compile_bytes(&[GENERIC_BINARY]),
    by_century: Century::ALL
        .iter()
        .map(|&c| {
            let mut all: Vec<&str> = specific_binary(c).to_vec();
            all.push(GENERIC_BINARY);
            (c, compile_bytes(&all))
        })
        .collect(),
});

/// Ordered text patterns for a century label.
pub fn text_patterns(century: &str) -> &'static [Regex] {
    let table = &*TEXT_TABLE;
    match century.parse::<Century>() {
        Ok(c) => table
            .by_century
            .iter()
            .find(|(k, _)| *k == c)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&table.generic),
        Err(_) => &table.generic,
    }
}

/// Ordered byte patterns for a century label.
pub fn binary_patterns(century: &str) -> &'static [BytesRegex] {
    let table = &*BINARY_TABLE;
    match century.parse::<Century>() {
        Ok(c) => table
            .by_century
            .iter()
            .find(|(k, _)| *k == c)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&table.generic),
        Err(_) => &table.generic,
    }
}

/// Collapse runs of whitespace to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run the century's text patterns over normalized text.
///
/// Returns the first capture group matched, uppercased.
pub fn find_code(text: &str, century: &str) -> Option<String> {
    let normalized = normalize_whitespace(text);
    text_patterns(century).iter().find_map(|pattern| {
        pattern
            .captures(&normalized)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_uppercase())
            .filter(|code| !code.is_empty())
    })
}

/// Run the century's byte patterns over raw file content.
///
/// Returns the first whole match, decoded byte-for-byte.
pub fn find_binary_code(bytes: &[u8], century: &str) -> Option<String> {
    binary_patterns(century)
        .iter()
        .find_map(|pattern| pattern.find(bytes))
        .map(|m| m.as_bytes().iter().map(|&b| b as char).collect())
}
