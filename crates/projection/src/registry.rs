//! Process-wide registry of custom authority definitions.
//!
//! The registry starts empty and only grows: [`register_authority_definitions`]
//! is the single write path, and every later [`crate::decode_crs`] call in the
//! process sees what it added. Entries are never removed or replaced.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::code::CrsCode;
use crate::crs::Crs;
use crate::error::{CrsError, Result};

static REGISTRY: Lazy<RwLock<AuthorityRegistry>> =
    Lazy::new(|| RwLock::new(AuthorityRegistry::default()));

#[derive(Default)]
struct AuthorityRegistry {
    entries: BTreeMap<CrsCode, Crs>,
}

/// Load a properties file of `code = definition` lines under `authority`.
///
/// Definitions are WKT1, or PROJ.4 when they start with `+`. The file is
/// all-or-nothing: if any entry fails to parse, nothing is registered. Codes
/// that are already registered keep their first definition. Returns the
/// number of codes newly added.
pub fn register_authority_definitions(authority: &str, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let authority = authority.trim();
    if authority.is_empty()
        || !authority
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CrsError::parse(format!(
            "invalid authority name '{authority}'"
        )));
    }

    if !path.exists() {
        return Err(CrsError::DefinitionsNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| CrsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut parsed = Vec::new();
    for (key, value) in parse_properties(&text) {
        let code = CrsCode::new(authority, &key);
        let crs = Crs::from_definition(code.clone(), &value)
            .map_err(|e| CrsError::parse(format!("{code} in {}: {e}", path.display())))?;
        parsed.push((code, crs));
    }

    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    let mut added = 0;
    for (code, crs) in parsed {
        if registry.entries.contains_key(&code) {
            warn!(code = %code, "Authority code already registered, keeping first definition");
            continue;
        }
        debug!(code = %code, name = crs.name(), "Registered CRS");
        registry.entries.insert(code, crs);
        added += 1;
    }

    info!(
        authority = authority,
        path = %path.display(),
        added = added,
        total = registry.entries.len(),
        "Registered authority definitions"
    );
    Ok(added)
}

/// Registered definition for a code.
pub(crate) fn lookup(code: &CrsCode) -> Option<Crs> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .entries
        .get(code)
        .cloned()
}

/// First registered code whose definition equals `crs`.
pub(crate) fn find_equal(crs: &Crs) -> Option<CrsCode> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .entries
        .iter()
        .find(|(_, registered)| registered.proj4().equivalent(crs.proj4()))
        .map(|(code, _)| code.clone())
}

/// Codes registered under `authority`, in sorted order.
pub fn registered_codes(authority: &str) -> Vec<CrsCode> {
    let authority = authority.trim().to_ascii_uppercase();
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .entries
        .keys()
        .filter(|code| code.authority() == authority)
        .cloned()
        .collect()
}

/// Parse Java-style properties text into ordered key/value pairs.
///
/// Supports `#`/`!` comments, `=`, `:` or whitespace separators, and
/// trailing-backslash line continuation.
pub(crate) fn parse_properties(text: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut logical = String::new();
    let mut continuing = false;

    for raw in text.lines() {
        let line = if continuing {
            raw.trim_start()
        } else {
            let trimmed = raw.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            trimmed
        };

        let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            logical.push_str(&line[..line.len() - 1]);
            continuing = true;
            continue;
        }
        logical.push_str(line);
        continuing = false;

        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
        logical.clear();
    }

    if !logical.is_empty() {
        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
    }
    entries
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let mut key = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    key.push(unescape(escaped));
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if matches!(chars.peek(), Some('=') | Some(':')) {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }

    let mut value = String::new();
    let rest: String = chars.collect();
    let mut rest = rest.trim_start().chars();
    while let Some(c) = rest.next() {
        if c == '\\' {
            if let Some(escaped) = rest.next() {
                value.push(unescape(escaped));
            }
        } else {
            value.push(c);
        }
    }

    if key.is_empty() {
        None
    } else {
        Some((key, value.trim_end().to_string()))
    }
}

fn unescape(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\x0c',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties() {
        let text = "# comment\n! also a comment\n\n100 = +proj=longlat \\\n    +datum=WGS84\n200:GEOGCS[\"x\"]\n300 \t+proj=merc\n";
        let entries = parse_properties(text);
        assert_eq!(
            entries,
            vec![
                ("100".to_string(), "+proj=longlat +datum=WGS84".to_string()),
                ("200".to_string(), "GEOGCS[\"x\"]".to_string()),
                ("300".to_string(), "+proj=merc".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_separator_in_key() {
        let entries = parse_properties("a\\=b = c\n");
        assert_eq!(entries, vec![("a=b".to_string(), "c".to_string())]);
    }

    #[test]
    fn test_invalid_authority() {
        assert!(matches!(
            register_authority_definitions("bad name", "/nonexistent"),
            Err(CrsError::Parse(_))
        ));
        assert!(matches!(
            register_authority_definitions("", "/nonexistent"),
            Err(CrsError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            register_authority_definitions("REGTEST", "/no/such/definitions.properties"),
            Err(CrsError::DefinitionsNotFound(_))
        ));
    }
}
