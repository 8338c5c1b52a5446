use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::KeyStoreError;
use crate::keystore::KeyStore;

pub const DEFAULT_CONFIG_FILE: &str = "config.properties";

/// Property holding the key text. Files written by the older desktop tool
/// use the same name, so they load unchanged.
pub const KEY_PROPERTY: &str = "encrypt.key";

/// Property holding keys that are not valid UTF-8, hex encoded.
pub const KEY_HEX_PROPERTY: &str = "encrypt.key.hex";

const HEADER: &str = "#File Encrypt Tool - 3DES Key";

/// Key kept in a Java-style `.properties` file. Writes go through a temp file
/// in the same directory and a rename, so a crash never leaves a half-written
/// config.
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for FileKeyStore {
    fn load(&self) -> Result<Option<Vec<u8>>, KeyStoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // properties files are ISO-8859-1; anything wider arrives as \u escapes
        let text: String = raw.iter().map(|&b| char::from(b)).collect();
        let props = parse_properties(&text)
            .map_err(|e| KeyStoreError::Format(format!("{}: {e}", self.path.display())))?;

        if let Some(text) = props.get(KEY_PROPERTY) {
            return Ok(Some(text.clone().into_bytes()));
        }
        match props.get(KEY_HEX_PROPERTY) {
            Some(h) => hex::decode(h.trim())
                .map(Some)
                .map_err(|e| KeyStoreError::Format(format!("{KEY_HEX_PROPERTY}: {e}"))),
            None => Ok(None),
        }
    }

    fn save(&self, key: &[u8]) -> Result<(), KeyStoreError> {
        let entry = match std::str::from_utf8(key) {
            Ok(text) => format!("{}={}", escape(KEY_PROPERTY, true), escape(text, false)),
            Err(_) => format!("{}={}", escape(KEY_HEX_PROPERTY, true), hex::encode(key)),
        };
        let body = format!("{HEADER}\n{entry}\n");

        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| KeyStoreError::Io(e.error))?;
        Ok(())
    }
}

const BLANK: [char; 3] = [' ', '\t', '\x0c'];

/// Key/value pairs of a properties document. A repeated key keeps its last
/// value.
fn parse_properties(text: &str) -> Result<HashMap<String, String>, String> {
    let mut props = HashMap::new();
    for line in logical_lines(text) {
        let (key, value) = split_entry(&line);
        props.insert(unescape(key)?, unescape(value)?);
    }
    Ok(props)
}

/// Joins backslash-continued lines and drops blanks and comments.
fn logical_lines(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending: Option<String> = None;
    for natural in text.lines() {
        let trimmed = natural.trim_start_matches(BLANK);
        let mut line = match pending.take() {
            Some(mut acc) => {
                acc.push_str(trimmed);
                acc
            }
            None if trimmed.is_empty() || trimmed.starts_with(['#', '!']) => continue,
            None => trimmed.to_string(),
        };
        let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            line.pop();
            pending = Some(line);
        } else {
            out.push(line);
        }
    }
    out.extend(pending);
    out
}

/// The key ends at the first unescaped `=`, `:` or blank. Blanks around the
/// separator are skipped.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start_matches(BLANK)),
            ' ' | '\t' | '\x0c' => {
                let rest = line[i..].trim_start_matches(BLANK);
                let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);
                return (&line[..i], rest.trim_start_matches(BLANK));
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> Result<String, String> {
    // \u escapes are UTF-16 code units, so surrogate pairs arrive split
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut buf = [0u16; 2];
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        let c = match c {
            '\\' => match chars.next() {
                Some('t') => '\t',
                Some('n') => '\n',
                Some('r') => '\r',
                Some('f') => '\x0c',
                Some('u') => {
                    let digits: String = chars.by_ref().take(4).collect();
                    let unit = (digits.len() == 4 && digits.chars().all(|d| d.is_ascii_hexdigit()))
                        .then(|| u16::from_str_radix(&digits, 16).ok())
                        .flatten()
                        .ok_or_else(|| format!("malformed \\u escape: \\u{digits}"))?;
                    units.push(unit);
                    continue;
                }
                Some(other) => other,
                None => break,
            },
            c => c,
        };
        units.extend_from_slice(c.encode_utf16(&mut buf));
    }
    String::from_utf16(&units).map_err(|e| e.to_string())
}

/// Inverse of `unescape`, writing only printable ASCII.
fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut buf = [0u16; 2];
    for (i, c) in s.chars().enumerate() {
        match c {
            ' ' if i == 0 || is_key => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => {
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
    out
}
