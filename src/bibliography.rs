use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{entry::Entry, fields::parse_fields};

/// Reasons a record is left out of the bibliography.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record `{key}` is interrupted by the next record before its closing brace")]
    Interrupted { key: String },
    #[error("record `{key}` is not closed before the end of the document")]
    Unterminated { key: String },
    #[error("@{record_type} record has an empty key")]
    MissingKey { record_type: String },
    #[error("record `{key}` has no recognizable fields")]
    NoFields { key: String },
}

/// The raw pieces of one `@type{key, ...}` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    pub record_type: &'a str,
    pub key: &'a str,
    pub body: &'a str,
}

// Opening line of a record: `@type{key,` at the start of a line.
static OPENER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*@(\w+)[ \t]*\{([^,\n]*),").unwrap());

/// Split `document` into records.
///
/// A record runs from its opening line up to the first line holding only `}`. Records written on
/// a single line have no such line and end at the brace balancing the opening `{` instead. Both
/// scans stop at the next opening line, so a record missing its closing brace is reported on its
/// own and does not swallow the record after it.
pub fn scan_records(document: &str) -> Vec<Result<Record<'_>, RecordError>> {
    let openers: Vec<_> = OPENER_RE.captures_iter(document).collect();
    let mut records = Vec::with_capacity(openers.len());

    for (i, caps) in openers.iter().enumerate() {
        // Both groups always participate in a match.
        let (Some(whole), Some(record_type), Some(key)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let key_str = key.as_str().trim();
        let next = openers.get(i + 1).and_then(|c| c.get(0));
        let limit = next.map(|m| m.start()).unwrap_or(document.len());
        let rest = &document[whole.end()..limit];

        let Some(close) = closing_line(rest).or_else(|| closing_brace(rest)) else {
            let key = key_str.to_string();
            records.push(Err(if next.is_some() {
                RecordError::Interrupted { key }
            } else {
                RecordError::Unterminated { key }
            }));
            continue;
        };

        if key_str.is_empty() {
            records.push(Err(RecordError::MissingKey {
                record_type: record_type.as_str().to_string(),
            }));
            continue;
        }

        records.push(Ok(Record {
            record_type: record_type.as_str(),
            key: key_str,
            body: &rest[..close],
        }));
    }
    records
}

/// Byte offset of the first line consisting solely of `}`.
fn closing_line(rest: &str) -> Option<usize> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == "}" {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Byte offset of the `}` closing a record whose opening brace precedes `rest`.
fn closing_brace(rest: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Turn one scanned record into an entry.
pub fn parse_record(record: &Record<'_>) -> Result<Entry, RecordError> {
    let fields = parse_fields(record.body);
    if fields.is_empty() {
        return Err(RecordError::NoFields {
            key: record.key.to_string(),
        });
    }
    Ok(Entry::from_fields(record.record_type, record.key, &fields))
}

/// All entries of a document, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bibliography {
    entries: Vec<Entry>,
}

impl Bibliography {
    /// Parse every well-formed record. Malformed records are logged and skipped.
    pub fn parse(document: &str) -> Self {
        let mut entries = Vec::new();
        for record in scan_records(document) {
            match record.and_then(|r| parse_record(&r)) {
                Ok(entry) => {
                    debug!(key = entry.key(), "parsed record");
                    entries.push(entry);
                }
                Err(err) => warn!("skipping record: {err}"),
            }
        }
        Self::from_entries(entries)
    }

    pub fn parse_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bibliography {}", path.display()))?;
        Ok(Self::parse(&document))
    }

    /// Order `entries` by year, newest first. Entries sharing a year keep their given order.
    pub fn from_entries(mut entries: Vec<Entry>) -> Self {
        // `sort_by` is stable.
        entries.sort_by(|a, b| b.year().cmp(&a.year()));
        Bibliography { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Bibliography {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
