//! Machine-readable exports of a bibliography.

use serde::Serialize;

use crate::entry::{Entry, EntryKind};

#[derive(Debug, Serialize)]
struct AuthorRecord<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    first_name: &'a str,
    last_name: &'a str,
}

/// Flat JSON shape of an entry. Absent fields are omitted.
#[derive(Debug, Serialize)]
struct EntryRecord<'a> {
    key: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    title: &'a str,
    authors: Vec<AuthorRecord<'a>>,
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doi: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publisher: Option<&'a str>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    abstract_: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(flatten)]
    extra: indexmap::IndexMap<&'static str, &'a str>,
}

/// Variant-specific fields as `(name, value)` pairs, in BibTeX field names.
fn kind_fields(kind: &EntryKind) -> Vec<(&'static str, &str)> {
    let pairs: Vec<(&'static str, Option<&String>)> = match kind {
        EntryKind::Generic { fields: a, .. } | EntryKind::Article(a) => vec![
            ("journal", a.journal.as_ref()),
            ("volume", a.volume.as_ref()),
            ("number", a.number.as_ref()),
            ("pages", a.pages.as_ref()),
            ("issn", a.issn.as_ref()),
        ],
        EntryKind::InProceedings(p) => vec![
            ("booktitle", p.booktitle.as_ref()),
            ("pages", p.pages.as_ref()),
            ("editor", p.editor.as_ref()),
        ],
        EntryKind::TechReport(t) => vec![
            ("institution", t.institution.as_ref()),
            ("type", t.report_type.as_ref()),
        ],
    };
    pairs
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v.as_str())))
        .collect()
}

fn record(entry: &Entry) -> EntryRecord<'_> {
    EntryRecord {
        key: entry.key(),
        record_type: entry.kind().record_type(),
        title: entry.title(),
        authors: entry
            .authors()
            .iter()
            .map(|a| AuthorRecord {
                first_name: a.first_name(),
                last_name: a.last_name(),
            })
            .collect(),
        year: entry.year(),
        month: entry.month(),
        url: entry.url(),
        doi: entry.doi(),
        publisher: entry.publisher(),
        abstract_: entry.abstract_text(),
        topic: entry.topic(),
        source: entry.source_line(),
        // `type` is taken by the record type.
        extra: kind_fields(entry.kind())
            .into_iter()
            .map(|(name, value)| match name {
                "type" => ("report_type", value),
                _ => (name, value),
            })
            .collect(),
    }
}

pub fn to_json<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> serde_json::Result<String> {
    let records: Vec<_> = entries.into_iter().map(record).collect();
    serde_json::to_string_pretty(&records)
}

/// Write an entry back in the record format the parser reads.
///
/// Braces are dropped from values since the field grammar cannot carry them.
pub fn entry_to_bibtex(entry: &Entry) -> String {
    let mut fields: Vec<(&str, String)> = Vec::new();
    if !entry.authors().is_empty() {
        let authors: Vec<String> = entry.authors().iter().map(ToString::to_string).collect();
        fields.push(("author", authors.join(" and ")));
    }
    // Always written: a record without fields would not parse back.
    fields.push(("title", entry.title().to_string()));
    if entry.year() != 0 {
        fields.push(("year", entry.year().to_string()));
    }
    let common = [
        ("month", entry.month()),
        ("url", entry.url()),
        ("doi", entry.doi()),
        ("publisher", entry.publisher()),
    ];
    fields.extend(
        common
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v.to_string()))),
    );
    fields.extend(
        kind_fields(entry.kind())
            .into_iter()
            .map(|(name, value)| (name, value.to_string())),
    );
    let trailing = [("topic", entry.topic()), ("abstract", entry.abstract_text())];
    fields.extend(
        trailing
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v.to_string()))),
    );

    let mut out = format!("@{}{{{},\n", entry.kind().record_type(), entry.key());
    let body: Vec<String> = fields
        .into_iter()
        .map(|(name, value)| format!("  {name} = {{{}}}", strip_braces(&value)))
        .collect();
    out.push_str(&body.join(",\n"));
    out.push_str("\n}\n");
    out
}

pub fn to_bibtex<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> String {
    entries
        .into_iter()
        .map(entry_to_bibtex)
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_braces(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '{' | '}')).collect()
}
