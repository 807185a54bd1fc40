use crate::{author::Author, fields::Fields, render};

/// Fields only articles (and records of unknown type) carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFields {
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub number: Option<String>,
    pub pages: Option<String>,
    pub issn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InProceedingsFields {
    pub booktitle: Option<String>,
    pub pages: Option<String>,
    pub editor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechReportFields {
    pub institution: Option<String>,
    /// The record's `type` field.
    pub report_type: Option<String>,
}

/// Record kind with its variant-specific fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Any record type we have no dedicated variant for. Displays like an article and keeps the
    /// type name it was read with.
    Generic {
        record_type: String,
        fields: ArticleFields,
    },
    Article(ArticleFields),
    InProceedings(InProceedingsFields),
    TechReport(TechReportFields),
}

impl EntryKind {
    /// Dispatch on the record type name (case-insensitive).
    pub fn from_fields(record_type: &str, fields: &Fields) -> Self {
        let article = || ArticleFields {
            journal: optional(fields, "journal"),
            volume: optional(fields, "volume"),
            number: optional(fields, "number"),
            pages: optional(fields, "pages"),
            issn: optional(fields, "issn"),
        };
        match record_type.to_lowercase().as_str() {
            "article" => EntryKind::Article(article()),
            "inproceedings" => EntryKind::InProceedings(InProceedingsFields {
                booktitle: optional(fields, "booktitle"),
                pages: optional(fields, "pages"),
                editor: optional(fields, "editor"),
            }),
            "techreport" => EntryKind::TechReport(TechReportFields {
                institution: optional(fields, "institution"),
                report_type: optional(fields, "type"),
            }),
            other => EntryKind::Generic {
                record_type: other.to_string(),
                fields: article(),
            },
        }
    }

    /// Type name used when writing the record back out.
    pub fn record_type(&self) -> &str {
        match self {
            EntryKind::Generic { record_type, .. } => record_type,
            EntryKind::Article(_) => "article",
            EntryKind::InProceedings(_) => "inproceedings",
            EntryKind::TechReport(_) => "techreport",
        }
    }

    fn source_line(&self) -> Option<String> {
        let (venue, volume, number) = match self {
            EntryKind::Generic { fields: a, .. } | EntryKind::Article(a) => (
                a.journal.as_deref(),
                a.volume.as_deref(),
                a.number.as_deref(),
            ),
            EntryKind::InProceedings(p) => (p.booktitle.as_deref(), None, None),
            EntryKind::TechReport(t) => (t.institution.as_deref(), None, None),
        };

        let mut line = venue.unwrap_or_default().to_string();
        if let Some(v) = volume {
            push_segment(&mut line, &format!("Vol. {v}"));
        }
        if let Some(n) = number {
            if volume.is_some() {
                line.push_str(&format!(" No. {n}"));
            } else {
                push_segment(&mut line, &format!("No. {n}"));
            }
        }
        (!line.is_empty()).then_some(line)
    }
}

fn push_segment(line: &mut String, segment: &str) {
    if !line.is_empty() {
        line.push_str(" | ");
    }
    line.push_str(segment);
}

/// Non-empty field value, if present.
fn optional(fields: &Fields, name: &str) -> Option<String> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A parsed bibliography record. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    title: String,
    authors: Vec<Author>,
    year: i32,
    month: Option<String>,
    url: Option<String>,
    doi: Option<String>,
    publisher: Option<String>,
    abstract_: Option<String>,
    topic: Option<String>,
    kind: EntryKind,
    source_line: Option<String>,
}

impl Entry {
    pub fn from_fields(record_type: &str, key: &str, fields: &Fields) -> Self {
        let authors = fields
            .get("author")
            .map(|raw| {
                // Collapse line breaks so " and " splits names wrapped over several lines.
                let raw = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                raw.split(" and ")
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(Author::parse)
                    .collect()
            })
            .unwrap_or_default();

        let year = fields
            .get("year")
            .and_then(|y| y.trim().parse::<i32>().ok())
            .unwrap_or(0);

        let kind = EntryKind::from_fields(record_type, fields);
        let source_line = kind.source_line();

        Entry {
            key: key.trim().to_string(),
            title: fields.get("title").cloned().unwrap_or_default(),
            authors,
            year,
            month: optional(fields, "month"),
            url: optional(fields, "url"),
            doi: optional(fields, "doi"),
            publisher: optional(fields, "publisher"),
            abstract_: optional(fields, "abstract"),
            topic: optional(fields, "topic"),
            kind,
            source_line,
        }
    }

    /// A copy of this entry carrying `abstract_text` instead of its current abstract.
    pub fn with_abstract(&self, abstract_text: impl Into<String>) -> Self {
        let abstract_text = abstract_text.into();
        let abstract_text = abstract_text.trim();
        Entry {
            abstract_: (!abstract_text.is_empty()).then(|| abstract_text.to_string()),
            ..self.clone()
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Publication year, `0` when missing or unparsable.
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_.as_deref()
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    /// Venue with volume and number, e.g. `"Nature | Vol. 5 No. 2"`.
    pub fn source_line(&self) -> Option<&str> {
        self.source_line.as_deref()
    }

    /// HTML fragment for this entry, highlighting the first author matching `match_author`.
    pub fn render(&self, match_author: Option<&str>) -> String {
        render::entry_element(self, match_author).to_string()
    }
}
