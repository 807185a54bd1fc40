//! Tokenizer for the body of a single record.
//!
//! A body is a run of `name = {value}` or `name = value` pairs. Braced values may span commas and
//! lines but end at the first `}`; nested braces are not supported. Anything that matches neither
//! form is skipped without error, so malformed fragments are silently lost.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Field name (lowercase) to trimmed value, in first-seen order.
pub type Fields = IndexMap<String, String>;

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+)\s*=\s*\{([^}]*)\}|(\w+)\s*=\s*([^,\n]+)").unwrap()
});

pub fn parse_fields(body: &str) -> Fields {
    let mut fields = Fields::new();
    for caps in FIELD_RE.captures_iter(body) {
        let (name, value) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
            (Some(name), Some(value), _, _) => (name, value),
            (_, _, Some(name), Some(value)) => (name, value),
            _ => continue,
        };
        let value = value
            .as_str()
            .trim()
            .trim_matches(|c| c == '{' || c == '}')
            .trim();
        // Later duplicates win.
        fields.insert(name.as_str().to_lowercase(), value.to_string());
    }
    fields
}
