use std::fmt;

use crate::html;

/// A single author, split into family and given name.
///
/// Names come in as `"Last, First"`. Anything that does not split into exactly two parts on
/// `", "` is kept whole as the last name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Author {
    first_name: String,
    last_name: String,
}

impl Author {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Author {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split(", ").collect();
        match parts.as_slice() {
            [last, first] => Author::new(first.trim(), last.trim()),
            _ => Author::new("", raw),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Given name first, e.g. `"Sarai M. Keestra"`.
    pub fn natural_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    /// Case-insensitive substring match against either name order. An empty needle never matches.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.to_string().to_lowercase().contains(&needle)
            || self.natural_name().to_lowercase().contains(&needle)
    }

    /// Escaped `"{last}, {first}"`, wrapped in a highlight marker when `highlight` matches.
    pub fn render(&self, highlight: Option<&str>) -> String {
        let name = html::escape(&self.to_string());
        match highlight {
            Some(needle) if self.matches(needle) => {
                format!("<strong class=\"author-highlight\">{name}</strong>")
            }
            _ => name,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_name.is_empty() {
            f.write_str(&self.last_name)
        } else {
            write!(f, "{}, {}", self.last_name, self.first_name)
        }
    }
}
