use std::fmt;

use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use url::Url;

const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A DOI split into its registrant prefix (`10.1234`) and suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doi<'a> {
    prefix: &'a str,
    suffix: &'a str,
}

impl<'a> Doi<'a> {
    /// Find a DOI in `identifier`, which may be bare, prefixed (`doi:`), a doi.org URL, or
    /// surrounded by prose.
    pub fn parse(identifier: &'a str) -> Option<Self> {
        let mut s = identifier.trim();

        // Normalise common textual prefixes.
        if let Some(rest) = s
            .strip_prefix("doi:")
            .or_else(|| s.strip_prefix("DOI:"))
            .or_else(|| s.strip_prefix("urn:doi:"))
            .or_else(|| s.strip_prefix("URN:DOI:"))
        {
            s = rest.trim_start();
        }

        // Drop query string or fragment early if present.
        if let Some(idx) = s.find(['?', '#']) {
            s = &s[..idx];
        }

        // Trim trailing punctuation commonly found in prose.
        s = s.trim_end_matches(|c: char| {
            matches!(c, '.' | ',' | ';' | ':' | ')' | ']' | '}' | '\"' | '\'' | '/')
        });

        // Case-insensitive, based on Crossref guidance.
        static DOI_ANYWHERE_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(?i)\b(10\.\d{4,9})/([-._;()/:A-Z0-9]+)\b").unwrap());

        let caps = DOI_ANYWHERE_RE.captures(s)?;
        Some(Doi {
            prefix: caps.get(1)?.as_str(),
            suffix: caps.get(2)?.as_str(),
        })
    }

    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    pub fn suffix(&self) -> &'a str {
        self.suffix
    }

    /// `prefix/suffix` with the suffix percent-encoded for use in a URL path.
    pub fn encoded_path(&self) -> String {
        let enc_suffix = utf8_percent_encode(self.suffix, PATH_SEGMENT_ENCODE_SET).to_string();
        format!("{}/{}", self.prefix, enc_suffix)
    }

    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("https://doi.org/{}", self.encoded_path()))
    }
}

impl fmt::Display for Doi<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::Strategy;

    fn doi_suffix_char() -> impl Strategy<Value = char> {
        let uppers = proptest::sample::select(('A'..='Z').collect::<Vec<_>>());
        let lowers = proptest::sample::select(('a'..='z').collect::<Vec<_>>());
        let digits = proptest::sample::select(('0'..='9').collect::<Vec<_>>());
        let punct = proptest::sample::select(vec!['-', '.', '_', ';', '(', ')', '/', ':']);
        proptest::prop_oneof![uppers, lowers, digits, punct]
    }

    // Ends with an alphanumeric to satisfy the trailing \b.
    fn doi_suffix(min: usize, max: usize) -> impl Strategy<Value = String> {
        let last = proptest::prop_oneof![
            proptest::sample::select(('A'..='Z').collect::<Vec<_>>()),
            proptest::sample::select(('a'..='z').collect::<Vec<_>>()),
            proptest::sample::select(('0'..='9').collect::<Vec<_>>()),
        ];
        (min..=max).prop_flat_map(move |len| {
            (
                proptest::collection::vec(doi_suffix_char(), len - 1),
                last.clone(),
            )
                .prop_map(|(mut v, last)| {
                    v.push(last);
                    v.into_iter().collect::<String>()
                })
        })
    }

    fn doi_core() -> impl Strategy<Value = (String, String, String)> {
        (
            proptest::collection::vec(
                proptest::sample::select(('0'..='9').collect::<Vec<_>>()),
                4..=9,
            )
            .prop_map(|v| v.into_iter().collect::<String>()),
            doi_suffix(1, 64),
        )
            .prop_map(|(digits, suffix)| {
                let prefix = format!("10.{digits}");
                let full = format!("{prefix}/{suffix}");
                (full, prefix, suffix)
            })
    }

    #[test]
    fn parse_finds_generated_doi() {
        proptest::proptest!(|(t in doi_core())| {
            let (full, prefix, suffix) = t;
            let d = Doi::parse(&full).expect("should parse");
            proptest::prop_assert_eq!(d.prefix(), prefix);
            proptest::prop_assert_eq!(d.suffix(), suffix);
        })
    }

    #[test]
    fn parse_with_prefixes_and_urls() {
        proptest::proptest!(|(t in doi_core(), pre in proptest::sample::select(vec!["doi:", "DOI:", "urn:doi:", "https://doi.org/", "http://dx.doi.org/"]))| {
            let (full, prefix, suffix) = t;
            let decorated = format!("{pre}{full}");
            let d = Doi::parse(&decorated).expect("should parse decorated DOI");
            proptest::prop_assert_eq!(d.prefix(), prefix);
            proptest::prop_assert_eq!(d.suffix(), suffix);
        })
    }

    #[test]
    fn parse_ignores_query_and_trailing_punctuation() {
        let d = Doi::parse("https://doi.org/10.1101/2020.01.01.123456?versioned=true").unwrap();
        assert_eq!(d.to_string(), "10.1101/2020.01.01.123456");
        let d = Doi::parse("see 10.1234/abc.").unwrap();
        assert_eq!(d.to_string(), "10.1234/abc");
    }

    #[test]
    fn parse_rejects_non_doi() {
        proptest::proptest!(|(s in "[A-Za-z0-9 _-]{1,64}")| {
            proptest::prop_assume!(!s.contains("10."));
            proptest::prop_assert!(Doi::parse(&s).is_none());
        });
        assert!(Doi::parse("arXiv:1234.5678").is_none());
    }

    #[test]
    fn suffix_stops_at_unsupported_characters() {
        let d = Doi::parse("10.1002/(SICI)1097-4636<1::AID>3.0.CO;2-X").unwrap();
        assert_eq!(d.suffix(), "(SICI)1097-4636");
    }

    #[test]
    fn to_url_points_at_doi_org() {
        let d = Doi::parse("10.48550/arXiv.1810.04805").unwrap();
        let url = d.to_url().unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.domain(), Some("doi.org"));
        assert_eq!(url.path(), "/10.48550/arXiv.1810.04805");
    }
}
