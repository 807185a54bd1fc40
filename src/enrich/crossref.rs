use anyhow::Context;
use serde::Deserialize;
use url::Url;

use super::{AbstractSource, Http, clean_abstract};
use crate::doi::Doi;

/// `api.crossref.org/works/{doi}`. Abstracts come as JATS markup.
pub struct Crossref;

#[derive(Deserialize)]
struct WorkResponse {
    message: Work,
}

#[derive(Deserialize)]
struct Work {
    #[serde(rename = "abstract")]
    abstract_: Option<String>,
}

impl AbstractSource for Crossref {
    fn name(&self) -> &'static str {
        "Crossref"
    }

    fn fetch(&self, http: &Http, doi: &Doi<'_>) -> anyhow::Result<Option<String>> {
        let url = Url::parse(&format!(
            "https://api.crossref.org/works/{}",
            doi.encoded_path()
        ))?;
        parse_response(&http.get(&url)?)
    }
}

fn parse_response(body: &str) -> anyhow::Result<Option<String>> {
    let work: WorkResponse = serde_json::from_str(body).context("invalid Crossref response")?;
    Ok(work
        .message
        .abstract_
        .map(|a| clean_abstract(&a))
        .filter(|a| !a.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_cleans_abstract() {
        let body = r#"{"status":"ok","message":{"DOI":"10.1234/abc","abstract":"<jats:p>Short &lt;summary&gt;.</jats:p>"}}"#;
        assert_eq!(
            parse_response(body).unwrap().as_deref(),
            Some("Short <summary>.")
        );
    }

    #[test]
    fn missing_or_blank_abstract_is_none() {
        assert_eq!(parse_response(r#"{"message":{"DOI":"x"}}"#).unwrap(), None);
        assert_eq!(
            parse_response(r#"{"message":{"abstract":"<jats:p> </jats:p>"}}"#).unwrap(),
            None
        );
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_response("Resource not found.").is_err());
    }
}
