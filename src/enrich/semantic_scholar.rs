use anyhow::Context;
use serde::Deserialize;
use url::Url;

use super::{AbstractSource, Http, normalize_ws};
use crate::doi::Doi;

/// Semantic Scholar Graph API, looked up by `DOI:` identifier.
pub struct SemanticScholar;

#[derive(Deserialize)]
struct Paper {
    #[serde(rename = "abstract")]
    abstract_: Option<String>,
}

impl AbstractSource for SemanticScholar {
    fn name(&self) -> &'static str {
        "Semantic Scholar"
    }

    fn fetch(&self, http: &Http, doi: &Doi<'_>) -> anyhow::Result<Option<String>> {
        let mut url = Url::parse(&format!(
            "https://api.semanticscholar.org/graph/v1/paper/DOI:{}",
            doi.encoded_path()
        ))?;
        url.query_pairs_mut().append_pair("fields", "abstract");
        parse_response(&http.get(&url)?)
    }
}

fn parse_response(body: &str) -> anyhow::Result<Option<String>> {
    let paper: Paper =
        serde_json::from_str(body).context("invalid Semantic Scholar response")?;
    Ok(paper
        .abstract_
        .map(|a| normalize_ws(&a))
        .filter(|a| !a.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_abstract() {
        let body = r#"{"paperId":"abc","abstract":"We study  things."}"#;
        assert_eq!(
            parse_response(body).unwrap().as_deref(),
            Some("We study things.")
        );
    }

    #[test]
    fn null_abstract_is_none() {
        assert_eq!(
            parse_response(r#"{"paperId":"abc","abstract":null}"#).unwrap(),
            None
        );
    }
}
