use anyhow::Context;
use serde::Deserialize;
use url::Url;

use super::{AbstractSource, Http, normalize_ws};
use crate::doi::Doi;

/// bioRxiv details API. Only knows Cold Spring Harbor (`10.1101`) DOIs.
pub struct Biorxiv;

#[derive(Deserialize)]
struct Details {
    #[serde(default)]
    collection: Vec<Preprint>,
}

#[derive(Deserialize)]
struct Preprint {
    #[serde(rename = "abstract", default)]
    abstract_: String,
}

impl AbstractSource for Biorxiv {
    fn name(&self) -> &'static str {
        "bioRxiv"
    }

    fn accepts(&self, doi: &Doi<'_>) -> bool {
        doi.prefix() == "10.1101"
    }

    fn fetch(&self, http: &Http, doi: &Doi<'_>) -> anyhow::Result<Option<String>> {
        let url = Url::parse(&format!(
            "https://api.biorxiv.org/details/biorxiv/{}",
            doi.encoded_path()
        ))?;
        parse_response(&http.get(&url)?)
    }
}

fn parse_response(body: &str) -> anyhow::Result<Option<String>> {
    let details: Details = serde_json::from_str(body).context("invalid bioRxiv response")?;
    Ok(details
        .collection
        .first()
        .map(|p| normalize_ws(&p.abstract_))
        .filter(|a| !a.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_accepts_cshl_prefix() {
        assert!(Biorxiv.accepts(&Doi::parse("10.1101/2020.03.01.123456").unwrap()));
        assert!(!Biorxiv.accepts(&Doi::parse("10.1234/abc").unwrap()));
    }

    #[test]
    fn reads_first_collection_item() {
        let body = r#"{"messages":[{"status":"ok"}],"collection":[{"doi":"10.1101/x","abstract":"First version."},{"abstract":"Second."}]}"#;
        assert_eq!(
            parse_response(body).unwrap().as_deref(),
            Some("First version.")
        );
    }

    #[test]
    fn empty_collection_is_none() {
        assert_eq!(
            parse_response(r#"{"messages":[{"status":"no posts found"}],"collection":[]}"#)
                .unwrap(),
            None
        );
    }
}
