//! Build a bibliography from the works on an ORCID profile.
//!
//! DOIs are read from the public ORCID API, optionally confirmed against Crossref, and turned
//! into records through doi.org content negotiation (`Accept: application/x-bibtex`).

use std::{collections::HashSet, fmt, time::Duration};

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    bibliography::Bibliography,
    config::EnrichConfig,
    doi::Doi,
    enrich::{Http, Throttle},
    entry::Entry,
};

/// A checksum-validated ORCID iD (`0000-0002-1825-0097`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrcidId(String);

impl OrcidId {
    /// Accepts a bare iD or an `orcid.org` URL.
    pub fn parse(input: &str) -> Option<Self> {
        static ORCID_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(\d{4})-(\d{4})-(\d{4})-(\d{3}[\dX])$").unwrap());

        let s = input.trim().trim_end_matches('/');
        let s = s
            .strip_prefix("https://orcid.org/")
            .or_else(|| s.strip_prefix("http://orcid.org/"))
            .or_else(|| s.strip_prefix("orcid.org/"))
            .unwrap_or(s)
            .to_ascii_uppercase();
        if !ORCID_RE.is_match(&s) {
            return None;
        }
        let digits: Vec<char> = s.chars().filter(|c| *c != '-').collect();
        let (body, check) = digits.split_at(15);
        (check_digit(body) == check[0]).then_some(OrcidId(s))
    }

    pub fn works_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("https://pub.orcid.org/v3.0/{}/works", self.0))
    }
}

impl fmt::Display for OrcidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ISO 7064 MOD 11-2.
fn check_digit(body: &[char]) -> char {
    let total = body
        .iter()
        .filter_map(|c| c.to_digit(10))
        .fold(0u32, |acc, d| (acc + d) * 2);
    match (12 - total % 11) % 11 {
        10 => 'X',
        r => char::from_digit(r, 10).unwrap_or('0'),
    }
}

#[derive(Deserialize)]
struct Works {
    #[serde(default)]
    group: Vec<WorkGroup>,
}

#[derive(Deserialize)]
struct WorkGroup {
    #[serde(rename = "work-summary", default)]
    work_summary: Vec<WorkSummary>,
}

#[derive(Deserialize)]
struct WorkSummary {
    #[serde(rename = "external-ids", default)]
    external_ids: Option<ExternalIds>,
}

#[derive(Deserialize)]
struct ExternalIds {
    #[serde(rename = "external-id", default)]
    external_id: Vec<ExternalId>,
}

#[derive(Deserialize)]
struct ExternalId {
    #[serde(rename = "external-id-type", default)]
    id_type: String,
    #[serde(rename = "external-id-value", default)]
    value: String,
}

/// Distinct DOIs of an ORCID works listing, in listing order.
pub fn parse_works(body: &str) -> anyhow::Result<Vec<String>> {
    let works: Works = serde_json::from_str(body).context("invalid ORCID works response")?;
    let mut seen = HashSet::new();
    let dois = works
        .group
        .iter()
        .flat_map(|g| &g.work_summary)
        .filter_map(|w| w.external_ids.as_ref())
        .flat_map(|ids| &ids.external_id)
        .filter(|id| id.id_type.eq_ignore_ascii_case("doi"))
        .filter_map(|id| Doi::parse(&id.value).map(|d| d.to_string()))
        .filter(|doi| seen.insert(doi.to_ascii_lowercase()))
        .collect();
    Ok(dois)
}

#[derive(Deserialize)]
struct CrossrefList {
    message: CrossrefListMessage,
}

#[derive(Deserialize)]
struct CrossrefListMessage {
    #[serde(rename = "total-results")]
    total_results: u64,
}

fn parse_crossref_total(body: &str) -> anyhow::Result<u64> {
    let list: CrossrefList = serde_json::from_str(body).context("invalid Crossref response")?;
    Ok(list.message.total_results)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// DOIs on the profile.
    pub listed: usize,
    /// Dropped because Crossref does not know them.
    pub unconfirmed: usize,
    pub imported: usize,
    pub failed: usize,
}

pub struct Importer {
    http: Http,
    throttle: Throttle,
    confirm: bool,
}

impl Importer {
    pub fn new(config: &EnrichConfig, confirm: bool) -> Self {
        Importer {
            http: Http::new(config),
            throttle: Throttle::new(Duration::from_millis(config.delay_ms)),
            confirm,
        }
    }

    pub fn dois(&self, orcid: &OrcidId) -> anyhow::Result<Vec<String>> {
        let body = self
            .http
            .get_accepting(&orcid.works_url()?, "application/json")
            .with_context(|| format!("failed to list works for ORCID {orcid}"))?;
        parse_works(&body)
    }

    /// Whether Crossref has a record for `doi`.
    pub fn is_registered(&self, doi: &Doi<'_>) -> anyhow::Result<bool> {
        let mut url = Url::parse("https://api.crossref.org/works")?;
        url.query_pairs_mut()
            .append_pair("filter", &format!("doi:{doi}"));
        self.throttle.wait();
        Ok(parse_crossref_total(&self.http.get(&url)?)? > 0)
    }

    /// The record doi.org serves for `doi`.
    pub fn entry(&self, doi: &Doi<'_>) -> anyhow::Result<Entry> {
        self.throttle.wait();
        let body = self
            .http
            .get_accepting(&doi.to_url()?, "application/x-bibtex")
            .with_context(|| format!("failed to fetch BibTeX for {doi}"))?;
        Bibliography::parse(&body)
            .into_entries()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no record in BibTeX for {doi}"))
    }

    pub fn import(
        &self,
        orcid: &OrcidId,
        mut on_progress: impl FnMut(&str),
    ) -> anyhow::Result<(Vec<Entry>, ImportReport)> {
        let dois = self.dois(orcid)?;
        info!(%orcid, count = dois.len(), "listed works");
        let mut report = ImportReport {
            listed: dois.len(),
            ..ImportReport::default()
        };
        let mut entries = Vec::with_capacity(dois.len());

        for raw in &dois {
            on_progress(raw);
            let Some(doi) = Doi::parse(raw) else {
                continue;
            };
            if self.confirm {
                match self.is_registered(&doi) {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!(%doi, "not registered with Crossref");
                        report.unconfirmed += 1;
                        continue;
                    }
                    Err(err) => {
                        warn!(%doi, "{err:#}");
                        report.failed += 1;
                        continue;
                    }
                }
            }
            match self.entry(&doi) {
                Ok(entry) => {
                    report.imported += 1;
                    entries.push(entry);
                }
                Err(err) => {
                    warn!(%doi, "{err:#}");
                    report.failed += 1;
                }
            }
        }
        Ok((entries, report))
    }
}
