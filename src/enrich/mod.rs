//! Fetch missing abstracts from external metadata services.
//!
//! Sources are tried in priority order per DOI; the first non-empty abstract wins. Entries are
//! never modified: enriched entries are new copies made with [`Entry::with_abstract`].

use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::EnrichConfig, doi::Doi, entry::Entry};

mod arxiv;
mod biorxiv;
mod crossref;
mod semantic_scholar;

pub use arxiv::Arxiv;
pub use biorxiv::Biorxiv;
pub use crossref::Crossref;
pub use semantic_scholar::SemanticScholar;

/// Blocking HTTP client shared by all sources.
pub struct Http {
    agent: ureq::Agent,
    user_agent: String,
}

impl Http {
    pub fn new(config: &EnrichConfig) -> Self {
        let cfg = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(5)))
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();
        Http {
            agent: ureq::Agent::new_with_config(cfg),
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn get(&self, url: &Url) -> anyhow::Result<String> {
        self.get_accepting(url, "*/*")
    }

    /// GET with an explicit `Accept` header, for content negotiation.
    pub fn get_accepting(&self, url: &Url, accept: &str) -> anyhow::Result<String> {
        let body = self
            .agent
            .get(url.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", accept)
            .call()
            .with_context(|| format!("request to {url} failed"))?
            .into_body()
            .read_to_string()
            .context("failed to read response body")?;
        Ok(body)
    }
}

/// Keeps consecutive requests at least `delay` apart.
pub struct Throttle {
    delay: Duration,
    last: Cell<Option<Instant>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Throttle {
            delay,
            last: Cell::new(None),
        }
    }

    /// Sleep until `delay` has passed since the previous call.
    pub fn wait(&self) {
        if let Some(last) = self.last.get() {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
        self.last.set(Some(Instant::now()));
    }
}

pub trait AbstractSource {
    fn name(&self) -> &'static str;

    /// Whether this source can know about `doi` at all.
    fn accepts(&self, _doi: &Doi<'_>) -> bool {
        true
    }

    fn fetch(&self, http: &Http, doi: &Doi<'_>) -> anyhow::Result<Option<String>>;
}

/// Default sources.
///
/// NOTE: Ordering is important here, as it signifies priority.
pub fn default_sources() -> Vec<Box<dyn AbstractSource>> {
    vec![
        Box::new(Crossref),
        Box::new(SemanticScholar),
        Box::new(Biorxiv),
        Box::new(Arxiv),
    ]
}

pub struct Scraper {
    http: Http,
    sources: Vec<Box<dyn AbstractSource>>,
    throttle: Throttle,
}

impl Scraper {
    pub fn new(config: &EnrichConfig) -> Self {
        Self::with_sources(
            Http::new(config),
            default_sources(),
            Duration::from_millis(config.delay_ms),
        )
    }

    pub fn with_sources(
        http: Http,
        sources: Vec<Box<dyn AbstractSource>>,
        delay: Duration,
    ) -> Self {
        Scraper {
            http,
            sources,
            throttle: Throttle::new(delay),
        }
    }

    /// Ask each accepting source in turn. Consecutive requests are at least `delay` apart, also
    /// when they belong to different DOIs.
    pub fn scrape(&self, doi: &Doi<'_>) -> Option<String> {
        info!(%doi, "scraping abstract");
        for source in self.sources.iter().filter(|s| s.accepts(doi)) {
            self.throttle.wait();
            match source.fetch(&self.http, doi) {
                Ok(Some(text)) => {
                    info!(source = source.name(), "found abstract");
                    return Some(text);
                }
                Ok(None) => debug!(source = source.name(), "no abstract"),
                Err(err) => warn!(source = source.name(), "{err:#}"),
            }
        }
        info!(%doi, "no abstract found from any source");
        None
    }
}

/// The entry's DOI, falling back to one embedded in its URL.
pub fn entry_doi(entry: &Entry) -> Option<Doi<'_>> {
    entry
        .doi()
        .and_then(Doi::parse)
        .or_else(|| entry.url().and_then(Doi::parse))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichReport {
    pub total: usize,
    pub with_doi: usize,
    /// Entries with a DOI but no abstract.
    pub needing: usize,
    pub found: usize,
}

/// Copy `entries`, attaching abstracts returned by `lookup` to those that lack one.
///
/// `on_progress` is called once per entry, after it has been handled.
pub fn enrich(
    entries: &[Entry],
    mut lookup: impl FnMut(&Doi<'_>) -> Option<String>,
    mut on_progress: impl FnMut(&Entry),
) -> (Vec<Entry>, EnrichReport) {
    let mut report = EnrichReport {
        total: entries.len(),
        ..EnrichReport::default()
    };
    let mut enriched = Vec::with_capacity(entries.len());

    for entry in entries {
        let doi = entry_doi(entry);
        if doi.is_some() {
            report.with_doi += 1;
        }
        let updated = match (doi, entry.abstract_text()) {
            (Some(doi), None) => {
                report.needing += 1;
                match lookup(&doi) {
                    Some(text) if !text.trim().is_empty() => {
                        report.found += 1;
                        entry.with_abstract(text)
                    }
                    _ => entry.clone(),
                }
            }
            _ => entry.clone(),
        };
        on_progress(&updated);
        enriched.push(updated);
    }
    (enriched, report)
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Plain text from an abstract that may carry JATS/HTML markup.
pub(crate) fn clean_abstract(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, " ");
    let text = quick_xml::escape::unescape(&stripped)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| stripped.into_owned());
    let text = normalize_ws(&text);
    match text.strip_prefix("Abstract ") {
        Some(rest) => rest.trim_start().to_string(),
        None => text,
    }
}

pub(crate) fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
