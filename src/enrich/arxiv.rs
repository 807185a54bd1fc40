use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::Event;
use url::Url;

use super::{AbstractSource, Http, normalize_ws};
use crate::doi::Doi;

/// arXiv export API, for DataCite-registered arXiv DOIs (`10.48550/arXiv.<id>`).
pub struct Arxiv;

fn arxiv_id<'a>(doi: &Doi<'a>) -> Option<&'a str> {
    if doi.prefix() != "10.48550" {
        return None;
    }
    let suffix = doi.suffix();
    let (head, id) = suffix.split_at_checked(6)?;
    (head.eq_ignore_ascii_case("arxiv.") && !id.is_empty()).then_some(id)
}

impl AbstractSource for Arxiv {
    fn name(&self) -> &'static str {
        "arXiv"
    }

    fn accepts(&self, doi: &Doi<'_>) -> bool {
        arxiv_id(doi).is_some()
    }

    fn fetch(&self, http: &Http, doi: &Doi<'_>) -> anyhow::Result<Option<String>> {
        let Some(id) = arxiv_id(doi) else {
            return Ok(None);
        };
        let mut url = Url::parse("https://export.arxiv.org/api/query")?;
        url.query_pairs_mut()
            .append_pair("id_list", id)
            .append_pair("max_results", "1");
        parse_atom_summary(&http.get(&url)?)
    }
}

fn is_local(name: &[u8], target: &str) -> bool {
    // Compare local name ignoring namespace prefixes.
    match name.iter().rposition(|&b| b == b':') {
        Some(pos) => &name[pos + 1..] == target.as_bytes(),
        None => name == target.as_bytes(),
    }
}

/// The `<summary>` of the first `<entry>` in an Atom feed.
fn parse_atom_summary(xml: &str) -> anyhow::Result<Option<String>> {
    let mut reader = Reader::from_str(xml);

    let mut in_entry = false;
    let mut in_summary = false;
    let mut text = String::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                if is_local(e.name().as_ref(), "entry") {
                    in_entry = true;
                } else if in_entry && is_local(e.name().as_ref(), "summary") {
                    in_summary = true;
                    text.clear();
                }
            }
            Event::End(e) => {
                if is_local(e.name().as_ref(), "entry") {
                    break;
                } else if in_summary && is_local(e.name().as_ref(), "summary") {
                    let summary = normalize_ws(&text);
                    return Ok((!summary.is_empty()).then_some(summary));
                }
            }
            Event::Text(t) if in_summary => {
                text.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            Event::CData(t) if in_summary => {
                text.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            Event::GeneralRef(r) if in_summary => {
                if let Some(c) = r.resolve_char_ref()? {
                    text.push(c);
                } else {
                    let name = String::from_utf8_lossy(r.as_ref());
                    match resolve_xml_entity(&name) {
                        Some(resolved) => text.push_str(resolved),
                        None => {
                            text.push('&');
                            text.push_str(&name);
                            text.push(';');
                        }
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: id_list=1810.04805</title>
  <entry>
    <id>http://arxiv.org/abs/1810.04805v2</id>
    <title>BERT: Pre-training of Deep Bidirectional Transformers</title>
    <summary>  We introduce a new language
  representation model &lt;BERT&gt; for caf&#233; use.
</summary>
    <author><name>Jacob Devlin</name></author>
  </entry>
</feed>"#;

    #[test]
    fn reads_entry_summary_with_entities() {
        assert_eq!(
            parse_atom_summary(FEED).unwrap().as_deref(),
            Some("We introduce a new language representation model <BERT> for café use.")
        );
    }

    #[test]
    fn feed_without_entries_is_none() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert_eq!(parse_atom_summary(xml).unwrap(), None);
    }

    #[test]
    fn accepts_only_arxiv_datacite_dois() {
        let d = Doi::parse("10.48550/arXiv.1810.04805").unwrap();
        assert_eq!(arxiv_id(&d), Some("1810.04805"));
        assert!(Arxiv.accepts(&d));
        assert!(Arxiv.accepts(&Doi::parse("10.48550/ARXIV.2101.00001").unwrap()));
        assert!(!Arxiv.accepts(&Doi::parse("10.48550/zenodo.123").unwrap()));
        assert!(!Arxiv.accepts(&Doi::parse("10.1234/arXiv.1810.04805").unwrap()));
    }
}
