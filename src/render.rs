//! Presentation state derived from entries, and the markup built from it.

use crate::{
    author::Author, bibliography::Bibliography, config::ReferencesConfig, entry::Entry,
    html::Element,
};

/// Abstracts longer than this many characters are cut down to a preview.
pub const ABSTRACT_PREVIEW_CHARS: usize = 200;
pub const TRUNCATION_MARKER: &str = "…";
/// Strongest fade applied to an author.
pub const MAX_FADE_TIER: usize = 3;
/// Author lists longer than this collapse their interior.
pub const COLLAPSE_ABOVE: usize = 3;

/// CSS class for a topic: the part before the first `&`, trimmed, hyphenated, lowercase.
pub fn topic_class_name(topic: &str) -> String {
    topic
        .split('&')
        .next()
        .unwrap_or_default()
        .trim()
        .replace(' ', "-")
        .to_lowercase()
}

/// Whether the entry gets citation-metric badges.
pub fn has_score(entry: &Entry) -> bool {
    entry.doi().is_some_and(|doi| doi.starts_with("10."))
}

pub fn title_href(entry: &Entry) -> String {
    match (entry.url(), entry.doi()) {
        (Some(url), _) => url.to_string(),
        (None, Some(doi)) => format!("https://doi.org/{doi}"),
        (None, None) => "#".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// How one author is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorSlot {
    pub matched: bool,
    /// Fade tier, `0` for fully visible.
    pub fade: usize,
    /// Position relative to the matched author, if any.
    pub side: Option<Side>,
    /// Hidden until the list is expanded.
    pub collapsed: bool,
    /// Followed by an ellipsis standing in for a collapsed run.
    pub ellipsis_after: bool,
}

/// Emphasis for an author list.
///
/// Without a match the first and last authors are fully visible and interior authors fade with
/// their distance to the nearest edge. With a match the list splits into the authors before and
/// after the matched one, each fading with its distance from the match. Lists longer than
/// [`COLLAPSE_ABOVE`] collapse every author that is neither an edge nor the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorLayout {
    slots: Vec<AuthorSlot>,
    matched_index: Option<usize>,
    expandable: bool,
}

impl AuthorLayout {
    pub fn compute(authors: &[Author], match_author: Option<&str>) -> Self {
        let n = authors.len();
        let matched_index =
            match_author.and_then(|needle| authors.iter().position(|a| a.matches(needle)));
        let expandable = n > COLLAPSE_ABOVE;

        let mut slots: Vec<AuthorSlot> = (0..n)
            .map(|i| {
                let edge = i == 0 || i + 1 == n;
                let matched = matched_index == Some(i);
                let (fade, side) = match matched_index {
                    Some(m) if m == i => (0, None),
                    Some(m) => (
                        i.abs_diff(m).min(MAX_FADE_TIER),
                        Some(if i < m { Side::Before } else { Side::After }),
                    ),
                    None if edge => (0, None),
                    None => (i.min(n - 1 - i).min(MAX_FADE_TIER), None),
                };
                AuthorSlot {
                    matched,
                    fade,
                    side,
                    collapsed: expandable && !edge && !matched,
                    ellipsis_after: false,
                }
            })
            .collect();

        for i in 1..n {
            if slots[i].collapsed && !slots[i - 1].collapsed {
                slots[i - 1].ellipsis_after = true;
            }
        }

        AuthorLayout {
            slots,
            matched_index,
            expandable,
        }
    }

    pub fn slots(&self) -> &[AuthorSlot] {
        &self.slots
    }

    pub fn matched_index(&self) -> Option<usize> {
        self.matched_index
    }

    pub fn is_expandable(&self) -> bool {
        self.expandable
    }

    /// Percentage offset of the matched author along the list.
    pub fn match_position(&self) -> Option<f64> {
        let m = self.matched_index?;
        let n = self.slots.len();
        if n <= 1 {
            return Some(0.0);
        }
        Some(m as f64 / (n - 1) as f64 * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbstractView<'a> {
    Full(&'a str),
    Truncated { preview: String, full: &'a str },
}

impl<'a> AbstractView<'a> {
    pub fn new(text: &'a str) -> Self {
        if text.chars().count() <= ABSTRACT_PREVIEW_CHARS {
            return AbstractView::Full(text);
        }
        let mut preview: String = text.chars().take(ABSTRACT_PREVIEW_CHARS).collect();
        preview.push_str(TRUNCATION_MARKER);
        AbstractView::Truncated {
            preview,
            full: text,
        }
    }
}

fn authors_element(authors: &[Author], match_author: Option<&str>) -> Option<Element> {
    if authors.is_empty() {
        return None;
    }
    let layout = AuthorLayout::compute(authors, match_author);
    let last = authors.len() - 1;

    let mut el = Element::div()
        .class("authors")
        .attr("onClick", "this.classList.add('expanded')");
    if !layout.is_expandable() {
        el = el.class("expanded");
    }
    if let (Some(m), Some(pos)) = (layout.matched_index(), layout.match_position()) {
        el = el
            .attr("data-match-index", m.to_string())
            .attr("style", format!("--match-position: {pos:.1}%"));
    }

    for (i, (author, slot)) in authors.iter().zip(layout.slots()).enumerate() {
        let mut name = author.render(if slot.matched { match_author } else { None });
        if i != last {
            name.push(';');
        }
        let visibility = if slot.matched {
            "author-match"
        } else if slot.collapsed {
            "author-toggle"
        } else {
            "author-visible"
        };
        let side = match slot.side {
            Some(Side::Before) => "author-before",
            Some(Side::After) => "author-after",
            None => "",
        };
        let mut span = Element::span().class(visibility).class(side);
        if slot.fade > 0 {
            span = span.class(format!("fade-{}", slot.fade));
        }
        el = el.child(span.raw(name));
        if slot.ellipsis_after {
            el = el.child(Element::span().class("author-ellipsis").text("..."));
        }
    }
    Some(el)
}

fn abstract_element(text: Option<&str>) -> Option<Element> {
    let el = match AbstractView::new(text?) {
        AbstractView::Full(full) => Element::div()
            .class("abstract")
            .child(Element::div().class("abstract-text").text(full)),
        AbstractView::Truncated { preview, full } => Element::div()
            .class("abstract")
            .class("truncated")
            .child(Element::div().class("abstract-preview").text(preview))
            .child(Element::div().class("abstract-full").text(full))
            .child(
                Element::span()
                    .class("abstract-more")
                    .attr("onClick", "this.parentElement.classList.toggle('truncated')")
                    .text("show more"),
            ),
    };
    Some(el)
}

/// Dimensions, Altmetric and PlumX widgets. Only for entries with a score.
fn badges_element(entry: &Entry) -> Option<Element> {
    let doi = entry.doi().filter(|_| has_score(entry))?;
    Some(
        Element::div()
            .class("badges")
            .child(
                Element::span()
                    .class("__dimensions_badge_embed__")
                    .attr("data-doi", doi)
                    .attr("data-legend", "hover-right")
                    .attr("data-style", "small_circle"),
            )
            .child(
                Element::div()
                    .class("altmetric-embed")
                    .attr("data-badge-type", "donut")
                    .attr("data-badge-popover", "right")
                    .attr("data-doi", doi),
            )
            .child(
                Element::link(format!("https://plu.mx/plum/a/?doi={doi}"))
                    .class("plumx-plum-print-popup")
                    .attr("data-popup", "right")
                    .attr("data-size", "medium")
                    .attr("data-site", "plum")
                    .attr("data-hide-when-empty", "true"),
            ),
    )
}

pub fn entry_element(entry: &Entry, match_author: Option<&str>) -> Element {
    let score_class = if has_score(entry) {
        "with-score"
    } else {
        "no-score"
    };
    let year = match entry.year() {
        0 => String::new(),
        y => y.to_string(),
    };

    let aside = Element::new("aside")
        .child(Element::div().class("year").text(year))
        .child_opt(badges_element(entry));

    let source = Element::div()
        .class("source")
        .child_opt(entry.source_line().map(|s| Element::span().text(s)))
        .child_opt(entry.doi().map(|doi| {
            Element::link(format!("https://doi.org/{doi}"))
                .class("doi")
                .text(doi)
        }));

    Element::div()
        .class("reference")
        .class(score_class)
        .class(entry.topic().map(topic_class_name).unwrap_or_default())
        .child(aside)
        .child(source)
        .child_opt(entry.topic().map(|t| Element::span().class("topic").text(t)))
        .child(
            Element::div()
                .class("title")
                .child(Element::link(title_href(entry)).text(entry.title())),
        )
        .child_opt(authors_element(entry.authors(), match_author))
        .child_opt(abstract_element(entry.abstract_text()))
}

/// Renders entries and the publications section with the configured author and topics.
pub struct Renderer<'a> {
    config: &'a ReferencesConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a ReferencesConfig) -> Self {
        Renderer { config }
    }

    pub fn entry(&self, entry: &Entry) -> String {
        entry.render(self.config.match_author())
    }

    pub fn section(&self, bibliography: &Bibliography) -> String {
        Element::new("section")
            .class("publications")
            .child(Element::new("h2").text("Publications"))
            .child_opt(self.topic_tags())
            .children(self.topic_descriptions())
            .children(
                bibliography
                    .iter()
                    .map(|e| entry_element(e, self.config.match_author())),
            )
            .to_string()
    }

    fn topic_tags(&self) -> Option<Element> {
        if self.config.topics.is_empty() {
            return None;
        }
        Some(
            Element::div()
                .class("topic-tags")
                .children(self.config.topics.keys().map(|topic| {
                    let class = topic_class_name(topic);
                    Element::span()
                        .class("active")
                        .class(class.clone())
                        .attr("data-topic", class)
                        .text(topic.clone())
                })),
        )
    }

    fn topic_descriptions(&self) -> Vec<Element> {
        self.config
            .topics
            .iter()
            .map(|(topic, description)| {
                Element::new("p")
                    .class("topic-desc")
                    .class("hidden")
                    .class(topic_class_name(topic))
                    .text(description.clone())
            })
            .collect()
    }
}
