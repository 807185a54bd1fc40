//! Config-driven page sections rendered ahead of the publications.

use crate::{
    config::{Config, EducationConfig, MediaConfig, NemoConfig, NemoLinkConfig},
    html::Element,
};

fn logo(file: &str, alt: impl Into<String>) -> Element {
    Element::img(format!("logos/{file}"), alt)
}

/// Featured outlets, the NEMO Kennislink box and media appearances. `None` when the config
/// has none of them.
pub fn science_communication(config: &Config) -> Option<Element> {
    if config.featured_media.is_empty() && config.nemo.is_none() && config.media.is_empty() {
        return None;
    }

    let featured = (!config.featured_media.is_empty()).then(|| {
        Element::div().class("featured-media").children(
            config.featured_media.iter().map(|m| {
                Element::link(&m.url).child(logo(&m.logo, format!("{} logo", m.name)))
            }),
        )
    });
    let nemo = config
        .nemo
        .as_ref()
        .map(|nemo| nemo_box(nemo, &config.nemo_links));
    let media = (!config.media.is_empty()).then(|| media_block(&config.media));

    Some(
        Element::new("section")
            .class("science-communication")
            .child(Element::new("h2").text("Science Communication"))
            .child_opt(featured)
            .child_opt(nemo)
            .child_opt(media),
    )
}

fn nemo_box(nemo: &NemoConfig, links: &[NemoLinkConfig]) -> Element {
    let mut block = Element::div()
        .class("nemo-box")
        .child(Element::link(&nemo.url).child(logo(&nemo.logo, format!("{} logo", nemo.title))))
        .child(Element::new("p").text(&nemo.description));
    for link in links {
        block = block
            .child(
                Element::div()
                    .child(Element::link(&link.url).text(&link.title_en))
                    .child(Element::span().text(link.year.to_string())),
            )
            .child(Element::link(&link.url).text(&link.title));
    }
    block
}

fn media_block(media: &[MediaConfig]) -> Element {
    Element::div()
        .class("media")
        .child(Element::new("h3").text("Media appearances"))
        .children(media.iter().map(|m| {
            let title = match m.url.as_deref().filter(|u| !u.trim().is_empty()) {
                Some(url) => Element::link(url).text(&m.title),
                None => Element::span().text(&m.title),
            };
            Element::div().child(title).child(
                Element::div()
                    .child(Element::span().text(&m.outlet))
                    .child(Element::span().text(m.year.to_string())),
            )
        }))
}

/// Education cards in config order. `None` without any.
pub fn education(education: &[EducationConfig]) -> Option<Element> {
    if education.is_empty() {
        return None;
    }
    Some(
        Element::new("section")
            .class("education")
            .child(Element::new("h2").text("Education"))
            .child(Element::div().children(education.iter().map(education_card)))
            .child(Element::new("p").text("← Swipe left to see earlier education")),
    )
}

fn education_card(edu: &EducationConfig) -> Element {
    let institution = Element::div()
        .class("institution")
        .child(
            Element::div()
                .child(Element::new("p").text(&edu.institution))
                .child(Element::new("p").class("years").text(&edu.years)),
        )
        .child_opt(
            edu.logo
                .as_deref()
                .map(|file| logo(file, format!("{} logo", edu.institution))),
        );

    let paragraph = |class: &str, text: String| Element::new("p").class(class).text(text);
    Element::div()
        .child(institution)
        .child(Element::new("h3").class("degree").text(&edu.degree))
        .child_opt(
            edu.description
                .as_ref()
                .map(|d| paragraph("description", d.clone())),
        )
        .child_opt(
            edu.thesis
                .as_ref()
                .map(|t| paragraph("thesis", format!("Thesis: {t}"))),
        )
        .child_opt((!edu.supervisors.is_empty()).then(|| {
            paragraph(
                "supervisors",
                format!("Supervisors: {}", edu.supervisors.join(", ")),
            )
        }))
}
