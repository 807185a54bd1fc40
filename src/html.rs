use std::fmt;

/// Escape text for use both as element content and inside double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Plain text, escaped when written.
    Text(String),
    /// Markup that has already been escaped.
    Raw(String),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(e) => e.fmt(f),
            Node::Text(t) => f.write_str(&escape(t)),
            Node::Raw(r) => f.write_str(r),
        }
    }
}

// Elements written without content or a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "link", "meta"];

/// A small HTML element tree. Attributes keep insertion order so output is deterministic.
#[derive(Debug, Clone)]
pub struct Element {
    tag: &'static str,
    classes: Vec<String>,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Element {
            tag,
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn div() -> Self {
        Self::new("div")
    }

    pub fn span() -> Self {
        Self::new("span")
    }

    /// An anchor opening in a new tab.
    pub fn link(href: impl Into<String>) -> Self {
        Self::new("a").attr("href", href).attr("target", "_blank")
    }

    pub fn img(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new("img").attr("src", src).attr("alt", alt)
    }

    /// Add a class. Empty names are ignored.
    pub fn class(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.classes.push(name.trim().to_string());
        }
        self
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn raw(mut self, markup: impl Into<String>) -> Self {
        self.children.push(Node::Raw(markup.into()));
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.children.push(Node::Element(element));
        self
    }

    pub fn child_opt(self, element: Option<Element>) -> Self {
        match element {
            Some(e) => self.child(e),
            None => self,
        }
    }

    pub fn children(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(elements.into_iter().map(Node::Element));
        self
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        if !self.classes.is_empty() {
            write!(f, " class=\"{}\"", escape(&self.classes.join(" ")))?;
        }
        for (key, value) in &self.attrs {
            write!(f, " {}=\"{}\"", key, escape(value))?;
        }
        f.write_str(">")?;
        if VOID_TAGS.contains(&self.tag) {
            return Ok(());
        }
        for child in &self.children {
            child.fmt(f)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn renders_classes_then_attributes_in_order() {
        let el = Element::div()
            .class("reference")
            .class("")
            .class("with-score")
            .attr("data-doi", "10.1/x")
            .text("a < b");
        assert_eq!(
            el.to_string(),
            r#"<div class="reference with-score" data-doi="10.1/x">a &lt; b</div>"#
        );
    }

    #[test]
    fn raw_children_are_not_escaped() {
        let el = Element::span().raw("<strong>x</strong>");
        assert_eq!(el.to_string(), "<span><strong>x</strong></span>");
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        assert_eq!(
            Element::img("logos/a.png", "A \"logo\"").to_string(),
            r#"<img src="logos/a.png" alt="A &quot;logo&quot;">"#
        );
        assert_eq!(
            Element::new("link").attr("rel", "stylesheet").to_string(),
            r#"<link rel="stylesheet">"#
        );
    }

    #[test]
    fn link_opens_in_new_tab() {
        let el = Element::link("https://doi.org/10.1/x").text("t");
        assert_eq!(
            el.to_string(),
            r#"<a href="https://doi.org/10.1/x" target="_blank">t</a>"#
        );
    }
}
