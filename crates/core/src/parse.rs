//! Markup tree access.
//!
//! This module provides the [`Document`] and [`Element`] types the rest of the
//! crate works against. A [`Document`] owns an HTML tree; cloning it yields an
//! independent tree, which is how every mutating algorithm in this crate keeps
//! the caller's markup untouched.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::{PagemarkError, Result};

/// Parses a CSS selector, mapping failures to [`PagemarkError::InvalidSelector`].
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| PagemarkError::InvalidSelector { selector: selector.to_string(), reason: e.to_string() })
}

/// Collapses every whitespace run to a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether an inline `style` value hides its element.
pub fn is_hidden_style(style: &str) -> bool {
    let style: String = style.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
    style.contains("display:none") || style.contains("visibility:hidden")
}

/// Represents a parsed HTML document or fragment.
///
/// # Example
///
/// ```rust
/// use pagemark_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html);
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
    fragment: bool,
}

impl Document {
    /// Parses a complete HTML page.
    ///
    /// Parsing never fails: the HTML5 parser repairs malformed markup the same
    /// way a browser would.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html), fragment: false }
    }

    /// Parses an HTML fragment such as an extracted subtree.
    pub fn parse_fragment(html: &str) -> Self {
        Self { html: Html::parse_fragment(html), fragment: true }
    }

    /// Whether this document was parsed from a fragment.
    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    /// Gets the underlying `scraper::Html` tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Serializes the whole tree.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Serializes the content this document stands for.
    ///
    /// For a fragment that is everything inside the synthetic root; for a
    /// full page it is the `<body>` contents, falling back to the whole tree.
    pub fn content_html(&self) -> String {
        let root = self.html.root_element();
        if self.fragment {
            return root.inner_html();
        }

        match self.select_first("body") {
            Some(body) => body.inner_html(),
            None => root.html(),
        }
    }

    /// The element the document's content hangs from.
    ///
    /// For a fragment produced from a single element this is that element.
    /// For a full page it is `<body>` when present.
    pub fn content_root(&self) -> Option<Element<'_>> {
        let root = self.html.root_element();
        if self.fragment {
            return root.children().find_map(ElementRef::wrap).map(Element::new);
        }

        self.select_first("body").or(Some(Element::new(root)))
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PagemarkError::InvalidSelector`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagemark_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html);
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// Returns the first element matching `selector`, treating an invalid
    /// selector as no match.
    pub fn select_first(&'_ self, selector: &str) -> Option<Element<'_>> {
        let sel = parse_selector(selector).ok()?;
        self.html.select(&sel).next().map(Element::new)
    }

    /// Looks an element up by node id.
    pub fn element(&'_ self, id: NodeId) -> Option<Element<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap).map(Element::new)
    }

    /// Gets the `<title>` of the document.
    pub fn title(&self) -> Option<String> {
        self.select_first("title")
            .map(|el| collapse_whitespace(&el.text()))
            .filter(|title| !title.is_empty())
    }

    /// Gets the content of a `<meta>` tag addressed by `name` or `property`.
    pub fn meta_content(&self, key: &str) -> Option<String> {
        for attr in ["name", "property"] {
            let selector = format!("meta[{}=\"{}\"]", attr, key);
            if let Some(el) = self.select_first(&selector)
                && let Some(content) = el.attr("content")
            {
                let content = content.trim();
                if !content.is_empty() {
                    return Some(content.to_string());
                }
            }
        }
        None
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }

    /// Detaches every node in `ids` from the tree and returns how many were
    /// actually detached.
    pub fn detach_all(&mut self, ids: impl IntoIterator<Item = NodeId>) -> usize {
        let mut detached = 0;
        for id in ids {
            let attached = self.html.tree.get(id).is_some_and(|node| node.parent().is_some());
            if attached && let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
                detached += 1;
            }
        }
        detached
    }

    /// Keeps only the nodes in `keep`, their descendants and the ancestor path
    /// leading to them. Everything else is detached.
    pub fn retain_only(&mut self, keep: &[NodeId]) -> usize {
        let kept: HashSet<NodeId> = keep.iter().copied().collect();
        let mut on_path: HashSet<NodeId> = HashSet::new();

        for id in keep {
            if let Some(node) = self.html.tree.get(*id) {
                on_path.extend(node.ancestors().map(|ancestor| ancestor.id()));
            }
        }

        let mut doomed = Vec::new();
        for parent_id in &on_path {
            if kept.contains(parent_id) {
                continue;
            }
            if let Some(parent) = self.html.tree.get(*parent_id) {
                doomed.extend(
                    parent
                        .children()
                        .map(|child| child.id())
                        .filter(|id| !on_path.contains(id) && !kept.contains(id)),
                );
            }
        }

        self.detach_all(doomed)
    }
}

/// A borrowed handle to an element of a [`Document`].
///
/// # Example
///
/// ```rust
/// use pagemark_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html);
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    pub(crate) fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// The underlying `scraper` element.
    pub fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }

    /// Node id of this element inside its document's tree.
    pub fn node_id(&self) -> NodeId {
        self.element.id()
    }

    /// Gets the lowercase tag name (e.g. "div", "a", "span").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the `id` attribute.
    pub fn id(&self) -> Option<&'a str> {
        self.element.value().id()
    }

    /// Gets the class list.
    pub fn classes(&self) -> Vec<&'a str> {
        self.element.value().classes().collect()
    }

    /// Class list and id joined into one lowercase string for pattern checks.
    pub fn class_and_id(&self) -> String {
        let mut out = self.classes().join(" ");
        if let Some(id) = self.id() {
            out.push(' ');
            out.push_str(id);
        }
        out.to_lowercase()
    }

    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the concatenated text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Text length in characters after whitespace collapsing.
    pub fn text_length(&self) -> usize {
        collapse_whitespace(&self.text()).chars().count()
    }

    /// Number of whitespace-separated tokens in the text content.
    pub fn word_count(&self) -> usize {
        self.text().split_whitespace().count()
    }

    /// Element children, in document order.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.element.children().filter_map(ElementRef::wrap).map(Element::new).collect()
    }

    /// Ancestor elements, nearest first.
    pub fn ancestors(self) -> impl Iterator<Item = Element<'a>> {
        self.element.ancestors().filter_map(ElementRef::wrap).map(Element::new)
    }

    /// Whether the element is marked hidden through its inline style or the
    /// `hidden` attribute.
    pub fn is_hidden(&self) -> bool {
        if self.attr("hidden").is_some() {
            return true;
        }

        self.attr("style").is_some_and(is_hidden_style)
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PagemarkError::InvalidSelector`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }

    /// Counts descendants matching `selector`; an invalid selector counts zero.
    pub fn count(&self, selector: &str) -> usize {
        match parse_selector(selector) {
            Ok(sel) => self.element.select(&sel).count(),
            Err(_) => 0,
        }
    }

    /// Whether this element itself matches `selector`.
    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.element)
    }
}
