//! Clutter removal on a working copy of the page.
//!
//! Every function here mutates the [`Document`] it is handed. The detector only
//! ever passes its own clone, never the caller's document.

use std::collections::HashSet;
use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;

use crate::parse::{Document, Element};
use crate::selectors::SelectorRule;

/// Tags that never carry readable text.
const NON_CONTENT_TAGS: &str = "script, style, noscript, template";

/// Block-level tags the cookie sweep considers.
const BANNER_BLOCKS: &str = "div, section, aside, footer, header, dialog, form, nav";

/// Elements that make a block interactive.
const INTERACTIVE_CONTROLS: &str = "button, [role='button'], input[type='button'], input[type='submit'], a.button, a.btn, a[class*='button'], a[class*='btn']";

/// Banners are short. Anything at or above this many words is content.
const MAX_BANNER_WORDS: usize = 200;

/// Upper bound on empty-node passes.
const MAX_EMPTY_PASSES: usize = 10;

/// Consent markers in a class or id.
static CONSENT_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)cookie|consent|gdpr|privacy").expect("CONSENT_KEYWORDS should compile"));

/// Consent phrasing in visible text. A bare "cookie" is not enough.
static CONSENT_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(we|this (web)?site|our (web)?site) uses? cookies\b|\bcookies? (policy|settings|preferences|notice|consent)\b|\baccept (all )?cookies\b|\bconsent\b|\bgdpr\b|\bprivacy (policy|notice|settings|preferences)\b",
    )
    .expect("CONSENT_PHRASES should compile")
});

/// Detaches `script`, `style`, `noscript` and `template` subtrees everywhere.
pub fn remove_non_content(doc: &mut Document) -> usize {
    let ids: Vec<NodeId> = doc.select(NON_CONTENT_TAGS).unwrap_or_default().iter().map(|el| el.node_id()).collect();
    doc.detach_all(ids)
}

/// Detaches the descendants of `scope` matching any of `rules`.
///
/// Invalid selectors are skipped with a warning. The scope element itself is
/// never removed.
pub fn remove_matching(doc: &mut Document, scope: NodeId, rules: &[SelectorRule]) -> usize {
    let Some(root) = doc.element(scope) else {
        return 0;
    };

    let mut ids = Vec::new();
    for rule in rules {
        match root.select(&rule.selector) {
            Ok(elements) => ids.extend(elements.iter().map(|el| el.node_id()).filter(|id| *id != scope)),
            Err(e) => tracing::warn!("Skipping cleaning rule ({}): {}", rule.reason, e),
        }
    }

    doc.detach_all(ids)
}

/// Whether a block looks like a cookie/consent banner.
///
/// All three must hold: a consent keyword in the class/id or consent phrasing
/// in the text, at least one interactive control, and fewer than
/// [`MAX_BANNER_WORDS`] words.
pub fn is_cookie_banner(element: &Element<'_>) -> bool {
    let keyword = CONSENT_KEYWORDS.is_match(&element.class_and_id()) || CONSENT_PHRASES.is_match(&element.text());
    keyword && element.count(INTERACTIVE_CONTROLS) > 0 && element.word_count() < MAX_BANNER_WORDS
}

/// Document-wide cookie banner sweep.
///
/// `protected` (the main-content node), its ancestors and any `article` or
/// `main` element are never removed. Only the innermost qualifying block is
/// removed: a qualifying block that contains another qualifying block is left
/// alone.
pub fn sweep_cookie_banners(doc: &mut Document, protected: Option<NodeId>) -> usize {
    let mut shielded: HashSet<NodeId> = HashSet::new();
    if let Some(id) = protected
        && let Some(main) = doc.element(id)
    {
        shielded.insert(id);
        shielded.extend(main.ancestors().map(|el| el.node_id()));
    }

    let blocks = doc.select(BANNER_BLOCKS).unwrap_or_default();
    let qualifying: Vec<Element<'_>> = blocks
        .into_iter()
        .filter(|el| !shielded.contains(&el.node_id()))
        .filter(|el| is_cookie_banner(el))
        .collect();

    let qualifying_ids: HashSet<NodeId> = qualifying.iter().map(|el| el.node_id()).collect();
    let has_qualifying_descendant: HashSet<NodeId> = qualifying
        .iter()
        .flat_map(|el| el.ancestors().map(|a| a.node_id()))
        .filter(|id| qualifying_ids.contains(id))
        .collect();

    let doomed: Vec<NodeId> = qualifying
        .iter()
        .map(|el| el.node_id())
        .filter(|id| !has_qualifying_descendant.contains(id))
        .collect();

    let removed = doc.detach_all(doomed);
    if removed > 0 {
        tracing::debug!("Cookie sweep removed {} block(s)", removed);
    }
    removed
}

/// Detaches hidden descendants of `scope` (inline `display:none`,
/// `visibility:hidden`, or the `hidden` attribute).
pub fn remove_hidden(doc: &mut Document, scope: NodeId) -> usize {
    let Some(root) = doc.element(scope) else {
        return 0;
    };

    let ids: Vec<NodeId> = root
        .select("*")
        .unwrap_or_default()
        .iter()
        .filter(|el| el.node_id() != scope && el.is_hidden())
        .map(|el| el.node_id())
        .collect();

    doc.detach_all(ids)
}

/// Detaches `div`, `span` and `p` descendants of `scope` that have neither
/// text nor element children, repeating until nothing changes.
pub fn remove_empty(doc: &mut Document, scope: NodeId) -> usize {
    let mut total = 0;

    for _ in 0..MAX_EMPTY_PASSES {
        let Some(root) = doc.element(scope) else {
            break;
        };

        let ids: Vec<NodeId> = root
            .select("div, span, p")
            .unwrap_or_default()
            .iter()
            .filter(|el| el.node_id() != scope)
            .filter(|el| el.children().is_empty() && el.text().trim().is_empty())
            .map(|el| el.node_id())
            .collect();

        if ids.is_empty() {
            break;
        }
        total += doc.detach_all(ids);
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(doc: &Document, selector: &str) -> NodeId {
        doc.select_first(selector).unwrap().node_id()
    }

    #[test]
    fn test_remove_non_content() {
        let mut doc = Document::parse(
            "<head><style>p{}</style></head><body><script>var x;</script><noscript>n</noscript><p>Keep</p></body>",
        );
        assert_eq!(remove_non_content(&mut doc), 3);
        assert_eq!(doc.content_html(), "<p>Keep</p>");
    }

    #[test]
    fn test_remove_matching_is_scoped() {
        let mut doc = Document::parse(
            r#"<nav id="outer">Top</nav><article class="ad"><p>Text</p><nav>Inner</nav><div class="ad">Buy</div></article>"#,
        );
        let scope = node(&doc, "article");
        let rules = vec![SelectorRule::new("nav", "nav"), SelectorRule::new(".ad", "ad")];

        assert_eq!(remove_matching(&mut doc, scope, &rules), 2);
        assert!(doc.select_first("#outer").is_some());
        assert!(doc.select_first("article").is_some());
        assert!(!doc.as_string().contains("Buy"));
    }

    #[test]
    fn test_remove_matching_skips_invalid_selector() {
        let mut doc = Document::parse("<article><aside>Side</aside></article>");
        let scope = node(&doc, "article");
        let rules = vec![SelectorRule::new("[[bad", "broken"), SelectorRule::new("aside", "aside")];
        assert_eq!(remove_matching(&mut doc, scope, &rules), 1);
    }

    #[test]
    fn test_cookie_banner_requires_all_signals() {
        let doc = Document::parse(
            r#"
            <div id="a">We use cookies to improve your experience. <button>Accept</button></div>
            <div id="b">We use cookies to improve your experience.</div>
            <div id="c">Subscribe to our newsletter <button>Join</button></div>
            "#,
        );
        assert!(is_cookie_banner(&doc.select_first("#a").unwrap()));
        assert!(!is_cookie_banner(&doc.select_first("#b").unwrap()));
        assert!(!is_cookie_banner(&doc.select_first("#c").unwrap()));
    }

    #[test]
    fn test_cookie_banner_matches_consent_class_without_phrasing() {
        let doc = Document::parse(r#"<div class="gdpr-bar">Choose what we store. <button>OK</button></div>"#);
        assert!(is_cookie_banner(&doc.select_first("div").unwrap()));
    }

    #[test]
    fn test_cookie_word_alone_is_not_a_banner() {
        let doc = Document::parse(
            r#"<section><h2>Cookie Recipe</h2><p>Cream the butter and sugar, fold in the chips and bake the cookies for twelve minutes.</p><button>Print recipe</button></section>"#,
        );
        assert!(!is_cookie_banner(&doc.select_first("section").unwrap()));
    }

    #[test]
    fn test_cookie_banner_word_limit() {
        let text = vec!["we use cookies"; 80].join(" ");
        let doc = Document::parse(&format!("<div>{} <button>OK</button></div>", text));
        assert!(!is_cookie_banner(&doc.select_first("div").unwrap()));
    }

    #[test]
    fn test_sweep_removes_innermost_banner_only() {
        let mut doc = Document::parse(
            r##"<div id="wrap"><div id="banner">Privacy notice: we use cookies. <a class="btn" href="#">Got it</a></div><p>Other text</p></div>"##,
        );
        assert_eq!(sweep_cookie_banners(&mut doc, None), 1);
        assert!(doc.select_first("#banner").is_none());
        assert!(doc.select_first("#wrap").is_some());
    }

    #[test]
    fn test_sweep_protects_main_and_articles() {
        let mut doc = Document::parse(
            r#"<div id="page"><article><h1>How to Bake Cookies</h1><p>Cookie dough needs butter.</p><button>Print</button></article></div>"#,
        );
        let article = node(&doc, "article");
        sweep_cookie_banners(&mut doc, Some(article));
        assert!(doc.select_first("article").is_some());
        assert!(doc.select_first("#page").is_some());
    }

    #[test]
    fn test_sweep_keeps_recipe_section_inside_main_content() {
        let mut doc = Document::parse(
            r#"<div id="consent" class="cookie-consent">We use cookies. <button>Accept</button></div>
            <article><h1>How to Bake Cookies</h1><p>Soft cookies start with room temperature butter.</p>
            <section><h2>Cookie Recipe</h2><p>Mix, scoop and bake for twelve minutes.</p><button>Print recipe</button></section></article>"#,
        );
        let article = node(&doc, "article");

        assert_eq!(sweep_cookie_banners(&mut doc, Some(article)), 1);
        assert!(doc.select_first("#consent").is_none());
        assert!(doc.select_first("article section").is_some());
        assert!(doc.as_string().contains("Print recipe"));
    }

    #[test]
    fn test_remove_hidden() {
        let mut doc = Document::parse(
            r#"<article><p>Shown</p><p style="display:none">Gone</p><div hidden>Also gone</div></article>"#,
        );
        let scope = node(&doc, "article");
        assert_eq!(remove_hidden(&mut doc, scope), 2);
        assert!(!doc.as_string().contains("gone"));
        assert!(!doc.as_string().contains("Gone"));
    }

    #[test]
    fn test_remove_empty_reaches_fixed_point() {
        let mut doc = Document::parse(r#"<article><div><div><span> </span></div></div><p>Text</p><p></p></article>"#);
        let scope = node(&doc, "article");
        assert_eq!(remove_empty(&mut doc, scope), 4);
        assert_eq!(doc.select_first("article").unwrap().inner_html(), "<p>Text</p>");
    }
}
