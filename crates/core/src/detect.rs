//! Main-content detection.
//!
//! This module provides [`ContentDetector`], which locates the subtree of a
//! page holding its real content, strips clutter from it, extracts metadata
//! and scores its own confidence.
//!
//! The caller's [`Document`] is never modified: detection clones it and does
//! all of its removal work on the clone.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{ContentDetector, Document};
//!
//! let body = "Readable prose that is long enough to count as content. ".repeat(10);
//! let html = format!("<html><body><nav>Home</nav><article><h1>Title</h1><p>{}</p></article></body></html>", body);
//! let doc = Document::parse(&html);
//!
//! let detected = ContentDetector::default().detect(&doc);
//! assert_eq!(detected.title, "Title");
//! assert!(detected.main_content.is_some());
//! assert!(detected.confidence > 0);
//! ```

use ego_tree::NodeId;

use crate::clean;
use crate::parse::Document;
use crate::scoring::{candidate_score, confidence};
use crate::selectors::{CleaningRules, ClutterCategory, SelectorRule, semantic_content_selectors};

/// Words read per minute when estimating reading time.
const WORDS_PER_MINUTE: usize = 200;

/// Container tags considered by the heuristic fallback.
const CANDIDATE_TAGS: &str = "div, section, article, main";

/// Configuration for content detection.
///
/// # Example
///
/// ```rust
/// use pagemark_core::DetectionOptions;
///
/// let options = DetectionOptions::builder()
///     .remove_comments(false)
///     .min_text_length(500)
///     .build();
/// assert!(!options.remove_comments);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOptions {
    /// Remove navigation blocks (default: true).
    pub remove_nav: bool,

    /// Remove footers (default: true).
    pub remove_footer: bool,

    /// Remove sidebars and related-link widgets (default: true).
    pub remove_sidebars: bool,

    /// Remove ad slots (default: true).
    pub remove_ads: bool,

    /// Remove comment threads (default: true).
    pub remove_comments: bool,

    /// Remove cookie/consent banners (default: true).
    pub remove_cookie_banners: bool,

    /// Minimum text length, in characters, for a main-content candidate (default: 200).
    pub min_text_length: usize,

    /// Clutter selectors by category.
    pub cleaning_rules: CleaningRules,

    /// Semantic main-content selectors, in priority order.
    pub semantic_selectors: Vec<SelectorRule>,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            remove_nav: true,
            remove_footer: true,
            remove_sidebars: true,
            remove_ads: true,
            remove_comments: true,
            remove_cookie_banners: true,
            min_text_length: 200,
            cleaning_rules: CleaningRules::default(),
            semantic_selectors: semantic_content_selectors(),
        }
    }
}

impl DetectionOptions {
    /// Creates a new builder for DetectionOptions.
    pub fn builder() -> DetectionOptionsBuilder {
        DetectionOptionsBuilder::new()
    }

    /// Clutter categories enabled by these options, in removal order.
    pub fn enabled_categories(&self) -> Vec<ClutterCategory> {
        [
            (self.remove_nav, ClutterCategory::Navigation),
            (self.remove_footer, ClutterCategory::Footer),
            (self.remove_sidebars, ClutterCategory::Sidebar),
            (self.remove_ads, ClutterCategory::Ads),
            (self.remove_comments, ClutterCategory::Comments),
            (self.remove_cookie_banners, ClutterCategory::CookieBanner),
        ]
        .into_iter()
        .filter_map(|(enabled, category)| enabled.then_some(category))
        .collect()
    }
}

/// Builder for DetectionOptions.
pub struct DetectionOptionsBuilder {
    options: DetectionOptions,
}

impl DetectionOptionsBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { options: DetectionOptions::default() }
    }

    pub fn remove_nav(mut self, value: bool) -> Self {
        self.options.remove_nav = value;
        self
    }

    pub fn remove_footer(mut self, value: bool) -> Self {
        self.options.remove_footer = value;
        self
    }

    pub fn remove_sidebars(mut self, value: bool) -> Self {
        self.options.remove_sidebars = value;
        self
    }

    pub fn remove_ads(mut self, value: bool) -> Self {
        self.options.remove_ads = value;
        self
    }

    pub fn remove_comments(mut self, value: bool) -> Self {
        self.options.remove_comments = value;
        self
    }

    pub fn remove_cookie_banners(mut self, value: bool) -> Self {
        self.options.remove_cookie_banners = value;
        self
    }

    /// Sets the minimum candidate text length.
    pub fn min_text_length(mut self, value: usize) -> Self {
        self.options.min_text_length = value;
        self
    }

    /// Replaces the clutter selectors.
    pub fn cleaning_rules(mut self, rules: CleaningRules) -> Self {
        self.options.cleaning_rules = rules;
        self
    }

    /// Replaces the semantic main-content selectors.
    pub fn semantic_selectors(mut self, selectors: Vec<SelectorRule>) -> Self {
        self.options.semantic_selectors = selectors;
        self
    }

    /// Builds the options.
    pub fn build(self) -> DetectionOptions {
        self.options
    }
}

impl Default for DetectionOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The outcome of content detection.
#[derive(Debug, Clone)]
pub struct DetectedContent {
    /// Cleaned copy of the main-content subtree, `None` when nothing qualified.
    pub main_content: Option<Document>,

    /// Page title; empty when none could be found.
    pub title: String,

    pub author: Option<String>,
    pub publish_date: Option<String>,
    pub description: Option<String>,
    pub site_name: Option<String>,

    /// Whitespace-separated tokens in the cleaned content.
    pub word_count: usize,

    /// Estimated reading time in whole minutes, rounded up.
    pub reading_time: usize,

    /// 0-100 estimate of how likely `main_content` is the real content.
    pub confidence: u8,
}

impl DetectedContent {
    /// Serializes the cleaned main content, if any.
    pub fn html(&self) -> Option<String> {
        self.main_content.as_ref().map(Document::content_html)
    }
}

/// Stateless main-content detector.
#[derive(Debug, Clone, Default)]
pub struct ContentDetector {
    options: DetectionOptions,
}

impl ContentDetector {
    pub fn new(options: DetectionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Detects the main content of `doc`. See [`detect_content`].
    pub fn detect(&self, doc: &Document) -> DetectedContent {
        detect_content(doc, &self.options)
    }
}

/// Detects the main content of `doc`.
///
/// Never fails: an empty page, or one with no candidate above
/// `min_text_length`, yields `main_content: None`, zero words and zero
/// confidence.
pub fn detect_content(doc: &Document, options: &DetectionOptions) -> DetectedContent {
    let metadata = doc.extract_metadata();

    let mut work = doc.clone();
    clean::remove_non_content(&mut work);

    let main_content = find_main_content(&work, options).map(|main| {
        clean_main_content(&mut work, main, options);
        match work.element(main) {
            Some(el) => Document::parse_fragment(&el.outer_html()),
            None => Document::parse_fragment(""),
        }
    });

    let root = main_content.as_ref().and_then(Document::content_root);
    let word_count = root.map(|el| el.word_count()).unwrap_or(0);
    let reading_time = word_count.div_ceil(WORDS_PER_MINUTE);
    let confidence = confidence(root.as_ref());

    tracing::debug!("Detected {} words with confidence {}", word_count, confidence);

    DetectedContent {
        title: metadata.title.unwrap_or_default(),
        author: metadata.author,
        publish_date: metadata.date,
        description: metadata.description,
        site_name: metadata.site_name,
        word_count,
        reading_time,
        confidence,
        main_content,
    }
}

/// Locates the main-content node: the semantic selectors first, then the
/// scored heuristic fallback.
pub fn find_main_content(doc: &Document, options: &DetectionOptions) -> Option<NodeId> {
    semantic_search(doc, options).or_else(|| heuristic_search(doc, options.min_text_length))
}

fn semantic_search(doc: &Document, options: &DetectionOptions) -> Option<NodeId> {
    for rule in &options.semantic_selectors {
        let elements = match doc.select(&rule.selector) {
            Ok(elements) => elements,
            Err(e) => {
                tracing::warn!("Skipping content selector ({}): {}", rule.reason, e);
                continue;
            }
        };

        if let Some(found) = elements.iter().find(|el| el.text_length() > options.min_text_length) {
            tracing::debug!("Semantic match on '{}' ({})", rule.selector, rule.reason);
            return Some(found.node_id());
        }
    }
    None
}

fn heuristic_search(doc: &Document, min_text_length: usize) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;

    for candidate in doc.select(CANDIDATE_TAGS).unwrap_or_default() {
        if candidate.text_length() <= min_text_length {
            continue;
        }

        let result = candidate_score(&candidate);
        if best.is_none_or(|(_, score)| result.score > score) {
            best = Some((candidate.node_id(), result.score));
        }
    }

    if let Some((_, score)) = best {
        tracing::debug!("Heuristic candidate selected with score {:.2}", score);
    }
    best.map(|(id, _)| id)
}

fn clean_main_content(work: &mut Document, main: NodeId, options: &DetectionOptions) {
    for category in options.enabled_categories() {
        let removed = clean::remove_matching(work, main, options.cleaning_rules.category(category));
        if removed > 0 {
            tracing::debug!("Removed {} {:?} node(s)", removed, category);
        }
    }

    if options.remove_cookie_banners {
        clean::sweep_cookie_banners(work, Some(main));
    }

    let hidden = clean::remove_hidden(work, main);
    let empty = clean::remove_empty(work, main);
    tracing::debug!("Removed {} hidden and {} empty node(s)", hidden, empty);
}
