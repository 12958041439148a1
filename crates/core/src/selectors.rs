//! Curated selector lists used by the content detector.
//!
//! Everything here is data. The detector walks these lists in order and never
//! hardcodes a selector of its own, so extending coverage for a new site
//! pattern means adding a [`SelectorRule`], not touching the algorithm.

/// A CSS selector together with the reason it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRule {
    pub selector: String,
    pub reason: String,
}

impl SelectorRule {
    pub fn new(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { selector: selector.into(), reason: reason.into() }
    }
}

fn rules(entries: &[(&str, &str)]) -> Vec<SelectorRule> {
    entries.iter().map(|(selector, reason)| SelectorRule::new(*selector, *reason)).collect()
}

/// Clutter categories that can be toggled through `DetectionOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClutterCategory {
    Navigation,
    Footer,
    Sidebar,
    Ads,
    Comments,
    CookieBanner,
}

/// Removal rules grouped by clutter category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningRules {
    pub navigation: Vec<SelectorRule>,
    pub footer: Vec<SelectorRule>,
    pub sidebar: Vec<SelectorRule>,
    pub ads: Vec<SelectorRule>,
    pub comments: Vec<SelectorRule>,
    pub cookie_banner: Vec<SelectorRule>,
}

impl CleaningRules {
    /// Rules for one category.
    pub fn category(&self, category: ClutterCategory) -> &[SelectorRule] {
        match category {
            ClutterCategory::Navigation => &self.navigation,
            ClutterCategory::Footer => &self.footer,
            ClutterCategory::Sidebar => &self.sidebar,
            ClutterCategory::Ads => &self.ads,
            ClutterCategory::Comments => &self.comments,
            ClutterCategory::CookieBanner => &self.cookie_banner,
        }
    }

    /// Appends a rule to a category.
    pub fn with_rule(mut self, category: ClutterCategory, selector: &str, reason: &str) -> Self {
        let list = match category {
            ClutterCategory::Navigation => &mut self.navigation,
            ClutterCategory::Footer => &mut self.footer,
            ClutterCategory::Sidebar => &mut self.sidebar,
            ClutterCategory::Ads => &mut self.ads,
            ClutterCategory::Comments => &mut self.comments,
            ClutterCategory::CookieBanner => &mut self.cookie_banner,
        };
        list.push(SelectorRule::new(selector, reason));
        self
    }
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            navigation: rules(&[
                ("nav", "navigation element"),
                ("[role='navigation']", "navigation landmark"),
                (".navigation", "navigation class"),
                (".navbar", "navigation bar"),
                (".menu", "menu"),
                (".breadcrumb", "breadcrumb trail"),
                (".breadcrumbs", "breadcrumb trail"),
                (".pagination", "pager"),
                (".skip-link", "accessibility skip link"),
                (".toc", "table of contents widget"),
            ]),
            footer: rules(&[
                ("footer", "footer element"),
                ("[role='contentinfo']", "footer landmark"),
                (".footer", "footer class"),
                ("#footer", "footer id"),
                (".site-footer", "site footer"),
            ]),
            sidebar: rules(&[
                ("aside", "aside element"),
                ("[role='complementary']", "complementary landmark"),
                (".sidebar", "sidebar class"),
                ("#sidebar", "sidebar id"),
                (".widget", "sidebar widget"),
                (".related", "related links"),
                (".related-posts", "related links"),
            ]),
            ads: rules(&[
                (".ad", "ad slot"),
                (".ads", "ad slot"),
                (".advert", "ad slot"),
                (".advertisement", "ad slot"),
                ("[id^='ad-']", "ad slot id"),
                ("[class*='ad-slot']", "ad slot"),
                ("[class*='ad-container']", "ad container"),
                ("ins.adsbygoogle", "adsense unit"),
                ("[data-ad]", "ad data attribute"),
                ("[data-ad-slot]", "ad data attribute"),
                (".sponsored", "sponsored content"),
                (".promo", "promotion block"),
            ]),
            comments: rules(&[
                ("#comments", "comment thread"),
                (".comments", "comment thread"),
                (".comment-list", "comment list"),
                (".comments-section", "comment thread"),
                ("#respond", "comment form"),
                ("#disqus_thread", "disqus embed"),
            ]),
            cookie_banner: rules(&[
                ("#cookie-banner", "cookie banner"),
                (".cookie-banner", "cookie banner"),
                ("#cookie-notice", "cookie notice"),
                (".cookie-notice", "cookie notice"),
                (".cookie-consent", "cookie consent"),
                ("#cookie-consent", "cookie consent"),
                ("[class*='cookie-consent']", "cookie consent"),
                ("[id*='cookie-consent']", "cookie consent"),
                ("#onetrust-banner-sdk", "onetrust banner"),
                ("#onetrust-consent-sdk", "onetrust banner"),
                ("#CybotCookiebotDialog", "cookiebot dialog"),
                (".cc-window", "cookieconsent widget"),
                (".cc-banner", "cookieconsent widget"),
                (".gdpr", "gdpr notice"),
                ("#gdpr-consent", "gdpr notice"),
                (".consent-banner", "consent banner"),
                ("[aria-label='cookieconsent']", "cookieconsent widget"),
            ]),
        }
    }
}

/// Semantic main-content selectors, in priority order.
pub fn semantic_content_selectors() -> Vec<SelectorRule> {
    rules(&[
        ("main", "main element"),
        ("article", "article element"),
        ("[role='main']", "main landmark"),
        ("[role='article']", "article landmark"),
        (".main-content", "main content class"),
        ("#main-content", "main content id"),
        ("[itemprop='articleBody']", "schema.org article body"),
        (".article-body", "article body class"),
        (".article-content", "article content class"),
        (".post-content", "post content class"),
        (".entry-content", "entry content class"),
        (".post-body", "post body class"),
        (".story-body", "story body class"),
        ("#content", "content id"),
        (".content", "content class"),
    ])
}

/// Selectors tried for the title after the first `h1`.
pub const TITLE_SELECTORS: &[&str] =
    &[".entry-title", ".post-title", ".article-title", "[itemprop='headline']", ".headline", ".title"];

/// Meta tags tried for the title.
pub const TITLE_META: &[&str] = &["og:title", "twitter:title"];

/// Selectors tried for the author.
pub const AUTHOR_SELECTORS: &[&str] = &[
    "[rel='author']",
    "[itemprop='author'] [itemprop='name']",
    "[itemprop='author']",
    ".author-name",
    ".author",
    ".byline",
    ".by-author",
];

/// Meta tags tried for the author.
pub const AUTHOR_META: &[&str] = &["author", "article:author", "twitter:creator", "DC.creator"];

/// Selectors tried for the publication date. `datetime`/`content` attributes
/// win over the element text.
pub const DATE_SELECTORS: &[&str] = &[
    "time[datetime]",
    "[itemprop='datePublished']",
    ".published",
    ".post-date",
    ".entry-date",
    ".date",
];

/// Meta tags tried for the publication date.
pub const DATE_META: &[&str] = &["article:published_time", "datePublished", "pubdate", "date", "DC.date"];

/// Meta tags tried for the description.
pub const DESCRIPTION_META: &[&str] = &["description", "og:description", "twitter:description"];
