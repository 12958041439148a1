//! Profile-governed HTML to Markdown conversion.
//!
//! A [`MarkdownConverter`] is built from one [`ConversionProfile`]. It derives
//! an immutable [`RuleTable`] from the profile and then runs every input
//! through the same stages:
//!
//! 1. a streaming pre-pass that rewrites links and images and drops hidden
//!    markup
//! 2. the profile's `excludeCss`/`includeCss` filters
//! 3. rendering under the rule table
//! 4. post-processing, optional frontmatter, file naming and checksumming
//!
//! Conversion never fails. Empty input yields an empty document with the
//! fallback file name.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{ConversionProfile, MarkdownConverter};
//!
//! let mut profile = ConversionProfile::default();
//! profile.output_format.add_metadata = false;
//!
//! let converter = MarkdownConverter::new(&profile);
//! let result = converter.convert("<h1>Title</h1><p>Hello <strong>world</strong></p>", None);
//!
//! assert_eq!(result.content, "# Title\n\nHello **world**");
//! assert_eq!(result.size_bytes, result.content.len());
//! ```

mod output;
mod prefilter;
mod render;
mod rules;

pub use output::{CONVERTER_NAME, checksum, file_name, frontmatter, post_process};
pub use prefilter::{apply_css_filters, rewrite_markup};
pub use rules::{ImageRule, LinkRule, RuleTable};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::parse::Document;
use crate::profile::{ConversionProfile, LinkHandlingStyle};

/// Page facts that travel with a conversion and feed the frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// A finished Markdown document, ready to be copied, saved or archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub content: String,
    pub file_name: String,
    /// UTF-8 byte length of `content`.
    pub size_bytes: usize,
    /// Lowercase hex SHA-256 of `content`.
    pub checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PageMetadata>,
}

/// Converts markup to Markdown under a single profile.
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    profile: ConversionProfile,
    rules: RuleTable,
    base_url: Option<Url>,
    converted_at: DateTime<Utc>,
}

impl MarkdownConverter {
    /// Builds a converter for `profile`, stamping it with the current time.
    pub fn new(profile: &ConversionProfile) -> Self {
        Self {
            profile: profile.clone(),
            rules: RuleTable::from_profile(profile),
            base_url: None,
            converted_at: Utc::now(),
        }
    }

    /// Resolves relative links and images against `base_url`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Overrides the timestamp written to frontmatter and fallback names.
    pub fn with_converted_at(mut self, converted_at: DateTime<Utc>) -> Self {
        self.converted_at = converted_at;
        self
    }

    pub fn profile(&self) -> &ConversionProfile {
        &self.profile
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn converted_at(&self) -> DateTime<Utc> {
        self.converted_at
    }

    /// Converts an HTML string.
    ///
    /// Markup that looks like a full page (`<html>`, `<body>` or a doctype)
    /// is parsed as one; anything else is treated as a fragment.
    pub fn convert(&self, html: &str, metadata: Option<&PageMetadata>) -> ConversionResult {
        let base_url = self.effective_base_url(metadata);
        let rewritten = rewrite_markup(html, &self.profile, base_url.as_ref());

        let mut doc = if looks_like_full_page(&rewritten) {
            Document::parse(&rewritten)
        } else {
            Document::parse_fragment(&rewritten)
        };
        apply_css_filters(&mut doc, &self.profile.content_filters);

        let body = self.render_document(&doc);
        self.finish(body, metadata)
    }

    /// Converts an already parsed document. `doc` itself is left untouched.
    pub fn convert_document(&self, doc: &Document, metadata: Option<&PageMetadata>) -> ConversionResult {
        let html = if doc.is_fragment() { doc.content_html() } else { doc.as_string() };
        self.convert(&html, metadata)
    }

    /// Renders markup to Markdown without frontmatter or the result envelope.
    pub fn render_markdown(&self, html: &str) -> String {
        let rewritten = rewrite_markup(html, &self.profile, self.base_url.as_ref());
        let mut doc = Document::parse_fragment(&rewritten);
        apply_css_filters(&mut doc, &self.profile.content_filters);
        self.render_document(&doc)
    }

    fn render_document(&self, doc: &Document) -> String {
        let root = if doc.is_fragment() {
            *doc.html().root_element()
        } else {
            match doc.select_first("body") {
                Some(body) => *body.element_ref(),
                None => *doc.html().root_element(),
            }
        };
        post_process(&render::render(&self.rules, root))
    }

    fn finish(&self, body: String, metadata: Option<&PageMetadata>) -> ConversionResult {
        let content = match metadata {
            Some(meta) if self.profile.output_format.add_metadata => {
                let block = frontmatter(meta, &self.profile.name, self.converted_at);
                if body.is_empty() { block } else { format!("{}\n{}", block, body) }
            }
            _ => body,
        };

        let title = metadata.and_then(|m| m.title.as_deref());
        ConversionResult {
            file_name: file_name(title, self.converted_at),
            size_bytes: content.len(),
            checksum: checksum(&content),
            metadata: metadata.cloned(),
            content,
        }
    }

    fn effective_base_url(&self, metadata: Option<&PageMetadata>) -> Option<Url> {
        if self.profile.link_handling.style == LinkHandlingStyle::Remove {
            return None;
        }
        self.base_url.clone().or_else(|| metadata.and_then(|m| m.url.as_deref()).and_then(|u| Url::parse(u).ok()))
    }
}

fn looks_like_full_page(html: &str) -> bool {
    let head: String = html.chars().take(1024).collect::<String>().to_ascii_lowercase();
    head.contains("<!doctype") || head.contains("<html") || head.contains("<body")
}

/// Converts `html` under `profile` in one call.
pub fn convert(html: &str, profile: &ConversionProfile, metadata: Option<&PageMetadata>) -> ConversionResult {
    MarkdownConverter::new(profile).convert(html, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn converter(profile: &ConversionProfile) -> MarkdownConverter {
        MarkdownConverter::new(profile).with_converted_at(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
    }

    fn metadata() -> PageMetadata {
        PageMetadata {
            title: Some("Test Page!@#$%".to_string()),
            url: Some("https://example.com/docs/page".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_convert_with_frontmatter() {
        let result = converter(&ConversionProfile::default()).convert("<h1>Title</h1>", Some(&metadata()));
        assert!(result.content.starts_with("---\ntitle: Test Page!@#$%\nurl: https://example.com/docs/page\n"));
        assert!(result.content.ends_with("profile: Default\n---\n\n# Title"));
        assert_eq!(result.file_name, "test-page.md");
        assert_eq!(result.metadata, Some(metadata()));
    }

    #[test]
    fn test_convert_without_metadata_flag() {
        let mut profile = ConversionProfile::default();
        profile.output_format.add_metadata = false;
        let result = converter(&profile).convert("<p>Body</p>", Some(&metadata()));
        assert_eq!(result.content, "Body");
    }

    #[test]
    fn test_empty_input() {
        let result = converter(&ConversionProfile::default()).convert("   ", None);
        assert_eq!(result.content, "");
        assert_eq!(result.size_bytes, 0);
        assert_eq!(result.file_name, "page-2024-05-01.md");
    }

    #[test]
    fn test_convert_is_pure_per_converter() {
        let conv = converter(&ConversionProfile::default());
        let html = "<article><h2>A</h2><p>Text with <a href='/x?utm_source=y'>link</a></p></article>";
        let first = conv.convert(html, Some(&metadata()));
        let second = conv.convert(html, Some(&metadata()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_indented_code_survives_cleanup() {
        let mut profile = ConversionProfile::default();
        profile.conversion_options.code_block_style = crate::profile::CodeBlockStyle::Indented;
        let result = converter(&profile).convert("<pre>-   keep\n*    this</pre><p>After</p>", None);
        assert_eq!(result.content, "    -   keep\n    *    this\n\nAfter");
    }

    #[test]
    fn test_relative_links_resolve_against_metadata_url() {
        let mut profile = ConversionProfile::default();
        profile.output_format.add_metadata = false;
        let result = converter(&profile).convert(r#"<p><a href="../guide?utm_medium=x&v=2">Guide</a></p>"#, Some(&metadata()));
        assert_eq!(result.content, "[Guide](https://example.com/guide?v=2)");
    }

    #[test]
    fn test_full_page_renders_body_only() {
        let result = converter(&ConversionProfile::default())
            .convert("<!DOCTYPE html><html><head><title>T</title></head><body><p>Hi</p></body></html>", None);
        assert_eq!(result.content, "Hi");
    }

    #[test]
    fn test_exclude_css_applies() {
        let mut profile = ConversionProfile::default();
        profile.content_filters.exclude_css = vec![".ad".to_string(), "::bad(".to_string()];
        let result = converter(&profile).convert(r#"<p>Keep</p><div class="ad">Buy</div>"#, None);
        assert_eq!(result.content, "Keep");
    }

    #[test]
    fn test_hidden_content_respects_flag() {
        let html = r#"<p>Shown</p><p style="display:none">Hidden</p>"#;
        let mut profile = ConversionProfile::default();
        assert_eq!(converter(&profile).convert(html, None).content, "Shown");

        profile.content_filters.include_hidden = true;
        assert_eq!(converter(&profile).convert(html, None).content, "Shown\n\nHidden");
    }

    #[test]
    fn test_convert_document_leaves_source() {
        let doc = Document::parse_fragment("<p>One</p>");
        let before = doc.as_string();
        let result = converter(&ConversionProfile::default()).convert_document(&doc, None);
        assert_eq!(result.content, "One");
        assert_eq!(doc.as_string(), before);
    }
}
