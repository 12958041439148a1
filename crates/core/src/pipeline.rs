//! One-call page clipping: match a profile, detect the content, convert it.

use url::Url;

use crate::convert::{ConversionResult, MarkdownConverter, PageMetadata};
use crate::detect::{DetectedContent, DetectionOptions, detect_content};
use crate::matcher::{PageContext, ProfileMatcher};
use crate::parse::Document;
use crate::profile::{ConversionProfile, builtin_profiles};

/// Everything produced while clipping one page.
#[derive(Debug, Clone)]
pub struct Clip {
    /// The profile the page was converted with.
    pub profile: ConversionProfile,
    /// Which of the profile's rules fired; empty when it was the fallback.
    pub match_reasons: Vec<String>,
    pub detection: DetectedContent,
    pub result: ConversionResult,
}

/// Clips `doc` to Markdown.
///
/// The profile is chosen from `profiles` for `context` with the page itself
/// answering meta tag and selector rules. Without any usable profile the
/// built-in default is used. The detected main content is converted when
/// there is one, otherwise the whole page. `doc` is never modified.
///
/// # Example
///
/// ```rust
/// use pagemark_core::{DetectionOptions, Document, PageContext, builtin_profiles, clip};
///
/// let doc = Document::parse("<html><head><title>Notes</title></head><body><p>Short page</p></body></html>");
/// let context = PageContext::new("https://example.com/notes", "Notes");
///
/// let clip = clip(&doc, &context, &builtin_profiles(), &DetectionOptions::default());
/// assert_eq!(clip.profile.id, "default");
/// assert!(clip.result.content.ends_with("Short page"));
/// ```
pub fn clip(
    doc: &Document, context: &PageContext, profiles: &[ConversionProfile], options: &DetectionOptions,
) -> Clip {
    let matcher = ProfileMatcher::with_probe(doc);
    let profile = match matcher.find_matching_profile(profiles, context) {
        Some(profile) => profile.clone(),
        None => {
            tracing::debug!("No profile matched and none is marked default; using the built-in default");
            builtin_profiles().into_iter().find(|p| p.is_default).unwrap_or_default()
        }
    };
    let match_reasons = matcher.get_match_reason(&profile, context);

    let detection = detect_content(doc, options);
    tracing::debug!(
        "Clipping {} with profile '{}' (confidence {})",
        context.url,
        profile.id,
        detection.confidence
    );

    let metadata = page_metadata(&detection, context);
    let mut converter = MarkdownConverter::new(&profile);
    if let Ok(base) = Url::parse(&context.url) {
        converter = converter.with_base_url(base);
    }

    let source = detection.main_content.as_ref().unwrap_or(doc);
    let result = converter.convert_document(source, Some(&metadata));

    Clip { profile, match_reasons, detection, result }
}

/// Frontmatter facts for a page, preferring detected values over the
/// caller's context.
pub fn page_metadata(detection: &DetectedContent, context: &PageContext) -> PageMetadata {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    PageMetadata {
        title: non_empty(&detection.title).or_else(|| non_empty(&context.title)),
        url: non_empty(&context.url),
        author: detection.author.clone(),
        description: detection.description.clone(),
        published_date: detection.publish_date.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{MatchMode, MatchRules, MatchType, ProfileMatchRule, RuleType};

    fn article_page() -> Document {
        let para = "Rust lets you write fast and reliable software without a garbage collector. ".repeat(8);
        Document::parse(&format!(
            r#"<html><head><title>Ownership</title><meta name="author" content="Ana Ruiz"></head>
            <body><nav><a href="/">Home</a><a href="/blog">Blog</a></nav>
            <article><h1>Understanding Ownership</h1><p>{para}</p><p>{para}</p></article>
            <footer>Copyright</footer></body></html>"#
        ))
    }

    #[test]
    fn test_clip_uses_detected_content_and_metadata() {
        let doc = article_page();
        let context = PageContext::new("https://example.com/ownership", "Ownership");
        let clip = clip(&doc, &context, &builtin_profiles(), &DetectionOptions::default());

        assert_eq!(clip.profile.id, "default");
        assert!(clip.match_reasons.is_empty());
        assert!(clip.result.content.contains("title: Understanding Ownership"));
        assert!(clip.result.content.contains("author: Ana Ruiz"));
        assert!(clip.result.content.contains("# Understanding Ownership"));
        assert!(!clip.result.content.contains("Home"));
        assert!(!clip.result.content.contains("Copyright"));
        assert_eq!(clip.result.file_name, "understanding-ownership.md");
    }

    #[test]
    fn test_clip_picks_matching_profile_with_reasons() {
        let doc = article_page();
        let context = PageContext::new("https://github.com/rust-lang/rust", "Rust");
        let clip = clip(&doc, &context, &builtin_profiles(), &DetectionOptions::default());

        assert_eq!(clip.profile.id, "github");
        assert_eq!(clip.match_reasons, vec!["Domain ends with 'github.com'".to_string()]);
    }

    #[test]
    fn test_clip_answers_selector_rules_from_page() {
        let mut docs = ConversionProfile::new("docs", "Docs");
        docs.match_rules = Some(MatchRules {
            enabled: true,
            priority: 10,
            match_type: MatchType::All,
            rules: vec![ProfileMatchRule::new(RuleType::Selector, MatchMode::Exact, "article h1")],
        });
        let mut profiles = builtin_profiles();
        profiles.push(docs);

        let clip = clip(&article_page(), &PageContext::new("https://example.com/", ""), &profiles, &DetectionOptions::default());
        assert_eq!(clip.profile.id, "docs");
    }

    #[test]
    fn test_clip_strips_tracking_params_inside_detected_content() {
        let para = "Query strings carry analytics noise that readers never need to see. ".repeat(8);
        let doc = Document::parse(&format!(
            r#"<html><body><article><h1>Clean links</h1><p>{para}</p>
            <p>See <a href="https://example.com/?id=7&amp;utm_source=x&amp;page=2">link</a>.</p></article></body></html>"#
        ));
        let context = PageContext::new("https://example.com/post", "Clean links");
        let clip = clip(&doc, &context, &builtin_profiles(), &DetectionOptions::default());

        assert!(clip.detection.main_content.is_some());
        assert!(clip.result.content.contains("[link](https://example.com/?id=7&page=2)"), "{}", clip.result.content);
        assert!(!clip.result.content.contains("utm_source"));
    }

    #[test]
    fn test_clip_falls_back_to_whole_page() {
        let doc = Document::parse("<html><body><p>Tiny</p></body></html>");
        let context = PageContext::new("not a url", "Tiny page");
        let clip = clip(&doc, &context, &[], &DetectionOptions::default());

        assert!(clip.detection.main_content.is_none());
        assert_eq!(clip.profile.id, "default");
        assert!(clip.result.content.ends_with("Tiny"));
        assert_eq!(clip.result.file_name, "tiny-page.md");
    }
}
