use crate::Document;
use crate::parse::collapse_whitespace;
use crate::selectors::{
    AUTHOR_META, AUTHOR_SELECTORS, DATE_META, DATE_SELECTORS, DESCRIPTION_META, TITLE_META, TITLE_SELECTORS,
};

/// Represents all extracted metadata from a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub site_name: Option<String>,
}

/// Author text longer than this is treated as a stray block, not a byline.
const MAX_AUTHOR_LEN: usize = 100;

impl Document {
    /// Extract title with priority fallback:
    /// 1. First `<h1>` element
    /// 2. Common title/headline selectors
    /// 3. Open Graph `og:title`, Twitter `twitter:title`
    /// 4. `<title>` element
    pub fn extract_title(&self) -> Option<String> {
        if let Some(title) = self.first_text("h1") {
            return Some(title);
        }

        for selector in TITLE_SELECTORS {
            if let Some(title) = self.first_text(selector) {
                return Some(title);
            }
        }

        for key in TITLE_META {
            if let Some(title) = self.meta_content(key) {
                return Some(title);
            }
        }

        self.title()
    }

    /// Extract author with priority fallback:
    /// 1. Byline selectors (`[rel="author"]`, `[itemprop="author"]`, `.author`, ...)
    /// 2. Meta `author` / `article:author` / `DC.creator`
    /// 3. JSON-LD `author.name`
    pub fn extract_author(&self) -> Option<String> {
        for selector in AUTHOR_SELECTORS {
            if let Some(author) = self.first_text(selector)
                && author.chars().count() < MAX_AUTHOR_LEN
            {
                return Some(strip_by_prefix(&author));
            }
        }

        for key in AUTHOR_META {
            if let Some(author) = self.meta_content(key) {
                return Some(author);
            }
        }

        if let Some(json_ld) = self.extract_json_ld()
            && let Some(author) = json_ld.get("author")
            && let Some(name) = Self::extract_author_from_json_ld(author)
        {
            return Some(name);
        }

        None
    }

    /// Extract publication date with priority fallback:
    /// 1. Date selectors (`time[datetime]`, `[itemprop="datePublished"]`, `.published`, ...)
    ///    preferring the `datetime`/`content` attribute over element text
    /// 2. Meta `article:published_time` / `date` / `DC.date`
    /// 3. JSON-LD `datePublished`
    pub fn extract_date(&self) -> Option<String> {
        for selector in DATE_SELECTORS {
            if let Some(el) = self.select_first(selector) {
                let value = el
                    .attr("datetime")
                    .or_else(|| el.attr("content"))
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| collapse_whitespace(&el.text()));
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }

        for key in DATE_META {
            if let Some(date) = self.meta_content(key) {
                return Some(date);
            }
        }

        if let Some(json_ld) = self.extract_json_ld()
            && let Some(date) = json_ld.get("datePublished")
            && let Some(value) = date.as_str()
        {
            return Some(value.to_string());
        }

        None
    }

    /// Extract description from `description` / `og:description` / `twitter:description`.
    pub fn extract_description(&self) -> Option<String> {
        DESCRIPTION_META.iter().find_map(|key| self.meta_content(key))
    }

    /// Extract site name from `og:site_name`, then JSON-LD `publisher.name`.
    pub fn extract_site_name(&self) -> Option<String> {
        if let Some(site) = self.meta_content("og:site_name") {
            return Some(site);
        }

        if let Some(json_ld) = self.extract_json_ld()
            && let Some(publisher) = json_ld.get("publisher")
            && let Some(name) = publisher.get("name")
            && let Some(value) = name.as_str()
        {
            return Some(value.to_string());
        }

        None
    }

    /// Extract all metadata at once
    pub fn extract_metadata(&self) -> Metadata {
        Metadata {
            title: self.extract_title(),
            author: self.extract_author(),
            date: self.extract_date(),
            description: self.extract_description(),
            site_name: self.extract_site_name(),
        }
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        self.select_first(selector)
            .map(|el| collapse_whitespace(&el.text()))
            .filter(|text| !text.is_empty())
    }

    /// Extract and parse JSON-LD from script tags
    fn extract_json_ld(&self) -> Option<serde_json::Value> {
        let elements = self.select("script[type=\"application/ld+json\"]").ok()?;
        elements.iter().find_map(|el| {
            let value = serde_json::from_str::<serde_json::Value>(el.text().trim()).ok()?;
            match value {
                serde_json::Value::Array(items) => items.into_iter().find(|item| item.is_object()),
                other => Some(other),
            }
        })
    }

    /// Extract author name from JSON-LD author field
    /// Handles both string and object formats
    fn extract_author_from_json_ld(author: &serde_json::Value) -> Option<String> {
        if let Some(name) = author.as_str() {
            return Some(name.to_string());
        }

        if let Some(name) = author.get("name").and_then(|name| name.as_str()) {
            return Some(name.to_string());
        }

        author.as_array()?.first().and_then(Self::extract_author_from_json_ld)
    }
}

fn strip_by_prefix(author: &str) -> String {
    let lower = author.to_lowercase();
    if lower.starts_with("by ") { author[3..].trim().to_string() } else { author.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML_WITH_META: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page Title</title>
            <meta name="author" content="Meta Author">
            <meta name="description" content="A page about testing">
            <meta property="og:title" content="OG Title">
            <meta property="og:site_name" content="Example Site">
            <meta property="article:published_time" content="2024-01-15T10:00:00Z">
        </head>
        <body>
            <article><p>Body</p></article>
        </body>
        </html>
    "#;

    #[test]
    fn test_title_prefers_h1() {
        let doc = Document::parse("<head><title>Page</title></head><body><h1> Main   Heading </h1></body>");
        assert_eq!(doc.extract_title(), Some("Main Heading".to_string()));
    }

    #[test]
    fn test_title_falls_back_through_selectors_and_meta() {
        let doc = Document::parse(r#"<body><div class="post-title">Post Title</div></body>"#);
        assert_eq!(doc.extract_title(), Some("Post Title".to_string()));

        let doc = Document::parse(HTML_WITH_META);
        assert_eq!(doc.extract_title(), Some("OG Title".to_string()));

        let doc = Document::parse("<head><title>Only Title</title></head><body></body>");
        assert_eq!(doc.extract_title(), Some("Only Title".to_string()));
    }

    #[test]
    fn test_title_missing() {
        let doc = Document::parse("<body><p>No title here</p></body>");
        assert_eq!(doc.extract_title(), None);
    }

    #[test]
    fn test_author_selector_before_meta() {
        let doc = Document::parse(
            r#"<head><meta name="author" content="Meta Author"></head><body><span class="byline">By Jane Doe</span></body>"#,
        );
        assert_eq!(doc.extract_author(), Some("Jane Doe".to_string()));

        let doc = Document::parse(HTML_WITH_META);
        assert_eq!(doc.extract_author(), Some("Meta Author".to_string()));
    }

    #[test]
    fn test_author_from_json_ld() {
        let doc = Document::parse(
            r#"<head><script type="application/ld+json">{"@type":"Article","author":{"name":"LD Author"}}</script></head><body></body>"#,
        );
        assert_eq!(doc.extract_author(), Some("LD Author".to_string()));
    }

    #[test]
    fn test_date_prefers_datetime_attribute() {
        let doc = Document::parse(r#"<body><time datetime="2024-03-01">March 1</time></body>"#);
        assert_eq!(doc.extract_date(), Some("2024-03-01".to_string()));

        let doc = Document::parse(r#"<body><span class="published">Yesterday</span></body>"#);
        assert_eq!(doc.extract_date(), Some("Yesterday".to_string()));

        let doc = Document::parse(HTML_WITH_META);
        assert_eq!(doc.extract_date(), Some("2024-01-15T10:00:00Z".to_string()));
    }

    #[test]
    fn test_extract_metadata() {
        let doc = Document::parse(HTML_WITH_META);
        let metadata = doc.extract_metadata();

        assert_eq!(metadata.description, Some("A page about testing".to_string()));
        assert_eq!(metadata.site_name, Some("Example Site".to_string()));
        assert_eq!(metadata.author, Some("Meta Author".to_string()));
    }
}
