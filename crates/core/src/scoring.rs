//! Scoring for main-content candidates and for the final detection.
//!
//! Two scores live here. [`candidate_score`] ranks container elements during
//! the heuristic fallback search; [`confidence`] rates how likely the chosen
//! subtree is the page's real content on a 0-100 scale.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::Element;

static POSITIVE_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"content|article").expect("POSITIVE_CANDIDATE should compile"));
static NEGATIVE_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sidebar|nav").expect("NEGATIVE_CANDIDATE should compile"));
static CONTENT_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"content|article|main").expect("CONTENT_HINT should compile"));

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

/// Breakdown of a candidate's heuristic score.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub tag_name: String,
    pub text_length: usize,
    pub paragraphs: usize,
    pub headings: usize,
    pub link_density: f64,
    pub score: f64,
}

/// Calculate the link density of an element
///
/// Link density is the ratio of link text characters to total text characters.
/// Returns a value from 0.0 (no links) to 1.0 (all text is in links).
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_length = element.text_length();

    if text_length == 0 {
        return 0.0;
    }

    let link_text_length = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| link.text_length())
        .sum::<usize>();

    (link_text_length as f64 / text_length as f64).min(1.0)
}

/// Bonus for the container tag itself.
///
/// - ARTICLE: +30
/// - MAIN: +25
/// - SECTION: +10
pub fn candidate_tag_bonus(tag_name: &str) -> f64 {
    match tag_name {
        "article" => 30.0,
        "main" => 25.0,
        "section" => 10.0,
        _ => 0.0,
    }
}

/// Class/id adjustment: +25 for content-like names, -25 for sidebar or
/// navigation names. Both can apply.
pub fn class_id_weight(element: &Element<'_>) -> f64 {
    let names = element.class_and_id();
    let mut weight = 0.0;
    if POSITIVE_CANDIDATE.is_match(&names) {
        weight += 25.0;
    }
    if NEGATIVE_CANDIDATE.is_match(&names) {
        weight -= 25.0;
    }
    weight
}

/// Scores a heuristic candidate.
///
/// The score combines:
/// - a length bonus of `text_length / 100`, capped at 50
/// - +3 per paragraph and +5 per heading inside the element
/// - a `100 * link_density` penalty
/// - the class/id weight and the tag bonus
pub fn candidate_score(element: &Element<'_>) -> CandidateScore {
    let tag_name = element.tag_name();
    let text_length = element.text_length();
    let paragraphs = element.count("p");
    let headings = element.count(HEADINGS);
    let ld = link_density(element);

    let length_bonus = (text_length as f64 / 100.0).min(50.0);
    let score = length_bonus + 3.0 * paragraphs as f64 + 5.0 * headings as f64 - 100.0 * ld
        + class_id_weight(element)
        + candidate_tag_bonus(&tag_name);

    CandidateScore { tag_name, text_length, paragraphs, headings, link_density: ld, score }
}

/// Staged word-count thresholds and the bonus each one unlocks.
const WORD_STAGES: [(usize, u32); 5] = [(10, 10), (50, 15), (100, 15), (300, 10), (500, 10)];

/// Rates the detected content from 0 to 100.
///
/// `None` (nothing detected) and content without words score 0.
pub fn confidence(content: Option<&Element<'_>>) -> u8 {
    let Some(element) = content else {
        return 0;
    };

    let words = element.word_count();
    if words == 0 {
        return 0;
    }

    let mut score: u32 = WORD_STAGES
        .iter()
        .filter(|(threshold, _)| words >= *threshold)
        .map(|(_, bonus)| bonus)
        .sum();

    let root_is_heading = matches!(element.tag_name().as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6");
    if root_is_heading || element.count(HEADINGS) > 0 {
        score += 20;
    }

    let paragraphs = element.count("p");
    if paragraphs > 1 {
        score += 10;
    }
    if paragraphs > 3 {
        score += 10;
    }

    let role = element.attr("role").unwrap_or_default();
    score += match element.tag_name().as_str() {
        "article" => 30,
        "main" => 25,
        _ if role == "main" || role == "article" => 20,
        _ => 0,
    };

    if CONTENT_HINT.is_match(&element.class_and_id()) {
        score += 10;
    }

    score.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;

    fn prose(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    #[test]
    fn test_link_density_no_links() {
        let doc = Document::parse(r#"<div>Text content without any links.</div>"#);
        let element = doc.select_first("div").unwrap();
        assert_eq!(link_density(&element), 0.0);
    }

    #[test]
    fn test_link_density_all_links() {
        let doc = Document::parse(r##"<div><a href="#">Link text</a></div>"##);
        let element = doc.select_first("div").unwrap();
        assert_eq!(link_density(&element), 1.0);
    }

    #[test]
    fn test_link_density_mixed() {
        let doc = Document::parse(r##"<div>Some text <a href="#">link</a> more text</div>"##);
        let element = doc.select_first("div").unwrap();
        let density = link_density(&element);
        assert!(density > 0.0 && density < 1.0);
    }

    #[test]
    fn test_candidate_tag_bonus() {
        assert_eq!(candidate_tag_bonus("article"), 30.0);
        assert_eq!(candidate_tag_bonus("main"), 25.0);
        assert_eq!(candidate_tag_bonus("section"), 10.0);
        assert_eq!(candidate_tag_bonus("div"), 0.0);
    }

    #[test]
    fn test_class_weight() {
        let doc = Document::parse(
            r#"<div id="a" class="post-content">x</div><div id="b" class="sidebar">y</div><div id="c" class="wrapper">z</div>"#,
        );
        assert_eq!(class_id_weight(&doc.select_first("#a").unwrap()), 25.0);
        assert_eq!(class_id_weight(&doc.select_first("#b").unwrap()), -25.0);
        assert_eq!(class_id_weight(&doc.select_first("#c").unwrap()), 0.0);
    }

    #[test]
    fn test_candidate_score_components() {
        let html = format!(
            r#"<section class="article-body"><h2>Heading</h2><p>{}</p><p>{}</p></section>"#,
            prose(60),
            prose(60)
        );
        let doc = Document::parse(&html);
        let element = doc.select_first("section").unwrap();
        let result = candidate_score(&element);

        assert_eq!(result.paragraphs, 2);
        assert_eq!(result.headings, 1);
        assert_eq!(result.link_density, 0.0);

        let expected = result.text_length as f64 / 100.0 + 6.0 + 5.0 + 25.0 + 10.0;
        assert!((result.score - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_candidate_score_link_heavy_is_penalized() {
        let links: String = (0..20).map(|i| format!(r##"<a href="#">navigation link {}</a> "##, i)).collect();
        let doc = Document::parse(&format!("<div>{}</div>", links));
        let element = doc.select_first("div").unwrap();
        assert!(candidate_score(&element).score < 0.0);
    }

    #[test]
    fn test_confidence_none_is_zero() {
        assert_eq!(confidence(None), 0);
    }

    #[test]
    fn test_confidence_empty_is_zero() {
        let doc = Document::parse("<article></article>");
        let element = doc.select_first("article").unwrap();
        assert_eq!(confidence(Some(&element)), 0);
    }

    #[test]
    fn test_confidence_long_article_is_high() {
        let paragraphs: String = (0..6).map(|_| format!("<p>{}</p>", prose(100))).collect();
        let html = format!("<article><h1>Title</h1>{}</article>", paragraphs);
        let doc = Document::parse(&html);
        let element = doc.select_first("article").unwrap();
        assert!(confidence(Some(&element)) > 80);
    }

    #[test]
    fn test_confidence_stages() {
        let doc = Document::parse(&format!("<div>{}</div>", prose(12)));
        let element = doc.select_first("div").unwrap();
        assert_eq!(confidence(Some(&element)), 10);

        let doc = Document::parse(&format!(r#"<div role="main">{}</div>"#, prose(120)));
        let element = doc.select_first("div").unwrap();
        assert_eq!(confidence(Some(&element)), 10 + 15 + 15 + 20);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let paragraphs: String = (0..10).map(|_| format!("<p>{}</p>", prose(80))).collect();
        let html = format!(r#"<article class="main-content"><h2>T</h2>{}</article>"#, paragraphs);
        let doc = Document::parse(&html);
        let element = doc.select_first("article").unwrap();
        assert_eq!(confidence(Some(&element)), 100);
    }
}
