//! Library API integration tests
use chrono::{TimeZone, Utc};
use pagemark_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn load_fixture(name: &str) -> Document {
    let html = std::fs::read_to_string(get_fixture_path(name)).unwrap();
    Document::parse(&html)
}

fn fixed_converter(profile: &ConversionProfile) -> MarkdownConverter {
    MarkdownConverter::new(profile).with_converted_at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

#[test]
fn test_detect_article_fixture() {
    let doc = load_fixture("article.html");
    let detected = detect_content(&doc, &DetectionOptions::default());

    assert_eq!(detected.title, "Designing Resilient Message Queues");
    assert_eq!(detected.author.as_deref(), Some("Priya Natarajan"));
    assert_eq!(detected.site_name.as_deref(), Some("Systems Journal"));
    assert!(detected.publish_date.is_some());
    assert!(detected.word_count >= 500);
    assert_eq!(detected.reading_time, detected.word_count.div_ceil(200));
    assert!(detected.confidence > 80, "confidence was {}", detected.confidence);

    let html = detected.html().unwrap();
    assert!(html.contains("Bounded queues and backpressure"));
    assert!(!html.contains("Sponsored"));
    assert!(!html.contains("Great write-up"));
    assert!(!html.contains("Popular posts"));
    assert!(!html.contains("Accept all"));
}

#[test]
fn test_detect_does_not_mutate_source() {
    let doc = load_fixture("article.html");
    let before = doc.as_string();
    let _ = ContentDetector::default().detect(&doc);
    assert_eq!(doc.as_string(), before);
}

#[test]
fn test_detect_empty_fixture() {
    let detected = detect_content(&load_fixture("empty.html"), &DetectionOptions::default());
    assert!(detected.main_content.is_none());
    assert_eq!(detected.word_count, 0);
    assert_eq!(detected.confidence, 0);
}

#[test]
fn test_recipe_survives_cookie_sweep() {
    let detected = detect_content(&load_fixture("recipe.html"), &DetectionOptions::default());

    let html = detected.html().unwrap();
    assert!(html.contains("How to Bake Cookies"));
    assert!(html.contains("Cookie Recipe"));
    assert!(html.contains("chocolate chips"));
}

#[test]
fn test_recipe_section_survives_cookie_sweep() {
    let intro = "Few things make a kitchen smell as good as a tray of cookies in the oven. ".repeat(6);
    let html = format!(
        r#"<html><body><main><article><h1>How to Bake Cookies</h1><p>{intro}</p>
        <section class="recipe"><h2>Cookie Recipe</h2><p>Cream the butter and sugar, then bake for twelve minutes.</p>
        <button>Print recipe</button></section></article></main></body></html>"#
    );

    let detected = detect_content(&Document::parse(&html), &DetectionOptions::default());
    let cleaned = detected.html().unwrap();
    assert!(cleaned.contains("Cookie Recipe"));
    assert!(cleaned.contains("twelve minutes"));
}

#[test]
fn test_cookie_banner_removed_from_page() {
    let body = "Plain reading material about gardening and soil health. ".repeat(10);
    let html = format!(
        r#"<html><body><main><div class="notice"><p>We use cookies. Manage consent.</p><button>Accept</button></div><p>{body}</p></main></body></html>"#
    );
    let doc = Document::parse(&html);

    let detected = detect_content(&doc, &DetectionOptions::default());
    let cleaned = detected.html().unwrap();
    assert!(!cleaned.contains("Manage consent"));
    assert!(cleaned.contains("gardening"));

    let keep = DetectionOptions::builder().remove_cookie_banners(false).build();
    let kept = detect_content(&doc, &keep).html().unwrap();
    assert!(kept.contains("Manage consent"));
}

#[test]
fn test_heuristic_detection_on_div_layout() {
    let detected = detect_content(&load_fixture("div_layout.html"), &DetectionOptions::default());
    let html = detected.html().unwrap();
    assert!(html.contains("Alpine lakes form"));
    assert!(!html.contains("Photos"));
    assert_eq!(detected.title, "Field Notes on Alpine Lakes");
}

#[test]
fn test_convert_detected_article() {
    let doc = load_fixture("article.html");
    let detected = detect_content(&doc, &DetectionOptions::default());
    let main = detected.main_content.as_ref().unwrap();

    let metadata = PageMetadata {
        title: Some(detected.title.clone()),
        url: Some("https://journal.example.com/queues".to_string()),
        author: detected.author.clone(),
        description: detected.description.clone(),
        published_date: detected.publish_date.clone(),
    };
    let result = fixed_converter(&ConversionProfile::default()).convert_document(main, Some(&metadata));

    assert!(result.content.starts_with("---\ntitle: Designing Resilient Message Queues\n"));
    assert!(result.content.contains("converted: 2024-06-01T12:00:00Z\n"));
    assert!(result.content.contains("# Designing Resilient Message Queues"));
    assert!(result.content.contains("## Bounded queues and backpressure"));
    assert_eq!(result.file_name, "designing-resilient-message-queues.md");
    assert_eq!(result.size_bytes, result.content.len());
}

#[test]
fn test_conversion_is_deterministic() {
    let html = std::fs::read_to_string(get_fixture_path("article.html")).unwrap();
    let metadata = PageMetadata { title: Some("Queues".to_string()), ..Default::default() };
    let converter = fixed_converter(&ConversionProfile::default());

    let first = converter.convert(&html, Some(&metadata));
    let second = converter.convert(&html, Some(&metadata));
    assert_eq!(first.content, second.content);
    assert_eq!(first.checksum, second.checksum);

    let mut changed = first.content.clone();
    changed.push('.');
    assert_ne!(convert::checksum(&changed), first.checksum);
}

#[test]
fn test_heading_rendering_rules() {
    let mut profile = ConversionProfile::default();
    profile.output_format.add_metadata = false;
    profile.content_filters.max_heading_level = 3;

    let converter = fixed_converter(&profile);
    assert_eq!(converter.convert("<h1>Title</h1>", None).content, "# Title");
    assert_eq!(converter.convert("<h4>X</h4>", None).content, "**X**");
}

#[test]
fn test_tracking_params_stripped() {
    assert_eq!(
        strip_tracking_params("https://example.com?utm_source=a&utm_medium=b&id=123"),
        "https://example.com?id=123"
    );
}

#[test]
fn test_file_name_rules() {
    let converter = fixed_converter(&ConversionProfile::default());
    let titled = PageMetadata { title: Some("Test Page!@#$%".to_string()), ..Default::default() };
    assert_eq!(converter.convert("<p>x</p>", Some(&titled)).file_name, "test-page.md");
    assert_eq!(converter.convert("<p>x</p>", None).file_name, "page-2024-06-01.md");
}

#[test]
fn test_priority_beats_list_order() {
    let rule = || ProfileMatchRule::new(RuleType::Domain, MatchMode::Contains, "example.com");
    let mut low = ConversionProfile::new("low", "Low");
    low.match_rules = Some(MatchRules { enabled: true, priority: 10, match_type: MatchType::Any, rules: vec![rule()] });
    let mut high = ConversionProfile::new("high", "High");
    high.match_rules = Some(MatchRules { enabled: true, priority: 50, match_type: MatchType::Any, rules: vec![rule()] });
    let mut fallback = ConversionProfile::new("fallback", "Fallback");
    fallback.is_default = true;

    let context = PageContext::new("https://www.example.com/a", "A");
    let forward = vec![low.clone(), high.clone(), fallback.clone()];
    let backward = vec![high, low, fallback];

    assert_eq!(find_matching_profile(&forward, &context).unwrap().id, "high");
    assert_eq!(find_matching_profile(&backward, &context).unwrap().id, "high");

    let elsewhere = PageContext::new("https://other.org/", "B");
    assert_eq!(find_matching_profile(&forward, &elsewhere).unwrap().id, "fallback");
}

#[test]
fn test_builtin_profiles_round_trip_through_json() {
    let profiles = builtin_profiles();
    validate_profiles(&profiles).unwrap();

    let json = profiles_to_json(&profiles).unwrap();
    let loaded = profiles_from_json(&json).unwrap();
    assert_eq!(loaded, profiles);
}

#[test]
fn test_load_profiles_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profiles.json");
    std::fs::write(
        &path,
        r#"[{"id": "plain", "name": "Plain", "isDefault": true, "markdownFlavor": "commonmark"}]"#,
    )
    .unwrap();

    let profiles = load_profiles(&path).unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].markdown_flavor, MarkdownFlavor::CommonMark);

    let missing = load_profiles(&dir.path().join("missing.json"));
    assert!(matches!(missing, Err(PagemarkError::FileNotFound(_))));
}

#[test]
fn test_clip_article_fixture() {
    let doc = load_fixture("article.html");
    let context = PageContext::new("https://journal.example.com/queues", "Queues");
    let clip = clip(&doc, &context, &builtin_profiles(), &DetectionOptions::default());

    assert!(clip.detection.confidence > 80);
    assert!(clip.result.content.contains("## Idempotent consumers"));
    assert!(!clip.result.content.contains("Copyright 2024"));
}
