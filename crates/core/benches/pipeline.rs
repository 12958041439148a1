use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pagemark_core::{
    ConversionProfile, DetectionOptions, Document, MarkdownConverter, PageContext, builtin_profiles, clip,
    detect_content, find_matching_profile,
};

fn bench_parse(c: &mut Criterion) {
    let small = std::fs::read_to_string("../../tests/fixtures/recipe.html").unwrap();
    let medium = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "recipe"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "article"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_detection(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let doc = Document::parse(&html);
    let options = DetectionOptions::default();

    c.bench_function("detect_content", |b| b.iter(|| detect_content(black_box(&doc), black_box(&options))));
}

fn bench_conversion(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let mut group = c.benchmark_group("convert");

    for profile in builtin_profiles() {
        let converter = MarkdownConverter::new(&profile);
        group.bench_with_input(BenchmarkId::new("profile", &profile.id), &html, |b, html| {
            b.iter(|| converter.convert(black_box(html), None))
        });
    }

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let profiles = builtin_profiles();
    let context = PageContext::new("https://old.reddit.com/r/rust/comments/abc", "Weekly thread");

    c.bench_function("find_matching_profile", |b| {
        b.iter(|| find_matching_profile(black_box(&profiles), black_box(&context)))
    });
}

fn bench_clip(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let doc = Document::parse(&html);
    let profiles = vec![ConversionProfile { is_default: true, ..Default::default() }];
    let context = PageContext::new("https://journal.example.com/queues", "Queues");
    let options = DetectionOptions::default();

    c.bench_function("clip", |b| b.iter(|| clip(black_box(&doc), &context, &profiles, &options)));
}

criterion_group!(benches, bench_parse, bench_detection, bench_conversion, bench_matching, bench_clip);
criterion_main!(benches);
