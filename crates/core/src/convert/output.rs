//! Final shaping of rendered Markdown: whitespace cleanup, frontmatter,
//! file naming and checksums.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};

use super::PageMetadata;

static LIST_MARKER_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([-*+]|\d+[.)])[ \t]{2,}(\S)").expect("LIST_MARKER_SPACES regex should compile"));

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([-*+]|\d+[.)])(\s|$)").expect("LIST_ITEM regex should compile"));

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("NON_ALPHANUMERIC regex should compile"));

const MAX_FILE_STEM: usize = 100;

/// Name written to the `converter` frontmatter field.
pub const CONVERTER_NAME: &str = "pagemark";

/// Leading indentation in columns, counting a tab as four.
fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Tidies rendered Markdown.
///
/// Outside code, blank lines lose stray whitespace, list markers are followed
/// by exactly one space and runs of blank lines collapse to one. Fenced and
/// indented code blocks pass through untouched. Leading and trailing blank
/// lines are dropped.
pub fn post_process(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut fence: Option<String> = None;
    let mut indented_code = false;
    let mut after_blank = true;
    let mut in_list = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        let marker: String = trimmed.chars().take_while(|c| *c == '`' || *c == '~').collect();

        if let Some(open) = &fence {
            if marker.starts_with(open.as_str()) && trimmed.trim_end() == marker {
                fence = None;
            }
            lines.push(line.to_string());
            continue;
        }

        if indented_code {
            if trimmed.is_empty() || indent_width(line) >= 4 {
                lines.push(line.to_string());
                continue;
            }
            indented_code = false;
        }

        if trimmed.is_empty() {
            if !after_blank {
                lines.push(String::new());
            }
            after_blank = true;
            continue;
        }

        if marker.len() >= 3 {
            fence = Some(marker);
            lines.push(line.to_string());
        } else if after_blank && !in_list && indent_width(line) >= 4 {
            indented_code = true;
            lines.push(line.to_string());
        } else {
            if LIST_ITEM.is_match(line) {
                in_list = true;
            } else if indent_width(line) == 0 {
                in_list = false;
            }
            let line = if lines.is_empty() { trimmed } else { line };
            lines.push(LIST_MARKER_SPACES.replace(line, "$1$2 $3").into_owned());
        }
        after_blank = false;
    }

    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if let Some(last) = lines.last_mut()
        && fence.is_none()
        && !indented_code
    {
        last.truncate(last.trim_end().len());
    }
    lines.join("\n")
}

/// Flattens a frontmatter value onto one line.
fn frontmatter_value(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}

/// Quotes the title when it contains characters YAML would read as syntax.
fn frontmatter_title(title: &str) -> String {
    const SPECIAL: &[char] = &[':', '[', ']', '{', '}', '|', '>', '<', '"', '\''];
    let title = frontmatter_value(title);
    if title.contains(SPECIAL) {
        format!("\"{}\"", title.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        title
    }
}

/// Builds the `---` frontmatter block.
///
/// Field order is fixed: title, url, author, description, published,
/// converted, converter, profile. Absent or blank fields are omitted. Only
/// the title is ever quoted.
pub fn frontmatter(metadata: &PageMetadata, profile_name: &str, converted_at: DateTime<Utc>) -> String {
    let mut block = String::from("---\n");

    let optional = [
        ("title", metadata.title.as_deref()),
        ("url", metadata.url.as_deref()),
        ("author", metadata.author.as_deref()),
        ("description", metadata.description.as_deref()),
        ("published", metadata.published_date.as_deref()),
    ];
    for (key, value) in optional {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            let value = if key == "title" { frontmatter_title(value) } else { frontmatter_value(value) };
            block.push_str(&format!("{}: {}\n", key, value));
        }
    }

    block.push_str(&format!("converted: {}\n", converted_at.to_rfc3339_opts(SecondsFormat::Secs, true)));
    block.push_str(&format!("converter: {}\n", CONVERTER_NAME));
    if !profile_name.trim().is_empty() {
        block.push_str(&format!("profile: {}\n", frontmatter_value(profile_name.trim())));
    }

    block.push_str("---\n");
    block
}

/// Derives a Markdown file name from a page title.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use pagemark_core::convert::file_name;
///
/// let date = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
/// assert_eq!(file_name(Some("Test Page!@#$%"), date), "test-page.md");
/// assert_eq!(file_name(None, date), "page-2024-03-09.md");
/// ```
pub fn file_name(title: Option<&str>, date: DateTime<Utc>) -> String {
    let slug = title
        .map(|t| NON_ALPHANUMERIC.replace_all(&t.to_lowercase(), "-").trim_matches('-').to_string())
        .unwrap_or_default();

    if slug.is_empty() {
        return format!("page-{}.md", date.format("%Y-%m-%d"));
    }

    let stem: String = slug.chars().take(MAX_FILE_STEM).collect();
    format!("{}.md", stem.trim_end_matches('-'))
}

/// Lowercase hex SHA-256 of `content`.
pub fn checksum(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}
