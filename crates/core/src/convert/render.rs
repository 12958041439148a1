//! Tree walker that turns a markup tree into Markdown under a [`RuleTable`].
//!
//! Block children of a container are rendered on their own and joined with
//! blank lines. Runs of inline content between them are collected, tidied and
//! emitted as paragraphs. `<br>` travels through inline rendering as a
//! private-use marker and is turned into a hard break (or a space) only when
//! its paragraph is assembled.

use std::collections::HashMap;

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use textwrap::{Options, WordSplitter};

use super::rules::{ImageRule, LinkRule, RuleTable};
use crate::parse::collapse_whitespace;
use crate::profile::{CodeBlockStyle, HeadingStyle};

/// Stands in for `<br>` until paragraph assembly.
const BR_MARKER: char = '\u{E000}';

const HARD_BREAK: &str = "  \n";

/// Elements that never produce Markdown.
const SKIPPED: &[&str] = &[
    "script", "style", "noscript", "template", "head", "button", "input", "select", "textarea", "iframe", "svg",
    "canvas", "object", "embed",
];

const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "center", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup",
    "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "ul",
];

fn is_skipped(tag: &str) -> bool {
    SKIPPED.contains(&tag)
}

fn is_block(tag: &str) -> bool {
    BLOCKS.contains(&tag)
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// A heading that made it into the output, for the table of contents.
#[derive(Debug, Clone)]
struct Heading {
    level: u8,
    text: String,
}

/// Renders the children of `root` as Markdown.
pub fn render(rules: &RuleTable, root: NodeRef<'_, Node>) -> String {
    let mut renderer = Renderer::new(rules);
    let mut blocks = renderer.blocks(root);

    if let Some(definitions) = renderer.link_definitions() {
        blocks.push(definitions);
    }

    if rules.table_of_contents
        && let Some(toc) = renderer.table_of_contents()
    {
        blocks.insert(0, toc);
    }

    blocks.join("\n\n").replace(BR_MARKER, " ")
}

struct Renderer<'r> {
    rules: &'r RuleTable,
    links: Vec<String>,
    link_numbers: HashMap<String, usize>,
    headings: Vec<Heading>,
}

impl<'r> Renderer<'r> {
    fn new(rules: &'r RuleTable) -> Self {
        Self { rules, links: Vec::new(), link_numbers: HashMap::new(), headings: Vec::new() }
    }

    /// Renders the children of a container as a list of blocks.
    fn blocks(&mut self, node: NodeRef<'_, Node>) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut inline = String::new();

        for child in node.children() {
            if let Some(el) = ElementRef::wrap(child) {
                let tag = el.value().name();
                if is_skipped(tag) {
                    continue;
                }
                if is_block(tag) {
                    self.flush(&mut inline, &mut blocks);
                    let rendered = self.block(el);
                    if !rendered.trim().is_empty() {
                        blocks.push(rendered);
                    }
                    continue;
                }
            }
            inline.push_str(&self.inline(child));
        }

        self.flush(&mut inline, &mut blocks);
        blocks
    }

    fn flush(&self, inline: &mut String, blocks: &mut Vec<String>) {
        let text = self.paragraph(inline);
        if !text.is_empty() {
            blocks.push(text);
        }
        inline.clear();
    }

    fn block(&mut self, el: ElementRef<'_>) -> String {
        let tag = el.value().name();
        if let Some(level) = heading_level(tag) {
            return self.heading(el, level);
        }

        match tag {
            "p" => {
                let inline = self.inline_children(el);
                self.paragraph(&inline)
            }
            "pre" => self.code_block(el),
            "blockquote" => self.blockquote(el),
            "ul" => self.list(el, false),
            "ol" => self.list(el, true),
            "hr" => self.rules.hr.clone(),
            "table" => self.table(el),
            "dl" => self.definition_list(el),
            _ => self.blocks(*el).join("\n\n"),
        }
    }

    fn inline(&mut self, node: NodeRef<'_, Node>) -> String {
        match node.value() {
            Node::Text(text) => escape_text(&collapse_text(text)),
            Node::Element(_) => ElementRef::wrap(node).map(|el| self.inline_element(el)).unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn inline_children(&mut self, el: ElementRef<'_>) -> String {
        el.children().map(|child| self.inline(child)).collect()
    }

    fn inline_element(&mut self, el: ElementRef<'_>) -> String {
        let tag = el.value().name();
        if is_skipped(tag) {
            return String::new();
        }

        match tag {
            "br" => BR_MARKER.to_string(),
            "wbr" => String::new(),
            "strong" | "b" => {
                let delimiter = self.rules.strong_delimiter.clone();
                self.delimited(el, &delimiter)
            }
            "em" | "i" => {
                let delimiter = self.rules.em_delimiter.clone();
                self.delimited(el, &delimiter)
            }
            "del" | "s" | "strike" if self.rules.gfm => self.delimited(el, "~~"),
            "code" | "kbd" | "samp" | "tt" => inline_code(&el.text().collect::<String>()),
            "a" => self.link(el),
            "img" => self.image(el),
            _ if is_block(tag) => format!(" {} ", self.inline_children(el)),
            _ => self.inline_children(el),
        }
    }

    /// Wraps trimmed inline content in `delimiter`, keeping surrounding
    /// whitespace outside the markers.
    fn delimited(&mut self, el: ElementRef<'_>, delimiter: &str) -> String {
        let inner = self.inline_children(el);
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            return if inner.is_empty() { String::new() } else { " ".to_string() };
        }

        let lead = if inner.starts_with(char::is_whitespace) { " " } else { "" };
        let trail = if inner.ends_with(char::is_whitespace) { " " } else { "" };
        format!("{lead}{delimiter}{trimmed}{delimiter}{trail}")
    }

    fn link(&mut self, el: ElementRef<'_>) -> String {
        let inner = self.inline_children(el);
        let text = line_text(&inner);
        if text.is_empty() {
            return String::new();
        }

        let lead = if inner.starts_with(char::is_whitespace) { " " } else { "" };
        let trail = if inner.ends_with(char::is_whitespace) { " " } else { "" };

        let href = el.value().attr("href").map(str::trim).unwrap_or_default();
        if href.is_empty() || href.to_ascii_lowercase().starts_with("javascript:") {
            return format!("{lead}{text}{trail}");
        }

        let rendered = match self.rules.link_rule {
            LinkRule::TextOnly => text,
            LinkRule::Inline => {
                let title = el.value().attr("title").map(title_suffix).unwrap_or_default();
                format!("[{}]({}{})", text, link_destination(href), title)
            }
            LinkRule::Reference => format!("[{}][{}]", text, self.link_number(href)),
            LinkRule::Footnote => format!("{}[^{}]", text, self.link_number(href)),
        };

        format!("{lead}{rendered}{trail}")
    }

    fn link_number(&mut self, href: &str) -> usize {
        if let Some(number) = self.link_numbers.get(href) {
            return *number;
        }
        self.links.push(href.to_string());
        let number = self.links.len();
        self.link_numbers.insert(href.to_string(), number);
        number
    }

    fn link_definitions(&self) -> Option<String> {
        if self.links.is_empty() {
            return None;
        }

        let prefix = match self.rules.link_rule {
            LinkRule::Footnote => "^",
            _ => "",
        };
        let lines: Vec<String> = self
            .links
            .iter()
            .enumerate()
            .map(|(i, url)| format!("[{}{}]: {}", prefix, i + 1, link_destination(url)))
            .collect();
        Some(lines.join("\n"))
    }

    fn image(&self, el: ElementRef<'_>) -> String {
        let ImageRule::Link { fallback_alt } = &self.rules.image_rule else {
            return String::new();
        };

        let src = el
            .value()
            .attr("src")
            .or_else(|| el.value().attr("data-src"))
            .map(str::trim)
            .unwrap_or_default();
        if src.is_empty() {
            return String::new();
        }

        let alt = match el.value().attr("alt") {
            Some(alt) => collapse_whitespace(alt),
            None => fallback_alt.clone(),
        };
        let title = el.value().attr("title").map(title_suffix).unwrap_or_default();

        format!("![{}]({}{})", escape_brackets(&alt), link_destination(src), title)
    }

    fn heading(&mut self, el: ElementRef<'_>, level: u8) -> String {
        let inline = self.inline_children(el);
        let text = line_text(&inline);
        if text.is_empty() {
            return String::new();
        }

        if level > self.rules.max_heading_level {
            let strong = &self.rules.strong_delimiter;
            return format!("{strong}{text}{strong}");
        }

        self.headings.push(Heading { level, text: collapse_whitespace(&el.text().collect::<String>()) });
        self.format_heading(&text, level)
    }

    fn format_heading(&self, text: &str, level: u8) -> String {
        match (self.rules.heading_style, level) {
            (HeadingStyle::Setext, 1) => {
                format!("{}\n{}", escape_line_start(text), "=".repeat(text.chars().count().max(3)))
            }
            (HeadingStyle::Setext, 2) => {
                format!("{}\n{}", escape_line_start(text), "-".repeat(text.chars().count().max(3)))
            }
            _ => format!("{} {}", "#".repeat(level as usize), text),
        }
    }

    fn code_block(&self, pre: ElementRef<'_>) -> String {
        let raw: String = pre.text().collect();
        let code = raw.strip_suffix('\n').unwrap_or(&raw);
        if code.trim().is_empty() {
            return String::new();
        }

        match self.rules.code_block_style {
            CodeBlockStyle::Fenced => {
                let language = if self.rules.code_language {
                    let code_child = pre.children().filter_map(ElementRef::wrap).find(|c| c.value().name() == "code");
                    code_child.and_then(code_language).or_else(|| code_language(pre)).unwrap_or_default()
                } else {
                    String::new()
                };
                let fence = fence_for(&self.rules.fence, code);
                format!("{fence}{language}\n{code}\n{fence}")
            }
            CodeBlockStyle::Indented => code
                .lines()
                .map(|line| if line.is_empty() { String::new() } else { format!("    {line}") })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn blockquote(&mut self, el: ElementRef<'_>) -> String {
        let inner = self.blocks(*el).join("\n\n");
        inner
            .lines()
            .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {line}") })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn list(&mut self, el: ElementRef<'_>, ordered: bool) -> String {
        let start = if ordered {
            el.value().attr("start").and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1)
        } else {
            1
        };

        let mut items: Vec<String> = Vec::new();
        let mut index: i64 = 0;

        for child in el.children().filter_map(ElementRef::wrap) {
            let tag = child.value().name();
            if tag == "ul" || tag == "ol" {
                // A list nested directly in a list belongs to the previous item.
                let nested = self.list(child, tag == "ol");
                match items.last_mut() {
                    Some(last) => {
                        let pad = " ".repeat(self.rules.list_indent.max(2));
                        last.push('\n');
                        last.push_str(&indent_lines(&nested, &pad));
                    }
                    None => items.push(nested),
                }
                continue;
            }
            if tag != "li" {
                continue;
            }

            let marker =
                if ordered { format!("{}.", start + index) } else { self.rules.bullet_marker.to_string() };
            index += 1;

            let mut body = self.blocks(*child).join("\n");
            if self.rules.gfm
                && let Some(checked) = task_checkbox(child)
            {
                body = format!("[{}] {}", if checked { "x" } else { " " }, body);
            }

            items.push(self.list_item(&marker, &body));
        }

        items.join("\n")
    }

    fn list_item(&self, marker: &str, body: &str) -> String {
        let pad = " ".repeat(self.rules.item_indent(marker));
        let mut lines = body.lines();

        let mut out = match lines.next() {
            Some(first) if !first.is_empty() => format!("{marker} {first}"),
            _ => marker.to_string(),
        };

        for line in lines {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&pad);
                out.push_str(line);
            }
        }
        out
    }

    fn table(&mut self, table: ElementRef<'_>) -> String {
        let caption = table
            .children()
            .filter_map(ElementRef::wrap)
            .find(|c| c.value().name() == "caption")
            .map(|c| collapse_whitespace(&c.text().collect::<String>()))
            .filter(|c| !c.is_empty());

        let rows: Vec<Vec<String>> = table_rows(table)
            .into_iter()
            .map(|row| {
                row.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                    .map(|cell| {
                        let inline = self.inline_children(cell);
                        line_text(&inline).replace('|', "\\|")
                    })
                    .collect()
            })
            .filter(|cells: &Vec<String>| !cells.is_empty())
            .collect();

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return caption.unwrap_or_default();
        }

        let body = if self.rules.gfm {
            let mut lines = Vec::with_capacity(rows.len() + 1);
            for (i, row) in rows.iter().enumerate() {
                let mut cells = row.clone();
                cells.resize(columns, String::new());
                lines.push(format!("| {} |", cells.join(" | ")));
                if i == 0 {
                    lines.push(format!("|{}", " --- |".repeat(columns)));
                }
            }
            lines.join("\n")
        } else {
            rows.iter().map(|row| row.join(" | ")).collect::<Vec<_>>().join(HARD_BREAK)
        };

        match caption {
            Some(caption) => format!("{caption}\n\n{body}"),
            None => body,
        }
    }

    fn definition_list(&mut self, dl: ElementRef<'_>) -> String {
        let mut lines = Vec::new();
        for child in dl.children().filter_map(ElementRef::wrap) {
            let inline = self.inline_children(child);
            let text = line_text(&inline);
            if text.is_empty() {
                continue;
            }
            match child.value().name() {
                "dt" => lines.push(text),
                "dd" => lines.push(format!(": {text}")),
                _ => {}
            }
        }
        lines.join("\n")
    }

    /// Assembles an inline run into paragraph text.
    fn paragraph(&self, inline: &str) -> String {
        let mut segments: Vec<String> = inline.split(BR_MARKER).map(collapse_whitespace).collect();
        while segments.last().is_some_and(String::is_empty) {
            segments.pop();
        }
        let leading = segments.iter().take_while(|s| s.is_empty()).count();
        let segments = &segments[leading..];

        if !self.rules.hard_breaks {
            return escape_line_starts(&self.wrap(&collapse_whitespace(&segments.join(" "))));
        }

        segments.iter().map(|segment| escape_line_starts(&self.wrap(segment))).collect::<Vec<_>>().join(HARD_BREAK)
    }

    fn wrap(&self, text: &str) -> String {
        if self.rules.line_width == 0 || text.chars().count() <= self.rules.line_width {
            return text.to_string();
        }
        let options =
            Options::new(self.rules.line_width).break_words(false).word_splitter(WordSplitter::NoHyphenation);
        textwrap::fill(text, options)
    }

    fn table_of_contents(&self) -> Option<String> {
        let min_level = self.headings.iter().map(|h| h.level).min()?;
        let mut seen: HashMap<String, usize> = HashMap::new();
        let bullet = self.rules.bullet_marker;
        let step = self.rules.item_indent(bullet);

        let mut lines = vec![self.format_heading("Table of Contents", 2.min(self.rules.max_heading_level)), String::new()];
        for heading in &self.headings {
            let base = slugify(&heading.text);
            let count = seen.entry(base.clone()).or_insert(0);
            let slug = if *count == 0 { base } else { format!("{}-{}", base, count) };
            *count += 1;

            let indent = " ".repeat((heading.level - min_level) as usize * step);
            lines.push(format!("{indent}{bullet} [{}](#{slug})", escape_text(&heading.text)));
        }

        Some(lines.join("\n"))
    }
}

/// Direct rows of `table`, looking through `thead`/`tbody`/`tfoot` but not
/// into nested tables.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child.children().filter_map(ElementRef::wrap).filter(|r| r.value().name() == "tr"))
            }
            _ => {}
        }
    }
    rows
}

/// `Some(checked)` when the item starts with a checkbox.
fn task_checkbox(li: ElementRef<'_>) -> Option<bool> {
    let first = li.children().filter_map(ElementRef::wrap).next()?;
    let input = if first.value().name() == "p" { first.children().filter_map(ElementRef::wrap).next()? } else { first };

    let is_checkbox = input.value().name() == "input"
        && input.value().attr("type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"));
    is_checkbox.then(|| input.value().attr("checked").is_some())
}

fn code_language(el: ElementRef<'_>) -> Option<String> {
    el.value()
        .classes()
        .find_map(|class| class.strip_prefix("language-").or_else(|| class.strip_prefix("lang-")))
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

/// The configured fence, lengthened past the longest run of its character
/// inside `code`.
fn fence_for(fence: &str, code: &str) -> String {
    let Some(ch) = fence.chars().next() else {
        return "```".to_string();
    };

    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        if c == ch {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }

    let len = fence.chars().count();
    if longest >= len { ch.to_string().repeat(longest + 1) } else { fence.to_string() }
}

fn inline_code(text: &str) -> String {
    let text = text.replace(['\n', '\r'], " ");
    if text.trim().is_empty() {
        return String::new();
    }

    let longest = text.split(|c: char| c != '`').map(str::len).max().unwrap_or(0);
    let ticks = "`".repeat(longest + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{ticks} {text} {ticks}")
    } else {
        format!("{ticks}{text}{ticks}")
    }
}

/// Collapses whitespace runs to one space, keeping a single space at either
/// edge when the original had one.
fn collapse_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Single-line text: breaks become spaces, whitespace is collapsed.
fn line_text(inline: &str) -> String {
    collapse_whitespace(&inline.replace(BR_MARKER, " "))
}

/// Escapes characters Markdown would otherwise read as syntax. Underscores
/// inside words are left alone.
fn escape_text(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\\' | '*' | '`' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            '_' => {
                let prev = i > 0 && chars[i - 1].is_alphanumeric();
                let next = chars.get(i + 1).is_some_and(|n| n.is_alphanumeric());
                if !(prev && next) {
                    out.push('\\');
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text at the start of a line that Markdown would read as block
/// syntax: ATX headings, quotes, bullets, ordered markers, fences and
/// Setext underlines.
fn escape_line_start(line: &str) -> String {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let Some(first) = body.chars().next() else {
        return line.to_string();
    };
    let followed_by_space = |marker_len: usize| body[marker_len..].chars().next().is_none_or(char::is_whitespace);

    let hashes = body.chars().take_while(|c| *c == '#').count();
    let escape_first = match first {
        '#' => hashes <= 6 && followed_by_space(hashes),
        '>' => true,
        '-' | '+' => followed_by_space(1) || body.chars().all(|c| c == first),
        '=' => body.chars().all(|c| c == '='),
        '~' => body.starts_with("~~~"),
        _ => false,
    };
    if escape_first {
        return format!("{indent}\\{body}");
    }

    let digits = body.chars().take_while(char::is_ascii_digit).count();
    if (1..=9).contains(&digits)
        && let Some(delimiter) = body[digits..].chars().next()
        && (delimiter == '.' || delimiter == ')')
        && followed_by_space(digits + 1)
    {
        return format!("{indent}{}\\{}", &body[..digits], &body[digits..]);
    }

    line.to_string()
}

fn escape_line_starts(text: &str) -> String {
    text.split('\n').map(escape_line_start).collect::<Vec<_>>().join("\n")
}

fn escape_brackets(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

fn link_destination(url: &str) -> String {
    if url.contains(char::is_whitespace) || url.contains('(') || url.contains(')') {
        format!("<{}>", url)
    } else {
        url.to_string()
    }
}

fn title_suffix(title: &str) -> String {
    let title = collapse_whitespace(title);
    if title.is_empty() { String::new() } else { format!(" \"{}\"", title.replace('"', "\\\"")) }
}

/// GitHub-style heading anchor.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('-'),
            _ => None,
        })
        .collect()
}

fn indent_lines(text: &str, pad: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{pad}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}
