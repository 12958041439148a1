use crate::profile::{
    CodeBlockStyle, CodeBlockSyntax, ConversionProfile, HeadingStyle, ImageStrategy, LinkHandlingStyle, LinkStyle,
};

/// How anchors are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRule {
    /// `[text](url)`
    Inline,
    /// `[text][n]` with `[n]: url` definitions at the end.
    Reference,
    /// `text[^n]` with `[^n]: url` definitions at the end.
    Footnote,
    /// The anchor's text only.
    TextOnly,
}

/// How images are emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRule {
    Link { fallback_alt: String },
    Skip,
}

/// The rendering rules derived from one profile.
///
/// A table is immutable once built and belongs to the converter that built
/// it; a different profile means a different table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    pub heading_style: HeadingStyle,
    pub max_heading_level: u8,
    pub bullet_marker: &'static str,
    pub code_block_style: CodeBlockStyle,
    pub fence: String,
    pub code_language: bool,
    pub em_delimiter: String,
    pub strong_delimiter: String,
    pub hr: String,
    pub list_indent: usize,
    pub line_width: usize,
    pub link_rule: LinkRule,
    pub image_rule: ImageRule,
    pub gfm: bool,
    pub hard_breaks: bool,
    pub table_of_contents: bool,
}

impl RuleTable {
    pub fn from_profile(profile: &ConversionProfile) -> Self {
        let options = &profile.conversion_options;
        let formatting = &profile.formatting;

        let link_rule = match (profile.link_handling.style, profile.output_format.add_footnotes, options.link_style) {
            (LinkHandlingStyle::Remove, _, _) => LinkRule::TextOnly,
            (_, true, _) => LinkRule::Footnote,
            (_, false, LinkStyle::Referenced) => LinkRule::Reference,
            (_, false, LinkStyle::Inlined) => LinkRule::Inline,
        };

        let image_rule = match profile.image_handling.strategy {
            ImageStrategy::Skip => ImageRule::Skip,
            ImageStrategy::Link => ImageRule::Link { fallback_alt: profile.image_handling.fallback_alt_text.clone() },
        };

        let non_empty = |value: &Option<String>| value.as_ref().filter(|v| !v.is_empty()).cloned();

        Self {
            heading_style: options.heading_style,
            max_heading_level: profile.content_filters.max_heading_level.clamp(1, 6),
            bullet_marker: options.bullet_list_marker.as_str(),
            code_block_style: options.code_block_style,
            fence: if options.fence.is_empty() { "```".to_string() } else { options.fence.clone() },
            code_language: formatting.code_block_syntax == CodeBlockSyntax::Auto,
            em_delimiter: non_empty(&options.em_delimiter)
                .unwrap_or_else(|| formatting.italic_style.delimiter().to_string()),
            strong_delimiter: non_empty(&options.strong_delimiter)
                .unwrap_or_else(|| formatting.bold_style.delimiter().to_string()),
            hr: if formatting.hr_style.trim().is_empty() { "---".to_string() } else { formatting.hr_style.clone() },
            list_indent: formatting.list_indentation,
            line_width: formatting.line_width,
            link_rule,
            image_rule,
            gfm: profile.markdown_flavor.has_gfm_extensions(),
            hard_breaks: profile.output_format.preserve_newlines,
            table_of_contents: profile.output_format.add_table_of_contents,
        }
    }

    /// Indentation for the content of a list item whose marker is `marker`.
    pub fn item_indent(&self, marker: &str) -> usize {
        self.list_indent.max(marker.chars().count() + 1)
    }
}
