//! Conversion profiles.
//!
//! A [`ConversionProfile`] is a named bundle of formatting and filtering
//! choices. Profiles are plain serde values in the camelCase JSON layout the
//! storage side persists; every section falls back to its documented default
//! when missing.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{MarkdownFlavor, profiles_from_json};
//!
//! let json = r#"[{"id": "notes", "name": "Notes", "isDefault": true, "markdownFlavor": "commonmark"}]"#;
//! let profiles = profiles_from_json(json).unwrap();
//! assert_eq!(profiles[0].markdown_flavor, MarkdownFlavor::CommonMark);
//! assert_eq!(profiles[0].content_filters.max_heading_level, 6);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{PagemarkError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownFlavor {
    CommonMark,
    #[default]
    Gfm,
    Github,
    Gitlab,
    Reddit,
    Discord,
    Minimal,
}

impl MarkdownFlavor {
    /// Whether GFM tables, strikethrough and task lists are enabled.
    pub fn has_gfm_extensions(self) -> bool {
        matches!(self, MarkdownFlavor::Gfm | MarkdownFlavor::Github)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStrategy {
    #[default]
    Link,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageHandling {
    pub strategy: ImageStrategy,
    /// Alt text used when an image has no `alt` attribute.
    pub fallback_alt_text: String,
}

impl Default for ImageHandling {
    fn default() -> Self {
        Self { strategy: ImageStrategy::Link, fallback_alt_text: "image".to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkHandlingStyle {
    #[default]
    Absolute,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkHandling {
    pub style: LinkHandlingStyle,
    pub remove_tracking_params: bool,
}

impl Default for LinkHandling {
    fn default() -> Self {
        Self { style: LinkHandlingStyle::Absolute, remove_tracking_params: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentFilters {
    /// When non-empty, only matching nodes (and their ancestor path) are kept.
    pub include_css: Vec<String>,
    pub exclude_css: Vec<String>,
    pub include_hidden: bool,
    /// Headings deeper than this render as strong text (1-6).
    pub max_heading_level: u8,
}

impl Default for ContentFilters {
    fn default() -> Self {
        Self { include_css: Vec::new(), exclude_css: Vec::new(), include_hidden: false, max_heading_level: 6 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoldStyle {
    #[default]
    #[serde(alias = "**")]
    Asterisks,
    #[serde(alias = "__")]
    Underscores,
}

impl BoldStyle {
    pub fn delimiter(self) -> &'static str {
        match self {
            BoldStyle::Asterisks => "**",
            BoldStyle::Underscores => "__",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItalicStyle {
    #[serde(alias = "*")]
    Asterisk,
    #[default]
    #[serde(alias = "_")]
    Underscore,
}

impl ItalicStyle {
    pub fn delimiter(self) -> &'static str {
        match self {
            ItalicStyle::Asterisk => "*",
            ItalicStyle::Underscore => "_",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeBlockSyntax {
    /// Annotate fences with the language from `language-*`/`lang-*` classes.
    #[default]
    Auto,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Formatting {
    pub bold_style: BoldStyle,
    pub italic_style: ItalicStyle,
    pub hr_style: String,
    pub code_block_syntax: CodeBlockSyntax,
    pub list_indentation: usize,
    /// Paragraph wrap width; 0 disables wrapping.
    pub line_width: usize,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            bold_style: BoldStyle::Asterisks,
            italic_style: ItalicStyle::Underscore,
            hr_style: "---".to_string(),
            code_block_syntax: CodeBlockSyntax::Auto,
            list_indentation: 2,
            line_width: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    #[default]
    Atx,
    Setext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BulletMarker {
    #[default]
    #[serde(rename = "-")]
    Dash,
    #[serde(rename = "*")]
    Asterisk,
    #[serde(rename = "+")]
    Plus,
}

impl BulletMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            BulletMarker::Dash => "-",
            BulletMarker::Asterisk => "*",
            BulletMarker::Plus => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeBlockStyle {
    #[default]
    Fenced,
    Indented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    #[default]
    Inlined,
    Referenced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionOptions {
    pub heading_style: HeadingStyle,
    pub bullet_list_marker: BulletMarker,
    pub code_block_style: CodeBlockStyle,
    pub fence: String,
    /// Overrides `formatting.italicStyle` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub em_delimiter: Option<String>,
    /// Overrides `formatting.boldStyle` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong_delimiter: Option<String>,
    pub link_style: LinkStyle,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletMarker::Dash,
            code_block_style: CodeBlockStyle::Fenced,
            fence: "```".to_string(),
            em_delimiter: None,
            strong_delimiter: None,
            link_style: LinkStyle::Inlined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputFormat {
    pub add_metadata: bool,
    pub add_table_of_contents: bool,
    pub add_footnotes: bool,
    pub preserve_newlines: bool,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self { add_metadata: true, add_table_of_contents: false, add_footnotes: false, preserve_newlines: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Domain,
    UrlPattern,
    Title,
    MetaTag,
    Selector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

/// A single (field, mode, pattern) test.
///
/// For [`RuleType::MetaTag`] the pattern is `name:content`, split at the last
/// colon; an empty content part only requires the tag to be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMatchRule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub match_mode: MatchMode,
    pub pattern: String,
}

impl ProfileMatchRule {
    pub fn new(rule_type: RuleType, match_mode: MatchMode, pattern: impl Into<String>) -> Self {
        Self { rule_type, match_mode, pattern: pattern.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchRules {
    pub enabled: bool,
    /// 0-100, higher wins.
    pub priority: u32,
    pub match_type: MatchType,
    pub rules: Vec<ProfileMatchRule>,
}

/// A named bundle of formatting and filtering choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionProfile {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub markdown_flavor: MarkdownFlavor,
    pub image_handling: ImageHandling,
    pub link_handling: LinkHandling,
    pub content_filters: ContentFilters,
    pub formatting: Formatting,
    pub conversion_options: ConversionOptions,
    pub output_format: OutputFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_rules: Option<MatchRules>,
}

impl Default for ConversionProfile {
    fn default() -> Self {
        Self::new("default", "Default")
    }
}

impl ConversionProfile {
    /// A profile with every section at its default.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_default: false,
            markdown_flavor: MarkdownFlavor::default(),
            image_handling: ImageHandling::default(),
            link_handling: LinkHandling::default(),
            content_filters: ContentFilters::default(),
            formatting: Formatting::default(),
            conversion_options: ConversionOptions::default(),
            output_format: OutputFormat::default(),
            match_rules: None,
        }
    }

    /// Match rules, when present and enabled.
    pub fn active_match_rules(&self) -> Option<&MatchRules> {
        self.match_rules.as_ref().filter(|rules| rules.enabled)
    }

    /// Checks the invariants of a single profile.
    ///
    /// # Errors
    ///
    /// Returns [`PagemarkError::InvalidProfile`] when the id is empty, the
    /// heading cap is outside 1-6, the priority exceeds 100 or the fence is
    /// not at least three backticks or tildes.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PagemarkError::InvalidProfile(format!("profile '{}' has an empty id", self.name)));
        }

        let level = self.content_filters.max_heading_level;
        if !(1..=6).contains(&level) {
            return Err(PagemarkError::InvalidProfile(format!(
                "profile '{}': maxHeadingLevel must be between 1 and 6, got {}",
                self.id, level
            )));
        }

        if let Some(rules) = &self.match_rules
            && rules.priority > 100
        {
            return Err(PagemarkError::InvalidProfile(format!(
                "profile '{}': priority must be between 0 and 100, got {}",
                self.id, rules.priority
            )));
        }

        let fence = &self.conversion_options.fence;
        let fence_char_ok = fence.chars().all(|c| c == '`') || fence.chars().all(|c| c == '~');
        if fence.chars().count() < 3 || !fence_char_ok {
            return Err(PagemarkError::InvalidProfile(format!(
                "profile '{}': fence must be three or more backticks or tildes, got '{}'",
                self.id, fence
            )));
        }

        Ok(())
    }
}

/// Validates a profile collection: every profile individually, unique ids and
/// exactly one default.
///
/// # Errors
///
/// Returns [`PagemarkError::InvalidProfile`] describing the first violation.
pub fn validate_profiles(profiles: &[ConversionProfile]) -> Result<()> {
    for (i, profile) in profiles.iter().enumerate() {
        profile.validate()?;
        if profiles[..i].iter().any(|earlier| earlier.id == profile.id) {
            return Err(PagemarkError::InvalidProfile(format!("duplicate profile id '{}'", profile.id)));
        }
    }

    let defaults = profiles.iter().filter(|p| p.is_default).count();
    if defaults != 1 {
        return Err(PagemarkError::InvalidProfile(format!(
            "expected exactly one default profile, found {}",
            defaults
        )));
    }

    Ok(())
}

/// Parses a JSON array of profiles.
///
/// # Errors
///
/// Returns [`PagemarkError::Json`] if the input is not a valid profile array.
pub fn profiles_from_json(json: &str) -> Result<Vec<ConversionProfile>> {
    Ok(serde_json::from_str(json)?)
}

/// Serializes profiles as pretty-printed JSON.
pub fn profiles_to_json(profiles: &[ConversionProfile]) -> Result<String> {
    Ok(serde_json::to_string_pretty(profiles)?)
}

/// Loads and validates a profile file.
///
/// # Errors
///
/// Returns [`PagemarkError::FileNotFound`] for a missing file,
/// [`PagemarkError::Json`] for malformed JSON and
/// [`PagemarkError::InvalidProfile`] when the collection is invalid.
pub fn load_profiles(path: &Path) -> Result<Vec<ConversionProfile>> {
    if !path.exists() {
        return Err(PagemarkError::FileNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let profiles = profiles_from_json(&content)?;
    validate_profiles(&profiles)?;
    tracing::debug!("Loaded {} profile(s) from {}", profiles.len(), path.display());
    Ok(profiles)
}

/// Default profile file location (`~/.config/pagemark/profiles.json`).
pub fn default_profiles_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("pagemark").join("profiles.json"))
}

/// The preset profiles shipped with pagemark. "Default" is the default.
pub fn builtin_profiles() -> Vec<ConversionProfile> {
    let mut default = ConversionProfile::new("default", "Default");
    default.is_default = true;

    let mut commonmark = ConversionProfile::new("commonmark", "CommonMark");
    commonmark.markdown_flavor = MarkdownFlavor::CommonMark;
    commonmark.formatting.bold_style = BoldStyle::Asterisks;
    commonmark.formatting.italic_style = ItalicStyle::Asterisk;

    let mut github = ConversionProfile::new("github", "GitHub");
    github.markdown_flavor = MarkdownFlavor::Github;
    github.formatting.code_block_syntax = CodeBlockSyntax::Auto;
    github.match_rules = Some(MatchRules {
        enabled: true,
        priority: 50,
        match_type: MatchType::Any,
        rules: vec![ProfileMatchRule::new(RuleType::Domain, MatchMode::EndsWith, "github.com")],
    });

    let mut reddit = ConversionProfile::new("reddit", "Reddit");
    reddit.markdown_flavor = MarkdownFlavor::Reddit;
    reddit.formatting.italic_style = ItalicStyle::Asterisk;
    reddit.output_format.add_metadata = false;
    reddit.match_rules = Some(MatchRules {
        enabled: true,
        priority: 50,
        match_type: MatchType::Any,
        rules: vec![ProfileMatchRule::new(RuleType::Domain, MatchMode::Contains, "reddit.com")],
    });

    let mut discord = ConversionProfile::new("discord", "Discord");
    discord.markdown_flavor = MarkdownFlavor::Discord;
    discord.formatting.italic_style = ItalicStyle::Asterisk;
    discord.image_handling.strategy = ImageStrategy::Skip;
    discord.content_filters.max_heading_level = 3;
    discord.output_format.add_metadata = false;

    let mut minimal = ConversionProfile::new("minimal", "Minimal");
    minimal.markdown_flavor = MarkdownFlavor::Minimal;
    minimal.image_handling.strategy = ImageStrategy::Skip;
    minimal.link_handling.style = LinkHandlingStyle::Remove;
    minimal.output_format.add_metadata = false;

    vec![default, commonmark, github, reddit, discord, minimal]
}
