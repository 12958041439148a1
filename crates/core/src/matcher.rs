//! Profile selection.
//!
//! [`ProfileMatcher`] evaluates each profile's [`MatchRules`] against a
//! [`PageContext`] and picks the profile to convert with. Rules that need the
//! page itself (`meta_tag` and `selector`) are answered through a
//! [`PageProbe`]; without one they never fire.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{PageContext, builtin_profiles, find_matching_profile};
//!
//! let profiles = builtin_profiles();
//! let context = PageContext::new("https://github.com/rust-lang/rust", "rust-lang/rust");
//!
//! let profile = find_matching_profile(&profiles, &context).unwrap();
//! assert_eq!(profile.id, "github");
//! ```

use regex::Regex;
use url::Url;

use crate::parse::Document;
use crate::profile::{ConversionProfile, MatchMode, MatchRules, MatchType, ProfileMatchRule, RuleType};

/// The page fields profile rules are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub url: String,
    pub title: String,
    /// Host name; derived from `url` when left empty.
    pub domain: String,
}

impl PageContext {
    /// Builds a context, deriving the domain from the URL host.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        let domain = domain_of(&url).unwrap_or_default();
        Self { url, title: title.into(), domain }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// The domain, falling back to the URL host.
    pub fn effective_domain(&self) -> String {
        if self.domain.is_empty() { domain_of(&self.url).unwrap_or_default() } else { self.domain.clone() }
    }
}

fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string))
}

/// Host access for rules that inspect the page itself.
pub trait PageProbe {
    /// Content of the meta tag addressed by `name` (or `property`).
    fn meta_content(&self, _name: &str) -> Option<String> {
        None
    }

    /// Whether any element matches `selector`.
    fn has_selector(&self, _selector: &str) -> bool {
        false
    }
}

/// Probe for callers without page access. Answers every query negatively.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl PageProbe for NoProbe {}

impl PageProbe for Document {
    fn meta_content(&self, name: &str) -> Option<String> {
        Document::meta_content(self, name)
    }

    fn has_selector(&self, selector: &str) -> bool {
        self.select_first(selector).is_some()
    }
}

/// Tests `value` against `pattern` under `mode`.
///
/// `exact` is case-sensitive; the substring modes ignore case; `regex`
/// matches anywhere in the value and an invalid pattern never matches.
pub fn matches_mode(mode: MatchMode, value: &str, pattern: &str) -> bool {
    match mode {
        MatchMode::Exact => value == pattern,
        MatchMode::Contains => value.to_lowercase().contains(&pattern.to_lowercase()),
        MatchMode::StartsWith => value.to_lowercase().starts_with(&pattern.to_lowercase()),
        MatchMode::EndsWith => value.to_lowercase().ends_with(&pattern.to_lowercase()),
        MatchMode::Regex => match Regex::new(pattern) {
            Ok(re) => re.is_match(value),
            Err(e) => {
                tracing::debug!("Invalid match pattern '{}': {}", pattern, e);
                false
            }
        },
    }
}

/// Stateless profile matcher bound to a page probe.
pub struct ProfileMatcher<'p> {
    probe: &'p dyn PageProbe,
}

impl Default for ProfileMatcher<'_> {
    fn default() -> Self {
        Self { probe: &NoProbe }
    }
}

impl<'p> ProfileMatcher<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A matcher that answers `meta_tag` and `selector` rules through `probe`.
    pub fn with_probe(probe: &'p dyn PageProbe) -> Self {
        Self { probe }
    }

    /// Whether a single rule is satisfied.
    pub fn rule_matches(&self, rule: &ProfileMatchRule, context: &PageContext) -> bool {
        match rule.rule_type {
            RuleType::Domain => matches_mode(rule.match_mode, &context.effective_domain(), &rule.pattern),
            RuleType::UrlPattern => matches_mode(rule.match_mode, &context.url, &rule.pattern),
            RuleType::Title => matches_mode(rule.match_mode, &context.title, &rule.pattern),
            RuleType::MetaTag => {
                // The last colon separates name from content so names like `og:type` work.
                let (name, expected) = rule.pattern.rsplit_once(':').unwrap_or((rule.pattern.as_str(), ""));
                match self.probe.meta_content(name.trim()) {
                    Some(_) if expected.is_empty() => true,
                    Some(content) => matches_mode(rule.match_mode, &content, expected),
                    None => false,
                }
            }
            RuleType::Selector => self.probe.has_selector(&rule.pattern),
        }
    }

    /// Whether a rule set matches. An empty rule list never matches.
    pub fn rules_match(&self, rules: &MatchRules, context: &PageContext) -> bool {
        if rules.rules.is_empty() {
            return false;
        }

        match rules.match_type {
            MatchType::Any => rules.rules.iter().any(|rule| self.rule_matches(rule, context)),
            MatchType::All => rules.rules.iter().all(|rule| self.rule_matches(rule, context)),
        }
    }

    /// Whether `profile` has enabled rules that match `context`.
    pub fn profile_matches(&self, profile: &ConversionProfile, context: &PageContext) -> bool {
        profile.active_match_rules().is_some_and(|rules| self.rules_match(rules, context))
    }

    /// Selects the profile for `context`.
    ///
    /// The matching profile with the highest priority wins, ties going to the
    /// earlier profile. Without a match the default profile is returned, and
    /// `None` only when there is no default either.
    pub fn find_matching_profile<'a>(
        &self, profiles: &'a [ConversionProfile], context: &PageContext,
    ) -> Option<&'a ConversionProfile> {
        let mut best: Option<&'a ConversionProfile> = None;

        for profile in profiles {
            if !self.profile_matches(profile, context) {
                continue;
            }
            let priority = priority_of(profile);
            if best.is_none_or(|current| priority > priority_of(current)) {
                best = Some(profile);
            }
        }

        match best {
            Some(profile) => {
                tracing::debug!("Profile '{}' matched {}", profile.id, context.url);
                Some(profile)
            }
            None => profiles.iter().find(|p| p.is_default),
        }
    }

    /// Human-readable descriptions of the rules that fired, in rule order.
    pub fn get_match_reason(&self, profile: &ConversionProfile, context: &PageContext) -> Vec<String> {
        let Some(rules) = profile.active_match_rules() else {
            return Vec::new();
        };

        rules
            .rules
            .iter()
            .filter(|rule| self.rule_matches(rule, context))
            .map(describe_rule)
            .collect()
    }
}

fn priority_of(profile: &ConversionProfile) -> u32 {
    profile.match_rules.as_ref().map(|rules| rules.priority).unwrap_or(0)
}

fn describe_rule(rule: &ProfileMatchRule) -> String {
    let field = match rule.rule_type {
        RuleType::Domain => "Domain",
        RuleType::UrlPattern => "URL",
        RuleType::Title => "Title",
        RuleType::MetaTag => "Meta tag",
        RuleType::Selector => "Page element",
    };
    let mode = match rule.match_mode {
        MatchMode::Exact => "equals",
        MatchMode::Contains => "contains",
        MatchMode::StartsWith => "starts with",
        MatchMode::EndsWith => "ends with",
        MatchMode::Regex => "matches pattern",
    };

    match rule.rule_type {
        RuleType::Selector => format!("{} '{}' is present", field, rule.pattern),
        _ => format!("{} {} '{}'", field, mode, rule.pattern),
    }
}

/// Selects a profile without page access. See [`ProfileMatcher::find_matching_profile`].
pub fn find_matching_profile<'a>(
    profiles: &'a [ConversionProfile], context: &PageContext,
) -> Option<&'a ConversionProfile> {
    ProfileMatcher::new().find_matching_profile(profiles, context)
}

/// Describes which rules of `profile` fire for `context`, without page access.
pub fn get_match_reason(profile: &ConversionProfile, context: &PageContext) -> Vec<String> {
    ProfileMatcher::new().get_match_reason(profile, context)
}
