pub mod clean;
pub mod convert;
pub mod detect;
pub mod error;
pub mod matcher;
pub mod metadata;
pub mod parse;
pub mod pipeline;
pub mod profile;
pub mod scoring;
pub mod selectors;
pub mod urls;

pub use convert::{ConversionResult, MarkdownConverter, PageMetadata, RuleTable, convert};
pub use detect::{
    ContentDetector, DetectedContent, DetectionOptions, DetectionOptionsBuilder, detect_content, find_main_content,
};
pub use error::{PagemarkError, Result};
pub use matcher::{NoProbe, PageContext, PageProbe, ProfileMatcher, find_matching_profile, get_match_reason};
pub use metadata::Metadata;
pub use parse::{Document, Element};
pub use pipeline::{Clip, clip, page_metadata};
pub use profile::{
    BoldStyle, BulletMarker, CodeBlockStyle, CodeBlockSyntax, ContentFilters, ConversionOptions, ConversionProfile,
    Formatting, HeadingStyle, ImageHandling, ImageStrategy, ItalicStyle, LinkHandling, LinkHandlingStyle, LinkStyle,
    MarkdownFlavor, MatchMode, MatchRules, MatchType, OutputFormat, ProfileMatchRule, RuleType, builtin_profiles,
    default_profiles_path, load_profiles, profiles_from_json, profiles_to_json, validate_profiles,
};
#[doc(hidden)]
pub use scoring::{CandidateScore, candidate_score, class_id_weight, confidence, link_density};
pub use selectors::{CleaningRules, ClutterCategory, SelectorRule};
pub use urls::{TRACKING_PARAMS, strip_tracking_params};
