use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use owo_colors::OwoColorize;
use pagemark_core::{
    ConversionProfile, ConversionResult, DetectionOptions, Document, MarkdownConverter, PageContext, PageMetadata,
    ProfileMatcher, builtin_profiles, clip, default_profiles_path, detect_content, load_profiles, profiles_to_json,
    validate_profiles,
};
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Clip saved web pages into Markdown using conversion profiles
#[derive(Parser, Debug)]
#[command(name = "pagemark")]
#[command(version)]
#[command(about = "Clip web pages into Markdown", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Profiles JSON file (default: ~/.config/pagemark/profiles.json, then built-in presets)
    #[arg(long, value_name = "FILE", global = true)]
    profiles: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a page to Markdown
    Convert(ConvertArgs),
    /// Detect the main content of a page and report what was found
    Detect(DetectArgs),
    /// Show which profile applies to a page
    Match(MatchArgs),
    /// List, show, validate or export profiles
    #[command(subcommand)]
    Profiles(ProfilesCommand),
    /// Print a shell completion script
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Where the page comes from and what it is
#[derive(Args, Debug)]
struct PageArgs {
    /// Local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// URL the page was saved from, used for matching and resolving links
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Page title for matching (default: the document's <title>)
    #[arg(long, value_name = "TITLE")]
    title: Option<String>,
}

#[derive(Args, Debug)]
struct DetectionArgs {
    /// Minimum text length for a content candidate
    #[arg(long, default_value = "200", value_name = "NUM")]
    min_text_length: usize,

    /// Keep navigation blocks
    #[arg(long)]
    keep_nav: bool,

    /// Keep footers
    #[arg(long)]
    keep_footer: bool,

    /// Keep sidebars
    #[arg(long)]
    keep_sidebars: bool,

    /// Keep ads
    #[arg(long)]
    keep_ads: bool,

    /// Keep comment threads
    #[arg(long)]
    keep_comments: bool,

    /// Keep cookie and consent banners
    #[arg(long)]
    keep_cookie_banners: bool,
}

impl DetectionArgs {
    fn options(&self) -> DetectionOptions {
        DetectionOptions::builder()
            .min_text_length(self.min_text_length)
            .remove_nav(!self.keep_nav)
            .remove_footer(!self.keep_footer)
            .remove_sidebars(!self.keep_sidebars)
            .remove_ads(!self.keep_ads)
            .remove_comments(!self.keep_comments)
            .remove_cookie_banners(!self.keep_cookie_banners)
            .build()
    }
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    page: PageArgs,

    #[command(flatten)]
    detection: DetectionArgs,

    /// Use this profile instead of matching one
    #[arg(short, long, value_name = "ID")]
    profile: Option<String>,

    /// Convert the whole page instead of the detected main content
    #[arg(long)]
    no_detect: bool,

    /// Output file, or a directory to write the generated file name into (default: stdout)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print the full conversion result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DetectArgs {
    #[command(flatten)]
    page: PageArgs,

    #[command(flatten)]
    detection: DetectionArgs,

    /// Print the cleaned content markup instead of a summary
    #[arg(long)]
    html: bool,
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Page URL
    #[arg(long, value_name = "URL")]
    url: String,

    /// Page title
    #[arg(long, default_value = "", value_name = "TITLE")]
    title: String,

    /// Saved page used to answer meta tag and selector rules
    #[arg(long, value_name = "FILE")]
    page: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ProfilesCommand {
    /// List available profiles
    List,
    /// Print one profile as JSON
    Show {
        /// Profile id
        id: String,
    },
    /// Validate a profiles JSON file
    Validate {
        /// File to validate
        file: PathBuf,
    },
    /// Print the built-in presets as JSON
    Export,
}

fn init_tracing(verbose: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn")),
        Err(_) if verbose => EnvFilter::new("warn,pagemark_core=debug,pagemark=debug"),
        Err(_) => EnvFilter::new("warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

/// Profiles from `--profiles`, the user's profile file, or the built-in presets.
fn resolve_profiles(path: Option<&Path>) -> anyhow::Result<Vec<ConversionProfile>> {
    if let Some(path) = path {
        return load_profiles(path).with_context(|| format!("Failed to load profiles from {}", path.display()));
    }

    if let Some(path) = default_profiles_path().filter(|p| p.exists()) {
        tracing::debug!("Using profiles from {}", path.display());
        return load_profiles(&path).with_context(|| format!("Failed to load profiles from {}", path.display()));
    }

    Ok(builtin_profiles())
}

fn page_context(page: &PageArgs, doc: &Document) -> PageContext {
    let title = page.title.clone().or_else(|| doc.title()).unwrap_or_default();
    PageContext::new(page.url.clone().unwrap_or_default(), title)
}

/// Narrows `profiles` to the one named by `id`, made the sole default.
fn forced_profile(profiles: &[ConversionProfile], id: &str) -> anyhow::Result<ConversionProfile> {
    let Some(profile) = profiles.iter().find(|p| p.id == id) else {
        let known: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        bail!("Unknown profile '{}'. Available: {}", id, known.join(", "));
    };

    let mut forced = profile.clone();
    forced.is_default = true;
    forced.match_rules = None;
    Ok(forced)
}

fn run_convert(args: ConvertArgs, profiles_path: Option<&Path>, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        echo::print_step(1, 4, &format!("Reading {}", args.page.input.bright_white()));
    }
    let html = read_input(&args.page.input)?;
    if verbose {
        echo::print_field("Size", &echo::format_size(html.len()));
    }

    let doc = Document::parse(&html);
    let context = page_context(&args.page, &doc);

    if verbose {
        echo::print_step(2, 4, "Selecting profile");
    }
    let mut profiles = resolve_profiles(profiles_path)?;
    if let Some(id) = &args.profile {
        profiles = vec![forced_profile(&profiles, id)?];
    }

    let result: ConversionResult = if args.no_detect {
        let matcher = ProfileMatcher::with_probe(&doc);
        let profile = matcher
            .find_matching_profile(&profiles, &context)
            .cloned()
            .unwrap_or_default();
        if verbose {
            echo::print_field("Profile", &profile.name);
            echo::print_step(3, 4, "Converting whole page");
        }

        let metadata = PageMetadata {
            title: (!context.title.is_empty()).then(|| context.title.clone()),
            url: (!context.url.is_empty()).then(|| context.url.clone()),
            ..Default::default()
        };
        let mut converter = MarkdownConverter::new(&profile);
        if let Ok(base) = url::Url::parse(&context.url) {
            converter = converter.with_base_url(base);
        }
        converter.convert_document(&doc, Some(&metadata))
    } else {
        let clip = clip(&doc, &context, &profiles, &args.detection.options());
        if verbose {
            echo::print_field("Profile", &clip.profile.name);
            for reason in &clip.match_reasons {
                echo::print_field("Matched", reason);
            }
            echo::print_step(3, 4, "Detecting and converting main content");
            echo::print_detection_details(&clip.detection);
        }
        if clip.detection.main_content.is_none() {
            echo::print_warning("No main content detected; converted the whole page");
        }
        clip.result
    };

    if verbose {
        echo::print_step(4, 4, "Writing output");
        echo::print_field("Size", &echo::format_size(result.size_bytes));
        echo::print_field("Checksum", &result.checksum);
    }

    let output = if args.json {
        serde_json::to_string_pretty(&result).context("Failed to serialize conversion result")?
    } else {
        result.content.clone()
    };

    match args.output {
        Some(path) => {
            let target = if path.is_dir() { path.join(&result.file_name) } else { path };
            fs::write(&target, output).with_context(|| format!("Failed to write to file: {}", target.display()))?;
            echo::print_success(&format!("Output written to {}", target.display().bright_white()));
        }
        None => println!("{}", output),
    }

    Ok(())
}

fn run_detect(args: DetectArgs) -> anyhow::Result<()> {
    let html = read_input(&args.page.input)?;
    let doc = Document::parse(&html);
    let detected = detect_content(&doc, &args.detection.options());

    if args.html {
        match detected.html() {
            Some(html) => println!("{}", html),
            None => bail!("No main content found"),
        }
        return Ok(());
    }

    let summary = serde_json::json!({
        "found": detected.main_content.is_some(),
        "title": detected.title,
        "author": detected.author,
        "publishDate": detected.publish_date,
        "description": detected.description,
        "siteName": detected.site_name,
        "wordCount": detected.word_count,
        "readingTime": detected.reading_time,
        "confidence": detected.confidence,
    });
    println!("{}", serde_json::to_string_pretty(&summary).context("Failed to serialize detection summary")?);

    Ok(())
}

fn run_match(args: MatchArgs, profiles_path: Option<&Path>) -> anyhow::Result<()> {
    let profiles = resolve_profiles(profiles_path)?;
    let context = PageContext::new(args.url, args.title);

    let page = match &args.page {
        Some(path) => Some(Document::parse(
            &fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?,
        )),
        None => None,
    };
    let matcher = match &page {
        Some(doc) => ProfileMatcher::with_probe(doc),
        None => ProfileMatcher::new(),
    };

    let Some(profile) = matcher.find_matching_profile(&profiles, &context) else {
        bail!("No profile matched and no default profile is configured");
    };

    let reasons = matcher.get_match_reason(profile, &context);
    println!("{} ({})", profile.name.bold(), profile.id);
    if reasons.is_empty() {
        println!("  {}", "default profile".dimmed());
    }
    for reason in reasons {
        println!("  {} {}", "•".cyan(), reason);
    }

    Ok(())
}

fn run_profiles(command: ProfilesCommand, profiles_path: Option<&Path>) -> anyhow::Result<()> {
    match command {
        ProfilesCommand::List => {
            for profile in resolve_profiles(profiles_path)? {
                echo::print_profile_row(&profile);
            }
        }
        ProfilesCommand::Show { id } => {
            let profiles = resolve_profiles(profiles_path)?;
            let Some(profile) = profiles.iter().find(|p| p.id == id) else {
                bail!("Unknown profile '{}'", id);
            };
            println!("{}", serde_json::to_string_pretty(profile).context("Failed to serialize profile")?);
        }
        ProfilesCommand::Validate { file } => {
            let profiles =
                load_profiles(&file).with_context(|| format!("Invalid profiles file: {}", file.display()))?;
            validate_profiles(&profiles)?;
            echo::print_success(&format!("{} profile(s) valid", profiles.len()));
        }
        ProfilesCommand::Export => {
            println!("{}", profiles_to_json(&builtin_profiles()).context("Failed to serialize profiles")?);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let profiles_path = cli.profiles.as_deref();
    match cli.command {
        Command::Convert(args) => run_convert(args, profiles_path, cli.verbose),
        Command::Detect(args) => run_detect(args),
        Command::Match(args) => run_match(args, profiles_path),
        Command::Profiles(command) => run_profiles(command, profiles_path),
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pagemark", &mut io::stdout());
            Ok(())
        }
    }
}
