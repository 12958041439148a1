use owo_colors::OwoColorize;
use pagemark_core::{ConversionProfile, DetectedContent};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Pagemark".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Clip web pages into Markdown\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print a labelled value under the current step
pub fn print_field(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Colour a confidence score by how trustworthy it is
fn styled_confidence(confidence: u8) -> String {
    let text = format!("{}/100", confidence);
    if confidence >= 70 {
        text.bright_green().to_string()
    } else if confidence >= 40 {
        text.bright_yellow().to_string()
    } else {
        text.bright_red().to_string()
    }
}

/// Print a detection summary
pub fn print_detection_details(detected: &DetectedContent) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Detection Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    let title = if detected.title.is_empty() { "(none)" } else { detected.title.as_str() };
    eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
    if let Some(author) = &detected.author {
        eprintln!("  {} {}", "Author:".dimmed(), author.bright_white());
    }
    if let Some(date) = &detected.publish_date {
        eprintln!("  {} {}", "Published:".dimmed(), date.bright_white());
    }
    eprintln!("  {} {}", "Words:".dimmed(), detected.word_count.to_string().bright_white());
    eprintln!("  {} {} min", "Reading time:".dimmed(), detected.reading_time.to_string().bright_white());
    eprintln!("  {} {}", "Confidence:".dimmed(), styled_confidence(detected.confidence));

    if detected.main_content.is_none() {
        eprintln!("  {}", "No main content found".yellow());
    }
    eprintln!();
}

/// Print one profile as a list row
pub fn print_profile_row(profile: &ConversionProfile) {
    let marker = if profile.is_default { "*".green().to_string() } else { " ".to_string() };
    let priority = profile
        .active_match_rules()
        .map(|rules| format!("priority {}", rules.priority))
        .unwrap_or_else(|| "no rules".to_string());

    println!(
        "{} {:<14} {:<22} {}",
        marker,
        profile.id.bright_white(),
        profile.name,
        priority.dimmed()
    );
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
