use std::{env, fs, path::PathBuf};

fn page_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(<INPUT> "Local HTML file, or '-' for stdin"))
        .arg(clap::arg!(--url <URL> "URL the page was saved from"))
        .arg(clap::arg!(--title <TITLE> "Page title for matching"))
        .arg(clap::arg!(--"min-text-length" <NUM> "Minimum text length for a content candidate").default_value("200"))
        .arg(clap::arg!(--"keep-nav" "Keep navigation blocks"))
        .arg(clap::arg!(--"keep-footer" "Keep footers"))
        .arg(clap::arg!(--"keep-sidebars" "Keep sidebars"))
        .arg(clap::arg!(--"keep-ads" "Keep ads"))
        .arg(clap::arg!(--"keep-comments" "Keep comment threads"))
        .arg(clap::arg!(--"keep-cookie-banners" "Keep cookie and consent banners"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let convert = page_args(clap::Command::new("convert").about("Convert a page to Markdown"))
        .arg(clap::arg!(-p --profile <ID> "Use this profile instead of matching one"))
        .arg(clap::arg!(--"no-detect" "Convert the whole page instead of the detected main content"))
        .arg(
            clap::arg!(-o --output <PATH> "Output file or directory (default: stdout)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--json "Print the full conversion result as JSON"));

    let detect = page_args(clap::Command::new("detect").about("Detect the main content of a page"))
        .arg(clap::arg!(--html "Print the cleaned content markup instead of a summary"));

    let matcher = clap::Command::new("match")
        .about("Show which profile applies to a page")
        .arg(clap::arg!(--url <URL> "Page URL").required(true))
        .arg(clap::arg!(--title <TITLE> "Page title"))
        .arg(
            clap::arg!(--page <FILE> "Saved page used to answer meta tag and selector rules")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        );

    let profiles = clap::Command::new("profiles")
        .about("List, show, validate or export profiles")
        .subcommand(clap::Command::new("list").about("List available profiles"))
        .subcommand(clap::Command::new("show").about("Print one profile as JSON").arg(clap::arg!(<ID> "Profile id")))
        .subcommand(
            clap::Command::new("validate")
                .about("Validate a profiles JSON file")
                .arg(clap::arg!(<FILE> "File to validate").value_parser(clap::value_parser!(std::path::PathBuf))),
        )
        .subcommand(clap::Command::new("export").about("Print the built-in presets as JSON"));

    let mut cmd = clap::Command::new("pagemark")
        .version("1.0.0")
        .about("Clip web pages into Markdown")
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .arg(
            clap::arg!(--profiles <FILE> "Profiles JSON file")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .subcommand(convert)
        .subcommand(detect)
        .subcommand(matcher)
        .subcommand(profiles)
        .subcommand(
            clap::Command::new("completions")
                .about("Print a shell completion script")
                .arg(clap::arg!(<SHELL> "Target shell").value_parser(clap::value_parser!(clap_complete::Shell))),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "pagemark", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "pagemark", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "pagemark", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "pagemark", &completions_dir).unwrap();
}
