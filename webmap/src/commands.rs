use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    command!()
        .name("webmap")
        .bin_name("webmap")
        .about("Map the navigable structure of a JavaScript-heavy website")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-u --"url" <URL>)
                .required(true)
                .help("Start URL; https:// is assumed when no scheme is given"),
        )
        .arg(
            arg!(-m --"max-pages" <N>)
                .required(false)
                .help("Maximum number of pages to visit [default: 150]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(-c --"clicks" <N>)
                .required(false)
                .help("Click attempts per page during interactive discovery [default: 50]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--"delay-ms" <MS>)
                .required(false)
                .help("Pause between pages in milliseconds [default: 300]")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--"nav-timeout" <SECS>)
                .required(false)
                .help("Page navigation timeout in seconds [default: 60]")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--"same-site" <POLICY>)
                .required(false)
                .help("Which hosts count as the same site [default: exact]")
                .value_parser(["exact", "www-suffix"]),
        )
        .arg(
            arg!(--"headless")
                .required(false)
                .help("Run Chromium without a visible window")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"chrome" <PATH>)
                .required(false)
                .help("Path to the Chrome/Chromium executable")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            arg!(--"config" <FILE>)
                .required(false)
                .help("JSON crawl configuration; command-line flags take precedence"),
        )
        .arg(
            arg!(-o --"output" <DIR>)
                .required(false)
                .help("Directory for sitemap_hier.json, tree.json and site_map_view.html")
                .default_value("outputs"),
        )
        .arg(
            arg!(--"open")
                .required(false)
                .help("Open the HTML viewer when the crawl finishes")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-v --"verbose" ...)
                .required(false)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
}
