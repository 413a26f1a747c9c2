use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use webmap::handlers::*;
use webmap::{command_argument_builder, extract_url_path};
use webmap_scanner::SameSitePolicy;

fn matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["webmap"];
    argv.extend_from_slice(args);
    command_argument_builder()
        .try_get_matches_from(argv)
        .unwrap()
}

// ============================================================================
// Start URL Tests
// ============================================================================

#[test]
fn test_parse_start_url_with_scheme() {
    assert_eq!(
        parse_start_url("https://example.com").unwrap(),
        "https://example.com/"
    );
    assert_eq!(
        parse_start_url("http://example.com/docs/").unwrap(),
        "http://example.com/docs"
    );
}

#[test]
fn test_parse_start_url_without_scheme() {
    assert_eq!(
        parse_start_url("example.com").unwrap(),
        "https://example.com/"
    );
    assert_eq!(
        parse_start_url("  example.com/pricing?ref=x#top ").unwrap(),
        "https://example.com/pricing"
    );
}

#[test]
fn test_parse_start_url_uppercase_scheme() {
    assert_eq!(
        parse_start_url("HTTPS://Example.com/Docs").unwrap(),
        "https://example.com/Docs"
    );
    assert_eq!(
        parse_start_url("Http://example.com").unwrap(),
        "http://example.com/"
    );
}

#[test]
fn test_parse_start_url_invalid() {
    assert!(parse_start_url("").is_err());
    assert!(parse_start_url("ftp://example.com").is_err());
    assert!(parse_start_url("https://").is_err());
}

#[test]
fn test_extract_url_path() {
    assert_eq!(
        extract_url_path("https://example.com/api/users"),
        "/api/users"
    );
    assert_eq!(extract_url_path("https://example.com/"), "/");
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_defaults_without_flags() {
    let config = build_crawl_config(&matches(&["--url", "ex.com"])).unwrap();
    assert_eq!(config.max_pages, 150);
    assert_eq!(config.clicks.budget, 50);
    assert_eq!(config.same_site, SameSitePolicy::Exact);
    assert_eq!(config.delay(), Duration::from_millis(300));
}

#[test]
fn test_flags_override_defaults() {
    let config = build_crawl_config(&matches(&[
        "--url",
        "ex.com",
        "--max-pages",
        "12",
        "--clicks",
        "3",
        "--delay-ms",
        "0",
        "--nav-timeout",
        "15",
        "--same-site",
        "www-suffix",
    ]))
    .unwrap();
    assert_eq!(config.max_pages, 12);
    assert_eq!(config.clicks.budget, 3);
    assert_eq!(config.delay(), Duration::ZERO);
    assert_eq!(config.navigation_timeout(), Duration::from_secs(15));
    assert_eq!(config.same_site, SameSitePolicy::WwwSuffix);
}

#[test]
fn test_config_file_then_flags() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"{{"max_pages": 20, "clicks": {{"budget": 5}}, "same_site": "www-suffix"}}"#
    )?;
    let path = file.path().to_str().unwrap().to_string();

    let from_file = build_crawl_config(&matches(&["--url", "ex.com", "--config", &path]))?;
    assert_eq!(from_file.max_pages, 20);
    assert_eq!(from_file.clicks.budget, 5);
    assert_eq!(from_file.same_site, SameSitePolicy::WwwSuffix);
    assert_eq!(from_file.scroll.max_iterations, 20);

    let overridden = build_crawl_config(&matches(&[
        "--url",
        "ex.com",
        "--config",
        &path,
        "--max-pages",
        "7",
    ]))?;
    assert_eq!(overridden.max_pages, 7);
    assert_eq!(overridden.clicks.budget, 5);
    Ok(())
}

#[test]
fn test_load_config_errors() {
    assert!(load_config("/definitely/not/here.json").is_err());

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "not json").unwrap();
    assert!(load_config(file.path().to_str().unwrap()).is_err());
}

#[test]
fn test_zero_page_budget_rejected() {
    let result = build_crawl_config(&matches(&["--url", "ex.com", "--max-pages", "0"]));
    assert!(result.is_err());
}

// ============================================================================
// Browser and Output Tests
// ============================================================================

#[test]
fn test_browser_options() {
    let headed = build_browser_options(&matches(&["--url", "ex.com"]));
    assert!(!headed.headless);
    assert!(headed.executable.is_none());

    let headless = build_browser_options(&matches(&[
        "--url",
        "ex.com",
        "--headless",
        "--chrome",
        "/usr/bin/chromium",
    ]));
    assert!(headless.headless);
    assert_eq!(
        headless.executable.as_deref(),
        Some(std::path::Path::new("/usr/bin/chromium"))
    );
}

#[test]
fn test_resolve_output_dir_expands_tilde() {
    let resolved = resolve_output_dir("~/webmap-out");
    assert!(!resolved.to_string_lossy().starts_with('~'));
    assert!(resolved.ends_with("webmap-out"));

    assert_eq!(resolve_output_dir("outputs"), std::path::PathBuf::from("outputs"));
}

#[test]
fn test_output_defaults_to_outputs() {
    let args = matches(&["--url", "ex.com"]);
    assert_eq!(args.get_one::<String>("output").unwrap(), "outputs");
    assert!(!args.get_flag("open"));
    assert_eq!(args.get_count("verbose"), 0);
}

#[cfg(unix)]
#[test]
fn test_opener_exit_status_is_checked() {
    use std::process::Command;

    let path = std::path::Path::new("site_map_view.html");
    assert!(run_opener(Command::new("true"), path).is_ok());

    let failed = run_opener(Command::new("false"), path).unwrap_err();
    assert!(failed.to_string().contains("opener exited"));

    assert!(run_opener(Command::new("/definitely/not/an/opener"), path).is_err());
}
