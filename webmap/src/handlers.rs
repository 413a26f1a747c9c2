use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use url::Url;
use webmap_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
use webmap_core::report::write_artifacts;
use webmap_core::tree::{build_site_tree, render_tree};
use webmap_scanner::{BrowserOptions, CrawlConfig, SameSitePolicy, normalize};

/// Canonical start URL for user input, adding `https://` when no scheme is given.
pub fn parse_start_url(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        bail!("start URL is empty");
    }

    let lower = input.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        input.to_string()
    } else if input.contains("://") {
        bail!("unsupported scheme in '{}'; only http and https can be crawled", input);
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&candidate).with_context(|| format!("invalid URL '{}'", input))?;
    if url.host_str().is_none() {
        bail!("URL '{}' has no host", input);
    }
    Ok(normalize(url.as_str()))
}

/// Read a JSON crawl configuration. Missing fields keep their defaults.
pub fn load_config(path: &str) -> Result<CrawlConfig> {
    let expanded = shellexpand::tilde(path);
    let content = fs::read_to_string(expanded.as_ref())
        .with_context(|| format!("failed to read config file {}", expanded))?;
    serde_json::from_str(&content).with_context(|| format!("invalid config file {}", expanded))
}

/// Config file (if any) with command-line flags applied on top.
pub fn build_crawl_config(args: &ArgMatches) -> Result<CrawlConfig> {
    let mut config = match args.get_one::<String>("config") {
        Some(path) => load_config(path)?,
        None => CrawlConfig::default(),
    };

    if let Some(&max_pages) = args.get_one::<usize>("max-pages") {
        config = config.with_max_pages(max_pages);
    }
    if let Some(&clicks) = args.get_one::<usize>("clicks") {
        config = config.with_click_budget(clicks);
    }
    if let Some(&delay) = args.get_one::<u64>("delay-ms") {
        config = config.with_delay(Duration::from_millis(delay));
    }
    if let Some(&secs) = args.get_one::<u64>("nav-timeout") {
        config = config.with_navigation_timeout(Duration::from_secs(secs));
    }
    if let Some(policy) = args.get_one::<String>("same-site") {
        let policy = SameSitePolicy::from_str(policy)
            .with_context(|| format!("unknown same-site policy '{}'", policy))?;
        config = config.with_same_site(policy);
    }

    if config.max_pages == 0 {
        bail!("--max-pages must be at least 1");
    }
    Ok(config)
}

pub fn build_browser_options(args: &ArgMatches) -> BrowserOptions {
    BrowserOptions {
        headless: args.get_flag("headless"),
        executable: args.get_one::<PathBuf>("chrome").cloned(),
        ..BrowserOptions::default()
    }
}

pub fn resolve_output_dir(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Hand `path` to the desktop's default opener and wait for it to exit.
pub fn open_in_browser(path: &Path) -> Result<()> {
    let command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    run_opener(command, path)
}

/// Run `opener` on `path`, failing on a non-zero exit.
pub fn run_opener(mut opener: Command, path: &Path) -> Result<()> {
    let status = opener
        .arg(path)
        .status()
        .with_context(|| format!("failed to run opener for {}", path.display()))?;
    if !status.success() {
        bail!("opener exited with {}", status);
    }
    Ok(())
}

pub async fn handle_crawl(args: &ArgMatches) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let raw_url = args
        .get_one::<String>("url")
        .context("--url is required")?;
    let url = parse_start_url(raw_url)?;
    let config = build_crawl_config(args)?;
    let browser = build_browser_options(args);
    let output_dir = resolve_output_dir(
        args.get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("outputs"),
    );

    if !quiet {
        println!("\n{} {}", "Mapping".bright_cyan().bold(), url);
        println!(
            "Max pages: {}  Clicks/page: {}  Same-site: {}  Browser: {}\n",
            config.max_pages,
            config.clicks.budget,
            config.same_site.as_str(),
            if browser.headless { "headless" } else { "headed" }
        );
    }

    let options = CrawlOptions {
        url: url.clone(),
        config,
        browser,
        show_progress_bars: !quiet,
    };
    let graph = execute_crawl(options, None)
        .await
        .with_context(|| format!("crawl of {} failed", url))?;

    if graph.is_empty() {
        println!("{} nothing was crawled; no artifacts written", "[!]".yellow().bold());
        return Ok(());
    }

    let tree = build_site_tree(&url, &graph).context("start URL has no host")?;
    if !quiet {
        println!("{}", generate_crawl_report(&graph, Some(&render_tree(&tree))));
    }

    let Some(paths) = write_artifacts(&graph, &tree, &output_dir)
        .with_context(|| format!("failed to write artifacts to {}", output_dir.display()))?
    else {
        return Ok(());
    };

    println!("{} {}", "Adjacency:".green().bold(), paths.hierarchy.display());
    println!("{} {}", "Tree:     ".green().bold(), paths.tree.display());
    println!("{} {}", "Viewer:   ".green().bold(), paths.viewer.display());

    if args.get_flag("open")
        && let Err(e) = open_in_browser(&paths.viewer)
    {
        eprintln!("{} could not open viewer: {:#}", "[!]".yellow().bold(), e);
    }
    Ok(())
}
