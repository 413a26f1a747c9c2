use colored::Colorize;
use tracing::Level;
use webmap::{command_argument_builder, handle_crawl};

fn print_banner() {
    let banner = r#"
                 _
 __      _____ | |__  _ __ ___   __ _ _ __
 \ \ /\ / / _ \| '_ \| '_ ` _ \ / _` | '_ \
  \ V  V /  __/| |_) | | | | | | (_| | |_) |
   \_/\_/ \___||_.__/|_| |_| |_|\__,_| .__/
                                     |_|"#;
    println!("{}", banner.bright_cyan());
    println!(
        "  {}\n",
        format!("v{} - rendered site mapper", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let quiet = matches.get_flag("quiet");

    let level = match matches.get_count("verbose") {
        0 if quiet => Level::WARN,
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if !quiet {
        print_banner();
    }

    if let Err(e) = handle_crawl(&matches).await {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
        std::process::exit(1);
    }
}
