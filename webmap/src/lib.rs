pub mod commands;
pub mod handlers;

pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{
    build_crawl_config, handle_crawl, load_config, parse_start_url, resolve_output_dir,
};

// Re-export crawl functionality from webmap-core
pub use webmap_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path, generate_crawl_report,
};
