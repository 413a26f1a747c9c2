pub mod crawl;
pub mod report;
pub mod tree;

pub use crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
pub use report::{ArtifactPaths, ReportError, write_artifacts};
pub use tree::{TreeNode, build_site_tree, build_tree};
