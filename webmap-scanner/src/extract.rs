//! Link channels over a rendered (or raw) document.
//!
//! Each channel is a pure function from a parsed document to the canonical
//! URLs it references. Scope filtering happens in [`collect`], so a channel
//! never needs to know what site is being crawled.

use crate::normalize::{SiteScope, is_pseudo_target, resolve};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static HANDLER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[onclick]").unwrap());

pub const ROUTING_ATTRIBUTES: &[&str] = &["data-url", "data-href", "data-route"];

static ROUTING_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    ROUTING_ATTRIBUTES
        .iter()
        .map(|attr| (*attr, Selector::parse(&format!("[{}]", attr)).unwrap()))
        .collect()
});

static QUOTED_ABSOLUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"](https?://[^'"]+)['"]"#).unwrap());
static QUOTED_ROOT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"](/[^'"]+)['"]"#).unwrap());
static CALL_WITH_ROOT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\(\s*(?:'(/[^']+)'|"(/[^"]+)")\s*\)"#).unwrap());

/// A parsed document plus the URL its relative references resolve against.
pub struct Document {
    base: Url,
    html: Html,
}

impl Document {
    pub fn parse(base: Url, markup: &str) -> Self {
        Self {
            base,
            html: Html::parse_document(markup),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Anchors,
    Handlers,
    Routing,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Anchors => "anchors",
            Channel::Handlers => "onclick",
            Channel::Routing => "data-url",
        }
    }
}

pub type LinkChannel = fn(&Document) -> BTreeSet<String>;

/// The channels run over every rendered page, in order.
pub const RENDERED_CHANNELS: &[(Channel, LinkChannel)] = &[
    (Channel::Anchors, anchor_links),
    (Channel::Handlers, handler_links),
    (Channel::Routing, routing_links),
];

/// Run `channel` and keep only same-site results.
pub fn collect(channel: LinkChannel, document: &Document, scope: &SiteScope) -> BTreeSet<String> {
    channel(document)
        .into_iter()
        .filter(|url| scope.contains(url))
        .collect()
}

pub fn anchor_links(document: &Document) -> BTreeSet<String> {
    document
        .html
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !is_pseudo_target(href))
        .filter_map(|href| resolve(&document.base, href))
        .collect()
}

pub fn handler_links(document: &Document) -> BTreeSet<String> {
    document
        .html
        .select(&HANDLER_SELECTOR)
        .filter_map(|element| element.value().attr("onclick"))
        .filter_map(handler_target)
        .filter_map(|target| resolve(&document.base, &target))
        .collect()
}

pub fn routing_links(document: &Document) -> BTreeSet<String> {
    let mut links = BTreeSet::new();
    for (attr, selector) in ROUTING_SELECTORS.iter() {
        for element in document.html.select(selector) {
            if let Some(value) = element.value().attr(attr)
                && !is_pseudo_target(value)
                && let Some(url) = resolve(&document.base, value)
            {
                links.insert(url);
            }
        }
    }
    links
}

/// Same-site anchors of raw markup. Used on the fallback path.
pub fn extract_static_links(base_url: &str, markup: &str, scope: &SiteScope) -> BTreeSet<String> {
    let Ok(base) = Url::parse(base_url) else {
        return BTreeSet::new();
    };
    let document = Document::parse(base, markup);
    collect(anchor_links, &document, scope)
}

pub type HandlerStrategy = fn(&str) -> Option<String>;

/// Heuristics for pulling a navigation target out of an inline handler,
/// tried in order; the first hit wins.
pub const HANDLER_STRATEGIES: &[HandlerStrategy] =
    &[quoted_absolute_url, quoted_root_path, call_with_root_path];

pub fn handler_target(script: &str) -> Option<String> {
    HANDLER_STRATEGIES.iter().find_map(|strategy| strategy(script))
}

/// `location.href='https://ex.com/a'`
pub fn quoted_absolute_url(script: &str) -> Option<String> {
    QUOTED_ABSOLUTE
        .captures(script)
        .map(|caps| caps[1].to_string())
}

/// `location.href='/a'`
pub fn quoted_root_path(script: &str) -> Option<String> {
    QUOTED_ROOT_PATH
        .captures(script)
        .map(|caps| caps[1].to_string())
}

/// `goToPage('/a')`
pub fn call_with_root_path(script: &str) -> Option<String> {
    let caps = CALL_WITH_ROOT_PATH.captures(script)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}
