//! URL canonicalization and the same-site predicate.

use serde::{Deserialize, Serialize};
use url::Url;

/// Canonical form of a URL: no fragment, no query, no trailing separators.
///
/// The origin root keeps its separator (`https://a.com/` stays as is) and
/// the scheme's `//` is never touched. Empty input comes back unchanged.
pub fn normalize(url: &str) -> String {
    if url.is_empty() {
        return url.to_string();
    }

    let url = url.split('#').next().unwrap_or(url);
    let url = url.split('?').next().unwrap_or(url);

    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let Some(path_start) = url[authority_start..].find('/').map(|i| i + authority_start) else {
        return url.to_string();
    };

    let trimmed = url.trim_end_matches('/');
    if trimmed.len() <= path_start {
        // Path was nothing but separators: keep the root form.
        format!("{}/", &url[..path_start])
    } else {
        trimmed.to_string()
    }
}

/// Resolve `href` against `base` and return its canonical form.
pub fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(normalize(resolved.as_str())),
        _ => None,
    }
}

/// Targets that never lead to another page.
pub fn is_pseudo_target(href: &str) -> bool {
    let href = href.trim_start();
    href.starts_with('#')
        || ["javascript:", "mailto:", "tel:"]
            .iter()
            .any(|scheme| {
                href.get(..scheme.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
            })
}

/// How a link's host is matched against the crawl target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SameSitePolicy {
    /// Host must equal the target host.
    #[default]
    Exact,
    /// Leading `www.` is ignored on both sides; subdomains of the target match.
    WwwSuffix,
}

impl SameSitePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exact" => Some(SameSitePolicy::Exact),
            "www-suffix" | "suffix" => Some(SameSitePolicy::WwwSuffix),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SameSitePolicy::Exact => "exact",
            SameSitePolicy::WwwSuffix => "www-suffix",
        }
    }
}

/// The same-site predicate for one crawl.
#[derive(Debug, Clone)]
pub struct SiteScope {
    host: String,
    policy: SameSitePolicy,
}

impl SiteScope {
    pub fn new(start_url: &str, policy: SameSitePolicy) -> Option<Self> {
        let parsed = Url::parse(start_url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        Some(Self { host, policy })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn policy(&self) -> SameSitePolicy {
        self.policy
    }

    pub fn contains(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        else {
            return false;
        };

        match self.policy {
            SameSitePolicy::Exact => host == self.host,
            SameSitePolicy::WwwSuffix => {
                let root = strip_www(&self.host);
                let host = strip_www(&host);
                host == root || host.ends_with(&format!(".{}", root))
            }
        }
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
