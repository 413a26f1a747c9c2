//! Bounded speculative clicking with mandatory restoration.
//!
//! Every click that moves the session is followed by a return to the
//! click's origin: history back first, an explicit navigation second. If
//! neither gets the session home, discovery stops for the page.

use crate::config::ClickConfig;
use crate::error::{CrawlError, Recovery};
use crate::normalize::{SiteScope, normalize};
use crate::session::{NavigationSignal, RenderSession};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub discovered: BTreeSet<String>,
    /// Clicks actually performed; never exceeds the budget.
    pub attempts: usize,
    pub candidates: usize,
    /// Set when restoration failed and the remaining candidates were skipped.
    pub halted: bool,
}

pub struct ClickDiscovery<'a> {
    config: &'a ClickConfig,
    scope: &'a SiteScope,
    navigation_timeout: Duration,
}

impl<'a> ClickDiscovery<'a> {
    pub fn new(config: &'a ClickConfig, scope: &'a SiteScope, navigation_timeout: Duration) -> Self {
        Self {
            config,
            scope,
            navigation_timeout,
        }
    }

    pub async fn run<S: RenderSession>(&self, session: &mut S) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        if self.config.budget == 0 {
            return report;
        }

        let mut candidates = match session.query(&self.config.candidates).await {
            Ok(found) => found,
            Err(e) => {
                warn!("{}", CrawlError::extraction("click candidates", e));
                return report;
            }
        };
        report.candidates = candidates.len();
        if candidates.is_empty() {
            return report;
        }
        debug!(
            "Click discovery: {} candidates (budget {})",
            candidates.len(),
            self.config.budget
        );

        let observe = Duration::from_millis(self.config.observe_timeout_ms);
        let mut index = 0;

        while index < candidates.len() && report.attempts < self.config.budget {
            let element = &candidates[index];
            index += 1;

            match session.bounding_box(element).await {
                Ok(Some(b)) if b.is_visible() => {}
                _ => continue,
            }

            let origin = match session.current_url().await {
                Ok(url) => url,
                Err(e) => {
                    warn!("Cannot record click origin, stopping discovery: {}", e);
                    report.halted = true;
                    break;
                }
            };

            report.attempts += 1;
            let signal = session.click(element, observe).await;
            let landed = session.current_url().await.ok();

            let navigated = matches!(signal, Ok(NavigationSignal::Completed))
                || landed.as_deref().is_some_and(|url| url != origin);
            if !navigated {
                if let Err(e) = signal {
                    debug!("{}", CrawlError::interaction("click", e));
                }
                continue;
            }

            if let Some(ref landed) = landed {
                let target = normalize(landed);
                if self.scope.contains(&target) && target != normalize(&origin) {
                    info!("  [click-nav] {} -> {}", origin, target);
                    report.discovered.insert(target);
                }
            }

            if let Err(e) = self.restore(session, &origin).await {
                match e.recovery() {
                    Recovery::AbortDiscovery => {
                        warn!("{}", e);
                        report.halted = true;
                        break;
                    }
                    _ => debug!("{}", e),
                }
            }

            // The old handles belong to the document we just left.
            candidates = match session.query(&self.config.candidates).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("{}", CrawlError::extraction("click candidates", e));
                    break;
                }
            };
        }

        report
    }

    /// Bring the session back to `origin`.
    async fn restore<S: RenderSession>(
        &self,
        session: &mut S,
        origin: &str,
    ) -> Result<(), CrawlError> {
        // Exact match only: a fragment change still has to be undone.
        if session.current_url().await.is_ok_and(|url| url == origin) {
            return Ok(());
        }

        let home = normalize(origin);

        let back = session
            .go_back(Duration::from_millis(self.config.back_timeout_ms))
            .await;
        if back.is_ok() && on_page(session, &home).await {
            return Ok(());
        }

        let reload = session.navigate(origin, self.navigation_timeout).await;
        if reload.is_ok() && on_page(session, &home).await {
            return Ok(());
        }

        let reason = match (back, reload) {
            (Err(b), Err(r)) => format!("back: {}; reload: {}", b, r),
            (Err(b), Ok(())) => format!("back: {}; reload landed elsewhere", b),
            (Ok(()), Err(r)) => format!("back landed elsewhere; reload: {}", r),
            (Ok(()), Ok(())) => "back and reload both landed elsewhere".to_string(),
        };
        Err(CrawlError::RestorationFailure {
            origin: origin.to_string(),
            reason,
        })
    }
}

async fn on_page<S: RenderSession>(session: &mut S, canonical: &str) -> bool {
    session
        .current_url()
        .await
        .is_ok_and(|url| normalize(&url) == canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockPage, MockSession};
    use crate::normalize::SameSitePolicy;

    fn scope() -> SiteScope {
        SiteScope::new("https://ex.com", SameSitePolicy::Exact).unwrap()
    }

    fn config(budget: usize) -> ClickConfig {
        ClickConfig {
            budget,
            ..ClickConfig::default()
        }
    }

    async fn run(session: &mut MockSession, budget: usize) -> DiscoveryReport {
        let scope = scope();
        let config = config(budget);
        let discovery = ClickDiscovery::new(&config, &scope, Duration::from_secs(60));
        discovery.run(session).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_budget_enforced() {
        let elements = (0..20).map(|_| MockElement::inert()).collect();
        let mut session =
            MockSession::new().with_page("https://ex.com", MockPage::new().with_elements(elements));
        session.open("https://ex.com");

        let report = run(&mut session, 5).await;
        assert_eq!(report.attempts, 5);
        assert_eq!(session.clicks(), 5);
        assert_eq!(report.candidates, 20);
        assert!(report.discovered.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invisible_candidates_do_not_consume_budget() {
        let mut elements = vec![MockElement::hidden(); 3];
        elements.push(MockElement::navigates_to("https://ex.com/pricing"));
        let mut session =
            MockSession::new().with_page("https://ex.com", MockPage::new().with_elements(elements));
        session.open("https://ex.com");

        let report = run(&mut session, 1).await;
        assert_eq!(report.attempts, 1);
        assert!(report.discovered.contains("https://ex.com/pricing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_restored_after_every_attempt() {
        let elements = vec![
            MockElement::navigates_to("https://ex.com/a"),
            MockElement::inert(),
            MockElement::navigates_to("https://ex.com/b?ref=nav"),
            MockElement::navigates_to("https://other.org/x"),
            MockElement::navigates_to("https://ex.com#section"),
        ];
        let mut session =
            MockSession::new().with_page("https://ex.com", MockPage::new().with_elements(elements));
        session.open("https://ex.com");

        let report = run(&mut session, 50).await;
        assert!(!report.halted);
        assert_eq!(report.attempts, 5);
        assert_eq!(
            report.discovered,
            BTreeSet::from(["https://ex.com/a".to_string(), "https://ex.com/b".to_string()])
        );
        // Each click started from the page itself, so every earlier click was undone.
        assert!(session.click_origins().iter().all(|o| o == "https://ex.com/"));
        assert_eq!(session.location(), Some("https://ex.com/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fragment_only_click_is_undone() {
        let elements = vec![
            MockElement::navigates_to("https://ex.com/#pricing"),
            MockElement::navigates_to("https://ex.com/#team"),
        ];
        let mut session =
            MockSession::new().with_page("https://ex.com", MockPage::new().with_elements(elements));
        session.open("https://ex.com");

        let report = run(&mut session, 50).await;
        assert!(!report.halted);
        assert_eq!(report.attempts, 2);
        assert!(report.discovered.is_empty());
        assert_eq!(
            session.click_origins(),
            &["https://ex.com/".to_string(), "https://ex.com/".to_string()]
        );
        assert_eq!(session.location(), Some("https://ex.com/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_navigation_when_back_fails() {
        let elements = vec![
            MockElement::navigates_to("https://ex.com/a"),
            MockElement::navigates_to("https://ex.com/b"),
        ];
        let mut session = MockSession::new()
            .with_page("https://ex.com", MockPage::new().with_elements(elements))
            .failing_back();
        session.open("https://ex.com");

        let report = run(&mut session, 50).await;
        assert!(!report.halted);
        assert_eq!(report.discovered.len(), 2);
        assert_eq!(session.location(), Some("https://ex.com/"));
        assert_eq!(session.navigations().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restoration_failure_halts_page() {
        let elements = vec![
            MockElement::navigates_to("https://ex.com/a"),
            MockElement::navigates_to("https://ex.com/b"),
            MockElement::navigates_to("https://ex.com/c"),
        ];
        let mut session = MockSession::new()
            .with_page("https://ex.com", MockPage::new().with_elements(elements))
            .failing_back()
            .failing_navigation_to("https://ex.com");
        session.open("https://ex.com");

        let report = run(&mut session, 50).await;
        assert!(report.halted);
        assert_eq!(report.attempts, 1);
        assert_eq!(session.clicks(), 1);
        assert!(report.discovered.contains("https://ex.com/a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_never_queries() {
        let mut session = MockSession::new().with_page(
            "https://ex.com",
            MockPage::new().with_elements(vec![MockElement::navigates_to("https://ex.com/a")]),
        );
        session.open("https://ex.com");

        let report = run(&mut session, 0).await;
        assert_eq!(report.attempts, 0);
        assert_eq!(session.clicks(), 0);
    }
}
