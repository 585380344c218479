//! Scenario harness: runs suites of scenarios with scoped session
//! ownership.
//!
//! Each scenario gets a fresh session from the factory, exclusively owned
//! for the whole run, and released on every exit path. Release is the
//! default; keeping a session open for manual inspection is an explicit
//! opt-in, never a leak.

use crate::result::{PasoError, PasoResult};
use crate::sequencer::{Outcome, Sequencer};
use crate::session::Session;
use crate::step::Scenario;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Produces one fresh session per scenario.
///
/// Session creation failures surface as `SessionUnavailable`; the scenario
/// fails without attempting any step.
#[async_trait]
pub trait SessionFactory: Send {
    /// Session type produced by this factory
    type Session: Session;

    /// Acquire a new session
    async fn acquire(&mut self) -> PasoResult<Self::Session>;
}

/// Result of one scenario run within a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario name
    pub name: String,
    /// Sequencer outcome
    pub outcome: Outcome,
}

impl ScenarioRecord {
    /// Whether the scenario passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.outcome.passed
    }
}

/// Aggregate results of a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run identifier
    pub run_id: String,
    /// Wall-clock start time
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Individual scenario records
    pub records: Vec<ScenarioRecord>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteReport {
    /// Check if every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.records.iter().all(ScenarioRecord::passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.records.iter().filter(|r| r.passed()).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| !r.passed()).count()
    }

    /// Get failing records
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioRecord> {
        self.records.iter().filter(|r| !r.passed()).collect()
    }

    /// Serialize the full report for CI consumption
    pub fn to_json(&self) -> PasoResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs scenarios sequentially, one exclusively-owned session at a time
#[derive(Debug)]
pub struct Harness {
    sequencer: Sequencer,
    fail_fast: bool,
    keep_open: bool,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            sequencer: Sequencer::new(),
            fail_fast: false,
            keep_open: false,
        }
    }
}

impl Harness {
    /// Create a harness with default settings (collect-all, sessions
    /// always released)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific sequencer (e.g. custom bounded wait)
    #[must_use]
    pub fn with_sequencer(mut self, sequencer: Sequencer) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// Stop the suite at the first failing scenario
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Leave sessions open after each scenario, for manual inspection.
    /// Off by default; an unreleased session is a leak, not a feature.
    #[must_use]
    pub const fn keep_open(mut self, keep: bool) -> Self {
        self.keep_open = keep;
        self
    }

    /// Run every scenario, acquiring a fresh session per scenario and
    /// releasing it on every exit path.
    pub async fn run<F: SessionFactory>(
        &self,
        factory: &mut F,
        scenarios: &[Scenario],
    ) -> SuiteReport {
        let started = Instant::now();
        let started_at = chrono::Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut records = Vec::with_capacity(scenarios.len());

        for scenario in scenarios {
            let record = self.run_one(factory, scenario).await;
            let failed = !record.passed();
            info!(
                scenario = %record.name,
                passed = record.passed(),
                "scenario finished"
            );
            records.push(record);
            if failed && self.fail_fast {
                break;
            }
        }

        SuiteReport {
            run_id,
            started_at,
            records,
            duration: started.elapsed(),
        }
    }

    async fn run_one<F: SessionFactory>(
        &self,
        factory: &mut F,
        scenario: &Scenario,
    ) -> ScenarioRecord {
        let mut session = match factory.acquire().await {
            Ok(session) => session,
            Err(err) => {
                let reason = match err {
                    fatal @ PasoError::SessionUnavailable { .. } => fatal,
                    other => PasoError::SessionUnavailable {
                        message: other.to_string(),
                    },
                };
                return ScenarioRecord {
                    name: scenario.name.clone(),
                    outcome: Outcome::failed(None, &reason, 0, Duration::ZERO),
                };
            }
        };

        let outcome = self.sequencer.run_scenario(&mut session, scenario).await;

        if self.keep_open {
            info!(scenario = %scenario.name, "session left open for inspection");
        } else if let Err(err) = session.close().await {
            warn!(scenario = %scenario.name, error = %err, "session release failed");
        }

        ScenarioRecord {
            name: scenario.name.clone(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use crate::session::{MockElement, MockSession};
    use crate::step::Condition;

    /// Factory producing pre-scripted mock sessions; optionally fails
    /// acquisition after a given count.
    struct MockFactory {
        acquired: usize,
        fail_after: Option<usize>,
        closed_flags: std::sync::Arc<std::sync::Mutex<Vec<bool>>>,
    }

    impl MockFactory {
        fn new() -> Self {
            Self {
                acquired: 0,
                fail_after: None,
                closed_flags: std::sync::Arc::default(),
            }
        }
    }

    /// Mock session wrapper that reports closure back to the factory
    struct TrackedSession {
        inner: MockSession,
        index: usize,
        closed_flags: std::sync::Arc<std::sync::Mutex<Vec<bool>>>,
    }

    #[async_trait]
    impl SessionFactory for MockFactory {
        type Session = TrackedSession;

        async fn acquire(&mut self) -> PasoResult<TrackedSession> {
            if let Some(limit) = self.fail_after {
                if self.acquired >= limit {
                    return Err(PasoError::SessionUnavailable {
                        message: "browser launch failed".to_string(),
                    });
                }
            }
            let index = self.acquired;
            self.acquired += 1;
            self.closed_flags.lock().expect("lock").push(false);

            let mut inner = MockSession::new();
            inner.add_element(&Selector::css("#box"), MockElement::checkbox(false));
            Ok(TrackedSession {
                inner,
                index,
                closed_flags: self.closed_flags.clone(),
            })
        }
    }

    #[async_trait]
    impl Session for TrackedSession {
        async fn navigate(&mut self, url: &str) -> PasoResult<()> {
            self.inner.navigate(url).await
        }
        async fn wait_for(
            &mut self,
            selector: &Selector,
            timeout: Duration,
        ) -> PasoResult<crate::session::ElementHandle> {
            self.inner.wait_for(selector, timeout).await
        }
        async fn click(&mut self, el: &crate::session::ElementHandle) -> PasoResult<()> {
            self.inner.click(el).await
        }
        async fn type_text(
            &mut self,
            el: &crate::session::ElementHandle,
            text: &str,
        ) -> PasoResult<()> {
            self.inner.type_text(el, text).await
        }
        async fn press_keys(
            &mut self,
            el: &crate::session::ElementHandle,
            keys: &str,
        ) -> PasoResult<()> {
            self.inner.press_keys(el, keys).await
        }
        async fn hover(&mut self, el: &crate::session::ElementHandle) -> PasoResult<()> {
            self.inner.hover(el).await
        }
        async fn drag_by(
            &mut self,
            el: &crate::session::ElementHandle,
            dx: i64,
            dy: i64,
        ) -> PasoResult<()> {
            self.inner.drag_by(el, dx, dy).await
        }
        async fn select_option(
            &mut self,
            el: &crate::session::ElementHandle,
            option: &crate::step::OptionTarget,
        ) -> PasoResult<()> {
            self.inner.select_option(el, option).await
        }
        async fn is_selected(&mut self, el: &crate::session::ElementHandle) -> PasoResult<bool> {
            self.inner.is_selected(el).await
        }
        async fn is_enabled(&mut self, el: &crate::session::ElementHandle) -> PasoResult<bool> {
            self.inner.is_enabled(el).await
        }
        async fn is_visible(&mut self, el: &crate::session::ElementHandle) -> PasoResult<bool> {
            self.inner.is_visible(el).await
        }
        async fn text_of(&mut self, el: &crate::session::ElementHandle) -> PasoResult<String> {
            self.inner.text_of(el).await
        }
        async fn value_of(&mut self, el: &crate::session::ElementHandle) -> PasoResult<String> {
            self.inner.value_of(el).await
        }
        async fn current_url(&mut self) -> PasoResult<String> {
            self.inner.current_url().await
        }
        async fn page_contains(&mut self, needle: &str) -> PasoResult<bool> {
            self.inner.page_contains(needle).await
        }
        async fn enter_frame(&mut self, el: &crate::session::ElementHandle) -> PasoResult<()> {
            self.inner.enter_frame(el).await
        }
        async fn top_frame(&mut self) -> PasoResult<()> {
            self.inner.top_frame().await
        }
        async fn close(&mut self) -> PasoResult<()> {
            self.closed_flags.lock().expect("lock")[self.index] = true;
            self.inner.close().await
        }
    }

    fn passing_scenario(name: &str) -> Scenario {
        Scenario::builder(name)
            .navigate("http://example.com")
            .locate("box", Selector::css("#box"))
            .click("box")
            .assert_that("box", Condition::Selected { expected: true })
            .build()
    }

    fn failing_scenario(name: &str) -> Scenario {
        Scenario::builder(name)
            .navigate("http://example.com")
            .locate("ghost", Selector::css("#missing"))
            .build()
    }

    #[tokio::test]
    async fn test_suite_aggregates_results() {
        let mut factory = MockFactory::new();
        let scenarios = vec![
            passing_scenario("one"),
            failing_scenario("two"),
            passing_scenario("three"),
        ];

        let report = Harness::new().run(&mut factory, &scenarios).await;

        assert!(!report.all_passed());
        assert_eq!(report.passed_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failures()[0].name, "two");
        assert!(!report.run_id.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_released_on_every_path() {
        let mut factory = MockFactory::new();
        let scenarios = vec![passing_scenario("pass"), failing_scenario("fail")];

        let _report = Harness::new().run(&mut factory, &scenarios).await;

        let flags = factory.closed_flags.lock().expect("lock").clone();
        assert_eq!(flags, vec![true, true]);
    }

    #[tokio::test]
    async fn test_keep_open_skips_release() {
        let mut factory = MockFactory::new();
        let scenarios = vec![passing_scenario("pass")];

        let _report = Harness::new()
            .keep_open(true)
            .run(&mut factory, &scenarios)
            .await;

        let flags = factory.closed_flags.lock().expect("lock").clone();
        assert_eq!(flags, vec![false]);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_the_suite() {
        let mut factory = MockFactory::new();
        let scenarios = vec![
            failing_scenario("fail"),
            passing_scenario("never-runs"),
        ];

        let report = Harness::new()
            .with_fail_fast()
            .run(&mut factory, &scenarios)
            .await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(factory.acquired, 1);
    }

    #[tokio::test]
    async fn test_factory_failure_is_session_unavailable() {
        let mut factory = MockFactory::new();
        factory.fail_after = Some(0);
        let scenarios = vec![passing_scenario("unreachable-browser")];

        let report = Harness::new().run(&mut factory, &scenarios).await;

        assert!(!report.all_passed());
        let reason = report.records[0]
            .outcome
            .failure_reason
            .clone()
            .expect("reason");
        assert!(reason.contains("Session unavailable"));
        assert_eq!(report.records[0].outcome.steps_executed, 0);
    }

    #[tokio::test]
    async fn test_report_serializes_to_json() {
        let mut factory = MockFactory::new();
        let report = Harness::new()
            .run(&mut factory, &[passing_scenario("one")])
            .await;

        let json = report.to_json().expect("serialize");
        assert!(json.contains("\"run_id\""));
        assert!(json.contains("\"one\""));
    }
}
