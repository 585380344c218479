//! The UI action sequencer.
//!
//! Executes an ordered step list against a single exclusively-owned browser
//! session, strictly in index order, halting on the first failure. There is
//! no retry transition: any retry policy belongs to the surrounding runner.
//!
//! Run lifecycle: `Pending -> Running -> {Passed, Failed}`.

use crate::result::{PasoError, PasoResult};
use crate::session::{ElementHandle, FrameContext, Session};
use crate::step::{ActionKind, Condition, Scenario, Step};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Lifecycle phase of one sequencer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Not started
    Pending,
    /// Steps executing
    Running,
    /// All steps completed
    Passed,
    /// Halted at a failing step
    Failed,
}

impl RunPhase {
    /// Whether the phase is terminal
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

/// Structured result of one sequencer run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether every step completed
    pub passed: bool,
    /// Index of the failing step, if any
    pub failure_step: Option<usize>,
    /// Failure rendering, if any
    pub failure_reason: Option<String>,
    /// Number of steps that completed successfully
    pub steps_executed: usize,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl Outcome {
    /// Create a passing outcome
    #[must_use]
    pub fn passed(steps_executed: usize, duration: Duration) -> Self {
        Self {
            passed: true,
            failure_step: None,
            failure_reason: None,
            steps_executed,
            duration,
        }
    }

    /// Create a failing outcome
    #[must_use]
    pub fn failed(
        failure_step: Option<usize>,
        reason: &PasoError,
        steps_executed: usize,
        duration: Duration,
    ) -> Self {
        Self {
            passed: false,
            failure_step,
            failure_reason: Some(reason.to_string()),
            steps_executed,
            duration,
        }
    }

    /// Terminal phase this outcome represents
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        if self.passed {
            RunPhase::Passed
        } else {
            RunPhase::Failed
        }
    }
}

/// Executes step lists strictly in order against a session.
///
/// The sequencer owns the frame-context bookkeeping: navigation and frame
/// switches bump a context serial, and element handles resolved under an
/// older serial are refused as stale before the provider is ever asked to
/// act on them.
#[derive(Debug, Clone)]
pub struct Sequencer {
    default_wait: Duration,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            default_wait: Duration::from_secs(5),
        }
    }
}

impl Sequencer {
    /// Create a sequencer with the default bounded wait (5s)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the bounded wait applied to locate steps
    #[must_use]
    pub const fn with_default_wait(mut self, wait: Duration) -> Self {
        self.default_wait = wait;
        self
    }

    /// Validate a scenario, then run its steps.
    ///
    /// A structurally invalid scenario fails without touching the session,
    /// so a misconfigured scenario can never report a vacuous pass.
    pub async fn run_scenario<S: Session + ?Sized>(
        &self,
        session: &mut S,
        scenario: &Scenario,
    ) -> Outcome {
        if let Err(err) = scenario.validate() {
            warn!(scenario = %scenario.name, error = %err, "scenario rejected");
            return Outcome::failed(None, &err, 0, Duration::ZERO);
        }
        self.run(session, &scenario.steps).await
    }

    /// Execute steps strictly in index order, halting on the first failure.
    pub async fn run<S: Session + ?Sized>(&self, session: &mut S, steps: &[Step]) -> Outcome {
        let started = Instant::now();
        if steps.is_empty() {
            let err = PasoError::InvalidScenario {
                message: "step sequence is empty".to_string(),
            };
            return Outcome::failed(None, &err, 0, started.elapsed());
        }

        let mut run = Run {
            serial: 0,
            handles: HashMap::new(),
            frame: FrameContext::top(),
        };

        for (index, step) in steps.iter().enumerate() {
            debug!(index, step = %step, "executing step");
            if let Err(err) = self.execute_step(session, &mut run, step).await {
                warn!(index, step = %step, error = %err, "step failed; halting");
                return Outcome::failed(Some(index), &err, index, started.elapsed());
            }
        }

        Outcome::passed(steps.len(), started.elapsed())
    }

    async fn execute_step<S: Session + ?Sized>(
        &self,
        session: &mut S,
        run: &mut Run,
        step: &Step,
    ) -> PasoResult<()> {
        match step {
            Step::Navigate { url } => {
                session.navigate(url).await?;
                run.invalidate();
                run.frame.reset();
                Ok(())
            }
            Step::Locate { name, selector } => {
                let mut handle = session.wait_for(selector, self.default_wait).await?;
                handle.serial = run.serial;
                run.handles.insert(name.clone(), handle);
                Ok(())
            }
            Step::Act { target, action } => {
                let handle = run.live_handle(target)?.clone();
                match action {
                    ActionKind::Click => session.click(&handle).await,
                    ActionKind::TypeText { text } => session.type_text(&handle, text).await,
                    ActionKind::PressKeys { keys } => session.press_keys(&handle, keys).await,
                    ActionKind::Hover => session.hover(&handle).await,
                    ActionKind::DragBy { dx, dy } => session.drag_by(&handle, *dx, *dy).await,
                    ActionKind::SelectOption { option } => {
                        session.select_option(&handle, option).await
                    }
                }
            }
            Step::Assert { target, condition } => {
                self.check_condition(session, run, target.as_deref(), condition)
                    .await
            }
            Step::EnterFrame { target } => {
                let handle = run.live_handle(target)?.clone();
                session.enter_frame(&handle).await?;
                run.frame.enter(handle.id);
                run.invalidate();
                Ok(())
            }
            Step::TopFrame => {
                session.top_frame().await?;
                run.frame.reset();
                run.invalidate();
                Ok(())
            }
        }
    }

    async fn check_condition<S: Session + ?Sized>(
        &self,
        session: &mut S,
        run: &Run,
        target: Option<&str>,
        condition: &Condition,
    ) -> PasoResult<()> {
        if condition.is_page_level() {
            return match condition {
                Condition::UrlContains { pattern } => {
                    let url = session.current_url().await?;
                    expect_bool(condition, url.contains(pattern), &url)
                }
                Condition::PageContains { needle } => {
                    let found = session.page_contains(needle).await?;
                    expect_bool(condition, found, "page source")
                }
                _ => unreachable!("is_page_level covers exactly these variants"),
            };
        }

        let target = target.ok_or_else(|| PasoError::InvalidScenario {
            message: format!("assert {:?} needs a target element", condition.describe()),
        })?;
        let handle = run.live_handle(target)?.clone();

        match condition {
            Condition::Selected { expected } => {
                let actual = session.is_selected(&handle).await?;
                expect_eq(condition, *expected, actual)
            }
            Condition::Enabled { expected } => {
                let actual = session.is_enabled(&handle).await?;
                expect_eq(condition, *expected, actual)
            }
            Condition::Visible { expected } => {
                let actual = session.is_visible(&handle).await?;
                expect_eq(condition, *expected, actual)
            }
            Condition::TextEquals { expected } => {
                let actual = session.text_of(&handle).await?;
                expect_eq(condition, expected.clone(), actual)
            }
            Condition::TextContains { substring } => {
                let actual = session.text_of(&handle).await?;
                expect_bool(condition, actual.contains(substring), &actual)
            }
            Condition::ValueEquals { expected } => {
                let actual = session.value_of(&handle).await?;
                expect_eq(condition, expected.clone(), actual)
            }
            Condition::UrlContains { .. } | Condition::PageContains { .. } => {
                unreachable!("page-level conditions handled above")
            }
        }
    }
}

/// Per-run mutable state
struct Run {
    serial: u64,
    handles: HashMap<String, ElementHandle>,
    frame: FrameContext,
}

impl Run {
    /// Bump the context serial; handles resolved before this are stale
    fn invalidate(&mut self) {
        self.serial += 1;
    }

    /// Look up a bound handle and refuse stale ones
    fn live_handle(&self, target: &str) -> PasoResult<&ElementHandle> {
        let handle = self
            .handles
            .get(target)
            .ok_or_else(|| PasoError::ElementNotFound {
                selector: format!("binding {target:?}"),
                waited_ms: 0,
            })?;
        if handle.serial != self.serial {
            return Err(PasoError::stale(handle.selector.clone()));
        }
        Ok(handle)
    }
}

fn expect_eq<T: PartialEq + std::fmt::Debug>(
    condition: &Condition,
    expected: T,
    actual: T,
) -> PasoResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PasoError::AssertionFailed {
            check: condition.describe(),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        })
    }
}

fn expect_bool(condition: &Condition, held: bool, actual: &str) -> PasoResult<()> {
    if held {
        Ok(())
    } else {
        Err(PasoError::AssertionFailed {
            check: condition.describe(),
            expected: "true".to_string(),
            actual: format!("false ({actual})"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use crate::session::{MockElement, MockSession};

    fn checkbox_scenario() -> Scenario {
        Scenario::builder("checkbox")
            .navigate("http://the-internet.herokuapp.com/checkboxes")
            .locate("box1", Selector::xpath("//input[@type='checkbox'][1]"))
            .click("box1")
            .assert_that("box1", Condition::Selected { expected: true })
            .build()
    }

    fn session_with_checkbox() -> MockSession {
        let mut session = MockSession::new();
        session.add_element(
            &Selector::xpath("//input[@type='checkbox'][1]"),
            MockElement::checkbox(false),
        );
        session
    }

    mod phase_tests {
        use super::*;

        #[test]
        fn test_terminal_phases() {
            assert!(!RunPhase::Pending.is_terminal());
            assert!(!RunPhase::Running.is_terminal());
            assert!(RunPhase::Passed.is_terminal());
            assert!(RunPhase::Failed.is_terminal());
        }

        #[test]
        fn test_outcome_phase_mapping() {
            let pass = Outcome::passed(4, Duration::ZERO);
            assert_eq!(pass.phase(), RunPhase::Passed);

            let err = PasoError::stale("#x");
            let fail = Outcome::failed(Some(2), &err, 2, Duration::ZERO);
            assert_eq!(fail.phase(), RunPhase::Failed);
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_all_pass_sequence() {
            let mut session = session_with_checkbox();
            let outcome = Sequencer::new()
                .run_scenario(&mut session, &checkbox_scenario())
                .await;

            assert!(outcome.passed);
            assert!(outcome.failure_step.is_none());
            assert!(outcome.failure_reason.is_none());
            assert_eq!(outcome.steps_executed, 4);
        }

        #[tokio::test]
        async fn test_missing_selector_fails_with_element_not_found() {
            let mut session = MockSession::new();
            let scenario = Scenario::builder("missing")
                .navigate("http://example.com")
                .locate("ghost", Selector::css("#missing"))
                .click("ghost")
                .build();

            let outcome = Sequencer::new().run_scenario(&mut session, &scenario).await;

            assert!(!outcome.passed);
            assert_eq!(outcome.failure_step, Some(1));
            let reason = outcome.failure_reason.expect("reason");
            assert!(reason.contains("Element not found"));
        }

        #[tokio::test]
        async fn test_no_step_after_first_failure_executes() {
            let mut session = MockSession::new();
            let scenario = Scenario::builder("halts")
                .navigate("http://example.com")
                .locate("ghost", Selector::css("#missing"))
                .click("ghost")
                .top_frame()
                .build();

            let outcome = Sequencer::new().run_scenario(&mut session, &scenario).await;

            assert_eq!(outcome.failure_step, Some(1));
            assert_eq!(outcome.steps_executed, 1);
            // the locate polled, but neither the click nor the frame switch ran
            assert!(session.was_called("wait_for"));
            assert!(!session.was_called("click"));
            assert!(!session.was_called("top_frame"));
        }

        #[tokio::test]
        async fn test_assert_is_idempotent_against_unchanged_state() {
            let mut session = session_with_checkbox();
            let scenario = Scenario::builder("idempotent")
                .navigate("http://the-internet.herokuapp.com/checkboxes")
                .locate("box1", Selector::xpath("//input[@type='checkbox'][1]"))
                .click("box1")
                .assert_that("box1", Condition::Selected { expected: true })
                .assert_that("box1", Condition::Selected { expected: true })
                .build();

            let outcome = Sequencer::new().run_scenario(&mut session, &scenario).await;
            assert!(outcome.passed);
        }

        #[tokio::test]
        async fn test_double_toggle_restores_original_state() {
            let mut session = session_with_checkbox();
            let scenario = Scenario::builder("round-trip")
                .navigate("http://the-internet.herokuapp.com/checkboxes")
                .locate("box1", Selector::xpath("//input[@type='checkbox'][1]"))
                .toggle("box1", 2, false)
                .build();

            let outcome = Sequencer::new().run_scenario(&mut session, &scenario).await;
            assert!(outcome.passed, "{:?}", outcome.failure_reason);
            let element = session
                .element(&Selector::xpath("//input[@type='checkbox'][1]"))
                .expect("element");
            assert!(!element.selected);
        }

        #[tokio::test]
        async fn test_empty_step_list_is_invalid() {
            let mut session = MockSession::new();
            let outcome = Sequencer::new().run(&mut session, &[]).await;

            assert!(!outcome.passed);
            assert!(outcome.failure_step.is_none());
            assert!(outcome
                .failure_reason
                .expect("reason")
                .contains("empty"));
            assert!(session.history().is_empty());
        }

        #[tokio::test]
        async fn test_unbound_target_fails_at_runtime() {
            let mut session = MockSession::new();
            let steps = [Step::Act {
                target: "never-located".to_string(),
                action: ActionKind::Click,
            }];
            let outcome = Sequencer::new().run(&mut session, &steps).await;

            assert_eq!(outcome.failure_step, Some(0));
            assert!(outcome
                .failure_reason
                .expect("reason")
                .contains("never-located"));
        }

        #[tokio::test]
        async fn test_page_level_assert() {
            let mut session = MockSession::new();
            session.set_page_source("<html>total: 100.00$</html>");
            let scenario = Scenario::builder("page")
                .navigate("https://tutorialsninja.com/demo/")
                .assert_page(Condition::UrlContains {
                    pattern: "tutorialsninja".to_string(),
                })
                .assert_page(Condition::PageContains {
                    needle: "$".to_string(),
                })
                .build();

            let outcome = Sequencer::new().run_scenario(&mut session, &scenario).await;
            assert!(outcome.passed, "{:?}", outcome.failure_reason);
        }
    }

    mod stale_handle_tests {
        use super::*;

        fn frame_session() -> MockSession {
            let mut session = MockSession::new();
            session.add_element(&Selector::css("#frame1"), MockElement::default());
            session.add_element(&Selector::css("#button"), MockElement::default());
            session
        }

        #[tokio::test]
        async fn test_handle_is_stale_after_frame_switch() {
            let mut session = frame_session();
            let scenario = Scenario::builder("stale")
                .navigate("http://example.com")
                .locate("button", Selector::css("#button"))
                .locate("frame", Selector::css("#frame1"))
                .enter_frame("frame")
                .click("button")
                .build();

            let outcome = Sequencer::new().run_scenario(&mut session, &scenario).await;

            assert!(!outcome.passed);
            assert_eq!(outcome.failure_step, Some(4));
            let reason = outcome.failure_reason.expect("reason");
            assert!(reason.contains("stale"), "{reason}");
            // refused before the provider was asked to click
            assert!(!session.was_called("click"));
        }

        #[tokio::test]
        async fn test_handle_is_stale_after_navigation() {
            let mut session = frame_session();
            let scenario = Scenario::builder("stale-nav")
                .navigate("http://example.com")
                .locate("button", Selector::css("#button"))
                .navigate("http://example.com/other")
                .click("button")
                .build();

            let outcome = Sequencer::new().run_scenario(&mut session, &scenario).await;

            assert_eq!(outcome.failure_step, Some(3));
            assert!(outcome
                .failure_reason
                .expect("reason")
                .contains("stale"));
        }

        #[tokio::test]
        async fn test_relocate_after_frame_switch_is_fresh() {
            let mut session = MockSession::new();
            session.add_element(&Selector::css("#frame1"), MockElement::default());
            session.add_frame_element(
                &["css=#frame1"],
                &Selector::css("#button"),
                MockElement::default(),
            );
            let scenario = Scenario::builder("fresh")
                .navigate("http://example.com")
                .locate("frame", Selector::css("#frame1"))
                .enter_frame("frame")
                .locate("button", Selector::css("#button"))
                .click("button")
                .build();

            let outcome = Sequencer::new().run_scenario(&mut session, &scenario).await;
            assert!(outcome.passed, "{:?}", outcome.failure_reason);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// An even number of toggles restores the original state; an odd
            /// number flips it.
            #[test]
            fn toggle_parity(times in 1usize..16, initially_selected: bool) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .expect("runtime");

                let selector = Selector::css("#box");
                let mut session = MockSession::new();
                session.add_element(&selector, MockElement::checkbox(initially_selected));

                let scenario = Scenario::builder("parity")
                    .navigate("http://example.com")
                    .locate("box", selector.clone())
                    .toggle("box", times, initially_selected)
                    .build();

                let outcome = runtime
                    .block_on(Sequencer::new().run_scenario(&mut session, &scenario));
                prop_assert!(outcome.passed, "{:?}", outcome.failure_reason);

                let element = session.element(&selector).expect("element");
                let expected = if times % 2 == 0 {
                    initially_selected
                } else {
                    !initially_selected
                };
                prop_assert_eq!(element.selected, expected);
            }

            /// The failing step index always bounds the executed step count.
            #[test]
            fn failure_bounds_execution(extra_steps in 0usize..8) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .expect("runtime");

                let mut builder = Scenario::builder("bounded")
                    .navigate("http://example.com")
                    .locate("ghost", Selector::css("#missing"));
                for _ in 0..extra_steps {
                    builder = builder.top_frame();
                }
                let scenario = builder.build();

                let mut session = MockSession::new();
                let outcome = runtime
                    .block_on(Sequencer::new().run_scenario(&mut session, &scenario));

                prop_assert_eq!(outcome.failure_step, Some(1));
                prop_assert_eq!(outcome.steps_executed, 1);
                prop_assert!(!session.was_called("top_frame"));
            }
        }
    }
}
