//! Paso: guarded UI-action sequencer for browser UI tests.
//!
//! Paso (Spanish: "step") replaces per-site browser test scripts with one
//! declarative sequencer: a scenario is an ordered list of steps (navigate,
//! locate, act, assert, frame switch) executed strictly in order against a
//! single exclusively-owned browser session, halting on the first failure.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       PASO Architecture                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐     ┌────────────┐     ┌───────────────────┐    │
//! │   │ Scenario   │     │ Sequencer  │     │ Session trait     │    │
//! │   │ (steps as  │────►│ (ordered,  │────►│ CdpSession (CDP)  │    │
//! │   │  data)     │     │  guarded)  │     │ MockSession       │    │
//! │   └────────────┘     └────────────┘     └───────────────────┘    │
//! │         ▲                   │                                    │
//! │   ┌────────────┐     ┌────────────┐                              │
//! │   │ Constants  │     │ Harness +  │──► exit code 0/1             │
//! │   │ (JSON)     │     │ Reporter   │                              │
//! │   └────────────┘     └────────────┘                              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use paso::{Condition, Scenario, Selector};
//!
//! let scenario = Scenario::builder("checkbox")
//!     .navigate("http://the-internet.herokuapp.com/checkboxes")
//!     .locate("box1", Selector::xpath("//input[@type='checkbox'][1]"))
//!     .click("box1")
//!     .assert_that("box1", Condition::Selected { expected: true })
//!     .build();
//!
//! assert!(scenario.validate().is_ok());
//! ```

#![warn(missing_docs)]

/// Real browser sessions over the Chrome DevTools Protocol
pub mod browser;
/// Static expected-values configuration
pub mod config;
/// Scenario harness with scoped session ownership
pub mod harness;
/// Console and JSON reporting
pub mod reporter;
/// Result and error types
pub mod result;
/// Built-in scenario catalog
pub mod scenarios;
/// The UI action sequencer
pub mod sequencer;
/// Element selectors
pub mod selector;
/// Session abstraction and mock implementation
pub mod session;
/// Declarative steps and scenarios
pub mod step;

#[cfg(feature = "browser")]
pub use browser::CdpSession;
pub use browser::BrowserConfig;
pub use config::Constants;
pub use harness::{Harness, ScenarioRecord, SessionFactory, SuiteReport};
pub use reporter::ConsoleReporter;
pub use result::{PasoError, PasoResult};
pub use sequencer::{Outcome, RunPhase, Sequencer};
pub use selector::{Selector, Strategy};
pub use session::{ElementHandle, FrameContext, MockElement, MockSession, Session};
pub use step::{
    ActionKind, Condition, OptionTarget, Scenario, ScenarioBuilder, ScenarioFile, Step,
    SCENARIO_SCHEMA_VERSION,
};
