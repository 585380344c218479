//! Declarative steps and scenarios.
//!
//! A scenario is an ordered list of steps with no branching and no loops;
//! fixed-count repetition ("toggle twice") is flattened into explicit
//! act/assert pairs by the builder so a test report can inspect every step.

use crate::result::{PasoError, PasoResult};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported scenario file schema version
pub const SCENARIO_SCHEMA_VERSION: &str = "1";

/// Action applied to a previously located element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Click the element
    Click,
    /// Type text into the element
    TypeText {
        /// Text to type
        text: String,
    },
    /// Send keystrokes to the page (the element only receives focus first)
    PressKeys {
        /// Key sequence, one keystroke per character
        keys: String,
    },
    /// Move the pointer over the element
    Hover,
    /// Press on the element and drag by a pixel offset
    DragBy {
        /// Horizontal offset in pixels
        dx: i64,
        /// Vertical offset in pixels
        dy: i64,
    },
    /// Choose an option of a `<select>` element
    SelectOption {
        /// Which option to choose
        option: OptionTarget,
    },
}

impl ActionKind {
    /// Short display name for step logs
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::TypeText { .. } => "type",
            Self::PressKeys { .. } => "press keys",
            Self::Hover => "hover",
            Self::DragBy { .. } => "drag",
            Self::SelectOption { .. } => "select option",
        }
    }
}

/// How a `<select>` option is identified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum OptionTarget {
    /// Match the option's visible text
    VisibleText {
        /// Expected text
        text: String,
    },
    /// Match the option's `value` attribute
    Value {
        /// Expected value
        value: String,
    },
}

/// Boolean condition evaluated against current element or page state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Element selected state (checkboxes, radio buttons, options)
    Selected {
        /// Expected selected state
        expected: bool,
    },
    /// Element enabled state
    Enabled {
        /// Expected enabled state
        expected: bool,
    },
    /// Element visibility
    Visible {
        /// Expected visibility
        expected: bool,
    },
    /// Element text content equals
    TextEquals {
        /// Expected text
        expected: String,
    },
    /// Element text content contains
    TextContains {
        /// Expected substring
        substring: String,
    },
    /// Form element value equals
    ValueEquals {
        /// Expected value
        expected: String,
    },
    /// Current URL contains (page-level, needs no target)
    UrlContains {
        /// Expected substring
        pattern: String,
    },
    /// Page source contains (page-level, needs no target)
    PageContains {
        /// Expected substring
        needle: String,
    },
}

impl Condition {
    /// Whether the condition is evaluated against the page rather than a
    /// located element
    #[must_use]
    pub const fn is_page_level(&self) -> bool {
        matches!(self, Self::UrlContains { .. } | Self::PageContains { .. })
    }

    /// Short description for failure messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Selected { expected } => format!("selected == {expected}"),
            Self::Enabled { expected } => format!("enabled == {expected}"),
            Self::Visible { expected } => format!("visible == {expected}"),
            Self::TextEquals { expected } => format!("text == {expected:?}"),
            Self::TextContains { substring } => format!("text contains {substring:?}"),
            Self::ValueEquals { expected } => format!("value == {expected:?}"),
            Self::UrlContains { pattern } => format!("url contains {pattern:?}"),
            Self::PageContains { needle } => format!("page contains {needle:?}"),
        }
    }
}

/// One declarative unit of navigation, lookup, action, assertion, or frame
/// scope change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Load a URL; resets the frame scope to the new top document and
    /// invalidates every held element handle
    Navigate {
        /// Target URL
        url: String,
    },
    /// Resolve a selector to an element handle and bind it to a name
    Locate {
        /// Name later steps use to reference the handle
        name: String,
        /// Selector resolved within the active frame scope
        selector: Selector,
    },
    /// Apply an action to a previously located element
    Act {
        /// Name bound by an earlier locate step
        target: String,
        /// Action to apply
        action: ActionKind,
    },
    /// Check a condition; page-level conditions omit the target
    Assert {
        /// Name bound by an earlier locate step, if element-level
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        /// Condition to evaluate
        condition: Condition,
    },
    /// Enter the frame owned by a previously located iframe element;
    /// invalidates every held element handle
    EnterFrame {
        /// Name bound by an earlier locate step
        target: String,
    },
    /// Return to the top document; invalidates every held element handle
    TopFrame,
}

impl Step {
    /// Whether executing this step invalidates previously located handles
    #[must_use]
    pub const fn invalidates_handles(&self) -> bool {
        matches!(
            self,
            Self::Navigate { .. } | Self::EnterFrame { .. } | Self::TopFrame
        )
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { url } => write!(f, "navigate {url}"),
            Self::Locate { name, selector } => write!(f, "locate {name} <- {selector}"),
            Self::Act { target, action } => write!(f, "{} {target}", action.verb()),
            Self::Assert { target, condition } => match target {
                Some(t) => write!(f, "assert {t}: {}", condition.describe()),
                None => write!(f, "assert {}", condition.describe()),
            },
            Self::EnterFrame { target } => write!(f, "enter frame {target}"),
            Self::TopFrame => write!(f, "top frame"),
        }
    }
}

/// A named, ordered step list; the unit the harness runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Ordered steps
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Start building a scenario
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
        }
    }

    /// Validate structural constraints: non-empty steps, every act/assert/
    /// frame target bound by an earlier locate step.
    pub fn validate(&self) -> PasoResult<()> {
        if self.steps.is_empty() {
            return Err(PasoError::InvalidScenario {
                message: format!("scenario {:?} has no steps", self.name),
            });
        }
        let mut bound: Vec<&str> = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Locate { name, .. } => bound.push(name),
                Step::Act { target, .. } | Step::EnterFrame { target } => {
                    if !bound.iter().any(|n| n == target) {
                        return Err(PasoError::InvalidScenario {
                            message: format!(
                                "step {index} references {target:?} before any locate binds it"
                            ),
                        });
                    }
                }
                Step::Assert {
                    target: Some(target),
                    ..
                } => {
                    if !bound.iter().any(|n| n == target) {
                        return Err(PasoError::InvalidScenario {
                            message: format!(
                                "step {index} references {target:?} before any locate binds it"
                            ),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Builder producing a flat, inspectable step list
#[derive(Debug)]
pub struct ScenarioBuilder {
    name: String,
    description: String,
    steps: Vec<Step>,
}

impl ScenarioBuilder {
    /// Set the description
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Append a navigate step
    #[must_use]
    pub fn navigate(mut self, url: impl Into<String>) -> Self {
        self.steps.push(Step::Navigate { url: url.into() });
        self
    }

    /// Append a locate step binding `name`
    #[must_use]
    pub fn locate(mut self, name: impl Into<String>, selector: Selector) -> Self {
        self.steps.push(Step::Locate {
            name: name.into(),
            selector,
        });
        self
    }

    /// Append an act step
    #[must_use]
    pub fn act(mut self, target: impl Into<String>, action: ActionKind) -> Self {
        self.steps.push(Step::Act {
            target: target.into(),
            action,
        });
        self
    }

    /// Append a click act step
    #[must_use]
    pub fn click(self, target: impl Into<String>) -> Self {
        self.act(target, ActionKind::Click)
    }

    /// Append an element-level assert step
    #[must_use]
    pub fn assert_that(mut self, target: impl Into<String>, condition: Condition) -> Self {
        self.steps.push(Step::Assert {
            target: Some(target.into()),
            condition,
        });
        self
    }

    /// Append a page-level assert step
    #[must_use]
    pub fn assert_page(mut self, condition: Condition) -> Self {
        self.steps.push(Step::Assert {
            target: None,
            condition,
        });
        self
    }

    /// Append an enter-frame step
    #[must_use]
    pub fn enter_frame(mut self, target: impl Into<String>) -> Self {
        self.steps.push(Step::EnterFrame {
            target: target.into(),
        });
        self
    }

    /// Append a top-frame step
    #[must_use]
    pub fn top_frame(mut self) -> Self {
        self.steps.push(Step::TopFrame);
        self
    }

    /// Toggle a boolean element `times` times, asserting the selected state
    /// after every click. Emitted as flat click/assert pairs so the step
    /// list stays declarative.
    #[must_use]
    pub fn toggle(mut self, target: impl Into<String>, times: usize, initially_selected: bool) -> Self {
        let target = target.into();
        let mut selected = initially_selected;
        for _ in 0..times {
            selected = !selected;
            self.steps.push(Step::Act {
                target: target.clone(),
                action: ActionKind::Click,
            });
            self.steps.push(Step::Assert {
                target: Some(target.clone()),
                condition: Condition::Selected { expected: selected },
            });
        }
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Scenario {
        Scenario {
            name: self.name,
            description: self.description,
            steps: self.steps,
        }
    }
}

/// Versioned scenario file: a YAML document holding one or more scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Schema version (must be "1")
    pub version: String,
    /// Scenarios in declaration order
    pub scenarios: Vec<Scenario>,
}

impl ScenarioFile {
    /// Parse from YAML, validating the schema version and every scenario
    pub fn from_yaml(yaml: &str) -> PasoResult<Self> {
        let file: Self = serde_yaml_ng::from_str(yaml)?;
        if file.version != SCENARIO_SCHEMA_VERSION {
            return Err(PasoError::InvalidScenario {
                message: format!(
                    "unsupported scenario schema version {:?} (expected {SCENARIO_SCHEMA_VERSION:?})",
                    file.version
                ),
            });
        }
        for scenario in &file.scenarios {
            scenario.validate()?;
        }
        Ok(file)
    }

    /// Load from a file path
    pub fn load(path: impl AsRef<std::path::Path>) -> PasoResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod builder_tests {
        use super::*;

        #[test]
        fn test_builder_emits_steps_in_order() {
            let scenario = Scenario::builder("checkbox")
                .navigate("http://the-internet.herokuapp.com/checkboxes")
                .locate("box1", Selector::xpath("//input[@type='checkbox'][1]"))
                .click("box1")
                .assert_that("box1", Condition::Selected { expected: true })
                .build();

            assert_eq!(scenario.steps.len(), 4);
            assert!(matches!(scenario.steps[0], Step::Navigate { .. }));
            assert!(matches!(scenario.steps[3], Step::Assert { .. }));
        }

        #[test]
        fn test_toggle_flattens_to_act_assert_pairs() {
            let scenario = Scenario::builder("toggle")
                .navigate("http://example.com")
                .locate("box", Selector::css("#box"))
                .toggle("box", 2, true)
                .build();

            // navigate + locate + 2 * (act + assert)
            assert_eq!(scenario.steps.len(), 6);
            assert!(matches!(
                scenario.steps[3],
                Step::Assert {
                    condition: Condition::Selected { expected: false },
                    ..
                }
            ));
            // even toggle count returns to the original state
            assert!(matches!(
                scenario.steps[5],
                Step::Assert {
                    condition: Condition::Selected { expected: true },
                    ..
                }
            ));
        }
    }

    mod validate_tests {
        use super::*;

        #[test]
        fn test_empty_scenario_rejected() {
            let scenario = Scenario {
                name: "empty".to_string(),
                description: String::new(),
                steps: Vec::new(),
            };
            let err = scenario.validate().expect_err("should reject");
            assert!(matches!(err, PasoError::InvalidScenario { .. }));
        }

        #[test]
        fn test_act_before_locate_rejected() {
            let scenario = Scenario {
                name: "bad".to_string(),
                description: String::new(),
                steps: vec![Step::Act {
                    target: "ghost".to_string(),
                    action: ActionKind::Click,
                }],
            };
            let err = scenario.validate().expect_err("should reject");
            assert!(err.to_string().contains("ghost"));
        }

        #[test]
        fn test_page_level_assert_needs_no_target() {
            let scenario = Scenario::builder("page")
                .navigate("http://example.com")
                .assert_page(Condition::PageContains {
                    needle: "$".to_string(),
                })
                .build();
            scenario.validate().expect("valid");
        }
    }

    mod schema_tests {
        use super::*;

        const VALID_FILE: &str = r#"
version: "1"
scenarios:
  - name: checkbox-toggle
    description: toggle the first checkbox twice
    steps:
      - step: navigate
        url: "http://the-internet.herokuapp.com/checkboxes"
      - step: locate
        name: box1
        selector:
          strategy: xpath
          query: "//input[@type='checkbox'][1]"
      - step: act
        target: box1
        action:
          type: click
      - step: assert
        target: box1
        condition:
          type: selected
          expected: true
      - step: top_frame
"#;

        #[test]
        fn test_parse_valid_file() {
            let file = ScenarioFile::from_yaml(VALID_FILE).expect("should parse");
            assert_eq!(file.scenarios.len(), 1);
            assert_eq!(file.scenarios[0].name, "checkbox-toggle");
            assert_eq!(file.scenarios[0].steps.len(), 5);
        }

        #[test]
        fn test_reject_unknown_version() {
            let yaml = VALID_FILE.replace("version: \"1\"", "version: \"2\"");
            let err = ScenarioFile::from_yaml(&yaml).expect_err("should reject");
            assert!(err.to_string().contains("schema version"));
        }

        #[test]
        fn test_reject_file_with_invalid_scenario() {
            let yaml = r#"
version: "1"
scenarios:
  - name: unbound
    steps:
      - step: act
        target: ghost
        action:
          type: click
"#;
            let err = ScenarioFile::from_yaml(yaml).expect_err("should reject");
            assert!(matches!(err, PasoError::InvalidScenario { .. }));
        }

        #[test]
        fn test_step_round_trip() {
            let step = Step::Act {
                target: "slider".to_string(),
                action: ActionKind::DragBy { dx: 25, dy: 0 },
            };
            let yaml = serde_yaml_ng::to_string(&step).expect("serialize");
            let back: Step = serde_yaml_ng::from_str(&yaml).expect("deserialize");
            assert_eq!(back, step);
        }

        #[test]
        fn test_select_option_schema() {
            let yaml = r#"
step: act
target: dropdown
action:
  type: select_option
  option:
    by: visible_text
    text: "Big Baby Cat"
"#;
            let step: Step = serde_yaml_ng::from_str(yaml).expect("deserialize");
            assert!(matches!(
                step,
                Step::Act {
                    action: ActionKind::SelectOption {
                        option: OptionTarget::VisibleText { .. }
                    },
                    ..
                }
            ));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_step_display() {
            let step = Step::Locate {
                name: "radio1".to_string(),
                selector: Selector::id("vfb-7-1"),
            };
            assert_eq!(step.to_string(), "locate radio1 <- id=vfb-7-1");
        }

        #[test]
        fn test_invalidating_steps() {
            assert!(Step::TopFrame.invalidates_handles());
            assert!(Step::Navigate {
                url: "http://example.com".to_string()
            }
            .invalidates_handles());
            assert!(!Step::Act {
                target: "x".to_string(),
                action: ActionKind::Hover,
            }
            .invalidates_handles());
        }
    }
}
