//! Built-in scenario catalog.
//!
//! Eight ready-made flows against public demo sites, expressed as
//! declarative step lists: checkbox toggling, radio selection, slider
//! dragging, canvas keystrokes, hover menus, nested frames, and currency
//! and language switching. Fixed-count repetition is flattened into
//! explicit act/assert pairs.

use crate::config::Constants;
use crate::selector::Selector;
use crate::step::{ActionKind, Condition, OptionTarget, Scenario};

/// Checkbox toggling on the-internet: check both boxes, then toggle each
/// twice and verify the round trip.
#[must_use]
pub fn checkboxes() -> Scenario {
    Scenario::builder("checkboxes")
        .description("toggle checkboxes and verify selected state after each click")
        .navigate("http://the-internet.herokuapp.com/checkboxes")
        .locate("box1", Selector::xpath("//input[@type='checkbox'][1]"))
        .locate("box2", Selector::xpath("//input[@type='checkbox'][2]"))
        // box1 starts unchecked, box2 starts checked on this page
        .click("box1")
        .assert_that("box1", Condition::Selected { expected: true })
        .assert_that("box2", Condition::Selected { expected: true })
        .toggle("box1", 2, true)
        .toggle("box2", 2, true)
        .build()
}

/// Radio-button selection on the guru99 demo form, plus one checkbox
/// toggle.
#[must_use]
pub fn radio_buttons() -> Scenario {
    Scenario::builder("radio-buttons")
        .description("select radio options and verify group exclusivity")
        .navigate("http://demo.guru99.com/test/radio.html")
        .locate("radio1", Selector::id("vfb-7-1"))
        .locate("radio2", Selector::id("vfb-7-2"))
        .click("radio1")
        .assert_that("radio1", Condition::Selected { expected: true })
        .click("radio2")
        .assert_that("radio2", Condition::Selected { expected: true })
        .assert_that("radio1", Condition::Selected { expected: false })
        .locate("check1", Selector::id("vfb-6-1"))
        .click("check1")
        .assert_that("check1", Condition::Selected { expected: true })
        .build()
}

/// Range-slider drag on demoqa.
#[must_use]
pub fn range_slider() -> Scenario {
    Scenario::builder("range-slider")
        .description("drag the range slider horizontally")
        .navigate("https://demoqa.com/slider/")
        .locate("slider", Selector::xpath("//input[@type='range']"))
        .act("slider", ActionKind::DragBy { dx: 25, dy: 0 })
        .click("slider")
        .assert_that("slider", Condition::Enabled { expected: true })
        .locate("value", Selector::id("sliderValue"))
        .assert_that("value", Condition::Visible { expected: true })
        .build()
}

/// Canvas calculator: keystrokes inside the named full-page frame.
#[must_use]
pub fn canvas_calculator() -> Scenario {
    Scenario::builder("canvas-calculator")
        .description("compute 7*3 on the canvas calculator inside its frame")
        .navigate("https://www.online-calculator.com/")
        .locate("frame", Selector::name("fullframe"))
        .enter_frame("frame")
        .locate("canvas", Selector::xpath("//*[@id=\"canvas\"]"))
        .click("canvas")
        .act("canvas", ActionKind::PressKeys { keys: "7".to_string() })
        .act("canvas", ActionKind::PressKeys { keys: "*".to_string() })
        .act("canvas", ActionKind::PressKeys { keys: "3".to_string() })
        .act("canvas", ActionKind::PressKeys { keys: "=".to_string() })
        .assert_that("canvas", Condition::Visible { expected: true })
        .top_frame()
        .build()
}

/// Hover through the nested demoqa menu and click the innermost entry.
#[must_use]
pub fn hover_menu() -> Scenario {
    Scenario::builder("hover-menu")
        .description("open nested menus by hover and select the leaf item")
        .navigate("https://demoqa.com/menu/")
        .locate("item2", Selector::link_text("Main Item 2"))
        .act("item2", ActionKind::Hover)
        .locate("sublist", Selector::link_text("SUB SUB LIST \u{bb}"))
        .act("sublist", ActionKind::Hover)
        .locate("leaf", Selector::link_text("Sub Sub Item 1"))
        .click("leaf")
        .assert_page(Condition::UrlContains {
            pattern: "demoqa.com".to_string(),
        })
        .build()
}

/// Nested-frame form filling on chercher.tech: type in frame1, select in
/// frame2, toggle the checkbox in the frame nested inside frame1.
#[must_use]
pub fn nested_frames() -> Scenario {
    Scenario::builder("nested-frames")
        .description("drive inputs across sibling and nested frames")
        .navigate("https://chercher.tech/practice/frames-example-selenium-webdriver")
        .locate("frame1", Selector::css("iframe#frame1"))
        .enter_frame("frame1")
        .locate("name-input", Selector::css("body > input"))
        .act(
            "name-input",
            ActionKind::TypeText {
                text: "Hello".to_string(),
            },
        )
        .assert_that(
            "name-input",
            Condition::ValueEquals {
                expected: "Hello".to_string(),
            },
        )
        .top_frame()
        .locate("frame2", Selector::css("iframe#frame2"))
        .enter_frame("frame2")
        .locate("animals", Selector::tag("select"))
        .act(
            "animals",
            ActionKind::SelectOption {
                option: OptionTarget::VisibleText {
                    text: "Big Baby Cat".to_string(),
                },
            },
        )
        .top_frame()
        .locate("frame1-again", Selector::css("iframe#frame1"))
        .enter_frame("frame1-again")
        .locate("frame3", Selector::xpath("//iframe[@id='frame3']"))
        .enter_frame("frame3")
        .locate("check", Selector::xpath("//input[@type='checkbox']"))
        .click("check")
        .assert_that("check", Condition::Selected { expected: true })
        .top_frame()
        .build()
}

/// Currency switching on the tutorialsninja storefront: walk the configured
/// currency codes, re-locating the dropdown after every switch because the
/// site reloads the page.
#[must_use]
pub fn currency_switch(constants: &Constants) -> Scenario {
    const BUTTON: &str = ".btn-group > button.btn.btn-link.dropdown-toggle";

    let mut builder = Scenario::builder("currency-switch")
        .description("switch through each configured currency")
        .navigate("https://tutorialsninja.com/demo/");

    for (round, currency) in constants.currencies.iter().enumerate() {
        let button = format!("button-{round}");
        let option = format!("option-{currency}");
        builder = builder
            .locate(button.as_str(), Selector::css(BUTTON))
            .click(button.as_str())
            .locate(option.as_str(), Selector::name(currency.clone()))
            .click(option.as_str());
    }

    builder
        .assert_page(Condition::PageContains {
            needle: "$".to_string(),
        })
        .build()
}

/// Language switching on the ticketor demo: click through each configured
/// language link, reopening the selector after every switch.
#[must_use]
pub fn language_switch(constants: &Constants) -> Scenario {
    let mut builder = Scenario::builder("language-switch")
        .description("switch through each configured language")
        .navigate("https://www.ticketor.com/demo/foodanddrink");

    for (round, language) in constants.languages.iter().enumerate() {
        let button = format!("selector-{round}");
        let link = format!("lang-{language}");
        builder = builder
            .locate(button.as_str(), Selector::css(".language-selector"))
            .click(button.as_str())
            .locate(link.as_str(), Selector::link_text(language.clone()))
            .click(link.as_str());
    }

    builder
        .assert_page(Condition::UrlContains {
            pattern: "ticketor.com".to_string(),
        })
        .build()
}

/// The full built-in catalog in a stable order
#[must_use]
pub fn catalog(constants: &Constants) -> Vec<Scenario> {
    vec![
        checkboxes(),
        radio_buttons(),
        range_slider(),
        canvas_calculator(),
        hover_menu(),
        nested_frames(),
        currency_switch(constants),
        language_switch(constants),
    ]
}
