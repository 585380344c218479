//! Session abstraction over a browser automation provider.
//!
//! The sequencer consumes browser automation through the [`Session`] trait
//! and never depends on a specific provider's wire protocol. The CDP-backed
//! implementation lives in [`crate::browser`] behind the `browser` feature;
//! [`MockSession`] is always available for unit testing.

use crate::result::{PasoError, PasoResult};
use crate::selector::Selector;
use crate::step::OptionTarget;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A reference to a located UI element.
///
/// Valid only for the lifetime of the page/frame context it was resolved
/// in: `serial` records the context serial at resolution time, and the
/// sequencer refuses to act on a handle whose serial no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Provider-assigned identifier
    pub id: String,
    /// Display form of the selector the handle was resolved from
    pub selector: String,
    /// Context serial current when the handle was resolved
    pub serial: u64,
}

impl ElementHandle {
    /// Create a new handle
    #[must_use]
    pub fn new(id: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selector: selector.into(),
            serial: 0,
        }
    }
}

/// The currently active navigation scope: the top document or a stack of
/// nested frames, each identified by the handle id of its iframe element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameContext {
    path: Vec<String>,
}

impl FrameContext {
    /// Top document scope
    #[must_use]
    pub fn top() -> Self {
        Self::default()
    }

    /// Whether the scope is the top document
    #[must_use]
    pub fn is_top(&self) -> bool {
        self.path.is_empty()
    }

    /// Push a nested frame
    pub fn enter(&mut self, frame_id: impl Into<String>) {
        self.path.push(frame_id.into());
    }

    /// Reset to the top document
    pub fn reset(&mut self) {
        self.path.clear();
    }

    /// Nesting depth (0 = top document)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Frame ids from outermost to innermost
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

/// Abstract browser automation capability set consumed by the sequencer.
///
/// Bounded waits live here: `wait_for` polls the provider until the
/// selector resolves or the timeout elapses, converting a pending wait into
/// `ElementNotFound` rather than blocking indefinitely. Implementations are
/// exclusively owned by one sequencer invocation at a time, hence
/// `&mut self` throughout.
#[async_trait]
pub trait Session: Send {
    /// Navigate to a URL, replacing the frame scope with the new top
    /// document
    async fn navigate(&mut self, url: &str) -> PasoResult<()>;

    /// Resolve a selector within the active frame scope, polling up to
    /// `timeout`
    async fn wait_for(&mut self, selector: &Selector, timeout: Duration)
        -> PasoResult<ElementHandle>;

    /// Click an element
    async fn click(&mut self, el: &ElementHandle) -> PasoResult<()>;

    /// Type text into an element
    async fn type_text(&mut self, el: &ElementHandle, text: &str) -> PasoResult<()>;

    /// Focus an element, then send one keystroke per character
    async fn press_keys(&mut self, el: &ElementHandle, keys: &str) -> PasoResult<()>;

    /// Move the pointer over an element
    async fn hover(&mut self, el: &ElementHandle) -> PasoResult<()>;

    /// Press on an element and drag by a pixel offset
    async fn drag_by(&mut self, el: &ElementHandle, dx: i64, dy: i64) -> PasoResult<()>;

    /// Choose an option of a `<select>` element
    async fn select_option(&mut self, el: &ElementHandle, option: &OptionTarget)
        -> PasoResult<()>;

    /// Element selected state
    async fn is_selected(&mut self, el: &ElementHandle) -> PasoResult<bool>;

    /// Element enabled state
    async fn is_enabled(&mut self, el: &ElementHandle) -> PasoResult<bool>;

    /// Element visibility
    async fn is_visible(&mut self, el: &ElementHandle) -> PasoResult<bool>;

    /// Element text content
    async fn text_of(&mut self, el: &ElementHandle) -> PasoResult<String>;

    /// Form element value
    async fn value_of(&mut self, el: &ElementHandle) -> PasoResult<String>;

    /// Current page URL
    async fn current_url(&mut self) -> PasoResult<String>;

    /// Whether the page source contains a substring
    async fn page_contains(&mut self, needle: &str) -> PasoResult<bool>;

    /// Enter the frame owned by a located iframe element
    async fn enter_frame(&mut self, el: &ElementHandle) -> PasoResult<()>;

    /// Return to the top document
    async fn top_frame(&mut self) -> PasoResult<()>;

    /// Release the underlying browser session; called exactly once
    async fn close(&mut self) -> PasoResult<()>;
}

/// Scripted element state backing [`MockSession`]
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Selected state (checkboxes, radios, options)
    pub selected: bool,
    /// Enabled state
    pub enabled: bool,
    /// Visibility
    pub visible: bool,
    /// Text content
    pub text: String,
    /// Form value
    pub value: String,
    /// Click flips `selected` (checkbox semantics)
    pub toggles: bool,
    /// Click sets `selected` without flipping (radio semantics)
    pub selectable: bool,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            selected: false,
            enabled: true,
            visible: true,
            text: String::new(),
            value: String::new(),
            toggles: false,
            selectable: false,
        }
    }
}

impl MockElement {
    /// A checkbox with the given initial state
    #[must_use]
    pub fn checkbox(selected: bool) -> Self {
        Self {
            selected,
            toggles: true,
            ..Self::default()
        }
    }

    /// An unselected radio button
    #[must_use]
    pub fn radio() -> Self {
        Self {
            selectable: true,
            ..Self::default()
        }
    }

    /// A generic element with text content
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Mark hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// In-memory session for unit testing: scripted elements keyed by frame
/// scope and selector, plus a call history for verifying which primitives
/// ran.
#[derive(Debug, Default)]
pub struct MockSession {
    elements: HashMap<String, MockElement>,
    handles: HashMap<String, String>,
    frame: Vec<String>,
    url: String,
    page_source: String,
    call_history: Vec<String>,
    closed: bool,
    next_id: u64,
}

impl MockSession {
    /// Create an empty mock session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn element_key(frame: &[String], selector: &str) -> String {
        if frame.is_empty() {
            selector.to_string()
        } else {
            format!("{}::{selector}", frame.join("/"))
        }
    }

    /// Register an element in the top document
    pub fn add_element(&mut self, selector: &Selector, element: MockElement) {
        self.elements.insert(selector.to_string(), element);
    }

    /// Register an element inside a frame path (outermost first, frame
    /// element selector display strings)
    pub fn add_frame_element(&mut self, frame: &[&str], selector: &Selector, element: MockElement) {
        let frame: Vec<String> = frame.iter().map(|s| (*s).to_string()).collect();
        self.elements
            .insert(Self::element_key(&frame, &selector.to_string()), element);
    }

    /// Set the scripted page source
    pub fn set_page_source(&mut self, source: impl Into<String>) {
        self.page_source = source.into();
    }

    /// Inspect a top-document element's current state
    #[must_use]
    pub fn element(&self, selector: &Selector) -> Option<&MockElement> {
        self.elements.get(&selector.to_string())
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if a primitive was invoked
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Whether `close` ran
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn resolve(&self, el: &ElementHandle) -> PasoResult<String> {
        self.handles
            .get(&el.id)
            .cloned()
            .ok_or_else(|| PasoError::ElementNotInteractable {
                selector: el.selector.clone(),
                reason: "detached from document".to_string(),
            })
    }

    fn interactable(&self, el: &ElementHandle) -> PasoResult<String> {
        let key = self.resolve(el)?;
        let element = self
            .elements
            .get(&key)
            .ok_or_else(|| PasoError::ElementNotInteractable {
                selector: el.selector.clone(),
                reason: "detached from document".to_string(),
            })?;
        if !element.visible {
            return Err(PasoError::ElementNotInteractable {
                selector: el.selector.clone(),
                reason: "hidden".to_string(),
            });
        }
        if !element.enabled {
            return Err(PasoError::ElementNotInteractable {
                selector: el.selector.clone(),
                reason: "disabled".to_string(),
            });
        }
        Ok(key)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn navigate(&mut self, url: &str) -> PasoResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        self.url = url.to_string();
        self.frame.clear();
        Ok(())
    }

    async fn wait_for(
        &mut self,
        selector: &Selector,
        timeout: Duration,
    ) -> PasoResult<ElementHandle> {
        let display = selector.to_string();
        self.call_history.push(format!("wait_for:{display}"));
        let key = Self::element_key(&self.frame, &display);
        if !self.elements.contains_key(&key) {
            return Err(PasoError::ElementNotFound {
                selector: display,
                waited_ms: timeout.as_millis() as u64,
            });
        }
        self.next_id += 1;
        let id = format!("mock-{}", self.next_id);
        self.handles.insert(id.clone(), key);
        Ok(ElementHandle::new(id, display))
    }

    async fn click(&mut self, el: &ElementHandle) -> PasoResult<()> {
        self.call_history.push(format!("click:{}", el.selector));
        let key = self.interactable(el)?;
        if let Some(element) = self.elements.get_mut(&key) {
            if element.toggles {
                element.selected = !element.selected;
            } else if element.selectable {
                element.selected = true;
            }
        }
        Ok(())
    }

    async fn type_text(&mut self, el: &ElementHandle, text: &str) -> PasoResult<()> {
        self.call_history
            .push(format!("type_text:{}:{text}", el.selector));
        let key = self.interactable(el)?;
        if let Some(element) = self.elements.get_mut(&key) {
            element.value.push_str(text);
        }
        Ok(())
    }

    async fn press_keys(&mut self, el: &ElementHandle, keys: &str) -> PasoResult<()> {
        self.call_history
            .push(format!("press_keys:{}:{keys}", el.selector));
        self.interactable(el)?;
        Ok(())
    }

    async fn hover(&mut self, el: &ElementHandle) -> PasoResult<()> {
        self.call_history.push(format!("hover:{}", el.selector));
        self.interactable(el)?;
        Ok(())
    }

    async fn drag_by(&mut self, el: &ElementHandle, dx: i64, dy: i64) -> PasoResult<()> {
        self.call_history
            .push(format!("drag_by:{}:{dx},{dy}", el.selector));
        self.interactable(el)?;
        Ok(())
    }

    async fn select_option(
        &mut self,
        el: &ElementHandle,
        option: &OptionTarget,
    ) -> PasoResult<()> {
        let rendered = match option {
            OptionTarget::VisibleText { text } => text.clone(),
            OptionTarget::Value { value } => value.clone(),
        };
        self.call_history
            .push(format!("select_option:{}:{rendered}", el.selector));
        let key = self.interactable(el)?;
        if let Some(element) = self.elements.get_mut(&key) {
            element.value = rendered;
        }
        Ok(())
    }

    async fn is_selected(&mut self, el: &ElementHandle) -> PasoResult<bool> {
        let key = self.resolve(el)?;
        Ok(self.elements.get(&key).is_some_and(|e| e.selected))
    }

    async fn is_enabled(&mut self, el: &ElementHandle) -> PasoResult<bool> {
        let key = self.resolve(el)?;
        Ok(self.elements.get(&key).is_some_and(|e| e.enabled))
    }

    async fn is_visible(&mut self, el: &ElementHandle) -> PasoResult<bool> {
        let key = self.resolve(el)?;
        Ok(self.elements.get(&key).is_some_and(|e| e.visible))
    }

    async fn text_of(&mut self, el: &ElementHandle) -> PasoResult<String> {
        let key = self.resolve(el)?;
        Ok(self
            .elements
            .get(&key)
            .map(|e| e.text.clone())
            .unwrap_or_default())
    }

    async fn value_of(&mut self, el: &ElementHandle) -> PasoResult<String> {
        let key = self.resolve(el)?;
        Ok(self
            .elements
            .get(&key)
            .map(|e| e.value.clone())
            .unwrap_or_default())
    }

    async fn current_url(&mut self) -> PasoResult<String> {
        Ok(self.url.clone())
    }

    async fn page_contains(&mut self, needle: &str) -> PasoResult<bool> {
        Ok(self.page_source.contains(needle))
    }

    async fn enter_frame(&mut self, el: &ElementHandle) -> PasoResult<()> {
        self.call_history
            .push(format!("enter_frame:{}", el.selector));
        self.resolve(el)?;
        self.frame.push(el.selector.clone());
        Ok(())
    }

    async fn top_frame(&mut self) -> PasoResult<()> {
        self.call_history.push("top_frame".to_string());
        self.frame.clear();
        Ok(())
    }

    async fn close(&mut self) -> PasoResult<()> {
        self.call_history.push("close".to_string());
        self.closed = true;
        Ok(())
    }
}
