//! Real browser sessions over the Chrome DevTools Protocol.
//!
//! When compiled with the `browser` feature this module provides
//! [`CdpSession`], a [`Session`](crate::session::Session) implementation
//! backed by chromiumoxide. Element lookups are evaluated as JavaScript in
//! the active frame's document; located elements are tagged with a marker
//! attribute so later actions can re-resolve them and detect detachment.
//! Pointer input is synthesized from CDP mouse events so it lands at page
//! coordinates, which keeps clicks working inside nested frames.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Marker attribute used to re-resolve located elements
pub const HANDLE_ATTR: &str = "data-paso-id";

/// Browser launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Poll interval for bounded element waits
    pub poll_interval: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 900,
            chromium_path: None,
            sandbox: true,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// JavaScript expression resolving the active frame's document.
///
/// `frames` holds the marker ids of entered iframe elements, outermost
/// first; each hop goes through the iframe's `contentDocument`, which works
/// for the same-origin frames the catalog drives.
#[must_use]
pub fn frame_document_expr(frames: &[String]) -> String {
    let mut expr = String::from("document");
    for id in frames {
        expr = format!("{expr}.querySelector('[{HANDLE_ATTR}=\"{id}\"]').contentDocument");
    }
    expr
}

#[cfg(feature = "browser")]
mod cdp {
    use super::{frame_document_expr, BrowserConfig, HANDLE_ATTR};
    use crate::result::{PasoError, PasoResult};
    use crate::selector::Selector;
    use crate::session::{ElementHandle, Session};
    use crate::step::OptionTarget;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, InsertTextParams, MouseButton,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use serde::Deserialize;
    use std::time::{Duration, Instant};
    use tracing::debug;

    /// Geometry and interactability probe for a resolved element
    #[derive(Debug, Deserialize)]
    struct ElementProbe {
        x: f64,
        y: f64,
        visible: bool,
        disabled: bool,
    }

    /// A CDP-backed browser session.
    ///
    /// Exclusively owned by one sequencer invocation; `close` shuts the
    /// browser down and must be called exactly once (the harness does).
    pub struct CdpSession {
        browser: CdpBrowser,
        page: CdpPage,
        handler: tokio::task::JoinHandle<()>,
        frames: Vec<String>,
        next_id: u64,
        poll_interval: Duration,
    }

    impl std::fmt::Debug for CdpSession {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("CdpSession")
                .field("frames", &self.frames)
                .finish_non_exhaustive()
        }
    }

    impl CdpSession {
        /// Launch a browser and open a blank page
        pub async fn launch(config: BrowserConfig) -> PasoResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(|e| PasoError::SessionUnavailable {
                message: e.to_string(),
            })?;

            let (browser, mut events) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| PasoError::SessionUnavailable {
                        message: e.to_string(),
                    })?;

            let handler = tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser.new_page("about:blank").await.map_err(|e| {
                PasoError::SessionUnavailable {
                    message: e.to_string(),
                }
            })?;

            Ok(Self {
                browser,
                page,
                handler,
                frames: Vec::new(),
                next_id: 0,
                poll_interval: config.poll_interval,
            })
        }

        fn doc_expr(&self) -> String {
            frame_document_expr(&self.frames)
        }

        fn element_expr(&self, el: &ElementHandle) -> String {
            format!(
                "{}.querySelector('[{HANDLE_ATTR}=\"{}\"]')",
                self.doc_expr(),
                el.id
            )
        }

        async fn eval<T: DeserializeOwned>(&self, script: &str) -> PasoResult<T> {
            let result =
                self.page
                    .evaluate(script)
                    .await
                    .map_err(|e| PasoError::SessionUnavailable {
                        message: e.to_string(),
                    })?;
            result
                .into_value()
                .map_err(|e| PasoError::SessionUnavailable {
                    message: e.to_string(),
                })
        }

        /// Re-resolve a handle and probe its page-global geometry
        async fn probe(&self, el: &ElementHandle) -> PasoResult<ElementProbe> {
            let script = format!(
                r#"(() => {{
                    const el = {element};
                    if (!el) return null;
                    const r = el.getBoundingClientRect();
                    let x = r.x + r.width / 2, y = r.y + r.height / 2;
                    let win = el.ownerDocument.defaultView;
                    while (win && win.frameElement) {{
                        const fr = win.frameElement.getBoundingClientRect();
                        x += fr.x; y += fr.y;
                        win = win.parent;
                    }}
                    return {{
                        x, y,
                        visible: r.width > 0 && r.height > 0,
                        disabled: !!el.disabled
                    }};
                }})()"#,
                element = self.element_expr(el)
            );
            let probe: Option<ElementProbe> = self.eval(&script).await?;
            probe.ok_or_else(|| PasoError::ElementNotInteractable {
                selector: el.selector.clone(),
                reason: "detached from document".to_string(),
            })
        }

        /// Probe and refuse hidden/disabled elements
        async fn interactable(&self, el: &ElementHandle) -> PasoResult<ElementProbe> {
            let probe = self.probe(el).await?;
            if !probe.visible {
                return Err(PasoError::ElementNotInteractable {
                    selector: el.selector.clone(),
                    reason: "hidden".to_string(),
                });
            }
            if probe.disabled {
                return Err(PasoError::ElementNotInteractable {
                    selector: el.selector.clone(),
                    reason: "disabled".to_string(),
                });
            }
            Ok(probe)
        }

        async fn dispatch_mouse(
            &self,
            kind: DispatchMouseEventType,
            x: f64,
            y: f64,
            pressed: bool,
        ) -> PasoResult<()> {
            let mut builder = DispatchMouseEventParams::builder()
                .r#type(kind)
                .x(x)
                .y(y);
            if pressed {
                builder = builder.button(MouseButton::Left).click_count(1);
            }
            let params = builder.build().map_err(|e| PasoError::SessionUnavailable {
                message: e.to_string(),
            })?;
            self.page
                .execute(params)
                .await
                .map_err(|e| PasoError::SessionUnavailable {
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn focus(&self, el: &ElementHandle) -> PasoResult<()> {
            let script = format!(
                "(() => {{ const el = {}; if (!el) return false; el.focus(); return true; }})()",
                self.element_expr(el)
            );
            let focused: bool = self.eval(&script).await?;
            if focused {
                Ok(())
            } else {
                Err(PasoError::ElementNotInteractable {
                    selector: el.selector.clone(),
                    reason: "detached from document".to_string(),
                })
            }
        }
    }

    #[async_trait]
    impl Session for CdpSession {
        async fn navigate(&mut self, url: &str) -> PasoResult<()> {
            debug!(url, "navigating");
            self.page
                .goto(url)
                .await
                .map_err(|e| PasoError::SessionUnavailable {
                    message: format!("navigation to {url} failed: {e}"),
                })?;
            self.frames.clear();
            Ok(())
        }

        async fn wait_for(
            &mut self,
            selector: &Selector,
            timeout: Duration,
        ) -> PasoResult<ElementHandle> {
            self.next_id += 1;
            let id = format!("paso-{}", self.next_id);
            let script = format!(
                r#"(() => {{
                    const doc = {doc};
                    if (!doc) return false;
                    const el = {lookup};
                    if (!el) return false;
                    el.setAttribute('{HANDLE_ATTR}', '{id}');
                    return true;
                }})()"#,
                doc = self.doc_expr(),
                lookup = selector.js_lookup_expr(),
            );

            let started = Instant::now();
            loop {
                let found: bool = self.eval(&script).await?;
                if found {
                    return Ok(ElementHandle::new(id, selector.to_string()));
                }
                if started.elapsed() >= timeout {
                    return Err(PasoError::ElementNotFound {
                        selector: selector.to_string(),
                        waited_ms: started.elapsed().as_millis() as u64,
                    });
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        async fn click(&mut self, el: &ElementHandle) -> PasoResult<()> {
            let probe = self.interactable(el).await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, probe.x, probe.y, false)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MousePressed, probe.x, probe.y, true)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseReleased, probe.x, probe.y, true)
                .await
        }

        async fn type_text(&mut self, el: &ElementHandle, text: &str) -> PasoResult<()> {
            self.interactable(el).await?;
            self.focus(el).await?;
            let params = InsertTextParams::builder().text(text).build().map_err(|e| {
                PasoError::SessionUnavailable {
                    message: e.to_string(),
                }
            })?;
            self.page
                .execute(params)
                .await
                .map_err(|e| PasoError::SessionUnavailable {
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn press_keys(&mut self, el: &ElementHandle, keys: &str) -> PasoResult<()> {
            self.interactable(el).await?;
            self.focus(el).await?;
            for ch in keys.chars() {
                let params = DispatchKeyEventParams::builder()
                    .r#type(DispatchKeyEventType::Char)
                    .text(ch.to_string())
                    .build()
                    .map_err(|e| PasoError::SessionUnavailable {
                        message: e.to_string(),
                    })?;
                self.page
                    .execute(params)
                    .await
                    .map_err(|e| PasoError::SessionUnavailable {
                        message: e.to_string(),
                    })?;
            }
            Ok(())
        }

        async fn hover(&mut self, el: &ElementHandle) -> PasoResult<()> {
            let probe = self.interactable(el).await?;
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, probe.x, probe.y, false)
                .await
        }

        async fn drag_by(&mut self, el: &ElementHandle, dx: i64, dy: i64) -> PasoResult<()> {
            let probe = self.interactable(el).await?;
            let (tx, ty) = (probe.x + dx as f64, probe.y + dy as f64);
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, probe.x, probe.y, false)
                .await?;
            self.dispatch_mouse(DispatchMouseEventType::MousePressed, probe.x, probe.y, true)
                .await?;
            // a few interpolated moves so sliders track the pointer
            let steps = 5;
            for i in 1..=steps {
                let t = f64::from(i) / f64::from(steps);
                let x = probe.x + (tx - probe.x) * t;
                let y = probe.y + (ty - probe.y) * t;
                self.dispatch_mouse(DispatchMouseEventType::MouseMoved, x, y, true)
                    .await?;
            }
            self.dispatch_mouse(DispatchMouseEventType::MouseReleased, tx, ty, true)
                .await
        }

        async fn select_option(
            &mut self,
            el: &ElementHandle,
            option: &OptionTarget,
        ) -> PasoResult<()> {
            self.interactable(el).await?;
            let matcher = match option {
                OptionTarget::VisibleText { text } => format!(
                    "o.text.trim() === {}",
                    serde_json::to_string(text).unwrap_or_default()
                ),
                OptionTarget::Value { value } => format!(
                    "o.value === {}",
                    serde_json::to_string(value).unwrap_or_default()
                ),
            };
            let script = format!(
                r#"(() => {{
                    const el = {element};
                    if (!el) return 'detached';
                    const target = Array.from(el.options || []).find(o => {matcher});
                    if (!target) return 'missing';
                    el.value = target.value;
                    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return 'ok';
                }})()"#,
                element = self.element_expr(el),
            );
            let status: String = self.eval(&script).await?;
            match status.as_str() {
                "ok" => Ok(()),
                "missing" => Err(PasoError::ElementNotInteractable {
                    selector: el.selector.clone(),
                    reason: "no matching option".to_string(),
                }),
                _ => Err(PasoError::ElementNotInteractable {
                    selector: el.selector.clone(),
                    reason: "detached from document".to_string(),
                }),
            }
        }

        async fn is_selected(&mut self, el: &ElementHandle) -> PasoResult<bool> {
            let script = format!(
                "(() => {{ const el = {}; return el ? !!(el.checked || el.selected) : null; }})()",
                self.element_expr(el)
            );
            let state: Option<bool> = self.eval(&script).await?;
            state.ok_or_else(|| PasoError::stale(el.selector.clone()))
        }

        async fn is_enabled(&mut self, el: &ElementHandle) -> PasoResult<bool> {
            let script = format!(
                "(() => {{ const el = {}; return el ? !el.disabled : null; }})()",
                self.element_expr(el)
            );
            let state: Option<bool> = self.eval(&script).await?;
            state.ok_or_else(|| PasoError::stale(el.selector.clone()))
        }

        async fn is_visible(&mut self, el: &ElementHandle) -> PasoResult<bool> {
            Ok(self.probe(el).await?.visible)
        }

        async fn text_of(&mut self, el: &ElementHandle) -> PasoResult<String> {
            let script = format!(
                "(() => {{ const el = {}; return el ? (el.textContent || '') : null; }})()",
                self.element_expr(el)
            );
            let text: Option<String> = self.eval(&script).await?;
            text.ok_or_else(|| PasoError::stale(el.selector.clone()))
        }

        async fn value_of(&mut self, el: &ElementHandle) -> PasoResult<String> {
            let script = format!(
                "(() => {{ const el = {}; return el ? String(el.value ?? '') : null; }})()",
                self.element_expr(el)
            );
            let value: Option<String> = self.eval(&script).await?;
            value.ok_or_else(|| PasoError::stale(el.selector.clone()))
        }

        async fn current_url(&mut self) -> PasoResult<String> {
            let url = self
                .page
                .url()
                .await
                .map_err(|e| PasoError::SessionUnavailable {
                    message: e.to_string(),
                })?;
            Ok(url.unwrap_or_default())
        }

        async fn page_contains(&mut self, needle: &str) -> PasoResult<bool> {
            let source =
                self.page
                    .content()
                    .await
                    .map_err(|e| PasoError::SessionUnavailable {
                        message: e.to_string(),
                    })?;
            Ok(source.contains(needle))
        }

        async fn enter_frame(&mut self, el: &ElementHandle) -> PasoResult<()> {
            let script = format!(
                "(() => {{ const el = {}; return el ? el.tagName.toLowerCase() : null; }})()",
                self.element_expr(el)
            );
            let tag: Option<String> = self.eval(&script).await?;
            match tag.as_deref() {
                Some("iframe" | "frame") => {
                    self.frames.push(el.id.clone());
                    Ok(())
                }
                Some(other) => Err(PasoError::ElementNotInteractable {
                    selector: el.selector.clone(),
                    reason: format!("not a frame element (<{other}>)"),
                }),
                None => Err(PasoError::stale(el.selector.clone())),
            }
        }

        async fn top_frame(&mut self) -> PasoResult<()> {
            self.frames.clear();
            Ok(())
        }

        async fn close(&mut self) -> PasoResult<()> {
            self.browser
                .close()
                .await
                .map_err(|e| PasoError::SessionUnavailable {
                    message: e.to_string(),
                })?;
            self.handler.abort();
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::CdpSession;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert!(config.sandbox);
        assert_eq!(config.viewport_width, 1280);
    }

    #[test]
    fn test_config_builder() {
        let config = BrowserConfig::default()
            .with_headless(false)
            .with_viewport(1004, 724)
            .with_chromium_path("/usr/bin/chromium")
            .with_no_sandbox();

        assert!(!config.headless);
        assert_eq!(config.viewport_width, 1004);
        assert_eq!(config.viewport_height, 724);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        assert!(!config.sandbox);
    }

    #[test]
    fn test_top_document_expr() {
        assert_eq!(frame_document_expr(&[]), "document");
    }

    #[test]
    fn test_nested_frame_expr_chains_content_documents() {
        let frames = vec!["paso-1".to_string(), "paso-7".to_string()];
        let expr = frame_document_expr(&frames);
        assert_eq!(
            expr,
            "document.querySelector('[data-paso-id=\"paso-1\"]').contentDocument\
             .querySelector('[data-paso-id=\"paso-7\"]').contentDocument"
        );
    }
}
