use crate::browser::{fingerprint::UserAgentProfile, stealth::StealthScripts};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fantoccini::actions::{
    InputSource, KeyAction, KeyActions, MouseActions, PointerAction, MOUSE_BUTTON_LEFT, MOUSE_BUTTON_MIDDLE,
    MOUSE_BUTTON_RIGHT,
};
use fantoccini::elements::Element;
use fantoccini::key::Key as WebKey;
use fantoccini::{Client, Locator};
use mimic_behavior::{BoundingBox, Key, MouseButton, PageAutomation};
use mimic_common::StealthLevel;
use serde_json::{json, Value};
use std::sync::OnceLock;
use tracing::debug;

const POINTER_ID: &str = "mimic-pointer";
const KEYBOARD_ID: &str = "mimic-keyboard";

const RECT_SCRIPT: &str = r#"
    const r = arguments[0].getBoundingClientRect();
    return [r.left, r.top, r.width, r.height];
"#;

const SELECT_ALL_SCRIPT: &str = r#"
    const el = arguments[0];
    el.focus();
    if (typeof el.select === 'function') {
        el.select();
    } else {
        const range = document.createRange();
        range.selectNodeContents(el);
        const selection = window.getSelection();
        selection.removeAllRanges();
        selection.addRange(range);
    }
"#;

/// One navigated tab of a [`MimicDriver`](super::driver::MimicDriver)
/// session.
///
/// Implements [`PageAutomation`]: pointer and keyboard go through the W3C
/// actions API, geometry and scrolling through injected scripts.
///
/// Pointer targets are clamped to the viewport, which WebDriver requires
/// for viewport-origin moves. The viewport is read once per navigation.
pub struct WebPage {
    pub(crate) client: Client,
    pub(crate) stealth_level: StealthLevel,
    pub(crate) profile: UserAgentProfile,
    viewport: OnceLock<(f64, f64)>,
}

impl WebPage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(client: Client, stealth_level: StealthLevel, profile: UserAgentProfile) -> Self {
        Self {
            client,
            stealth_level,
            profile,
            viewport: OnceLock::new(),
        }
    }

    /// Navigate to `url` and apply stealth scripts.
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        self.client.goto(url).await?;
        self.viewport = OnceLock::new();
        self.apply_stealth().await?;
        debug!(target: "browser.page", %url, "navigated");
        Ok(())
    }

    async fn apply_stealth(&self) -> Result<()> {
        for script in StealthScripts::for_level(self.stealth_level, &self.profile) {
            self.client.execute(&script, vec![]).await?;
        }
        Ok(())
    }

    /// Return the full page HTML source.
    pub async fn content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    /// Return the page title.
    pub async fn title(&self) -> Result<String> {
        self.client.title().await.map_err(anyhow::Error::from)
    }

    /// Return the current page URL.
    pub async fn url(&self) -> Result<String> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(anyhow::Error::from)
    }

    /// Wait for and return the first element matching a CSS selector.
    pub async fn find_element(&self, selector: &str) -> Result<Element> {
        self.client
            .wait()
            .for_element(Locator::Css(selector))
            .await
            .map_err(anyhow::Error::from)
    }

    /// Find zero or more elements by CSS selector.
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<Element>> {
        self.client
            .find_all(Locator::Css(selector))
            .await
            .map_err(anyhow::Error::from)
    }

    /// Length of the visible text of the page body, for reading delays.
    pub async fn text_length(&self) -> Result<usize> {
        let value = self
            .client
            .execute("return document.body ? document.body.innerText.length : 0;", vec![])
            .await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn run_on(&self, script: &str, element: &Element) -> Result<Value> {
        let arg = serde_json::to_value(element)?;
        Ok(self.client.execute(script, vec![arg]).await?)
    }

    async fn cached_viewport(&self) -> Result<(f64, f64)> {
        if let Some(size) = self.viewport.get() {
            return Ok(*size);
        }
        let size = self.viewport_size().await?;
        Ok(*self.viewport.get_or_init(|| size))
    }

    async fn key_tap(&self, value: char) -> Result<()> {
        let actions = KeyActions::new(KEYBOARD_ID.to_string())
            .then(KeyAction::Down { value })
            .then(KeyAction::Up { value });
        self.client.perform_actions(actions).await?;
        Ok(())
    }
}

#[async_trait]
impl PageAutomation for WebPage {
    type Element = Element;

    async fn move_pointer(&self, x: f64, y: f64) -> Result<()> {
        let (x, y) = clamp_to_viewport(x, y, self.cached_viewport().await?);
        let actions = MouseActions::new(POINTER_ID.to_string()).then(PointerAction::MoveTo {
            duration: None,
            x: x as _,
            y: y as _,
        });
        self.client.perform_actions(actions).await?;
        Ok(())
    }

    async fn click(&self, button: MouseButton, count: u32) -> Result<()> {
        let button = button_code(button);
        let mut actions = MouseActions::new(POINTER_ID.to_string());
        for _ in 0..count {
            actions = actions
                .then(PointerAction::Down { button })
                .then(PointerAction::Up { button });
        }
        self.client.perform_actions(actions).await?;
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        let value: char = match key {
            Key::Backspace => WebKey::Backspace.into(),
            other => return Err(anyhow!("unsupported key {other:?}")),
        };
        self.key_tap(value).await
    }

    async fn input_text(&self, text: &str) -> Result<()> {
        let mut actions = KeyActions::new(KEYBOARD_ID.to_string());
        for value in text.chars() {
            actions = actions
                .then(KeyAction::Down { value })
                .then(KeyAction::Up { value });
        }
        self.client.perform_actions(actions).await?;
        Ok(())
    }

    async fn focus(&self, element: &Element) -> Result<()> {
        self.run_on("arguments[0].focus();", element).await?;
        Ok(())
    }

    async fn select_all(&self, element: &Element) -> Result<()> {
        self.run_on(SELECT_ALL_SCRIPT, element).await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        Ok(self.client.execute(script, vec![]).await?)
    }

    async fn element_bounds(&self, element: &Element) -> Result<BoundingBox> {
        let value = self.run_on(RECT_SCRIPT, element).await?;
        parse_rect(&value)
    }

    async fn viewport_size(&self) -> Result<(f64, f64)> {
        let value = self
            .evaluate("return [window.innerWidth, window.innerHeight];")
            .await?;
        match numbers(&value)?.as_slice() {
            [w, h] => Ok((*w, *h)),
            _ => Err(anyhow!("unexpected viewport value: {value}")),
        }
    }

    async fn scroll_offset(&self) -> Result<i64> {
        let value = self.evaluate("return window.pageYOffset;").await?;
        value
            .as_f64()
            .map(|y| y.round() as i64)
            .ok_or_else(|| anyhow!("scroll offset is not a number: {value}"))
    }

    async fn set_scroll_offset(&self, offset: i64) -> Result<()> {
        self.client
            .execute("window.scrollTo(0, arguments[0]);", vec![json!(offset)])
            .await?;
        Ok(())
    }
}

fn button_code(button: MouseButton) -> u64 {
    match button {
        MouseButton::Left => MOUSE_BUTTON_LEFT,
        MouseButton::Middle => MOUSE_BUTTON_MIDDLE,
        MouseButton::Right => MOUSE_BUTTON_RIGHT,
    }
}

/// Round a pointer target into `[0, width - 1] × [0, height - 1]`.
fn clamp_to_viewport(x: f64, y: f64, (width, height): (f64, f64)) -> (i64, i64) {
    let max_x = (width.floor() as i64 - 1).max(0);
    let max_y = (height.floor() as i64 - 1).max(0);
    (
        (x.round() as i64).clamp(0, max_x),
        (y.round() as i64).clamp(0, max_y),
    )
}

fn numbers(value: &Value) -> Result<Vec<f64>> {
    value
        .as_array()
        .ok_or_else(|| anyhow!("expected an array, got {value}"))?
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| anyhow!("non-numeric entry in {value}")))
        .collect()
}

/// `[left, top, width, height]` from `getBoundingClientRect`.
fn parse_rect(value: &Value) -> Result<BoundingBox> {
    match numbers(value)?.as_slice() {
        [x, y, width, height] => Ok(BoundingBox::new(*x, *y, *width, *height)),
        _ => Err(anyhow!("unexpected rect value: {value}")),
    }
}
