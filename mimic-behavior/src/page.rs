//! The page-automation capability consumed by every controller.
//!
//! Any browser binding can drive the behavior layer by implementing
//! [`PageAutomation`]; `mimic-drivers` provides one over WebDriver.

use crate::random::RandomSource;
use crate::path::Point;
use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Element bounds in viewport coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Uniformly random point inside the box.
    pub fn random_point(&self, rng: &mut dyn RandomSource) -> Point {
        Point::new(
            self.x + self.width * rng.next_unit(),
            self.y + self.height * rng.next_unit(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Non-printable keys the controllers press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Key {
    Backspace,
}

/// Primitive page operations. Implementations should not retry or delay;
/// pacing belongs to the controllers.
#[async_trait]
pub trait PageAutomation: Send + Sync {
    /// Handle to a DOM element owned by the binding.
    type Element: Send + Sync;

    async fn move_pointer(&self, x: f64, y: f64) -> anyhow::Result<()>;

    /// Press and release `button` `count` times at the current pointer position.
    async fn click(&self, button: MouseButton, count: u32) -> anyhow::Result<()>;

    async fn press_key(&self, key: Key) -> anyhow::Result<()>;

    /// Type `text` into whatever currently has focus.
    async fn input_text(&self, text: &str) -> anyhow::Result<()>;

    async fn focus(&self, element: &Self::Element) -> anyhow::Result<()>;

    /// Select the element's existing content so the next keystroke replaces it.
    async fn select_all(&self, element: &Self::Element) -> anyhow::Result<()>;

    /// Run a script in the page and return its JSON result.
    async fn evaluate(&self, script: &str) -> anyhow::Result<serde_json::Value>;

    async fn element_bounds(&self, element: &Self::Element) -> anyhow::Result<BoundingBox>;

    /// Viewport `(width, height)` in CSS pixels.
    async fn viewport_size(&self) -> anyhow::Result<(f64, f64)>;

    /// Vertical scroll offset of the document.
    async fn scroll_offset(&self) -> anyhow::Result<i64>;

    async fn set_scroll_offset(&self, offset: i64) -> anyhow::Result<()>;

    /// Full scrollable height of the document.
    async fn document_height(&self) -> anyhow::Result<i64> {
        let value = self.evaluate("return document.body.scrollHeight;").await?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|h| h.round() as i64))
            .ok_or_else(|| anyhow!("document height is not a number: {value}"))
    }
}
