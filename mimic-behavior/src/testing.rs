//! In-memory page double for exercising controllers without a browser.
//!
//! Available in test builds and with the `test-helpers` feature.

use crate::clock::ManualClock;
use crate::page::{BoundingBox, Key, MouseButton, PageAutomation};
use crate::pacer::Pacer;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// One primitive call observed by [`RecordingPage`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageCall {
    MovePointer { x: f64, y: f64 },
    Click { button: MouseButton, count: u32 },
    PressKey(Key),
    InputText(String),
    Focus(String),
    SelectAll(String),
    Evaluate(String),
    SetScrollOffset(i64),
}

/// Element handle understood by [`RecordingPage`].
#[derive(Debug, Clone, PartialEq)]
pub struct FakeElement {
    pub name: String,
    pub bounds: BoundingBox,
}

impl FakeElement {
    pub fn new(name: &str, bounds: BoundingBox) -> Self {
        Self {
            name: name.to_string(),
            bounds,
        }
    }
}

#[derive(Debug)]
struct PageState {
    calls: Vec<PageCall>,
    scroll_offset: i64,
    viewport: (f64, f64),
    document_height: i64,
    fail_at: Option<usize>,
}

/// Records every primitive and keeps a scroll offset.
///
/// Failure injection: [`RecordingPage::fail_at_call`] makes the n-th
/// primitive (0-based, counting all recorded calls) return an error instead of
/// being recorded.
#[derive(Debug)]
pub struct RecordingPage {
    state: Mutex<PageState>,
}

impl Default for RecordingPage {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPage {
    /// 1280×800 viewport over a 4000px document, scrolled to the top.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PageState {
                calls: Vec::new(),
                scroll_offset: 0,
                viewport: (1280.0, 800.0),
                document_height: 4000,
                fail_at: None,
            }),
        }
    }

    pub fn with_viewport(self, width: f64, height: f64) -> Self {
        self.lock().viewport = (width, height);
        self
    }

    pub fn with_document_height(self, height: i64) -> Self {
        self.lock().document_height = height;
        self
    }

    pub fn with_scroll_offset(self, offset: i64) -> Self {
        self.lock().scroll_offset = offset;
        self
    }

    pub fn fail_at_call(self, index: usize) -> Self {
        self.lock().fail_at = Some(index);
        self
    }

    pub fn calls(&self) -> Vec<PageCall> {
        self.lock().calls.clone()
    }

    pub fn current_scroll(&self) -> i64 {
        self.lock().scroll_offset
    }

    /// Text left in the focused field after replaying inputs and backspaces.
    /// A `SelectAll` followed by a backspace clears the field.
    pub fn typed_text(&self) -> String {
        let mut text = String::new();
        let mut selected = false;
        for call in self.lock().calls.iter() {
            match call {
                PageCall::InputText(s) => {
                    if selected {
                        text.clear();
                        selected = false;
                    }
                    text.push_str(s);
                }
                PageCall::PressKey(Key::Backspace) => {
                    if selected {
                        text.clear();
                        selected = false;
                    } else {
                        text.pop();
                    }
                }
                PageCall::SelectAll(_) => selected = true,
                _ => {}
            }
        }
        text
    }

    /// Every string passed to `input_text`, in order.
    pub fn inputs(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PageCall::InputText(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pointer_moves(&self) -> Vec<(f64, f64)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PageCall::MovePointer { x, y } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    pub fn scroll_positions(&self) -> Vec<i64> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PageCall::SetScrollOffset(y) => Some(*y),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: PageCall) -> anyhow::Result<()> {
        let mut state = self.lock();
        if state.fail_at == Some(state.calls.len()) {
            state.fail_at = None;
            return Err(anyhow!("injected failure on {call:?}"));
        }
        if let PageCall::SetScrollOffset(y) = call {
            state.scroll_offset = y;
        }
        state.calls.push(call);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state
            .lock()
            .expect("RecordingPage mutex poisoned - a test thread panicked while holding the lock")
    }
}

#[async_trait]
impl PageAutomation for RecordingPage {
    type Element = FakeElement;

    async fn move_pointer(&self, x: f64, y: f64) -> anyhow::Result<()> {
        self.record(PageCall::MovePointer { x, y })
    }

    async fn click(&self, button: MouseButton, count: u32) -> anyhow::Result<()> {
        self.record(PageCall::Click { button, count })
    }

    async fn press_key(&self, key: Key) -> anyhow::Result<()> {
        self.record(PageCall::PressKey(key))
    }

    async fn input_text(&self, text: &str) -> anyhow::Result<()> {
        self.record(PageCall::InputText(text.to_string()))
    }

    async fn focus(&self, element: &FakeElement) -> anyhow::Result<()> {
        self.record(PageCall::Focus(element.name.clone()))
    }

    async fn select_all(&self, element: &FakeElement) -> anyhow::Result<()> {
        self.record(PageCall::SelectAll(element.name.clone()))
    }

    async fn evaluate(&self, script: &str) -> anyhow::Result<serde_json::Value> {
        self.record(PageCall::Evaluate(script.to_string()))?;
        Ok(serde_json::Value::Null)
    }

    async fn element_bounds(&self, element: &FakeElement) -> anyhow::Result<BoundingBox> {
        Ok(element.bounds)
    }

    async fn viewport_size(&self) -> anyhow::Result<(f64, f64)> {
        Ok(self.lock().viewport)
    }

    async fn scroll_offset(&self) -> anyhow::Result<i64> {
        Ok(self.lock().scroll_offset)
    }

    async fn set_scroll_offset(&self, offset: i64) -> anyhow::Result<()> {
        self.record(PageCall::SetScrollOffset(offset))
    }

    async fn document_height(&self) -> anyhow::Result<i64> {
        Ok(self.lock().document_height)
    }
}

/// A manual clock at 10:00 local time on a weekday, and a pacer over it.
pub fn manual_pacer() -> (ManualClock, Pacer) {
    let start = Local
        .with_ymd_and_hms(2024, 6, 12, 10, 0, 0)
        .single()
        .expect("unambiguous local time");
    let clock = ManualClock::new(start);
    let pacer = Pacer::new(Arc::new(clock.clone()), CancellationToken::new());
    (clock, pacer)
}
