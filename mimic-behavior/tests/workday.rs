mod common;

use async_trait::async_trait;
use chrono::{Local, TimeZone, Timelike};
use mimic_behavior::clock::{Clock, ManualClock};
use mimic_behavior::random::seeded;
use mimic_behavior::testing::{FakeElement, PageCall, RecordingPage};
use mimic_behavior::{
    BehaviorError, BoundingBox, Key, MouseButton, Pacer, PageAutomation, Point, RateGovernor,
    StealthSession,
};
use mimic_common::{RateLimitsConfig, StealthConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn clock_at(day: u32, hour: u32, minute: u32) -> ManualClock {
    ManualClock::new(
        Local
            .with_ymd_and_hms(2024, 6, day, hour, minute, 0)
            .single()
            .unwrap(),
    )
}

fn session_over(
    page: Arc<RecordingPage>,
    pacer: Pacer,
    first_seed: u64,
) -> StealthSession<RecordingPage> {
    let mut seed = first_seed;
    StealthSession::with_sources(page, &StealthConfig::default(), pacer, || {
        seed += 1;
        seeded(seed)
    })
    .unwrap()
}

#[tokio::test]
async fn a_governed_outreach_day() {
    common::init_test_tracing();

    let clock = clock_at(12, 7, 0);
    let pacer = Pacer::new(Arc::new(clock.clone()), CancellationToken::new());
    let page = Arc::new(RecordingPage::new());
    let mut session = session_over(page.clone(), pacer.clone(), 100);
    let mut governor = RateGovernor::new(&RateLimitsConfig::default(), pacer.clone()).unwrap();

    let waited = session.timing().await_business_hours().await.unwrap();
    assert_eq!(waited, Duration::from_secs(2 * 3600));
    assert_eq!(clock.now().hour(), 9);

    let connect = FakeElement::new("connect", BoundingBox::new(900.0, 220.0, 96.0, 32.0));
    let note = FakeElement::new("note", BoundingBox::new(300.0, 400.0, 480.0, 120.0));

    let mut sent = 0;
    while governor.can_connect() {
        session.click_element(&connect).await.unwrap();
        session.type_into(&note, "Hi there").await.unwrap();
        governor.record_connect();
        sent += 1;
        governor.await_cooldown().await.unwrap();
    }

    assert_eq!(sent, 20);
    assert_eq!(governor.stats().daily_connections, 20);
    let cooldowns = clock
        .sleeps()
        .iter()
        .filter(|d| **d == Duration::from_secs(30 * 60))
        .count();
    assert_eq!(cooldowns, 20);
    let clicks = page
        .calls()
        .iter()
        .filter(|c| matches!(c, PageCall::Click { button: MouseButton::Left, count: 1 }))
        .count();
    assert_eq!(clicks, 20);

    clock.set(Local.with_ymd_and_hms(2024, 6, 13, 9, 0, 0).single().unwrap());
    assert!(governor.can_connect());
    assert_eq!(governor.stats().daily_connections, 0);
}

#[tokio::test]
async fn same_seeds_replay_the_same_interaction() {
    async fn run() -> Vec<PageCall> {
        let clock = clock_at(12, 10, 0);
        let pacer = Pacer::new(Arc::new(clock), CancellationToken::new());
        let page = Arc::new(RecordingPage::new().with_document_height(6000));
        let mut session = session_over(page.clone(), pacer, 7);
        let field = FakeElement::new("q", BoundingBox::new(10.0, 10.0, 200.0, 30.0));

        session.browse().await.unwrap();
        session.click(BoundingBox::new(50.0, 60.0, 40.0, 20.0)).await.unwrap();
        session.type_into(&field, "senior rust engineer").await.unwrap();
        page.calls()
    }

    assert_eq!(run().await, run().await);
}

#[tokio::test]
async fn typing_and_scrolling_share_one_page() {
    let clock = clock_at(12, 11, 0);
    let pacer = Pacer::new(Arc::new(clock.clone()), CancellationToken::new());
    let page = Arc::new(RecordingPage::new().with_document_height(5000));
    let mut session = session_over(page.clone(), pacer, 40);
    let field = FakeElement::new("body", BoundingBox::new(0.0, 1200.0, 600.0, 200.0));

    session.scroll().scroll_into_view(field.bounds).await.unwrap();
    let offset = page.current_scroll();
    assert!((1001..=1100).contains(&offset));

    session
        .typing()
        .type_with_backspace_bursts(&field, "looking forward to chatting")
        .await
        .unwrap();
    assert_eq!(page.typed_text(), "looking forward to chatting");
    assert!(clock.total_slept() > Duration::from_secs(2));
}

/// Wraps a [`RecordingPage`] and fires the token once `limit` pointer moves
/// have gone through.
struct CancelAfterMoves {
    inner: RecordingPage,
    moves: AtomicUsize,
    limit: usize,
    token: CancellationToken,
}

#[async_trait]
impl PageAutomation for CancelAfterMoves {
    type Element = FakeElement;

    async fn move_pointer(&self, x: f64, y: f64) -> anyhow::Result<()> {
        self.inner.move_pointer(x, y).await?;
        if self.moves.fetch_add(1, Ordering::SeqCst) + 1 == self.limit {
            self.token.cancel();
        }
        Ok(())
    }

    async fn click(&self, button: MouseButton, count: u32) -> anyhow::Result<()> {
        self.inner.click(button, count).await
    }

    async fn press_key(&self, key: Key) -> anyhow::Result<()> {
        self.inner.press_key(key).await
    }

    async fn input_text(&self, text: &str) -> anyhow::Result<()> {
        self.inner.input_text(text).await
    }

    async fn focus(&self, element: &FakeElement) -> anyhow::Result<()> {
        self.inner.focus(element).await
    }

    async fn select_all(&self, element: &FakeElement) -> anyhow::Result<()> {
        self.inner.select_all(element).await
    }

    async fn evaluate(&self, script: &str) -> anyhow::Result<serde_json::Value> {
        self.inner.evaluate(script).await
    }

    async fn element_bounds(&self, element: &FakeElement) -> anyhow::Result<BoundingBox> {
        self.inner.element_bounds(element).await
    }

    async fn viewport_size(&self) -> anyhow::Result<(f64, f64)> {
        self.inner.viewport_size().await
    }

    async fn scroll_offset(&self) -> anyhow::Result<i64> {
        self.inner.scroll_offset().await
    }

    async fn set_scroll_offset(&self, offset: i64) -> anyhow::Result<()> {
        self.inner.set_scroll_offset(offset).await
    }

    async fn document_height(&self) -> anyhow::Result<i64> {
        self.inner.document_height().await
    }
}

#[tokio::test]
async fn cancellation_mid_path_keeps_completed_steps_only() {
    let token = CancellationToken::new();
    let clock = clock_at(12, 10, 0);
    let pacer = Pacer::new(Arc::new(clock.clone()), token.clone());
    let page = Arc::new(CancelAfterMoves {
        inner: RecordingPage::new(),
        moves: AtomicUsize::new(0),
        limit: 5,
        token,
    });
    let mut session = StealthSession::with_sources(
        page.clone(),
        &StealthConfig::default(),
        pacer,
        || seeded(3),
    )
    .unwrap();

    let err = session
        .pointer()
        .move_to(Point::new(1200.0, 700.0))
        .await
        .unwrap_err();

    assert!(matches!(err, BehaviorError::Cancelled));
    assert_eq!(page.inner.pointer_moves().len(), 5);
    assert_eq!(clock.sleeps().len(), 4);
}
