use crate::error::{InteractionExt, Result};
use crate::pacer::Pacer;
use crate::page::{BoundingBox, PageAutomation};
use crate::random::RandomSource;
use mimic_common::StealthConfig;
use std::sync::Arc;
use tracing::debug;

const SCROLL_BACK_PROBABILITY: f64 = 0.2;

/// Vertical scrolling with an ease-out glide, reading pauses and the
/// occasional glance back up the page.
pub struct ScrollController<P: PageAutomation> {
    page: Arc<P>,
    rng: Box<dyn RandomSource>,
    pacer: Pacer,
}

impl<P: PageAutomation> ScrollController<P> {
    pub fn new(
        page: Arc<P>,
        config: &StealthConfig,
        pacer: Pacer,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { page, rng, pacer })
    }

    /// Read down the page in 3 to 9 viewport-sized chunks.
    pub async fn scroll_naturally(&mut self) -> Result<()> {
        let document = self.page.document_height().await.during("read document height")?;
        let (_, viewport) = self.page.viewport_size().await.during("read viewport")?;
        let viewport = viewport as i64;
        let max_offset = (document - viewport).max(0);

        let actions = 3 + self.rng.below(7);
        let mut glances = 0u32;
        for _ in 0..actions {
            let before = self.current_offset().await?;
            let distance = viewport / 2 + self.rng.below((viewport / 2).max(0) as u64) as i64;
            let target = (before + distance).min(max_offset).max(0);
            self.smooth_scroll_to(target).await?;

            let read = self.rng.millis(1000, 3000);
            self.pacer.pause(read).await?;

            if self.rng.chance(SCROLL_BACK_PROBABILITY) {
                let back = (before - self.rng.below(200) as i64).max(0);
                self.smooth_scroll_to(back).await?;
                let pause = self.rng.millis(500, 1000);
                self.pacer.pause(pause).await?;
                glances += 1;
            }
        }

        debug!(target: "behavior.scroll", actions, glances, max_offset, "scrolled page");
        Ok(())
    }

    /// Glide from the current offset to `target` with an ease-out curve.
    /// The last step lands exactly on `target`.
    pub async fn smooth_scroll_to(&mut self, target: i64) -> Result<()> {
        let start = self.current_offset().await?;
        let delta = (target - start) as f64;
        let steps = 20 + self.rng.below(10);

        for i in 0..=steps {
            let progress = i as f64 / steps as f64;
            let eased = 1.0 - (1.0 - progress).powi(2);
            let offset = start + (delta * eased).round() as i64;
            self.pacer.checkpoint()?;
            self.page
                .set_scroll_offset(offset)
                .await
                .during("set scroll offset")?;
            let tick = self.rng.millis(10, 20);
            self.pacer.pause(tick).await?;
        }
        Ok(())
    }

    /// Bring an element near the top of the viewport, leaving 100–200px of
    /// headroom above it.
    pub async fn scroll_into_view(&mut self, bounds: BoundingBox) -> Result<()> {
        let offset = self.current_offset().await?;
        let top = offset + bounds.y.round() as i64;
        let target = (top - 100 - self.rng.below(100) as i64).max(0);
        self.smooth_scroll_to(target).await?;
        let settle = self.rng.millis(300, 500);
        self.pacer.pause(settle).await
    }

    async fn current_offset(&self) -> Result<i64> {
        self.pacer.checkpoint()?;
        self.page.scroll_offset().await.during("read scroll offset")
    }
}
