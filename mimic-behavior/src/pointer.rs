use crate::error::{InteractionExt, Result};
use crate::pacer::Pacer;
use crate::page::{BoundingBox, MouseButton, PageAutomation};
use crate::path::{generate_path, Point};
use crate::random::RandomSource;
use mimic_common::StealthConfig;
use std::sync::Arc;
use tracing::debug;

const OVERSHOOT_PROBABILITY: f64 = 0.3;
const OVERSHOOT_RADIUS: f64 = 10.0;

/// Drives the pointer along curved paths with per-step jitter and the
/// occasional overshoot-and-correct.
///
/// The controller remembers where it last put the pointer; before the first
/// move it assumes a random spot near the top-left corner.
pub struct PointerController<P: PageAutomation> {
    page: Arc<P>,
    rng: Box<dyn RandomSource>,
    pacer: Pacer,
    position: Option<Point>,
}

impl<P: PageAutomation> PointerController<P> {
    pub fn new(
        page: Arc<P>,
        config: &StealthConfig,
        pacer: Pacer,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            page,
            rng,
            pacer,
            position: None,
        })
    }

    /// Last position the pointer was moved to, if any.
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Move to `target` along a Bézier path.
    pub async fn move_to(&mut self, target: Point) -> Result<()> {
        let start = match self.position {
            Some(p) => p,
            None => Point::new(self.rng.below(100) as f64, self.rng.below(100) as f64),
        };
        let path = generate_path(start, target, self.rng.as_mut());

        for point in &path {
            self.step(*point).await?;
            let jitter = self.rng.millis(5, 10);
            self.pacer.pause(jitter).await?;
        }

        let overshoot = self.rng.chance(OVERSHOOT_PROBABILITY);
        if overshoot {
            let past = Point::new(
                target.x + self.rng.uniform(-OVERSHOOT_RADIUS, OVERSHOOT_RADIUS),
                target.y + self.rng.uniform(-OVERSHOOT_RADIUS, OVERSHOOT_RADIUS),
            );
            self.step(past).await?;
            let settle = self.rng.millis(50, 100);
            self.pacer.pause(settle).await?;
            self.step(target).await?;
        }

        debug!(
            target: "behavior.pointer",
            steps = path.len(),
            overshoot,
            x = target.x,
            y = target.y,
            "pointer moved"
        );
        Ok(())
    }

    /// Rest the pointer on a random point inside `bounds`.
    pub async fn hover(&mut self, bounds: BoundingBox) -> Result<()> {
        let point = bounds.random_point(self.rng.as_mut());
        self.move_to(point).await?;
        let dwell = self.rng.millis(500, 1500);
        self.pacer.pause(dwell).await
    }

    /// Hover, hesitate, then click.
    pub async fn click(&mut self, bounds: BoundingBox) -> Result<()> {
        self.hover(bounds).await?;
        self.think_then_press().await
    }

    /// Move straight onto the element without the hover dwell, hesitate, then click.
    pub async fn click_without_hover(&mut self, bounds: BoundingBox) -> Result<()> {
        let point = bounds.random_point(self.rng.as_mut());
        self.move_to(point).await?;
        self.think_then_press().await
    }

    /// Drift to a random point of the current viewport.
    pub async fn wander(&mut self) -> Result<()> {
        let (width, height) = self.page.viewport_size().await.during("read viewport")?;
        let target = Point::new(
            self.rng.below(width.max(1.0) as u64) as f64,
            self.rng.below(height.max(1.0) as u64) as f64,
        );
        self.move_to(target).await
    }

    async fn think_then_press(&mut self) -> Result<()> {
        let think = self.rng.millis(200, 800);
        self.pacer.pause(think).await?;
        self.pacer.checkpoint()?;
        self.page
            .click(MouseButton::Left, 1)
            .await
            .during("click")
    }

    async fn step(&mut self, point: Point) -> Result<()> {
        self.pacer.checkpoint()?;
        self.page
            .move_pointer(point.x, point.y)
            .await
            .during("move pointer")?;
        self.position = Some(point);
        Ok(())
    }
}
