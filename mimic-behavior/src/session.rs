use crate::error::{InteractionExt, Result};
use crate::pacer::Pacer;
use crate::page::{BoundingBox, MouseButton, PageAutomation};
use crate::pointer::PointerController;
use crate::random::{self, RandomSource};
use crate::scroll::ScrollController;
use crate::timing::TimingController;
use crate::typing::TypingController;
use mimic_common::StealthConfig;
use std::sync::Arc;
use tracing::debug;

/// One pointer, typing, scroll and timing controller over a shared page,
/// switched by the `enable_*` flags of [`StealthConfig`].
///
/// With a flag off the session still performs the action, just without the
/// humanizing layer: a disabled mouse clicks the element centre directly,
/// disabled typing inputs the whole string at once, and disabled scrolling
/// makes [`StealthSession::browse`] a no-op.
pub struct StealthSession<P: PageAutomation> {
    page: Arc<P>,
    config: StealthConfig,
    pacer: Pacer,
    pointer: PointerController<P>,
    typing: TypingController<P>,
    scroll: ScrollController<P>,
    timing: TimingController,
}

impl<P: PageAutomation> StealthSession<P> {
    /// Session whose controllers each own an entropy-seeded generator.
    pub fn new(page: Arc<P>, config: &StealthConfig, pacer: Pacer) -> Result<Self> {
        Self::with_sources(page, config, pacer, random::entropy)
    }

    /// Session whose controllers draw from sources built by `make_rng`,
    /// called once per controller.
    pub fn with_sources<F>(
        page: Arc<P>,
        config: &StealthConfig,
        pacer: Pacer,
        mut make_rng: F,
    ) -> Result<Self>
    where
        F: FnMut() -> Box<dyn RandomSource>,
    {
        config.validate()?;
        Ok(Self {
            pointer: PointerController::new(page.clone(), config, pacer.clone(), make_rng())?,
            typing: TypingController::new(page.clone(), config, pacer.clone(), make_rng())?,
            scroll: ScrollController::new(page.clone(), config, pacer.clone(), make_rng())?,
            timing: TimingController::new(config, pacer.clone(), make_rng())?,
            page,
            config: config.clone(),
            pacer,
        })
    }

    pub fn config(&self) -> &StealthConfig {
        &self.config
    }

    pub fn page(&self) -> &Arc<P> {
        &self.page
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Click somewhere inside `bounds`.
    pub async fn click(&mut self, bounds: BoundingBox) -> Result<()> {
        match (
            self.config.enable_mouse_movement,
            self.config.enable_hovering,
        ) {
            (true, true) => self.pointer.click(bounds).await,
            (true, false) => self.pointer.click_without_hover(bounds).await,
            (false, _) => {
                let centre = bounds.center();
                debug!(target: "behavior.session", x = centre.x, y = centre.y, "direct click");
                self.pacer.checkpoint()?;
                self.page
                    .move_pointer(centre.x, centre.y)
                    .await
                    .during("move pointer")?;
                self.pacer.checkpoint()?;
                self.page
                    .click(MouseButton::Left, 1)
                    .await
                    .during("click")
            }
        }
    }

    /// Look up the element's bounds, then [`click`](Self::click) it.
    pub async fn click_element(&mut self, element: &P::Element) -> Result<()> {
        self.pacer.checkpoint()?;
        let bounds = self
            .page
            .element_bounds(element)
            .await
            .during("read element bounds")?;
        self.click(bounds).await
    }

    /// Enter `text` into `element`.
    pub async fn type_into(&mut self, element: &P::Element, text: &str) -> Result<()> {
        if self.config.enable_typing_simulation {
            return self.typing.type_text(element, text).await;
        }
        self.pacer.checkpoint()?;
        self.page.focus(element).await.during("focus")?;
        self.pacer.checkpoint()?;
        self.page.input_text(text).await.during("input text")
    }

    /// Read through the current page by scrolling.
    pub async fn browse(&mut self) -> Result<()> {
        if !self.config.enable_random_scrolling {
            debug!(target: "behavior.session", "random scrolling disabled");
            return Ok(());
        }
        self.scroll.scroll_naturally().await
    }

    pub fn pointer(&mut self) -> &mut PointerController<P> {
        &mut self.pointer
    }

    pub fn typing(&mut self) -> &mut TypingController<P> {
        &mut self.typing
    }

    pub fn scroll(&mut self) -> &mut ScrollController<P> {
        &mut self.scroll
    }

    pub fn timing(&mut self) -> &mut TimingController {
        &mut self.timing
    }
}
