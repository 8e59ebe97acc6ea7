use crate::error::Result;
use crate::pacer::Pacer;
use crate::random::RandomSource;
use chrono::Timelike;
use mimic_common::StealthConfig;
use std::time::Duration;
use tracing::{debug, info};

const MAX_READING_MS: f64 = 10_000.0;
const CHARS_PER_WORD: usize = 5;

/// Pauses between actions and the business-hours gate.
pub struct TimingController {
    config: StealthConfig,
    rng: Box<dyn RandomSource>,
    pacer: Pacer,
}

impl TimingController {
    pub fn new(config: &StealthConfig, pacer: Pacer, rng: Box<dyn RandomSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            rng,
            pacer,
        })
    }

    /// Wait a uniform time in `[min_action_delay, max_action_delay)`.
    pub async fn random_delay(&mut self) -> Result<Duration> {
        let min = self.config.min_action_delay;
        let max = self.config.max_action_delay;
        let delay = if max <= min {
            min
        } else {
            let span = (max - min).as_millis() as u64;
            min + Duration::from_millis(self.rng.below(span))
        };
        self.pacer.pause(delay).await?;
        Ok(delay)
    }

    /// One to four seconds of apparent deliberation.
    pub async fn thinking_delay(&mut self) -> Result<Duration> {
        let delay = self.rng.millis(1000, 3000);
        self.pacer.pause(delay).await?;
        Ok(delay)
    }

    /// Wait roughly as long as reading `content_len` characters takes.
    pub async fn reading_delay(&mut self, content_len: usize) -> Result<Duration> {
        let delay = reading_time(self.rng.as_mut(), content_len);
        debug!(target: "behavior.timing", content_len, delay_ms = delay.as_millis() as u64, "reading");
        self.pacer.pause(delay).await?;
        Ok(delay)
    }

    /// Whether the local hour falls inside the configured window. Always true
    /// when the gate is off.
    pub fn is_business_hours(&self) -> bool {
        if !self.config.business_hours_only {
            return true;
        }
        let hour = self.pacer.clock().now().hour();
        self.config.business_hours_start <= hour && hour < self.config.business_hours_end
    }

    /// Sleep in whole hours until the window opens; returns the total wait.
    pub async fn await_business_hours(&mut self) -> Result<Duration> {
        let mut waited = Duration::ZERO;
        while !self.is_business_hours() {
            let hour = self.pacer.clock().now().hour();
            let start = self.config.business_hours_start;
            let hours = if hour < start {
                start - hour
            } else {
                24 - hour + start
            };
            info!(target: "behavior.timing", hour, wait_hours = hours, "outside business hours, waiting");
            let wait = Duration::from_secs(u64::from(hours) * 3600);
            self.pacer.pause(wait).await?;
            waited += wait;
        }
        Ok(waited)
    }
}

/// Reading time for `content_len` characters: about five characters per
/// word at 240–300 ms a word, scaled by ±30% and capped at ten seconds.
pub fn reading_time(rng: &mut dyn RandomSource, content_len: usize) -> Duration {
    let words = (content_len / CHARS_PER_WORD) as u64;
    let per_word = 240 + rng.below(60);
    let base = words as f64 * per_word as f64;
    let variance = rng.uniform(0.7, 1.3);
    Duration::from_millis((base * variance).min(MAX_READING_MS).round() as u64)
}
