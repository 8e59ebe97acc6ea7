//! Daily and hourly action ceilings with a post-action cooldown.
//!
//! Counters reset lazily: every query, record and stats read first checks
//! whether the local calendar date changed (daily counters) or an hour has
//! passed since the last hourly reset (search counter).

use crate::error::Result;
use crate::pacer::Pacer;
use chrono::{DateTime, Local, TimeDelta};
use mimic_common::RateLimitsConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Kinds of rate-limited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Connect,
    Message,
    Search,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Connect => "connect",
            Action::Message => "message",
            Action::Search => "search",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter snapshot returned by [`RateGovernor::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RateStats {
    pub daily_connections: u32,
    pub daily_messages: u32,
    pub hourly_searches: u32,
}

impl RateStats {
    pub fn to_map(&self) -> BTreeMap<&'static str, u32> {
        BTreeMap::from([
            ("daily_connections", self.daily_connections),
            ("daily_messages", self.daily_messages),
            ("hourly_searches", self.hourly_searches),
        ])
    }
}

#[derive(Debug, Clone)]
struct GovernorState {
    daily_connections: u32,
    daily_messages: u32,
    hourly_searches: u32,
    last_daily_reset: DateTime<Local>,
    last_hourly_reset: DateTime<Local>,
    last_action_at: DateTime<Local>,
}

impl GovernorState {
    fn starting_at(now: DateTime<Local>) -> Self {
        Self {
            daily_connections: 0,
            daily_messages: 0,
            hourly_searches: 0,
            last_daily_reset: now,
            last_hourly_reset: now,
            last_action_at: now,
        }
    }
}

/// Answers "may I do this now?" and keeps the counters behind the answer.
///
/// Owned by a single actor; nothing is persisted, so a fresh governor starts
/// from zero.
#[derive(Debug)]
pub struct RateGovernor {
    limits: RateLimitsConfig,
    state: GovernorState,
    pacer: Pacer,
}

impl RateGovernor {
    pub fn new(limits: &RateLimitsConfig, pacer: Pacer) -> Result<Self> {
        limits.validate()?;
        let now = pacer.clock().now();
        Ok(Self {
            limits: limits.clone(),
            state: GovernorState::starting_at(now),
            pacer,
        })
    }

    /// Whether one more `action` fits under its ceiling.
    pub fn can(&mut self, action: Action) -> bool {
        self.refresh();
        self.count(action) < self.limit(action)
    }

    /// Count an `action` that has just been performed.
    pub fn record(&mut self, action: Action) {
        self.refresh();
        let counter = match action {
            Action::Connect => &mut self.state.daily_connections,
            Action::Message => &mut self.state.daily_messages,
            Action::Search => &mut self.state.hourly_searches,
        };
        *counter += 1;
        let count = *counter;
        self.state.last_action_at = self.pacer.clock().now();
        info!(
            target: "behavior.rate",
            action = %action,
            count,
            limit = self.limit(action),
            "action recorded"
        );
    }

    pub fn can_connect(&mut self) -> bool {
        self.can(Action::Connect)
    }

    pub fn can_message(&mut self) -> bool {
        self.can(Action::Message)
    }

    pub fn can_search(&mut self) -> bool {
        self.can(Action::Search)
    }

    pub fn record_connect(&mut self) {
        self.record(Action::Connect)
    }

    pub fn record_message(&mut self) {
        self.record(Action::Message)
    }

    pub fn record_search(&mut self) {
        self.record(Action::Search)
    }

    /// Cooldown still owed since the last recorded action.
    pub fn remaining_cooldown(&self) -> Duration {
        let elapsed = (self.pacer.clock().now() - self.state.last_action_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        self.limits.cooldown_period.saturating_sub(elapsed)
    }

    /// Sleep out whatever is left of the cooldown.
    pub async fn await_cooldown(&self) -> Result<()> {
        let remaining = self.remaining_cooldown();
        if remaining.is_zero() {
            return Ok(());
        }
        info!(
            target: "behavior.rate",
            remaining_secs = remaining.as_secs(),
            "cooling down"
        );
        self.pacer.pause(remaining).await
    }

    pub fn stats(&mut self) -> RateStats {
        self.refresh();
        RateStats {
            daily_connections: self.state.daily_connections,
            daily_messages: self.state.daily_messages,
            hourly_searches: self.state.hourly_searches,
        }
    }

    fn count(&self, action: Action) -> u32 {
        match action {
            Action::Connect => self.state.daily_connections,
            Action::Message => self.state.daily_messages,
            Action::Search => self.state.hourly_searches,
        }
    }

    fn limit(&self, action: Action) -> u32 {
        match action {
            Action::Connect => self.limits.max_connections_per_day,
            Action::Message => self.limits.max_messages_per_day,
            Action::Search => self.limits.max_searches_per_hour,
        }
    }

    fn refresh(&mut self) {
        let now = self.pacer.clock().now();

        if now.date_naive() != self.state.last_daily_reset.date_naive() {
            info!(
                target: "behavior.rate",
                connections = self.state.daily_connections,
                messages = self.state.daily_messages,
                "daily counters reset"
            );
            self.state.daily_connections = 0;
            self.state.daily_messages = 0;
            self.state.last_daily_reset = now;
        }

        if now - self.state.last_hourly_reset >= TimeDelta::hours(1) {
            if self.state.hourly_searches > 0 {
                info!(
                    target: "behavior.rate",
                    searches = self.state.hourly_searches,
                    "hourly counter reset"
                );
            }
            self.state.hourly_searches = 0;
            self.state.last_hourly_reset = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BehaviorError;
    use crate::testing::manual_pacer;
    use chrono::TimeZone;

    fn governor(limits: RateLimitsConfig) -> (crate::clock::ManualClock, RateGovernor) {
        let (clock, pacer) = manual_pacer();
        (clock, RateGovernor::new(&limits, pacer).unwrap())
    }

    #[test]
    fn fresh_governor_permits_every_action_at_minimum_limits() {
        let (_clock, mut rate) = governor(RateLimitsConfig {
            max_connections_per_day: 1,
            max_messages_per_day: 1,
            max_searches_per_hour: 1,
            cooldown_period: Duration::ZERO,
        });
        assert!(rate.can(Action::Connect));
        assert!(rate.can(Action::Message));
        assert!(rate.can(Action::Search));
    }

    #[test]
    fn daily_connections_cap_then_reset_next_day() {
        let (clock, mut rate) = governor(RateLimitsConfig::default());

        for _ in 0..20 {
            assert!(rate.can_connect());
            rate.record_connect();
        }
        assert!(!rate.can_connect());
        assert_eq!(rate.stats().daily_connections, 20);

        clock.set(Local.with_ymd_and_hms(2024, 6, 13, 0, 5, 0).unwrap());
        assert!(rate.can_connect());
        assert_eq!(rate.stats().daily_connections, 0);
    }

    #[test]
    fn midnight_crossing_resets_even_minutes_apart() {
        let (clock, mut rate) = governor(RateLimitsConfig::default());
        clock.set(Local.with_ymd_and_hms(2024, 6, 12, 23, 58, 0).unwrap());
        rate.record_message();
        assert_eq!(rate.stats().daily_messages, 1);

        clock.set(Local.with_ymd_and_hms(2024, 6, 13, 0, 1, 0).unwrap());
        assert_eq!(rate.stats().daily_messages, 0);
    }

    #[test]
    fn same_day_of_month_in_a_later_month_still_resets() {
        let (clock, mut rate) = governor(RateLimitsConfig::default());
        rate.record_connect();
        clock.set(Local.with_ymd_and_hms(2024, 7, 12, 10, 0, 0).unwrap());
        assert_eq!(rate.stats().daily_connections, 0);
    }

    #[test]
    fn hourly_searches_cap_then_reset_after_an_hour() {
        let (clock, mut rate) = governor(RateLimitsConfig::default());

        for _ in 0..5 {
            assert!(rate.can_search());
            rate.record_search();
        }
        assert!(!rate.can_search());

        clock.advance(Duration::from_secs(59 * 60));
        assert!(!rate.can_search());

        clock.advance(Duration::from_secs(60));
        assert!(rate.can_search());
        assert_eq!(rate.stats().hourly_searches, 0);
    }

    #[test]
    fn counters_are_independent() {
        let limits = RateLimitsConfig {
            max_messages_per_day: 1,
            ..RateLimitsConfig::default()
        };
        let (_clock, mut rate) = governor(limits);
        rate.record(Action::Message);
        assert!(!rate.can(Action::Message));
        assert!(rate.can(Action::Connect));
        assert!(rate.can(Action::Search));
        assert_eq!(
            rate.stats(),
            RateStats {
                daily_connections: 0,
                daily_messages: 1,
                hourly_searches: 0
            }
        );
    }

    #[tokio::test]
    async fn cooldown_sleeps_only_the_remainder() {
        let (clock, mut rate) = governor(RateLimitsConfig::default());
        rate.record_connect();
        clock.advance(Duration::from_secs(10 * 60));

        assert_eq!(rate.remaining_cooldown(), Duration::from_secs(20 * 60));
        rate.await_cooldown().await.unwrap();
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(20 * 60)]);

        rate.await_cooldown().await.unwrap();
        assert_eq!(clock.sleeps().len(), 1);
    }

    #[tokio::test]
    async fn zero_cooldown_never_sleeps() {
        let limits = RateLimitsConfig {
            cooldown_period: Duration::ZERO,
            ..RateLimitsConfig::default()
        };
        let (clock, mut rate) = governor(limits);
        rate.record_search();
        rate.await_cooldown().await.unwrap();
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn cancelled_cooldown() {
        let (clock, pacer) = manual_pacer();
        let mut rate = RateGovernor::new(&RateLimitsConfig::default(), pacer.clone()).unwrap();
        rate.record_message();
        pacer.cancellation().cancel();
        assert!(matches!(
            rate.await_cooldown().await,
            Err(BehaviorError::Cancelled)
        ));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let (_clock, pacer) = manual_pacer();
        let limits = RateLimitsConfig {
            max_searches_per_hour: 0,
            ..RateLimitsConfig::default()
        };
        assert!(matches!(
            RateGovernor::new(&limits, pacer),
            Err(BehaviorError::Config(_))
        ));
    }

    #[test]
    fn stats_serialize_and_map() {
        let (_clock, mut rate) = governor(RateLimitsConfig::default());
        rate.record_connect();
        rate.record_search();
        let stats = rate.stats();

        let map = stats.to_map();
        assert_eq!(map["daily_connections"], 1);
        assert_eq!(map["daily_messages"], 0);
        assert_eq!(map["hourly_searches"], 1);

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["hourly_searches"], 1);
        assert_eq!(Action::Search.to_string(), "search");
    }
}
