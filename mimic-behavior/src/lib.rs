//! Human-behavior simulation and rate governance.
//!
//! This crate decides *how* an action is physically executed on a page and
//! *whether* it is currently permitted. It never chooses what to do next,
//! never retries a failed page operation and never persists anything.
//!
//! - [`path::generate_path`]: cubic Bézier pointer trajectories
//! - [`pointer::PointerController`]: curved moves, overshoot, hover and click
//! - [`typing::TypingController`]: keystroke timing, typos and retype bursts
//! - [`scroll::ScrollController`]: eased scrolling with read pauses
//! - [`timing::TimingController`]: action pauses and the business-hours gate
//! - [`rate::RateGovernor`]: daily/hourly ceilings and post-action cooldown
//! - [`session::StealthSession`]: bundles the controllers and honours the
//!   `enable_*` switches of [`StealthConfig`](mimic_common::StealthConfig)
//!
//! All randomness flows through an injected [`random::RandomSource`] and all
//! waiting through a [`pacer::Pacer`] (an injected [`clock::Clock`] plus a
//! cancellation token), so sequences are reproducible and abortable under
//! test.
//!
//! ```
//! use mimic_behavior::path::{generate_path, Point};
//! use mimic_behavior::random::FixedSequence;
//!
//! let mut rng = FixedSequence::new(vec![0.25, 0.75]);
//! let path = generate_path(Point::new(0.0, 0.0), Point::new(300.0, 400.0), &mut rng);
//! assert_eq!(path.len(), 50);
//! assert_eq!(path.last(), Some(&Point::new(300.0, 400.0)));
//! ```
pub mod clock;
pub mod error;
pub mod pacer;
pub mod page;
pub mod path;
pub mod pointer;
pub mod random;
pub mod rate;
pub mod scroll;
pub mod session;
pub mod timing;
pub mod typing;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use error::{BehaviorError, Result};
pub use pacer::Pacer;
pub use page::{BoundingBox, Key, MouseButton, PageAutomation};
pub use path::Point;
pub use rate::{Action, RateGovernor, RateStats};
pub use session::StealthSession;
