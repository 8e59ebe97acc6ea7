//! Browser binding for the behavior layer.
//!
//! This crate launches a stealth-configured Chrome session over WebDriver
//! and exposes its pages through [`mimic_behavior::PageAutomation`], so the
//! humanized controllers can drive a real browser.
//!
//! - [`browser::driver::MimicDriver`]: WebDriver client wrapper
//! - [`browser::page::WebPage`]: navigation, element lookup and page primitives
//! - [`browser::stealth`]: launch arguments and JS evasions per stealth level
//! - [`browser::fingerprint::UserAgentManager`]: desktop user-agent pool
pub mod browser;
