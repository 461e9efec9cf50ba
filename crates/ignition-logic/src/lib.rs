//! Pure game logic for Core Ignition.
//!
//! This crate contains every rule of the habit reactor that is independent
//! of storage, timers or any presentation layer. Functions take plain data,
//! an explicit `now` and, where randomness is involved, an injected
//! [`rand::Rng`], so the whole rule set is unit-testable and deterministic
//! under a seeded generator.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`artifacts`] | Category → buff mapping, buff magnitudes, milestone detection |
//! | [`clock`] | Hour arithmetic and calendar-day bucketing in a fixed offset |
//! | [`constants`] | Tuning constants: base energy, decay, thresholds, grace windows |
//! | [`demo`] | Demo collection used for first runs and the simulation harness |
//! | [`edge_cases`] | Idle awakening, overdrive burnout, flux pattern detection |
//! | [`events`] | Weighted asteroid event roller |
//! | [`gamification`] | Energy gain, decay integration, capacity, shields, streak breaks |
//! | [`merge`] | Local/remote habit reconciliation (history union, max streak) |
//! | [`model`] | Domain records: habits, artifacts, reactor, quests, events, settings |
//! | [`oracle`] | Fourteen-day completion trend analysis |
//! | [`quests`] | Emergency quest catalog, generation and progress |
//! | [`reactor`] | Canonical reactor transition (stability, critical, overdrive) |
//! | [`visual`] | Derived cosmetic state for renderers |

pub mod artifacts;
pub mod clock;
pub mod constants;
pub mod demo;
pub mod edge_cases;
pub mod events;
pub mod gamification;
pub mod merge;
pub mod model;
pub mod oracle;
pub mod quests;
pub mod reactor;
pub mod visual;
