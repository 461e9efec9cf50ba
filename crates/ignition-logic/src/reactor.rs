//! Canonical reactor transition.
//!
//! Every change to `current_energy` or `max_capacity` goes through
//! [`ReactorState::set_energy`] / [`ReactorState::set_capacity`], which
//! clamp the energy and recompute stability, critical and overdrive in one
//! step. Nothing else writes those fields.

use chrono::{DateTime, Utc};

use crate::constants::thresholds;
use crate::model::{HibernationCause, ReactorState};

/// Derived reactor flags for a given energy level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactorReadout {
    pub stability: f64,
    pub is_critical: bool,
    pub is_overdrive: bool,
}

/// Stability, critical and overdrive for `energy` out of `max_capacity`.
///
/// Stability is clamped to [0, 1]; a non-positive capacity reads as empty.
pub fn recompute_reactor(energy: f64, max_capacity: f64) -> ReactorReadout {
    let stability = if max_capacity <= 0.0 || !energy.is_finite() {
        0.0
    } else {
        (energy / max_capacity).clamp(0.0, 1.0)
    };
    ReactorReadout {
        stability,
        is_critical: stability < thresholds::CRITICAL,
        is_overdrive: stability > thresholds::OVERDRIVE,
    }
}

impl ReactorState {
    /// Set energy and capacity together, clamping energy into [0, capacity].
    pub fn set_energy(&mut self, energy: f64, max_capacity: f64) {
        let max_capacity = max_capacity.max(0.0);
        let energy = if energy.is_finite() { energy } else { 0.0 };
        self.max_capacity = max_capacity;
        self.current_energy = energy.clamp(0.0, max_capacity);
        self.apply_readout();
    }

    /// Change capacity, keeping the current energy where it fits.
    pub fn set_capacity(&mut self, max_capacity: f64) {
        self.set_energy(self.current_energy, max_capacity);
    }

    /// Add (or with a negative delta, remove) energy under the current capacity.
    pub fn add_energy(&mut self, delta: f64) {
        self.set_energy(self.current_energy + delta, self.max_capacity);
    }

    /// Clear the critical flag for this transition only. The next
    /// recompute reads the thresholds again.
    pub fn override_critical(&mut self) {
        self.is_critical = false;
    }

    pub fn readout(&self) -> ReactorReadout {
        recompute_reactor(self.current_energy, self.max_capacity)
    }

    fn apply_readout(&mut self) {
        let readout = recompute_reactor(self.current_energy, self.max_capacity);
        self.stability = readout.stability;
        self.is_critical = readout.is_critical;
        self.is_overdrive = readout.is_overdrive;
    }

    pub fn hibernate(&mut self, cause: HibernationCause) {
        self.is_hibernating = true;
        self.hibernation_cause = Some(cause);
    }

    /// Leave hibernation and re-anchor decay so the frozen period never
    /// decays retroactively.
    pub fn wake(&mut self, now: DateTime<Utc>) {
        self.is_hibernating = false;
        self.hibernation_cause = None;
        if now > self.last_decay_update {
            self.last_decay_update = now;
        }
    }

    /// Repair a reactor read from storage: recompute derived flags under
    /// `max_capacity` and move an unset or future decay anchor to `now`.
    pub fn normalize(&mut self, max_capacity: f64, now: DateTime<Utc>) {
        if self.last_decay_update == DateTime::<Utc>::default() || self.last_decay_update > now {
            self.last_decay_update = now;
        }
        if self.is_hibernating && self.hibernation_cause.is_none() {
            self.hibernation_cause = Some(HibernationCause::Manual);
        }
        if !self.is_hibernating {
            self.hibernation_cause = None;
        }
        self.set_capacity(max_capacity);
    }
}
