//! Tuning constants for the reactor economy.
//!
//! Grouped by concern the same way the rest of the crate is split. Values
//! here are gameplay rules, not deployment settings; runtime knobs live in
//! the store's `EngineConfig`.

/// Energy and reactor capacity.
pub mod energy {
    /// Base energy granted per habit completion before multipliers.
    pub const ENERGY_PER_HABIT: f64 = 10.0;
    /// Reactor capacity with no capacity buffs.
    pub const BASE_MAX_CAPACITY: f64 = 1000.0;
    /// Energy a fresh reactor starts with.
    pub const INITIAL_ENERGY: f64 = 500.0;
    /// Energy lost per hour with no decay buffs.
    pub const BASE_DECAY_PER_HOUR: f64 = 5.0;
    /// Upper bound on the summed decay_reduction buff (80%).
    pub const MAX_DECAY_REDUCTION: f64 = 0.8;
    /// Multiplier applied to energy gain while in overdrive.
    pub const OVERDRIVE_MULTIPLIER: f64 = 2.0;
    /// Fraction of capacity restored by consuming an artifact.
    pub const EMERGENCY_REPAIR_FRACTION: f64 = 0.5;
}

/// Streak arithmetic.
pub mod streak {
    /// Multiplier gained per streak day.
    pub const MULTIPLIER_STEP: f64 = 0.1;
    /// Streak multiplier ceiling (reached at 20 days).
    pub const MAX_MULTIPLIER: f64 = 3.0;
    /// Artifacts unlock at every positive multiple of this streak.
    pub const MILESTONE_INTERVAL: u32 = 7;
    /// Hours without completion before a daily streak breaks.
    pub const DAILY_GRACE_HOURS: f64 = 48.0;
    /// Hours without completion before a weekly streak breaks (two weeks).
    pub const WEEKLY_GRACE_HOURS: f64 = 336.0;
    /// Cap on the grace extension granted by streak_protection buffs.
    pub const MAX_PROTECTION_EXTENSION: f64 = 0.5;
    /// Max-streak milestones that each add one shield ring.
    pub const SHIELD_MILESTONES: [u32; 3] = [3, 7, 14];
}

/// Stability thresholds.
pub mod thresholds {
    /// Below this stability the reactor is critical.
    pub const CRITICAL: f64 = 0.2;
    /// Above this stability the reactor is in overdrive.
    pub const OVERDRIVE: f64 = 0.95;
    /// Cooling vents open above this stability.
    pub const COOLING_VENTS: f64 = 0.5;
    /// Emergency vents open below this stability.
    pub const EMERGENCY_VENTS: f64 = 0.3;
    /// Structural damage shows below this stability.
    pub const STRUCTURAL_DAMAGE: f64 = 0.1;
}

/// Buff magnitudes granted by a single artifact.
pub mod buffs {
    pub const DECAY_REDUCTION: f64 = 0.1;
    /// Flat capacity added, in energy units.
    pub const CAPACITY_BOOST: f64 = 50.0;
    pub const STREAK_PROTECTION: f64 = 0.1;
    pub const ENERGY_MULTIPLIER: f64 = 0.1;
}

/// Procedural generation.
pub mod generation {
    /// Chance that a decay tick spawns an asteroid event.
    pub const EVENT_SPAWN_PROBABILITY: f64 = 0.3;
    /// Fragment progress needed to assemble one artifact.
    pub const FRAGMENTS_PER_ARTIFACT: f64 = 1.0;
}

/// Edge-case detectors.
pub mod edge {
    /// Hours in overdrive without activity before burnout warning.
    pub const BURNOUT_HOURS: f64 = 6.0;
    /// Normalized variance above which the completion pattern is "flux".
    pub const FLUX_VARIANCE_THRESHOLD: f64 = 0.4;
    /// Decay factor applied on flux days when the stabilizer is enabled.
    pub const FLUX_DECAY_FACTOR: f64 = 0.8;
    /// Bonus energy for breaking a flux pattern.
    pub const FLUX_BONUS_ENERGY: f64 = 5.0;
    /// Days considered by flux and oracle analysis.
    pub const ANALYSIS_WINDOW_DAYS: usize = 14;
}
