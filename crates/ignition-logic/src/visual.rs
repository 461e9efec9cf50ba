//! Cosmetic state derived for renderers (shield rings, vents, damage).

use serde::{Deserialize, Serialize};

use crate::constants::thresholds;
use crate::gamification::shield_level;
use crate::model::{Artifact, Habit, ReactorState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualState {
    /// 0-3
    pub shield_rings: u32,
    pub cooling_vents_active: bool,
    pub emergency_vents_active: bool,
    pub structural_damage: bool,
    pub artifact_count: usize,
    pub overdrive: bool,
    pub critical: bool,
    pub hibernating: bool,
}

pub fn derive_visual_state(reactor: &ReactorState, artifacts: &[Artifact], habits: &[Habit]) -> VisualState {
    let stability = reactor.stability;
    VisualState {
        shield_rings: shield_level(habits),
        cooling_vents_active: stability > thresholds::COOLING_VENTS,
        emergency_vents_active: stability < thresholds::EMERGENCY_VENTS,
        structural_damage: stability < thresholds::STRUCTURAL_DAMAGE,
        artifact_count: artifacts.len(),
        overdrive: reactor.is_overdrive,
        critical: reactor.is_critical,
        hibernating: reactor.is_hibernating,
    }
}
