//! Domain records shared by the store, persistence and sync.
//!
//! Field names serialize in camelCase and enum values in snake_case so a
//! persisted snapshot keeps the same JSON shape across versions.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{energy, thresholds};

/// Generate a UUIDv4-shaped id from the injected RNG.
pub fn new_id(rng: &mut impl Rng) -> String {
    uuid::Builder::from_random_bytes(rng.gen())
        .into_uuid()
        .to_string()
}

// ── Enumerations ───────────────────────────────────────────────────────

/// Life area a habit belongs to. Decides which buff its artifacts grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitCategory {
    Physical,
    Mental,
    Social,
    Creative,
}

impl HabitCategory {
    pub const ALL: [HabitCategory; 4] = [
        HabitCategory::Physical,
        HabitCategory::Mental,
        HabitCategory::Social,
        HabitCategory::Creative,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HabitCategory::Physical => "physical",
            HabitCategory::Mental => "mental",
            HabitCategory::Social => "social",
            HabitCategory::Creative => "creative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitFrequency {
    Daily,
    Weekly,
}

/// Mechanical effect of an artifact. Buffs of the same type are summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffType {
    DecayReduction,
    CapacityBoost,
    StreakProtection,
    EnergyMultiplier,
}

impl BuffType {
    pub const ALL: [BuffType; 4] = [
        BuffType::DecayReduction,
        BuffType::CapacityBoost,
        BuffType::StreakProtection,
        BuffType::EnergyMultiplier,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Awakening,
    RapidStabilization,
    CoreReboot,
    AuxiliaryPower,
    MeltdownPrevention,
    EmergencyBoost,
    Repair,
}

impl QuestType {
    /// Emergency quests are the ones the critical-state generator manages;
    /// only one of them may be active at a time.
    pub fn is_emergency(self) -> bool {
        matches!(
            self,
            QuestType::RapidStabilization
                | QuestType::AuxiliaryPower
                | QuestType::MeltdownPrevention
                | QuestType::EmergencyBoost
                | QuestType::Repair
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    EnergySurge,
    ArtifactFragment,
    TimeDilation,
    QuantumFlux,
}

// ── Habits ─────────────────────────────────────────────────────────────

/// A recurring habit tracked by the reactor.
///
/// `completion_history` is kept in ascending time order; it only grows on
/// completion and shrinks through retention pruning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub category: HabitCategory,
    pub frequency: HabitFrequency,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub last_completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_history: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn new(
        id: String,
        name: impl Into<String>,
        category: HabitCategory,
        frequency: HabitFrequency,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            frequency,
            current_streak: 0,
            last_completed: None,
            completion_history: Vec::new(),
            created_at,
        }
    }

    /// Most recent activity: the last completion, or creation if never completed.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_completed.unwrap_or(self.created_at)
    }
}

/// User input for creating a habit. Everything else is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    pub name: String,
    pub category: HabitCategory,
    pub frequency: HabitFrequency,
}

// ── Artifacts ──────────────────────────────────────────────────────────

/// Permanent buff unlocked by streak milestones or assembled from fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub name: String,
    /// Opaque visual payload owned by the renderer.
    #[serde(default)]
    pub svg_data: String,
    pub buff_type: BuffType,
    pub buff_value: f64,
    pub category: HabitCategory,
    pub unlocked_at: DateTime<Utc>,
}

// ── Reactor ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HibernationCause {
    Manual,
    Idle,
}

/// Reactor energy state.
///
/// `stability`, `is_critical` and `is_overdrive` are cached derivations of
/// `current_energy / max_capacity`; they are only written through the
/// transition helpers in [`crate::reactor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReactorState {
    pub current_energy: f64,
    pub max_capacity: f64,
    pub stability: f64,
    pub shield_level: u32,
    pub is_critical: bool,
    pub is_overdrive: bool,
    pub is_hibernating: bool,
    pub hibernation_cause: Option<HibernationCause>,
    /// Anchor for decay integration.
    pub last_decay_update: DateTime<Utc>,
    /// Decay is suspended until this instant (time dilation).
    pub decay_paused_until: Option<DateTime<Utc>>,
}

impl ReactorState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_decay_update: now,
            ..Self::default()
        }
    }
}

impl Default for ReactorState {
    fn default() -> Self {
        let stability = energy::INITIAL_ENERGY / energy::BASE_MAX_CAPACITY;
        Self {
            current_energy: energy::INITIAL_ENERGY,
            max_capacity: energy::BASE_MAX_CAPACITY,
            stability,
            shield_level: 0,
            is_critical: stability < thresholds::CRITICAL,
            is_overdrive: stability > thresholds::OVERDRIVE,
            is_hibernating: false,
            hibernation_cause: None,
            last_decay_update: DateTime::<Utc>::default(),
            decay_paused_until: None,
        }
    }
}

// ── Quests ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<HabitCategory>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestReward {
    #[serde(default)]
    pub energy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buff: Option<BuffType>,
    #[serde(default)]
    pub exit_critical: bool,
}

/// Time-boxed objective. Completed and expired quests stay in the
/// collection; readers filter with [`Quest::is_active`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub requirements: QuestRequirements,
    #[serde(default)]
    pub reward: QuestReward,
    #[serde(default)]
    pub progress: u32,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

impl Quest {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.completed && !self.is_expired(now)
    }

    /// Completions needed; a quest without a count needs one.
    pub fn required_count(&self) -> u32 {
        self.requirements.habit_count.unwrap_or(1).max(1)
    }

    pub fn accepts(&self, category: HabitCategory) -> bool {
        self.requirements.category.map_or(true, |c| c == category)
    }
}

/// Quest data supplied by a caller of `add_quest`; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuest {
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub requirements: QuestRequirements,
    #[serde(default)]
    pub reward: QuestReward,
    pub expires_at: DateTime<Utc>,
}

impl NewQuest {
    pub fn into_quest(self, id: String) -> Quest {
        Quest {
            id,
            quest_type: self.quest_type,
            name: self.name,
            description: self.description,
            requirements: self.requirements,
            reward: self.reward,
            progress: 0,
            expires_at: self.expires_at,
            completed: false,
        }
    }
}

// ── Asteroid events ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventBuff {
    /// A buff type drawn at claim time.
    Random,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReward {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_progress: Option<f64>,
    /// Hours of decay suspension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_pause: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buff: Option<EventBuff>,
}

/// Claimable, time-boxed reward. Claimed and expired events stay in the
/// collection; readers filter with [`AsteroidEvent::is_claimable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidEvent {
    pub id: String,
    pub event_type: EventType,
    #[serde(default)]
    pub reward: EventReward,
    pub triggered_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub claimed: bool,
}

impl AsteroidEvent {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        !self.claimed && !self.is_expired(now)
    }
}

/// Event data supplied by a caller of `spawn_event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub reward: EventReward,
    pub triggered_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewEvent {
    pub fn into_event(self, id: String) -> AsteroidEvent {
        AsteroidEvent {
            id,
            event_type: self.event_type,
            reward: self.reward,
            triggered_at: self.triggered_at,
            expires_at: self.expires_at,
            claimed: false,
        }
    }
}

// ── Settings and sync ──────────────────────────────────────────────────

/// Self-imposed daily limit on reward-yielding completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EthicalSettings {
    pub enabled: bool,
    pub daily_cap: u32,
    pub cooldown_reminder_minutes: u32,
    /// Transient bypass for the current session.
    pub session_override: bool,
}

impl Default for EthicalSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            daily_cap: 10,
            cooldown_reminder_minutes: 30,
            session_override: false,
        }
    }
}

impl EthicalSettings {
    /// Whether the cap applies right now.
    pub fn is_enforced(&self) -> bool {
        self.enabled && !self.session_override
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
    Offline,
}

/// Observational sync status, written only by the sync collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub status: SyncStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_id_is_deterministic_per_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let id = new_id(&mut a);
        assert_eq!(id, new_id(&mut b));
        assert_eq!(id.len(), 36);
        assert_eq!(&id[14..15], "4");
        assert_ne!(new_id(&mut a), id);
    }

    #[test]
    fn test_habit_json_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let habit = Habit::new(
            "h1".into(),
            "Run",
            HabitCategory::Physical,
            HabitFrequency::Daily,
            ts,
        );
        let json = serde_json::to_value(&habit).unwrap();
        assert_eq!(json["category"], "physical");
        assert_eq!(json["currentStreak"], 0);
        assert!(json["lastCompleted"].is_null());
        assert!(json.get("completionHistory").is_some());
    }

    #[test]
    fn test_reactor_missing_fields_default() {
        let reactor: ReactorState = serde_json::from_str(r#"{"currentEnergy": 120.0}"#).unwrap();
        assert_eq!(reactor.current_energy, 120.0);
        assert_eq!(reactor.max_capacity, 1000.0);
        assert!(!reactor.is_hibernating);
    }

    #[test]
    fn test_quest_activity() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut quest = NewQuest {
            quest_type: QuestType::Repair,
            name: "Structural Repair".into(),
            description: String::new(),
            requirements: QuestRequirements {
                habit_count: Some(1),
                category: Some(HabitCategory::Physical),
                time_limit: None,
            },
            reward: QuestReward::default(),
            expires_at: now + chrono::Duration::hours(1),
        }
        .into_quest("q1".into());

        assert!(quest.is_active(now));
        assert!(!quest.is_active(now + chrono::Duration::hours(1)));
        assert!(quest.accepts(HabitCategory::Physical));
        assert!(!quest.accepts(HabitCategory::Mental));
        quest.completed = true;
        assert!(!quest.is_active(now));
    }

    #[test]
    fn test_emergency_quest_types() {
        assert!(QuestType::Repair.is_emergency());
        assert!(QuestType::EmergencyBoost.is_emergency());
        assert!(!QuestType::Awakening.is_emergency());
        assert!(!QuestType::CoreReboot.is_emergency());
    }
}
