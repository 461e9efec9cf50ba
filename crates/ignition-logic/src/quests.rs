//! Emergency quests - generated when the reactor goes critical, progressed
//! by habit completions.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::model::{new_id, BuffType, HabitCategory, Quest, QuestRequirements, QuestReward, QuestType};

/// Catalog entry for an emergency quest.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestTemplate {
    pub quest_type: QuestType,
    pub name: &'static str,
    pub description: &'static str,
    pub habit_count: u32,
    pub category: Option<HabitCategory>,
    /// Time to complete, in hours.
    pub duration_hours: i64,
    pub energy: f64,
    pub exit_critical: bool,
}

pub const EMERGENCY_QUESTS: [QuestTemplate; 3] = [
    QuestTemplate {
        quest_type: QuestType::EmergencyBoost,
        name: "Rapid Stabilization",
        description: "Critical failure imminent. Complete 3 habits quickly to stabilize output.",
        habit_count: 3,
        category: None,
        duration_hours: 2,
        energy: 100.0,
        exit_critical: true,
    },
    QuestTemplate {
        quest_type: QuestType::AuxiliaryPower,
        name: "Auxiliary Power Routing",
        description: "Main core failing. Activate 5 low-power systems to maintain life support.",
        habit_count: 5,
        category: None,
        duration_hours: 12,
        energy: 75.0,
        exit_critical: false,
    },
    QuestTemplate {
        quest_type: QuestType::Repair,
        name: "Structural Repair",
        description: "Core containment breach. Perform physical maintenance immediately.",
        habit_count: 1,
        category: Some(HabitCategory::Physical),
        duration_hours: 1,
        energy: 50.0,
        exit_critical: true,
    },
];

impl QuestTemplate {
    pub fn instantiate(&self, id: String, now: DateTime<Utc>) -> Quest {
        let duration = Duration::hours(self.duration_hours);
        Quest {
            id,
            quest_type: self.quest_type,
            name: self.name.to_string(),
            description: self.description.to_string(),
            requirements: QuestRequirements {
                habit_count: Some(self.habit_count),
                category: self.category,
                time_limit: Some(duration.num_milliseconds()),
            },
            reward: QuestReward {
                energy: self.energy,
                buff: None,
                exit_critical: self.exit_critical,
            },
            progress: 0,
            expires_at: now + duration,
            completed: false,
        }
    }
}

/// Pick a template uniformly and instantiate it.
pub fn generate_emergency_quest(now: DateTime<Utc>, rng: &mut impl Rng) -> Quest {
    let template = &EMERGENCY_QUESTS[rng.gen_range(0..EMERGENCY_QUESTS.len())];
    template.instantiate(new_id(rng), now)
}

/// Whether an emergency quest is currently running.
pub fn has_active_emergency(quests: &[Quest], now: DateTime<Utc>) -> bool {
    quests
        .iter()
        .any(|q| q.quest_type.is_emergency() && q.is_active(now))
}

/// Generate an emergency quest if the reactor is critical and none is
/// running. Keeps at most one emergency quest active.
pub fn maybe_generate_emergency(
    quests: &[Quest],
    is_critical: bool,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Option<Quest> {
    if !is_critical || has_active_emergency(quests, now) {
        return None;
    }
    Some(generate_emergency_quest(now, rng))
}

/// Rewards collected from quests completed by one habit completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestProgress {
    pub completed: Vec<String>,
    pub energy: f64,
    pub exit_critical: bool,
    pub buffs: Vec<BuffType>,
}

impl QuestProgress {
    fn collect(&mut self, quest: &Quest) {
        self.completed.push(quest.id.clone());
        self.energy += quest.reward.energy;
        self.exit_critical |= quest.reward.exit_critical;
        if let Some(buff) = quest.reward.buff {
            self.buffs.push(buff);
        }
    }
}

/// Advance every active quest that accepts `category` by one and collect
/// the rewards of those that reach their requirement.
pub fn advance_quests(quests: &mut [Quest], category: HabitCategory, now: DateTime<Utc>) -> QuestProgress {
    let mut progress = QuestProgress::default();
    for quest in quests.iter_mut() {
        if !quest.is_active(now) || !quest.accepts(category) {
            continue;
        }
        quest.progress += 1;
        if quest.progress >= quest.required_count() {
            quest.completed = true;
            progress.collect(quest);
        }
    }
    progress
}

/// Force-complete an active quest, returning its reward. Completed,
/// expired or unknown quests yield nothing.
pub fn force_complete(quests: &mut [Quest], id: &str, now: DateTime<Utc>) -> Option<QuestProgress> {
    let quest = quests.iter_mut().find(|q| q.id == id)?;
    if !quest.is_active(now) {
        return None;
    }
    quest.completed = true;
    quest.progress = quest.progress.max(quest.required_count());
    let mut progress = QuestProgress::default();
    progress.collect(quest);
    Some(progress)
}
