//! Demo collection: a handful of habits mid-streak, two artifacts and a
//! half-charged reactor. Used for first runs and by the harness.

use chrono::{DateTime, Utc};

use crate::gamification::{max_capacity, shield_level};
use crate::model::{Artifact, BuffType, Habit, HabitCategory, HabitFrequency, ReactorState};

pub struct DemoState {
    pub habits: Vec<Habit>,
    pub artifacts: Vec<Artifact>,
    pub reactor: ReactorState,
}

fn demo_habit(
    id: &str,
    name: &str,
    category: HabitCategory,
    frequency: HabitFrequency,
    streak: u32,
    completed: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Habit {
    let mut habit = Habit::new(id.to_string(), name, category, frequency, now);
    habit.current_streak = streak;
    habit.last_completed = completed;
    habit.completion_history = completed.into_iter().collect();
    habit
}

pub fn demo_state(now: DateTime<Utc>) -> DemoState {
    use HabitCategory::*;
    use HabitFrequency::*;

    let habits = vec![
        demo_habit("demo-1", "Morning Exercise", Physical, Daily, 14, Some(now), now),
        demo_habit("demo-2", "Meditation", Mental, Daily, 7, Some(now), now),
        demo_habit("demo-3", "Read 30min", Mental, Daily, 3, Some(now), now),
        demo_habit("demo-4", "Call a friend", Social, Weekly, 1, Some(now), now),
        demo_habit("demo-5", "Creative writing", Creative, Daily, 5, None, now),
    ];

    let artifacts = vec![
        Artifact {
            id: "artifact-1".into(),
            name: "Thermal Insulation".into(),
            svg_data: String::new(),
            buff_type: BuffType::DecayReduction,
            buff_value: 0.05,
            category: Physical,
            unlocked_at: now,
        },
        Artifact {
            id: "artifact-2".into(),
            name: "Neural Amplifier".into(),
            svg_data: String::new(),
            buff_type: BuffType::CapacityBoost,
            buff_value: 50.0,
            category: Mental,
            unlocked_at: now,
        },
    ];

    let mut reactor = ReactorState::new(now);
    reactor.set_energy(525.0, max_capacity(&artifacts));
    reactor.shield_level = shield_level(&habits);

    DemoState {
        habits,
        artifacts,
        reactor,
    }
}
