//! Asteroid events - ambient, claimable rewards rolled on every decay tick.
//!
//! A roll first checks the 30% spawn chance, then picks an event type by
//! cumulative weight against a single uniform draw.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::constants::generation::EVENT_SPAWN_PROBABILITY;
use crate::model::{new_id, AsteroidEvent, EventBuff, EventReward, EventType};

/// Static description of one event type.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    pub event_type: EventType,
    pub name: &'static str,
    pub description: &'static str,
    /// Selection weight; all weights sum to 1.0.
    pub weight: f64,
    pub reward: EventReward,
    /// Seconds the event stays claimable.
    pub ttl_secs: i64,
}

pub fn event_definitions() -> [EventDef; 4] {
    [
        EventDef {
            event_type: EventType::EnergySurge,
            name: "Energy Surge",
            description: "High concentration of raw fuel detected.",
            weight: 0.5,
            reward: EventReward {
                energy: Some(50.0),
                ..EventReward::default()
            },
            ttl_secs: 60,
        },
        EventDef {
            event_type: EventType::ArtifactFragment,
            name: "Artifact Fragment",
            description: "Ancient technology debris drifting nearby.",
            weight: 0.3,
            reward: EventReward {
                artifact_progress: Some(0.33),
                ..EventReward::default()
            },
            ttl_secs: 45,
        },
        EventDef {
            event_type: EventType::TimeDilation,
            name: "Time Dilation",
            description: "Temporal distortion field. Pauses decay.",
            weight: 0.15,
            reward: EventReward {
                decay_pause: Some(12.0),
                ..EventReward::default()
            },
            ttl_secs: 30,
        },
        EventDef {
            event_type: EventType::QuantumFlux,
            name: "Quantum Flux",
            description: "Unstable anomaly. Unpredictable effects.",
            weight: 0.05,
            reward: EventReward {
                buff: Some(EventBuff::Random),
                ..EventReward::default()
            },
            ttl_secs: 15,
        },
    ]
}

pub fn event_definition(event_type: EventType) -> EventDef {
    let defs = event_definitions();
    let idx = defs
        .iter()
        .position(|d| d.event_type == event_type)
        .unwrap_or(0);
    defs[idx].clone()
}

/// Pick an event type for a uniform draw in [0, 1).
pub fn select_event_type(roll: f64) -> EventType {
    let defs = event_definitions();
    let mut cumulative = 0.0;
    for def in &defs {
        cumulative += def.weight;
        if roll < cumulative {
            return def.event_type;
        }
    }
    // Float rounding can leave the sum a hair below 1.0.
    defs[defs.len() - 1].event_type
}

/// Build an event of `event_type` triggered at `now`.
pub fn create_event(event_type: EventType, now: DateTime<Utc>, rng: &mut impl Rng) -> AsteroidEvent {
    let def = event_definition(event_type);
    AsteroidEvent {
        id: new_id(rng),
        event_type,
        reward: def.reward,
        triggered_at: now,
        expires_at: now + Duration::seconds(def.ttl_secs),
        claimed: false,
    }
}

/// Roll for a new event. `None` most of the time.
pub fn roll_for_event(now: DateTime<Utc>, rng: &mut impl Rng) -> Option<AsteroidEvent> {
    if rng.gen::<f64>() >= EVENT_SPAWN_PROBABILITY {
        return None;
    }
    let event_type = select_event_type(rng.gen::<f64>());
    Some(create_event(event_type, now, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = event_definitions().iter().map(|d| d.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cumulative_selection() {
        assert_eq!(select_event_type(0.0), EventType::EnergySurge);
        assert_eq!(select_event_type(0.49), EventType::EnergySurge);
        assert_eq!(select_event_type(0.5), EventType::ArtifactFragment);
        assert_eq!(select_event_type(0.79), EventType::ArtifactFragment);
        assert_eq!(select_event_type(0.8), EventType::TimeDilation);
        assert_eq!(select_event_type(0.94), EventType::TimeDilation);
        assert_eq!(select_event_type(0.96), EventType::QuantumFlux);
        assert_eq!(select_event_type(0.999_999), EventType::QuantumFlux);
    }

    #[test]
    fn test_event_ttl_per_type() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let surge = create_event(EventType::EnergySurge, now(), &mut rng);
        assert_eq!(surge.expires_at - surge.triggered_at, Duration::seconds(60));
        assert_eq!(surge.reward.energy, Some(50.0));
        assert!(!surge.claimed);

        let flux = create_event(EventType::QuantumFlux, now(), &mut rng);
        assert_eq!(flux.expires_at - flux.triggered_at, Duration::seconds(15));
        assert_eq!(flux.reward.buff, Some(EventBuff::Random));
    }

    #[test]
    fn test_spawn_rate_is_about_thirty_percent() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let spawned = (0..10_000)
            .filter(|_| roll_for_event(now(), &mut rng).is_some())
            .count();
        assert!((2_700..3_300).contains(&spawned), "spawned {}", spawned);
    }

    #[test]
    fn test_roll_is_deterministic_per_seed() {
        let a: Vec<_> = {
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            (0..50).map(|_| roll_for_event(now(), &mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            (0..50).map(|_| roll_for_event(now(), &mut rng)).collect()
        };
        assert_eq!(a, b);
    }
}
