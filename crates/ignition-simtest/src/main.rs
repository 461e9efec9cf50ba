//! Core Ignition Headless Scenario Harness
//!
//! Drives the store through scripted scenarios with a seeded RNG, an
//! in-memory storage and an in-memory remote. No UI, no network.
//!
//! Usage:
//!   cargo run -p ignition-simtest
//!   cargo run -p ignition-simtest -- --verbose
//!   cargo run -p ignition-simtest -- --config engine.json

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use ignition_core::prelude::*;
use ignition_logic::gamification::{energy_gain, shield_level};
use ignition_logic::oracle::Trend;
use ignition_logic::reactor::recompute_reactor;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    println!("=== Core Ignition Scenario Harness ===\n");

    let mut results = Vec::new();

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => match args.get(i + 1).map(EngineConfig::from_path) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                results.push(TestResult {
                    name: "config_load".into(),
                    passed: false,
                    detail: format!("{}", e),
                });
                EngineConfig::default()
            }
            None => {
                results.push(TestResult {
                    name: "config_load".into(),
                    passed: false,
                    detail: "--config needs a path".into(),
                });
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    };
    if verbose {
        println!("config: {:?}\n", config);
    }

    // 1. Reactor math
    results.extend(validate_reactor_math(verbose));

    // 2. Demo collection
    results.extend(validate_demo(&config, verbose));

    // 3. Thirty simulated days
    results.extend(validate_month(&config, verbose));

    // 4. Ethical cap
    results.extend(validate_ethical_cap(&config, verbose));

    // 5. Persistence
    results.extend(validate_persistence(&config, verbose));

    // 6. Sync
    results.extend(validate_sync(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap()
}

fn daily(name: &str, category: HabitCategory) -> NewHabit {
    NewHabit {
        name: name.into(),
        category,
        frequency: HabitFrequency::Daily,
    }
}

// ── 1. Reactor math ─────────────────────────────────────────────────────

fn validate_reactor_math(_verbose: bool) -> Vec<TestResult> {
    println!("--- Reactor Math ---");
    let mut results = Vec::new();

    let mut habit = Habit::new("h".into(), "Run", HabitCategory::Physical, HabitFrequency::Daily, start());
    habit.current_streak = 6;
    let gain = energy_gain(&habit, &[], false);
    results.push(TestResult {
        name: "streak_six_gain".into(),
        passed: (gain.energy - 17.0).abs() < 1e-9 && gain.new_streak == 7,
        detail: format!("gain {:.2}, new streak {}", gain.energy, gain.new_streak),
    });

    let readout = recompute_reactor(50.0, 1000.0);
    results.push(TestResult {
        name: "low_energy_critical".into(),
        passed: readout.is_critical && !readout.is_overdrive,
        detail: format!("stability {:.3}", readout.stability),
    });

    let bounds_ok = [(-10.0, 1000.0), (2000.0, 1000.0), (10.0, 0.0)]
        .iter()
        .all(|&(e, c)| (0.0..=1.0).contains(&recompute_reactor(e, c).stability));
    results.push(TestResult {
        name: "stability_clamped".into(),
        passed: bounds_ok,
        detail: "negative, overfull and zero-capacity inputs".into(),
    });

    results
}

// ── 2. Demo collection ──────────────────────────────────────────────────

fn validate_demo(config: &EngineConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Demo Collection ---");
    let mut results = Vec::new();
    let mut store = CoreStore::new(config.clone(), MemoryStorage::new(), start());
    store.load_demo(start());

    let reactor = store.reactor().clone();
    if verbose {
        println!(
            "  demo reactor: {:.0}/{:.0} ({:.1}%)",
            reactor.current_energy,
            reactor.max_capacity,
            reactor.stability * 100.0
        );
    }
    results.push(TestResult {
        name: "demo_reactor".into(),
        passed: reactor.current_energy == 525.0 && reactor.max_capacity == 1050.0,
        detail: format!("{:.0}/{:.0}", reactor.current_energy, reactor.max_capacity),
    });

    results.push(TestResult {
        name: "demo_shields".into(),
        passed: reactor.shield_level == shield_level(store.habits()) && reactor.shield_level == 3,
        detail: format!("shield level {}", reactor.shield_level),
    });

    let visual = store.visual_state();
    results.push(TestResult {
        name: "demo_visual_state".into(),
        passed: visual.shield_rings == 3 && visual.artifact_count == 2 && !visual.critical,
        detail: format!("{:?}", visual),
    });

    results
}

// ── 3. Thirty simulated days ────────────────────────────────────────────

fn validate_month(config: &EngineConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Thirty Days ---");
    let mut results = Vec::new();
    let mut store = CoreStore::new(config.clone(), MemoryStorage::new(), start());

    let run = store.add_habit(daily("Run", HabitCategory::Physical), start());
    let read = store.add_habit(daily("Read", HabitCategory::Mental), start());
    let (Some(run), Some(read)) = (run, read) else {
        results.push(TestResult {
            name: "month_setup".into(),
            passed: false,
            detail: "habits were not added".into(),
        });
        return results;
    };

    let mut min_energy = f64::MAX;
    let mut max_energy: f64 = 0.0;
    let mut clamped = true;
    let mut events_seen = 0;
    let mut quests_seen = 0;
    let mut now = start();
    store.start_ticker(now);

    for day in 0..30 {
        // Run every day; read only on weekdays of the first two weeks.
        store.complete_habit(&run, now);
        if day < 14 && day % 7 < 5 {
            store.complete_habit(&read, now + Duration::hours(1));
        }
        for _ in 0..24 {
            now += Duration::hours(1);
            if let Some(report) = store.update(now) {
                events_seen += usize::from(report.event_spawned.is_some());
                quests_seen += usize::from(report.quest_created.is_some());
            }
            let r = store.reactor();
            clamped &= r.current_energy >= 0.0 && r.current_energy <= r.max_capacity;
            min_energy = min_energy.min(r.current_energy);
            max_energy = max_energy.max(r.current_energy);
        }
        let _ = store.take_signals();
    }

    if verbose {
        println!(
            "  energy range {:.1}..{:.1}, {} events, {} emergency quests",
            min_energy, max_energy, events_seen, quests_seen
        );
    }

    results.push(TestResult {
        name: "month_energy_clamped".into(),
        passed: clamped,
        detail: format!("range {:.1}..{:.1}", min_energy, max_energy),
    });

    let run_habit = store.habit(&run).cloned();
    results.push(TestResult {
        name: "month_run_streak".into(),
        passed: run_habit.as_ref().map_or(false, |h| h.current_streak == 30),
        detail: format!("streak {:?}", run_habit.map(|h| h.current_streak)),
    });

    let read_streak = store.habit(&read).map(|h| h.current_streak);
    results.push(TestResult {
        name: "month_read_streak_broken".into(),
        passed: read_streak == Some(0),
        detail: format!("streak {:?}", read_streak),
    });

    // Four milestones on the daily habit: 7, 14, 21, 28.
    results.push(TestResult {
        name: "month_milestone_artifacts".into(),
        passed: store.artifacts().len() >= 4,
        detail: format!("{} artifacts", store.artifacts().len()),
    });

    results.push(TestResult {
        name: "month_events_rolled".into(),
        passed: events_seen > 0,
        detail: format!("{} events over {} ticks", events_seen, 30 * 24),
    });

    let oracle = store.get_oracle_analysis(now);
    results.push(TestResult {
        name: "month_oracle".into(),
        passed: oracle.as_ref().map_or(false, |o| o.trend != Trend::Critical),
        detail: oracle.map_or("none".into(), |o| o.message),
    });

    results
}

// ── 4. Ethical cap ──────────────────────────────────────────────────────

fn validate_ethical_cap(config: &EngineConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Ethical Cap ---");
    let mut results = Vec::new();
    let mut store = CoreStore::new(config.clone(), MemoryStorage::new(), start());
    let ids: Vec<String> = ["Walk", "Write", "Call"]
        .iter()
        .zip([HabitCategory::Physical, HabitCategory::Creative, HabitCategory::Social])
        .filter_map(|(name, category)| store.add_habit(daily(name, category), start()))
        .collect();

    store.set_daily_cap(2, start());
    store.toggle_ethical_mode(start());

    let reports: Vec<CompletionReport> = ids
        .iter()
        .filter_map(|id| store.complete_habit(id, start()))
        .collect();
    let throttled: Vec<bool> = reports.iter().map(|r| r.throttled).collect();

    results.push(TestResult {
        name: "cap_throttles_third".into(),
        passed: throttled == vec![false, false, true],
        detail: format!("{:?}", throttled),
    });

    let streaks_advanced = ids
        .iter()
        .all(|id| store.habit(id).map_or(false, |h| h.current_streak == 1));
    results.push(TestResult {
        name: "cap_still_counts_streak".into(),
        passed: streaks_advanced,
        detail: format!("{} completions today", store.today_completion_count(start())),
    });

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(config: &EngineConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();
    let storage = MemoryStorage::new();
    let mut store = CoreStore::new(config.clone(), storage.clone(), start());
    store.load_demo(start());
    store.tick_decay(start() + Duration::hours(3));

    let reopened = CoreStore::open(config.clone(), storage.clone(), start() + Duration::hours(3));
    results.push(TestResult {
        name: "persist_roundtrip".into(),
        passed: reopened.snapshot() == store.snapshot(),
        detail: format!("{} writes", storage.write_count()),
    });

    let corrupt = CoreStore::open(config.clone(), MemoryStorage::with_data("{{{"), start());
    results.push(TestResult {
        name: "persist_corrupt_fallback".into(),
        passed: corrupt.habits().is_empty()
            && corrupt
                .notifications()
                .iter()
                .any(|n| n.kind == NotificationKind::Error),
        detail: format!("{} notifications", corrupt.notifications().len()),
    });

    results
}

// ── 6. Sync ─────────────────────────────────────────────────────────────

fn validate_sync(config: &EngineConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Sync ---");
    let mut results = Vec::new();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(rt) => rt,
        Err(e) => {
            results.push(TestResult {
                name: "sync_runtime".into(),
                passed: false,
                detail: format!("{}", e),
            });
            return results;
        }
    };

    let remote = Arc::new(MemoryRemote::new());
    let mut store = CoreStore::new(config.clone(), MemoryStorage::new(), start());
    store.load_demo(start());

    runtime.block_on(async {
        let (sync, mut outcomes) = SyncManager::new(remote.clone(), "harness", config.sync_debounce());

        let first = sync.sync_once(store.sync_payload()).await;
        results.push(TestResult {
            name: "sync_first_push".into(),
            passed: matches!(&first, Ok(report) if !report.remote_found),
            detail: format!("{:?}", sync.state().status),
        });

        for _ in 0..3 {
            sync.request(store.sync_payload());
        }
        let debounced = outcomes.recv().await;
        if verbose {
            println!("  debounced outcome: {:?}", debounced.as_ref().map(|o| o.is_ok()));
        }
        results.push(TestResult {
            name: "sync_debounced_once".into(),
            passed: matches!(debounced, Some(Ok(_))) && remote.upsert_count() == 2,
            detail: format!("{} upserts", remote.upsert_count()),
        });

        let before = store.snapshot();
        remote.set_failing(true);
        let failed = sync.sync_once(store.sync_payload()).await;
        results.push(TestResult {
            name: "sync_failure_is_local_noop".into(),
            passed: failed.is_err()
                && sync.state().status == SyncStatus::Error
                && store.snapshot() == before,
            detail: sync.state().error_message.unwrap_or_default(),
        });
    });

    results
}
