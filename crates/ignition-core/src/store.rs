//! Core store - owns every collection and applies actions to it.
//!
//! Each public mutation runs to completion on `&mut self`, so there is no
//! partially-updated state to observe. Invalid ids are silent no-ops.
//! Storage failures turn into an error notification and the store keeps
//! running in memory.

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use ignition_logic::artifacts::{
    fragment_artifact, is_streak_milestone, milestone_artifact, quantum_artifact, reward_artifact,
};
use ignition_logic::clock::same_day;
use ignition_logic::constants::{energy, generation};
use ignition_logic::demo::demo_state;
use ignition_logic::edge_cases::{
    apply_flux_stabilizer, burnout_risk, daily_habit_counts, detect_flux, flux_bonus_energy, is_idle,
    last_completion,
};
use ignition_logic::events::{event_definition, roll_for_event};
use ignition_logic::gamification::{
    decay_tick_at_rate, effective_decay_per_hour, energy_gain, max_capacity, shield_level,
    should_break_streak_protected,
};
use ignition_logic::merge::merge_habits;
use ignition_logic::model::{
    new_id, Artifact, AsteroidEvent, EthicalSettings, EventBuff, Habit, HibernationCause, NewEvent,
    NewHabit, NewQuest, Quest, ReactorState,
};
use ignition_logic::oracle::{analyze, OracleAnalysis};
use ignition_logic::quests::{advance_quests, force_complete, maybe_generate_emergency, QuestProgress};
use ignition_logic::visual::{derive_visual_state, VisualState};

use crate::config::EngineConfig;
use crate::notifications::{Notification, NotificationKind, NotificationQueue, Signal};
use crate::persistence::{prune_history, Snapshot, SnapshotStorage};
use crate::scheduler::DecayScheduler;
use crate::sync::SyncPayload;

/// What a habit completion did.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub habit_id: String,
    /// Energy added to the reactor: habit gain plus quest rewards.
    pub energy_gained: f64,
    pub new_streak: u32,
    /// Over the daily cap: recorded, but worth no energy.
    pub throttled: bool,
    pub completed_quests: Vec<String>,
    pub unlocked_artifacts: Vec<String>,
    /// The completion woke the reactor from idle hibernation.
    pub awakened: bool,
}

/// What a decay tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub energy_lost: f64,
    pub broken_streaks: Vec<String>,
    pub entered_hibernation: bool,
    pub quest_created: Option<String>,
    pub event_spawned: Option<String>,
    pub burnout_warning: bool,
}

/// The game state machine.
pub struct CoreStore {
    config: EngineConfig,
    habits: Vec<Habit>,
    artifacts: Vec<Artifact>,
    reactor: ReactorState,
    quests: Vec<Quest>,
    events: Vec<AsteroidEvent>,
    ethical_settings: EthicalSettings,
    /// Fragment progress toward the next assembled artifact.
    artifact_progress: f64,
    notifications: NotificationQueue,
    /// Presentation triggers waiting to be drained.
    signals: Vec<Signal>,
    scheduler: DecayScheduler,
    rng: ChaCha8Rng,
    storage: Box<dyn SnapshotStorage>,
    /// Burnout already announced for the current overdrive episode.
    burnout_warned: bool,
}

impl CoreStore {
    /// Fresh store with the initial reactor. Nothing is read from storage.
    pub fn new(config: EngineConfig, storage: impl SnapshotStorage + 'static, now: DateTime<Utc>) -> Self {
        Self {
            habits: Vec::new(),
            artifacts: Vec::new(),
            reactor: ReactorState::new(now),
            quests: Vec::new(),
            events: Vec::new(),
            ethical_settings: EthicalSettings::default(),
            artifact_progress: 0.0,
            notifications: NotificationQueue::new(config.max_notifications, config.notification_ttl()),
            signals: Vec::new(),
            scheduler: DecayScheduler::new(config.tick_interval()),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            storage: Box::new(storage),
            burnout_warned: false,
            config,
        }
    }

    /// Store restored from `storage`. Missing data gives the initial state;
    /// unreadable data gives the initial state plus an error notification.
    pub fn open(config: EngineConfig, storage: impl SnapshotStorage + 'static, now: DateTime<Utc>) -> Self {
        let mut store = Self::new(config, storage, now);
        match store.storage.load() {
            Ok(None) => log::debug!("no saved state, starting fresh"),
            Ok(Some(data)) => match Snapshot::from_json(&data) {
                Ok(snapshot) => {
                    store.restore(snapshot, now);
                    log::info!(
                        "restored {} habits, {} artifacts",
                        store.habits.len(),
                        store.artifacts.len()
                    );
                }
                Err(e) => {
                    log::warn!("saved state unreadable, starting fresh: {}", e);
                    store.notify("Saved progress could not be read. Starting fresh.", NotificationKind::Error, now);
                }
            },
            Err(e) => {
                log::warn!("failed to load saved state: {}", e);
                store.notify("Saved progress could not be loaded.", NotificationKind::Error, now);
            }
        }
        store
    }

    /// Replace the random source, e.g. to share one seeded stream.
    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    fn restore(&mut self, snapshot: Snapshot, now: DateTime<Utc>) {
        self.habits = snapshot.habits;
        for habit in &mut self.habits {
            habit.completion_history.sort();
        }
        self.artifacts = snapshot.artifacts;
        self.quests = snapshot.quests;
        self.events = snapshot.events;
        self.ethical_settings = snapshot.ethical_settings;
        // The override only lasts for the session that set it.
        self.ethical_settings.session_override = false;
        self.artifact_progress = if snapshot.artifact_progress.is_finite() {
            snapshot.artifact_progress.clamp(0.0, generation::FRAGMENTS_PER_ARTIFACT)
        } else {
            0.0
        };
        self.reactor = snapshot.reactor;
        self.reactor.normalize(max_capacity(&self.artifacts), now);
        self.reactor.shield_level = shield_level(&self.habits);
    }

    // ── Internal helpers ───────────────────────────────────────────────

    fn next_id(&mut self) -> String {
        new_id(&mut self.rng)
    }

    fn notify(&mut self, message: impl Into<String>, kind: NotificationKind, now: DateTime<Utc>) -> String {
        let id = self.next_id();
        self.notifications.push(id.clone(), message, kind, now);
        id
    }

    fn emit(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    /// Re-derive capacity from artifacts and shields from streaks.
    fn refresh_derived(&mut self) {
        self.reactor.set_capacity(max_capacity(&self.artifacts));
        self.reactor.shield_level = shield_level(&self.habits);
    }

    fn persist(&mut self, now: DateTime<Utc>) {
        let pruned = prune_history(&mut self.habits, now, self.config.history_retention_days);
        if pruned > 0 {
            log::debug!("pruned {} old completions", pruned);
        }
        let result = self.snapshot().to_json().and_then(|json| self.storage.save(&json));
        if let Err(e) = result {
            log::warn!("failed to persist state: {}", e);
            self.notify("Progress could not be saved.", NotificationKind::Error, now);
        }
    }

    /// Integrate decay up to `now` without any of the tick side effects.
    fn apply_decay(&mut self, now: DateTime<Utc>) -> f64 {
        let capacity = max_capacity(&self.artifacts);
        let mut rate = effective_decay_per_hour(&self.artifacts);
        if self.config.flux_stabilizer {
            let flux = detect_flux(&self.habits, now, self.config.day_offset());
            rate = apply_flux_stabilizer(rate, flux.has_flux);
        }
        let outcome = decay_tick_at_rate(&self.reactor, rate, capacity, now);
        self.reactor.set_energy(outcome.energy, capacity);
        // A clock that steps backwards must not move the anchor back.
        if outcome.last_decay_update > self.reactor.last_decay_update {
            self.reactor.last_decay_update = outcome.last_decay_update;
        }
        if matches!(self.reactor.decay_paused_until, Some(until) if now >= until) {
            self.reactor.decay_paused_until = None;
        }
        outcome.energy_lost
    }

    fn grant_artifact(&mut self, artifact: Artifact, now: DateTime<Utc>) -> String {
        let id = artifact.id.clone();
        log::info!(
            "artifact unlocked: {} ({:?} {})",
            artifact.name,
            artifact.buff_type,
            artifact.buff_value
        );
        self.notify(format!("Artifact unlocked: {}", artifact.name), NotificationKind::Success, now);
        self.artifacts.push(artifact);
        self.emit(Signal::ArtifactUnlocked { id: id.clone() });
        id
    }

    /// Grant buff artifacts and announce completed quests. Energy and the
    /// critical override are applied by the caller.
    fn collect_quest_rewards(&mut self, progress: &QuestProgress, now: DateTime<Utc>) -> Vec<String> {
        let mut unlocked = Vec::new();
        for buff in &progress.buffs {
            let artifact = reward_artifact(*buff, now, &mut self.rng);
            unlocked.push(self.grant_artifact(artifact, now));
        }
        for id in &progress.completed {
            log::info!("quest completed: {}", id);
            self.emit(Signal::QuestCompleted { id: id.clone() });
        }
        if !progress.completed.is_empty() {
            self.notify(
                format!("Quest complete: +{:.0} energy", progress.energy),
                NotificationKind::Success,
                now,
            );
        }
        unlocked
    }

    // ── Habits ─────────────────────────────────────────────────────────

    /// Add a habit. Blank names are ignored.
    pub fn add_habit(&mut self, new_habit: NewHabit, now: DateTime<Utc>) -> Option<String> {
        let name = new_habit.name.trim();
        if name.is_empty() {
            log::debug!("add_habit: blank name ignored");
            return None;
        }
        let id = self.next_id();
        let habit = Habit::new(id.clone(), name, new_habit.category, new_habit.frequency, now);
        log::info!("habit added: {} ({})", habit.name, habit.category.label());
        self.habits.push(habit);
        self.persist(now);
        Some(id)
    }

    pub fn delete_habit(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let before = self.habits.len();
        self.habits.retain(|h| h.id != id);
        if self.habits.len() == before {
            log::debug!("delete_habit: unknown id {}", id);
            return false;
        }
        self.refresh_derived();
        self.persist(now);
        true
    }

    /// Completions recorded today across all habits.
    pub fn today_completion_count(&self, now: DateTime<Utc>) -> usize {
        let offset = self.config.day_offset();
        self.habits
            .iter()
            .flat_map(|h| h.completion_history.iter())
            .filter(|ts| same_day(**ts, now, offset))
            .count()
    }

    /// Complete a habit.
    ///
    /// Returns `None` for an unknown id or a habit already completed today.
    /// Decay owed since the last tick is settled before the gain is computed.
    /// Over the ethical cap the completion is still recorded and still
    /// advances the streak, but yields no energy and progresses no quest.
    pub fn complete_habit(&mut self, id: &str, now: DateTime<Utc>) -> Option<CompletionReport> {
        let offset = self.config.day_offset();
        let Some(idx) = self.habits.iter().position(|h| h.id == id) else {
            log::debug!("complete_habit: unknown id {}", id);
            return None;
        };
        if let Some(last) = self.habits[idx].last_completed {
            if same_day(last, now, offset) {
                log::debug!("complete_habit: {} already completed today", id);
                return None;
            }
        }

        // Gain and flags must see the reactor as of `now`.
        self.apply_decay(now);

        // Ethical gate
        let throttled = self.ethical_settings.is_enforced()
            && self.today_completion_count(now) >= self.ethical_settings.daily_cap as usize;

        let gain = energy_gain(&self.habits[idx], &self.artifacts, self.reactor.is_overdrive);
        let flux_bonus = if self.config.flux_stabilizer {
            let flux = detect_flux(&self.habits, now, offset);
            let counts = daily_habit_counts(&self.habits, now, offset);
            let yesterday_empty = counts.len() >= 2 && counts[counts.len() - 2] == 0;
            flux_bonus_energy(flux.has_flux, yesterday_empty)
        } else {
            0.0
        };

        // Record the completion
        let habit = &mut self.habits[idx];
        let pos = habit.completion_history.partition_point(|ts| *ts <= now);
        habit.completion_history.insert(pos, now);
        habit.last_completed = Some(habit.last_completed.map_or(now, |last| last.max(now)));
        habit.current_streak = gain.new_streak;
        let category = habit.category;
        let name = habit.name.clone();

        let mut energy_gained = 0.0;
        let mut exit_critical = false;
        let mut completed_quests = Vec::new();
        let mut unlocked_artifacts = Vec::new();

        if throttled {
            log::info!("completion of {} throttled by daily cap", name);
            self.notify(
                "Daily cap reached. Completion recorded without energy.",
                NotificationKind::Info,
                now,
            );
        } else {
            energy_gained += gain.energy + flux_bonus;
            let progress = advance_quests(&mut self.quests, category, now);
            energy_gained += progress.energy;
            exit_critical = progress.exit_critical;
            unlocked_artifacts.extend(self.collect_quest_rewards(&progress, now));
            completed_quests = progress.completed;
        }

        // Awakening from idle hibernation; manual hibernation stays.
        let awakened =
            self.reactor.is_hibernating && self.reactor.hibernation_cause == Some(HibernationCause::Idle);
        if awakened {
            self.reactor.wake(now);
            log::info!("reactor awakened by activity");
            self.emit(Signal::HibernationChanged { on: false });
            self.notify("Reactor awakened.", NotificationKind::Info, now);
        }

        self.reactor.add_energy(energy_gained);

        if is_streak_milestone(gain.new_streak) {
            let artifact = milestone_artifact(category, now, &mut self.rng);
            unlocked_artifacts.push(self.grant_artifact(artifact, now));
        }

        self.refresh_derived();
        if exit_critical {
            self.reactor.override_critical();
        }
        self.burnout_warned = false;

        log::info!(
            "completed {}: +{:.1} energy, streak {}",
            name,
            energy_gained,
            gain.new_streak
        );
        self.emit(Signal::ReactorPulse);
        self.emit(Signal::CompletionChime { category });
        if !throttled {
            self.notify(
                format!("{} complete: +{:.0} energy", name, energy_gained),
                NotificationKind::Success,
                now,
            );
        }

        self.persist(now);
        Some(CompletionReport {
            habit_id: id.to_string(),
            energy_gained,
            new_streak: gain.new_streak,
            throttled,
            completed_quests,
            unlocked_artifacts,
            awakened,
        })
    }

    // ── Decay tick ─────────────────────────────────────────────────────

    /// Periodic tick: streak breaks, decay, critical alarm, emergency
    /// quest, idle hibernation, burnout warning and the event roll.
    pub fn tick_decay(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        self.notifications.prune(now);

        // Streak breaks
        for habit in self.habits.iter_mut() {
            if should_break_streak_protected(habit, &self.artifacts, now) {
                habit.current_streak = 0;
                report.broken_streaks.push(habit.id.clone());
            }
        }
        for habit_id in report.broken_streaks.clone() {
            log::info!("streak broken: {}", habit_id);
            self.emit(Signal::StreakBroken { habit_id });
            self.notify("A streak was broken.", NotificationKind::Warning, now);
        }

        // Decay
        let was_critical = self.reactor.is_critical;
        report.energy_lost = self.apply_decay(now);
        self.refresh_derived();
        if self.reactor.is_critical && !was_critical {
            log::warn!("reactor critical at {:.1}% stability", self.reactor.stability * 100.0);
            self.emit(Signal::CriticalAlarm);
            self.notify("Reactor critical!", NotificationKind::Critical, now);
        }

        // Emergency quest
        if let Some(quest) = maybe_generate_emergency(&self.quests, self.reactor.is_critical, now, &mut self.rng) {
            log::info!("emergency quest created: {}", quest.name);
            let id = quest.id.clone();
            self.notify(format!("Emergency: {}", quest.name), NotificationKind::Warning, now);
            self.quests.push(quest);
            self.emit(Signal::QuestCreated { id: id.clone() });
            report.quest_created = Some(id);
        }

        // Idle hibernation
        if self.config.auto_hibernate_when_idle
            && !self.reactor.is_hibernating
            && is_idle(&self.habits, now, self.config.idle_hours)
        {
            self.reactor.hibernate(HibernationCause::Idle);
            log::info!("no activity for {}h, hibernating", self.config.idle_hours);
            self.emit(Signal::HibernationChanged { on: true });
            self.notify("Reactor entered hibernation.", NotificationKind::Info, now);
            report.entered_hibernation = true;
        }

        // Burnout
        if !self.reactor.is_overdrive {
            self.burnout_warned = false;
        } else if !self.burnout_warned && burnout_risk(last_completion(&self.habits), true, now) {
            self.burnout_warned = true;
            log::info!("overdrive burnout risk");
            self.emit(Signal::BurnoutWarning);
            self.notify("Overdrive without rest. Risk of burnout.", NotificationKind::Warning, now);
            report.burnout_warning = true;
        }

        // Asteroid events
        if let Some(event) = roll_for_event(now, &mut self.rng) {
            let def = event_definition(event.event_type);
            log::debug!("event spawned: {}", def.name);
            let id = event.id.clone();
            self.notify(format!("Asteroid detected: {}", def.name), NotificationKind::Info, now);
            self.events.push(event);
            self.emit(Signal::EventSpawned { id: id.clone() });
            report.event_spawned = Some(id);
        }

        self.persist(now);
        report
    }

    /// Expire notifications, then run a tick if the scheduler says one is
    /// due.
    pub fn update(&mut self, now: DateTime<Utc>) -> Option<TickReport> {
        self.notifications.prune(now);
        if self.scheduler.poll(now) {
            Some(self.tick_decay(now))
        } else {
            None
        }
    }

    pub fn start_ticker(&mut self, now: DateTime<Utc>) {
        self.scheduler.start(now);
    }

    pub fn stop_ticker(&mut self) {
        self.scheduler.stop();
    }

    pub fn ticker_running(&self) -> bool {
        self.scheduler.is_running()
    }

    // ── Hibernation ────────────────────────────────────────────────────

    /// Freeze decay. Decay owed up to `now` is applied first.
    pub fn enter_hibernation(&mut self, now: DateTime<Utc>) {
        if self.reactor.is_hibernating {
            // Manual wins over idle so activity alone won't wake it.
            self.reactor.hibernation_cause = Some(HibernationCause::Manual);
            self.persist(now);
            return;
        }
        self.apply_decay(now);
        self.reactor.hibernate(HibernationCause::Manual);
        log::info!("hibernation on");
        self.emit(Signal::HibernationChanged { on: true });
        self.notify("Reactor entered hibernation.", NotificationKind::Info, now);
        self.persist(now);
    }

    pub fn exit_hibernation(&mut self, now: DateTime<Utc>) {
        if !self.reactor.is_hibernating {
            return;
        }
        self.reactor.wake(now);
        log::info!("hibernation off");
        self.emit(Signal::HibernationChanged { on: false });
        self.notify("Reactor online.", NotificationKind::Info, now);
        self.persist(now);
    }

    // ── Artifacts ──────────────────────────────────────────────────────

    /// Unlock the milestone artifact for a habit's category.
    pub fn unlock_artifact(&mut self, habit_id: &str, now: DateTime<Utc>) -> Option<String> {
        let Some(category) = self.habit(habit_id).map(|h| h.category) else {
            log::debug!("unlock_artifact: unknown habit {}", habit_id);
            return None;
        };
        let artifact = milestone_artifact(category, now, &mut self.rng);
        let id = self.grant_artifact(artifact, now);
        self.refresh_derived();
        self.persist(now);
        Some(id)
    }

    /// Emergency repair: destroy an artifact and refill the reactor to at
    /// least half of the new capacity.
    pub fn consume_artifact(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let Some(idx) = self.artifacts.iter().position(|a| a.id == id) else {
            log::debug!("consume_artifact: unknown id {}", id);
            return false;
        };
        // Owed decay still runs at the consumed artifact's rates.
        self.apply_decay(now);
        let artifact = self.artifacts.remove(idx);
        self.refresh_derived();
        let floor = self.reactor.max_capacity * energy::EMERGENCY_REPAIR_FRACTION;
        if self.reactor.current_energy < floor {
            self.reactor.set_energy(floor, self.reactor.max_capacity);
        }
        log::info!("artifact consumed for repair: {}", artifact.name);
        self.emit(Signal::ReactorPulse);
        self.notify(
            format!("{} consumed. Emergency repair complete.", artifact.name),
            NotificationKind::Warning,
            now,
        );
        self.persist(now);
        true
    }

    // ── Quests ─────────────────────────────────────────────────────────

    pub fn add_quest(&mut self, new_quest: NewQuest, now: DateTime<Utc>) -> String {
        let id = self.next_id();
        self.quests.push(new_quest.into_quest(id.clone()));
        self.emit(Signal::QuestCreated { id: id.clone() });
        self.persist(now);
        id
    }

    /// Force-complete an active quest and pay its reward once.
    pub fn complete_quest(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let Some(progress) = force_complete(&mut self.quests, id, now) else {
            log::debug!("complete_quest: {} is not active", id);
            return false;
        };
        self.reactor.add_energy(progress.energy);
        self.collect_quest_rewards(&progress, now);
        self.refresh_derived();
        if progress.exit_critical {
            self.reactor.override_critical();
        }
        self.persist(now);
        true
    }

    // ── Events ─────────────────────────────────────────────────────────

    pub fn spawn_event(&mut self, new_event: NewEvent, now: DateTime<Utc>) -> String {
        let id = self.next_id();
        self.events.push(new_event.into_event(id.clone()));
        self.emit(Signal::EventSpawned { id: id.clone() });
        self.persist(now);
        id
    }

    /// Claim an event's reward. Claimed, expired and unknown events are
    /// left untouched.
    pub fn claim_event(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let Some(event) = self.events.iter_mut().find(|e| e.id == id) else {
            log::debug!("claim_event: unknown id {}", id);
            return false;
        };
        if !event.is_claimable(now) {
            log::debug!("claim_event: {} not claimable", id);
            return false;
        }
        event.claimed = true;
        let reward = event.reward.clone();
        let name = event_definition(event.event_type).name;
        self.apply_decay(now);

        if let Some(amount) = reward.energy {
            self.reactor.add_energy(amount);
        }
        if let Some(progress) = reward.artifact_progress {
            self.artifact_progress += progress;
            if self.artifact_progress >= generation::FRAGMENTS_PER_ARTIFACT {
                self.artifact_progress -= generation::FRAGMENTS_PER_ARTIFACT;
                let artifact = fragment_artifact(now, &mut self.rng);
                self.grant_artifact(artifact, now);
            }
        }
        if let Some(hours) = reward.decay_pause {
            let until = Duration::try_milliseconds((hours * 3_600_000.0) as i64)
                .and_then(|pause| now.checked_add_signed(pause));
            match until {
                Some(until) => {
                    self.reactor.decay_paused_until =
                        Some(self.reactor.decay_paused_until.map_or(until, |p| p.max(until)));
                }
                None => log::warn!("claim_event: decay pause of {}h out of range, ignored", hours),
            }
        }
        if reward.buff == Some(EventBuff::Random) {
            let artifact = quantum_artifact(now, &mut self.rng);
            self.grant_artifact(artifact, now);
        }

        self.refresh_derived();
        log::info!("event claimed: {}", name);
        self.emit(Signal::EventClaimed { id: id.to_string() });
        self.notify(format!("{} captured.", name), NotificationKind::Success, now);
        self.persist(now);
        true
    }

    // ── Ethical settings ───────────────────────────────────────────────

    pub fn toggle_ethical_mode(&mut self, now: DateTime<Utc>) -> bool {
        self.ethical_settings.enabled = !self.ethical_settings.enabled;
        log::info!("ethical mode: {}", self.ethical_settings.enabled);
        self.persist(now);
        self.ethical_settings.enabled
    }

    pub fn toggle_session_override(&mut self, now: DateTime<Utc>) -> bool {
        self.ethical_settings.session_override = !self.ethical_settings.session_override;
        log::info!("session override: {}", self.ethical_settings.session_override);
        self.persist(now);
        self.ethical_settings.session_override
    }

    pub fn set_daily_cap(&mut self, cap: u32, now: DateTime<Utc>) {
        self.ethical_settings.daily_cap = cap;
        self.persist(now);
    }

    // ── Notifications and signals ──────────────────────────────────────

    pub fn add_notification(&mut self, message: impl Into<String>, kind: NotificationKind, now: DateTime<Utc>) -> String {
        self.notify(message, kind, now)
    }

    pub fn remove_notification(&mut self, id: &str) -> bool {
        self.notifications.remove(id)
    }

    pub fn prune_notifications(&mut self, now: DateTime<Utc>) {
        self.notifications.prune(now);
    }

    pub fn notifications(&self) -> &[Notification] {
        self.notifications.items()
    }

    /// Drain pending presentation signals.
    pub fn take_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    // ── Sync ───────────────────────────────────────────────────────────

    pub fn sync_payload(&self) -> SyncPayload {
        SyncPayload {
            habits: self.habits.clone(),
            artifacts: self.artifacts.clone(),
        }
    }

    /// Reconcile local habits with a remote habit list.
    pub fn merge_remote_habits(&mut self, remote: &[Habit], now: DateTime<Utc>) {
        self.habits = merge_habits(&self.habits, remote);
        self.refresh_derived();
        self.persist(now);
    }

    // ── Demo ───────────────────────────────────────────────────────────

    pub fn load_demo(&mut self, now: DateTime<Utc>) {
        let demo = demo_state(now);
        self.habits = demo.habits;
        self.artifacts = demo.artifacts;
        self.reactor = demo.reactor;
        self.quests.clear();
        self.events.clear();
        self.artifact_progress = 0.0;
        self.refresh_derived();
        log::info!("demo state loaded");
        self.persist(now);
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            habits: self.habits.clone(),
            artifacts: self.artifacts.clone(),
            reactor: self.reactor.clone(),
            quests: self.quests.clone(),
            events: self.events.clone(),
            ethical_settings: self.ethical_settings.clone(),
            artifact_progress: self.artifact_progress,
        }
    }

    pub fn get_oracle_analysis(&self, now: DateTime<Utc>) -> Option<OracleAnalysis> {
        analyze(&self.habits, now)
    }

    pub fn visual_state(&self) -> VisualState {
        derive_visual_state(&self.reactor, &self.artifacts, &self.habits)
    }

    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn reactor(&self) -> &ReactorState {
        &self.reactor
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn active_quests(&self, now: DateTime<Utc>) -> Vec<&Quest> {
        self.quests.iter().filter(|q| q.is_active(now)).collect()
    }

    pub fn events(&self) -> &[AsteroidEvent] {
        &self.events
    }

    pub fn active_events(&self, now: DateTime<Utc>) -> Vec<&AsteroidEvent> {
        self.events.iter().filter(|e| e.is_claimable(now)).collect()
    }

    pub fn ethical_settings(&self) -> &EthicalSettings {
        &self.ethical_settings
    }

    pub fn artifact_progress(&self) -> f64 {
        self.artifact_progress
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use chrono::TimeZone;
    use ignition_logic::model::{EventReward, EventType, HabitCategory, HabitFrequency};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    fn store() -> (CoreStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        let config = EngineConfig {
            auto_hibernate_when_idle: false,
            ..EngineConfig::default()
        };
        (CoreStore::new(config, storage.clone(), t0()), storage)
    }

    fn add(store: &mut CoreStore, name: &str, category: HabitCategory) -> String {
        store
            .add_habit(
                NewHabit {
                    name: name.into(),
                    category,
                    frequency: HabitFrequency::Daily,
                },
                t0(),
            )
            .unwrap()
    }

    #[test]
    fn test_blank_habit_name_is_ignored() {
        let (mut store, _) = store();
        let result = store.add_habit(
            NewHabit {
                name: "   ".into(),
                category: HabitCategory::Mental,
                frequency: HabitFrequency::Daily,
            },
            t0(),
        );
        assert!(result.is_none());
        assert!(store.habits().is_empty());
    }

    #[test]
    fn test_first_completion_adds_energy() {
        let (mut store, storage) = store();
        let id = add(&mut store, "Stretch", HabitCategory::Physical);
        let report = store.complete_habit(&id, t0()).unwrap();

        assert!((report.energy_gained - 11.0).abs() < 1e-9);
        assert_eq!(report.new_streak, 1);
        assert!((store.reactor().current_energy - 511.0).abs() < 1e-9);
        assert!(storage.data().is_some());
        let signals = store.take_signals();
        assert!(signals.contains(&Signal::ReactorPulse));
        assert!(store.take_signals().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let (mut store, _) = store();
        let before = store.snapshot();
        assert!(store.complete_habit("nope", t0()).is_none());
        assert!(!store.delete_habit("nope", t0()));
        assert!(!store.consume_artifact("nope", t0()));
        assert!(!store.complete_quest("nope", t0()));
        assert!(!store.claim_event("nope", t0()));
        assert!(store.unlock_artifact("nope", t0()).is_none());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_consume_artifact_refills_to_half() {
        let (mut store, _) = store();
        let id = add(&mut store, "Journal", HabitCategory::Mental);
        let artifact = store.unlock_artifact(&id, t0()).unwrap();
        assert_eq!(store.reactor().max_capacity, 1050.0);

        store.reactor.set_energy(100.0, 1050.0);
        assert!(store.consume_artifact(&artifact, t0()));
        assert_eq!(store.reactor().max_capacity, 1000.0);
        assert_eq!(store.reactor().current_energy, 500.0);
        assert!(store.artifacts().is_empty());
    }

    #[test]
    fn test_time_dilation_pauses_decay() {
        let (mut store, _) = store();
        let id = store.spawn_event(
            NewEvent {
                event_type: EventType::TimeDilation,
                reward: EventReward {
                    decay_pause: Some(12.0),
                    ..EventReward::default()
                },
                triggered_at: t0(),
                expires_at: t0() + Duration::seconds(30),
            },
            t0(),
        );
        assert!(store.claim_event(&id, t0()));

        store.tick_decay(t0() + Duration::hours(12));
        assert_eq!(store.reactor().current_energy, 500.0);

        store.tick_decay(t0() + Duration::hours(14));
        assert!((store.reactor().current_energy - 490.0).abs() < 1e-9);
        assert!(store.reactor().decay_paused_until.is_none());
    }

    #[test]
    fn test_fragments_assemble_an_artifact() {
        let (mut store, _) = store();
        for i in 0..4 {
            let id = store.spawn_event(
                NewEvent {
                    event_type: EventType::ArtifactFragment,
                    reward: EventReward {
                        artifact_progress: Some(0.33),
                        ..EventReward::default()
                    },
                    triggered_at: t0(),
                    expires_at: t0() + Duration::seconds(45),
                },
                t0(),
            );
            assert!(store.claim_event(&id, t0()));
            let expected = if i < 3 { 0 } else { 1 };
            assert_eq!(store.artifacts().len(), expected);
        }
        assert!((store.artifact_progress() - 0.32).abs() < 1e-9);
    }

    #[test]
    fn test_manual_hibernation_survives_completion() {
        let (mut store, _) = store();
        let id = add(&mut store, "Sketch", HabitCategory::Creative);
        store.enter_hibernation(t0());
        let report = store.complete_habit(&id, t0()).unwrap();
        assert!(!report.awakened);
        assert!(store.reactor().is_hibernating);

        store.exit_hibernation(t0() + Duration::hours(5));
        assert!(!store.reactor().is_hibernating);
        assert_eq!(store.reactor().last_decay_update, t0() + Duration::hours(5));
    }

    #[test]
    fn test_scheduler_drives_update() {
        let (mut store, _) = store();
        assert!(store.update(t0() + Duration::minutes(5)).is_none());
        store.start_ticker(t0());
        assert!(store.update(t0() + Duration::seconds(30)).is_none());
        assert!(store.update(t0() + Duration::seconds(60)).is_some());
        store.stop_ticker();
        assert!(!store.ticker_running());
    }

    #[test]
    fn test_completion_settles_decay_first() {
        let later = t0() + Duration::hours(10);
        let run = |tick_first: bool| {
            let (mut store, _) = store();
            let id = add(&mut store, "Row", HabitCategory::Physical);
            store.reactor.set_energy(990.0, 1000.0);
            assert!(store.reactor().is_overdrive);
            if tick_first {
                store.tick_decay(later);
            }
            let report = store.complete_habit(&id, later).unwrap();
            store.tick_decay(later);
            (report.energy_gained, store.reactor().current_energy)
        };

        let (gain, energy) = run(false);
        assert_eq!((gain, energy), run(true));
        assert!((gain - 11.0).abs() < 1e-9);
        assert!((energy - 951.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_expires_notifications_between_ticks() {
        let (mut store, _) = store();
        store.start_ticker(t0());
        store.add_notification("Saved", NotificationKind::Success, t0());
        assert_eq!(store.notifications().len(), 1);

        assert!(store.update(t0() + Duration::seconds(30)).is_none());
        assert!(store.notifications().is_empty());
    }

    #[test]
    fn test_oversized_decay_pause_is_ignored() {
        let (mut store, _) = store();
        let id = store.spawn_event(
            NewEvent {
                event_type: EventType::TimeDilation,
                reward: EventReward {
                    decay_pause: Some(f64::MAX),
                    ..EventReward::default()
                },
                triggered_at: t0(),
                expires_at: t0() + Duration::seconds(30),
            },
            t0(),
        );
        assert!(store.claim_event(&id, t0()));
        assert!(store.reactor().decay_paused_until.is_none());
    }

    #[test]
    fn test_persist_failure_becomes_notification() {
        let (mut store, storage) = store();
        storage.set_fail_writes(true);
        add(&mut store, "Walk", HabitCategory::Physical);
        assert_eq!(store.habits().len(), 1);
        assert!(store
            .notifications()
            .iter()
            .any(|n| n.kind == NotificationKind::Error));
    }
}
