// Scheduler - lookahead timing loop turning pattern steps into timed triggers
//
// A coarse timer (every `lookahead_interval`) commits every step whose time
// falls inside a short horizon (`schedule_ahead_secs`). Triggers carry
// absolute clock times, so jitter of the timer thread never reaches the
// audio: only the horizon has to be longer than the worst wake-up delay.

use super::clock::Clock;
use super::pattern::{STEPS, StepIndex};
use super::snapshot::SequencerSnapshot;
use super::transport::SharedTransportState;
use super::trigger::{TriggerEvent, TriggerSink};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Timing constants of the lookahead loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Wake-up cadence of the timing thread
    pub lookahead_interval: Duration,
    /// Steps earlier than `now + schedule_ahead_secs` get committed
    pub schedule_ahead_secs: f64,
    /// Delay between start and the first downbeat
    pub start_offset_secs: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead_interval: Duration::from_millis(25),
            schedule_ahead_secs: 0.1,
            start_offset_secs: 0.05,
        }
    }
}

/// Length of one sixteenth note in seconds
#[inline]
pub fn step_duration(bpm: f64) -> f64 {
    60.0 / bpm / 4.0
}

/// Delay applied to odd steps
///
/// At 100% swing an odd step would sit halfway to the next even step; the
/// UI caps swing at 75%.
#[inline]
pub fn swing_offset(step: StepIndex, swing_percent: u32, step_duration: f64) -> f64 {
    if step % 2 == 1 && swing_percent > 0 {
        swing_percent as f64 / 100.0 * step_duration * 0.5
    } else {
        0.0
    }
}

/// Position of the scheduler on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayCursor {
    /// Unswung clock time of the next step to schedule
    pub next_trigger_time: f64,
    /// Step that will be scheduled next
    pub play_index: StepIndex,
}

/// Lookahead scheduling core
///
/// Pure state machine: the caller provides the time and the pattern, which
/// makes every pass deterministic.
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    cursor: PlayCursor,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            cursor: PlayCursor::default(),
        }
    }

    /// Rewind to step 0, first downbeat shortly after `now`
    pub fn start(&mut self, now: f64) {
        self.cursor = PlayCursor {
            next_trigger_time: now + self.config.start_offset_secs,
            play_index: 0,
        };
    }

    pub fn cursor(&self) -> PlayCursor {
        self.cursor
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Commit every step due before `now + schedule_ahead_secs`
    ///
    /// Triggers of one step share a timestamp and are emitted in catalog
    /// order. Returns the last step committed, if any.
    pub fn run_pass(
        &mut self,
        now: f64,
        snapshot: &SequencerSnapshot,
        sink: &mut dyn TriggerSink,
    ) -> Option<StepIndex> {
        let horizon = now + self.config.schedule_ahead_secs;
        let step_len = snapshot.step_duration();
        let mut last = None;

        // A zero, negative or NaN tempo would never advance the cursor
        if !(step_len.is_finite() && step_len > 0.0) {
            return None;
        }

        while self.cursor.next_trigger_time < horizon {
            let step = self.cursor.play_index;
            let play_time =
                self.cursor.next_trigger_time + swing_offset(step, snapshot.swing_percent, step_len);
            let accented = snapshot.accents.get(step);

            for instrument in snapshot.pattern.instruments_at(step) {
                sink.trigger(TriggerEvent::new(instrument, play_time, accented));
            }

            last = Some(step);
            self.cursor.next_trigger_time += step_len;
            self.cursor.play_index = (step + 1) % STEPS;
        }

        last
    }
}

/// Scheduler running on its own timing thread
///
/// Owns the trigger sink between runs. `start` spawns the thread, `stop`
/// joins it; triggers already handed to the sink are never retracted.
pub struct SchedulerHandle {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    snapshot: Arc<ArcSwap<SequencerSnapshot>>,
    shared: Arc<SharedTransportState>,
    sink: Arc<Mutex<Box<dyn TriggerSink>>>,
    worker: Option<Worker>,
}

struct Worker {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SchedulerHandle {
    pub fn new(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        snapshot: Arc<ArcSwap<SequencerSnapshot>>,
        shared: Arc<SharedTransportState>,
        sink: Box<dyn TriggerSink>,
    ) -> Self {
        Self {
            config,
            clock,
            snapshot,
            shared,
            sink: Arc::new(Mutex::new(sink)),
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Reset the timeline and begin polling (no-op while running)
    ///
    /// The cursor is published before the thread starts, so live edits see a
    /// valid timeline as soon as this returns.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let mut scheduler = Scheduler::new(self.config);
        scheduler.start(self.clock.now());
        self.shared.publish_cursor(scheduler.cursor());
        self.shared.set_current_step(None);

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let clock = Arc::clone(&self.clock);
        let snapshot = Arc::clone(&self.snapshot);
        let shared = Arc::clone(&self.shared);
        let sink = Arc::clone(&self.sink);
        let interval = self.config.lookahead_interval;

        let thread = thread::Builder::new()
            .name("dr16-scheduler".to_string())
            .spawn(move || {
                let Ok(mut sink) = sink.lock() else {
                    log::error!("Trigger sink poisoned, scheduler not started");
                    return;
                };

                loop {
                    thread::park_timeout(interval);
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }

                    let current = snapshot.load();
                    if let Some(step) = scheduler.run_pass(clock.now(), &current, &mut **sink) {
                        shared.set_current_step(Some(step));
                        shared.publish_cursor(scheduler.cursor());
                    }
                }
            })?;

        log::debug!("Scheduler thread started");
        self.worker = Some(Worker { stop, thread });
        Ok(())
    }

    /// Halt polling and clear the sounding step
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            worker.thread.thread().unpark();
            if worker.thread.join().is_err() {
                log::error!("Scheduler thread panicked");
            }
            log::debug!("Scheduler thread stopped");
        }
        self.shared.set_current_step(None);
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::bank::PatternStore;
    use crate::sequencer::instrument::Instrument;
    use crate::sequencer::transport::TransportParams;
    use crate::sequencer::trigger::TriggerLog;

    const EPS: f64 = 1e-9;

    fn snapshot_with(store: &PatternStore, bpm: u32, swing: u32) -> SequencerSnapshot {
        let params = TransportParams {
            bpm,
            swing_percent: swing,
            ..TransportParams::default()
        };
        SequencerSnapshot::capture(store, &params)
    }

    #[test]
    fn test_step_duration() {
        assert!((step_duration(120.0) - 0.125).abs() < EPS);
        assert!((step_duration(60.0) - 0.25).abs() < EPS);
        assert!((step_duration(200.0) - 0.075).abs() < EPS);
    }

    #[test]
    fn test_swing_only_delays_odd_steps() {
        assert_eq!(swing_offset(0, 50, 0.125), 0.0);
        assert_eq!(swing_offset(2, 75, 0.125), 0.0);
        assert!((swing_offset(1, 50, 0.125) - 0.03125).abs() < EPS);
        assert_eq!(swing_offset(3, 0, 0.125), 0.0);
    }

    #[test]
    fn test_start_sets_offset_and_rewinds() {
        let mut scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.start(2.0);
        assert_eq!(scheduler.cursor().play_index, 0);
        assert!((scheduler.cursor().next_trigger_time - 2.05).abs() < EPS);
    }

    #[test]
    fn test_pass_commits_only_inside_horizon() {
        let mut store = PatternStore::new();
        for step in 0..STEPS {
            store.toggle_pad(0, Instrument::Hat, step);
        }
        let snapshot = snapshot_with(&store, 120, 0);
        let mut log = TriggerLog::new();
        let mut scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.start(0.0);

        // Horizon 0.1: only the step at 0.05 fits
        assert_eq!(scheduler.run_pass(0.0, &snapshot, &mut log), Some(0));
        assert_eq!(log.len(), 1);

        // Nothing new until the horizon passes 0.175
        assert_eq!(scheduler.run_pass(0.07, &snapshot, &mut log), None);
        assert_eq!(scheduler.run_pass(0.08, &snapshot, &mut log), Some(1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_same_step_triggers_share_time_in_catalog_order() {
        let mut store = PatternStore::new();
        store.toggle_pad(0, Instrument::Ride, 0);
        store.toggle_pad(0, Instrument::Kick, 0);
        store.toggle_pad(0, Instrument::Hat, 0);
        store.toggle_accent(0);
        let snapshot = snapshot_with(&store, 120, 0);

        let mut log = TriggerLog::new();
        let mut scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.start(0.0);
        scheduler.run_pass(0.0, &snapshot, &mut log);

        let events = log.events();
        let order: Vec<_> = events.iter().map(|e| e.instrument).collect();
        assert_eq!(order, vec![Instrument::Kick, Instrument::Hat, Instrument::Ride]);
        assert!(events.iter().all(|e| (e.when - 0.05).abs() < EPS && e.accented));
    }

    #[test]
    fn test_play_index_wraps() {
        let snapshot = SequencerSnapshot::default();
        let mut log = TriggerLog::new();
        let mut scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.start(0.0);

        // 2.05 seconds at 120 BPM covers steps 0..=16
        let last = scheduler.run_pass(2.0, &snapshot, &mut log);
        assert_eq!(last, Some(0));
        assert_eq!(scheduler.cursor().play_index, 1);
    }

    #[test]
    fn test_unusable_tempo_commits_nothing() {
        let mut store = PatternStore::new();
        store.toggle_pad(0, Instrument::Kick, 0);
        let mut log = TriggerLog::new();
        let mut scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.start(0.0);

        for bpm in [0.0, -120.0, f64::NAN, f64::INFINITY] {
            let snapshot = SequencerSnapshot {
                bpm,
                ..snapshot_with(&store, 120, 0)
            };
            assert_eq!(scheduler.run_pass(1.0, &snapshot, &mut log), None);
        }
        assert!(log.is_empty());
        assert_eq!(scheduler.cursor().play_index, 0);

        // A valid tempo picks up where the cursor was left
        let last = scheduler.run_pass(0.0, &snapshot_with(&store, 120, 0), &mut log);
        assert_eq!(last, Some(0));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_handle_start_is_idempotent_and_stop_clears_step() {
        use crate::sequencer::clock::ManualClock;

        let config = SchedulerConfig {
            lookahead_interval: Duration::from_secs(60),
            ..SchedulerConfig::default()
        };
        let clock = ManualClock::new(1.0);
        let snapshot = Arc::new(ArcSwap::from_pointee(SequencerSnapshot::default()));
        let shared = SharedTransportState::new();
        let mut handle = SchedulerHandle::new(
            config,
            Arc::new(clock.clone()),
            snapshot,
            Arc::clone(&shared),
            Box::new(TriggerLog::new()),
        );

        handle.start().unwrap();
        let first = shared.cursor();
        assert!((first.next_trigger_time - 1.05).abs() < EPS);

        clock.set(5.0);
        handle.start().unwrap();
        assert_eq!(shared.cursor(), first);
        assert!(handle.is_running());

        shared.set_current_step(Some(3));
        handle.stop();
        assert!(!handle.is_running());
        assert_eq!(shared.current_step(), None);
    }
}
