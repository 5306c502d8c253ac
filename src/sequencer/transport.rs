// Transport - start/stop state machine and owner of all sequencer state
//
// The UI thread owns the TransportController. Every edit goes through it,
// and it republishes an immutable snapshot for the scheduler thread after
// each change.

use super::bank::{NUM_BANKS, PatternStore};
use super::clock::Clock;
use super::instrument::Instrument;
use super::live_edit::{LiveEditController, Playback};
use super::pattern::{Pattern, StepIndex};
use super::scheduler::{PlayCursor, SchedulerConfig, SchedulerError, SchedulerHandle};
use super::snapshot::SequencerSnapshot;
use super::trigger::TriggerSink;
use crate::audio::level::MasterLevel;
use crate::audio::status::{AtomicDeviceStatus, DeviceStatus};
use crate::persistence::{SnapshotStore, StateSnapshot};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

pub const BPM_MIN: u32 = 60;
pub const BPM_MAX: u32 = 200;
pub const DEFAULT_BPM: u32 = 120;
pub const SWING_MAX: u32 = 75;
pub const SWING_STEP: u32 = 5;
pub const DEFAULT_MASTER_LEVEL: f32 = 0.9;

/// Clamp a requested tempo into the supported range
pub fn clamp_bpm(bpm: i64) -> u32 {
    bpm.clamp(BPM_MIN as i64, BPM_MAX as i64) as u32
}

/// Clamp swing to 0..=75 and snap to the nearest multiple of 5
pub fn clamp_swing(swing: i64) -> u32 {
    let swing = swing.clamp(0, SWING_MAX as i64) as u32;
    (swing + SWING_STEP / 2) / SWING_STEP * SWING_STEP
}

/// Clamp a level to 0.0..=1.0 (None for NaN or infinity)
pub fn clamp_level(level: f32) -> Option<f32> {
    level.is_finite().then(|| level.clamp(0.0, 1.0))
}

/// User-editable transport parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportParams {
    pub bpm: u32,
    pub swing_percent: u32,
    pub master_level: f32,
    pub current_bank: usize,
}

impl Default for TransportParams {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            swing_percent: 0,
            master_level: DEFAULT_MASTER_LEVEL,
            current_bank: 0,
        }
    }
}

/// Transport feedback for the UI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub bpm: u32,
    pub swing_percent: u32,
    pub master_level: f32,
    pub current_bank: usize,
    pub is_running: bool,
    /// Last step handed to the synthesizer since start
    pub current_step: Option<StepIndex>,
}

const NO_STEP: i32 = -1;

/// State written by the scheduler thread and read by the UI
#[derive(Debug)]
pub struct SharedTransportState {
    running: AtomicBool,
    current_step: AtomicI32,
    cursor: ArcSwap<PlayCursor>,
}

impl SharedTransportState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn current_step(&self) -> Option<StepIndex> {
        let step = self.current_step.load(Ordering::Acquire);
        (step >= 0).then_some(step as StepIndex)
    }

    pub fn set_current_step(&self, step: Option<StepIndex>) {
        let value = step.map_or(NO_STEP, |s| s as i32);
        self.current_step.store(value, Ordering::Release);
    }

    pub fn cursor(&self) -> PlayCursor {
        **self.cursor.load()
    }

    pub fn publish_cursor(&self, cursor: PlayCursor) {
        self.cursor.store(Arc::new(cursor));
    }
}

impl Default for SharedTransportState {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(false),
            current_step: AtomicI32::new(NO_STEP),
            cursor: ArcSwap::from_pointee(PlayCursor::default()),
        }
    }
}

/// Endpoints of a working audio output
pub struct OutputPorts {
    pub clock: Arc<dyn Clock>,
    pub status: AtomicDeviceStatus,
    pub master_level: MasterLevel,
    /// Receives triggers from the scheduler thread
    pub scheduled: Box<dyn TriggerSink>,
    /// Receives live-edit previews from the UI thread
    pub preview: Box<dyn TriggerSink>,
}

/// Audio output as seen by the transport
pub enum AudioLink {
    Connected(OutputPorts),
    /// No device; carries the reason shown to the user
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Audio output unavailable: {0}")]
    AudioUnavailable(String),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

enum Output {
    Connected {
        clock: Arc<dyn Clock>,
        status: AtomicDeviceStatus,
        master_level: MasterLevel,
        scheduler: SchedulerHandle,
    },
    Unavailable(String),
}

/// Owner of patterns and transport parameters
///
/// Every method is a user intent. Out-of-range values are clamped, invalid
/// addresses are ignored, and only `start` can fail.
pub struct TransportController {
    store: PatternStore,
    params: TransportParams,
    shared: Arc<SharedTransportState>,
    snapshot: Arc<ArcSwap<SequencerSnapshot>>,
    live_edit: LiveEditController,
    output: Output,
    dirty: bool,
}

impl TransportController {
    pub fn new(
        store: PatternStore,
        params: TransportParams,
        link: AudioLink,
        config: SchedulerConfig,
    ) -> Self {
        let params = TransportParams {
            bpm: clamp_bpm(params.bpm as i64),
            swing_percent: clamp_swing(params.swing_percent as i64),
            master_level: clamp_level(params.master_level).unwrap_or(DEFAULT_MASTER_LEVEL),
            current_bank: if params.current_bank < NUM_BANKS {
                params.current_bank
            } else {
                0
            },
        };

        let shared = SharedTransportState::new();
        let snapshot = Arc::new(ArcSwap::from_pointee(SequencerSnapshot::capture(
            &store, &params,
        )));

        let (live_edit, output) = match link {
            AudioLink::Connected(ports) => {
                ports.master_level.set(params.master_level);
                let scheduler = SchedulerHandle::new(
                    config,
                    Arc::clone(&ports.clock),
                    Arc::clone(&snapshot),
                    Arc::clone(&shared),
                    ports.scheduled,
                );
                (
                    LiveEditController::new(ports.preview),
                    Output::Connected {
                        clock: ports.clock,
                        status: ports.status,
                        master_level: ports.master_level,
                        scheduler,
                    },
                )
            }
            AudioLink::Unavailable(reason) => {
                (LiveEditController::disconnected(), Output::Unavailable(reason))
            }
        };

        Self {
            store,
            params,
            shared,
            snapshot,
            live_edit,
            output,
            dirty: false,
        }
    }

    /// Build from a persisted snapshot, or from defaults when there is none
    pub fn restore(
        saved: Option<StateSnapshot>,
        link: AudioLink,
        config: SchedulerConfig,
    ) -> Self {
        let (store, params) = saved.map(StateSnapshot::into_parts).unwrap_or_default();
        Self::new(store, params, link, config)
    }

    /// Start playback from step 0 (no-op while running)
    pub fn start(&mut self) -> Result<(), TransportError> {
        match &mut self.output {
            Output::Unavailable(reason) => Err(TransportError::AudioUnavailable(reason.clone())),
            Output::Connected {
                status, scheduler, ..
            } => {
                if status.get() == DeviceStatus::Error {
                    return Err(TransportError::AudioUnavailable(
                        "audio stream reported an error".to_string(),
                    ));
                }
                if scheduler.is_running() {
                    return Ok(());
                }
                scheduler.start()?;
                self.shared.set_running(true);
                log::info!("Transport started at {} BPM", self.params.bpm);
                Ok(())
            }
        }
    }

    /// Stop playback; already committed triggers still sound
    pub fn stop(&mut self) {
        if let Output::Connected { scheduler, .. } = &mut self.output {
            scheduler.stop();
        }
        let was_running = self.shared.is_running();
        self.shared.set_running(false);
        self.shared.set_current_step(None);
        if was_running {
            log::info!("Transport stopped");
        }
    }

    /// Start when stopped, stop when running
    pub fn toggle_playback(&mut self) -> Result<(), TransportError> {
        if self.is_running() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn set_bpm(&mut self, bpm: i64) {
        let bpm = clamp_bpm(bpm);
        if bpm != self.params.bpm {
            self.params.bpm = bpm;
            self.commit();
        }
    }

    pub fn set_swing(&mut self, swing: i64) {
        let swing = clamp_swing(swing);
        if swing != self.params.swing_percent {
            self.params.swing_percent = swing;
            self.commit();
        }
    }

    pub fn set_master_level(&mut self, level: f32) {
        let Some(level) = clamp_level(level) else {
            return;
        };
        if let Output::Connected { master_level, .. } = &self.output {
            master_level.set(level);
        }
        if level != self.params.master_level {
            self.params.master_level = level;
            self.dirty = true;
        }
    }

    /// Switch bank; rejected while running or out of range
    pub fn select_bank(&mut self, bank: usize) -> bool {
        if self.is_running() || bank >= NUM_BANKS {
            return false;
        }
        if bank != self.params.current_bank {
            self.params.current_bank = bank;
            self.commit();
        }
        true
    }

    pub fn clear_row(&mut self, instrument: Instrument) {
        self.store.clear_row(self.params.current_bank, instrument);
        self.commit();
    }

    /// Clear the current bank and the accent row
    pub fn clear_bank(&mut self) {
        self.store.clear_bank(self.params.current_bank);
        self.commit();
    }

    /// Flip a pad of the current bank, previewing it when it turns on mid-bar
    pub fn toggle_pad(&mut self, instrument: Instrument, step: StepIndex) -> Option<bool> {
        let playback = self.playback();
        let on = self.live_edit.toggle_pad(
            &mut self.store,
            self.params.current_bank,
            instrument,
            step,
            playback,
        )?;
        self.commit();
        Some(on)
    }

    pub fn toggle_accent(&mut self, step: StepIndex) -> Option<bool> {
        let on = self.live_edit.toggle_accent(&mut self.store, step)?;
        self.commit();
        Some(on)
    }

    /// Keyboard record: flip the instrument at the step that is sounding
    pub fn record_hit(&mut self, instrument: Instrument) -> Option<StepIndex> {
        let step = self.live_edit.record_hit(
            &mut self.store,
            self.params.current_bank,
            instrument,
            self.shared.current_step(),
        )?;
        self.commit();
        Some(step)
    }

    pub fn state(&self) -> TransportState {
        TransportState {
            bpm: self.params.bpm,
            swing_percent: self.params.swing_percent,
            master_level: self.params.master_level,
            current_bank: self.params.current_bank,
            is_running: self.is_running(),
            current_step: self.shared.current_step(),
        }
    }

    pub fn params(&self) -> &TransportParams {
        &self.params
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn current_pattern(&self) -> Pattern {
        self.store
            .bank(self.params.current_bank)
            .copied()
            .unwrap_or_default()
    }

    pub fn audio_status(&self) -> DeviceStatus {
        match &self.output {
            Output::Connected { status, .. } => status.get(),
            Output::Unavailable(_) => DeviceStatus::Error,
        }
    }

    /// Snapshot of everything worth persisting
    pub fn to_snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.store, &self.params)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Save if anything changed since the last save
    ///
    /// Failures are logged and dropped; the next edit tries again.
    pub fn persist_if_dirty(&mut self, store: &dyn SnapshotStore) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        match store.save_snapshot(&self.to_snapshot()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not save state: {}", e);
                false
            }
        }
    }

    fn playback(&self) -> Option<Playback> {
        match &self.output {
            Output::Connected { clock, .. } if self.is_running() => Some(Playback {
                cursor: self.shared.cursor(),
                bpm: self.params.bpm as f64,
                now: clock.now(),
            }),
            _ => None,
        }
    }

    /// Republish the scheduler snapshot and mark state for saving
    fn commit(&mut self) {
        self.snapshot
            .store(Arc::new(SequencerSnapshot::capture(&self.store, &self.params)));
        self.dirty = true;
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        self.stop();
    }
}
