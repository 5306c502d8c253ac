// DR-16 - Library exports for tests and benchmarks

pub mod audio;
pub mod config;
pub mod messaging;
pub mod persistence;
pub mod sequencer;
pub mod synth;
pub mod ui;

// Re-export commonly used types for convenience
pub use audio::engine::{AudioEngine, AudioError, Renderer};
pub use audio::timing::AudioTiming;
pub use messaging::channels::{create_notification_channel, create_trigger_channel};
pub use persistence::{JsonFileStore, MemoryStore, PersistenceError, SnapshotStore, StateSnapshot};
pub use sequencer::{
    AudioLink, Clock, Instrument, ManualClock, OutputPorts, Pattern, PatternStore, Scheduler,
    SchedulerConfig, TransportController, TransportError, TransportParams, TransportState,
    TriggerEvent, TriggerLog, TriggerSink,
};
pub use synth::voice_manager::VoiceManager;
