// Sequencer - patterns, lookahead scheduling and transport

pub mod bank;
pub mod clock;
pub mod instrument;
pub mod live_edit;
pub mod pattern;
pub mod scheduler;
pub mod snapshot;
pub mod transport;
pub mod trigger;

pub use bank::{BankSet, NUM_BANKS, PatternStore};
pub use clock::{AudioClock, Clock, ManualClock};
pub use instrument::Instrument;
pub use live_edit::LiveEditController;
pub use pattern::{AccentPattern, Pattern, STEPS, StepIndex, StepRow};
pub use scheduler::{PlayCursor, Scheduler, SchedulerConfig, SchedulerHandle};
pub use snapshot::SequencerSnapshot;
pub use transport::{
    AudioLink, OutputPorts, TransportController, TransportError, TransportParams, TransportState,
};
pub use trigger::{TriggerEvent, TriggerLog, TriggerSink};
