use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dr16::audio::level::MasterLevel;
use dr16::audio::timing::AudioTiming;
use dr16::sequencer::snapshot::SequencerSnapshot;
use dr16::synth::voice::DrumVoice;
use dr16::{
    Instrument, PatternStore, Renderer, Scheduler, SchedulerConfig, TransportParams, TriggerEvent,
    TriggerSink, VoiceManager, create_trigger_channel,
};

/// Every pad of bank 0 on, every step accented
fn full_pattern() -> PatternStore {
    let mut store = PatternStore::new();
    for instrument in Instrument::ALL {
        for step in 0..16 {
            store.toggle_pad(0, instrument, step);
        }
    }
    for step in 0..16 {
        store.toggle_accent(step);
    }
    store
}

/// Sink that only counts, so the bench measures the scheduler itself
struct CountingSink(usize);

impl TriggerSink for CountingSink {
    fn trigger(&mut self, event: TriggerEvent) {
        black_box(event);
        self.0 += 1;
    }
}

/// One bar of lookahead passes at 25ms wakes
fn bench_scheduler_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");
    let store = full_pattern();

    for bpm in [60u32, 120, 200] {
        let params = TransportParams {
            bpm,
            swing_percent: 50,
            ..TransportParams::default()
        };
        let snapshot = SequencerSnapshot::capture(&store, &params);

        group.bench_with_input(BenchmarkId::new("bar", bpm), &snapshot, |b, snapshot| {
            b.iter(|| {
                let mut scheduler = Scheduler::new(SchedulerConfig::default());
                let mut sink = CountingSink(0);
                scheduler.start(0.0);
                let bar = snapshot.step_duration() * 16.0;
                let mut now = 0.0;
                while now < bar {
                    now += 0.025;
                    scheduler.run_pass(now, snapshot, &mut sink);
                }
                black_box(sink.0)
            });
        });
    }
    group.finish();
}

/// Drum voices are the per-sample cost in the callback
fn bench_drum_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("drum_voice");
    let sample_rate = 48000.0;
    let buffer_size = 512;

    for instrument in Instrument::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(instrument.id()),
            &buffer_size,
            |b, &size| {
                let mut voice = DrumVoice::new(sample_rate);
                b.iter(|| {
                    voice.trigger(instrument, true, 0);
                    for _ in 0..size {
                        black_box(voice.next_sample());
                    }
                });
            },
        );
    }
    group.finish();
}

/// Full kit hit at once, the worst step a pattern can produce
fn bench_voice_manager(c: &mut Criterion) {
    let sample_rate = 48000.0;
    let buffer_size = 512;

    c.bench_function("voice_manager_full_kit", |b| {
        let mut voices = VoiceManager::new(sample_rate);
        b.iter(|| {
            for instrument in Instrument::ALL {
                voices.trigger(instrument, true);
            }
            for _ in 0..buffer_size {
                black_box(voices.next_sample());
            }
        });
    });
}

/// Renderer callback with triggers arriving through the queue
fn bench_renderer(c: &mut Criterion) {
    let sample_rate = 48000.0;
    let buffer_frames = 512;

    c.bench_function("renderer_stereo_buffer", |b| {
        let (mut scheduled_tx, scheduled_rx) = create_trigger_channel(256);
        let (_preview_tx, preview_rx) = create_trigger_channel(16);
        let timing = AudioTiming::new(sample_rate);
        let mut renderer =
            Renderer::new(scheduled_rx, preview_rx, timing.clone(), MasterLevel::new(0.9));
        let mut buffer = vec![0.0f32; buffer_frames * 2];

        b.iter(|| {
            let now = timing.seconds();
            scheduled_tx.trigger(TriggerEvent::new(Instrument::Kick, now, true));
            scheduled_tx.trigger(TriggerEvent::new(Instrument::Hat, now + 0.005, false));
            renderer.render(&mut buffer, 2);
            black_box(&buffer);
        });
    });
}

criterion_group!(
    benches,
    bench_scheduler_pass,
    bench_drum_voices,
    bench_voice_manager,
    bench_renderer
);
criterion_main!(benches);
