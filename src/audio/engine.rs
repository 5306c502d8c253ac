// Audio engine - CPAL output stream and real-time callback
//
// # Format Support
//
// The device's preferred sample format is detected with `sample_format()`:
// - **F32**: native, no conversion
// - **I16**: common on Windows/WASAPI
// - **U16**: rare
//
// Everything is rendered in f32 and converted while writing the output
// frame (see `write_mono_to_interleaved_frame`).
//
// # Timing
//
// The callback advances `AudioTiming` by the number of frames it rendered.
// That counter is the sequencer's clock, so trigger times and the audio
// output share one clock domain and a trigger lands on an exact frame.
//
// # Stream Limitations
//
// On macOS (CoreAudio) the Stream is neither Send nor Sync, so the engine
// stays on the main thread. The error callback flags the device status and
// notifies the UI; there is no automatic reconnection.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

use crate::audio::format_conversion::{write_mono_to_interleaved_frame, write_silence};
use crate::audio::level::MasterLevel;
use crate::audio::master_bus::MasterBus;
use crate::audio::status::{AtomicDeviceStatus, DeviceStatus};
use crate::audio::timing::AudioTiming;
use crate::messaging::channels::{NotificationProducer, TriggerConsumer};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::sequencer::clock::AudioClock;
use crate::sequencer::transport::DEFAULT_MASTER_LEVEL;
use crate::synth::voice_manager::VoiceManager;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Audio configuration error: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Unsupported sample format: {0:?}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(SampleFormat),

    #[error("Error in stream creation: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Error starting stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Callback-side state: trigger queues, voices and master gain
///
/// Owned by the stream callback; nothing here locks or allocates after
/// construction.
pub struct Renderer {
    scheduled_rx: TriggerConsumer,
    preview_rx: TriggerConsumer,
    voices: VoiceManager,
    timing: AudioTiming,
    master: MasterBus,
}

impl Renderer {
    pub fn new(
        scheduled_rx: TriggerConsumer,
        preview_rx: TriggerConsumer,
        timing: AudioTiming,
        volume: MasterLevel,
    ) -> Self {
        let sample_rate = timing.sample_rate();
        Self {
            scheduled_rx,
            preview_rx,
            voices: VoiceManager::new(sample_rate),
            master: MasterBus::new(volume, sample_rate),
            timing,
        }
    }

    /// Move queued triggers into the voice manager's start queue
    fn drain_triggers(&mut self) {
        while let Some(event) = ringbuf::traits::Consumer::try_pop(&mut self.scheduled_rx) {
            let start = self.timing.seconds_to_samples(event.when);
            self.voices.schedule(start, event.instrument, event.accented);
        }
        while let Some(event) = ringbuf::traits::Consumer::try_pop(&mut self.preview_rx) {
            let start = self.timing.seconds_to_samples(event.when);
            self.voices.schedule(start, event.instrument, event.accented);
        }
    }

    /// Render one interleaved buffer and advance the clock
    pub fn render<T>(&mut self, data: &mut [T], channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        // ========== SACRED ZONE ==========
        // No allocations, No I/O, No blocking locks
        if channels == 0 {
            write_silence(data);
            return;
        }

        self.drain_triggers();

        let buffer_start = self.timing.current_sample();
        let mut frames = 0;
        for (i, frame) in data.chunks_mut(channels).enumerate() {
            let mix = self.voices.process_frame(buffer_start + i as u64);
            let sample = self.master.process(mix);

            write_mono_to_interleaved_frame(sample, frame);
            frames += 1;
        }

        self.timing.advance(frames);
        // ========== SACRED ZONE END ==========
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.active_voice_count()
    }
}

pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: f32,
    pub volume: MasterLevel,
    pub status: AtomicDeviceStatus,
    pub timing: AudioTiming,
}

impl AudioEngine {
    pub fn new(
        scheduled_rx: TriggerConsumer,
        preview_rx: TriggerConsumer,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        log::debug!("Audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let volume = MasterLevel::new(DEFAULT_MASTER_LEVEL);
        let timing = AudioTiming::new(sample_rate);
        let status = AtomicDeviceStatus::new(DeviceStatus::Connecting);

        let renderer = Renderer::new(scheduled_rx, preview_rx, timing.clone(), volume.clone());

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                renderer,
                status.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                renderer,
                status.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                renderer,
                status.clone(),
                notification_tx.clone(),
            ),
            other => return Err(AudioError::UnsupportedFormat(other)),
        }?;

        stream.play()?;
        status.set(DeviceStatus::Connected);

        crate::messaging::notification::notify(
            &notification_tx,
            Notification::info(
                NotificationCategory::Audio,
                format!("Audio connected: {} Hz, {} channels", sample_rate, channels),
            ),
        );

        Ok(Self {
            _device: device,
            _stream: stream,
            sample_rate,
            volume,
            status,
            timing,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Sequencer clock running on this device's frame counter
    pub fn clock(&self) -> AudioClock {
        AudioClock::new(self.timing.clone())
    }

    /// Build an output stream for any supported sample type
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut renderer: Renderer,
        status: AtomicDeviceStatus,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                renderer.render(data, channels);
            },
            move |err| {
                // ========== ERROR CALLBACK ==========
                // Runs outside the audio callback, I/O is fine here
                status.set(DeviceStatus::Error);
                crate::messaging::notification::notify(
                    &notification_tx,
                    Notification::error(
                        NotificationCategory::Audio,
                        format!("Audio stream error: {}", err),
                    ),
                );
            },
            None,
        )?;

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::create_trigger_channel;
    use crate::sequencer::instrument::Instrument;
    use crate::sequencer::trigger::{TriggerEvent, TriggerSink};

    const SAMPLE_RATE: f32 = 48000.0;

    #[test]
    fn test_render_starts_trigger_on_exact_frame() {
        let (mut scheduled_tx, scheduled_rx) = create_trigger_channel(16);
        let (_preview_tx, preview_rx) = create_trigger_channel(16);
        let timing = AudioTiming::new(SAMPLE_RATE);
        let mut renderer =
            Renderer::new(scheduled_rx, preview_rx, timing.clone(), MasterLevel::new(1.0));

        // 10ms = frame 480
        scheduled_tx.trigger(TriggerEvent::new(Instrument::Snare, 0.01, false));

        let mut buffer = vec![0.0f32; 1024 * 2];
        renderer.render(&mut buffer, 2);

        assert_eq!(timing.current_sample(), 1024);
        assert!(buffer[..480 * 2].iter().all(|&s| s == 0.0));
        assert!(buffer[480 * 2..].iter().any(|&s| s != 0.0));
        assert_eq!(renderer.active_voice_count(), 1);
    }

    #[test]
    fn test_render_preview_queue_and_silence_at_zero_level() {
        let (_scheduled_tx, scheduled_rx) = create_trigger_channel(16);
        let (mut preview_tx, preview_rx) = create_trigger_channel(16);
        let timing = AudioTiming::new(SAMPLE_RATE);
        let volume = MasterLevel::new(0.0);
        let mut renderer = Renderer::new(scheduled_rx, preview_rx, timing, volume);

        preview_tx.trigger(TriggerEvent::new(Instrument::Kick, 0.0, true));

        let mut buffer = vec![0.0f32; 512];
        renderer.render(&mut buffer, 1);
        assert_eq!(renderer.active_voice_count(), 1);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_output_stays_in_range() {
        let (mut scheduled_tx, scheduled_rx) = create_trigger_channel(64);
        let (_preview_tx, preview_rx) = create_trigger_channel(16);
        let timing = AudioTiming::new(SAMPLE_RATE);
        let mut renderer =
            Renderer::new(scheduled_rx, preview_rx, timing, MasterLevel::new(1.0));

        for instrument in Instrument::ALL {
            scheduled_tx.trigger(TriggerEvent::new(instrument, 0.0, true));
        }

        let mut buffer = vec![0i16; 4096];
        renderer.render(&mut buffer, 2);
        let mut float_buffer = vec![0.0f32; 4096];
        renderer.render(&mut float_buffer, 2);
        assert!(float_buffer.iter().all(|s| (-1.0..=1.0).contains(s)));
    }
}
