// Main UI App - pads, transport controls and status bar

use crate::audio::status::DeviceStatus;
use crate::messaging::channels::{NotificationConsumer, NotificationProducer};
use crate::messaging::notification::{
    Notification, NotificationCategory, NotificationLevel, notify,
};
use crate::persistence::SnapshotStore;
use crate::sequencer::bank::NUM_BANKS;
use crate::sequencer::instrument::Instrument;
use crate::sequencer::pattern::{Pattern, STEPS};
use crate::sequencer::transport::{
    BPM_MAX, BPM_MIN, SWING_MAX, SWING_STEP, TransportController, TransportState,
};
use eframe::egui;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PAD_SIZE: egui::Vec2 = egui::vec2(28.0, 28.0);
const PAD_ON: egui::Color32 = egui::Color32::from_rgb(255, 140, 0);
const PAD_OFF: egui::Color32 = egui::Color32::from_gray(45);
const PAD_OFF_DOWNBEAT: egui::Color32 = egui::Color32::from_gray(65);
const PLAYHEAD: egui::Color32 = egui::Color32::from_rgb(255, 220, 120);
const ACCENT_ON: egui::Color32 = egui::Color32::from_rgb(220, 60, 60);

/// How long a notification stays in the status bar
const NOTIFICATION_LIFETIME: Duration = Duration::from_secs(5);

/// Repaint cadence while running, enough to follow a step at 200 BPM
const PLAYING_REPAINT: Duration = Duration::from_millis(16);

pub struct DrumMachineApp {
    transport: TransportController,
    state_store: Box<dyn SnapshotStore>,
    // Notification system
    notification_tx: Arc<Mutex<NotificationProducer>>,
    notification_rx: NotificationConsumer,
    notification_queue: VecDeque<Notification>,
    max_notifications: usize,
    last_audio_status: DeviceStatus,
}

impl DrumMachineApp {
    pub fn new(
        transport: TransportController,
        state_store: Box<dyn SnapshotStore>,
        notification_tx: Arc<Mutex<NotificationProducer>>,
        notification_rx: NotificationConsumer,
    ) -> Self {
        let last_audio_status = transport.audio_status();
        Self {
            transport,
            state_store,
            notification_tx,
            notification_rx,
            notification_queue: VecDeque::new(),
            max_notifications: 10,
            last_audio_status,
        }
    }

    /// Pull new notifications from the ringbuffer into the queue
    fn update_notifications(&mut self) {
        while let Some(notification) = ringbuf::traits::Consumer::try_pop(&mut self.notification_rx)
        {
            self.notification_queue.push_back(notification);

            if self.notification_queue.len() > self.max_notifications {
                self.notification_queue.pop_front();
            }
        }
    }

    /// Up to three notifications younger than 5 seconds, newest first
    fn get_recent_notifications(&self) -> Vec<&Notification> {
        self.notification_queue
            .iter()
            .rev()
            .filter(|n| n.is_recent(NOTIFICATION_LIFETIME))
            .take(3)
            .collect()
    }

    /// Stop the transport when the stream dies under it
    fn check_audio_status(&mut self) {
        let status = self.transport.audio_status();
        if status == DeviceStatus::Error
            && self.last_audio_status != DeviceStatus::Error
            && self.transport.is_running()
        {
            self.transport.stop();
        }
        self.last_audio_status = status;
    }

    fn toggle_playback(&mut self) {
        if let Err(e) = self.transport.toggle_playback() {
            notify(
                &self.notification_tx,
                Notification::error(NotificationCategory::Transport, e.to_string()),
            );
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Text fields would swallow these otherwise
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.toggle_playback();
        }

        let bank_keys = [
            egui::Key::Num1,
            egui::Key::Num2,
            egui::Key::Num3,
            egui::Key::Num4,
        ];
        for (bank, key) in bank_keys.into_iter().enumerate() {
            if ctx.input(|i| i.key_pressed(key)) {
                self.transport.select_bank(bank);
            }
        }

        // Fresh presses of a letter key, in the order they arrived
        let hits: Vec<Instrument> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        modifiers,
                        ..
                    } if modifiers.is_none() => single_char(key.name()),
                    _ => None,
                })
                .filter_map(Instrument::from_key)
                .collect()
        });
        for instrument in hits {
            self.transport.record_hit(instrument);
        }
    }

    fn draw_transport(&mut self, ui: &mut egui::Ui, state: &TransportState) {
        ui.horizontal(|ui| {
            let (label, color) = if state.is_running {
                ("STOP", egui::Color32::from_rgb(200, 60, 60))
            } else {
                ("START", egui::Color32::from_rgb(60, 160, 80))
            };
            let button = egui::Button::new(egui::RichText::new(label).strong())
                .fill(color)
                .min_size(egui::vec2(80.0, 32.0));
            if ui.add(button).clicked() {
                self.toggle_playback();
            }

            ui.add_space(16.0);

            let mut bpm = state.bpm;
            if ui
                .add(egui::Slider::new(&mut bpm, BPM_MIN..=BPM_MAX).text("TEMPO"))
                .changed()
            {
                self.transport.set_bpm(bpm as i64);
            }

            let mut swing = state.swing_percent;
            if ui
                .add(
                    egui::Slider::new(&mut swing, 0..=SWING_MAX)
                        .step_by(SWING_STEP as f64)
                        .suffix("%")
                        .text("SWING"),
                )
                .changed()
            {
                self.transport.set_swing(swing as i64);
            }

            let mut level = state.master_level;
            if ui
                .add(egui::Slider::new(&mut level, 0.0..=1.0).text("OUTPUT"))
                .changed()
            {
                self.transport.set_master_level(level);
            }
        });

        ui.horizontal(|ui| {
            ui.label("BANK");
            for bank in 0..NUM_BANKS {
                let selected = bank == state.current_bank;
                let button = egui::Button::new(format!("{}", bank + 1))
                    .selected(selected)
                    .min_size(egui::vec2(32.0, 24.0));
                let response = ui
                    .add_enabled(!state.is_running, button)
                    .on_disabled_hover_text("Stop playback to switch banks");
                if response.clicked() {
                    self.transport.select_bank(bank);
                }
            }

            ui.add_space(16.0);
            if ui.button("CLEAR").on_hover_text("Clear this bank and the accents").clicked() {
                self.transport.clear_bank();
            }

            ui.add_space(16.0);
            let (icon, color) = match self.transport.audio_status() {
                DeviceStatus::Connected => ("●", egui::Color32::GREEN),
                DeviceStatus::Connecting => ("●", egui::Color32::YELLOW),
                DeviceStatus::Disconnected => ("○", egui::Color32::GRAY),
                DeviceStatus::Error => ("●", egui::Color32::RED),
            };
            ui.label("Audio:");
            ui.colored_label(color, icon);
        });
    }

    fn pad_fill(
        on: bool,
        step: usize,
        playhead: Option<usize>,
        on_color: egui::Color32,
    ) -> egui::Color32 {
        if playhead == Some(step) {
            if on { egui::Color32::WHITE } else { PLAYHEAD }
        } else if on {
            on_color
        } else if step % 4 == 0 {
            PAD_OFF_DOWNBEAT
        } else {
            PAD_OFF
        }
    }

    fn draw_grid(&mut self, ui: &mut egui::Ui, pattern: &Pattern, playhead: Option<usize>) {
        let accents = *self.transport.store().accents();

        egui::Grid::new("step_grid")
            .spacing(egui::vec2(4.0, 4.0))
            .show(ui, |ui| {
                ui.label("ACCENT");
                for step in 0..STEPS {
                    let fill = Self::pad_fill(accents.get(step), step, playhead, ACCENT_ON);
                    if ui.add(egui::Button::new("").fill(fill).min_size(PAD_SIZE)).clicked() {
                        self.transport.toggle_accent(step);
                    }
                }
                ui.end_row();

                for instrument in Instrument::ALL {
                    ui.label(format!("{} ({})", instrument.name(), instrument.key()));
                    let row = pattern.row(instrument);
                    for step in 0..STEPS {
                        let fill = Self::pad_fill(row.get(step), step, playhead, PAD_ON);
                        if ui.add(egui::Button::new("").fill(fill).min_size(PAD_SIZE)).clicked() {
                            self.transport.toggle_pad(instrument, step);
                        }
                    }
                    if ui.small_button("CLR").clicked() {
                        self.transport.clear_row(instrument);
                    }
                    ui.end_row();
                }
            });
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.separator();
        ui.horizontal(|ui| {
            let recent_notifications = self.get_recent_notifications();

            if recent_notifications.is_empty() {
                ui.label("Ready");
            } else {
                for notification in recent_notifications {
                    let (icon, color) = match notification.level {
                        NotificationLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 150, 255)),
                        NotificationLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 165, 0)),
                        NotificationLevel::Error => ("✖", egui::Color32::RED),
                    };

                    ui.colored_label(color, icon);
                    ui.colored_label(color, &notification.message);
                    ui.add_space(10.0);
                }
            }
        });
    }
}

fn single_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl eframe::App for DrumMachineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_notifications();
        self.check_audio_status();
        self.handle_keyboard(ctx);

        let state = self.transport.state();
        let pattern = self.transport.current_pattern();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("DR-16");
            ui.separator();

            self.draw_transport(ui, &state);
            ui.add_space(10.0);
            self.draw_grid(ui, &pattern, state.current_step);

            ui.add_space(10.0);
            ui.label("Space: start/stop   1-4: bank   A S D F G H J K L: record at the playhead");
            self.draw_status_bar(ui);
        });

        self.transport.persist_if_dirty(self.state_store.as_ref());

        if state.is_running {
            ctx.request_repaint_after(PLAYING_REPAINT);
        } else {
            // Notifications expire even without input
            ctx.request_repaint_after(Duration::from_millis(500));
        }
    }
}
