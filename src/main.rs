use dr16::config::{
    AppConfig, NOTIFICATION_RINGBUFFER_CAPACITY, PREVIEW_RINGBUFFER_CAPACITY,
    SCHEDULED_RINGBUFFER_CAPACITY,
};
use dr16::messaging::notification::{Notification, NotificationCategory, notify};
use dr16::ui::app::DrumMachineApp;
use dr16::{
    AudioEngine, AudioLink, OutputPorts, TransportController, create_notification_channel,
    create_trigger_channel,
};
use std::sync::{Arc, Mutex};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("DR-16 {}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env();
    let state_store = config.snapshot_store();

    // Two trigger queues: the scheduler thread and the UI each need their own producer
    let (scheduled_tx, scheduled_rx) = create_trigger_channel(SCHEDULED_RINGBUFFER_CAPACITY);
    let (preview_tx, preview_rx) = create_trigger_channel(PREVIEW_RINGBUFFER_CAPACITY);

    let (notification_tx, notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    // The engine must outlive the UI: dropping it closes the stream
    let (audio_engine, link) =
        match AudioEngine::new(scheduled_rx, preview_rx, notification_tx.clone()) {
            Ok(engine) => {
                let ports = OutputPorts {
                    clock: Arc::new(engine.clock()),
                    status: engine.status.clone(),
                    master_level: engine.volume.clone(),
                    scheduled: Box::new(scheduled_tx),
                    preview: Box::new(preview_tx),
                };
                (Some(engine), AudioLink::Connected(ports))
            }
            Err(e) => {
                notify(
                    &notification_tx,
                    Notification::error(NotificationCategory::Audio, e.to_string()),
                );
                (None, AudioLink::Unavailable(e.to_string()))
            }
        };

    let saved = state_store.load_snapshot();
    if let Some(snapshot) = &saved {
        let when = snapshot
            .saved_at
            .map(|t| t.format(" from %Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let message = format!("Session restored{}", when);
        notify(
            &notification_tx,
            Notification::info(NotificationCategory::Storage, message),
        );
    }
    let transport = TransportController::restore(saved, link, config.scheduler);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([820.0, 520.0])
            .with_title("DR-16"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "DR-16",
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(DrumMachineApp::new(
                transport,
                state_store,
                notification_tx,
                notification_rx,
            )))
        }),
    );

    if let Err(e) = result {
        log::error!("UI error: {}", e);
    }
    drop(audio_engine);
}
