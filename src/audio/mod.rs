// Audio - CPAL backend, real-time callback and device clock

pub mod engine;
pub mod format_conversion;
pub mod level;
pub mod master_bus;
pub mod status;
pub mod timing;
