// Messaging - lock-free channels between UI, scheduler and audio threads

pub mod channels;
pub mod notification;
