// User interface (egui)

pub mod app;
