mod api;
mod app;
mod channel;
mod conversation;
mod storage;
mod ui;
mod utils;

use adw::Application;
use adw::prelude::*;

fn main() {
    env_logger::init();

    let app = Application::builder()
        .application_id("com.example.BrainBotGtk")
        .build();
    app.connect_activate(|app| {
        if let Err(err) = crate::storage::init() {
            log::warn!("message cache unavailable: {err}");
        }
        crate::app::build_ui(app);
    });
    app.run();
}
