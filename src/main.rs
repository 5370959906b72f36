#![deny(clippy::pedantic, clippy::unwrap_used, clippy::clone_on_ref_ptr)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

mod app;
mod audio;
mod catalog;
mod config;
mod controller;
mod message;
mod playback;
mod views;

use app::Soundchart;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    iced::application(Soundchart::new, Soundchart::update, Soundchart::view)
        .title(Soundchart::title)
        .subscription(Soundchart::subscription)
        .theme(Soundchart::theme)
        .run()?;
    Ok(())
}
