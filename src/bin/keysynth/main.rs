//! keysynth - play the computer keyboard like a synthesizer
//!
//! Run with: cargo run
//! Logs go to stderr and are off by default; set RUST_LOG to enable them
//! (e.g. `RUST_LOG=keysynth=debug cargo run 2> keysynth.log`).

mod app;
mod input;
mod ui;

use app::App;
use keysynth::SynthConfig;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    App::new(SynthConfig::default()).run()
}
