//! Danmaku entry point
//!
//! Loads settings, opens the window and runs the frame loop until it is closed.

use anyhow::Context;

use danmaku::Settings;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    log::info!("Danmaku {} starting...", env!("CARGO_PKG_VERSION"));

    let path = Settings::default_path();
    let settings = Settings::load_or_default(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    danmaku::trig::init();
    danmaku::app::run(settings).context("Frame loop stopped")?;

    log::info!("Goodbye");
    Ok(())
}
