//! stackwm - a minimal reparenting master/stack tiling window manager.
//!
//! Every application window is wrapped in a bordered frame. The newest
//! windows are masters on the left; the rest are stacked on the right.

mod atoms;
mod config;
mod display;
mod event;
mod focus;
mod keys;
mod layout;
mod registry;
mod spawn;
mod state;
mod tracing;
mod types;
mod wm;
mod x11;

use anyhow::Result;

use config::Config;
use types::Rect;
use wm::Wm;
use x11::XDisplay;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    log::info!("Starting stackwm");

    spawn::ignore_child_exits();

    let settings = Config::load().resolve();

    let display = XDisplay::connect(&settings)?;
    display.become_wm()?;
    display.grab_bindings()?;

    let screen = match settings.screen_size {
        Some((width, height)) => Rect::new(0, 0, width, height),
        None => display.screen_rect(),
    };
    let existing = display.existing_windows()?;

    let mut wm = Wm::new(display, settings, screen);

    // Adopt windows that were mapped before we took over
    for window in existing {
        wm.manage_window(window)?;
    }

    wm.run()?;

    Ok(())
}
